//! Stylesheet serialization

use crate::palette::{Palette, PaletteSet};

pub const ROOT_SELECTOR: &str = ":root";
/// Class the shell puts on the document root in dark mode.
pub const DARK_SELECTOR: &str = ".dark";

/// `selector { --name: value; --name: value; }` on a single line.
pub fn format_rules(selector: &str, palette: &Palette) -> String {
    let rules = palette
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{selector} {{ {rules} }}")
}

/// Light rules under `:root`, dark rules under `.dark`, one block per line.
pub fn stylesheet(set: &PaletteSet) -> String {
    [
        format_rules(ROOT_SELECTOR, &set.light),
        format_rules(DARK_SELECTOR, &set.dark),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::generate;
    use pretty_assertions::assert_eq;

    #[test]
    fn rules_keep_variable_order() {
        let set = generate("#01ca8a").unwrap();
        let rules = format_rules(ROOT_SELECTOR, &set.light);
        assert!(rules.starts_with(
            ":root { --background: hsl(161.0 12.0% 99.0%); --foreground: hsl(161.0 12.0% 5.0%);"
        ));
        assert!(rules.ends_with("--chart-5: hsl(271.0 99.0% 60.0%); }"));
    }

    #[test]
    fn stylesheet_has_two_blocks() {
        let set = generate("#01ca8a").unwrap();
        let css = stylesheet(&set);
        let lines: Vec<&str> = css.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(":root { "));
        assert!(lines[1].starts_with(".dark { "));
        assert!(lines[1].contains("--sidebar-primary-foreground: #ffffff;"));
    }
}
