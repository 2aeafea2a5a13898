//! Seed-color palette generation
//!
//! A palette is the full, fixed set of CSS variables for one variant (light
//! or dark). Every value is derived from a single seed color:
//!
//! - neutrals reuse the seed hue with saturation capped at 12%, so surfaces
//!   stay near-gray but tinted
//! - each role sits at a fixed lightness stop, tuned per variant
//! - foreground text on the primary color is white or near-black depending on
//!   the seed's perceived brightness
//! - five chart colors come from the analogous harmony of the seed
//!
//! All values are formatted as `hsl(H S% L%)` (see [`Hsla::to_css`]), except
//! the contrast text colors which are plain hex.

use halo_core::{Color, Harmony, Hsla};
use indexmap::IndexMap;

use crate::error::ThemeError;

/// Saturation ceiling for neutral surfaces, in percent.
const NEUTRAL_SATURATION_CAP: f32 = 12.0;

/// Number of chart colors in every palette.
pub const CHART_COUNT: usize = 5;

/// Number of variables in every palette.
pub const VARIABLE_COUNT: usize = 32;

const CHART_PAD_ROTATION: f32 = 40.0;
const CHART_PAD_LIGHTEN: f32 = 0.1;
const DARK_CHART_LIGHTEN: f32 = 0.1;

const TEXT_ON_DARK: &str = "#ffffff";
const TEXT_ON_LIGHT: &str = "#0f172a";

/// How a single variable is derived from the seed.
#[derive(Clone, Copy, Debug)]
enum Stop {
    /// Seed hue, capped saturation, fixed lightness.
    Neutral(f32),
    Seed,
    SeedAlpha(f32),
    /// White or near-black, whichever reads on the seed.
    Contrast,
    Fixed(&'static str),
    /// Index into the variant's chart colors.
    Chart(usize),
}

use Stop::*;

const LIGHT_STOPS: [(&str, Stop); VARIABLE_COUNT] = [
    ("--background", Neutral(99.0)),
    ("--foreground", Neutral(5.0)),
    ("--card", Neutral(99.0)),
    ("--card-foreground", Neutral(5.0)),
    ("--popover", Neutral(99.0)),
    ("--popover-foreground", Neutral(5.0)),
    ("--primary", Seed),
    ("--primary-foreground", Contrast),
    ("--secondary", Neutral(94.0)),
    ("--secondary-foreground", Neutral(20.0)),
    ("--muted", Neutral(94.0)),
    ("--muted-foreground", Neutral(40.0)),
    ("--accent", Neutral(94.0)),
    ("--accent-foreground", Neutral(20.0)),
    ("--destructive", Fixed("hsl(0 84.2% 60.2%)")),
    ("--destructive-foreground", Fixed("hsl(0 0% 98%)")),
    ("--border", Neutral(90.0)),
    ("--input", Neutral(90.0)),
    ("--ring", SeedAlpha(0.3)),
    ("--sidebar", Neutral(98.0)),
    ("--sidebar-foreground", Neutral(5.0)),
    ("--sidebar-primary", Seed),
    ("--sidebar-primary-foreground", Contrast),
    ("--sidebar-accent", Neutral(94.0)),
    ("--sidebar-accent-foreground", Neutral(20.0)),
    ("--sidebar-border", Neutral(90.0)),
    ("--sidebar-ring", SeedAlpha(0.3)),
    ("--chart-1", Chart(0)),
    ("--chart-2", Chart(1)),
    ("--chart-3", Chart(2)),
    ("--chart-4", Chart(3)),
    ("--chart-5", Chart(4)),
];

const DARK_STOPS: [(&str, Stop); VARIABLE_COUNT] = [
    ("--background", Neutral(4.0)),
    ("--foreground", Neutral(98.0)),
    ("--card", Neutral(6.0)),
    ("--card-foreground", Neutral(98.0)),
    ("--popover", Neutral(6.0)),
    ("--popover-foreground", Neutral(98.0)),
    ("--primary", Seed),
    ("--primary-foreground", Contrast),
    ("--secondary", Neutral(15.0)),
    ("--secondary-foreground", Neutral(98.0)),
    ("--muted", Neutral(15.0)),
    ("--muted-foreground", Neutral(65.0)),
    ("--accent", Neutral(15.0)),
    ("--accent-foreground", Neutral(98.0)),
    ("--destructive", Fixed("hsl(0 62.8% 30.6%)")),
    ("--destructive-foreground", Fixed("hsl(0 0% 98%)")),
    ("--border", Neutral(20.0)),
    ("--input", Neutral(20.0)),
    ("--ring", SeedAlpha(0.4)),
    ("--sidebar", Neutral(4.0)),
    ("--sidebar-foreground", Neutral(96.0)),
    ("--sidebar-primary", Seed),
    // The dark sidebar is always dark enough for white text.
    ("--sidebar-primary-foreground", Fixed(TEXT_ON_DARK)),
    ("--sidebar-accent", Neutral(15.0)),
    ("--sidebar-accent-foreground", Neutral(98.0)),
    ("--sidebar-border", Neutral(20.0)),
    ("--sidebar-ring", SeedAlpha(0.4)),
    ("--chart-1", Chart(0)),
    ("--chart-2", Chart(1)),
    ("--chart-3", Chart(2)),
    ("--chart-4", Chart(3)),
    ("--chart-5", Chart(4)),
];

/// Variable names in output order.
pub fn variable_names() -> impl Iterator<Item = &'static str> {
    LIGHT_STOPS.iter().map(|(name, _)| *name)
}

/// CSS variables for one variant, in output order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    vars: IndexMap<&'static str, String>,
}

impl Palette {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.vars.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// `--chart-1` through `--chart-5`.
    pub fn charts(&self) -> Vec<&str> {
        self.iter()
            .filter(|(name, _)| name.starts_with("--chart-"))
            .map(|(_, value)| value)
            .collect()
    }
}

/// Light and dark palettes derived from the same seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteSet {
    pub light: Palette,
    pub dark: Palette,
}

impl PaletteSet {
    pub fn stylesheet(&self) -> String {
        crate::css::stylesheet(self)
    }
}

/// Parse `hex` and derive both palettes from it.
pub fn generate(hex: &str) -> Result<PaletteSet, ThemeError> {
    let seed = Color::parse_hex(hex)?;
    Ok(generate_from(seed))
}

pub fn generate_from(seed: Color) -> PaletteSet {
    let light_charts = chart_colors(seed);
    let dark_charts: Vec<Hsla> = light_charts
        .iter()
        .map(|chart| chart.lighten(DARK_CHART_LIGHTEN))
        .collect();

    PaletteSet {
        light: build(seed, &LIGHT_STOPS, &light_charts),
        dark: build(seed, &DARK_STOPS, &dark_charts),
    }
}

/// Text color that reads on top of `background`.
pub fn contrast_text(background: Color) -> &'static str {
    if background.is_dark() {
        TEXT_ON_DARK
    } else {
        TEXT_ON_LIGHT
    }
}

/// Analogous harmony of the seed, padded to [`CHART_COUNT`] by rotating and
/// lightening the last color.
///
/// Each color is rounded the way its CSS text is, so padding and the dark
/// variant derive from exactly what the light palette shows.
fn chart_colors(seed: Color) -> Vec<Hsla> {
    let mut charts: Vec<Hsla> = seed
        .to_hsla()
        .harmonies(Harmony::Analogous)
        .into_iter()
        .map(normalize)
        .collect();

    while charts.len() < CHART_COUNT {
        let Some(last) = charts.last().copied() else {
            break;
        };
        charts.push(normalize(
            last.rotate(CHART_PAD_ROTATION).lighten(CHART_PAD_LIGHTEN),
        ));
    }
    charts.truncate(CHART_COUNT);
    charts
}

fn build(seed: Color, stops: &[(&'static str, Stop)], charts: &[Hsla]) -> Palette {
    let seed_hsla = normalize(seed.to_hsla());
    let neutral_saturation = seed_hsla.s.min(NEUTRAL_SATURATION_CAP);

    let vars = stops
        .iter()
        .map(|(name, stop)| {
            let value = match *stop {
                Neutral(lightness) => {
                    css(Hsla::new(seed_hsla.h, neutral_saturation, lightness))
                }
                Seed => css(seed.to_hsla()),
                SeedAlpha(alpha) => css(seed.to_hsla().with_alpha(alpha)),
                Contrast => contrast_text(seed).to_string(),
                Fixed(value) => value.to_string(),
                Chart(index) => charts.get(index).map(|c| css(*c)).unwrap_or_default(),
            };
            (*name, value)
        })
        .collect();

    Palette { vars }
}

/// Round-trip through RGB and round to whole numbers, matching what the CSS
/// text of the color says. A fully desaturated color loses its hue here.
fn normalize(hsla: Hsla) -> Hsla {
    let hsla = hsla.to_color().to_hsla();
    Hsla::new(hsla.h.round(), hsla.s.round(), hsla.l.round()).with_alpha(hsla.a)
}

fn css(hsla: Hsla) -> String {
    normalize(hsla).to_css()
}
