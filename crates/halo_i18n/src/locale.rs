use std::path::Path;

/// Canonical lookup form of a locale tag.
///
/// - Converts `_` to `-` (some platforms report `en_US`).
/// - Trims whitespace.
pub fn normalize_locale(s: &str) -> String {
    s.trim().replace('_', "-")
}

/// Primary language subtag, e.g. `de` for `de-AT`.
pub fn language_of(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

/// Locale tag of a resource laid out as `<root>/<tag>/<name>.ftl`.
///
/// Returns `None` for files that are not `.ftl` or have no parent directory.
pub fn locale_from_path(path: &Path) -> Option<String> {
    if path.extension()? != "ftl" {
        return None;
    }
    let tag = path.parent()?.file_name()?.to_str()?;
    let tag = normalize_locale(tag);
    (!tag.is_empty()).then_some(tag)
}
