//! Wire types shared with the native host

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Primary color used when none is configured.
pub const DEFAULT_PRIMARY_HEX: &str = "#01ca8a";

/// Light/dark preference.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThemeMode {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    /// Resolve against the system preference.
    pub fn is_dark(self, system_dark: bool) -> bool {
        match self {
            Self::Auto => system_dark,
            Self::Light => false,
            Self::Dark => true,
        }
    }
}

/// Window backdrop effect.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectMode {
    #[default]
    Auto,
    Mica,
    Vibrancy,
    Wallpaper,
}

impl EffectMode {
    /// The wallpaper effect paints the desktop image behind the UI, so the
    /// image has to be available before the first frame.
    pub fn requires_wallpaper(self) -> bool {
        matches!(self, Self::Wallpaper)
    }
}

/// Host operating system, used to drop effects the platform can't render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Macos,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

/// Theme configuration as stored by the host.
///
/// Older hosts send the mode under `theme`; both spellings are accepted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    #[serde(default, alias = "theme")]
    pub mode: ThemeMode,
    #[serde(default)]
    pub effect: EffectMode,
    #[serde(default = "default_primary_hex")]
    pub primary_hex: String,
}

fn default_primary_hex() -> String {
    DEFAULT_PRIMARY_HEX.to_string()
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            mode: ThemeMode::Auto,
            effect: EffectMode::Auto,
            primary_hex: default_primary_hex(),
        }
    }
}

impl ThemeConfig {
    /// Replace values the current platform can't honor.
    pub fn sanitize(&mut self, platform: Platform) {
        if platform == Platform::Windows && self.effect == EffectMode::Vibrancy {
            self.effect = EffectMode::Auto;
            warn!("Vibrancy effect is not supported on Windows. Fallback to Auto.");
        }

        if platform == Platform::Macos && self.effect == EffectMode::Mica {
            self.effect = EffectMode::Auto;
            warn!("Mica effect is not supported on macOS. Fallback to Auto.");
        }

        if self.primary_hex.trim().is_empty() {
            self.primary_hex = default_primary_hex();
            warn!("Primary color is missing, resetting to default {DEFAULT_PRIMARY_HEX}");
        }
    }

    pub fn is_dark(&self, system_dark: bool) -> bool {
        self.mode.is_dark(system_dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = ThemeConfig::default();
        assert_eq!(config.mode, ThemeMode::Auto);
        assert_eq!(config.effect, EffectMode::Auto);
        assert_eq!(config.primary_hex, DEFAULT_PRIMARY_HEX);
    }

    #[test]
    fn camel_case_wire_form() {
        let config = ThemeConfig {
            mode: ThemeMode::Dark,
            effect: EffectMode::Vibrancy,
            primary_hex: "#123456".into(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "mode": "Dark", "effect": "Vibrancy", "primaryHex": "#123456" })
        );
    }

    #[test]
    fn legacy_theme_field_and_missing_fields() {
        let config: ThemeConfig =
            serde_json::from_str(r#"{ "theme": "Light", "effect": "Mica" }"#).unwrap();
        assert_eq!(config.mode, ThemeMode::Light);
        assert_eq!(config.effect, EffectMode::Mica);
        assert_eq!(config.primary_hex, DEFAULT_PRIMARY_HEX);
    }

    #[test]
    fn sanitize_drops_unsupported_effects() {
        let mut on_windows = ThemeConfig {
            effect: EffectMode::Vibrancy,
            mode: ThemeMode::Dark,
            ..Default::default()
        };
        on_windows.sanitize(Platform::Windows);
        assert_eq!(on_windows.effect, EffectMode::Auto);
        assert_eq!(on_windows.mode, ThemeMode::Dark);

        let mut on_macos = ThemeConfig {
            effect: EffectMode::Mica,
            ..Default::default()
        };
        on_macos.sanitize(Platform::Macos);
        assert_eq!(on_macos.effect, EffectMode::Auto);

        let mut untouched = ThemeConfig {
            effect: EffectMode::Mica,
            ..Default::default()
        };
        untouched.sanitize(Platform::Windows);
        assert_eq!(untouched.effect, EffectMode::Mica);
    }

    #[test]
    fn sanitize_restores_missing_primary() {
        let mut config = ThemeConfig {
            primary_hex: String::new(),
            ..Default::default()
        };
        config.sanitize(Platform::Linux);
        assert_eq!(config.primary_hex, DEFAULT_PRIMARY_HEX);
    }

    #[test]
    fn mode_resolution() {
        assert!(ThemeMode::Auto.is_dark(true));
        assert!(!ThemeMode::Auto.is_dark(false));
        assert!(ThemeMode::Dark.is_dark(false));
        assert!(!ThemeMode::Light.is_dark(true));
    }
}
