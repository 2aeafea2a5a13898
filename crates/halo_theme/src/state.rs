//! Theme state
//!
//! Holds the current [`ThemeConfig`], resolves dark mode against the system
//! preference and regenerates the stylesheet when the seed color changes.
//! Constructed by the shell and passed around explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use halo_core::{Backend, EffectMode, Platform, ThemeConfig, ThemeMode};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ThemeError;
use crate::palette::{generate, PaletteSet};
use crate::sink::StyleSink;

/// Seed and palette of the last successful regeneration.
struct Applied {
    hex: String,
    palette: PaletteSet,
}

pub struct ThemeState {
    sink: Arc<dyn StyleSink>,
    platform: Platform,
    config: RwLock<ThemeConfig>,
    applied: RwLock<Option<Applied>>,
    system_dark: AtomicBool,
    dark: watch::Sender<bool>,
}

impl ThemeState {
    pub fn new(sink: Arc<dyn StyleSink>, system_dark: bool) -> Self {
        Self::with_platform(sink, system_dark, Platform::current())
    }

    pub fn with_platform(sink: Arc<dyn StyleSink>, system_dark: bool, platform: Platform) -> Self {
        let config = ThemeConfig::default();
        let (dark, _) = watch::channel(config.is_dark(system_dark));
        Self {
            sink,
            platform,
            config: RwLock::new(config),
            applied: RwLock::new(None),
            system_dark: AtomicBool::new(system_dark),
            dark,
        }
    }

    pub fn config(&self) -> ThemeConfig {
        self.config.read().unwrap().clone()
    }

    pub fn mode(&self) -> ThemeMode {
        self.config.read().unwrap().mode
    }

    pub fn effect(&self) -> EffectMode {
        self.config.read().unwrap().effect
    }

    /// Take over a new configuration.
    ///
    /// The stylesheet is regenerated only when `primary_hex` differs from the
    /// last applied seed. Returns whether the sink was written. On an invalid
    /// seed the mode and effect are still taken over and the previous
    /// stylesheet stays in place.
    pub fn apply(&self, mut config: ThemeConfig) -> Result<bool, ThemeError> {
        config.sanitize(self.platform);
        let hex = config.primary_hex.clone();
        *self.config.write().unwrap() = config;
        self.publish_dark();
        self.regenerate(&hex)
    }

    /// Change only the seed color.
    pub fn update_primary(&self, hex: &str) -> Result<bool, ThemeError> {
        let mut config = self.config();
        config.primary_hex = hex.to_string();
        self.apply(config)
    }

    pub fn set_mode(&self, mode: ThemeMode) {
        self.config.write().unwrap().mode = mode;
        self.publish_dark();
    }

    pub fn set_effect(&self, effect: EffectMode) {
        let mut config = self.config();
        config.effect = effect;
        config.sanitize(self.platform);
        *self.config.write().unwrap() = config;
    }

    /// Palettes from the last successful regeneration.
    pub fn palette(&self) -> Option<PaletteSet> {
        self.applied
            .read()
            .unwrap()
            .as_ref()
            .map(|applied| applied.palette.clone())
    }

    pub fn stylesheet(&self) -> Option<String> {
        self.applied
            .read()
            .unwrap()
            .as_ref()
            .map(|applied| applied.palette.stylesheet())
    }

    /// `Dark` is dark, `Light` is light, `Auto` follows the system.
    pub fn is_dark(&self) -> bool {
        self.mode().is_dark(self.system_dark.load(Ordering::SeqCst))
    }

    pub fn set_system_dark(&self, dark: bool) {
        self.system_dark.store(dark, Ordering::SeqCst);
        self.publish_dark();
    }

    /// Class to put on the document root, if any.
    pub fn css_class(&self) -> Option<&'static str> {
        self.is_dark().then_some("dark")
    }

    /// Watch dark mode resolution. Only changes are published.
    pub fn subscribe_dark(&self) -> watch::Receiver<bool> {
        self.dark.subscribe()
    }

    /// Fetch the stored configuration from the host and apply it.
    pub async fn load(&self, backend: &dyn Backend) -> Result<(), ThemeError> {
        let config = backend.load_theme_config().await?;
        debug!(mode = ?config.mode, effect = ?config.effect, "ThemeState: loaded theme config");
        self.apply(config)?;
        Ok(())
    }

    /// Store the current configuration on the host and let it re-apply the
    /// window effect.
    pub async fn push(&self, backend: &dyn Backend) -> Result<(), ThemeError> {
        let config = self.config();
        backend.set_theme_config(&config).await?;
        backend.refresh_window_theme().await?;
        Ok(())
    }

    fn regenerate(&self, hex: &str) -> Result<bool, ThemeError> {
        let unchanged = self
            .applied
            .read()
            .unwrap()
            .as_ref()
            .is_some_and(|applied| applied.hex == hex);
        if unchanged {
            return Ok(false);
        }

        let palette = match generate(hex) {
            Ok(palette) => palette,
            Err(e) => {
                warn!("ThemeState: keeping previous stylesheet, {e}");
                return Err(e);
            }
        };
        self.sink.replace(&palette.stylesheet())?;
        debug!(hex, "ThemeState: stylesheet regenerated");

        *self.applied.write().unwrap() = Some(Applied {
            hex: hex.to_string(),
            palette,
        });
        Ok(true)
    }

    fn publish_dark(&self) {
        let dark = self.is_dark();
        self.dark.send_if_modified(|current| {
            if *current == dark {
                return false;
            }
            debug!(dark, "ThemeState: dark mode changed");
            *current = dark;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryStyleSink;
    use pretty_assertions::assert_eq;

    fn state() -> (ThemeState, Arc<MemoryStyleSink>) {
        let sink = Arc::new(MemoryStyleSink::new());
        let state = ThemeState::with_platform(sink.clone(), false, Platform::Linux);
        (state, sink)
    }

    #[test]
    fn regenerates_only_when_seed_changes() {
        let (state, sink) = state();

        assert!(state.apply(ThemeConfig::default()).unwrap());
        let first = sink.content();

        let dark = ThemeConfig {
            mode: ThemeMode::Dark,
            ..Default::default()
        };
        assert!(!state.apply(dark).unwrap());
        assert_eq!(sink.writes(), 1);
        assert_eq!(sink.content(), first);

        assert!(state.update_primary("#3b82f6").unwrap());
        assert_eq!(sink.writes(), 2);
        assert_eq!(state.mode(), ThemeMode::Dark);
    }

    #[test]
    fn invalid_seed_keeps_previous_stylesheet() {
        let (state, sink) = state();
        state.apply(ThemeConfig::default()).unwrap();
        let before = sink.content();

        let err = state.update_primary("#zzzzzz").unwrap_err();
        assert!(matches!(err, ThemeError::InvalidColor(_)));
        assert_eq!(sink.content(), before);
        assert_eq!(state.stylesheet(), before);
    }

    #[test]
    fn dark_mode_follows_system_in_auto() {
        let (state, _) = state();
        let mut dark = state.subscribe_dark();
        assert!(!state.is_dark());
        assert_eq!(state.css_class(), None);

        state.set_system_dark(true);
        assert!(state.is_dark());
        assert!(dark.has_changed().unwrap());
        assert!(*dark.borrow_and_update());

        state.set_mode(ThemeMode::Light);
        assert!(!state.is_dark());
        assert!(!*dark.borrow_and_update());
    }

    #[test]
    fn effect_is_sanitized_for_platform() {
        let sink = Arc::new(MemoryStyleSink::new());
        let state = ThemeState::with_platform(sink, false, Platform::Macos);
        state.set_effect(EffectMode::Mica);
        assert_eq!(state.effect(), EffectMode::Auto);
        state.set_effect(EffectMode::Vibrancy);
        assert_eq!(state.effect(), EffectMode::Vibrancy);
    }
}
