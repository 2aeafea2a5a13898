//! The Halo shell
//!
//! [`Shell`] is the composition root: it connects both mirrors, builds the
//! theme and i18n state from the current settings, warms the wallpaper cache
//! and keeps all of them following the settings mirror. Nothing here is
//! global; every holder is reachable through the shell that created it.

use std::sync::Arc;

use anyhow::{Context, Result};
use halo_core::{Backend, Color, EffectMode, Platform, ThemeConfig, ThemeMode};
use halo_i18n::{I18nState, LocaleCatalog, Message};
use halo_store::{
    validate, ChangeOrigin, LocalStorage, MirrorChange, MirrorKind, MirrorStore, SettingsSchemas,
    WallpaperCache,
};
use halo_theme::{StyleSink, ThemeState};
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Settings key of the theme group (`{ mode, effect, primaryHex }`).
pub const THEME_KEY: &str = "theme";
/// Settings key of the general group (`{ lang, .. }`).
pub const GENERAL_KEY: &str = "general";

/// Everything the shell needs besides the backend.
pub struct ShellOptions {
    pub catalog: LocaleCatalog,
    pub default_locale: String,
    pub storage: Arc<dyn LocalStorage>,
    pub sink: Arc<dyn StyleSink>,
    pub system_dark: bool,
    pub platform: Platform,
}

impl ShellOptions {
    pub fn new(
        catalog: LocaleCatalog,
        storage: Arc<dyn LocalStorage>,
        sink: Arc<dyn StyleSink>,
    ) -> Self {
        Self {
            catalog,
            default_locale: "en-US".to_string(),
            storage,
            sink,
            system_dark: false,
            platform: Platform::current(),
        }
    }

    pub fn default_locale(mut self, tag: impl Into<String>) -> Self {
        self.default_locale = tag.into();
        self
    }

    pub fn system_dark(mut self, dark: bool) -> Self {
        self.system_dark = dark;
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

pub struct Shell {
    backend: Arc<dyn Backend>,
    config: MirrorStore,
    settings: MirrorStore,
    schemas: SettingsSchemas,
    theme: Arc<ThemeState>,
    i18n: Arc<I18nState>,
    wallpaper: WallpaperCache,
    watcher: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl Shell {
    /// Connect to the host and bring every state holder up to date.
    ///
    /// Only the mirrors are required. Schemas, theme and wallpaper problems
    /// are logged and the shell starts without them.
    pub async fn start(backend: Arc<dyn Backend>, options: ShellOptions) -> Result<Self> {
        let ShellOptions {
            catalog,
            default_locale,
            storage,
            sink,
            system_dark,
            platform,
        } = options;

        let config = MirrorStore::connect(MirrorKind::Config, backend.clone())
            .await
            .context("Failed to load config values")?;
        let settings = MirrorStore::connect(MirrorKind::Settings, backend.clone())
            .await
            .context("Failed to load settings values")?;
        let changes = settings.subscribe();

        let schemas = match SettingsSchemas::fetch(backend.as_ref()).await {
            Ok(schemas) => schemas,
            Err(e) => {
                warn!("Settings schemas unavailable: {e}");
                SettingsSchemas::default()
            }
        };

        let theme = Arc::new(ThemeState::with_platform(sink, system_dark, platform));
        match settings.get_as::<ThemeConfig>(THEME_KEY) {
            Some(stored) => {
                if let Err(e) = theme.apply(stored) {
                    warn!("Theme settings not applied: {e}");
                }
            }
            None => {
                if let Err(e) = theme.load(backend.as_ref()).await {
                    warn!("Failed to load theme config: {e}");
                }
            }
        }

        let selected = language_setting(settings.get(GENERAL_KEY).as_ref())
            .unwrap_or_else(|| default_locale.clone());
        let i18n = Arc::new(I18nState::new(catalog, default_locale, selected));

        let wallpaper = WallpaperCache::new(storage, backend.clone());
        if let Err(e) = wallpaper.load(theme.effect()).await {
            warn!("Failed to load wallpaper: {e}");
        }

        let watcher = SettingsWatcher {
            backend: backend.clone(),
            settings: settings.clone(),
            theme: theme.clone(),
            i18n: i18n.clone(),
            wallpaper: wallpaper.clone(),
        };
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(watcher.run(changes, stopped));

        info!(
            language = %i18n.language(),
            dark = theme.is_dark(),
            effect = ?theme.effect(),
            "Shell started"
        );

        Ok(Self {
            backend,
            config,
            settings,
            schemas,
            theme,
            i18n,
            wallpaper,
            watcher: Some((stop, task)),
        })
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn config(&self) -> &MirrorStore {
        &self.config
    }

    pub fn settings(&self) -> &MirrorStore {
        &self.settings
    }

    pub fn schemas(&self) -> &SettingsSchemas {
        &self.schemas
    }

    pub fn theme(&self) -> &ThemeState {
        &self.theme
    }

    pub fn i18n(&self) -> &I18nState {
        &self.i18n
    }

    pub fn wallpaper(&self) -> &WallpaperCache {
        &self.wallpaper
    }

    pub fn set_theme_mode(&self, mode: ThemeMode) -> Result<()> {
        self.update_theme(|theme| theme.mode = mode)
    }

    pub fn set_effect(&self, effect: EffectMode) -> Result<()> {
        self.update_theme(|theme| theme.effect = effect)
    }

    /// Store a new seed color. Rejected up front when it doesn't parse.
    pub fn set_primary_hex(&self, hex: &str) -> Result<()> {
        hex.parse::<Color>()
            .with_context(|| format!("Invalid primary color `{hex}`"))?;
        let hex = hex.trim().to_string();
        self.update_theme(|theme| theme.primary_hex = hex)
    }

    /// Store the selected language; the active bundles follow.
    pub fn set_language(&self, tag: &str) -> Result<()> {
        let tag = tag.to_string();
        self.settings
            .update::<Value, _>(GENERAL_KEY, |general| {
                if !general.is_object() {
                    *general = Value::Object(Default::default());
                }
                general["lang"] = Value::String(tag);
            })
            .context("Failed to store language setting")
    }

    pub fn t(&self, id: &str) -> String {
        self.i18n.t(id)
    }

    pub fn tr(&self, msg: &Message) -> String {
        self.i18n.tr(msg)
    }

    /// Validate a value for `group.field`. Fields without a schema accept
    /// anything.
    pub fn validate_field(&self, group: &str, field: &str, value: &Value) -> Option<String> {
        let schema = self.schemas.property(group, field)?;
        validate(schema, value, None)
    }

    /// Stop following settings, push what is still queued and stop both
    /// sync loops.
    pub async fn shutdown(mut self) {
        if let Some((stop, task)) = self.watcher.take() {
            let _ = stop.send(());
            if let Err(e) = task.await {
                warn!("Settings watcher failed: {e}");
            }
        }
        self.config.shutdown().await;
        self.settings.shutdown().await;
        info!("Shell stopped");
    }

    fn update_theme(&self, edit: impl FnOnce(&mut ThemeConfig)) -> Result<()> {
        let mut stored = self
            .settings
            .get_as::<ThemeConfig>(THEME_KEY)
            .unwrap_or_else(|| self.theme.config());
        edit(&mut stored);
        self.settings
            .set(THEME_KEY, &stored)
            .context("Failed to store theme settings")
    }
}

/// Keeps theme and i18n state following the settings mirror.
struct SettingsWatcher {
    backend: Arc<dyn Backend>,
    settings: MirrorStore,
    theme: Arc<ThemeState>,
    i18n: Arc<I18nState>,
    wallpaper: WallpaperCache,
}

impl SettingsWatcher {
    async fn run(
        self,
        mut changes: broadcast::Receiver<MirrorChange>,
        mut stop: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut stop => break,
                change = changes.recv() => match change {
                    Ok(change) => self.handle(change).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Settings watcher lagged, resyncing");
                        self.resync().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!("Settings watcher stopped");
    }

    async fn handle(&self, change: MirrorChange) {
        match change.key.as_str() {
            THEME_KEY => self.apply_theme(change.value, change.origin).await,
            GENERAL_KEY => {
                // No selection means the default locale, as at start.
                let lang = language_setting(Some(&change.value))
                    .unwrap_or_else(|| self.i18n.default_locale().to_string());
                self.i18n.set_language(&lang);
            }
            _ => {}
        }
    }

    async fn apply_theme(&self, value: Value, origin: ChangeOrigin) {
        let config: ThemeConfig = match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed theme settings: {e}");
                return;
            }
        };

        let previous_effect = self.theme.effect();
        if let Err(e) = self.theme.apply(config) {
            warn!("Keeping previous palette: {e}");
        }

        let effect = self.theme.effect();
        if effect != previous_effect && effect.requires_wallpaper() {
            if let Err(e) = self.wallpaper.load(effect).await {
                warn!("Failed to load wallpaper: {e}");
            }
        }

        // The host re-applies window effects from its own theme config.
        if origin == ChangeOrigin::Local {
            if let Err(e) = self.theme.push(self.backend.as_ref()).await {
                warn!("Failed to push theme config: {e}");
            }
        }
    }

    async fn resync(&self) {
        for key in [THEME_KEY, GENERAL_KEY] {
            if let Some(value) = self.settings.get(key) {
                let change = MirrorChange {
                    key: key.to_string(),
                    value,
                    origin: ChangeOrigin::Remote,
                };
                self.handle(change).await;
            }
        }
    }
}

fn language_setting(general: Option<&Value>) -> Option<String> {
    general?
        .get("lang")?
        .as_str()
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn language_setting_ignores_empty_and_missing() {
        assert_eq!(
            language_setting(Some(&json!({ "lang": "de-DE" }))).as_deref(),
            Some("de-DE")
        );
        assert_eq!(language_setting(Some(&json!({ "lang": "" }))), None);
        assert_eq!(language_setting(Some(&json!({ "autostart": true }))), None);
        assert_eq!(language_setting(None), None);
    }
}
