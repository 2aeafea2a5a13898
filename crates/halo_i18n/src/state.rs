use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::catalog::{LocaleBundle, LocaleCatalog};
use crate::label::Message;
use crate::locale::{language_of, normalize_locale};

/// Runtime i18n state.
///
/// Bundles are fixed at construction. Only the active pair changes: the
/// bundle of the selected language (or the default one when the selection has
/// none) followed by the default bundle.
pub struct I18nState {
    catalog: LocaleCatalog,
    default_locale: String,
    language: RwLock<String>,
    active: RwLock<Vec<Arc<LocaleBundle>>>,
    changes: watch::Sender<String>,
}

impl I18nState {
    pub fn new(
        catalog: LocaleCatalog,
        default_locale: impl Into<String>,
        selected: impl Into<String>,
    ) -> Self {
        let default_locale = normalize_locale(&default_locale.into());
        if catalog.get(&default_locale).is_none() {
            warn!("Default locale {default_locale} is not loaded, messages fall back to their ids");
        }

        let mut language = normalize_locale(&selected.into());
        if language.is_empty() {
            language = default_locale.clone();
        }

        let (changes, _) = watch::channel(language.clone());
        let state = Self {
            catalog,
            default_locale,
            language: RwLock::new(language.clone()),
            active: RwLock::new(Vec::new()),
            changes,
        };
        *state.active.write().unwrap() = state.resolve(&language);
        state
    }

    /// Currently selected language tag, as requested (not necessarily loaded).
    pub fn language(&self) -> String {
        self.language.read().unwrap().clone()
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Switch the selected language and recompute the active pair.
    ///
    /// Subscribers are notified only when the tag actually changes.
    pub fn set_language(&self, tag: &str) {
        let tag = normalize_locale(tag);
        if tag.is_empty() {
            return;
        }

        let mut current = self.language.write().unwrap();
        if *current == tag {
            return;
        }
        debug!("I18nState::set_language: {} -> {}", *current, tag);

        // `language` stays locked until `active` matches it.
        *self.active.write().unwrap() = self.resolve(&tag);
        *current = tag.clone();
        self.changes.send_replace(tag);
    }

    /// Translate `msg`, trying the active bundles in order.
    ///
    /// Falls back to the message id when no bundle has it.
    pub fn tr(&self, msg: &Message) -> String {
        let active = self.active.read().unwrap();
        active
            .iter()
            .find_map(|bundle| bundle.format(msg))
            .unwrap_or_else(|| msg.id.to_string())
    }

    /// Translate a message without arguments.
    pub fn t(&self, id: &str) -> String {
        self.tr(&Message::new(id.to_string()))
    }

    /// Receive the selected language tag after each change.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.changes.subscribe()
    }

    /// Every loaded locale, for language pickers.
    pub fn available_locales(&self) -> Vec<String> {
        self.catalog.locales()
    }

    /// Locales of the active bundles, in lookup order.
    pub fn active_locales(&self) -> Vec<String> {
        self.active
            .read()
            .unwrap()
            .iter()
            .map(|bundle| bundle.locale().to_string())
            .collect()
    }

    fn resolve(&self, language: &str) -> Vec<Arc<LocaleBundle>> {
        let fallback = self.catalog.get(&self.default_locale);
        let primary = self
            .catalog
            .get(language)
            .or_else(|| self.same_language(language))
            .or_else(|| fallback.clone());

        let mut active: Vec<Arc<LocaleBundle>> = primary.into_iter().collect();
        if let Some(fallback) = fallback {
            if !active.iter().any(|b| Arc::ptr_eq(b, &fallback)) {
                active.push(fallback);
            }
        }
        debug!(
            language,
            active = ?active.iter().map(|b| b.locale()).collect::<Vec<_>>(),
            "I18nState: active bundles"
        );
        active
    }

    /// A loaded locale sharing the primary language subtag, e.g. `de-DE` for
    /// a selection of `de` or `de-AT`.
    fn same_language(&self, language: &str) -> Option<Arc<LocaleBundle>> {
        let wanted = language_of(language);
        self.catalog
            .iter()
            .find(|(tag, _)| language_of(tag).eq_ignore_ascii_case(wanted))
            .map(|(_, bundle)| bundle.clone())
    }
}
