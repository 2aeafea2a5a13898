//! Fluent locale bundles
//!
//! Every `.ftl` file lives under a directory named after its locale tag
//! (`locales/en-US/main.ftl`). All files of one locale are merged into a
//! single bundle. A locale whose resources fail to parse or register is
//! logged and left out; the rest of the catalog still loads.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use tracing::{info, warn};
use unic_langid::LanguageIdentifier;

use crate::error::I18nError;
use crate::label::{ArgValue, Message};
use crate::locale::{locale_from_path, normalize_locale};

/// Parsed messages for one locale. Immutable once built.
pub struct LocaleBundle {
    locale: String,
    bundle: FluentBundle<FluentResource>,
}

impl LocaleBundle {
    /// Build a bundle from one or more Fluent sources.
    pub fn parse<I, S>(locale: &str, sources: I) -> Result<Self, I18nError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let locale = normalize_locale(locale);
        let langid: LanguageIdentifier =
            locale.parse().map_err(|e| I18nError::InvalidLocale {
                locale: locale.clone(),
                reason: format!("{e}"),
            })?;

        let mut bundle = FluentBundle::new_concurrent(vec![langid]);
        // Plain text output; hosts render into a document that handles bidi.
        bundle.set_use_isolating(false);

        for source in sources {
            let resource =
                FluentResource::try_new(source.into()).map_err(|(_res, errs)| I18nError::Parse {
                    locale: locale.clone(),
                    errors: format!("{errs:?}"),
                })?;
            bundle
                .add_resource(resource)
                .map_err(|errs| I18nError::Resource {
                    locale: locale.clone(),
                    errors: format!("{errs:?}"),
                })?;
        }

        Ok(Self { locale, bundle })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn has_message(&self, id: &str) -> bool {
        self.bundle.has_message(id)
    }

    /// Format `msg` with its arguments, or `None` when the bundle has no
    /// value for the id.
    pub fn format(&self, msg: &Message) -> Option<String> {
        let pattern = self.bundle.get_message(&msg.id)?.value()?;

        let mut args = FluentArgs::new();
        for (name, value) in &msg.args {
            match value {
                ArgValue::Str(s) => args.set(name.as_ref(), FluentValue::from(s.as_str())),
                ArgValue::Int(i) => args.set(name.as_ref(), FluentValue::from(*i)),
                ArgValue::Float(f) => args.set(name.as_ref(), FluentValue::from(*f)),
            }
        }

        let mut errs = Vec::new();
        let text = self
            .bundle
            .format_pattern(pattern, Some(&args), &mut errs)
            .to_string();
        if !errs.is_empty() {
            warn!(
                locale = %self.locale,
                message_id = %msg.id,
                errors = ?errs,
                "Fluent formatting errors"
            );
        }
        Some(text)
    }
}

/// All loaded locales, keyed by normalized tag.
#[derive(Default)]
pub struct LocaleCatalog {
    bundles: BTreeMap<String, Arc<LocaleBundle>>,
}

impl LocaleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(path, content)` pairs. The locale tag of each source is
    /// its parent directory name; paths that don't look like
    /// `<tag>/<name>.ftl` are ignored.
    pub fn from_sources<I, P, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: Into<String>,
    {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (path, content) in sources {
            let Some(locale) = locale_from_path(path.as_ref()) else {
                continue;
            };
            grouped.entry(locale).or_default().push(content.into());
        }

        let mut catalog = Self::new();
        for (locale, contents) in grouped {
            match LocaleBundle::parse(&locale, contents) {
                Ok(bundle) => {
                    info!("Loaded locale {locale}");
                    catalog.insert(bundle);
                }
                Err(e) => warn!("Error parsing i18n file for {locale}: {e}"),
            }
        }
        catalog
    }

    /// Read every `<dir>/<tag>/*.ftl` file.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, I18nError> {
        let dir = dir.as_ref();
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| I18nError::Io { path, source }
        };

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err(dir))? {
            let locale_dir = entry.map_err(io_err(dir))?.path();
            if !locale_dir.is_dir() {
                continue;
            }
            for file in fs::read_dir(&locale_dir).map_err(io_err(&locale_dir))? {
                let path = file.map_err(io_err(&locale_dir))?.path();
                if path.extension().is_some_and(|ext| ext == "ftl") {
                    files.push(path);
                }
            }
        }
        // Resource order decides which duplicate wins; keep it stable.
        files.sort();

        let mut sources = Vec::with_capacity(files.len());
        for path in files {
            let content = fs::read_to_string(&path).map_err(io_err(&path))?;
            sources.push((path, content));
        }
        Ok(Self::from_sources(sources))
    }

    pub fn insert(&mut self, bundle: LocaleBundle) {
        self.bundles
            .insert(bundle.locale().to_string(), Arc::new(bundle));
    }

    pub fn get(&self, locale: &str) -> Option<Arc<LocaleBundle>> {
        self.bundles.get(&normalize_locale(locale)).cloned()
    }

    /// Loaded locale tags, sorted.
    pub fn locales(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Arc<LocaleBundle>)> {
        self.bundles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn files_of_one_locale_are_merged() {
        let catalog = LocaleCatalog::from_sources([
            ("locales/en-US/main.ftl", "app-title = Halo"),
            ("locales/en-US/settings.ftl", "settings-title = Settings"),
            ("locales/de-DE/main.ftl", "app-title = Halo DE"),
        ]);

        assert_eq!(catalog.locales(), vec!["de-DE", "en-US"]);
        let en = catalog.get("en_US").unwrap();
        assert!(en.has_message("app-title"));
        assert!(en.has_message("settings-title"));
    }

    #[test]
    fn broken_locale_is_dropped() {
        let catalog = LocaleCatalog::from_sources([
            ("locales/en-US/main.ftl", "app-title = Halo"),
            ("locales/fr-FR/main.ftl", "app-title = { $"),
        ]);
        assert_eq!(catalog.locales(), vec!["en-US"]);
    }

    #[test]
    fn duplicate_ids_across_files_drop_the_locale() {
        let catalog = LocaleCatalog::from_sources([
            ("locales/en-US/a.ftl", "app-title = A"),
            ("locales/en-US/b.ftl", "app-title = B"),
        ]);
        assert!(catalog.is_empty());
    }

    #[test]
    fn formats_named_arguments() {
        let bundle = LocaleBundle::parse(
            "en-US",
            ["greeting = Hello, { $name }! You have { $count } updates."],
        )
        .unwrap();
        let msg = Message::new("greeting").arg("name", "Ada").arg("count", 3);
        assert_eq!(
            bundle.format(&msg).as_deref(),
            Some("Hello, Ada! You have 3 updates.")
        );
        assert_eq!(bundle.format(&Message::new("missing")), None);
    }
}
