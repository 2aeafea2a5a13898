use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("invalid locale `{locale}`: {reason}")]
    InvalidLocale { locale: String, reason: String },

    #[error("ftl parse error in `{locale}`: {errors}")]
    Parse { locale: String, errors: String },

    #[error("ftl add_resource error in `{locale}`: {errors}")]
    Resource { locale: String, errors: String },

    #[error("failed to read locales from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
