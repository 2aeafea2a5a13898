//! Halo internationalization (i18n)
//!
//! - Fluent (`.ftl`) resources, one directory per locale tag
//! - A catalog of immutable per-locale bundles, loaded once at startup
//! - [`I18nState`]: the active bundle pair (selected, then default) with
//!   runtime language switching and change notification
//!
//! Lookups never fail: a message missing from every active bundle renders
//! as its id.

mod catalog;
mod error;
mod label;
mod locale;
mod state;

pub use catalog::{LocaleBundle, LocaleCatalog};
pub use error::I18nError;
pub use label::{ArgValue, Message};
pub use locale::{language_of, locale_from_path, normalize_locale};
pub use state::I18nState;

/// Build a [`Message`] from an id and optional named arguments.
///
/// Examples:
/// - `t!("app-title")`
/// - `t!("welcome", { name: user_name, count: 3 })`
#[macro_export]
macro_rules! t {
    ($id:literal) => {
        $crate::Message::new($id)
    };
    ($id:literal, { $($name:ident : $value:expr),* $(,)? }) => {{
        let mut m = $crate::Message::new($id);
        $(
            m = m.arg(stringify!($name), $value);
        )*
        m
    }};
}
