//! Halo state stores
//!
//! - [`MirrorStore`]: in-memory mirrors of the host's config and settings
//!   modules, kept in sync in both directions without echo loops
//! - [`SettingsSchemas`]: dereferenced JSON schemas of the settings groups
//! - [`FieldRegistry`] / [`FieldValidator`]: widget lookup and validation for
//!   single settings fields
//! - [`LocalStorage`] and [`WallpaperCache`]: client-side persistence
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use halo_core::MemoryBackend;
//! use halo_store::{MirrorKind, MirrorStore};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), halo_store::StoreError> {
//! let backend = Arc::new(MemoryBackend::new());
//! let settings = MirrorStore::connect(MirrorKind::Settings, backend).await?;
//!
//! settings.set("general", json!({ "lang": "de-DE" }))?;
//! assert_eq!(settings.get("general"), Some(json!({ "lang": "de-DE" })));
//! settings.flush().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod field;
mod mirror;
mod schema;
mod storage;
mod validate;
mod wallpaper;

pub use error::StoreError;
pub use field::{FieldKind, FieldRegistry};
pub use mirror::{ChangeOrigin, MirrorChange, MirrorKind, MirrorStore};
pub use schema::{dereference, SchemaError, SettingsSchemas};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
pub use validate::{validate, CustomValidator, FieldValidator};
pub use wallpaper::{WallpaperCache, WALLPAPER_CACHE_KEY};
