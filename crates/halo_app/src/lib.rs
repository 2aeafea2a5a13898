//! Halo Shell
//!
//! Wires the Halo crates together:
//!
//! - [`Shell`]: owns the config/settings mirrors, theme state, i18n state,
//!   settings schemas and the wallpaper cache for one host connection
//! - [`HaloConfig`]: the `halo.toml` file
//! - [`logging::init`]: `tracing` subscriber setup
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use halo_app::{Shell, ShellOptions};
//! use halo_core::MemoryBackend;
//! use halo_i18n::LocaleCatalog;
//! use halo_store::MemoryStorage;
//! use halo_theme::MemoryStyleSink;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let options = ShellOptions::new(
//!     LocaleCatalog::new(),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(MemoryStyleSink::new()),
//! );
//! let shell = Shell::start(Arc::new(MemoryBackend::new()), options).await?;
//! shell.set_primary_hex("#3b82f6")?;
//! shell.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
mod shell;

pub use config::{HaloConfig, CONFIG_FILE};
pub use shell::{Shell, ShellOptions, GENERAL_KEY, THEME_KEY};
