//! Halo Theme System
//!
//! Derives a full light/dark set of CSS variables from a single seed color
//! and keeps it in sync with the user's theme settings.
//!
//! # Overview
//!
//! - **Palette generation**: pure mapping from a seed hex to two fixed-size
//!   variable maps ([`generate`], [`PaletteSet`])
//! - **Stylesheet output**: `:root` and `.dark` rule blocks ([`stylesheet`])
//! - **Style sinks**: where the stylesheet text goes ([`StyleSink`])
//! - **Theme state**: current [`ThemeConfig`], dark-mode resolution and
//!   regeneration on seed changes ([`ThemeState`])
//!
//! # Quick Start
//!
//! ```rust
//! use halo_theme::{generate, stylesheet};
//!
//! let palette = generate("#01ca8a").unwrap();
//! assert_eq!(palette.light.get("--primary-foreground"), Some("#0f172a"));
//! assert_eq!(palette.light.charts().len(), 5);
//!
//! let css = stylesheet(&palette);
//! assert!(css.starts_with(":root { --background: "));
//! ```

pub mod css;
pub mod error;
pub mod palette;
pub mod sink;
pub mod state;

pub use css::{format_rules, stylesheet, DARK_SELECTOR, ROOT_SELECTOR};
pub use error::ThemeError;
pub use palette::{
    contrast_text, generate, generate_from, variable_names, Palette, PaletteSet, CHART_COUNT,
    VARIABLE_COUNT,
};
pub use sink::{FileStyleSink, MemoryStyleSink, StyleSink, STYLE_ELEMENT_ID};
pub use state::ThemeState;

// Theme wire types live in halo_core so the bridge can carry them.
pub use halo_core::{EffectMode, Platform, ThemeConfig, ThemeMode, DEFAULT_PRIMARY_HEX};
