//! Halo Core
//!
//! Shared building blocks for the Halo shell crates:
//!
//! - **Color math**: hex parsing, HSL conversion, lightness/hue adjustments and
//!   harmonies used by the palette generator
//! - **Backend bridge**: the async command surface of the native host process,
//!   plus an in-process implementation and a line-delimited JSON transport
//! - **Events**: backend-originated update events for config and settings
//! - **Model**: wire types shared by both sides (theme configuration)
//!
//! # Example
//!
//! ```rust
//! use halo_core::Color;
//!
//! let seed: Color = "#01ca8a".parse().unwrap();
//! let hsl = seed.to_hsla();
//! assert!(!seed.is_dark());
//! assert_eq!(hsl.to_css(), "hsl(161.0 99.0% 40.0%)");
//! ```

pub mod bridge;
pub mod color;
pub mod error;
pub mod events;
pub mod model;

pub use bridge::{commands, Backend, JsonLineBridge, MemoryBackend, RecordedCall};
pub use color::{Color, ColorParseError, Harmony, Hsla};
pub use error::BridgeError;
pub use events::{BackendEvent, EventKind, UpdatePayload};
pub use model::{EffectMode, Platform, ThemeConfig, ThemeMode, DEFAULT_PRIMARY_HEX};
