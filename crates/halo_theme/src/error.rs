use halo_core::{BridgeError, ColorParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("invalid primary color: {0}")]
    InvalidColor(#[from] ColorParseError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("failed to write stylesheet: {0}")]
    Sink(#[from] std::io::Error),
}
