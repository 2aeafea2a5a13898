use thiserror::Error;

/// Failure talking to the native host process.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The host ran the command and reported an error.
    #[error("backend command `{command}` failed: {message}")]
    Command { command: String, message: String },

    /// The transport went away before a response arrived.
    #[error("backend bridge closed")]
    Closed,

    #[error("backend payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("backend transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }
}
