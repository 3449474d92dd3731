use thiserror::Error;

/// Failures on the bridge between the page and the native process.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The calling frame's origin is not one we serve.
    #[error("malicious event frame detected: {url}")]
    SecurityViolation { url: String },

    #[error("no handler registered for channel '{0}'")]
    UnknownChannel(String),

    #[error("invalid payload on channel '{channel}': {source}")]
    InvalidPayload {
        channel: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize payload for channel '{channel}': {source}")]
    Serialize {
        channel: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to deliver '{channel}' notification: {reason}")]
    Delivery { channel: String, reason: String },
}

impl BridgeError {
    pub fn is_security_violation(&self) -> bool {
        matches!(self, BridgeError::SecurityViolation { .. })
    }
}

#[derive(Debug, Error)]
pub enum PathError {
    #[error("application root is not an absolute path: {0}")]
    NotAbsolute(std::path::PathBuf),

    #[error("could not determine application root: {0}")]
    RootUnavailable(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session already started; only one window is supported")]
    AlreadyStarted,

    #[error("session has terminated")]
    Terminated,
}
