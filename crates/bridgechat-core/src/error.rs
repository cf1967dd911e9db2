use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Failure while streaming a reply. Carries the text shown to the user.
    #[error("{0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl BridgeError {
    /// The single user-facing error the streaming client surfaces, whatever
    /// the underlying transport or provider failure was.
    pub fn provider_unavailable() -> Self {
        Self::Provider(crate::constants::messages::PROVIDER_FAILURE.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
