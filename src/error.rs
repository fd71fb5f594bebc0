use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the particle box.
///
/// The physics step itself never fails; these variants cover the edges where
/// untrusted input enters: configuration, explicit particle state and resize
/// notifications.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Malformed TOML configuration.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Propagated I/O errors (reading a config file).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
