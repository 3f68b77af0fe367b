//! Error types for ChakraLidar

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ChakraLidar error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Failure reported by the underlying lidar driver
    #[error("Driver error: {0}")]
    Driver(String),

    /// Operation requires a connected session
    #[error("Device not connected")]
    NotConnected,

    /// Unknown driver backend name in configuration
    #[error("Unknown lidar driver: {0}")]
    UnknownDriver(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
