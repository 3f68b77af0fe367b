//! ChakraLidar - device session layer for spinning lidar scanners
//!
//! Owns the connect → scan → disconnect lifecycle of a single lidar unit
//! and decodes raw measurement nodes into (quality, angle, distance)
//! triples. The vendor wire protocol stays behind the
//! [`driver::LidarDriver`] trait; a simulated backend allows running
//! without hardware.

pub mod config;
pub mod driver;
pub mod error;
pub mod processing;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use session::LidarSession;
pub use types::Measurement;
