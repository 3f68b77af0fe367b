//! Configuration for ChakraLidar
//!
//! Loads configuration from a TOML file with the minimal parameters the
//! acquisition loop needs.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub lidar: LidarConfig,
    pub acquisition: AcquisitionConfig,
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

/// Lidar device configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LidarConfig {
    /// Driver backend name (currently only "sim")
    pub driver: String,
    /// Serial port identifier (e.g. "/dev/ttyUSB0" or "COM5")
    pub port: String,
}

/// Acquisition loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// How often processed output is produced, in milliseconds
    pub update_interval_ms: u64,
    /// Sleep between polls when no frame is available, in milliseconds
    pub idle_sleep_ms: u64,
    /// Flush the device input buffer every N fetched frames
    pub flush_interval_frames: u32,
}

/// Scan processing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    /// Points closer than this are grouped into one object, millimeters
    pub cluster_threshold_mm: f32,
    /// Clusters with fewer points than this are discarded
    pub min_points_per_object: usize,
    /// Keep every Nth measurement when projecting a frame
    pub sample_stride: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lidar: LidarConfig {
                driver: "sim".to_string(),
                port: "/dev/ttyUSB0".to_string(),
            },
            acquisition: AcquisitionConfig {
                update_interval_ms: 100,
                idle_sleep_ms: 10,
                flush_interval_frames: 3,
            },
            processing: ProcessingConfig {
                cluster_threshold_mm: 200.0,
                min_points_per_object: 3,
                sample_stride: 4,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
