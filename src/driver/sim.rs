//! Simulated lidar backend
//!
//! Generates plausible scans of a simple room so the session layer and
//! downstream processing can run without hardware. The room is a slightly
//! undulating wall with two free-standing pillars; readings carry Gaussian
//! range noise and a small dropout rate that produces invalid (quality 0)
//! nodes, matching what real hardware emits.

use super::{DeviceInfo, LidarDriver, RawScanNode};
use crate::error::{Error, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Samples generated per revolution
const SAMPLES_PER_REV: usize = 720;

/// Base wall distance in millimeters
const ROOM_RADIUS_MM: f32 = 2500.0;

/// Amplitude of the wall undulation in millimeters
const WALL_AMPLITUDE_MM: f32 = 400.0;

/// Standard deviation of range noise in millimeters
const RANGE_STDDEV_MM: f32 = 10.0;

/// Probability of an invalid (no-return) reading
const DROPOUT_RATE: f32 = 0.02;

/// Free-standing pillars: (bearing_deg, distance_mm, angular_halfwidth_deg)
const PILLARS: [(f32, f32, f32); 2] = [(45.0, 1200.0, 12.0), (200.0, 1800.0, 8.0)];

/// Hardware-free lidar driver
pub struct SimulatedDriver {
    rng: SmallRng,
    port: Option<String>,
    motor_on: bool,
    scanning: bool,
    /// Bearing at which the next grab starts; advances between grabs so
    /// frames arrive rotated and the ascending sort is exercised
    phase_deg: f32,
}

impl SimulatedDriver {
    /// Create a simulator seeded from entropy
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_entropy())
    }

    /// Create a simulator with a fixed seed for reproducible scans
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self {
            rng,
            port: None,
            motor_on: false,
            scanning: false,
            phase_deg: 0.0,
        }
    }

    /// True range at a bearing, before noise
    fn range_at(bearing_deg: f32) -> f32 {
        for (pillar_bearing, pillar_dist, halfwidth) in PILLARS {
            let mut diff = (bearing_deg - pillar_bearing).abs();
            if diff > 180.0 {
                diff = 360.0 - diff;
            }
            if diff < halfwidth {
                return pillar_dist;
            }
        }
        ROOM_RADIUS_MM + WALL_AMPLITUDE_MM * (3.0 * bearing_deg.to_radians()).sin()
    }

    fn gaussian(&mut self, stddev: f32) -> f32 {
        let n: f32 = self.rng.sample(StandardNormal);
        n * stddev
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LidarDriver for SimulatedDriver {
    fn open(&mut self, port: &str, baud: u32) -> Result<()> {
        if port.is_empty() {
            return Err(Error::Driver("sim: no such port".to_string()));
        }
        log::debug!("sim: opened {} at {} baud", port, baud);
        self.port = Some(port.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.port = None;
        self.scanning = false;
        Ok(())
    }

    fn device_info(&mut self) -> Result<DeviceInfo> {
        if self.port.is_none() {
            return Err(Error::Driver("sim: transport not open".to_string()));
        }
        Ok(DeviceInfo {
            model: 0x53,
            firmware_version: 0x0102,
            hardware_version: 1,
            serial_number: *b"CHAKRA-SIM-0001\0",
        })
    }

    fn start_motor(&mut self) -> Result<()> {
        if self.port.is_none() {
            return Err(Error::Driver("sim: transport not open".to_string()));
        }
        self.motor_on = true;
        Ok(())
    }

    fn start_scan(&mut self, force: bool, _wait_ready: bool) -> Result<()> {
        if self.port.is_none() {
            return Err(Error::Driver("sim: transport not open".to_string()));
        }
        if !self.motor_on && !force {
            return Err(Error::Driver("sim: motor not running".to_string()));
        }
        self.scanning = true;
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<()> {
        self.scanning = false;
        Ok(())
    }

    fn stop_motor(&mut self) -> Result<()> {
        self.motor_on = false;
        Ok(())
    }

    fn grab_scan(&mut self, nodes: &mut [RawScanNode]) -> Result<usize> {
        if !self.scanning {
            return Err(Error::Driver("sim: scan not started".to_string()));
        }

        let count = SAMPLES_PER_REV.min(nodes.len());
        let step = 360.0 / SAMPLES_PER_REV as f32;

        for (i, node) in nodes.iter_mut().enumerate().take(count) {
            let bearing = (self.phase_deg + i as f32 * step).rem_euclid(360.0);

            if self.rng.gen::<f32>() < DROPOUT_RATE {
                *node = RawScanNode {
                    quality: 0,
                    angle_q14: (bearing / 90.0 * (1 << 14) as f32) as u16,
                    dist_mm_q2: 0,
                };
                continue;
            }

            let distance = (Self::range_at(bearing) + self.gaussian(RANGE_STDDEV_MM)).max(1.0);
            let quality = (200.0 - distance * 0.04).clamp(1.0, 255.0) as u8;

            *node = RawScanNode {
                quality,
                angle_q14: (bearing / 90.0 * (1 << 14) as f32) as u16,
                dist_mm_q2: (distance * 4.0) as u32,
            };
        }

        // Desynchronize the next grab from the revolution boundary
        self.phase_deg = (self.phase_deg + 17.0).rem_euclid(360.0);

        Ok(count)
    }

    fn sort_ascending(&mut self, nodes: &mut [RawScanNode]) -> Result<()> {
        nodes.sort_unstable_by_key(|n| n.angle_q14);
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()> {
        Ok(())
    }
}
