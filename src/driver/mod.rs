//! Lidar driver boundary
//!
//! The vendor wire protocol (serial framing, checksums, motor PWM) lives
//! behind the [`LidarDriver`] trait. This crate never parses the device
//! protocol itself; it consumes the driver surface the way a binding layer
//! consumes a vendor SDK. Backends are selected by name via
//! [`create_factory`].

mod mock;
mod sim;

pub use mock::MockDriver;
pub use sim::SimulatedDriver;

use crate::config::LidarConfig;
use crate::error::{Error, Result};
use crate::types::Measurement;

/// Fixed baud rate for the device transport
pub const BAUD_RATE: u32 = 115_200;

/// Hard ceiling of raw nodes retrieved per grab call.
///
/// Frames with more raw nodes are truncated by the driver, not by the
/// session layer.
pub const GRAB_CAPACITY: usize = 8192;

/// A raw measurement node in the device's native fixed-point encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawScanNode {
    /// Signal quality (0 = invalid/no return)
    pub quality: u8,
    /// Angle with 14 fractional bits, scaled so that 2^16 spans 360 degrees
    pub angle_q14: u16,
    /// Distance in millimeters with 2 fractional bits
    pub dist_mm_q2: u32,
}

impl RawScanNode {
    /// Decode into engineering units.
    ///
    /// The scaling factors are dictated by the device's native encoding:
    /// angle is q14 scaled over a 0-360 degree range (multiply by 90),
    /// distance is quarter-millimeters (divide by 4).
    pub fn decode(&self) -> Measurement {
        Measurement {
            quality: self.quality as f32,
            angle_deg: self.angle_q14 as f32 * 90.0 / (1 << 14) as f32,
            distance_mm: self.dist_mm_q2 as f32 / 4.0,
        }
    }
}

/// Device identity returned by the driver's info query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device model code
    pub model: u8,
    /// Firmware version, major byte high, minor byte low
    pub firmware_version: u16,
    /// Hardware revision
    pub hardware_version: u8,
    /// Device serial number
    pub serial_number: [u8; 16],
}

impl DeviceInfo {
    /// Firmware major version
    pub fn firmware_major(&self) -> u8 {
        (self.firmware_version >> 8) as u8
    }

    /// Firmware minor version
    pub fn firmware_minor(&self) -> u8 {
        (self.firmware_version & 0xFF) as u8
    }
}

/// Vendor driver boundary trait
///
/// One instance corresponds to one vendor driver handle. Implementations
/// must release any open transport when dropped; dropping an instance is
/// the "dispose" operation of the vendor surface.
pub trait LidarDriver: Send {
    /// Open the transport on the given port at the given baud rate
    fn open(&mut self, port: &str, baud: u32) -> Result<()>;

    /// Close the transport
    fn close(&mut self) -> Result<()>;

    /// Query device identity (used as a liveness check after open)
    fn device_info(&mut self) -> Result<DeviceInfo>;

    /// Start the physical rotation mechanism
    fn start_motor(&mut self) -> Result<()>;

    /// Request continuous scanning
    ///
    /// `force` requests measurements even when the motor is not up to
    /// speed; `wait_ready` blocks until the device reports data ready.
    fn start_scan(&mut self, force: bool, wait_ready: bool) -> Result<()>;

    /// Stop the measurement process
    fn stop_scan(&mut self) -> Result<()>;

    /// Stop the rotation mechanism
    fn stop_motor(&mut self) -> Result<()>;

    /// Fetch up to `nodes.len()` raw nodes, returning the count retrieved
    fn grab_scan(&mut self, nodes: &mut [RawScanNode]) -> Result<usize>;

    /// Reorder nodes into ascending angular order
    fn sort_ascending(&mut self, nodes: &mut [RawScanNode]) -> Result<()>;

    /// Discard buffered but unread transport bytes
    fn clear_input(&mut self) -> Result<()>;
}

/// Factory producing fresh driver instances ("create instance" in the
/// vendor surface)
pub type DriverFactory = Box<dyn Fn() -> Result<Box<dyn LidarDriver>> + Send>;

/// Create a driver factory for the configured backend
///
/// Currently supported backends:
/// - `sim`: hardware-free simulated scanner
pub fn create_factory(config: &LidarConfig) -> Result<DriverFactory> {
    match config.driver.as_str() {
        "sim" => Ok(Box::new(|| Ok(Box::new(SimulatedDriver::new())))),
        other => Err(Error::UnknownDriver(other.to_string())),
    }
}
