//! Lidar device session
//!
//! Owns the connect → scan → disconnect lifecycle of a single scanner.
//! The session is single-threaded and blocking: every call completes or
//! fails on the calling thread, and `&mut self` leaves serialization to
//! the caller. Failures surface as `false` or an empty frame rather than
//! errors, so a bad scan cycle never has to unwind the caller; the
//! underlying driver error is logged.

use crate::driver::{DriverFactory, LidarDriver, RawScanNode, BAUD_RATE, GRAB_CAPACITY};
use crate::error::Result;
use crate::types::Measurement;

/// Connection state: the driver handle exists exactly while connected
enum SessionState {
    Disconnected,
    Connected(Box<dyn LidarDriver>),
}

/// One logical connection to a lidar device
///
/// # Example
/// ```no_run
/// use chakra_lidar::driver::SimulatedDriver;
/// use chakra_lidar::session::LidarSession;
///
/// let mut session = LidarSession::new(Box::new(|| Ok(Box::new(SimulatedDriver::new()))));
/// if session.connect("/dev/ttyUSB0") && session.start_acquisition() {
///     let frame = session.fetch_frame();
///     println!("{} measurements", frame.len());
/// }
/// ```
pub struct LidarSession {
    factory: DriverFactory,
    state: SessionState,
    /// Reused across fetches to avoid a per-frame allocation in the
    /// polling loop
    scan_buf: Vec<RawScanNode>,
}

impl LidarSession {
    /// Create a session in the disconnected state
    pub fn new(factory: DriverFactory) -> Self {
        Self {
            factory,
            state: SessionState::Disconnected,
            scan_buf: vec![RawScanNode::default(); GRAB_CAPACITY],
        }
    }

    /// Whether the session currently holds a connected driver
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    /// Open the device on the given port at 115200 baud.
    ///
    /// Creates a driver instance, opens the transport and queries device
    /// identity as a liveness check. On failure at any step everything
    /// acquired so far is released and the session stays disconnected,
    /// so a retry starts from a clean slate. A session that is already
    /// connected is disconnected first.
    pub fn connect(&mut self, port: &str) -> bool {
        if self.is_connected() {
            log::warn!("connect called while connected; disconnecting first");
            self.disconnect();
        }

        match self.try_connect(port) {
            Ok(driver) => {
                self.state = SessionState::Connected(driver);
                true
            }
            Err(e) => {
                log::warn!("Failed to connect to lidar on {}: {}", port, e);
                false
            }
        }
    }

    fn try_connect(&self, port: &str) -> Result<Box<dyn LidarDriver>> {
        let mut driver = (self.factory)()?;
        // Any early return drops the instance, which releases the handle
        // and any open transport
        driver.open(port, BAUD_RATE)?;
        let info = driver.device_info()?;
        log::info!(
            "Connected to lidar on {} (model 0x{:02X}, firmware {}.{}, hardware {})",
            port,
            info.model,
            info.firmware_major(),
            info.firmware_minor(),
            info.hardware_version
        );
        Ok(driver)
    }

    /// Stop scanning, close the transport and release the driver.
    ///
    /// Idempotent; a no-op when already disconnected.
    pub fn disconnect(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Disconnected);
        if let SessionState::Connected(mut driver) = state {
            // Stop calls are best-effort on the way out
            let _ = driver.stop_scan();
            let _ = driver.stop_motor();
            if let Err(e) = driver.close() {
                log::warn!("Error closing lidar transport: {}", e);
            }
            log::info!("Lidar disconnected");
        }
    }

    /// Start the motor and request continuous scanning.
    ///
    /// Returns `false` immediately when disconnected. Scanning is
    /// requested in default (non-forced) mode with data-ready waiting.
    /// If scan-start fails the motor is stopped again before returning,
    /// leaving the device idle.
    pub fn start_acquisition(&mut self) -> bool {
        let SessionState::Connected(driver) = &mut self.state else {
            return false;
        };

        if let Err(e) = driver.start_motor() {
            log::warn!("Failed to start lidar motor: {}", e);
            return false;
        }

        if let Err(e) = driver.start_scan(false, true) {
            log::warn!("Failed to start lidar scan: {}", e);
            let _ = driver.stop_motor();
            return false;
        }

        log::info!("Lidar acquisition started");
        true
    }

    /// Issue stop-scan followed by stop-motor.
    ///
    /// Returns `false` when disconnected; otherwise returns `true` once
    /// the stops have been issued (the driver's stop calls are treated as
    /// best-effort, not verified).
    pub fn stop_acquisition(&mut self) -> bool {
        let SessionState::Connected(driver) = &mut self.state else {
            return false;
        };

        let _ = driver.stop_scan();
        let _ = driver.stop_motor();
        log::info!("Lidar acquisition stopped");
        true
    }

    /// Fetch one frame of measurements in ascending angular order.
    ///
    /// Returns an empty vector when disconnected or when the driver has
    /// no data — callers treat both as "nothing yet" and poll at their
    /// own cadence. Up to 8192 raw nodes are retrieved per call; nodes
    /// with quality 0 or distance 0 are invalid readings and are dropped.
    pub fn fetch_frame(&mut self) -> Vec<Measurement> {
        let SessionState::Connected(driver) = &mut self.state else {
            return Vec::new();
        };

        let count = match driver.grab_scan(&mut self.scan_buf) {
            Ok(count) => count.min(self.scan_buf.len()),
            Err(e) => {
                log::debug!("Lidar grab failed: {}", e);
                return Vec::new();
            }
        };

        let nodes = &mut self.scan_buf[..count];
        if let Err(e) = driver.sort_ascending(nodes) {
            log::debug!("Lidar scan sort failed: {}", e);
        }

        nodes
            .iter()
            .map(RawScanNode::decode)
            .filter(|m| m.quality > 0.0 && m.distance_mm > 0.0)
            .collect()
    }

    /// Discard buffered but unread transport bytes.
    ///
    /// Used to recover from stale-data conditions before a fresh
    /// acquisition cycle. No-op when disconnected.
    pub fn flush_input(&mut self) {
        if let SessionState::Connected(driver) = &mut self.state {
            if let Err(e) = driver.clear_input() {
                log::debug!("Lidar input flush failed: {}", e);
            }
        }
    }
}

impl Drop for LidarSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    fn session_with(mock: &MockDriver) -> LidarSession {
        LidarSession::new(mock.factory())
    }

    #[test]
    fn test_initially_disconnected() {
        let mock = MockDriver::new();
        let session = session_with(&mock);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_connect_success() {
        let mock = MockDriver::new();
        let mut session = session_with(&mock);

        assert!(session.connect("/dev/ttyUSB0"));
        assert!(session.is_connected());
        assert_eq!(mock.calls(), vec!["create", "open", "device_info"]);
        assert_eq!(mock.live_instances(), 1);
    }

    #[test]
    fn test_connect_open_failure_releases_driver() {
        let mock = MockDriver::new();
        mock.fail_open(true);
        let mut session = session_with(&mock);

        assert!(!session.connect("/dev/ttyUSB0"));
        assert!(!session.is_connected());
        assert_eq!(mock.live_instances(), 0);
    }

    #[test]
    fn test_connect_retry_after_info_failure() {
        let mock = MockDriver::new();
        mock.fail_device_info(true);
        let mut session = session_with(&mock);

        assert!(!session.connect("/dev/ttyUSB0"));
        assert!(!session.is_connected());
        assert_eq!(mock.live_instances(), 0);

        // A later attempt is independent of the failed one
        mock.fail_device_info(false);
        assert!(session.connect("/dev/ttyUSB0"));
        assert!(session.is_connected());
    }

    #[test]
    fn test_disconnect_idempotent() {
        let mock = MockDriver::new();
        let mut session = session_with(&mock);
        assert!(session.connect("/dev/ttyUSB0"));

        session.disconnect();
        assert!(!session.is_connected());
        assert_eq!(mock.live_instances(), 0);

        let calls_after_first = mock.calls();
        session.disconnect();
        assert!(!session.is_connected());
        assert_eq!(mock.calls(), calls_after_first);
    }

    #[test]
    fn test_disconnect_ordering() {
        let mock = MockDriver::new();
        let mut session = session_with(&mock);
        assert!(session.connect("/dev/ttyUSB0"));
        mock.clear_calls();

        session.disconnect();
        assert_eq!(
            mock.calls(),
            vec!["stop_scan", "stop_motor", "close", "dispose"]
        );
    }

    #[test]
    fn test_acquisition_requires_connection() {
        let mock = MockDriver::new();
        let mut session = session_with(&mock);

        assert!(!session.start_acquisition());
        assert!(!session.stop_acquisition());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_scan_start_failure_stops_motor() {
        let mock = MockDriver::new();
        mock.fail_start_scan(true);
        let mut session = session_with(&mock);
        assert!(session.connect("/dev/ttyUSB0"));

        assert!(!session.start_acquisition());
        assert!(!mock.motor_on());
        let calls = mock.calls();
        assert!(calls.ends_with(&["start_motor", "start_scan", "stop_motor"]));
    }

    #[test]
    fn test_fetch_frame_disconnected_is_empty() {
        let mock = MockDriver::new();
        let mut session = session_with(&mock);
        assert!(session.fetch_frame().is_empty());
    }

    #[test]
    fn test_fetch_frame_filters_invalid_nodes() {
        let mock = MockDriver::new();
        mock.set_scan_nodes(vec![
            // No return: quality 0
            RawScanNode {
                quality: 0,
                angle_q14: 100,
                dist_mm_q2: 400,
            },
            // No return: distance 0
            RawScanNode {
                quality: 20,
                angle_q14: 200,
                dist_mm_q2: 0,
            },
            // Valid: 100.0 mm at 90 degrees
            RawScanNode {
                quality: 10,
                angle_q14: 16384,
                dist_mm_q2: 400,
            },
        ]);
        let mut session = session_with(&mock);
        assert!(session.connect("/dev/ttyUSB0"));
        assert!(session.start_acquisition());

        let frame = session.fetch_frame();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].quality, 10.0);
        assert_eq!(frame[0].angle_deg, 90.0);
        assert_eq!(frame[0].distance_mm, 100.0);
    }

    #[test]
    fn test_fetch_frame_sorted_ascending() {
        let mock = MockDriver::new();
        mock.set_scan_nodes(vec![
            RawScanNode {
                quality: 10,
                angle_q14: 30000,
                dist_mm_q2: 400,
            },
            RawScanNode {
                quality: 10,
                angle_q14: 1000,
                dist_mm_q2: 800,
            },
            RawScanNode {
                quality: 10,
                angle_q14: 16384,
                dist_mm_q2: 1200,
            },
        ]);
        let mut session = session_with(&mock);
        assert!(session.connect("/dev/ttyUSB0"));

        let frame = session.fetch_frame();
        assert_eq!(frame.len(), 3);
        assert!(frame.windows(2).all(|w| w[0].angle_deg <= w[1].angle_deg));
    }

    #[test]
    fn test_fetch_frame_grab_failure_is_empty() {
        let mock = MockDriver::new();
        mock.fail_grab(true);
        let mut session = session_with(&mock);
        assert!(session.connect("/dev/ttyUSB0"));
        assert!(session.fetch_frame().is_empty());
    }

    #[test]
    fn test_flush_input() {
        let mock = MockDriver::new();
        let mut session = session_with(&mock);

        // No-op while disconnected
        session.flush_input();
        assert!(mock.calls().is_empty());

        assert!(session.connect("/dev/ttyUSB0"));
        mock.clear_calls();
        session.flush_input();
        assert_eq!(mock.calls(), vec!["clear_input"]);
    }

    #[test]
    fn test_drop_disconnects() {
        let mock = MockDriver::new();
        {
            let mut session = session_with(&mock);
            assert!(session.connect("/dev/ttyUSB0"));
            assert_eq!(mock.live_instances(), 1);
        }
        assert_eq!(mock.live_instances(), 0);
        assert!(!mock.is_open());
    }
}
