//! Mock driver for unit and integration testing
//!
//! The mock is a shared handle: the test keeps a [`MockDriver`] for
//! scripting failures and inspecting calls, while the session consumes
//! instances produced by [`MockDriver::factory`]. All clones and instances
//! share one state.

use super::{DeviceInfo, DriverFactory, LidarDriver, RawScanNode};
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex};

/// Scriptable mock of the vendor driver boundary
#[derive(Clone, Default)]
pub struct MockDriver {
    inner: Arc<Mutex<MockDriverInner>>,
}

#[derive(Default)]
struct MockDriverInner {
    fail_open: bool,
    fail_device_info: bool,
    fail_start_motor: bool,
    fail_start_scan: bool,
    fail_grab: bool,
    open: bool,
    motor_on: bool,
    scanning: bool,
    nodes: Vec<RawScanNode>,
    calls: Vec<&'static str>,
    live_instances: usize,
}

impl MockDriver {
    /// Create a new mock driver handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory producing instances that share this handle's state
    pub fn factory(&self) -> DriverFactory {
        let handle = self.clone();
        Box::new(move || {
            let mut inner = handle.inner.lock().unwrap();
            inner.calls.push("create");
            inner.live_instances += 1;
            Ok(Box::new(MockInstance {
                shared: Arc::clone(&handle.inner),
            }))
        })
    }

    /// Make the next `open` calls fail
    pub fn fail_open(&self, fail: bool) {
        self.inner.lock().unwrap().fail_open = fail;
    }

    /// Make the next `device_info` calls fail
    pub fn fail_device_info(&self, fail: bool) {
        self.inner.lock().unwrap().fail_device_info = fail;
    }

    /// Make the next `start_motor` calls fail
    pub fn fail_start_motor(&self, fail: bool) {
        self.inner.lock().unwrap().fail_start_motor = fail;
    }

    /// Make the next `start_scan` calls fail
    pub fn fail_start_scan(&self, fail: bool) {
        self.inner.lock().unwrap().fail_start_scan = fail;
    }

    /// Make the next `grab_scan` calls fail
    pub fn fail_grab(&self, fail: bool) {
        self.inner.lock().unwrap().fail_grab = fail;
    }

    /// Set the raw nodes returned by subsequent `grab_scan` calls
    pub fn set_scan_nodes(&self, nodes: Vec<RawScanNode>) {
        self.inner.lock().unwrap().nodes = nodes;
    }

    /// All driver operations invoked so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Clear the recorded call log
    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    /// Number of driver instances created but not yet disposed
    pub fn live_instances(&self) -> usize {
        self.inner.lock().unwrap().live_instances
    }

    /// Whether the motor is currently running
    pub fn motor_on(&self) -> bool {
        self.inner.lock().unwrap().motor_on
    }

    /// Whether the transport is currently open
    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().open
    }
}

struct MockInstance {
    shared: Arc<Mutex<MockDriverInner>>,
}

impl Drop for MockInstance {
    fn drop(&mut self) {
        let mut inner = self.shared.lock().unwrap();
        inner.open = false;
        inner.live_instances -= 1;
        inner.calls.push("dispose");
    }
}

impl LidarDriver for MockInstance {
    fn open(&mut self, _port: &str, _baud: u32) -> Result<()> {
        let mut inner = self.shared.lock().unwrap();
        inner.calls.push("open");
        if inner.fail_open {
            return Err(Error::Driver("mock: open failed".to_string()));
        }
        inner.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut inner = self.shared.lock().unwrap();
        inner.calls.push("close");
        inner.open = false;
        Ok(())
    }

    fn device_info(&mut self) -> Result<DeviceInfo> {
        let mut inner = self.shared.lock().unwrap();
        inner.calls.push("device_info");
        if inner.fail_device_info {
            return Err(Error::Driver("mock: device info failed".to_string()));
        }
        Ok(DeviceInfo {
            model: 0x18,
            firmware_version: 0x011D,
            hardware_version: 1,
            serial_number: [0xAB; 16],
        })
    }

    fn start_motor(&mut self) -> Result<()> {
        let mut inner = self.shared.lock().unwrap();
        inner.calls.push("start_motor");
        if inner.fail_start_motor {
            return Err(Error::Driver("mock: start motor failed".to_string()));
        }
        inner.motor_on = true;
        Ok(())
    }

    fn start_scan(&mut self, _force: bool, _wait_ready: bool) -> Result<()> {
        let mut inner = self.shared.lock().unwrap();
        inner.calls.push("start_scan");
        if inner.fail_start_scan {
            return Err(Error::Driver("mock: start scan failed".to_string()));
        }
        inner.scanning = true;
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<()> {
        let mut inner = self.shared.lock().unwrap();
        inner.calls.push("stop_scan");
        inner.scanning = false;
        Ok(())
    }

    fn stop_motor(&mut self) -> Result<()> {
        let mut inner = self.shared.lock().unwrap();
        inner.calls.push("stop_motor");
        inner.motor_on = false;
        Ok(())
    }

    fn grab_scan(&mut self, nodes: &mut [RawScanNode]) -> Result<usize> {
        let mut inner = self.shared.lock().unwrap();
        inner.calls.push("grab_scan");
        if inner.fail_grab {
            return Err(Error::Driver("mock: grab failed".to_string()));
        }
        let count = inner.nodes.len().min(nodes.len());
        nodes[..count].copy_from_slice(&inner.nodes[..count]);
        Ok(count)
    }

    fn sort_ascending(&mut self, nodes: &mut [RawScanNode]) -> Result<()> {
        self.shared.lock().unwrap().calls.push("sort_ascending");
        nodes.sort_unstable_by_key(|n| n.angle_q14);
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()> {
        self.shared.lock().unwrap().calls.push("clear_input");
        Ok(())
    }
}
