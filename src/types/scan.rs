//! Lidar measurement types

/// A single decoded lidar measurement
///
/// Produced only from raw device nodes; frames emit measurements in
/// ascending angular order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Signal quality (0-255, decoded to float)
    pub quality: f32,
    /// Angle in degrees (0 to 360)
    pub angle_deg: f32,
    /// Distance in millimeters
    pub distance_mm: f32,
}

impl Measurement {
    /// Create new measurement
    pub fn new(quality: f32, angle_deg: f32, distance_mm: f32) -> Self {
        Self {
            quality,
            angle_deg,
            distance_mm,
        }
    }

    /// Convert to Cartesian coordinates (x, y) in millimeters
    pub fn to_cartesian(&self) -> (f32, f32) {
        let angle_rad = self.angle_deg.to_radians();
        let x = self.distance_mm * angle_rad.cos();
        let y = self.distance_mm * angle_rad.sin();
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cartesian() {
        let m = Measurement::new(10.0, 0.0, 100.0);
        let (x, y) = m.to_cartesian();
        assert!((x - 100.0).abs() < 0.001);
        assert!(y.abs() < 0.001);

        let m = Measurement::new(10.0, 90.0, 100.0);
        let (x, y) = m.to_cartesian();
        assert!(x.abs() < 0.001);
        assert!((y - 100.0).abs() < 0.001);
    }
}
