//! Scan processing: projection and object detection
//!
//! Turns decoded frames into a 2D point cloud and groups nearby points
//! into detected objects. Distances are in millimeters throughout.

use crate::config::ProcessingConfig;
use crate::types::Measurement;

/// A point in the scanner's 2D frame, millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A cluster of points recognized as one object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedObject {
    /// Cluster centroid
    pub center: Point2D,
    /// Largest distance between any two points in the cluster
    pub extent_mm: f32,
    /// Bearing of the centroid from the scanner, degrees in [0, 360)
    pub bearing_deg: f32,
}

/// Frame-to-object pipeline
pub struct ScanProcessor {
    config: ProcessingConfig,
}

impl ScanProcessor {
    /// Create a processor with the given configuration
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Project a frame into Cartesian points.
    ///
    /// Takes every Nth measurement (the sample stride keeps the pairwise
    /// clustering cheap) and rotates the scan by +90 degrees so that the
    /// device's zero-angle reference points along the +y axis.
    pub fn project_frame(&self, frame: &[Measurement]) -> Vec<Point2D> {
        let stride = self.config.sample_stride.max(1);

        frame
            .iter()
            .step_by(stride)
            .filter(|m| m.quality > 0.0 && m.distance_mm > 0.0)
            .map(|m| {
                let angle_rad = (m.angle_deg + 90.0).to_radians();
                Point2D {
                    x: m.distance_mm * angle_rad.cos(),
                    y: m.distance_mm * angle_rad.sin(),
                }
            })
            .collect()
    }

    /// Group points into objects by proximity.
    ///
    /// Greedy single-pass clustering: each unused point seeds a cluster
    /// and collects every remaining point within the cluster threshold of
    /// the seed. Clusters smaller than the configured minimum are dropped.
    pub fn detect_objects(&self, points: &[Point2D]) -> Vec<DetectedObject> {
        let min_points = self.config.min_points_per_object;
        if points.len() < min_points {
            return Vec::new();
        }

        let mut used = vec![false; points.len()];
        let mut objects = Vec::new();

        for i in 0..points.len() {
            if used[i] {
                continue;
            }

            let mut cluster = vec![i];
            used[i] = true;

            for j in 0..points.len() {
                if !used[j] && points[i].distance_to(&points[j]) < self.config.cluster_threshold_mm
                {
                    cluster.push(j);
                    used[j] = true;
                }
            }

            if cluster.len() >= min_points {
                objects.push(Self::summarize(points, &cluster));
            }
        }

        objects
    }

    fn summarize(points: &[Point2D], cluster: &[usize]) -> DetectedObject {
        let n = cluster.len() as f32;
        let center = Point2D {
            x: cluster.iter().map(|&i| points[i].x).sum::<f32>() / n,
            y: cluster.iter().map(|&i| points[i].y).sum::<f32>() / n,
        };

        let mut extent_mm = 0.0f32;
        for (a, &i) in cluster.iter().enumerate() {
            for &j in &cluster[a + 1..] {
                extent_mm = extent_mm.max(points[i].distance_to(&points[j]));
            }
        }

        let bearing_deg = center.y.atan2(center.x).to_degrees().rem_euclid(360.0);

        DetectedObject {
            center,
            extent_mm,
            bearing_deg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> ScanProcessor {
        ScanProcessor::new(ProcessingConfig {
            cluster_threshold_mm: 200.0,
            min_points_per_object: 3,
            sample_stride: 1,
        })
    }

    #[test]
    fn test_projection_rotates_plus_90() {
        let p = processor();
        let frame = [Measurement::new(10.0, 0.0, 100.0)];
        let points = p.project_frame(&frame);

        assert_eq!(points.len(), 1);
        assert!(points[0].x.abs() < 0.001);
        assert!((points[0].y - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_projection_stride_sampling() {
        let p = ScanProcessor::new(ProcessingConfig {
            cluster_threshold_mm: 200.0,
            min_points_per_object: 3,
            sample_stride: 4,
        });

        let frame: Vec<Measurement> = (0..10)
            .map(|i| Measurement::new(10.0, i as f32, 100.0))
            .collect();

        // Indices 0, 4 and 8 survive the stride
        assert_eq!(p.project_frame(&frame).len(), 3);
    }

    #[test]
    fn test_too_few_points_no_objects() {
        let p = processor();
        let points = [
            Point2D { x: 0.0, y: 0.0 },
            Point2D { x: 10.0, y: 0.0 },
        ];
        assert!(p.detect_objects(&points).is_empty());
    }

    #[test]
    fn test_two_separated_clusters() {
        let p = processor();
        let points = [
            // Blob near (1000, 0)
            Point2D { x: 1000.0, y: 0.0 },
            Point2D { x: 1050.0, y: 20.0 },
            Point2D { x: 980.0, y: -30.0 },
            // Blob near (0, 2000)
            Point2D { x: 0.0, y: 2000.0 },
            Point2D { x: 40.0, y: 2050.0 },
            Point2D { x: -30.0, y: 1970.0 },
        ];

        let objects = p.detect_objects(&points);
        assert_eq!(objects.len(), 2);

        // First blob sits on the +x axis, second on the +y axis
        assert!(objects[0].bearing_deg < 5.0 || objects[0].bearing_deg > 355.0);
        assert!((objects[1].bearing_deg - 90.0).abs() < 5.0);

        assert!(objects[0].extent_mm > 0.0);
        assert!(objects[0].extent_mm < 200.0);
    }

    #[test]
    fn test_sparse_points_dropped() {
        let p = processor();
        // Three points, each further than the threshold from the others
        let points = [
            Point2D { x: 0.0, y: 0.0 },
            Point2D { x: 500.0, y: 0.0 },
            Point2D { x: 0.0, y: 500.0 },
        ];
        assert!(p.detect_objects(&points).is_empty());
    }
}
