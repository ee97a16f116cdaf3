use glam::DVec3;

/// A point cloud expressed in the frame of the rectified camera.
///
/// Points keep the order in which they were produced (raster order for
/// clouds computed from a depth field); consumers should not rely on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
}

impl PointCloud {
    /// Create a new point cloud from points.
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        Self { points }
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Consume the point cloud and return its points.
    pub fn into_points(self) -> Vec<[f64; 3]> {
        self.points
    }

    /// Get the minimum bound of the point cloud, `None` if it is empty.
    pub fn min_bound(&self) -> Option<DVec3> {
        self.points
            .iter()
            .map(|p| DVec3::from_array(*p))
            .reduce(DVec3::min)
    }

    /// Get the maximum bound of the point cloud, `None` if it is empty.
    pub fn max_bound(&self) -> Option<DVec3> {
        self.points
            .iter()
            .map(|p| DVec3::from_array(*p))
            .reduce(DVec3::max)
    }
}

impl From<Vec<[f64; 3]>> for PointCloud {
    fn from(points: Vec<[f64; 3]>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointcloud() {
        let pointcloud = PointCloud::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);

        assert_eq!(pointcloud.len(), 2);
        assert!(!pointcloud.is_empty());

        if let Some(p1) = pointcloud.points().last() {
            assert_eq!(p1[0], 1.0);
            assert_eq!(p1[1], 0.0);
            assert_eq!(p1[2], 0.0);
        }
    }

    #[test]
    fn test_pointcloud_bounds() {
        let pointcloud = PointCloud::from(vec![[1.0, -2.0, 3.0], [-1.0, 4.0, 0.5]]);
        assert_eq!(pointcloud.min_bound(), Some(DVec3::new(-1.0, -2.0, 0.5)));
        assert_eq!(pointcloud.max_bound(), Some(DVec3::new(1.0, 4.0, 3.0)));

        let empty = PointCloud::default();
        assert!(empty.is_empty());
        assert_eq!(empty.min_bound(), None);
    }
}
