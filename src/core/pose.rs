/// Position estimate of the robot.
///
/// The coarse estimate counts forward drive pulses and only ever grows. The
/// accurate estimate is derived from the apparent width of a known landmark
/// and is overwritten, not accumulated, whenever the landmark is reliably
/// measured.
#[derive(Clone, Copy, Debug, Default)]
pub struct Odometry {
    position: f32,
    accurate_position: f32,
}

impl Odometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse position in drive pulses.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Landmark derived position in feet.
    pub fn accurate_position(&self) -> f32 {
        self.accurate_position
    }

    /// Credit forward motion to the coarse estimate.
    pub fn advance(&mut self, pulses: f32) {
        self.position += pulses;

        trace!("Position: {:.1}", self.position);
    }

    /// Fix the accurate estimate from a landmark bounding box width.
    ///
    /// Pinhole camera inverse tangent estimate against a landmark of known
    /// physical size.
    pub fn fix_from_landmark_width(&mut self, width: i32) {
        self.accurate_position =
            1.0 / (3.0 * (width as f32 * std::f32::consts::PI / 2400.0).tan());

        trace!("Accurate position: {:.2}", self.accurate_position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates() {
        let mut odometry = Odometry::new();

        odometry.advance(1.5);
        odometry.advance(1.0);

        assert!((odometry.position() - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_landmark_fix_overwrites() {
        let mut odometry = Odometry::new();

        odometry.fix_from_landmark_width(100);
        let first = odometry.accurate_position();

        odometry.fix_from_landmark_width(200);
        let second = odometry.accurate_position();

        // A wider box means a closer landmark, not an accumulated distance.
        assert!(second < first);
        assert!(second > 0.0);
    }
}
