// src/geometry.rs - Joint angle calculation
//
// The measured angle is the interior angle at the vertex of a joint triplet,
// e.g. hip→knee→ankle for the knee.

use nalgebra::{Point2, Vector2};

use crate::error::{Result, TrackingError};

/// Rays shorter than this are treated as zero-length.
const MIN_RAY_LENGTH: f64 = 1e-9;

/// Interior angle ABC in degrees, always within [0, 180].
///
/// Both rays are converted to absolute angles with `atan2` and subtracted. When
/// the rays straddle the ±180° wrap the raw difference is reflex (> 180°), so it
/// is folded back to `360 - angle`.
///
/// Returns `TrackingError::DegenerateGeometry` when A or C coincides with the
/// vertex or a coordinate is not finite, instead of handing NaN to the counter.
pub fn joint_angle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Result<f64> {
    let ba: Vector2<f64> = a - b;
    let bc: Vector2<f64> = c - b;

    if !ba.iter().chain(bc.iter()).all(|v| v.is_finite()) {
        return Err(TrackingError::DegenerateGeometry);
    }
    if ba.norm() < MIN_RAY_LENGTH || bc.norm() < MIN_RAY_LENGTH {
        return Err(TrackingError::DegenerateGeometry);
    }

    let radians = ba.y.atan2(ba.x) - bc.y.atan2(bc.x);
    let mut angle = radians.to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }

    Ok(angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deg_point(degrees: f64) -> Point2<f64> {
        let r = degrees.to_radians();
        Point2::new(r.cos(), r.sin())
    }

    #[test]
    fn test_straight_limb() {
        let angle = joint_angle(
            &Point2::new(-1.0, 0.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
        )
        .unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_folded_limb() {
        let a = Point2::new(3.0, 4.0);
        let angle = joint_angle(&a, &Point2::new(0.0, 0.0), &a).unwrap();
        assert!(angle.abs() < 1e-9);
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle(
            &Point2::new(0.0, 0.0),
            &Point2::new(0.5, 0.0),
            &Point2::new(0.5, 0.5),
        )
        .unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflex_difference_is_folded() {
        // atan2 gives +170 and -170, a raw difference of 340
        let angle = joint_angle(&deg_point(170.0), &Point2::origin(), &deg_point(-170.0)).unwrap();
        assert!((angle - 20.0).abs() < 1e-9);

        let angle = joint_angle(&Point2::new(1.0, 0.0), &Point2::origin(), &deg_point(200.0)).unwrap();
        assert!((angle - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_argument_order_does_not_matter() {
        let a = Point2::new(640.0, 300.0);
        let b = Point2::new(655.0, 520.0);
        let c = Point2::new(610.0, 760.0);
        let forward = joint_angle(&a, &b, &c).unwrap();
        let backward = joint_angle(&c, &b, &a).unwrap();
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn test_output_stays_in_range() {
        let vertex = Point2::new(2.0, -1.0);
        for i in 0..72 {
            for j in 0..72 {
                let a = vertex + Vector2::new((i as f64 * 5.0).to_radians().cos(), (i as f64 * 5.0).to_radians().sin());
                let c = vertex + Vector2::new((j as f64 * 5.0).to_radians().cos(), (j as f64 * 5.0).to_radians().sin()) * 3.0;
                let angle = joint_angle(&a, &vertex, &c).unwrap();
                assert!((0.0..=180.0).contains(&angle), "angle {} out of range", angle);
            }
        }
    }

    #[test]
    fn test_degenerate_rays() {
        let b = Point2::new(1.0, 1.0);
        assert!(matches!(
            joint_angle(&b, &b, &Point2::new(2.0, 2.0)),
            Err(TrackingError::DegenerateGeometry)
        ));
        assert!(matches!(
            joint_angle(&Point2::new(0.0, 2.0), &b, &b),
            Err(TrackingError::DegenerateGeometry)
        ));
        assert!(matches!(
            joint_angle(&Point2::new(f64::NAN, 0.0), &b, &Point2::new(2.0, 2.0)),
            Err(TrackingError::DegenerateGeometry)
        ));
    }
}
