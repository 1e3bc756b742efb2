//! Speed-to-volume curves: ordered `(speed_percent, volume)` control points
//! with linear interpolation in between.

use heapless::Vec;
use thiserror::Error;

pub const CURVE_POINTS_MAX: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    pub speed_pct: f32,
    pub volume: f32,
}

/// Rejection reasons for a malformed curve. All of these are fatal at load
/// time; a curve is never silently repaired.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("curve has {0} control points, the limit is {CURVE_POINTS_MAX}")]
    TooManyPoints(usize),
    #[error("curve must define a control point at 0 %")]
    MissingZeroPoint,
    #[error("curve must define a control point at 100 %")]
    MissingFullPoint,
    #[error("control point speed {0} is not finite")]
    NonFiniteSpeed(f32),
    #[error("control point speeds must be strictly ascending")]
    NonAscending,
    #[error("volume {0} is outside [0, 1]")]
    VolumeOutOfRange(f32),
}

/// Validated, immutable volume curve. Shared read-only once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeCurve {
    points: Vec<CurvePoint, CURVE_POINTS_MAX>,
}

impl VolumeCurve {
    /// Validates and loads raw `(speed_percent, volume)` pairs.
    pub fn from_points(raw: &[(f32, f32)]) -> Result<Self, CurveError> {
        if raw.len() > CURVE_POINTS_MAX {
            return Err(CurveError::TooManyPoints(raw.len()));
        }

        let mut points: Vec<CurvePoint, CURVE_POINTS_MAX> = Vec::new();
        for &(speed_pct, volume) in raw {
            // NaN would also sail through the ascending comparison below.
            if !speed_pct.is_finite() {
                return Err(CurveError::NonFiniteSpeed(speed_pct));
            }
            if !(0.0..=1.0).contains(&volume) {
                return Err(CurveError::VolumeOutOfRange(volume));
            }
            if let Some(previous) = points.last() {
                if speed_pct <= previous.speed_pct {
                    return Err(CurveError::NonAscending);
                }
            }
            // Capacity was checked up front.
            let _ = points.push(CurvePoint { speed_pct, volume });
        }

        match points.first() {
            Some(first) if first.speed_pct == 0.0 => {}
            _ => return Err(CurveError::MissingZeroPoint),
        }
        match points.last() {
            Some(last) if last.speed_pct == 100.0 => {}
            _ => return Err(CurveError::MissingFullPoint),
        }

        Ok(Self { points })
    }

    /// Volume for a normalized speed percentage. Inputs outside the defined
    /// range clamp to the nearest endpoint volume; 0 % and 100 % return the
    /// endpoint volumes exactly.
    pub fn volume_at(&self, speed_pct: f32) -> f32 {
        let first = self.points[0];
        if speed_pct <= first.speed_pct {
            return first.volume;
        }
        let last = self.points[self.points.len() - 1];
        if speed_pct >= last.speed_pct {
            return last.volume;
        }

        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if speed_pct <= hi.speed_pct {
                let t = (speed_pct - lo.speed_pct) / (hi.speed_pct - lo.speed_pct);
                return lo.volume + (hi.volume - lo.volume) * t;
            }
        }

        last.volume
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deconstr() -> VolumeCurve {
        VolumeCurve::from_points(&[(0.0, 0.0), (30.0, 0.3), (50.0, 1.0), (100.0, 0.7)]).unwrap()
    }

    #[test]
    fn endpoints_are_exact() {
        let curve = deconstr();
        assert_eq!(curve.volume_at(0.0), 0.0);
        assert_eq!(curve.volume_at(100.0), 0.7);
    }

    #[test]
    fn out_of_range_input_clamps() {
        let curve = deconstr();
        assert_eq!(curve.volume_at(-5.0), curve.volume_at(0.0));
        assert_eq!(curve.volume_at(140.0), curve.volume_at(100.0));
    }

    #[test]
    fn interpolates_between_control_points() {
        let curve = deconstr();
        let mid = curve.volume_at(40.0);
        assert!((mid - 0.65).abs() < 1e-6, "got {mid}");
        let descending = curve.volume_at(75.0);
        assert!((descending - 0.85).abs() < 1e-6, "got {descending}");
    }

    #[test]
    fn control_points_are_hit_exactly() {
        let curve = deconstr();
        assert!((curve.volume_at(30.0) - 0.3).abs() < 1e-6);
        assert!((curve.volume_at(50.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_missing_endpoints() {
        assert_eq!(
            VolumeCurve::from_points(&[(10.0, 0.0), (100.0, 1.0)]),
            Err(CurveError::MissingZeroPoint)
        );
        assert_eq!(
            VolumeCurve::from_points(&[(0.0, 0.0), (90.0, 1.0)]),
            Err(CurveError::MissingFullPoint)
        );
        assert_eq!(VolumeCurve::from_points(&[]), Err(CurveError::MissingZeroPoint));
    }

    #[test]
    fn rejects_non_ascending_speeds() {
        assert_eq!(
            VolumeCurve::from_points(&[(0.0, 0.0), (50.0, 0.5), (50.0, 0.6), (100.0, 1.0)]),
            Err(CurveError::NonAscending)
        );
        assert_eq!(
            VolumeCurve::from_points(&[(0.0, 0.0), (60.0, 0.5), (40.0, 0.6), (100.0, 1.0)]),
            Err(CurveError::NonAscending)
        );
    }

    #[test]
    fn rejects_volume_out_of_range() {
        assert_eq!(
            VolumeCurve::from_points(&[(0.0, 0.0), (100.0, 1.2)]),
            Err(CurveError::VolumeOutOfRange(1.2))
        );
        assert_eq!(
            VolumeCurve::from_points(&[(0.0, -0.1), (100.0, 1.0)]),
            Err(CurveError::VolumeOutOfRange(-0.1))
        );
    }

    #[test]
    fn rejects_non_finite_control_points() {
        assert!(matches!(
            VolumeCurve::from_points(&[(0.0, 0.0), (f32::NAN, 0.5), (100.0, 1.0)]),
            Err(CurveError::NonFiniteSpeed(_))
        ));
        assert!(matches!(
            VolumeCurve::from_points(&[(0.0, 0.0), (f32::INFINITY, 0.5), (100.0, 1.0)]),
            Err(CurveError::NonFiniteSpeed(_))
        ));
        // A NaN volume fails the range check rather than needing its own arm.
        assert!(matches!(
            VolumeCurve::from_points(&[(0.0, 0.0), (50.0, f32::NAN), (100.0, 1.0)]),
            Err(CurveError::VolumeOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_oversized_tables() {
        let raw: std::vec::Vec<(f32, f32)> = (0..=CURVE_POINTS_MAX as u32)
            .map(|i| (i as f32 * 100.0 / CURVE_POINTS_MAX as f32, 0.5))
            .collect();
        assert_eq!(
            VolumeCurve::from_points(&raw),
            Err(CurveError::TooManyPoints(CURVE_POINTS_MAX + 1))
        );
    }
}
