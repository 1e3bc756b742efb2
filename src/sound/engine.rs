//! Multi-track volume engine: maps the wheel speed through each track's
//! curve and eases the live gain toward the target once per control tick.

use heapless::Vec;
use thiserror::Error;

use crate::config::SoundConfig;
use crate::sound::curve::{CurveError, VolumeCurve};

pub const TRACKS_MAX: usize = 8;

/// Final gain for one track after smoothing and master scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackGain {
    pub track: &'static str,
    pub gain: f32,
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum SoundConfigError {
    #[error("track {0}: {1}")]
    Curve(&'static str, CurveError),
    #[error("{0} tracks configured, the limit is {TRACKS_MAX}")]
    TooManyTracks(usize),
    #[error("lerp rate {0} is outside (0, 1]")]
    LerpRateOutOfRange(f32),
    #[error("max speed {0} km/h must be positive")]
    NonPositiveMaxSpeed(f32),
}

struct TrackMix {
    name: &'static str,
    curve: VolumeCurve,
    current: f32,
}

/// Per-track smoothing state driven by a single speed signal. Tracks never
/// share gain state; each converges toward its own curve target.
pub struct SoundEngine {
    tracks: Vec<TrackMix, TRACKS_MAX>,
    max_speed_kmh: f32,
    lerp_rate: f32,
}

impl SoundEngine {
    /// Builds the engine, rejecting the whole configuration on the first
    /// malformed curve or parameter.
    pub fn new(config: &SoundConfig) -> Result<Self, SoundConfigError> {
        if config.tracks.len() > TRACKS_MAX {
            return Err(SoundConfigError::TooManyTracks(config.tracks.len()));
        }
        if !(config.lerp_rate > 0.0 && config.lerp_rate <= 1.0) {
            return Err(SoundConfigError::LerpRateOutOfRange(config.lerp_rate));
        }
        if !(config.max_speed_kmh > 0.0) {
            return Err(SoundConfigError::NonPositiveMaxSpeed(config.max_speed_kmh));
        }

        let mut tracks: Vec<TrackMix, TRACKS_MAX> = Vec::new();
        for track in config.tracks {
            let curve = VolumeCurve::from_points(track.curve_points)
                .map_err(|err| SoundConfigError::Curve(track.name, err))?;
            let _ = tracks.push(TrackMix {
                name: track.name,
                curve,
                current: 0.0,
            });
        }

        Ok(Self {
            tracks,
            max_speed_kmh: config.max_speed_kmh,
            lerp_rate: config.lerp_rate,
        })
    }

    /// One control tick: normalize the speed, interpolate each curve, blend
    /// the live gain toward the target and apply the master gain. The
    /// returned gains go to the mixer boundary in track order.
    pub fn tick(&mut self, speed_kmh: f32, master_gain: f32) -> Vec<TrackGain, TRACKS_MAX> {
        let pct = (speed_kmh.max(0.0) * 100.0 / self.max_speed_kmh).clamp(0.0, 100.0);
        let master = master_gain.clamp(0.0, 1.0);

        let mut gains: Vec<TrackGain, TRACKS_MAX> = Vec::new();
        for track in &mut self.tracks {
            let target = track.curve.volume_at(pct);
            track.current += (target - track.current) * self.lerp_rate;
            let _ = gains.push(TrackGain {
                track: track.name,
                gain: track.current * master,
            });
        }
        gains
    }

    /// Smoothed pre-master gain of one track.
    pub fn current_gain(&self, track: &str) -> Option<f32> {
        self.tracks
            .iter()
            .find(|t| t.name == track)
            .map(|t| t.current)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackConfig;

    const RISING: &[(f32, f32)] = &[(0.0, 0.0), (100.0, 1.0)];
    const FALLING: &[(f32, f32)] = &[(0.0, 1.0), (70.0, 0.0), (100.0, 0.0)];

    fn two_track_config() -> SoundConfig {
        SoundConfig {
            max_speed_kmh: 50.0,
            lerp_rate: 0.05,
            tick_ms: 100,
            tracks: &[
                TrackConfig {
                    name: "up",
                    curve_points: RISING,
                },
                TrackConfig {
                    name: "down",
                    curve_points: FALLING,
                },
            ],
        }
    }

    #[test]
    fn converges_monotonically_without_overshoot() {
        let mut engine = SoundEngine::new(&two_track_config()).unwrap();

        // Full speed: "up" targets 1.0 from 0.0.
        let mut previous = 0.0;
        for _ in 0..600 {
            engine.tick(50.0, 1.0);
            let current = engine.current_gain("up").unwrap();
            assert!(current >= previous, "gain moved away from target");
            assert!(current <= 1.0, "gain overshot target");
            previous = current;
        }
        assert!((previous - 1.0).abs() < 1e-3, "did not converge, at {previous}");
    }

    #[test]
    fn tracks_smooth_independently() {
        let mut engine = SoundEngine::new(&two_track_config()).unwrap();
        // Half of max speed: "up" targets 0.5, "down" targets ~0.286.
        for _ in 0..400 {
            engine.tick(25.0, 1.0);
        }
        let up = engine.current_gain("up").unwrap();
        let down = engine.current_gain("down").unwrap();
        assert!((up - 0.5).abs() < 1e-2, "up at {up}");
        assert!((down - (1.0 - 50.0 / 70.0)).abs() < 1e-2, "down at {down}");
    }

    #[test]
    fn master_gain_scales_output_only() {
        let mut engine = SoundEngine::new(&two_track_config()).unwrap();
        let mut gains = Vec::new();
        for _ in 0..400 {
            gains = engine.tick(50.0, 0.25);
        }
        let up = gains.iter().find(|g| g.track == "up").unwrap();
        // The smoothing state converged to 1.0; only the handed-off gain is scaled.
        assert!((engine.current_gain("up").unwrap() - 1.0).abs() < 1e-2);
        assert!((up.gain - 0.25).abs() < 1e-2);
    }

    #[test]
    fn master_gain_is_clamped_at_the_boundary() {
        let mut engine = SoundEngine::new(&two_track_config()).unwrap();
        for _ in 0..400 {
            engine.tick(50.0, 7.0);
        }
        let gains = engine.tick(50.0, 7.0);
        assert!(gains.iter().all(|g| g.gain <= 1.0));
    }

    #[test]
    fn speed_is_normalized_and_clamped() {
        let mut engine = SoundEngine::new(&two_track_config()).unwrap();
        // Way past max speed behaves exactly like max speed.
        for _ in 0..400 {
            engine.tick(500.0, 1.0);
        }
        assert!((engine.current_gain("up").unwrap() - 1.0).abs() < 1e-2);

        // Negative speeds clamp to 0 %.
        let mut engine = SoundEngine::new(&two_track_config()).unwrap();
        for _ in 0..50 {
            engine.tick(-3.0, 1.0);
        }
        assert_eq!(engine.current_gain("up").unwrap(), 0.0);
    }

    #[test]
    fn lerp_rate_of_one_snaps_to_target() {
        let config = SoundConfig {
            lerp_rate: 1.0,
            ..two_track_config()
        };
        let mut engine = SoundEngine::new(&config).unwrap();
        engine.tick(50.0, 1.0);
        assert_eq!(engine.current_gain("up").unwrap(), 1.0);
    }

    #[test]
    fn rejects_bad_parameters() {
        let base = two_track_config();
        assert_eq!(
            SoundEngine::new(&SoundConfig {
                lerp_rate: 0.0,
                ..base
            })
            .err(),
            Some(SoundConfigError::LerpRateOutOfRange(0.0))
        );
        assert_eq!(
            SoundEngine::new(&SoundConfig {
                lerp_rate: 1.5,
                ..base
            })
            .err(),
            Some(SoundConfigError::LerpRateOutOfRange(1.5))
        );
        assert_eq!(
            SoundEngine::new(&SoundConfig {
                max_speed_kmh: 0.0,
                ..base
            })
            .err(),
            Some(SoundConfigError::NonPositiveMaxSpeed(0.0))
        );
    }

    #[test]
    fn rejects_malformed_track_curve() {
        let config = SoundConfig {
            tracks: &[TrackConfig {
                name: "broken",
                curve_points: &[(0.0, 0.0), (60.0, 1.0)],
            }],
            ..two_track_config()
        };
        assert_eq!(
            SoundEngine::new(&config).err(),
            Some(SoundConfigError::Curve(
                "broken",
                crate::sound::curve::CurveError::MissingFullPoint
            ))
        );
    }
}
