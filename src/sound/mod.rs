pub mod curve;
pub mod engine;

pub use curve::{CurveError, CurvePoint, VolumeCurve};
pub use engine::{SoundConfigError, SoundEngine, TrackGain};
