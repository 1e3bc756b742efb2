//! Boundary to the audio playback collaborator.

use core::convert::Infallible;
use core::fmt::Debug;

/// Per-track gain sink. Implementations may fail transiently; callers log
/// the failure and move on, since the next control tick re-delivers the
/// current gain anyway. Repeated identical values must be accepted.
pub trait Mixer {
    type Error: Debug;

    fn set_gain(&mut self, track: &'static str, gain: f32) -> Result<(), Self::Error>;
}

/// Discards every gain. Used in tests and as a stand-in while no playback
/// backend is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMixer;

impl Mixer for NullMixer {
    type Error = Infallible;

    fn set_gain(&mut self, _track: &'static str, _gain: f32) -> Result<(), Self::Error> {
        Ok(())
    }
}
