use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal, watch::Watch,
};
use velotone::{
    config::DEFAULT_MASTER_GAIN, milestone::MarkEvent, pedal::PedalSnapshot, pulse::PulseLine,
    wheel::WheelSnapshot,
};

/// Wheel pulse count accumulator, drained once per sampling window.
pub(crate) static WHEEL_PULSES: PulseLine = PulseLine::new();

/// Edge notifications carrying the edge timestamp. Signals coalesce bursts;
/// the count accuracy lives in [`WHEEL_PULSES`], the edges only wake tasks.
pub(crate) static WHEEL_EDGE: Signal<CriticalSectionRawMutex, u64> = Signal::new();
pub(crate) static PEDAL_EDGE_A: Signal<CriticalSectionRawMutex, u64> = Signal::new();
pub(crate) static PEDAL_EDGE_B: Signal<CriticalSectionRawMutex, u64> = Signal::new();

/// Latest published sensor snapshots, one receiver slot for the control loop
/// and one spare for diagnostics.
pub(crate) static WHEEL_STATE: Watch<CriticalSectionRawMutex, WheelSnapshot, 2> = Watch::new();
pub(crate) static PEDAL_STATE: Watch<CriticalSectionRawMutex, PedalSnapshot, 2> = Watch::new();

pub(crate) static MARK_EVENTS: Channel<CriticalSectionRawMutex, MarkEvent, 4> = Channel::new();

/// Cooperative shutdown flag, one receiver slot per task loop. Every loop
/// folds `changed()` into its select and returns when the flag flips.
pub(crate) static SHUTDOWN: Watch<CriticalSectionRawMutex, bool, 5> = Watch::new();

static MASTER_GAIN_BITS: AtomicU32 = AtomicU32::new(DEFAULT_MASTER_GAIN.to_bits());

/// Wheel sensor edge entry point. Callable from any context, including
/// interrupt handlers on targets that have them.
pub(crate) fn wheel_pulse_edge(now_ms: u64) {
    WHEEL_PULSES.record(now_ms);
    WHEEL_EDGE.signal(now_ms);
}

pub(crate) fn pedal_pulse_a(now_ms: u64) {
    PEDAL_EDGE_A.signal(now_ms);
}

pub(crate) fn pedal_pulse_b(now_ms: u64) {
    PEDAL_EDGE_B.signal(now_ms);
}

pub(crate) fn set_master_gain(gain: f32) {
    MASTER_GAIN_BITS.store(gain.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
}

pub(crate) fn master_gain() -> f32 {
    f32::from_bits(MASTER_GAIN_BITS.load(Ordering::Relaxed))
}

/// Asks every task loop to finish its current tick and return.
pub(crate) fn request_shutdown() {
    SHUTDOWN.sender().send(true);
}
