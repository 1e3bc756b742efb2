use embassy_futures::select::{select, select3, select4, Either, Either3, Either4};
use embassy_time::{Duration, Instant, Ticker};
use velotone::{
    config::{PedalConfig, RideConfig, WheelConfig},
    milestone::MilestoneTracker,
    mixer::Mixer,
    pedal::PedalMeter,
    sound::SoundEngine,
    wheel::WheelMeter,
};

use super::config::{
    master_gain, MARK_EVENTS, PEDAL_EDGE_A, PEDAL_EDGE_B, PEDAL_STATE, SHUTDOWN, WHEEL_EDGE,
    WHEEL_PULSES, WHEEL_STATE,
};

pub(crate) fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/// Mixer boundary for builds without an audio backend: gains go to the log.
struct LogMixer;

impl Mixer for LogMixer {
    type Error = core::convert::Infallible;

    fn set_gain(&mut self, track: &'static str, gain: f32) -> Result<(), Self::Error> {
        log::trace!("mixer: {track} -> {gain:.3}");
        Ok(())
    }
}

/// Owns the wheel tachometer. Edges restart a stopped wheel immediately;
/// the ticker drains the pulse count into a speed once per window.
#[embassy_executor::task]
pub(crate) async fn wheel_task(config: WheelConfig) {
    let mut meter = WheelMeter::new(&config, now_ms());
    let sender = WHEEL_STATE.sender();
    sender.send(meter.snapshot());
    let mut shutdown = SHUTDOWN
        .receiver()
        .expect("shutdown watch receiver slots exhausted");

    let mut ticker = Ticker::every(Duration::from_millis(config.sample_period_ms));
    loop {
        match select3(ticker.next(), WHEEL_EDGE.wait(), shutdown.changed()).await {
            Either3::First(()) => {
                let count = WHEEL_PULSES.take();
                sender.send(meter.on_sample(now_ms(), count));
            }
            Either3::Second(edge_ms) => {
                sender.send(meter.on_pulse(edge_ms));
            }
            Either3::Third(_) => break,
        }
    }
    log::debug!("wheel task stopped");
}

/// Owns the pedal meter. Edges from either sensor feed the direction logic;
/// the watchdog ticker is the only thing that can declare the pedals stopped.
#[embassy_executor::task]
pub(crate) async fn pedal_task(config: PedalConfig) {
    let mut meter = PedalMeter::dual(&config);
    let sender = PEDAL_STATE.sender();
    sender.send(meter.snapshot());
    let mut shutdown = SHUTDOWN
        .receiver()
        .expect("shutdown watch receiver slots exhausted");

    let mut ticker = Ticker::every(Duration::from_millis(config.watchdog_period_ms));
    loop {
        let snapshot = match select4(
            ticker.next(),
            PEDAL_EDGE_A.wait(),
            PEDAL_EDGE_B.wait(),
            shutdown.changed(),
        )
        .await
        {
            Either4::First(()) => meter.on_watchdog(now_ms()),
            Either4::Second(edge_ms) => meter.on_pulse_a(edge_ms),
            Either4::Third(edge_ms) => meter.on_pulse_b(edge_ms),
            Either4::Fourth(_) => break,
        };
        sender.send(snapshot);
    }
    log::debug!("pedal task stopped");
}

/// The control loop: once per tick it feeds the milestone tracker and pushes
/// the smoothed per-track gains across the mixer boundary.
#[embassy_executor::task]
pub(crate) async fn control_task(config: RideConfig, mut engine: SoundEngine) {
    let mut tracker = MilestoneTracker::new(&config.milestone);
    let mut mixer = LogMixer;
    let mut wheel_rx = WHEEL_STATE
        .receiver()
        .expect("wheel watch receiver slots exhausted");
    let mut pedal_rx = PEDAL_STATE
        .receiver()
        .expect("pedal watch receiver slots exhausted");

    let mut shutdown = SHUTDOWN
        .receiver()
        .expect("shutdown watch receiver slots exhausted");

    let mut ticker = Ticker::every(Duration::from_millis(config.sound.tick_ms));
    loop {
        if let Either::Second(_) = select(ticker.next(), shutdown.changed()).await {
            break;
        }
        let wheel = wheel_rx.try_get().unwrap_or_default();
        let pedal = pedal_rx.try_get().unwrap_or_default();

        if let Some(mark) = tracker.tick(now_ms(), wheel.is_moving, pedal.is_moving) {
            if MARK_EVENTS.try_send(mark).is_err() {
                log::warn!("mark queue full, dropping mark {}", mark.mark_index);
            }
        }

        for entry in engine.tick(wheel.speed_kmh, master_gain()) {
            if let Err(err) = mixer.set_gain(entry.track, entry.gain) {
                log::warn!("mixer rejected gain for {}: {err:?}", entry.track);
            }
        }
    }
    log::debug!("control task stopped");
}

/// Consumes mark events off the control loop's queue and announces them.
#[embassy_executor::task]
pub(crate) async fn mark_notifier_task() {
    let mut shutdown = SHUTDOWN
        .receiver()
        .expect("shutdown watch receiver slots exhausted");
    loop {
        match select(MARK_EVENTS.receive(), shutdown.changed()).await {
            Either::First(mark) => {
                log::info!(
                    "mark {} reached after {} s of riding",
                    mark.mark_index,
                    mark.active_time_s
                );
            }
            Either::Second(_) => break,
        }
    }
}
