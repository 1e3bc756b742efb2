//! Main wheel tachometer: pulse counts over fixed windows become a linear
//! speed, with edge-triggered restart and sample-gated stop hysteresis.

use heapless::Deque;
use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::config::WheelConfig;

pub const AVG_WINDOW_MAX: usize = 16;

/// Samples with less elapsed time than this are treated as clock anomalies
/// and skipped, retaining the previous speed.
const MIN_ELAPSED_MS: u64 = 10;

/// Published wheel state. `speed_kmh` is zero whenever `is_moving` is false.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelSnapshot {
    pub speed_kmh: f32,
    pub avg_speed_kmh: f32,
    pub is_moving: bool,
    pub start_time_ms: Option<u64>,
    pub stop_time_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug)]
enum WheelHsmEvent {
    Pulse { now_ms: u64 },
    Sample { now_ms: u64, count: u32 },
}

#[derive(Clone, Copy, Debug, Default)]
struct WheelDispatch {
    snapshot: WheelSnapshot,
}

struct WheelHsm {
    circumference_m: f32,
    min_speed_kmh: f32,
    use_avg: bool,
    avg_window: usize,
    window: Deque<f32, AVG_WINDOW_MAX>,
    speed_kmh: f32,
    avg_speed_kmh: f32,
    previous_time_ms: u64,
    is_moving: bool,
    start_time_ms: Option<u64>,
    stop_time_ms: Option<u64>,
}

impl WheelHsm {
    fn new(config: &WheelConfig, now_ms: u64) -> Self {
        Self {
            circumference_m: config.circumference_m(),
            min_speed_kmh: config.min_speed_kmh,
            use_avg: config.use_avg_speed,
            avg_window: config.avg_window.clamp(1, AVG_WINDOW_MAX),
            window: Deque::new(),
            speed_kmh: 0.0,
            avg_speed_kmh: 0.0,
            previous_time_ms: now_ms,
            is_moving: false,
            start_time_ms: None,
            stop_time_ms: None,
        }
    }

    fn begin_moving(&mut self, now_ms: u64) {
        self.is_moving = true;
        self.start_time_ms = Some(now_ms);
        self.stop_time_ms = None;
    }

    fn end_moving(&mut self, now_ms: u64) {
        self.is_moving = false;
        self.stop_time_ms = Some(now_ms);
        self.speed_kmh = 0.0;
    }

    /// Converts one window's pulse count into km/h. Returns false when the
    /// elapsed time is below the anomaly floor; the sample is then skipped
    /// and the previous speed stands.
    fn apply_sample(&mut self, now_ms: u64, count: u32) -> bool {
        let elapsed_ms = now_ms.saturating_sub(self.previous_time_ms);
        if elapsed_ms < MIN_ELAPSED_MS {
            log::debug!("wheel: sample skipped, elapsed {elapsed_ms} ms below floor");
            return false;
        }

        let rounds_per_sec = count as f32 / (elapsed_ms as f32 / 1000.0);
        self.speed_kmh = self.circumference_m * rounds_per_sec * 3.6;
        self.previous_time_ms = now_ms;

        if self.use_avg {
            if self.window.len() >= self.avg_window {
                self.window.pop_front();
            }
            let _ = self.window.push_back(self.speed_kmh);
            self.avg_speed_kmh = self.window.iter().sum::<f32>() / self.window.len() as f32;
        }

        true
    }

    fn snapshot(&self) -> WheelSnapshot {
        WheelSnapshot {
            speed_kmh: self.speed_kmh,
            avg_speed_kmh: self.avg_speed_kmh,
            is_moving: self.is_moving,
            start_time_ms: self.start_time_ms,
            stop_time_ms: self.stop_time_ms,
        }
    }
}

#[state_machine(initial = "State::stopped()")]
impl WheelHsm {
    #[state]
    fn stopped(&mut self, context: &mut WheelDispatch, event: &WheelHsmEvent) -> Outcome<State> {
        let outcome = match event {
            WheelHsmEvent::Pulse { now_ms } => {
                self.begin_moving(*now_ms);
                Transition(State::moving())
            }
            WheelHsmEvent::Sample { now_ms, count } => {
                // Normally the edge event restarts the wheel first; a count
                // landing here means the edge was missed, so fall back to
                // the sampled speed.
                if !self.apply_sample(*now_ms, *count) {
                    Handled
                } else if *count > 0 && self.speed_kmh >= self.min_speed_kmh {
                    self.begin_moving(*now_ms);
                    Transition(State::moving())
                } else {
                    self.speed_kmh = 0.0;
                    Handled
                }
            }
        };
        context.snapshot = self.snapshot();
        outcome
    }

    #[state]
    fn moving(&mut self, context: &mut WheelDispatch, event: &WheelHsmEvent) -> Outcome<State> {
        let outcome = match event {
            WheelHsmEvent::Pulse { .. } => Handled,
            WheelHsmEvent::Sample { now_ms, count } => {
                if !self.apply_sample(*now_ms, *count) {
                    Handled
                } else if self.speed_kmh < self.min_speed_kmh {
                    // Sole authority for declaring the wheel stopped.
                    self.end_moving(*now_ms);
                    Transition(State::stopped())
                } else {
                    Handled
                }
            }
        };
        context.snapshot = self.snapshot();
        outcome
    }
}

/// Tachometer facade around the moving/stopped state machine. The caller
/// owns the pulse count accumulator and hands over the drained count with
/// each sample.
pub struct WheelMeter {
    machine: statig::blocking::StateMachine<WheelHsm>,
    last: WheelSnapshot,
}

impl WheelMeter {
    pub fn new(config: &WheelConfig, now_ms: u64) -> Self {
        let hsm = WheelHsm::new(config, now_ms);
        let last = hsm.snapshot();
        Self {
            machine: hsm.state_machine(),
            last,
        }
    }

    /// One debounced wheel edge. Restarts a stopped wheel immediately.
    pub fn on_pulse(&mut self, now_ms: u64) -> WheelSnapshot {
        self.dispatch(WheelHsmEvent::Pulse { now_ms })
    }

    /// One sampling window: `count` pulses drained since the previous sample.
    pub fn on_sample(&mut self, now_ms: u64, count: u32) -> WheelSnapshot {
        self.dispatch(WheelHsmEvent::Sample { now_ms, count })
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        self.last
    }

    fn dispatch(&mut self, event: WheelHsmEvent) -> WheelSnapshot {
        let mut context = WheelDispatch::default();
        self.machine.handle_with_context(&event, &mut context);
        self.last = context.snapshot;
        self.last
    }
}
