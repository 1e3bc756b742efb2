//! Pedal motion sensing. The dual-sensor variant fuses two out-of-phase
//! pulse trains into a rotation direction; the single-sensor variant derives
//! a speed magnitude from the inter-pulse interval. Both stop via the same
//! timeout watchdog, since the pedal has no periodic rate sampler.

use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::config::PedalConfig;

/// Shortest believable inter-pulse interval for the single-sensor variant;
/// anything faster is a clock anomaly and leaves the speed unchanged.
const MIN_PULSE_INTERVAL_MS: u64 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PedalDirection {
    #[default]
    None,
    Forward,
    Backward,
}

/// What a pedal sensor set can measure. The dual variant never reports a
/// speed magnitude and the single variant never reports a direction; the
/// asymmetry is deliberate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PedalCapabilities {
    pub reports_direction: bool,
    pub reports_speed: bool,
}

/// Published pedal state. `direction` and `speed_kmh` are `None` when the
/// sensor set cannot measure them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PedalSnapshot {
    pub is_moving: bool,
    pub direction: Option<PedalDirection>,
    pub speed_kmh: Option<f32>,
    pub start_time_ms: Option<u64>,
    pub stop_time_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug)]
enum DualPedalEvent {
    PulseA { now_ms: u64 },
    PulseB { now_ms: u64 },
    Watchdog { now_ms: u64 },
}

#[derive(Clone, Copy, Debug, Default)]
struct DualPedalDispatch {
    snapshot: PedalSnapshot,
}

struct DualPedalHsm {
    movement_timeout_ms: u64,
    last_a_ms: Option<u64>,
    last_b_ms: Option<u64>,
    is_moving: bool,
    start_time_ms: Option<u64>,
    stop_time_ms: Option<u64>,
}

impl DualPedalHsm {
    fn new(config: &PedalConfig) -> Self {
        Self {
            movement_timeout_ms: config.movement_timeout_ms,
            last_a_ms: None,
            last_b_ms: None,
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

    fn last_pulse_ms(&self) -> Option<u64> {
        match (self.last_a_ms, self.last_b_ms) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Relative recency of the two sensors: whichever fired last tells the
    /// rotation sense. Meaningless until both sensors have fired.
    fn direction(&self) -> PedalDirection {
        if !self.is_moving {
            return PedalDirection::None;
        }
        match (self.last_a_ms, self.last_b_ms) {
            (Some(a), Some(b)) if b > a => PedalDirection::Forward,
            (Some(a), Some(b)) if a > b => PedalDirection::Backward,
            _ => PedalDirection::None,
        }
    }

    fn snapshot(&self) -> PedalSnapshot {
        PedalSnapshot {
            is_moving: self.is_moving,
            direction: Some(self.direction()),
            speed_kmh: None,
            start_time_ms: self.start_time_ms,
            stop_time_ms: self.stop_time_ms,
        }
    }
}

#[state_machine(initial = "State::stopped()")]
impl DualPedalHsm {
    #[state]
    fn stopped(
        &mut self,
        context: &mut DualPedalDispatch,
        event: &DualPedalEvent,
    ) -> Outcome<State> {
        let outcome = match event {
            DualPedalEvent::PulseA { now_ms } => {
                self.last_a_ms = Some(*now_ms);
                self.begin_moving(*now_ms);
                Transition(State::moving())
            }
            DualPedalEvent::PulseB { now_ms } => {
                self.last_b_ms = Some(*now_ms);
                self.begin_moving(*now_ms);
                Transition(State::moving())
            }
            DualPedalEvent::Watchdog { .. } => Handled,
        };
        context.snapshot = self.snapshot();
        outcome
    }

    #[state]
    fn moving(
        &mut self,
        context: &mut DualPedalDispatch,
        event: &DualPedalEvent,
    ) -> Outcome<State> {
        let outcome = match event {
            DualPedalEvent::PulseA { now_ms } => {
                self.last_a_ms = Some(*now_ms);
                Handled
            }
            DualPedalEvent::PulseB { now_ms } => {
                self.last_b_ms = Some(*now_ms);
                Handled
            }
            DualPedalEvent::Watchdog { now_ms } => {
                // Sole authority for pedal stop detection.
                let idle_ms = self
                    .last_pulse_ms()
                    .map_or(u64::MAX, |last| now_ms.saturating_sub(last));
                if idle_ms > self.movement_timeout_ms {
                    self.is_moving = false;
                    self.stop_time_ms = Some(*now_ms);
                    // Forget the sensor history; a restart must not pair a
                    // fresh pulse with a stale opposite-sensor timestamp.
                    self.last_a_ms = None;
                    self.last_b_ms = None;
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

/// Dual-sensor pedal: direction only, no magnitude.
pub struct DualPedal {
    machine: statig::blocking::StateMachine<DualPedalHsm>,
    last: PedalSnapshot,
}

impl DualPedal {
    fn new(config: &PedalConfig) -> Self {
        let hsm = DualPedalHsm::new(config);
        let last = hsm.snapshot();
        Self {
            machine: hsm.state_machine(),
            last,
        }
    }

    fn dispatch(&mut self, event: DualPedalEvent) -> PedalSnapshot {
        let mut context = DualPedalDispatch::default();
        self.machine.handle_with_context(&event, &mut context);
        self.last = context.snapshot;
        self.last
    }
}

/// Single-sensor pedal: speed from the inter-pulse interval, no direction.
pub struct SinglePedal {
    movement_timeout_ms: u64,
    pulse_distance_m: f32,
    last_pulse_ms: Option<u64>,
    speed_kmh: f32,
    is_moving: bool,
    start_time_ms: Option<u64>,
    stop_time_ms: Option<u64>,
}

impl SinglePedal {
    fn new(config: &PedalConfig) -> Self {
        Self {
            movement_timeout_ms: config.movement_timeout_ms,
            pulse_distance_m: config.sensor_spacing_m,
            last_pulse_ms: None,
            speed_kmh: 0.0,
            is_moving: false,
            start_time_ms: None,
            stop_time_ms: None,
        }
    }

    fn on_pulse(&mut self, now_ms: u64) -> PedalSnapshot {
        if let Some(previous) = self.last_pulse_ms {
            let interval_ms = now_ms.saturating_sub(previous);
            if interval_ms >= MIN_PULSE_INTERVAL_MS {
                self.speed_kmh =
                    self.pulse_distance_m / (interval_ms as f32 / 1000.0) * 3.6;
            } else {
                log::debug!("pedal: pulse interval {interval_ms} ms below floor, speed kept");
            }
        }
        if !self.is_moving {
            self.is_moving = true;
            self.start_time_ms = Some(now_ms);
            self.stop_time_ms = None;
        }
        self.last_pulse_ms = Some(now_ms);
        self.snapshot()
    }

    fn on_watchdog(&mut self, now_ms: u64) -> PedalSnapshot {
        if self.is_moving {
            let idle_ms = self
                .last_pulse_ms
                .map_or(u64::MAX, |last| now_ms.saturating_sub(last));
            if idle_ms > self.movement_timeout_ms {
                self.is_moving = false;
                self.speed_kmh = 0.0;
                self.stop_time_ms = Some(now_ms);
            }
        }
        self.snapshot()
    }

    fn snapshot(&self) -> PedalSnapshot {
        PedalSnapshot {
            is_moving: self.is_moving,
            direction: None,
            speed_kmh: Some(if self.is_moving { self.speed_kmh } else { 0.0 }),
            start_time_ms: self.start_time_ms,
            stop_time_ms: self.stop_time_ms,
        }
    }
}

/// Capability-set facade over the two pedal sensor layouts.
pub enum PedalMeter {
    Dual(DualPedal),
    Single(SinglePedal),
}

impl PedalMeter {
    pub fn dual(config: &PedalConfig) -> Self {
        Self::Dual(DualPedal::new(config))
    }

    pub fn single(config: &PedalConfig) -> Self {
        Self::Single(SinglePedal::new(config))
    }

    pub fn capabilities(&self) -> PedalCapabilities {
        match self {
            Self::Dual(_) => PedalCapabilities {
                reports_direction: true,
                reports_speed: false,
            },
            Self::Single(_) => PedalCapabilities {
                reports_direction: false,
                reports_speed: true,
            },
        }
    }

    /// Edge on sensor A, or on the only sensor of the single variant.
    pub fn on_pulse_a(&mut self, now_ms: u64) -> PedalSnapshot {
        match self {
            Self::Dual(pedal) => pedal.dispatch(DualPedalEvent::PulseA { now_ms }),
            Self::Single(pedal) => pedal.on_pulse(now_ms),
        }
    }

    /// Edge on sensor B. The single variant has no second sensor; the edge
    /// is ignored.
    pub fn on_pulse_b(&mut self, now_ms: u64) -> PedalSnapshot {
        match self {
            Self::Dual(pedal) => pedal.dispatch(DualPedalEvent::PulseB { now_ms }),
            Self::Single(pedal) => {
                log::debug!("pedal: sensor B edge on single-sensor pedal ignored");
                pedal.snapshot()
            }
        }
    }

    pub fn on_watchdog(&mut self, now_ms: u64) -> PedalSnapshot {
        match self {
            Self::Dual(pedal) => pedal.dispatch(DualPedalEvent::Watchdog { now_ms }),
            Self::Single(pedal) => pedal.on_watchdog(now_ms),
        }
    }

    pub fn snapshot(&self) -> PedalSnapshot {
        match self {
            Self::Dual(pedal) => pedal.last,
            Self::Single(pedal) => pedal.snapshot(),
        }
    }
}
