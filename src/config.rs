//! Static ride configuration, loaded once at startup and injected into the
//! cores. Defaults mirror the first installation of the system.

pub const DEFAULT_WHEEL_DIAMETER_MM: f32 = 622.0;
pub const DEFAULT_SAMPLE_PERIOD_MS: u64 = 2_000;
pub const DEFAULT_MIN_SPEED_KMH: f32 = 0.5;
pub const DEFAULT_AVG_WINDOW: usize = 5;
pub const DEFAULT_MOVEMENT_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_WATCHDOG_PERIOD_MS: u64 = 100;
pub const DEFAULT_SENSOR_SPACING_M: f32 = 0.05;
pub const DEFAULT_MILESTONE_PERIOD_MS: u64 = 60_000;
pub const DEFAULT_MILESTONE_THRESHOLD: u32 = 3;
pub const DEFAULT_MAX_SPEED_KMH: f32 = 50.0;
pub const DEFAULT_LERP_RATE: f32 = 0.05;
pub const DEFAULT_CONTROL_TICK_MS: u64 = 100;
pub const DEFAULT_MASTER_GAIN: f32 = 0.5;

/// Main wheel tachometer settings.
#[derive(Clone, Copy, Debug)]
pub struct WheelConfig {
    pub diameter_mm: f32,
    pub sample_period_ms: u64,
    pub min_speed_kmh: f32,
    /// Smooth the published speed with a rolling average of the last
    /// `avg_window` samples instead of reporting each sample directly.
    pub use_avg_speed: bool,
    pub avg_window: usize,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            diameter_mm: DEFAULT_WHEEL_DIAMETER_MM,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            min_speed_kmh: DEFAULT_MIN_SPEED_KMH,
            use_avg_speed: false,
            avg_window: DEFAULT_AVG_WINDOW,
        }
    }
}

impl WheelConfig {
    /// Wheel circumference in meters, derived once from the diameter.
    pub fn circumference_m(&self) -> f32 {
        self.diameter_mm * core::f32::consts::PI / 1000.0
    }
}

/// Pedal sensor settings, shared by the dual- and single-sensor variants.
#[derive(Clone, Copy, Debug)]
pub struct PedalConfig {
    pub movement_timeout_ms: u64,
    pub watchdog_period_ms: u64,
    /// Distance between the two sensors; the single-sensor variant reuses it
    /// as the travel distance covered between consecutive pulses.
    pub sensor_spacing_m: f32,
}

impl Default for PedalConfig {
    fn default() -> Self {
        Self {
            movement_timeout_ms: DEFAULT_MOVEMENT_TIMEOUT_MS,
            watchdog_period_ms: DEFAULT_WATCHDOG_PERIOD_MS,
            sensor_spacing_m: DEFAULT_SENSOR_SPACING_M,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MilestoneConfig {
    pub period_ms: u64,
    /// Number of milestones between consecutive mark notifications.
    pub notification_threshold: u32,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_MILESTONE_PERIOD_MS,
            notification_threshold: DEFAULT_MILESTONE_THRESHOLD,
        }
    }
}

/// One audio track and its speed-to-volume curve, given as
/// `(speed_percent, volume)` control points.
#[derive(Clone, Copy, Debug)]
pub struct TrackConfig {
    pub name: &'static str,
    pub curve_points: &'static [(f32, f32)],
}

/// The installation's default mix: an abstract bed that rises with speed, a
/// deconstructed line that peaks mid-range, and a narrative line that fades
/// out as the rider accelerates.
pub const DEFAULT_TRACKS: &[TrackConfig] = &[
    TrackConfig {
        name: "abstract",
        curve_points: &[(0.0, 0.0), (100.0, 1.0)],
    },
    TrackConfig {
        name: "deconstr",
        curve_points: &[(0.0, 0.0), (30.0, 0.3), (50.0, 1.0), (100.0, 0.7)],
    },
    TrackConfig {
        name: "narrative",
        curve_points: &[(0.0, 1.0), (70.0, 0.0), (100.0, 0.0)],
    },
];

#[derive(Clone, Copy, Debug)]
pub struct SoundConfig {
    /// Speed mapped to 100 % on every curve.
    pub max_speed_kmh: f32,
    /// Per-tick blend factor in (0, 1]. Deliberately tick-rate dependent:
    /// changing the control tick changes the settle time.
    pub lerp_rate: f32,
    pub tick_ms: u64,
    pub tracks: &'static [TrackConfig],
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            max_speed_kmh: DEFAULT_MAX_SPEED_KMH,
            lerp_rate: DEFAULT_LERP_RATE,
            tick_ms: DEFAULT_CONTROL_TICK_MS,
            tracks: DEFAULT_TRACKS,
        }
    }
}

/// Everything the cores need, bundled for injection at startup.
#[derive(Clone, Copy, Debug, Default)]
pub struct RideConfig {
    pub wheel: WheelConfig,
    pub pedal: PedalConfig,
    pub milestone: MilestoneConfig,
    pub sound: SoundConfig,
}
