//! Scripted rider standing in for the real sensors: accelerates, cruises,
//! coasts to a stop and rests, in an endless cycle. Wheel and crank rotation
//! are integrated per tick and emit the same edge entry points the hardware
//! would, so the rest of the system cannot tell the difference.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};
use velotone::config::RideConfig;

use super::{
    config::{pedal_pulse_a, pedal_pulse_b, wheel_pulse_edge, SHUTDOWN},
    tasks::now_ms,
};

const SIM_TICK_MS: u64 = 20;
const CRUISE_SPEED_KMH: f32 = 28.0;
const ACCEL_KMH_PER_S: f32 = 2.5;
const DECEL_KMH_PER_S: f32 = 1.5;
const CRUISE_MS: u64 = 20_000;
const REST_MS: u64 = 8_000;
/// Crank turns per wheel turn, roughly a 2.5 gear ratio.
const CRANK_REVS_PER_WHEEL_REV: f32 = 0.4;
/// Sensor B sits slightly behind sensor A along the crank's travel.
const PEDAL_SENSOR_LAG_MS: u64 = 30;

#[derive(Clone, Copy)]
enum Phase {
    Accelerate,
    Cruise,
    Coast,
    Rest,
}

#[embassy_executor::task]
pub(crate) async fn rider_task(config: RideConfig) {
    let circumference_m = config.wheel.circumference_m();
    let dt_s = SIM_TICK_MS as f32 / 1000.0;

    let mut phase = Phase::Accelerate;
    let mut phase_left_ms = 0u64;
    let mut speed_kmh = 0.0f32;
    let mut wheel_turns = 0.0f32;
    let mut crank_turns = 0.0f32;
    let mut pedal_b_due_ms: Option<u64> = None;

    log::info!("demo rider active, cruise speed {CRUISE_SPEED_KMH} km/h");
    let mut shutdown = SHUTDOWN
        .receiver()
        .expect("shutdown watch receiver slots exhausted");
    let mut ticker = Ticker::every(Duration::from_millis(SIM_TICK_MS));
    loop {
        if let Either::Second(_) = select(ticker.next(), shutdown.changed()).await {
            break;
        }
        let now = now_ms();

        let pedaling = match phase {
            Phase::Accelerate => {
                speed_kmh = (speed_kmh + ACCEL_KMH_PER_S * dt_s).min(CRUISE_SPEED_KMH);
                if speed_kmh >= CRUISE_SPEED_KMH {
                    phase = Phase::Cruise;
                    phase_left_ms = CRUISE_MS;
                }
                true
            }
            Phase::Cruise => {
                phase_left_ms = phase_left_ms.saturating_sub(SIM_TICK_MS);
                if phase_left_ms == 0 {
                    phase = Phase::Coast;
                }
                true
            }
            Phase::Coast => {
                speed_kmh = (speed_kmh - DECEL_KMH_PER_S * dt_s).max(0.0);
                if speed_kmh == 0.0 {
                    phase = Phase::Rest;
                    phase_left_ms = REST_MS;
                }
                false
            }
            Phase::Rest => {
                phase_left_ms = phase_left_ms.saturating_sub(SIM_TICK_MS);
                if phase_left_ms == 0 {
                    phase = Phase::Accelerate;
                }
                false
            }
        };

        let wheel_rps = speed_kmh / 3.6 / circumference_m;
        wheel_turns += wheel_rps * dt_s;
        while wheel_turns >= 1.0 {
            wheel_turns -= 1.0;
            wheel_pulse_edge(now);
        }

        if pedaling {
            crank_turns += wheel_rps * CRANK_REVS_PER_WHEEL_REV * dt_s;
            if crank_turns >= 1.0 {
                crank_turns -= 1.0;
                pedal_pulse_a(now);
                pedal_b_due_ms = Some(now + PEDAL_SENSOR_LAG_MS);
            }
        }
        if let Some(due) = pedal_b_due_ms {
            if now >= due {
                pedal_pulse_b(now);
                pedal_b_due_ms = None;
            }
        }
    }
}
