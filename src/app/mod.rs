pub(crate) mod config;
mod demo;
mod tasks;

use embassy_executor::Executor;
use static_cell::StaticCell;
use velotone::{config::RideConfig, sound::SoundEngine};

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

pub(crate) fn run() -> ! {
    let ride = RideConfig::default();

    // Curve and parameter validation happens once, before anything spawns.
    let engine = match SoundEngine::new(&ride.sound) {
        Ok(engine) => engine,
        Err(err) => {
            log::error!("sound configuration rejected: {err}");
            std::process::exit(1);
        }
    };
    config::set_master_gain(velotone::config::DEFAULT_MASTER_GAIN);
    log::info!(
        "starting with {} tracks, wheel diameter {} mm",
        engine.track_count(),
        ride.wheel.diameter_mm
    );

    let executor = EXECUTOR.init(Executor::new());
    executor.run(move |spawner| {
        spawner.must_spawn(tasks::wheel_task(ride.wheel));
        spawner.must_spawn(tasks::pedal_task(ride.pedal));
        spawner.must_spawn(tasks::control_task(ride, engine));
        spawner.must_spawn(tasks::mark_notifier_task());
        spawner.must_spawn(demo::rider_task(ride));
    })
}
