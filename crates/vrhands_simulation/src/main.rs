//! Headless симуляция VRHANDS
//!
//! Прогоняет scripted two-hand сценарий (grab → offhand steal → throw → snap turn)
//! без рендера и VR runtime.

use bevy_rapier3d::prelude::Velocity;
use vrhands_simulation::scenario::{run_two_hand_scenario, SCENARIO_TICKS};

fn main() {
    let seed = 42;
    println!("Starting VRHANDS headless simulation (seed: {})", seed);

    let (app, actors, report) = match run_two_hand_scenario(seed, SCENARIO_TICKS) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Invalid grabber configuration: {}", err);
            std::process::exit(1);
        }
    };

    println!("Ticks: {}", SCENARIO_TICKS);
    println!(
        "Grabs: {}, releases: {}, forced releases: {}, snap turns: {}",
        report.grabs, report.releases, report.forced_releases, report.snap_turns
    );
    println!("Ball pose: {:?}", report.ball_pose);
    println!("Ball holder: {:?}", report.ball_holder);
    if let Some(velocity) = app.world().get::<Velocity>(actors.ball) {
        println!("Ball velocity: linear {:?}, angular {:?}", velocity.linvel, velocity.angvel);
    }

    println!("Simulation complete!");
}
