use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::unbounded;
use tracing::info;

use shared_resources::clock::{Clock, Stage};
use shared_resources::command::Command;
use shared_resources::config::SimConfig;
use shared_resources::error::Result;
use shared_resources::floor::Building;

use crate::utilities::car_status::StatusBoard;
use crate::utilities::generator::Generator;
use crate::utilities::stats::PhaseReport;

pub mod car;
pub mod dispatcher;
pub mod driver;

use car::ElevatorCar;
use dispatcher::Dispatcher;
use driver::Driver;

/// Spawn one thread per car and one for the dispatcher, all parked on a
/// fresh clock, and hand back the driver that runs them.
pub fn start(config: &SimConfig) -> Result<Driver> {
    let scenario = &config.scenario;
    let building = Arc::new(Building::new(scenario.num_floors));
    let dispatcher = Dispatcher::new(
        &scenario.logic,
        scenario.tie_bias,
        scenario.num_elevators,
        building.top_floor(),
    )?;

    let clock = Clock::new();
    let board = Arc::new(StatusBoard::new(scenario.num_elevators, scenario.num_floors));
    let mut handles = Vec::with_capacity(scenario.num_elevators + 1);

    // INITIALIZE CHANNELS
    let (dispatch_tx, dispatch_rx) = unbounded::<Command>();
    let mut car_txs = Vec::with_capacity(scenario.num_elevators);

    // INITIALIZE CAR THREADS
    for id in 0..scenario.num_elevators {
        let (car_tx, car_rx) = unbounded::<Command>();
        car_txs.push(car_tx);
        let car = ElevatorCar::new(
            id,
            config.car.clone(),
            scenario.tie_bias,
            Arc::clone(&building),
            Arc::clone(&board),
        );
        let actor = clock.join(Stage::Cars);
        let name = format!("car-{}", id);
        let handle = spawn(&clock, &name, move || car::main(car, actor, car_rx))?;
        handles.push((name, handle));
    }

    // INITIALIZE DISPATCHER THREAD
    {
        let actor = clock.join(Stage::Dispatch);
        let building = Arc::clone(&building);
        let board = Arc::clone(&board);
        let handle = spawn(&clock, "dispatcher", move || dispatcher::main(
            dispatcher,
            actor,
            building,
            board,
            dispatch_rx,
            car_txs,
        ))?;
        handles.push((String::from("dispatcher"), handle));
    }

    Ok(Driver::new(
        clock,
        building,
        board,
        dispatch_tx,
        config.script.clone(),
        config.log.debug_view,
        handles,
    ))
}

/// Run the morning and evening rush of the configured scenario.
pub fn run(config: &SimConfig) -> Result<Vec<PhaseReport>> {
    let scenario = &config.scenario;
    let mut generator = Generator::new(scenario.seed, scenario.rush_window);
    let mut driver = start(config)?;

    driver.with_building(|building, _| generator.morning(building, scenario.num_occupants))?;
    let morning = driver.run_phase("morning")?;

    driver.with_building(|building, now| generator.evening(building, now))?;
    let evening = driver.run_phase("evening")?;

    for car in driver.finish()? {
        info!(car = car.id, floor = car.floor, "travelled {:.0} ft", car.distance);
    }
    Ok(vec![morning, evening])
}

fn spawn<F>(clock: &Arc<Clock>, name: &str, f: F) -> Result<JoinHandle<Result<()>>>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    match thread::Builder::new().name(name.to_string()).spawn(f) {
        Ok(handle) => Ok(handle),
        Err(e) => {
            // threads already running are parked on the clock
            clock.halt();
            Err(e.into())
        },
    }
}
