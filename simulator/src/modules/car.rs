/// ----- CAR MODULE -----
/// One thread per elevator car. The car takes commands off its own queue
/// while it is waiting, and executes them one timed step at a time against
/// the simulated clock: closing doors, starting, crossing floors, stopping,
/// opening doors, and letting riders off and on.

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, error, info};

use shared_resources::call::Call;
use shared_resources::clock::{Actor, TICK};
use shared_resources::command::{Command, CommandKind};
use shared_resources::config::CarSettings;
use shared_resources::direction::Direction;
use shared_resources::error::{Result, SimError};
use shared_resources::floor::{Building, Floor, FloorView, GROUND_FLOOR};
use shared_resources::occupant::Occupant;

use crate::utilities::car_status::{Behaviour, CarStatus, Door, Motion, StatusBoard};
use crate::utilities::stops::Stops;

/// Weight rounding slack for the capacity check.
const WEIGHT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    CloseDoor,
    Start,
    Travel,
    Stop,
    OpenDoor,
    Service,
}

#[derive(Debug)]
pub struct ElevatorCar {
    id: usize,
    settings: CarSettings,
    tie_bias: Direction,
    building: Arc<Building>,
    board: Arc<StatusBoard>,
    floor: u8,
    destination: u8,
    direction: Direction,
    motion: Motion,
    door: Door,
    behaviour: Behaviour,
    riders: Vec<Occupant>,
    rider_weight: f64,
    stops: Stops,
    distance: f64,
    accepted: u64,
    /// Time at which the current step is done and the car is available again.
    time: f64,
    plan: VecDeque<Step>,
    draining: bool,
}

pub fn main(mut car: ElevatorCar, actor: Actor, commands_rx: Receiver<Command>) -> Result<()> {
    let result = car.run(&actor, &commands_rx);
    match &result {
        Ok(()) => info!(t = car.time, car = car.id, "finished"),
        Err(SimError::Halted) => debug!(t = car.time, car = car.id, "halted"),
        Err(e) => {
            error!(t = car.time, car = car.id, "{}", e);
            actor.halt();
        },
    }
    result
}

impl ElevatorCar {
    pub fn new(
        id: usize,
        settings: CarSettings,
        tie_bias: Direction,
        building: Arc<Building>,
        board: Arc<StatusBoard>,
    ) -> Self {
        let num_floors = building.num_floors();
        ElevatorCar {
            id: id,
            settings: settings,
            tie_bias: tie_bias,
            building: building,
            board: board,
            floor: GROUND_FLOOR,
            destination: GROUND_FLOOR,
            direction: Direction::None,
            motion: Motion::Stopped,
            door: Door::Closed,
            behaviour: Behaviour::Waiting,
            riders: Vec::new(),
            rider_weight: 0.0,
            stops: Stops::new(num_floors),
            distance: 0.0,
            accepted: 0,
            time: 0.0,
            plan: VecDeque::new(),
            draining: false,
        }
    }

    fn run(&mut self, actor: &Actor, commands_rx: &Receiver<Command>) -> Result<()> {
        loop {
            let now = actor.wait_until(self.time)?;
            if self.time < now {
                self.time = now;
            }
            let finished = self.tick(now, commands_rx)?;
            self.sanity_check()?;
            self.publish(finished);
            if finished {
                return Ok(());
            }
        }
    }

    /// Do the next thing the car has to do. Returns true once the car has
    /// drained its queue and may stop.
    fn tick(&mut self, now: f64, commands_rx: &Receiver<Command>) -> Result<bool> {
        if let Some(step) = self.plan.pop_front() {
            self.perform(step)?;
            return Ok(false);
        }

        match self.behaviour {
            Behaviour::Executing => {
                if self.floor == self.destination {
                    self.behaviour = Behaviour::Waiting;
                    debug!(t = self.time, car = self.id, "waiting on floor {}", self.floor);
                } else {
                    self.plan_move();
                }
            },
            Behaviour::Waiting => {
                if self.draining {
                    if self.door == Door::Open {
                        self.plan.push_back(Step::CloseDoor);
                        return Ok(false);
                    }
                    return Ok(true);
                }
                match commands_rx.try_recv() {
                    Ok(command) => self.accept(command)?,
                    Err(TryRecvError::Empty) => self.time = now + TICK,
                    Err(TryRecvError::Disconnected) => self.draining = true,
                }
            },
        }
        Ok(false)
    }

    fn accept(&mut self, command: Command) -> Result<()> {
        self.accepted += 1;
        match command.kind {
            CommandKind::End => {
                info!(t = self.time, car = self.id, "{}", command);
                self.draining = true;
            },
            CommandKind::Goto | CommandKind::Call => {
                if !self.building.contains(command.floor) {
                    return Err(SimError::OutOfBounds { car: self.id, floor: command.floor });
                }
                info!(t = self.time, car = self.id, "{}", command);
                self.destination = command.floor;
                self.behaviour = Behaviour::Executing;
                self.stops.set(command.floor);
                if command.floor == self.floor {
                    self.plan.extend([Step::Stop, Step::OpenDoor, Step::Service]);
                } else {
                    self.direction = Direction::toward(self.floor, command.floor);
                }
            },
        }
        Ok(())
    }

    fn plan_move(&mut self) {
        self.direction = Direction::toward(self.floor, self.destination);
        if self.door == Door::Open {
            self.plan.push_back(Step::CloseDoor);
        }
        if self.motion == Motion::Stopped {
            self.plan.push_back(Step::Start);
        }
        self.plan.push_back(Step::Travel);
    }

    fn perform(&mut self, step: Step) -> Result<()> {
        match step {
            Step::CloseDoor => {
                if self.door == Door::Open {
                    self.door = Door::Closed;
                    self.time += self.settings.door_close;
                    debug!(t = self.time, car = self.id, "doors closed on floor {}", self.floor);
                }
            },
            Step::Start => {
                if self.motion == Motion::Stopped {
                    self.motion = Motion::Moving;
                    self.time += self.settings.car_start;
                    debug!(t = self.time, car = self.id, "moving {}", self.direction.as_string());
                }
            },
            Step::Travel => self.travel()?,
            Step::Stop => {
                if self.motion == Motion::Moving {
                    self.motion = Motion::Stopped;
                    self.time += self.settings.car_stop;
                    debug!(t = self.time, car = self.id, "stopped on floor {}", self.floor);
                }
            },
            Step::OpenDoor => {
                if self.door == Door::Closed {
                    self.door = Door::Open;
                    self.time += self.settings.door_open;
                    debug!(t = self.time, car = self.id, "doors open on floor {}", self.floor);
                }
                self.stops.clear(self.floor);
            },
            Step::Service => self.service()?,
        }
        Ok(())
    }

    /// Cross one floor toward the destination, and plan a stop if the car
    /// arrives where it is going or where a stop was requested.
    fn travel(&mut self) -> Result<()> {
        let next = self.floor as i16 + self.direction.step();
        if next < GROUND_FLOOR as i16 || next > self.building.top_floor() as i16 {
            return Err(SimError::OutOfBounds { car: self.id, floor: next.clamp(0, u8::MAX as i16) as u8 });
        }
        self.floor = next as u8;
        self.distance += self.settings.floor_height;
        self.time += self.settings.floor_travel_time();
        debug!(t = self.time, car = self.id, "passing floor {}", self.floor);

        if self.floor == self.destination || self.stops.is_set(self.floor) {
            info!(t = self.time, car = self.id, "arriving at floor {}", self.floor);
            self.plan.extend([Step::Stop, Step::OpenDoor, Step::Service]);
        }
        Ok(())
    }

    /// Let riders off, then take on waiters heading the same way, then keep
    /// the doors open for the dwell time.
    fn service(&mut self) -> Result<()> {
        let building = Arc::clone(&self.building);
        let floor = match building.floor(self.floor) {
            Some(floor) => floor,
            None => return Err(SimError::OutOfBounds { car: self.id, floor: self.floor }),
        };

        self.discharge(floor);

        let direction = self.pickup_direction(&floor.view());
        if direction != Direction::None {
            self.direction = direction;
        }
        if let Some(call) = direction.to_call() {
            self.board(floor, call);
        }

        self.time += self.settings.door_wait_time;
        Ok(())
    }

    fn discharge(&mut self, floor: &Floor) {
        let (leaving, staying): (Vec<Occupant>, Vec<Occupant>) = std::mem::take(&mut self.riders)
            .into_iter()
            .partition(|rider| rider.destination() == floor.id());
        self.riders = staying;

        for mut rider in leaving {
            self.time += self.settings.discharge_time;
            self.rider_weight -= rider.weight;
            rider.on_floor(self.time);
            info!(t = self.time, car = self.id, "occupant {} off on floor {}", rider.id, floor.id());
            floor.accept_occupant(rider);
        }
        if self.riders.is_empty() {
            self.rider_weight = 0.0;
        }
    }

    /// Riders aboard decide which way the car is heading. An empty car keeps
    /// going the way its remaining stops lie, or else answers a lit call,
    /// its current direction first.
    fn pickup_direction(&self, view: &FloorView) -> Direction {
        if let Some(rider) = self.riders.first() {
            return Direction::toward(self.floor, rider.destination());
        }
        if let Some(direction) = self.stops.next_direction(self.floor, self.direction) {
            return direction;
        }

        let first = match self.direction {
            Direction::None if self.tie_bias == Direction::Down => Direction::Down,
            Direction::None => Direction::Up,
            direction => direction,
        };
        [first, first.opposite()]
            .into_iter()
            .find(|direction| direction.to_call().map_or(false, |call| view.call(call)))
            .unwrap_or(Direction::None)
    }

    fn board(&mut self, floor: &Floor, call: Call) {
        let direction = call.direction();
        let passenger_limit = self.settings.passenger_limit;
        let weight_limit = self.settings.weight_limit;
        let mut count = self.riders.len();
        let mut weight = self.rider_weight;

        let boarding = floor.leave_waitlist(|waiter| {
            let fits = count < passenger_limit && weight + waiter.weight <= weight_limit + WEIGHT_EPSILON;
            if fits && direction.is_ahead(floor.id(), waiter.destination()) {
                count += 1;
                weight += waiter.weight;
                true
            } else {
                false
            }
        });

        for mut rider in boarding {
            rider.on_elevator(self.time);
            self.time += self.settings.load_time;
            self.rider_weight += rider.weight;
            self.stops.set(rider.destination());
            info!(t = self.time, car = self.id, "occupant {} on at floor {} for floor {}",
                rider.id, floor.id(), rider.destination());
            self.riders.push(rider);
        }

        if !floor.has_waiters_going(direction) {
            floor.cancel_call(call);
        }
    }

    fn sanity_check(&self) -> Result<()> {
        if !self.building.contains(self.floor) {
            return Err(SimError::OutOfBounds { car: self.id, floor: self.floor });
        }
        if self.motion == Motion::Moving && self.door == Door::Open {
            return Err(SimError::MovingWithDoorsOpen { car: self.id });
        }
        let going_up = self.riders.iter().any(|rider| rider.destination() > self.floor);
        let going_down = self.riders.iter().any(|rider| rider.destination() < self.floor);
        if going_up && going_down {
            return Err(SimError::OppositeRiders { car: self.id });
        }
        if self.riders.len() > self.settings.passenger_limit
            || self.rider_weight > self.settings.weight_limit + WEIGHT_EPSILON {
            return Err(SimError::OverCapacity {
                car: self.id,
                count: self.riders.len(),
                weight: self.rider_weight,
            });
        }
        Ok(())
    }

    fn status(&self, finished: bool) -> CarStatus {
        CarStatus {
            id: self.id,
            floor: self.floor,
            direction: self.direction,
            motion: self.motion,
            door: self.door,
            behaviour: self.behaviour,
            riders: self.riders.iter().map(Occupant::destination).collect(),
            rider_weight: self.rider_weight,
            stops: self.stops.clone(),
            distance: self.distance,
            accepted: self.accepted,
            ready_at: self.time,
            finished: finished,
        }
    }

    fn publish(&self, finished: bool) {
        self.board.publish(self.status(finished));
    }
}
