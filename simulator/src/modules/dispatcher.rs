/// ----- DISPATCHER MODULE -----
/// Polls the hall calls once per tick and hands out commands to the cars.
/// Cars with riders are served first, then empty cars standing at a floor
/// with waiters, then the remaining calls: in the order they were made, or
/// nearest first under SSTF. Under the sweep policies a car left without
/// work moves on along its sweep. Scripted commands from the driver are
/// forwarded to their car unchanged.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, error, info, warn};

use shared_resources::call::Call;
use shared_resources::clock::{Actor, TICK};
use shared_resources::command::Command;
use shared_resources::direction::Direction;
use shared_resources::error::{Result, SimError};
use shared_resources::floor::{Building, FloorView, GROUND_FLOOR};

use crate::utilities::car_status::{CarStatus, Door, StatusBoard};
use crate::utilities::policy::{self, Policy};

/// A lit hall call waiting for a car.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallRequest {
    pub floor: u8,
    pub call: Call,
    /// When the earliest waiter on the floor joined the wait list.
    pub since: f64,
}

#[derive(Debug)]
pub struct Dispatcher {
    policy: Policy,
    tie_bias: Direction,
    top_floor: u8,
    next_car: usize,
    /// Commands sent to each car so far.
    issued: Vec<u64>,
    /// Calls already handed to a car, and the car.
    assigned: HashMap<(u8, Call), usize>,
}

pub fn main(
    mut dispatcher: Dispatcher,
    actor: Actor,
    building: Arc<Building>,
    board: Arc<StatusBoard>,
    inbound_rx: Receiver<Command>,
    car_txs: Vec<Sender<Command>>,
) -> Result<()> {
    let result = dispatcher.run(&actor, &building, &board, &inbound_rx, &car_txs);
    match &result {
        Ok(()) => info!(t = actor.now(), "dispatcher finished"),
        Err(SimError::Halted) => debug!(t = actor.now(), "dispatcher halted"),
        Err(e) => {
            error!(t = actor.now(), "{}", e);
            actor.halt();
        },
    }
    result
}

impl Dispatcher {
    /// Fails if `logic` names no known policy.
    pub fn new(logic: &str, tie_bias: Direction, num_elevators: usize, top_floor: u8) -> Result<Self> {
        let policy: Policy = logic.parse()?;
        info!("dispatching with {}", policy);
        Ok(Dispatcher {
            policy: policy,
            tie_bias: tie_bias,
            top_floor: top_floor,
            next_car: 0,
            issued: vec![0; num_elevators],
            assigned: HashMap::new(),
        })
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    fn run(
        &mut self,
        actor: &Actor,
        building: &Building,
        board: &StatusBoard,
        inbound_rx: &Receiver<Command>,
        car_txs: &[Sender<Command>],
    ) -> Result<()> {
        let mut next_poll = TICK;
        loop {
            let now = actor.wait_until(next_poll)?;
            next_poll = now + TICK;

            loop {
                match inbound_rx.try_recv() {
                    Ok(command) => {
                        self.record_issued(command.elevator);
                        send(command, car_txs)?;
                    },
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        for id in 0..car_txs.len() {
                            self.record_issued(id);
                            send(Command::end(now, id), car_txs)?;
                        }
                        return Ok(());
                    },
                }
            }

            let floors = building.views();
            let cars = board.snapshot();
            for command in self.poll(now, &floors, &cars) {
                send(command, car_txs)?;
            }
        }
    }

    fn record_issued(&mut self, car: usize) {
        if let Some(issued) = self.issued.get_mut(car) {
            *issued += 1;
        }
    }

    /// A car is free when it is waiting and has taken every command it was sent.
    fn is_free(&self, car: &CarStatus) -> bool {
        is_free(car, &self.issued)
    }

    /// Pick the car that should answer `request` among `cars`.
    pub fn select_elevator(&mut self, request: &CallRequest, cars: &[Arc<CarStatus>]) -> usize {
        match self.policy {
            Policy::Fcfs => self.rotate(cars),
            Policy::Sstf => {
                let nearest = cars.iter()
                    .filter_map(|car| policy::seek_distance(car, request.floor).map(|distance| (distance, car.id)))
                    .min();
                match nearest {
                    Some((_, id)) => id,
                    None => {
                        debug!(floor = request.floor, "every car is moving away, falling back to FCFS");
                        self.rotate(cars)
                    },
                }
            },
            Policy::Scan | Policy::Look | Policy::CScan | Policy::CLook => {
                let nearest = cars.iter()
                    .map(|car| {
                        let route = self.policy.sweep_route(car, request.floor, self.top_floor, self.tie_bias);
                        (policy::route_distance(car.floor, &route), car.id)
                    })
                    .min();
                match nearest {
                    Some((_, id)) => id,
                    None => self.rotate(cars),
                }
            },
        }
    }

    fn rotate(&mut self, cars: &[Arc<CarStatus>]) -> usize {
        if cars.is_empty() {
            return 0;
        }
        let index = self.next_car % cars.len();
        self.next_car = (index + 1) % cars.len();
        cars[index].id
    }

    /// Decide which commands to send this tick.
    pub fn poll(&mut self, now: f64, floors: &[FloorView], cars: &[Arc<CarStatus>]) -> Vec<Command> {
        self.forget_served(floors, cars);

        let mut commands = Vec::new();
        let mut given: HashSet<usize> = HashSet::new();

        // Riders first.
        for car in cars.iter().filter(|car| self.is_free(car) && car.has_riders()) {
            if let Some(stop) = self.policy.next_stop(car, self.tie_bias) {
                commands.push(Command::goto(now, car.id, stop, "riders"));
                given.insert(car.id);
            }
        }

        // Empty cars standing where people wait.
        let mut visited: HashSet<u8> = HashSet::new();
        let empty: Vec<&Arc<CarStatus>> = cars.iter()
            .filter(|car| self.is_free(car) && !car.has_riders())
            .collect();
        for car in empty {
            let view = match view_of(floors, car.floor) {
                Some(view) => view,
                None => continue,
            };
            let busy_here = cars.iter()
                .any(|other| other.id != car.id && other.floor == car.floor
                    && other.door == Door::Open && !self.is_free(other));
            if !view.has_waiters() || busy_here || !visited.insert(car.floor) {
                continue;
            }
            commands.push(Command::goto(now, car.id, car.floor, "same-floor"));
            given.insert(car.id);
            for call in Call::iter_hall().filter(|call| view.call(*call)) {
                self.assigned.insert((car.floor, call), car.id);
            }
        }

        // Everything else, longest wait first, or closest first under SSTF.
        let mut requests = self.pending_requests(now, floors);
        while !requests.is_empty() {
            let idle: Vec<Arc<CarStatus>> = cars.iter()
                .filter(|car| self.is_free(car) && !car.has_riders() && !given.contains(&car.id))
                .cloned()
                .collect();
            if idle.is_empty() {
                break;
            }
            let index = match self.policy {
                Policy::Sstf => self.nearest_request(&requests, &idle),
                _ => 0,
            };
            let request = requests.remove(index);
            let id = self.select_elevator(&request, &idle);
            commands.push(Command::goto(now, id, request.floor, "call"));
            given.insert(id);
            self.assigned.insert((request.floor, request.call), id);
        }

        // Sweeping cars with nothing to do keep going.
        let lit: Vec<u8> = floors.iter()
            .filter(|view| Call::iter_hall().any(|call| view.call(call)))
            .map(|view| view.id)
            .collect();
        for car in cars.iter().filter(|car| self.is_free(car) && !car.has_riders() && !given.contains(&car.id)) {
            if let Some(floor) = self.policy.sweep_step(car, &lit, self.top_floor, self.tie_bias) {
                commands.push(Command::goto(now, car.id, floor, "sweep"));
            }
        }

        for command in &commands {
            self.record_issued(command.elevator);
        }
        commands
    }

    /// Index of the request closest to any of `cars`. Equidistant requests
    /// resolve toward the tie bias, then to the longest waiting.
    fn nearest_request(&self, requests: &[CallRequest], cars: &[Arc<CarStatus>]) -> usize {
        requests.iter()
            .enumerate()
            .filter_map(|(index, request)| {
                cars.iter()
                    .filter_map(|car| {
                        policy::seek_distance(car, request.floor)
                            .map(|distance| (distance, self.against_bias(car.floor, request.floor), index))
                    })
                    .min()
            })
            .min()
            .map_or(0, |(_, _, index)| index)
    }

    fn against_bias(&self, from: u8, to: u8) -> bool {
        match Direction::toward(from, to) {
            Direction::Up => self.tie_bias == Direction::Down,
            Direction::Down => self.tie_bias != Direction::Down,
            Direction::None => false,
        }
    }

    /// Lit calls no car has been given yet, earliest waiter first.
    pub fn pending_requests(&self, now: f64, floors: &[FloorView]) -> Vec<CallRequest> {
        let mut requests: Vec<CallRequest> = floors.iter()
            .flat_map(|view| {
                Call::iter_hall()
                    .filter(move |call| view.call(*call))
                    .map(move |call| CallRequest {
                        floor: view.id,
                        call: call,
                        since: view.earliest_wait.unwrap_or(now),
                    })
            })
            .filter(|request| !self.assigned.contains_key(&(request.floor, request.call)))
            .collect();
        requests.sort_by(|a, b| a.since.total_cmp(&b.since).then(a.floor.cmp(&b.floor)));
        requests
    }

    /// Drop assignments whose call went out or whose car is free again.
    fn forget_served(&mut self, floors: &[FloorView], cars: &[Arc<CarStatus>]) {
        let issued = &self.issued;
        self.assigned.retain(|(floor, call), car| {
            let lit = view_of(floors, *floor).map_or(false, |view| view.call(*call));
            let busy = cars.get(*car).map_or(false, |status| !status.finished && !is_free(status, issued));
            lit && busy
        });
    }
}

fn send(command: Command, car_txs: &[Sender<Command>]) -> Result<()> {
    let car_tx = match car_txs.get(command.elevator) {
        Some(car_tx) => car_tx,
        None => {
            warn!("dropping {}: no such elevator", command);
            return Ok(());
        },
    };
    debug!(t = command.issued_at, "{}", command);
    // a car only hangs up after halting the run
    car_tx.send(command).map_err(|_| SimError::Halted)
}

fn is_free(car: &CarStatus, issued: &[u64]) -> bool {
    !car.finished && car.is_waiting() && issued.get(car.id).map_or(true, |issued| *issued == car.accepted)
}

fn view_of(floors: &[FloorView], floor: u8) -> Option<&FloorView> {
    floor.checked_sub(GROUND_FLOOR).and_then(|index| floors.get(index as usize))
}
