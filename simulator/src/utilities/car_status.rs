use std::sync::Arc;

use parking_lot::RwLock;

use shared_resources::direction::Direction;
use shared_resources::floor::GROUND_FLOOR;

use crate::utilities::stops::Stops;

#[derive(serde::Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub enum Motion {
    Stopped,
    Moving,
}

#[derive(serde::Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub enum Door {
    Open,
    Closed,
}

/// Whether the car is executing a command or waiting for the next one.
#[derive(serde::Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub enum Behaviour {
    Waiting,
    Executing,
}

impl Motion {
    pub fn as_string(&self) -> String {
        match self {
            Motion::Stopped => String::from("stopped"),
            Motion::Moving => String::from("moving"),
        }
    }
}

impl Door {
    pub fn as_string(&self) -> String {
        match self {
            Door::Open => String::from("open"),
            Door::Closed => String::from("closed"),
        }
    }
}

impl Behaviour {
    pub fn as_string(&self) -> String {
        match self {
            Behaviour::Waiting => String::from("waiting"),
            Behaviour::Executing => String::from("executing"),
        }
    }
}

/// Read-only snapshot of a car, published by the car after every step.
#[derive(serde::Serialize, Clone, Debug, PartialEq)]
pub struct CarStatus {
    pub id: usize,
    pub floor: u8,
    pub direction: Direction,
    pub motion: Motion,
    pub door: Door,
    pub behaviour: Behaviour,
    /// Destinations of the riders, in boarding order.
    pub riders: Vec<u8>,
    pub rider_weight: f64,
    pub stops: Stops,
    pub distance: f64,
    /// Number of commands taken off the inbound queue so far.
    pub accepted: u64,
    pub ready_at: f64,
    pub finished: bool,
}

impl CarStatus {
    pub fn new(id: usize, num_floors: u8) -> Self {
        CarStatus {
            id: id,
            floor: GROUND_FLOOR,
            direction: Direction::None,
            motion: Motion::Stopped,
            door: Door::Closed,
            behaviour: Behaviour::Waiting,
            riders: Vec::new(),
            rider_weight: 0.0,
            stops: Stops::new(num_floors),
            distance: 0.0,
            accepted: 0,
            ready_at: 0.0,
            finished: false,
        }
    }

    pub fn has_riders(&self) -> bool {
        !self.riders.is_empty()
    }

    pub fn is_waiting(&self) -> bool {
        self.behaviour == Behaviour::Waiting
    }
}

/// Latest published status of every car. Each car swaps in a fresh
/// snapshot; readers hold on to the `Arc` they got.
#[derive(Debug)]
pub struct StatusBoard {
    cars: Vec<RwLock<Arc<CarStatus>>>,
}

impl StatusBoard {
    pub fn new(num_elevators: usize, num_floors: u8) -> Self {
        StatusBoard {
            cars: (0..num_elevators)
                .map(|id| RwLock::new(Arc::new(CarStatus::new(id, num_floors))))
                .collect(),
        }
    }

    pub fn publish(&self, status: CarStatus) {
        if let Some(slot) = self.cars.get(status.id) {
            *slot.write() = Arc::new(status);
        }
    }

    pub fn get(&self, id: usize) -> Option<Arc<CarStatus>> {
        self.cars.get(id).map(|slot| Arc::clone(&slot.read()))
    }

    pub fn snapshot(&self) -> Vec<Arc<CarStatus>> {
        self.cars.iter().map(|slot| Arc::clone(&slot.read())).collect()
    }

    pub fn any_riders(&self) -> bool {
        self.cars.iter().any(|slot| slot.read().has_riders())
    }

    pub fn rider_count(&self) -> usize {
        self.cars.iter().map(|slot| slot.read().riders.len()).sum()
    }

    /// Riders aboard the fullest car.
    pub fn max_riders(&self) -> usize {
        self.cars.iter().map(|slot| slot.read().riders.len()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_keep_their_snapshot() {
        let board = StatusBoard::new(2, 5);
        let before = board.get(1).unwrap();

        let mut status = CarStatus::new(1, 5);
        status.floor = 4;
        status.riders = vec![5, 2];
        board.publish(status);

        assert_eq!(before.floor, GROUND_FLOOR);
        assert_eq!(board.get(1).unwrap().floor, 4);
        assert!(board.any_riders());
        assert_eq!(board.rider_count(), 2);
        assert_eq!(board.max_riders(), 2);
        assert!(board.get(2).is_none());
    }
}
