use std::cmp::Ordering;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::call::Call;
use crate::direction::Direction;
use crate::error::{Result, SimError};
use crate::occupant::Occupant;

/// The floor where occupants enter and leave the building.
pub const GROUND_FLOOR: u8 = 1;

#[derive(Debug, Default)]
struct FloorState {
    call_up: bool,
    call_down: bool,
    occupants: Vec<Occupant>,
    waitlist: Vec<Occupant>,
}

/// Read-only snapshot of a floor, taken under its lock.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct FloorView {
    pub id: u8,
    pub call_up: bool,
    pub call_down: bool,
    pub occupants: usize,
    pub waiters: usize,
    pub earliest_wait: Option<f64>,
}

impl FloorView {
    pub fn has_waiters(&self) -> bool {
        self.waiters > 0
    }

    pub fn call(&self, call: Call) -> bool {
        match call {
            Call::HallUp => self.call_up,
            Call::HallDown => self.call_down,
        }
    }
}

/// A floor of the building, with up/down call buttons, the people standing
/// on it and the people queued for an elevator. Every floor has its own lock.
#[derive(Debug)]
pub struct Floor {
    id: u8,
    state: Mutex<FloorState>,
}

impl Floor {
    pub fn new(id: u8) -> Self {
        debug!(floor = id, "created");
        Floor {
            id: id,
            state: Mutex::new(FloorState::default()),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn accept_occupant(&self, occupant: Occupant) {
        let mut state = self.state.lock();
        state.occupants.push(occupant);
        debug!(floor = self.id, "occupant list now: {}", state.occupants.len());
    }

    /// Move occupant `id` from the floor onto the wait list, pressing the
    /// call button for their direction. Returns false if they are not here.
    pub fn enter_waitlist(&self, id: usize, time: f64) -> Result<bool> {
        let mut state = self.state.lock();
        match state.occupants.iter().position(|occupant| occupant.id == id) {
            Some(index) => {
                let occupant = state.occupants.remove(index);
                self.join_waitlist(&mut state, occupant, time)?;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Move every occupant whose lobby time has come onto the wait list.
    /// Returns the number of occupants moved.
    pub fn update_wait_queue(&self, now: f64) -> Result<usize> {
        let mut state = self.state.lock();
        let (due, staying): (Vec<Occupant>, Vec<Occupant>) = std::mem::take(&mut state.occupants)
            .into_iter()
            .partition(|occupant| occupant.time_to_board(now));
        state.occupants = staying;

        let moved = due.len();
        for occupant in due {
            let lobby_time = occupant.lobby_time();
            self.join_waitlist(&mut state, occupant, lobby_time)?;
        }
        Ok(moved)
    }

    /// Take every waiter for which `predicate` holds off the wait list, in
    /// queue order.
    pub fn leave_waitlist<F>(&self, mut predicate: F) -> Vec<Occupant>
    where
        F: FnMut(&Occupant) -> bool,
    {
        let mut state = self.state.lock();
        let (leaving, staying): (Vec<Occupant>, Vec<Occupant>) = std::mem::take(&mut state.waitlist)
            .into_iter()
            .partition(|occupant| predicate(occupant));
        state.waitlist = staying;
        if !leaving.is_empty() {
            debug!(floor = self.id, "waitlist now: {}", state.waitlist.len());
        }
        leaving
    }

    pub fn cancel_call_up(&self) {
        self.cancel_call(Call::HallUp);
    }

    pub fn cancel_call_down(&self) {
        self.cancel_call(Call::HallDown);
    }

    pub fn cancel_call(&self, call: Call) {
        let mut state = self.state.lock();
        let button = match call {
            Call::HallUp => &mut state.call_up,
            Call::HallDown => &mut state.call_down,
        };
        if *button {
            *button = false;
            debug!(floor = self.id, "cancel call {}", call.as_string());
        }
    }

    pub fn has_waiters(&self) -> bool {
        !self.state.lock().waitlist.is_empty()
    }

    /// Whether anyone on the wait list wants to travel `direction`.
    pub fn has_waiters_going(&self, direction: Direction) -> bool {
        let state = self.state.lock();
        state.waitlist.iter().any(|occupant| direction.is_ahead(self.id, occupant.destination()))
    }

    /// Whether anyone standing here has a trip that has not started yet.
    pub fn has_future_arrivals(&self) -> bool {
        self.state.lock().occupants.iter().any(|occupant| occupant.is_scheduled())
    }

    /// Number of people on the floor and on its wait list.
    pub fn headcount(&self) -> usize {
        let state = self.state.lock();
        state.occupants.len() + state.waitlist.len()
    }

    pub fn view(&self) -> FloorView {
        let state = self.state.lock();
        let earliest_wait = state.waitlist.iter()
            .map(|occupant| occupant.waiting_since())
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        FloorView {
            id: self.id,
            call_up: state.call_up,
            call_down: state.call_down,
            occupants: state.occupants.len(),
            waiters: state.waitlist.len(),
            earliest_wait: earliest_wait,
        }
    }

    /// Let `f` reschedule or reset the people standing on this floor.
    pub fn for_each_occupant_mut<F>(&self, f: F)
    where
        F: FnMut(&mut Occupant),
    {
        self.state.lock().occupants.iter_mut().for_each(f);
    }

    pub fn for_each_occupant<F>(&self, f: F)
    where
        F: FnMut(&Occupant),
    {
        self.state.lock().occupants.iter().for_each(f);
    }

    fn join_waitlist(&self, state: &mut FloorState, mut occupant: Occupant, time: f64) -> Result<()> {
        match Call::for_trip(self.id, occupant.destination()) {
            Some(Call::HallUp) => {
                if !state.call_up {
                    info!(t = time, floor = self.id, "call up");
                    state.call_up = true;
                }
            },
            Some(Call::HallDown) => {
                if !state.call_down {
                    info!(t = time, floor = self.id, "call down");
                    state.call_down = true;
                }
            },
            None => {
                return Err(SimError::InvalidDestination {
                    occupant: occupant.id,
                    destination: occupant.destination(),
                })
            },
        }
        occupant.on_waitlist(time);
        state.waitlist.push(occupant);
        debug!(t = time, floor = self.id, "waitlist now: {}", state.waitlist.len());
        Ok(())
    }
}

/// All floors of the building, numbered from the ground floor up.
#[derive(Debug)]
pub struct Building {
    floors: Vec<Floor>,
}

impl Building {
    pub fn new(num_floors: u8) -> Self {
        Building {
            floors: (GROUND_FLOOR..GROUND_FLOOR + num_floors).map(Floor::new).collect(),
        }
    }

    pub fn num_floors(&self) -> u8 {
        self.floors.len() as u8
    }

    pub fn top_floor(&self) -> u8 {
        GROUND_FLOOR + self.num_floors() - 1
    }

    pub fn contains(&self, id: u8) -> bool {
        (GROUND_FLOOR..=self.top_floor()).contains(&id)
    }

    pub fn floor(&self, id: u8) -> Option<&Floor> {
        if self.contains(id) {
            self.floors.get((id - GROUND_FLOOR) as usize)
        } else {
            None
        }
    }

    pub fn ground(&self) -> &Floor {
        &self.floors[0]
    }

    pub fn floors(&self) -> impl Iterator<Item = &Floor> {
        self.floors.iter()
    }

    /// Move due occupants onto wait lists on every floor. Returns whether
    /// anyone is waiting for an elevator afterwards.
    pub fn update_wait_queues(&self, now: f64) -> Result<bool> {
        let mut any_waiters = false;
        for floor in &self.floors {
            floor.update_wait_queue(now)?;
            any_waiters |= floor.has_waiters();
        }
        Ok(any_waiters)
    }

    pub fn has_future_arrivals(&self) -> bool {
        self.floors.iter().any(Floor::has_future_arrivals)
    }

    pub fn headcount(&self) -> usize {
        self.floors.iter().map(Floor::headcount).sum()
    }

    pub fn views(&self) -> Vec<FloorView> {
        self.floors.iter().map(Floor::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupant(id: usize, destination: u8, lobby_time: f64) -> Occupant {
        let mut occupant = Occupant::new(id, 180.0);
        occupant.enq(destination, lobby_time);
        occupant
    }

    #[test]
    fn enter_waitlist_presses_the_right_button() {
        let floor = Floor::new(3);
        floor.accept_occupant(occupant(0, 5, 0.0));
        floor.accept_occupant(occupant(1, 1, 0.0));

        assert!(floor.enter_waitlist(0, 2.0).unwrap());
        let view = floor.view();
        assert!(view.call_up);
        assert!(!view.call_down);
        assert_eq!(view.waiters, 1);
        assert_eq!(view.earliest_wait, Some(2.0));

        assert!(floor.enter_waitlist(1, 4.0).unwrap());
        assert!(floor.view().call_down);
        assert!(!floor.enter_waitlist(9, 4.0).unwrap());
    }

    #[test]
    fn destination_on_same_floor_is_rejected() {
        let floor = Floor::new(2);
        floor.accept_occupant(occupant(0, 2, 0.0));
        assert!(matches!(
            floor.enter_waitlist(0, 0.0),
            Err(SimError::InvalidDestination { occupant: 0, destination: 2 })
        ));
    }

    #[test]
    fn update_wait_queue_only_moves_due_occupants() {
        let floor = Floor::new(1);
        floor.accept_occupant(occupant(0, 3, 5.0));
        floor.accept_occupant(occupant(1, 4, 50.0));

        assert_eq!(floor.update_wait_queue(10.0).unwrap(), 1);
        let view = floor.view();
        assert_eq!(view.waiters, 1);
        assert_eq!(view.occupants, 1);
        assert_eq!(view.earliest_wait, Some(5.0));
        assert!(floor.has_future_arrivals());
        assert_eq!(floor.headcount(), 2);
    }

    #[test]
    fn leave_waitlist_takes_matching_waiters_only() {
        let floor = Floor::new(1);
        for (id, destination) in [(0, 3), (1, 4), (2, 3)] {
            floor.accept_occupant(occupant(id, destination, 0.0));
        }
        floor.update_wait_queue(0.0).unwrap();

        let leaving = floor.leave_waitlist(|occupant| occupant.destination() == 3);
        let ids: Vec<usize> = leaving.iter().map(|occupant| occupant.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(floor.view().waiters, 1);
        assert!(floor.has_waiters_going(Direction::Up));
        assert!(!floor.has_waiters_going(Direction::Down));
    }

    #[test]
    fn cancel_calls() {
        let floor = Floor::new(2);
        floor.accept_occupant(occupant(0, 1, 0.0));
        floor.accept_occupant(occupant(1, 3, 0.0));
        floor.update_wait_queue(0.0).unwrap();

        floor.cancel_call_down();
        let view = floor.view();
        assert!(!view.call_down);
        assert!(view.call_up);
        floor.cancel_call_up();
        assert!(!floor.view().call_up);
    }

    #[test]
    fn building_numbers_floors_from_ground() {
        let building = Building::new(4);
        assert_eq!(building.num_floors(), 4);
        assert_eq!(building.top_floor(), 4);
        assert_eq!(building.ground().id(), GROUND_FLOOR);
        assert_eq!(building.floor(4).map(Floor::id), Some(4));
        assert!(building.floor(0).is_none());
        assert!(building.floor(5).is_none());
    }

    #[test]
    fn building_wait_queues() {
        let building = Building::new(4);
        building.ground().accept_occupant(occupant(0, 4, 0.0));
        building.ground().accept_occupant(occupant(1, 2, 30.0));

        assert!(building.update_wait_queues(0.0).unwrap());
        assert!(building.has_future_arrivals());
        assert_eq!(building.headcount(), 2);
        assert_eq!(building.views()[0].waiters, 1);
    }
}
