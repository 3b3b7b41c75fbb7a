/// ----- DRIVER MODULE -----
/// The only writer of the clock. Each tick it lets due occupants join the
/// wait lists, injects scripted commands and checks whether the phase has
/// settled, all while every actor is parked, and then advances time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use tracing::{debug, error, info};

use shared_resources::clock::{Clock, TICK};
use shared_resources::command::Command;
use shared_resources::error::{Result, SimError};
use shared_resources::floor::Building;

use crate::utilities::car_status::{CarStatus, StatusBoard};
use crate::utilities::debug::StatusView;
use crate::utilities::stats::{self, PhaseReport};

/// A phase that has not settled after a simulated day is stuck.
const PHASE_TIME_LIMIT: f64 = 86_400.0;

pub struct Driver {
    clock: Arc<Clock>,
    building: Arc<Building>,
    board: Arc<StatusBoard>,
    dispatch_tx: Option<Sender<Command>>,
    script: VecDeque<Command>,
    view: Option<StatusView>,
    peak_riders: usize,
    handles: Vec<(String, JoinHandle<Result<()>>)>,
}

impl Driver {
    pub fn new(
        clock: Arc<Clock>,
        building: Arc<Building>,
        board: Arc<StatusBoard>,
        dispatch_tx: Sender<Command>,
        script: Vec<Command>,
        debug_view: bool,
        handles: Vec<(String, JoinHandle<Result<()>>)>,
    ) -> Self {
        Driver {
            clock: clock,
            building: building,
            board: board,
            dispatch_tx: Some(dispatch_tx),
            script: script.into(),
            view: if debug_view { Some(StatusView::new()) } else { None },
            peak_riders: 0,
            handles: handles,
        }
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// Run `f` on the building while every actor is parked.
    pub fn with_building<T>(&mut self, f: impl FnOnce(&Building, f64) -> T) -> Result<T> {
        let result = self.clock.quiescent(|now| f(&self.building, now));
        self.check(result)
    }

    /// Advance the clock until nobody waits, nobody rides and nobody is
    /// scheduled to arrive, then report the trips made since the phase began.
    pub fn run_phase(&mut self, name: &str) -> Result<PhaseReport> {
        let result = self.drive_phase(name);
        self.check(result)
    }

    /// Hang up on the dispatcher, which tells every car to finish, and keep
    /// the clock going until every actor is gone. Returns the cars as they
    /// were left.
    pub fn finish(mut self) -> Result<Vec<Arc<CarStatus>>> {
        let result = self.shut_down();
        self.check(result)?;
        Ok(self.board.snapshot())
    }

    fn drive_phase(&mut self, name: &str) -> Result<PhaseReport> {
        let clock = Arc::clone(&self.clock);
        let (start, expected, start_distances) = clock.quiescent(|now| {
            (now, self.building.headcount() + self.board.rider_count(), self.distances())
        })?;
        info!(t = start, "{} phase started with {} occupants", name, expected);
        self.peak_riders = 0;

        loop {
            let settled = clock.quiescent(|now| self.settle(now, expected))??;
            if settled {
                break;
            }
            let now = clock.advance(TICK)?;
            if now - start > PHASE_TIME_LIMIT {
                return Err(SimError::Stalled { phase: name.to_string(), time: now });
            }
        }

        let end = clock.now();
        let distances = self.distances()
            .into_iter()
            .zip(start_distances)
            .map(|(distance, start_distance)| distance - start_distance)
            .collect();
        let mut report = PhaseReport::collect(name, start, end, &self.building, distances);
        report.peak_riders = self.peak_riders;
        stats::reset(&self.building);

        if let Some(view) = &mut self.view {
            view.print_status(end, &self.board.snapshot(), &self.building.views())?;
        }
        info!(t = end, trips = report.trips, "{} phase finished", name);
        if let Ok(json) = serde_json::to_string(&report) {
            debug!(t = end, "{}", json);
        }
        Ok(report)
    }

    /// One tick of driver work. Returns whether the phase has settled.
    fn settle(&mut self, now: f64, expected: usize) -> Result<bool> {
        while self.script.front().map_or(false, |command| command.issued_at <= now) {
            if let Some(command) = self.script.pop_front() {
                info!(t = now, "script: {}", command);
                if let Some(dispatch_tx) = &self.dispatch_tx {
                    dispatch_tx.send(command).map_err(|_| SimError::Halted)?;
                }
            }
        }

        let any_waiters = self.building.update_wait_queues(now)?;

        let found = self.building.headcount() + self.board.rider_count();
        if found != expected {
            return Err(SimError::HeadcountMismatch { expected: expected, found: found });
        }
        self.peak_riders = self.peak_riders.max(self.board.max_riders());

        if let Some(view) = &mut self.view {
            view.print_status(now, &self.board.snapshot(), &self.building.views())?;
        }

        Ok(!any_waiters
            && !self.board.any_riders()
            && !self.building.has_future_arrivals()
            && self.script.is_empty())
    }

    fn shut_down(&mut self) -> Result<()> {
        self.dispatch_tx = None;
        let start = self.clock.now();
        info!(t = start, "shutting down");
        while self.clock.active_actors() > 0 {
            let now = self.clock.advance(TICK)?;
            if now - start > PHASE_TIME_LIMIT {
                return Err(SimError::Stalled { phase: String::from("shutdown"), time: now });
            }
        }
        self.join()
    }

    fn distances(&self) -> Vec<f64> {
        self.board.snapshot().iter().map(|car| car.distance).collect()
    }

    /// Wait for every actor thread and report the first one that failed.
    fn join(&mut self) -> Result<()> {
        let mut failure = None;
        for (name, handle) in self.handles.drain(..) {
            match handle.join() {
                Ok(Ok(())) | Ok(Err(SimError::Halted)) => {},
                Ok(Err(e)) => {
                    if failure.is_none() {
                        failure = Some((name, e));
                    }
                },
                Err(_) => error!("{} panicked", name),
            }
        }
        match failure {
            Some((actor, e)) => Err(SimError::ActorFailed {
                actor: actor,
                time: self.clock.now(),
                source: Box::new(e),
            }),
            None => Ok(()),
        }
    }

    /// Turn a failed step into a run failure: stop the clock, collect every
    /// thread and name the actor that broke.
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(SimError::Halted) => {
                self.clock.halt();
                self.join()?;
                Err(SimError::Halted)
            },
            Err(e @ SimError::ActorFailed { .. }) => Err(e),
            Err(e) => {
                let time = self.clock.now();
                error!(t = time, "driver: {}", e);
                self.clock.halt();
                let _ = self.join();
                Err(SimError::ActorFailed {
                    actor: String::from("driver"),
                    time: time,
                    source: Box::new(e),
                })
            },
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.clock.halt();
            let _ = self.join();
        }
    }
}
