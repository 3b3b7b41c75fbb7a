/// ----- CLOCK -----
/// Simulated time shared by every actor. Only the driver advances it.
/// Actors park on the clock until it reaches the time they are waiting
/// for, and the driver only advances once every actor is parked. Each tick
/// releases the dispatch stage first and the car stage second.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{Result, SimError};

/// Step by which the driver advances the clock, in seconds.
pub const TICK: f64 = 1.0;

/// Order in which parked actors are released within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Dispatch,
    Cars,
}

#[derive(Debug)]
struct Waiter {
    target: f64,
    stage: Stage,
    released: bool,
}

#[derive(Debug)]
struct ClockState {
    now: f64,
    stage: Stage,
    registered: usize,
    running: usize,
    next_ticket: u64,
    parked: HashMap<u64, Waiter>,
    halted: bool,
}

#[derive(Debug)]
pub struct Clock {
    now_bits: AtomicU64,
    state: Mutex<ClockState>,
    changed: Condvar,
}

impl Clock {
    pub fn new() -> Arc<Self> {
        Arc::new(Clock {
            now_bits: AtomicU64::new(0.0_f64.to_bits()),
            state: Mutex::new(ClockState {
                now: 0.0,
                stage: Stage::Cars,
                registered: 0,
                running: 0,
                next_ticket: 0,
                parked: HashMap::new(),
                halted: false,
            }),
            changed: Condvar::new(),
        })
    }

    /// Current simulated time in seconds.
    pub fn now(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::Acquire))
    }

    /// Register an actor. Must happen before the actor's thread is spawned,
    /// so the driver never advances past a tick the actor has not seen.
    pub fn join(self: &Arc<Self>, stage: Stage) -> Actor {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.registered += 1;
        state.running += 1;
        Actor {
            clock: Arc::clone(self),
            stage: stage,
            ticket: ticket,
        }
    }

    pub fn active_actors(&self) -> usize {
        self.state.lock().registered
    }

    pub fn is_halted(&self) -> bool {
        self.state.lock().halted
    }

    /// Stop the run. Every parked actor and the driver get `SimError::Halted`.
    pub fn halt(&self) {
        let mut state = self.state.lock();
        state.halted = true;
        self.changed.notify_all();
    }

    /// Run `f` while every registered actor is parked.
    pub fn quiescent<T>(&self, f: impl FnOnce(f64) -> T) -> Result<T> {
        let mut state = self.state.lock();
        self.wait_quiescent(&mut state)?;
        Ok(f(state.now))
    }

    /// Advance time by `step` once all actors are parked, then release the
    /// dispatch stage and, after it has parked again, the car stage.
    pub fn advance(&self, step: f64) -> Result<f64> {
        debug_assert!(step > 0.0, "clock must move forward, got step {}", step);
        let mut state = self.state.lock();
        self.wait_quiescent(&mut state)?;

        let next = state.now + step;
        state.now = next;
        self.now_bits.store(next.to_bits(), Ordering::Release);

        for stage in [Stage::Dispatch, Stage::Cars] {
            state.stage = stage;
            Self::release(&mut state);
            self.changed.notify_all();
            self.wait_quiescent(&mut state)?;
        }
        Ok(next)
    }

    fn wait_quiescent(&self, state: &mut MutexGuard<ClockState>) -> Result<()> {
        while state.running > 0 && !state.halted {
            self.changed.wait(state);
        }
        if state.halted {
            return Err(SimError::Halted);
        }
        Ok(())
    }

    fn release(state: &mut ClockState) {
        let (now, stage) = (state.now, state.stage);
        let mut woken = 0;
        for waiter in state.parked.values_mut() {
            if !waiter.released && waiter.target <= now && waiter.stage <= stage {
                waiter.released = true;
                woken += 1;
            }
        }
        state.running += woken;
    }
}

/// A registered actor's handle on the clock. Deregisters on drop.
#[derive(Debug)]
pub struct Actor {
    clock: Arc<Clock>,
    stage: Stage,
    ticket: u64,
}

impl Actor {
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn halt(&self) {
        self.clock.halt();
    }

    /// Park until the clock reaches `target` and this actor's stage is
    /// released. Returns the time at which the actor resumed.
    pub fn wait_until(&self, target: f64) -> Result<f64> {
        let mut state = self.clock.state.lock();
        if state.halted {
            return Err(SimError::Halted);
        }
        if target <= state.now && self.stage <= state.stage {
            return Ok(state.now);
        }

        state.running -= 1;
        state.parked.insert(self.ticket, Waiter {
            target: target,
            stage: self.stage,
            released: false,
        });
        self.clock.changed.notify_all();

        loop {
            if state.halted {
                state.parked.remove(&self.ticket);
                state.running += 1;
                return Err(SimError::Halted);
            }
            if state.parked.get(&self.ticket).map_or(false, |waiter| waiter.released) {
                state.parked.remove(&self.ticket);
                return Ok(state.now);
            }
            self.clock.changed.wait(&mut state);
        }
    }
}

impl Drop for Actor {
    fn drop(&mut self) {
        let mut state = self.clock.state.lock();
        state.registered -= 1;
        state.running -= 1;
        self.clock.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use proptest::prelude::*;

    #[test]
    fn clock_starts_at_zero() {
        let clock = Clock::new();
        assert_eq!(clock.now(), 0.0);
        assert_eq!(clock.active_actors(), 0);
    }

    #[test]
    fn advance_without_actors_just_moves_time() {
        let clock = Clock::new();
        assert_eq!(clock.advance(1.0).unwrap(), 1.0);
        assert_eq!(clock.advance(1.0).unwrap(), 2.0);
        assert_eq!(clock.now(), 2.0);
    }

    #[test]
    fn actor_resumes_once_time_catches_up() {
        let clock = Clock::new();
        let actor = clock.join(Stage::Cars);
        let handle = thread::spawn(move || actor.wait_until(3.0));

        for _ in 0..3 {
            clock.advance(1.0).unwrap();
        }
        let resumed = handle.join().unwrap().unwrap();
        assert_eq!(resumed, 3.0);
        assert_eq!(clock.active_actors(), 0);
    }

    #[test]
    fn dispatch_stage_runs_before_cars_each_tick() {
        let clock = Clock::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (stage, name) in [(Stage::Cars, "car"), (Stage::Dispatch, "dispatch")] {
            let actor = clock.join(stage);
            let log = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                let mut target = 1.0;
                for _ in 0..3 {
                    let now = actor.wait_until(target).unwrap();
                    log.lock().push((now as u32, name));
                    target = now + 1.0;
                }
            }));
        }

        for _ in 0..4 {
            clock.advance(1.0).unwrap();
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let expected = vec![
            (1, "dispatch"), (1, "car"),
            (2, "dispatch"), (2, "car"),
            (3, "dispatch"), (3, "car"),
        ];
        assert_eq!(*log.lock(), expected);
    }

    #[test]
    fn quiescent_runs_with_everyone_parked() {
        let clock = Clock::new();
        let actor = clock.join(Stage::Cars);
        let handle = thread::spawn(move || actor.wait_until(10.0));

        let seen = clock.quiescent(|now| now).unwrap();
        assert_eq!(seen, 0.0);
        clock.halt();
        assert!(matches!(handle.join().unwrap(), Err(SimError::Halted)));
    }

    #[test]
    fn halt_fails_the_driver_too() {
        let clock = Clock::new();
        clock.halt();
        assert!(clock.is_halted());
        assert!(matches!(clock.advance(1.0), Err(SimError::Halted)));
    }

    proptest! {
        #[test]
        fn time_never_decreases(steps in proptest::collection::vec(0.001f64..10.0, 1..50)) {
            let clock = Clock::new();
            let mut last = clock.now();
            for step in steps {
                let now = clock.advance(step).unwrap();
                prop_assert!(now >= last);
                prop_assert_eq!(now, clock.now());
                last = now;
            }
        }
    }
}
