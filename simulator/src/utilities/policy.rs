use std::fmt;
use std::str::FromStr;

use shared_resources::direction::Direction;
use shared_resources::error::SimError;
use shared_resources::floor::GROUND_FLOOR;

use crate::utilities::car_status::{Behaviour, CarStatus};

/// Assignment logic used by the dispatcher.
///
/// - FCFS: requests are handed to the cars in turn.
/// - SSTF: the closest car that is not already moving away gets the request.
/// - SCAN: cars sweep to the end of the building before reversing.
/// - L-SCAN: like SCAN, but reverse after the last request in the current direction.
/// - C-SCAN: sweep upward only, then return to the ground floor and sweep again.
/// - C-LOOK: like C-SCAN, but return from the last request instead of the top floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Fcfs,
    Sstf,
    Scan,
    Look,
    CScan,
    CLook,
}

impl FromStr for Policy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FCFS" => Ok(Policy::Fcfs),
            "SSTF" => Ok(Policy::Sstf),
            "SCAN" => Ok(Policy::Scan),
            "L-SCAN" | "LOOK" => Ok(Policy::Look),
            "C-SCAN" => Ok(Policy::CScan),
            "C-LOOK" => Ok(Policy::CLook),
            _ => Err(SimError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::Fcfs => "FCFS",
            Policy::Sstf => "SSTF",
            Policy::Scan => "SCAN",
            Policy::Look => "L-SCAN",
            Policy::CScan => "C-SCAN",
            Policy::CLook => "C-LOOK",
        };
        f.write_str(name)
    }
}

impl Policy {
    /// Where a waiting car with riders should go next.
    pub fn next_stop(self, car: &CarStatus, tie_bias: Direction) -> Option<u8> {
        let stop = match self {
            Policy::Fcfs => car.riders.first().copied(),
            Policy::Sstf => car.stops.nearest(car.floor, tie_bias),
            Policy::Scan | Policy::Look | Policy::CScan | Policy::CLook => {
                let heading = heading(car.direction, tie_bias);
                car.stops.nearest_ahead(car.floor, heading)
                    .or_else(|| car.stops.nearest(car.floor, tie_bias))
            },
        };
        stop.or_else(|| car.riders.first().copied())
    }

    /// Waypoints a car follows along its sweep to reach `floor`, ending with
    /// `floor` itself. Only meaningful for the sweep policies; the others go
    /// straight there.
    pub fn sweep_route(self, car: &CarStatus, floor: u8, top_floor: u8, tie_bias: Direction) -> Vec<u8> {
        let heading = heading(car.direction, tie_bias);
        let ahead_or_here = floor == car.floor || heading.is_ahead(car.floor, floor);
        let last_stop = car.stops.farthest_ahead(car.floor, heading);
        let extremity = if heading == Direction::Down { GROUND_FLOOR } else { top_floor };

        let waypoints = match self {
            Policy::Fcfs | Policy::Sstf => vec![floor],
            _ if ahead_or_here && !(self.is_circular() && heading == Direction::Down) => vec![floor],
            Policy::Scan => vec![extremity, floor],
            Policy::Look => match last_stop {
                Some(last_stop) => vec![last_stop, floor],
                None => vec![floor],
            },
            Policy::CScan => {
                if heading == Direction::Down {
                    vec![GROUND_FLOOR, floor]
                } else {
                    vec![top_floor, GROUND_FLOOR, floor]
                }
            },
            Policy::CLook => {
                if heading == Direction::Down {
                    vec![floor]
                } else {
                    match last_stop {
                        Some(last_stop) => vec![last_stop, floor],
                        None => vec![floor],
                    }
                }
            },
        };

        let mut route: Vec<u8> = Vec::with_capacity(waypoints.len());
        let mut at = car.floor;
        for waypoint in waypoints {
            if waypoint != at {
                route.push(waypoint);
                at = waypoint;
            }
        }
        if route.last() != Some(&floor) {
            route.push(floor);
        }
        route
    }

    /// Floor a free, empty car moves on to when there is nothing else for it
    /// to do, given the floors with a lit call. `None` leaves it where it is.
    ///
    /// SCAN patrols end to end. C-SCAN climbs to the top and returns to the
    /// ground floor in one run. LOOK and C-LOOK only move while calls are lit
    /// and turn at the last one.
    pub fn sweep_step(self, car: &CarStatus, lit: &[u8], top_floor: u8, tie_bias: Direction) -> Option<u8> {
        let heading = heading(car.direction, tie_bias);
        let above = if car.floor < top_floor { Some(car.floor + 1) } else { None };
        let below = if car.floor > GROUND_FLOOR { Some(car.floor - 1) } else { None };
        let lit_ahead = |direction: Direction| lit.iter().any(|floor| direction.is_ahead(car.floor, *floor));

        match self {
            Policy::Fcfs | Policy::Sstf => None,
            Policy::Scan => match heading {
                Direction::Down => below.or(above),
                _ => above.or(below),
            },
            Policy::CScan => match (heading, above) {
                (Direction::Up, Some(above)) => Some(above),
                _ if car.floor > GROUND_FLOOR => Some(GROUND_FLOOR),
                _ => above,
            },
            Policy::Look => {
                let (forward, back) = if heading == Direction::Down { (below, above) } else { (above, below) };
                if lit_ahead(heading) {
                    forward
                } else if lit_ahead(heading.opposite()) {
                    back
                } else {
                    None
                }
            },
            Policy::CLook => {
                let lowest = lit.iter().copied().filter(|floor| *floor != car.floor).min()?;
                if (heading == Direction::Up && lit_ahead(Direction::Up)) || lowest > car.floor {
                    above
                } else {
                    Some(lowest)
                }
            },
        }
    }

    fn is_circular(self) -> bool {
        matches!(self, Policy::CScan | Policy::CLook)
    }
}

/// Floors travelled from `from` through every waypoint of `route`.
pub fn route_distance(from: u8, route: &[u8]) -> u32 {
    let mut at = from;
    let mut distance = 0;
    for waypoint in route {
        distance += at.abs_diff(*waypoint) as u32;
        at = *waypoint;
    }
    distance
}

/// Distance SSTF uses for a car: floors to the request, or `None` when the
/// car is executing a command that takes it away from the request. A free
/// car is standing still and always qualifies, so the exclusion only bites
/// when busy cars are among the candidates.
pub fn seek_distance(car: &CarStatus, floor: u8) -> Option<u32> {
    let moving_away = car.behaviour == Behaviour::Executing
        && car.direction.opposite().is_ahead(car.floor, floor);
    if moving_away {
        None
    } else {
        Some(car.floor.abs_diff(floor) as u32)
    }
}

fn heading(direction: Direction, tie_bias: Direction) -> Direction {
    match direction {
        Direction::None if tie_bias == Direction::Down => Direction::Down,
        Direction::None => Direction::Up,
        direction => direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car_at(floor: u8, direction: Direction) -> CarStatus {
        let mut car = CarStatus::new(0, 10);
        car.floor = floor;
        car.direction = direction;
        car
    }

    #[test]
    fn parses_every_documented_name() {
        for (name, policy) in [
            ("FCFS", Policy::Fcfs),
            ("SSTF", Policy::Sstf),
            ("SCAN", Policy::Scan),
            ("L-SCAN", Policy::Look),
            ("C-SCAN", Policy::CScan),
            ("C-LOOK", Policy::CLook),
        ] {
            assert_eq!(name.parse::<Policy>().unwrap(), policy);
            assert_eq!(policy.to_string(), name);
        }
        assert!(matches!("ELEVATOR".parse::<Policy>(), Err(SimError::UnknownPolicy(_))));
    }

    #[test]
    fn fcfs_serves_earliest_boarded_rider() {
        let mut car = car_at(3, Direction::Up);
        car.riders = vec![9, 5];
        car.stops.set(9);
        car.stops.set(5);
        assert_eq!(Policy::Fcfs.next_stop(&car, Direction::Up), Some(9));
        assert_eq!(Policy::Sstf.next_stop(&car, Direction::Up), Some(5));
        assert_eq!(Policy::Look.next_stop(&car, Direction::Up), Some(5));
    }

    #[test]
    fn sweep_policies_prefer_stops_ahead() {
        let mut car = car_at(5, Direction::Down);
        car.riders = vec![1];
        car.stops.set(1);
        car.stops.set(6);
        assert_eq!(Policy::Scan.next_stop(&car, Direction::Up), Some(1));
        assert_eq!(Policy::Sstf.next_stop(&car, Direction::Up), Some(6));
    }

    #[test]
    fn scan_reverses_at_the_extremity() {
        let car = car_at(6, Direction::Up);
        assert_eq!(Policy::Scan.sweep_route(&car, 8, 10, Direction::Up), vec![8]);
        assert_eq!(Policy::Scan.sweep_route(&car, 2, 10, Direction::Up), vec![10, 2]);
        assert_eq!(route_distance(6, &[10, 2]), 12);
    }

    #[test]
    fn look_reverses_after_the_last_stop() {
        let mut car = car_at(6, Direction::Up);
        assert_eq!(Policy::Look.sweep_route(&car, 2, 10, Direction::Up), vec![2]);
        car.stops.set(8);
        assert_eq!(Policy::Look.sweep_route(&car, 2, 10, Direction::Up), vec![8, 2]);
    }

    #[test]
    fn circular_sweeps_return_to_ground() {
        let car = car_at(6, Direction::Up);
        assert_eq!(Policy::CScan.sweep_route(&car, 3, 10, Direction::Up), vec![10, 1, 3]);
        assert_eq!(Policy::CScan.sweep_route(&car, 1, 10, Direction::Up), vec![10, 1]);
        assert_eq!(Policy::CLook.sweep_route(&car, 3, 10, Direction::Up), vec![3]);

        let returning = car_at(6, Direction::Down);
        assert_eq!(Policy::CScan.sweep_route(&returning, 3, 10, Direction::Up), vec![1, 3]);
    }

    #[test]
    fn scan_patrols_and_turns_at_the_ends() {
        assert_eq!(Policy::Scan.sweep_step(&car_at(4, Direction::Up), &[], 10, Direction::Up), Some(5));
        assert_eq!(Policy::Scan.sweep_step(&car_at(4, Direction::Down), &[], 10, Direction::Up), Some(3));
        assert_eq!(Policy::Scan.sweep_step(&car_at(10, Direction::Up), &[], 10, Direction::Up), Some(9));
        assert_eq!(Policy::Scan.sweep_step(&car_at(1, Direction::Down), &[], 10, Direction::Up), Some(2));
        assert_eq!(Policy::Scan.sweep_step(&car_at(4, Direction::None), &[], 10, Direction::Down), Some(3));
    }

    #[test]
    fn c_scan_returns_to_ground_from_the_top() {
        assert_eq!(Policy::CScan.sweep_step(&car_at(4, Direction::Up), &[], 10, Direction::Up), Some(5));
        assert_eq!(Policy::CScan.sweep_step(&car_at(10, Direction::Up), &[], 10, Direction::Up), Some(1));
        assert_eq!(Policy::CScan.sweep_step(&car_at(6, Direction::Down), &[], 10, Direction::Up), Some(1));
        assert_eq!(Policy::CScan.sweep_step(&car_at(1, Direction::Down), &[], 10, Direction::Up), Some(2));
    }

    #[test]
    fn look_turns_at_the_last_call() {
        let car = car_at(4, Direction::Up);
        assert_eq!(Policy::Look.sweep_step(&car, &[], 10, Direction::Up), None);
        assert_eq!(Policy::Look.sweep_step(&car, &[7], 10, Direction::Up), Some(5));
        assert_eq!(Policy::Look.sweep_step(&car, &[2], 10, Direction::Up), Some(3));
        assert_eq!(Policy::Look.sweep_step(&car, &[4], 10, Direction::Up), None);
    }

    #[test]
    fn c_look_jumps_back_to_the_lowest_call() {
        let car = car_at(6, Direction::Up);
        assert_eq!(Policy::CLook.sweep_step(&car, &[], 10, Direction::Up), None);
        assert_eq!(Policy::CLook.sweep_step(&car, &[2, 8], 10, Direction::Up), Some(7));
        assert_eq!(Policy::CLook.sweep_step(&car, &[2, 4], 10, Direction::Up), Some(2));
        assert_eq!(Policy::CLook.sweep_step(&car_at(3, Direction::Down), &[8], 10, Direction::Up), Some(4));
    }

    #[test]
    fn direct_policies_do_not_sweep() {
        let car = car_at(4, Direction::Up);
        assert_eq!(Policy::Fcfs.sweep_step(&car, &[9], 10, Direction::Up), None);
        assert_eq!(Policy::Sstf.sweep_step(&car, &[9], 10, Direction::Up), None);
    }

    #[test]
    fn seek_distance_skips_cars_moving_away() {
        let mut car = car_at(5, Direction::Up);
        assert_eq!(seek_distance(&car, 2), Some(3));
        car.behaviour = Behaviour::Executing;
        assert_eq!(seek_distance(&car, 2), None);
        assert_eq!(seek_distance(&car, 7), Some(2));
        assert_eq!(seek_distance(&car, 5), Some(0));
    }
}
