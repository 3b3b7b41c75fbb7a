use shared_resources::direction::Direction;
use shared_resources::floor::GROUND_FLOOR;

/// Per-floor stop request flags of one car, indexed by floor id.
#[derive(serde::Serialize, Clone, Debug, PartialEq)]
pub struct Stops {
    stops: Vec<bool>,
}

impl Stops {
    pub fn new(num_floors: u8) -> Self {
        Stops {
            stops: vec![false; num_floors as usize],
        }
    }

    fn index(&self, floor: u8) -> Option<usize> {
        floor.checked_sub(GROUND_FLOOR)
            .map(|index| index as usize)
            .filter(|index| *index < self.stops.len())
    }

    /// Returns true if the flag was not set before.
    pub fn set(&mut self, floor: u8) -> bool {
        match self.index(floor) {
            Some(index) if !self.stops[index] => {
                self.stops[index] = true;
                true
            },
            _ => false,
        }
    }

    /// Returns true if the flag was set before.
    pub fn clear(&mut self, floor: u8) -> bool {
        match self.index(floor) {
            Some(index) if self.stops[index] => {
                self.stops[index] = false;
                true
            },
            _ => false,
        }
    }

    pub fn is_set(&self, floor: u8) -> bool {
        self.index(floor).map_or(false, |index| self.stops[index])
    }

    pub fn any(&self) -> bool {
        self.stops.iter().any(|stop| *stop)
    }

    /// Floors with a stop request, lowest first.
    pub fn floors(&self) -> impl Iterator<Item = u8> + '_ {
        self.stops.iter()
            .enumerate()
            .filter(|(_, stop)| **stop)
            .map(|(index, _)| index as u8 + GROUND_FLOOR)
    }

    pub fn further_in_direction(&self, floor: u8, direction: Direction) -> bool {
        self.floors().any(|stop| direction.is_ahead(floor, stop))
    }

    /// Closest stop strictly ahead of `floor` when heading `direction`.
    pub fn nearest_ahead(&self, floor: u8, direction: Direction) -> Option<u8> {
        self.floors()
            .filter(|stop| direction.is_ahead(floor, *stop))
            .min_by_key(|stop| stop.abs_diff(floor))
    }

    /// Farthest stop strictly ahead of `floor` when heading `direction`.
    pub fn farthest_ahead(&self, floor: u8, direction: Direction) -> Option<u8> {
        self.floors()
            .filter(|stop| direction.is_ahead(floor, *stop))
            .max_by_key(|stop| stop.abs_diff(floor))
    }

    /// Closest stop in either direction. Equidistant stops resolve toward
    /// `tie_bias`.
    pub fn nearest(&self, floor: u8, tie_bias: Direction) -> Option<u8> {
        let above = self.nearest_ahead(floor, Direction::Up);
        let below = self.nearest_ahead(floor, Direction::Down);
        if self.is_set(floor) {
            return Some(floor);
        }
        match (above, below) {
            (Some(up), Some(down)) => {
                let (up_distance, down_distance) = (up - floor, floor - down);
                if up_distance < down_distance || (up_distance == down_distance && tie_bias != Direction::Down) {
                    Some(up)
                } else {
                    Some(down)
                }
            },
            (above, below) => above.or(below),
        }
    }

    /// Keep heading the same way while there are stops ahead, otherwise turn
    /// around if there are stops behind.
    pub fn next_direction(&self, floor: u8, last_direction: Direction) -> Option<Direction> {
        let other_direction = if last_direction == Direction::Down { Direction::Up } else { Direction::Down };
        let last_direction = if last_direction == Direction::None { Direction::Up } else { last_direction };
        if self.further_in_direction(floor, last_direction) {
            return Some(last_direction)
        } else if self.further_in_direction(floor, other_direction) {
            return Some(other_direction)
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(num_floors: u8, set: &[u8]) -> Stops {
        let mut stops = Stops::new(num_floors);
        for floor in set {
            stops.set(*floor);
        }
        stops
    }

    #[test]
    fn set_and_clear_report_changes() {
        let mut stops = Stops::new(5);
        assert!(stops.set(3));
        assert!(!stops.set(3));
        assert!(stops.is_set(3));
        assert!(!stops.set(0));
        assert!(!stops.set(6));
        assert!(stops.clear(3));
        assert!(!stops.clear(3));
        assert!(!stops.any());
    }

    #[test]
    fn nearest_prefers_bias_on_ties() {
        let stops = stops(9, &[2, 6]);
        assert_eq!(stops.nearest(4, Direction::Up), Some(6));
        assert_eq!(stops.nearest(4, Direction::Down), Some(2));
        assert_eq!(stops.nearest(5, Direction::Down), Some(6));
        assert_eq!(stops.nearest(1, Direction::Down), Some(2));
    }

    #[test]
    fn ahead_queries() {
        let stops = stops(10, &[2, 5, 9]);
        assert_eq!(stops.nearest_ahead(4, Direction::Up), Some(5));
        assert_eq!(stops.farthest_ahead(4, Direction::Up), Some(9));
        assert_eq!(stops.nearest_ahead(4, Direction::Down), Some(2));
        assert_eq!(stops.nearest_ahead(9, Direction::Up), None);
        assert_eq!(stops.floors().collect::<Vec<u8>>(), vec![2, 5, 9]);
    }

    #[test]
    fn next_direction_keeps_heading_while_stops_remain() {
        let stops = stops(10, &[2, 8]);
        assert_eq!(stops.next_direction(5, Direction::Down), Some(Direction::Down));
        assert_eq!(stops.next_direction(5, Direction::Up), Some(Direction::Up));
        assert_eq!(stops.next_direction(9, Direction::Up), Some(Direction::Down));
        assert_eq!(Stops::new(10).next_direction(5, Direction::Up), None);
    }
}
