use std::cmp::Ordering;

use crate::call::Call;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    None,
    Up,
}

impl Direction {
    /// Direction of travel from `from` to `to`, `None` when they are equal.
    pub fn toward(from: u8, to: u8) -> Self {
        match to.cmp(&from) {
            Ordering::Less => Direction::Down,
            Ordering::Equal => Direction::None,
            Ordering::Greater => Direction::Up,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::None => Direction::None,
        }
    }

    /// Floor index step for one floor crossing.
    pub fn step(self) -> i16 {
        match self {
            Direction::Down => -1,
            Direction::None => 0,
            Direction::Up => 1,
        }
    }

    /// Whether `floor` lies strictly ahead of `from` when heading this way.
    pub fn is_ahead(self, from: u8, floor: u8) -> bool {
        match self {
            Direction::Down => floor < from,
            Direction::Up => floor > from,
            Direction::None => false,
        }
    }

    pub fn as_string(self) -> String {
        match self {
            Direction::Down => String::from("down"),
            Direction::None => String::from("none"),
            Direction::Up => String::from("up"),
        }
    }

    pub fn to_call(self) -> Option<Call> {
        match self {
            Direction::Up => Some(Call::HallUp),
            Direction::Down => Some(Call::HallDown),
            Direction::None => None,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::None
    }
}
