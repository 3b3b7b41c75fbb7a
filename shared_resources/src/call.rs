use crate::direction::Direction;

/// Elevator lobby call buttons on a floor.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    HallUp = 0,
    HallDown = 1,
}

impl Call {
    pub fn direction(self) -> Direction {
        match self {
            Call::HallUp => Direction::Up,
            Call::HallDown => Direction::Down,
        }
    }

    /// Button a waiter presses to travel from `floor` to `destination`.
    pub fn for_trip(floor: u8, destination: u8) -> Option<Self> {
        Direction::toward(floor, destination).to_call()
    }

    pub fn as_string(self) -> String {
        match self {
            Call::HallUp => String::from("up"),
            Call::HallDown => String::from("down"),
        }
    }

    pub fn iter_hall() -> impl Iterator<Item = Call> {
        [Call::HallUp, Call::HallDown].iter().copied()
    }
}
