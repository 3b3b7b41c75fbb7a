pub mod call;
pub mod clock;
pub mod command;
pub mod config;
pub mod direction;
pub mod error;
pub mod floor;
pub mod occupant;
