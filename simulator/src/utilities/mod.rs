pub mod car_status;
pub mod debug;
pub mod generator;
pub mod policy;
pub mod stats;
pub mod stops;
