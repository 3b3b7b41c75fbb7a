use thiserror::Error;

/// Every way a simulation run can fail.
#[derive(Error, Debug)]
pub enum SimError {
    // Configuration errors
    #[error("unknown assignment logic: {0}")]
    UnknownPolicy(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    // Invariant violations
    #[error("occupant {occupant} has destination {destination} equal to its floor")]
    InvalidDestination { occupant: usize, destination: u8 },

    #[error("elevator {car} out of bounds on floor {floor}")]
    OutOfBounds { car: usize, floor: u8 },

    #[error("elevator {car} has riders in opposite directions")]
    OppositeRiders { car: usize },

    #[error("elevator {car} moving with doors open")]
    MovingWithDoorsOpen { car: usize },

    #[error("elevator {car} over capacity: {count} riders, {weight} lb")]
    OverCapacity { car: usize, count: usize, weight: f64 },

    #[error("occupant count changed: expected {expected}, found {found}")]
    HeadcountMismatch { expected: usize, found: usize },

    // Run control
    #[error("phase {phase} did not settle by T + {time:.0}")]
    Stalled { phase: String, time: f64 },

    #[error("simulation halted")]
    Halted,

    #[error("{actor} failed at T + {time:.2}: {source}")]
    ActorFailed {
        actor: String,
        time: f64,
        #[source]
        source: Box<SimError>,
    },
}

pub type Result<T> = std::result::Result<T, SimError>;
