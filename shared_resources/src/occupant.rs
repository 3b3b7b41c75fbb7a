/// A person in the building.
///
/// A trip starts when the occupant joins a floor's wait list, a ride starts
/// when they board a car, and both end when the car discharges them.

#[derive(serde::Serialize, Debug, Clone, Default, PartialEq)]
pub struct TripStats {
    pub trips: u32,
    pub total_wait_time: f64,
    pub total_ride_time: f64,
    pub total_trip_time: f64,
    pub max_wait_time: f64,
    pub max_ride_time: f64,
    pub max_trip_time: f64,
}

#[derive(Debug, Clone)]
pub struct Occupant {
    pub id: usize,
    pub weight: f64,
    destination: u8,
    lobby_time: f64,
    scheduled: bool,
    on_waitlist_time: f64,
    on_elevator_time: f64,
    stats: TripStats,
}

/// Weight range of generated occupants, in pounds.
pub const MIN_WEIGHT: u32 = 170;
pub const MAX_WEIGHT: u32 = 200;

impl Occupant {
    pub fn new(id: usize, weight: f64) -> Self {
        Occupant {
            id: id,
            weight: weight,
            destination: 0,
            lobby_time: 0.0,
            scheduled: false,
            on_waitlist_time: 0.0,
            on_elevator_time: 0.0,
            stats: TripStats::default(),
        }
    }

    /// Schedule the next trip: arrive at the lobby at `lobby_time`, heading
    /// for `destination`.
    pub fn enq(&mut self, destination: u8, lobby_time: f64) {
        self.destination = destination;
        self.lobby_time = lobby_time;
        self.scheduled = true;
    }

    pub fn destination(&self) -> u8 {
        self.destination
    }

    pub fn lobby_time(&self) -> f64 {
        self.lobby_time
    }

    /// Has a trip that has not started yet.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn time_to_board(&self, now: f64) -> bool {
        self.scheduled && self.lobby_time <= now
    }

    pub fn waiting_since(&self) -> f64 {
        self.on_waitlist_time
    }

    pub fn stats(&self) -> &TripStats {
        &self.stats
    }

    pub fn init_stats(&mut self) {
        self.stats = TripStats::default();
    }

    pub fn on_waitlist(&mut self, time: f64) {
        self.scheduled = false;
        self.on_waitlist_time = time;
    }

    pub fn on_elevator(&mut self, time: f64) {
        self.on_elevator_time = time;
        let wait_time = time - self.on_waitlist_time;
        self.stats.total_wait_time += wait_time;
        self.stats.max_wait_time = self.stats.max_wait_time.max(wait_time);
    }

    pub fn on_floor(&mut self, time: f64) {
        let ride_time = time - self.on_elevator_time;
        self.stats.total_ride_time += ride_time;
        self.stats.max_ride_time = self.stats.max_ride_time.max(ride_time);

        let trip_time = time - self.on_waitlist_time;
        self.stats.total_trip_time += trip_time;
        self.stats.max_trip_time = self.stats.max_trip_time.max(trip_time);
        self.stats.trips += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_bookkeeping() {
        let mut occupant = Occupant::new(7, 180.0);
        occupant.enq(4, 10.0);
        assert!(!occupant.time_to_board(9.0));
        assert!(occupant.time_to_board(10.0));

        occupant.on_waitlist(10.0);
        assert!(!occupant.is_scheduled());
        occupant.on_elevator(15.0);
        occupant.on_floor(40.0);

        let stats = occupant.stats();
        assert_eq!(stats.trips, 1);
        assert_eq!(stats.total_wait_time, 5.0);
        assert_eq!(stats.total_ride_time, 25.0);
        assert_eq!(stats.total_trip_time, 30.0);
        assert_eq!(stats.max_trip_time, 30.0);
    }

    #[test]
    fn maxima_keep_the_longest_trip() {
        let mut occupant = Occupant::new(0, 170.0);
        for (start, board, arrive) in [(0.0, 4.0, 10.0), (20.0, 30.0, 31.0)] {
            occupant.on_waitlist(start);
            occupant.on_elevator(board);
            occupant.on_floor(arrive);
        }
        assert_eq!(occupant.stats().trips, 2);
        assert_eq!(occupant.stats().max_wait_time, 10.0);
        assert_eq!(occupant.stats().max_ride_time, 6.0);
        assert_eq!(occupant.stats().max_trip_time, 11.0);

        occupant.init_stats();
        assert_eq!(*occupant.stats(), TripStats::default());
    }
}
