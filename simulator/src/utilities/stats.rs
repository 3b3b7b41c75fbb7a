use std::fmt;

use shared_resources::floor::Building;
use shared_resources::occupant::TripStats;

/// Trip statistics of one scenario phase.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct PhaseReport {
    pub name: String,
    pub start: f64,
    pub end: f64,
    pub trips: u32,
    pub avg_wait_time: f64,
    pub max_wait_time: f64,
    pub avg_trip_time: f64,
    pub max_trip_time: f64,
    pub avg_ride_time: f64,
    pub max_ride_time: f64,
    /// Most riders seen aboard one car at once.
    pub peak_riders: usize,
    /// Distance travelled by each car during the phase, in feet.
    pub car_distances: Vec<f64>,
}

impl PhaseReport {
    /// Sum up the trips of everyone in the building. Everyone is expected to
    /// be back on a floor when a phase ends.
    pub fn collect(name: &str, start: f64, end: f64, building: &Building, car_distances: Vec<f64>) -> Self {
        let mut total = TripStats::default();
        for floor in building.floors() {
            floor.for_each_occupant(|occupant| {
                let stats = occupant.stats();
                total.trips += stats.trips;
                total.total_wait_time += stats.total_wait_time;
                total.total_ride_time += stats.total_ride_time;
                total.total_trip_time += stats.total_trip_time;
                total.max_wait_time = total.max_wait_time.max(stats.max_wait_time);
                total.max_ride_time = total.max_ride_time.max(stats.max_ride_time);
                total.max_trip_time = total.max_trip_time.max(stats.max_trip_time);
            });
        }

        let average = |sum: f64| if total.trips == 0 { 0.0 } else { sum / total.trips as f64 };
        PhaseReport {
            name: name.to_string(),
            start: start,
            end: end,
            trips: total.trips,
            avg_wait_time: average(total.total_wait_time),
            max_wait_time: total.max_wait_time,
            avg_trip_time: average(total.total_trip_time),
            max_trip_time: total.max_trip_time,
            avg_ride_time: average(total.total_ride_time),
            max_ride_time: total.max_ride_time,
            peak_riders: 0,
            car_distances: car_distances,
        }
    }

    pub fn run_time(&self) -> f64 {
        self.end - self.start
    }

    pub fn total_distance(&self) -> f64 {
        self.car_distances.iter().sum()
    }
}

/// Clear everyone's trip statistics before the next phase.
pub fn reset(building: &Building) {
    for floor in building.floors() {
        floor.for_each_occupant_mut(|occupant| occupant.init_stats());
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+---------------------------------------+")?;
        writeln!(f, "| {0:<37} |", self.name.to_uppercase())?;
        writeln!(f, "+-------------------------+-------------+")?;
        writeln!(f, "| {0:<23} | {1:>11.1} |", "RUN TIME (s)", self.run_time())?;
        writeln!(f, "| {0:<23} | {1:>11} |", "TRIPS", self.trips)?;
        writeln!(f, "| {0:<23} | {1:>11.1} |", "AVG WAIT (s)", self.avg_wait_time)?;
        writeln!(f, "| {0:<23} | {1:>11.1} |", "MAX WAIT (s)", self.max_wait_time)?;
        writeln!(f, "| {0:<23} | {1:>11.1} |", "AVG TRIP (s)", self.avg_trip_time)?;
        writeln!(f, "| {0:<23} | {1:>11.1} |", "MAX TRIP (s)", self.max_trip_time)?;
        writeln!(f, "| {0:<23} | {1:>11.1} |", "AVG RIDE (s)", self.avg_ride_time)?;
        writeln!(f, "| {0:<23} | {1:>11.1} |", "MAX RIDE (s)", self.max_ride_time)?;
        writeln!(f, "| {0:<23} | {1:>11} |", "PEAK LOAD", self.peak_riders)?;
        writeln!(f, "| {0:<23} | {1:>11.1} |", "DISTANCE (ft)", self.total_distance())?;
        for (id, distance) in self.car_distances.iter().enumerate() {
            writeln!(f, "| {0:<23} | {1:>11.1} |", format!("  CAR {}", id), distance)?;
        }
        write!(f, "+-------------------------+-------------+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_resources::occupant::Occupant;

    fn traveller(id: usize, wait: f64, ride: f64) -> Occupant {
        let mut occupant = Occupant::new(id, 180.0);
        occupant.on_waitlist(0.0);
        occupant.on_elevator(wait);
        occupant.on_floor(wait + ride);
        occupant
    }

    #[test]
    fn averages_and_maxima() {
        let building = Building::new(3);
        building.floor(2).unwrap().accept_occupant(traveller(0, 10.0, 20.0));
        building.floor(3).unwrap().accept_occupant(traveller(1, 30.0, 10.0));

        let report = PhaseReport::collect("morning", 0.0, 100.0, &building, vec![24.0, 12.0]);
        assert_eq!(report.trips, 2);
        assert_eq!(report.avg_wait_time, 20.0);
        assert_eq!(report.max_wait_time, 30.0);
        assert_eq!(report.avg_ride_time, 15.0);
        assert_eq!(report.max_trip_time, 40.0);
        assert_eq!(report.total_distance(), 36.0);
        assert_eq!(report.run_time(), 100.0);
        assert!(report.to_string().contains("MORNING"));

        reset(&building);
        let report = PhaseReport::collect("evening", 100.0, 100.0, &building, vec![0.0]);
        assert_eq!(report.trips, 0);
        assert_eq!(report.avg_wait_time, 0.0);
    }
}
