use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use shared_resources::floor::{Building, GROUND_FLOOR};
use shared_resources::occupant::{Occupant, MAX_WEIGHT, MIN_WEIGHT};

/// Seeded source of occupants and their lobby arrival times.
#[derive(Debug)]
pub struct Generator {
    rng: StdRng,
    rush_window: u32,
}

impl Generator {
    pub fn new(seed: u64, rush_window: u32) -> Self {
        Generator {
            rng: StdRng::seed_from_u64(seed),
            rush_window: rush_window,
        }
    }

    /// Morning rush: everyone starts on the ground floor heading for a random
    /// upper floor, arriving in the lobby within the rush window.
    pub fn morning(&mut self, building: &Building, num_occupants: usize) {
        let top_floor = building.top_floor();
        for id in 0..num_occupants {
            let weight = self.rng.gen_range(MIN_WEIGHT..=MAX_WEIGHT) as f64;
            let mut occupant = Occupant::new(id, weight);
            let destination = self.rng.gen_range(GROUND_FLOOR + 1..=top_floor);
            let lobby_time = self.rng.gen_range(0..=self.rush_window) as f64;
            occupant.enq(destination, lobby_time);
            building.ground().accept_occupant(occupant);
        }
        info!(occupants = num_occupants, "morning rush scheduled");
    }

    /// Evening rush: everyone above the ground floor heads back down, leaving
    /// within the rush window starting at `now`. Returns how many were
    /// rescheduled.
    pub fn evening(&mut self, building: &Building, now: f64) -> usize {
        let rush_window = self.rush_window;
        let rng = &mut self.rng;
        let mut rescheduled = 0;
        for floor in building.floors().filter(|floor| floor.id() != GROUND_FLOOR) {
            floor.for_each_occupant_mut(|occupant| {
                let lobby_time = now + rng.gen_range(0..=rush_window) as f64;
                occupant.enq(GROUND_FLOOR, lobby_time);
                rescheduled += 1;
            });
        }
        info!(t = now, occupants = rescheduled, "evening rush scheduled");
        rescheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrivals(building: &Building) -> Vec<(usize, u8, f64, f64)> {
        let mut arrivals = Vec::new();
        for floor in building.floors() {
            floor.for_each_occupant(|occupant| {
                arrivals.push((occupant.id, occupant.destination(), occupant.lobby_time(), occupant.weight));
            });
        }
        arrivals
    }

    #[test]
    fn morning_fills_the_lobby_within_bounds() {
        let building = Building::new(10);
        Generator::new(101, 600).morning(&building, 40);

        let arrivals = arrivals(&building);
        assert_eq!(arrivals.len(), 40);
        assert_eq!(building.ground().headcount(), 40);
        for (_, destination, lobby_time, weight) in arrivals {
            assert!((2..=10).contains(&destination));
            assert!((0.0..=600.0).contains(&lobby_time));
            assert_eq!(lobby_time.fract(), 0.0);
            assert!((170.0..=200.0).contains(&weight));
        }
    }

    #[test]
    fn same_seed_same_people() {
        let (first, second) = (Building::new(8), Building::new(8));
        Generator::new(7, 300).morning(&first, 25);
        Generator::new(7, 300).morning(&second, 25);
        assert_eq!(arrivals(&first), arrivals(&second));
    }

    #[test]
    fn evening_sends_everyone_back_down() {
        let building = Building::new(5);
        let mut upstairs = Occupant::new(0, 180.0);
        upstairs.enq(GROUND_FLOOR, 0.0);
        building.floor(4).unwrap().accept_occupant(upstairs);
        let mut lobby = Occupant::new(1, 180.0);
        lobby.enq(3, 0.0);
        building.ground().accept_occupant(lobby);

        let mut generator = Generator::new(1, 60);
        assert_eq!(generator.evening(&building, 500.0), 1);
        building.floor(4).unwrap().for_each_occupant(|occupant| {
            assert!(occupant.is_scheduled());
            assert_eq!(occupant.destination(), GROUND_FLOOR);
            assert!((500.0..=560.0).contains(&occupant.lobby_time()));
        });
    }
}
