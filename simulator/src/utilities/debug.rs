use std::io::{stdout, Stdout, Write};
use std::sync::Arc;

use crossterm::{cursor, terminal, Result, ExecutableCommand};

use shared_resources::floor::FloorView;

use super::car_status::CarStatus;

/// Live table of the cars and the hall calls, redrawn in place.
pub struct StatusView {
    stdout: Stdout,
    lines_drawn: u16,
}

impl StatusView {
    pub fn new() -> Self {
        StatusView {
            stdout: stdout(),
            lines_drawn: 0,
        }
    }

    pub fn print_status(&mut self, now: f64, cars: &[Arc<CarStatus>], floors: &[FloorView]) -> Result<()> {
        if self.lines_drawn > 0 {
            self.stdout.execute(cursor::MoveUp(self.lines_drawn))?;
        }
        self.stdout.execute(terminal::Clear(terminal::ClearType::FromCursorDown))?;

        writeln!(self.stdout, "T + {:.1}", now)?;
        writeln!(self.stdout, "+-----------------------------------------------------------------------------+")?;
        writeln!(self.stdout, "| CARS                                                                        |")?;
        writeln!(self.stdout, "+-------+-------+-----------+-----------+-----------+-----------+-------------+")?;
        writeln!(self.stdout, "| {0:<5} | {1:<5} | {2:<9} | {3:<9} | {4:<9} | {5:<9} | {6:<11} |",
            "ID", "FLOOR", "DIRECTION", "MOTION", "DOOR", "RIDERS", "DISTANCE")?;
        writeln!(self.stdout, "+-------+-------+-----------+-----------+-----------+-----------+-------------+")?;
        for car in cars {
            writeln!(self.stdout, "| {0:<5} | {1:<5} | {2:<9} | {3:<9} | {4:<9} | {5:<9} | {6:>9.0}ft |",
                car.id,
                car.floor,
                car.direction.as_string(),
                car.motion.as_string(),
                car.door.as_string(),
                car.riders.len(),
                car.distance)?;
        }
        writeln!(self.stdout, "+-------+-------+-----------+-----------+-----------+-----------+-------------+\n")?;

        writeln!(self.stdout, "+---------------------------------------------------+")?;
        writeln!(self.stdout, "| HALL CALLS                                        |")?;
        writeln!(self.stdout, "+------------+------------+------------+------------+")?;
        writeln!(self.stdout, "| {0:<10} | {1:<10} | {2:<10} | {3:<10} |", "FLOOR", "HALL UP", "HALL DOWN", "WAITING")?;
        for floor in floors.iter().rev() {
            writeln!(self.stdout, "| {0:<10} | {1:<10} | {2:<10} | {3:<10} |",
                floor.id, floor.call_up, floor.call_down, floor.waiters)?;
        }
        writeln!(self.stdout, "+------------+------------+------------+------------+")?;
        self.stdout.flush()?;

        self.lines_drawn = 13 + (cars.len() + floors.len()) as u16;
        Ok(())
    }
}
