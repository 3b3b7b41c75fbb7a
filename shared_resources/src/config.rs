use std::env;
use std::fs;
use std::io;

use crate::command::{Command, CommandKind};
use crate::direction::Direction;
use crate::error::{Result, SimError};
use crate::occupant::MAX_WEIGHT;

const CONFIG_FILES: [&str; 3] = ["config.json", "_config.json", "../_config.json"];

/// Timing and capacity of every car. Times are in seconds, distances in feet,
/// weights in pounds.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CarSettings {
    pub floor_height: f64,
    pub car_speed: f64,
    pub passenger_limit: usize,
    pub weight_limit: f64,
    pub car_start: f64,
    pub car_stop: f64,
    pub door_open: f64,
    pub door_close: f64,
    pub door_wait_time: f64,
    pub load_time: f64,
    pub discharge_time: f64,
}

impl Default for CarSettings {
    fn default() -> Self {
        CarSettings {
            floor_height: 12.0,
            car_speed: 4.0,
            passenger_limit: 10,
            weight_limit: 2000.0,
            car_start: 1.0,
            car_stop: 1.0,
            door_open: 2.0,
            door_close: 2.0,
            door_wait_time: 3.0,
            load_time: 2.0,
            discharge_time: 2.0,
        }
    }
}

impl CarSettings {
    /// Time to cross one floor at constant speed.
    pub fn floor_travel_time(&self) -> f64 {
        self.floor_height / self.car_speed
    }

    /// A car must be able to move and to carry at least one occupant, and
    /// none of its steps may take negative time.
    pub fn validate(&self) -> Result<()> {
        if !(self.car_speed > 0.0) || !(self.floor_height > 0.0) {
            return Err(SimError::InvalidConfig(String::from("car speed and floor height must be positive")));
        }
        if self.passenger_limit == 0 {
            return Err(SimError::InvalidConfig(String::from("passenger limit must be at least 1")));
        }
        if !(self.weight_limit >= MAX_WEIGHT as f64) {
            return Err(SimError::InvalidConfig(format!(
                "weight limit must be at least {} lb, got {}", MAX_WEIGHT, self.weight_limit
            )));
        }
        let timings = [
            ("car_start", self.car_start),
            ("car_stop", self.car_stop),
            ("door_open", self.door_open),
            ("door_close", self.door_close),
            ("door_wait_time", self.door_wait_time),
            ("load_time", self.load_time),
            ("discharge_time", self.discharge_time),
        ];
        for (name, duration) in timings {
            if !(duration >= 0.0) {
                return Err(SimError::InvalidConfig(format!("{} must not be negative, got {}", name, duration)));
            }
        }
        Ok(())
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    pub at: f64,
    pub elevator: usize,
    pub cmd: String,
    pub floor: u8,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ConfigFile {
    pub name: String,
    pub logic: String,
    pub floors: u8,
    pub elevators: usize,
    pub occupants: usize,
    pub seed: u64,
    pub log_level: String,
    pub tie_bias: Direction,
    pub rush_window: u32,
    pub debug_view: bool,
    pub car: CarSettings,
    pub script: Vec<ScriptEntry>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile {
            name: String::from("default"),
            logic: String::from("FCFS"),
            floors: 10,
            elevators: 1,
            occupants: 40,
            seed: 101,
            log_level: String::from("info"),
            tie_bias: Direction::Up,
            rush_window: 600,
            debug_view: false,
            car: CarSettings::default(),
            script: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    pub logic: String,
    pub num_floors: u8,
    pub num_elevators: usize,
    pub num_occupants: usize,
    pub seed: u64,
    pub rush_window: u32,
    pub tie_bias: Direction,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub debug_view: bool,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub scenario: ScenarioConfig,
    pub car: CarSettings,
    pub log: LogConfig,
    pub script: Vec<Command>,
    /// Problems found while reading the configuration that were skipped.
    pub warnings: Vec<String>,
}

impl SimConfig {
    /// Read the configuration file and apply command line overrides.
    pub fn get() -> Result<Self> {
        let mut warnings = Vec::new();
        let config_file = match read_config_file()? {
            Some(config_file) => config_file,
            None => {
                warnings.push(String::from("No configuration file provided, using default settings..."));
                ConfigFile::default()
            },
        };
        let args: Vec<String> = env::args().skip(1).collect();
        let mut config = Self::from_file(parse_env_args(config_file, &args, &mut warnings))?;
        config.warnings.extend(warnings);
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_file(serde_json::from_str(json)?)
    }

    pub fn from_file(config_file: ConfigFile) -> Result<Self> {
        if config_file.floors < 2 || config_file.floors > 100 {
            return Err(SimError::InvalidConfig(format!(
                "floors must be between 2 and 100, got {}", config_file.floors
            )));
        }
        if config_file.elevators == 0 {
            return Err(SimError::InvalidConfig(String::from("at least one elevator is required")));
        }
        config_file.car.validate()?;

        let mut script = Vec::new();
        for entry in &config_file.script {
            let kind: CommandKind = entry.cmd.parse()?;
            if entry.elevator >= config_file.elevators {
                return Err(SimError::InvalidConfig(format!(
                    "scripted command for unknown elevator {}", entry.elevator
                )));
            }
            if kind != CommandKind::End && (entry.floor < 1 || entry.floor > config_file.floors) {
                return Err(SimError::InvalidConfig(format!(
                    "scripted command for unknown floor {}", entry.floor
                )));
            }
            script.push(Command {
                issued_at: entry.at,
                elevator: entry.elevator,
                kind: kind,
                floor: entry.floor,
                rule: Some(String::from("script")),
            });
        }
        script.sort_by(|a, b| a.issued_at.total_cmp(&b.issued_at));

        Ok(SimConfig {
            scenario: ScenarioConfig {
                name: config_file.name,
                logic: config_file.logic,
                num_floors: config_file.floors,
                num_elevators: config_file.elevators,
                num_occupants: config_file.occupants,
                seed: config_file.seed,
                rush_window: config_file.rush_window,
                tie_bias: config_file.tie_bias,
            },
            car: config_file.car,
            log: LogConfig {
                level: config_file.log_level,
                debug_view: config_file.debug_view,
            },
            script: script,
            warnings: Vec::new(),
        })
    }
}

fn read_config_file() -> Result<Option<ConfigFile>> {
    for file_path in CONFIG_FILES {
        match fs::read_to_string(file_path) {
            Ok(contents) => return Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(None)
}

fn parse_env_args(mut config_file: ConfigFile, args: &[String], warnings: &mut Vec<String>) -> ConfigFile {
    for arg_pair in args.chunks(2) {
        let value = match arg_pair.get(1) {
            Some(value) => value,
            None => {
                warnings.push(format!("argument {} has no value, skipping...", arg_pair[0]));
                continue;
            },
        };
        match arg_pair[0].as_str() {
            "--logic" => config_file.logic = value.clone(),
            "--log" => config_file.log_level = value.clone(),
            "--floors" => match value.parse::<u8>() {
                Ok(num) => config_file.floors = num,
                Err(_) => warnings.push(format!("floors {} is not a number, skipping...", value)),
            },
            "--elevators" => match value.parse::<usize>() {
                Ok(num) => config_file.elevators = num,
                Err(_) => warnings.push(format!("elevators {} is not a number, skipping...", value)),
            },
            "--occupants" => match value.parse::<usize>() {
                Ok(num) => config_file.occupants = num,
                Err(_) => warnings.push(format!("occupants {} is not a number, skipping...", value)),
            },
            "--seed" => match value.parse::<u64>() {
                Ok(num) => config_file.seed = num,
                Err(_) => warnings.push(format!("seed {} is not a number, skipping...", value)),
            },
            _ => warnings.push(format!("illegal argument {}, skipping...", arg_pair[0])),
        }
    }
    config_file
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = SimConfig::from_json(r#"{ "logic": "SSTF", "floors": 6, "elevators": 2 }"#).unwrap();
        assert_eq!(config.scenario.logic, "SSTF");
        assert_eq!(config.scenario.num_floors, 6);
        assert_eq!(config.scenario.num_elevators, 2);
        assert_eq!(config.scenario.seed, 101);
        assert_eq!(config.scenario.tie_bias, Direction::Up);
        assert_eq!(config.car, CarSettings::default());
        assert_eq!(config.car.floor_travel_time(), 3.0);
    }

    #[test]
    fn command_line_overrides_file() {
        let mut warnings = Vec::new();
        let config_file = parse_env_args(
            ConfigFile::default(),
            &args(&["--logic", "SSTF", "--floors", "many", "--bogus", "1", "--elevators", "3"]),
            &mut warnings,
        );
        assert_eq!(config_file.logic, "SSTF");
        assert_eq!(config_file.floors, 10);
        assert_eq!(config_file.elevators, 3);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn invalid_building_is_rejected() {
        assert!(matches!(
            SimConfig::from_json(r#"{ "floors": 1 }"#),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::from_json(r#"{ "elevators": 0 }"#),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unusable_cars_are_rejected() {
        for car in [
            r#"{ "passenger_limit": 0 }"#,
            r#"{ "weight_limit": -1.0 }"#,
            r#"{ "weight_limit": 150.0 }"#,
            r#"{ "car_speed": 0.0 }"#,
            r#"{ "door_open": -2.0 }"#,
            r#"{ "discharge_time": -0.5 }"#,
        ] {
            let result = SimConfig::from_json(&format!(r#"{{ "car": {} }}"#, car));
            assert!(matches!(result, Err(SimError::InvalidConfig(_))), "{}", car);
        }

        let config = SimConfig::from_json(r#"{ "car": { "passenger_limit": 1, "weight_limit": 200.0, "door_wait_time": 0.0 } }"#).unwrap();
        assert_eq!(config.car.passenger_limit, 1);
    }

    #[test]
    fn script_is_parsed_and_sorted() {
        let config = SimConfig::from_json(r#"{
            "floors": 6,
            "elevators": 2,
            "script": [
                { "at": 5.0, "elevator": 1, "cmd": "GOTO", "floor": 6 },
                { "at": 2.0, "elevator": 0, "cmd": "call", "floor": 3 }
            ]
        }"#).unwrap();
        assert_eq!(config.script.len(), 2);
        assert_eq!(config.script[0].kind, CommandKind::Call);
        assert_eq!(config.script[1].elevator, 1);
    }

    #[test]
    fn unknown_scripted_command_is_fatal() {
        let result = SimConfig::from_json(r#"{
            "script": [ { "at": 1.0, "elevator": 0, "cmd": "FLY", "floor": 3 } ]
        }"#);
        assert!(matches!(result, Err(SimError::UnknownCommand(_))));
    }
}
