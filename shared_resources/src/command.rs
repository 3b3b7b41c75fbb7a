use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandKind {
    Goto,
    Call,
    End,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Goto => "GOTO",
            CommandKind::Call => "CALL",
            CommandKind::End => "END",
        }
    }
}

impl FromStr for CommandKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GOTO" => Ok(CommandKind::Goto),
            "CALL" => Ok(CommandKind::Call),
            "END" => Ok(CommandKind::End),
            _ => Err(SimError::UnknownCommand(s.to_string())),
        }
    }
}

/// A message on a car's (or the dispatcher's) inbound queue. Consumed once.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Command {
    pub issued_at: f64,
    pub elevator: usize,
    pub kind: CommandKind,
    pub floor: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Command {
    pub fn goto(issued_at: f64, elevator: usize, floor: u8, rule: &str) -> Self {
        Command {
            issued_at: issued_at,
            elevator: elevator,
            kind: CommandKind::Goto,
            floor: floor,
            rule: Some(rule.to_string()),
        }
    }

    pub fn end(issued_at: f64, elevator: usize) -> Self {
        Command {
            issued_at: issued_at,
            elevator: elevator,
            kind: CommandKind::End,
            floor: 0,
            rule: None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} elevator {}", self.kind.as_str(), self.elevator)?;
        if self.kind != CommandKind::End {
            write!(f, " floor {}", self.floor)?;
        }
        if let Some(rule) = &self.rule {
            write!(f, " ({})", rule)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_kinds_parse_case_insensitively() {
        assert_eq!("GOTO".parse::<CommandKind>().unwrap(), CommandKind::Goto);
        assert_eq!("call".parse::<CommandKind>().unwrap(), CommandKind::Call);
        assert_eq!("End".parse::<CommandKind>().unwrap(), CommandKind::End);
        assert!(matches!(
            "JUMP".parse::<CommandKind>(),
            Err(SimError::UnknownCommand(kind)) if kind == "JUMP"
        ));
    }

    #[test]
    fn display_names_the_rule() {
        let command = Command::goto(3.0, 1, 4, "riders");
        assert_eq!(command.to_string(), "GOTO elevator 1 floor 4 (riders)");
        assert_eq!(Command::end(9.0, 0).to_string(), "END elevator 0");
    }

    #[test]
    fn wire_shape() {
        let json = serde_json::to_string(&Command::goto(1.0, 0, 2, "same-floor")).unwrap();
        assert_eq!(json, r#"{"issued_at":1.0,"elevator":0,"kind":"GOTO","floor":2,"rule":"same-floor"}"#);
    }
}
