//! Console command grammar.
//!
//! ```text
//! light <level>     manual light level
//! fan <level>       circulation fan
//! blower <level>    exhaust blower
//! off               light off
//! status            request a status notification
//! help              show this list
//! exit | quit       leave the console
//! ```

use std::str::FromStr;

use crate::command::Command;
use crate::error::{ParseError, ParseResult};

/// Help text listing the console commands.
pub const CONSOLE_HELP: &str = "\
Commands:
  light <0-100>
  fan <0-10>
  blower <0-100>
  off
  status
  help
  exit | quit";

/// One parsed line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Write this command to the controller.
    Send(Command),
    /// Print the command list.
    Help,
    /// Leave the console.
    Exit,
}

impl FromStr for ConsoleInput {
    type Err = ParseError;

    fn from_str(line: &str) -> ParseResult<Self> {
        let mut words = line.split_whitespace();
        let keyword = words.next().ok_or(ParseError::Empty)?.to_lowercase();

        let input = match keyword.as_str() {
            "exit" | "quit" => ConsoleInput::Exit,
            "help" | "?" => ConsoleInput::Help,
            "off" => ConsoleInput::Send(Command::light_off()),
            "status" => ConsoleInput::Send(Command::get_status()),
            "light" => ConsoleInput::Send(Command::light_level(level(&keyword, words.next())?)),
            "fan" => ConsoleInput::Send(Command::set_fan(level(&keyword, words.next())?)),
            "blower" => ConsoleInput::Send(Command::set_blower(level(&keyword, words.next())?)),
            _ => return Err(ParseError::UnknownCommand(keyword)),
        };

        if let Some(extra) = words.next() {
            return Err(ParseError::UnexpectedArgument {
                command: keyword,
                argument: extra.to_string(),
            });
        }

        Ok(input)
    }
}

fn level(command: &str, value: Option<&str>) -> ParseResult<i64> {
    let value = value.ok_or_else(|| ParseError::MissingValue {
        command: command.to_string(),
    })?;
    value.parse().map_err(|_| ParseError::InvalidValue {
        command: command.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(line: &str) -> String {
        match line.parse::<ConsoleInput>().unwrap() {
            ConsoleInput::Send(cmd) => cmd.to_json().unwrap(),
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn test_off() {
        assert_eq!(payload("off"), r#"{"method":"setLight","data":{"on":0}}"#);
    }

    #[test]
    fn test_blower() {
        assert_eq!(
            payload("blower 30"),
            r#"{"method":"setBlower","data":{"modeType":0,"on":1,"level":30}}"#
        );
    }

    #[test]
    fn test_fan() {
        assert_eq!(
            payload("fan 7"),
            r#"{"method":"setFan","data":{"on":1,"level":7}}"#
        );
    }

    #[test]
    fn test_light_forwards_level() {
        assert_eq!(
            payload("light 65"),
            r#"{"method":"setLight","data":{"modeType":0,"on":1,"level":65}}"#
        );
        assert_ne!(payload("light 65"), payload("light 20"));
    }

    #[test]
    fn test_status() {
        assert_eq!(payload("status"), r#"{"method":"getDevSta"}"#);
    }

    #[test]
    fn test_whitespace_and_case() {
        assert_eq!(payload("  FAN   3 "), payload("fan 3"));
    }

    #[test]
    fn test_exit_and_quit() {
        assert_eq!("exit".parse::<ConsoleInput>(), Ok(ConsoleInput::Exit));
        assert_eq!("quit".parse::<ConsoleInput>(), Ok(ConsoleInput::Exit));
        assert_eq!("help".parse::<ConsoleInput>(), Ok(ConsoleInput::Help));
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            "fan".parse::<ConsoleInput>(),
            Err(ParseError::MissingValue {
                command: "fan".to_string()
            })
        );
    }

    #[test]
    fn test_non_numeric_value() {
        assert_eq!(
            "blower max".parse::<ConsoleInput>(),
            Err(ParseError::InvalidValue {
                command: "blower".to_string(),
                value: "max".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(
            "dim 5".parse::<ConsoleInput>(),
            Err(ParseError::UnknownCommand("dim".to_string()))
        );
        assert_eq!("   ".parse::<ConsoleInput>(), Err(ParseError::Empty));
    }

    #[test]
    fn test_extra_arguments_rejected() {
        assert!(matches!(
            "off now".parse::<ConsoleInput>(),
            Err(ParseError::UnexpectedArgument { .. })
        ));
        assert!(matches!(
            "light 10 20".parse::<ConsoleInput>(),
            Err(ParseError::UnexpectedArgument { .. })
        ));
    }

    #[test]
    fn test_help_text_lists_commands() {
        for cmd in ["light", "fan", "blower", "off", "exit"] {
            assert!(CONSOLE_HELP.contains(cmd));
        }
    }
}
