//! Control commands understood by the GGS controller.
//!
//! Commands travel as compact UTF-8 JSON objects of the form
//! `{"method": <string>, "data": {<param>: <int>, ...}}`. The `data` object
//! is omitted entirely for status requests.
//!
//! Parameter values are not range-checked: levels the device would reject
//! (outside 0-100 for lights/blower, 0-10 for the fan) are passed through as
//! given.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The `method` field of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    /// Switch or dim the light.
    SetLight,
    /// Set the circulation fan.
    SetFan,
    /// Set the exhaust blower.
    SetBlower,
    /// Ask the controller to push its current status on the notify characteristic.
    GetDevSta,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::SetLight => "setLight",
            Method::SetFan => "setFan",
            Method::SetBlower => "setBlower",
            Method::GetDevSta => "getDevSta",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a command.
///
/// Fields serialize in declaration order (`modeType`, `on`, `level`) and
/// unset fields are skipped, which reproduces the payloads the controller's
/// own app sends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandData {
    /// Operating mode; `0` is manual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_type: Option<i64>,
    /// `1` = on, `0` = off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<u8>,
    /// Output level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
}

/// A single control command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CommandData>,
}

impl Command {
    /// `{"method":"getDevSta"}`
    pub fn get_status() -> Self {
        Self {
            method: Method::GetDevSta,
            data: None,
        }
    }

    /// `setLight` with an explicit on/off flag and optional level.
    ///
    /// This is the shape used by the one-shot control command:
    /// `{"method":"setLight","data":{"on":1,"level":42}}`.
    pub fn set_light(on: bool, level: Option<i64>) -> Self {
        Self {
            method: Method::SetLight,
            data: Some(CommandData {
                mode_type: None,
                on: Some(u8::from(on)),
                level,
            }),
        }
    }

    /// Manual-mode light level, as sent from the console:
    /// `{"method":"setLight","data":{"modeType":0,"on":1,"level":<level>}}`.
    pub fn light_level(level: i64) -> Self {
        Self {
            method: Method::SetLight,
            data: Some(CommandData {
                mode_type: Some(0),
                on: Some(1),
                level: Some(level),
            }),
        }
    }

    /// `{"method":"setLight","data":{"on":0}}`
    pub fn light_off() -> Self {
        Self::set_light(false, None)
    }

    /// `{"method":"setFan","data":{"on":1,"level":<level>}}`
    pub fn set_fan(level: i64) -> Self {
        Self {
            method: Method::SetFan,
            data: Some(CommandData {
                mode_type: None,
                on: Some(1),
                level: Some(level),
            }),
        }
    }

    /// `{"method":"setBlower","data":{"modeType":0,"on":1,"level":<level>}}`
    pub fn set_blower(level: i64) -> Self {
        Self {
            method: Method::SetBlower,
            data: Some(CommandData {
                mode_type: Some(0),
                on: Some(1),
                level: Some(level),
            }),
        }
    }

    /// Serialize to compact JSON (no whitespace, non-ASCII kept as-is).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize to the bytes written to the command characteristic.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Acknowledgment mode for a characteristic write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Write request; the device confirms receipt.
    #[default]
    WithResponse,
    /// Write command; fire-and-forget.
    WithoutResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_payload_is_compact_and_ordered() {
        let json = Command::set_fan(5).to_json().unwrap();
        assert_eq!(json, r#"{"method":"setFan","data":{"on":1,"level":5}}"#);
    }

    #[test]
    fn test_status_payload_has_no_data() {
        let json = Command::get_status().to_json().unwrap();
        assert_eq!(json, r#"{"method":"getDevSta"}"#);
    }

    #[test]
    fn test_light_payloads() {
        assert_eq!(
            Command::set_light(true, Some(42)).to_json().unwrap(),
            r#"{"method":"setLight","data":{"on":1,"level":42}}"#
        );
        assert_eq!(
            Command::set_light(false, None).to_json().unwrap(),
            r#"{"method":"setLight","data":{"on":0}}"#
        );
        assert_eq!(Command::light_off(), Command::set_light(false, None));
        assert_eq!(
            Command::light_level(75).to_json().unwrap(),
            r#"{"method":"setLight","data":{"modeType":0,"on":1,"level":75}}"#
        );
    }

    #[test]
    fn test_blower_payload() {
        assert_eq!(
            Command::set_blower(30).to_json().unwrap(),
            r#"{"method":"setBlower","data":{"modeType":0,"on":1,"level":30}}"#
        );
    }

    #[test]
    fn test_out_of_range_levels_pass_through() {
        assert_eq!(
            Command::set_fan(250).to_json().unwrap(),
            r#"{"method":"setFan","data":{"on":1,"level":250}}"#
        );
        assert_eq!(
            Command::set_light(true, Some(-3)).to_json().unwrap(),
            r#"{"method":"setLight","data":{"on":1,"level":-3}}"#
        );
    }

    #[test]
    fn test_to_bytes_matches_json() {
        let cmd = Command::set_blower(10);
        assert_eq!(cmd.to_bytes().unwrap(), cmd.to_json().unwrap().into_bytes());
    }

    #[test]
    fn test_deserialize_command() {
        let cmd: Command =
            serde_json::from_str(r#"{"method":"setFan","data":{"on":1,"level":5}}"#).unwrap();
        assert_eq!(cmd, Command::set_fan(5));

        let cmd: Command = serde_json::from_str(r#"{"method":"getDevSta"}"#).unwrap();
        assert_eq!(cmd, Command::get_status());
    }

    #[test]
    fn test_unknown_method_rejected() {
        let result = serde_json::from_str::<Command>(r#"{"method":"reboot"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::GetDevSta.to_string(), "getDevSta");
        assert_eq!(Method::SetBlower.as_str(), "setBlower");
    }

    #[test]
    fn test_default_write_mode() {
        assert_eq!(WriteMode::default(), WriteMode::WithResponse);
    }
}
