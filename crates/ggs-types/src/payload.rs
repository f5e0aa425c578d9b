//! Decoding of notification payloads.
//!
//! The controller pushes status as JSON, but frames are not guaranteed to be
//! clean: some firmware prefixes a few binary bytes, and partial frames show
//! up when the link is noisy. Decoding is therefore opportunistic and never
//! fails; the worst case is a hex dump.

use std::fmt;

use serde_json::Value;

/// A notification payload, interpreted as well as possible.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// UTF-8 JSON document.
    Json(Value),
    /// Valid UTF-8 that is not JSON.
    Text(String),
    /// Lowercase hex of bytes that could not be decoded.
    Hex(String),
    /// A JSON object was expected (an opening brace was present) but did not parse.
    Malformed {
        /// Parser error message.
        error: String,
        /// Lowercase hex of the whole frame.
        hex: String,
    },
}

impl Payload {
    /// Short tag used when printing the payload.
    pub fn label(&self) -> &'static str {
        match self {
            Payload::Json(_) => "JSON",
            Payload::Text(_) => "TEXT",
            Payload::Hex(_) => "HEX",
            Payload::Malformed { .. } => "ERR",
        }
    }

    /// Human-readable rendering.
    ///
    /// JSON is pretty-printed with two-space indentation and keys in sorted
    /// order; text is returned unchanged.
    pub fn render(&self) -> String {
        match self {
            Payload::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Payload::Text(text) => text.clone(),
            Payload::Hex(hex) => hex.clone(),
            Payload::Malformed { error, hex } => format!("{} {}", error, hex),
        }
    }

    /// Whether the payload parsed as JSON.
    pub fn is_json(&self) -> bool {
        matches!(self, Payload::Json(_))
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Decode a payload with the fallback chain JSON -> text -> hex.
///
/// The whole buffer must be UTF-8 for the first two stages.
pub fn decode(data: &[u8]) -> Payload {
    match std::str::from_utf8(data) {
        Ok(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(text.to_string()),
        },
        Err(_) => Payload::Hex(hex::encode(data)),
    }
}

/// Decode a payload that may carry a non-JSON preamble.
///
/// Parsing starts at the first `{`; invalid UTF-8 after that point is
/// dropped. Frames without a `{` are rendered as hex, and frames whose JSON
/// does not parse are reported as [`Payload::Malformed`].
pub fn decode_framed(data: &[u8]) -> Payload {
    let Some(start) = data.iter().position(|&b| b == b'{') else {
        return Payload::Hex(hex::encode(data));
    };

    let text: String = data[start..].utf8_chunks().map(|chunk| chunk.valid()).collect();

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Payload::Json(value),
        Err(e) => Payload::Malformed {
            error: e.to_string(),
            hex: hex::encode(data),
        },
    }
}
