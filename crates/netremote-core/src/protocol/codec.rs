//! Text-to-command decoding and response serialization.

use serde_json::Value;

use super::{Command, ErrorFrame, MotdFrame, OkFrame, Response, FRAME_TERMINATOR};
use crate::{PRODUCT_NAME, PRODUCT_VERSION};

/// A successfully tokenized frame.
#[derive(Debug, PartialEq)]
pub enum Decoded {
    Command(Command),
    /// The frame was the JSON literal `null`; it carries no command and
    /// gets no reply.
    Empty,
}

#[derive(Debug, PartialEq)]
pub enum DecodeError {
    /// The frame does not tokenize as JSON at all. The TCP transport drops
    /// the peer; the serial transport discards the frame silently.
    Garbage,
    /// Valid JSON of the wrong shape. Carries the sanitized frame text,
    /// which becomes the `Syntax error` message.
    Shape(String),
}

/// Drop everything outside printable ASCII and lower-case the rest.
/// Method names and enum values are matched against lower-cased keys, so
/// the whole frame can be normalized in one pass.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| ('\u{20}'..='\u{7f}').contains(c))
        .collect::<String>()
        .to_lowercase()
}

pub fn decode(raw: &str) -> Result<Decoded, DecodeError> {
    let text = sanitize(raw);

    let value: Value = serde_json::from_str(&text).map_err(|_| DecodeError::Garbage)?;
    if value.is_null() {
        return Ok(Decoded::Empty);
    }

    let command: Command =
        serde_json::from_value(value).map_err(|_| DecodeError::Shape(text))?;
    Ok(Decoded::Command(command))
}

/// Serialize a response to compact JSON plus the frame terminator.
pub fn encode(response: &Response) -> String {
    let body = match response {
        Response::Ok => serde_json::to_string(&OkFrame {
            result: "OK",
            method: None,
            value: None,
        }),
        Response::OkValue { method, value } => serde_json::to_string(&OkFrame {
            result: "OK",
            method: Some(method),
            value: Some(value.clone()),
        }),
        Response::Error { kind, message } => serde_json::to_string(&ErrorFrame {
            result: "Error",
            kind: kind.label(),
            message,
        }),
    };
    // The frame structs serialize infallibly: fixed fields, JSON-native values.
    let mut text = body.unwrap_or_default();
    text.push_str(FRAME_TERMINATOR);
    text
}

/// The unsolicited identification frame sent on every new connection.
pub fn motd() -> String {
    let frame = MotdFrame {
        name: PRODUCT_NAME,
        version: PRODUCT_VERSION,
    };
    let mut text = serde_json::to_string(&frame).unwrap_or_default();
    text.push_str(FRAME_TERMINATOR);
    text
}
