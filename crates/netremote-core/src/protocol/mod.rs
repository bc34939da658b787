//! Wire-level types shared by both transports.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod codec;
pub mod framing;

pub use codec::{decode, encode, motd, DecodeError, Decoded};
pub use framing::{Feed, FrameAssembler};

/// Every response frame ends with this terminator.
pub const FRAME_TERMINATOR: &str = "\r\n";

/// One decoded command envelope. All fields are optional at this level;
/// the dispatcher owns presence and shape checks so it can answer each
/// omission with the right error category.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Command {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Error categories surfaced as `Type` in an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Command,
    Method,
    Value,
    Set,
    Source,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "Syntax error",
            ErrorKind::Command => "Command error",
            ErrorKind::Method => "Method error",
            ErrorKind::Value => "Value error",
            ErrorKind::Set => "Set error",
            ErrorKind::Source => "Source error",
        }
    }
}

/// Outcome of one accepted command, prior to serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `{"Result":"OK"}` — a successful `set` or `exe`.
    Ok,
    /// `{"Result":"OK","Method":...,"Value":...}` — a successful `get`.
    /// `method` is the property's display name, not the lookup key.
    OkValue { method: &'static str, value: Value },
    /// `{"Result":"Error","Type":...,"Message":...}`.
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

// Serialization shapes. Field order is the wire order.

#[derive(Serialize)]
pub(crate) struct OkFrame {
    #[serde(rename = "Result")]
    pub result: &'static str,
    #[serde(rename = "Method", skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Serialize)]
pub(crate) struct ErrorFrame<'a> {
    #[serde(rename = "Result")]
    pub result: &'static str,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(rename = "Message")]
    pub message: &'a str,
}

#[derive(Serialize)]
pub(crate) struct MotdFrame<'a> {
    #[serde(rename = "Name")]
    pub name: &'a str,
    #[serde(rename = "Version")]
    pub version: &'a str,
}
