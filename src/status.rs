//! Status codes and errors carried inside well-formed messages.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Client-facing status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The request is structurally valid but not acceptable.
    RequestInvalid,
    /// The request bytes could not be decoded.
    RequestInvalidFormat,
    /// A value has a type that is not supported in this position.
    StatementTypeError,
}

impl Status {
    /// Get status code for wire protocol
    pub fn code(&self) -> &'static str {
        match self {
            Status::RequestInvalid => "Neo.ClientError.Request.Invalid",
            Status::RequestInvalidFormat => "Neo.ClientError.Request.InvalidFormat",
            Status::StatementTypeError => "Neo.ClientError.Statement.TypeError",
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error detected by the decoder while reading a message that is otherwise
/// well formed.
///
/// It is delivered to the handler (`on_external_error`) instead of the
/// message's normal callback, so the connection keeps its framing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{status}: {message}")]
pub struct ExternalError {
    pub status: Status,
    pub message: String,
}

impl ExternalError {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.status.code()
    }
}
