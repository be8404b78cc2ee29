//! Error types for request decoding

use thiserror::Error;

use crate::message::RequestKind;
use crate::packstream::PackStreamError;
use crate::status::{ExternalError, Status};

pub type Result<T> = std::result::Result<T, BoltError>;

/// Error class, deciding how the connection driver reacts.
///
/// Both classes leave the read side of the connection unusable: the position
/// of the next message in the stream is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes cannot be parsed as a structure at all
    MalformedStream,
    /// A parsed message has an unsupported signature or a wrongly typed field
    ProtocolViolation,
}

#[derive(Error, Debug)]
pub enum BoltError {
    #[error("Unable to read message type. Error was: {0}")]
    InvalidHeader(#[source] PackStreamError),

    #[error("Message 0x{0:02X} is not supported.")]
    UnsupportedMessage(u8),

    #[error("{kind} expects {expected} fields, got {actual}")]
    FieldCount {
        kind: RequestKind,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid field `{field}` in {kind}: {source}")]
    FieldType {
        kind: RequestKind,
        field: &'static str,
        #[source]
        source: PackStreamError,
    },

    #[error("Unable to read field `{field}` in {kind}: {source}")]
    InvalidField {
        kind: RequestKind,
        field: &'static str,
        #[source]
        source: PackStreamError,
    },

    /// A map field that only accepts plain values carried a rejected value
    #[error("Invalid value in field `{field}` of {kind}: {source}")]
    InvalidValue {
        kind: RequestKind,
        field: &'static str,
        #[source]
        source: ExternalError,
    },
}

impl BoltError {
    /// Wrap a decoder error raised while reading a message field, keeping
    /// the distinction between wrongly typed fields and broken bytes.
    pub fn field(kind: RequestKind, field: &'static str, source: PackStreamError) -> Self {
        if source.is_type_mismatch() {
            BoltError::FieldType { kind, field, source }
        } else {
            BoltError::InvalidField { kind, field, source }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BoltError::InvalidHeader(_) | BoltError::InvalidField { .. } => ErrorKind::MalformedStream,
            BoltError::UnsupportedMessage(_)
            | BoltError::FieldCount { .. }
            | BoltError::FieldType { .. }
            | BoltError::InvalidValue { .. } => ErrorKind::ProtocolViolation,
        }
    }

    pub fn status(&self) -> Status {
        match self.kind() {
            ErrorKind::MalformedStream => Status::RequestInvalidFormat,
            ErrorKind::ProtocolViolation => Status::RequestInvalid,
        }
    }

    /// Get error code for wire protocol
    pub fn code(&self) -> &'static str {
        self.status().code()
    }

    /// Signature of the offending message, when it was read
    pub fn signature(&self) -> Option<u8> {
        match self {
            BoltError::InvalidHeader(_) => None,
            BoltError::UnsupportedMessage(signature) => Some(*signature),
            BoltError::FieldCount { kind, .. }
            | BoltError::FieldType { kind, .. }
            | BoltError::InvalidField { kind, .. }
            | BoltError::InvalidValue { kind, .. } => Some(kind.signature()),
        }
    }
}
