//! RequestMessageReader - decodes one request message per call and hands it
//! to a [`RequestHandler`]
//!
//! # Read cycle
//!
//! ```text
//! struct header ──> resolve signature ──> check field count ──> read fields ──> dispatch
//!      │                   │                      │                  │
//!  InvalidHeader   UnsupportedMessage        FieldCount     FieldType / InvalidField
//!  (malformed)     (protocol violation)  (protocol violation)   / InvalidValue
//! ```
//!
//! The reader keeps no state between calls. A RUN whose parameters carry an
//! embedded error is not a failure: it is dispatched to
//! [`RequestHandler::on_external_error`] and `read` returns `Ok`.
//!
//! Any `Err` from `read` leaves the stream position undefined; the caller
//! should stop reading from the connection.

use tracing::{debug, trace, warn};

use crate::error::BoltError;
use crate::message::RequestKind;
use crate::normalize::{normalize_map, AuthToken};
use crate::packstream::Unpacker;
use crate::request::Request;
use crate::status::ExternalError;
use crate::value::{MapSlot, ValueMap};

/// Receiver of decoded requests. Exactly one method is called per
/// successful [`RequestMessageReader::read`].
pub trait RequestHandler {
    /// Error returned by callbacks; decode errors are converted into it.
    type Error: From<BoltError>;

    fn on_init(&mut self, client_name: String, auth_token: AuthToken) -> Result<(), Self::Error>;

    fn on_ack_failure(&mut self) -> Result<(), Self::Error>;

    fn on_reset(&mut self) -> Result<(), Self::Error>;

    fn on_run(&mut self, statement: String, parameters: ValueMap) -> Result<(), Self::Error>;

    /// Called instead of `on_run` when the parameters carried an error.
    fn on_external_error(&mut self, error: ExternalError) -> Result<(), Self::Error>;

    fn on_discard_all(&mut self) -> Result<(), Self::Error>;

    fn on_pull_all(&mut self) -> Result<(), Self::Error>;
}

/// Reader bound to one connection's decoder.
#[derive(Debug)]
pub struct RequestMessageReader<U> {
    unpacker: U,
}

impl<U: Unpacker> RequestMessageReader<U> {
    pub fn new(unpacker: U) -> Self {
        Self { unpacker }
    }

    pub fn unpacker(&self) -> &U {
        &self.unpacker
    }

    pub fn into_inner(self) -> U {
        self.unpacker
    }

    /// Read a single message and hand it off to `handler`.
    pub fn read<H: RequestHandler + ?Sized>(&mut self, handler: &mut H) -> Result<(), H::Error> {
        let request = self.read_request().map_err(|e| {
            warn!(code = e.code(), signature = ?e.signature(), "Rejected request message: {}", e);
            e
        })?;
        trace!(message = request.kind().name(), "Dispatching request");
        request.dispatch(handler)
    }

    /// Decode a single message without dispatching it.
    pub fn read_request(&mut self) -> Result<Request, BoltError> {
        let header = self
            .unpacker
            .unpack_struct_header()
            .map_err(BoltError::InvalidHeader)?;

        let kind = RequestKind::from_signature(header.signature)
            .ok_or(BoltError::UnsupportedMessage(header.signature))?;

        if header.field_count != kind.field_count() {
            return Err(BoltError::FieldCount {
                kind,
                expected: kind.field_count(),
                actual: header.field_count,
            });
        }

        let request = match kind {
            RequestKind::Init => {
                let client_name = self.string_field(kind, "client_name")?;
                let auth_token = match self.map_field(kind, "auth_token")? {
                    MapSlot::Map(token) => normalize_map(&token),
                    MapSlot::Error(source) => {
                        return Err(BoltError::InvalidValue { kind, field: "auth_token", source })
                    }
                };
                Request::Init { client_name, auth_token }
            }
            RequestKind::Run => {
                let statement = self.string_field(kind, "statement")?;
                match self.map_field(kind, "parameters")? {
                    MapSlot::Map(parameters) => Request::Run { statement, parameters },
                    MapSlot::Error(error) => {
                        debug!(code = error.code(), "RUN carries an embedded error: {}", error.message);
                        Request::ExternalError { error }
                    }
                }
            }
            RequestKind::AckFailure => Request::AckFailure,
            RequestKind::Reset => Request::Reset,
            RequestKind::DiscardAll => Request::DiscardAll,
            RequestKind::PullAll => Request::PullAll,
        };
        Ok(request)
    }

    fn string_field(&mut self, kind: RequestKind, field: &'static str) -> Result<String, BoltError> {
        self.unpacker
            .unpack_string()
            .map_err(|e| BoltError::field(kind, field, e))
    }

    fn map_field(&mut self, kind: RequestKind, field: &'static str) -> Result<MapSlot, BoltError> {
        self.unpacker
            .unpack_map()
            .map_err(|e| BoltError::field(kind, field, e))
    }
}
