//! Decoded requests as values
//!
//! A [`Request`] is the data of exactly one handler callback. The reader
//! decodes a whole message into a `Request` before it touches the handler,
//! so an aborted read never reaches it.

use serde::Serialize;

use crate::error::BoltError;
use crate::message::RequestKind;
use crate::normalize::AuthToken;
use crate::reader::RequestHandler;
use crate::status::ExternalError;
use crate::value::ValueMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Init {
        client_name: String,
        auth_token: AuthToken,
    },
    AckFailure,
    Reset,
    Run {
        statement: String,
        parameters: ValueMap,
    },
    /// A RUN whose parameters carried an error from an earlier stage
    ExternalError {
        error: ExternalError,
    },
    DiscardAll,
    PullAll,
}

impl Request {
    /// Message kind this request was decoded from
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Init { .. } => RequestKind::Init,
            Request::AckFailure => RequestKind::AckFailure,
            Request::Reset => RequestKind::Reset,
            Request::Run { .. } | Request::ExternalError { .. } => RequestKind::Run,
            Request::DiscardAll => RequestKind::DiscardAll,
            Request::PullAll => RequestKind::PullAll,
        }
    }

    /// Invoke the handler callback matching this request.
    pub fn dispatch<H: RequestHandler + ?Sized>(self, handler: &mut H) -> Result<(), H::Error> {
        match self {
            Request::Init { client_name, auth_token } => handler.on_init(client_name, auth_token),
            Request::AckFailure => handler.on_ack_failure(),
            Request::Reset => handler.on_reset(),
            Request::Run { statement, parameters } => handler.on_run(statement, parameters),
            Request::ExternalError { error } => handler.on_external_error(error),
            Request::DiscardAll => handler.on_discard_all(),
            Request::PullAll => handler.on_pull_all(),
        }
    }
}

/// Handler that keeps every request it receives, in order.
#[derive(Debug, Default)]
pub struct RequestRecorder {
    requests: Vec<Request>,
}

impl RequestRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Take the recorded requests, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl RequestHandler for RequestRecorder {
    type Error = BoltError;

    fn on_init(&mut self, client_name: String, auth_token: AuthToken) -> Result<(), BoltError> {
        self.requests.push(Request::Init { client_name, auth_token });
        Ok(())
    }

    fn on_ack_failure(&mut self) -> Result<(), BoltError> {
        self.requests.push(Request::AckFailure);
        Ok(())
    }

    fn on_reset(&mut self) -> Result<(), BoltError> {
        self.requests.push(Request::Reset);
        Ok(())
    }

    fn on_run(&mut self, statement: String, parameters: ValueMap) -> Result<(), BoltError> {
        self.requests.push(Request::Run { statement, parameters });
        Ok(())
    }

    fn on_external_error(&mut self, error: ExternalError) -> Result<(), BoltError> {
        self.requests.push(Request::ExternalError { error });
        Ok(())
    }

    fn on_discard_all(&mut self) -> Result<(), BoltError> {
        self.requests.push(Request::DiscardAll);
        Ok(())
    }

    fn on_pull_all(&mut self) -> Result<(), BoltError> {
        self.requests.push(Request::PullAll);
        Ok(())
    }
}
