//! boltwire - Bolt request message reader
//!
//! Decodes the client side of the Bolt wire protocol: a stream of PackStream
//! structures is turned into typed request callbacks on a [`RequestHandler`].
//!
//! Protocol:
//!   Message:   [chunk len u16 BE] [chunk bytes] ... [0x00 0x00]
//!   Payload:   PackStream structure [marker + field count] [signature] [fields...]
//!
//! Request messages (client → server):
//!   - INIT        0x01  client name, auth token
//!   - ACK_FAILURE 0x0E
//!   - RESET       0x0F
//!   - RUN         0x10  statement, parameters
//!   - DISCARD_ALL 0x2F
//!   - PULL_ALL    0x3F
//!
//! # Usage
//!
//! ```
//! use boltwire::{PackStreamUnpacker, RequestMessageReader, RequestRecorder, Request};
//!
//! // RUN "RETURN 1" {}
//! let bytes: &[u8] = &[0xB2, 0x10, 0x88, b'R', b'E', b'T', b'U', b'R', b'N', b' ', b'1', 0xA0];
//!
//! let mut reader = RequestMessageReader::new(PackStreamUnpacker::new(bytes));
//! let mut recorder = RequestRecorder::new();
//! reader.read(&mut recorder).unwrap();
//!
//! assert!(matches!(&recorder.requests()[0], Request::Run { statement, .. } if statement == "RETURN 1"));
//! ```

pub mod config;
pub mod error;
pub mod framing;
pub mod message;
pub mod normalize;
pub mod packstream;
pub mod reader;
pub mod request;
pub mod status;
pub mod value;

pub use config::{ProtocolVersion, UnpackerConfig};
pub use error::{BoltError, ErrorKind, Result};
pub use message::RequestKind;
pub use normalize::{normalize, normalize_map, AuthToken, PlainValue};
pub use packstream::{PackStreamError, PackStreamUnpacker, StructHeader, Unpacker};
pub use reader::{RequestHandler, RequestMessageReader};
pub use request::{Request, RequestRecorder};
pub use status::{ExternalError, Status};
pub use value::{MapSlot, Point, Temporal, Value, ValueMap};
