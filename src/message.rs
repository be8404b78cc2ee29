//! Request message kinds and their wire signatures.

use std::fmt;

/// Message signature bytes.
pub mod sig {
    pub const INIT: u8 = 0x01;
    pub const ACK_FAILURE: u8 = 0x0E;
    pub const RESET: u8 = 0x0F;
    pub const RUN: u8 = 0x10;
    pub const DISCARD_ALL: u8 = 0x2F;
    pub const PULL_ALL: u8 = 0x3F;
}

/// Kind of a client request message.
///
/// The set is closed: a signature outside it never resolves to a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RequestKind {
    Init = sig::INIT,
    AckFailure = sig::ACK_FAILURE,
    Reset = sig::RESET,
    Run = sig::RUN,
    DiscardAll = sig::DISCARD_ALL,
    PullAll = sig::PULL_ALL,
}

impl RequestKind {
    /// All request kinds, in signature order.
    pub const ALL: [RequestKind; 6] = [
        RequestKind::Init,
        RequestKind::AckFailure,
        RequestKind::Reset,
        RequestKind::Run,
        RequestKind::DiscardAll,
        RequestKind::PullAll,
    ];

    /// Resolve a structure signature to a request kind.
    ///
    /// Returns `None` for every byte that is not one of the six request
    /// signatures.
    pub fn from_signature(signature: u8) -> Option<Self> {
        match signature {
            sig::INIT => Some(Self::Init),
            sig::ACK_FAILURE => Some(Self::AckFailure),
            sig::RESET => Some(Self::Reset),
            sig::RUN => Some(Self::Run),
            sig::DISCARD_ALL => Some(Self::DiscardAll),
            sig::PULL_ALL => Some(Self::PullAll),
            _ => None,
        }
    }

    pub const fn signature(self) -> u8 {
        self as u8
    }

    /// Wire name, as used in logs and diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::AckFailure => "ACK_FAILURE",
            Self::Reset => "RESET",
            Self::Run => "RUN",
            Self::DiscardAll => "DISCARD_ALL",
            Self::PullAll => "PULL_ALL",
        }
    }

    /// Names of the message fields, in wire order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Init => &["client_name", "auth_token"],
            Self::Run => &["statement", "parameters"],
            Self::AckFailure | Self::Reset | Self::DiscardAll | Self::PullAll => &[],
        }
    }

    /// Number of fields the structure must declare.
    pub fn field_count(self) -> usize {
        self.field_names().len()
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.signature())
    }
}
