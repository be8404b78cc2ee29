//! PackStream decoding
//!
//! The request reader only depends on the [`Unpacker`] trait: reading a
//! structure header, a string, and a map slot. [`PackStreamUnpacker`] is the
//! byte-level implementation for Bolt v1/v2.
//!
//! # Marker grammar
//!
//! ```text
//! 0x00..0x7F  tiny int (0..127)        0xF0..0xFF  tiny int (-16..-1)
//! 0x80..0x8F  tiny string (len 0..15)  0xD0/D1/D2  string, u8/u16/u32 len
//! 0x90..0x9F  tiny list                0xD4/D5/D6  list,   u8/u16/u32 len
//! 0xA0..0xAF  tiny map                 0xD8/D9/DA  map,    u8/u16/u32 len
//! 0xB0..0xBF  tiny struct              0xDC/DD     struct, u8/u16 len
//! 0xC0 null   0xC1 float64   0xC2 false   0xC3 true
//! 0xC8/C9/CA/CB  int8/16/32/64         0xCC/CD/CE  bytes,  u8/u16/u32 len
//! ```
//!
//! All multi-byte quantities are big-endian. A structure header is followed
//! by a one-byte signature and then its fields.

mod unpacker;

pub use unpacker::PackStreamUnpacker;

use thiserror::Error;

use crate::value::MapSlot;

/// Marker bytes.
pub mod marker {
    pub const TINY_STRING: u8 = 0x80;
    pub const TINY_LIST: u8 = 0x90;
    pub const TINY_MAP: u8 = 0xA0;
    pub const TINY_STRUCT: u8 = 0xB0;

    pub const NULL: u8 = 0xC0;
    pub const FLOAT_64: u8 = 0xC1;
    pub const FALSE: u8 = 0xC2;
    pub const TRUE: u8 = 0xC3;

    pub const INT_8: u8 = 0xC8;
    pub const INT_16: u8 = 0xC9;
    pub const INT_32: u8 = 0xCA;
    pub const INT_64: u8 = 0xCB;

    pub const BYTES_8: u8 = 0xCC;
    pub const BYTES_16: u8 = 0xCD;
    pub const BYTES_32: u8 = 0xCE;

    pub const STRING_8: u8 = 0xD0;
    pub const STRING_16: u8 = 0xD1;
    pub const STRING_32: u8 = 0xD2;

    pub const LIST_8: u8 = 0xD4;
    pub const LIST_16: u8 = 0xD5;
    pub const LIST_32: u8 = 0xD6;

    pub const MAP_8: u8 = 0xD8;
    pub const MAP_16: u8 = 0xD9;
    pub const MAP_32: u8 = 0xDA;

    pub const STRUCT_8: u8 = 0xDC;
    pub const STRUCT_16: u8 = 0xDD;

    /// Type name of the value introduced by `marker`, or `None` for bytes
    /// that are not markers.
    pub fn type_name(marker: u8) -> Option<&'static str> {
        match marker {
            0x00..=0x7F | 0xF0..=0xFF | INT_8..=INT_64 => Some("Integer"),
            0x80..=0x8F | STRING_8..=STRING_32 => Some("String"),
            0x90..=0x9F | LIST_8..=LIST_32 => Some("List"),
            0xA0..=0xAF | MAP_8..=MAP_32 => Some("Map"),
            0xB0..=0xBF | STRUCT_8 | STRUCT_16 => Some("Structure"),
            NULL => Some("Null"),
            FLOAT_64 => Some("Float"),
            FALSE | TRUE => Some("Boolean"),
            BYTES_8..=BYTES_32 => Some("Bytes"),
            _ => None,
        }
    }
}

/// Signatures of structures that may appear as values.
pub mod struct_sig {
    pub const NODE: u8 = 0x4E;
    pub const RELATIONSHIP: u8 = 0x52;
    pub const UNBOUND_RELATIONSHIP: u8 = 0x72;
    pub const PATH: u8 = 0x50;

    pub const POINT_2D: u8 = 0x58;
    pub const POINT_3D: u8 = 0x59;

    pub const DATE: u8 = 0x44;
    pub const TIME: u8 = 0x54;
    pub const LOCAL_TIME: u8 = 0x74;
    pub const LOCAL_DATE_TIME: u8 = 0x64;
    pub const DATE_TIME_WITH_OFFSET: u8 = 0x46;
    pub const DATE_TIME_WITH_ZONE_NAME: u8 = 0x66;
    pub const DURATION: u8 = 0x45;

    pub fn name(signature: u8) -> Option<&'static str> {
        match signature {
            NODE => Some("Node"),
            RELATIONSHIP => Some("Relationship"),
            UNBOUND_RELATIONSHIP => Some("UnboundRelationship"),
            PATH => Some("Path"),
            POINT_2D | POINT_3D => Some("Point"),
            DATE => Some("Date"),
            TIME => Some("Time"),
            LOCAL_TIME => Some("LocalTime"),
            LOCAL_DATE_TIME => Some("LocalDateTime"),
            DATE_TIME_WITH_OFFSET | DATE_TIME_WITH_ZONE_NAME => Some("DateTime"),
            DURATION => Some("Duration"),
            _ => None,
        }
    }
}

/// Decoder errors.
#[derive(Error, Debug)]
pub enum PackStreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown marker byte 0x{0:02X}")]
    UnknownMarker(u8),

    #[error("Expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Map keys must be strings, found {0}")]
    NonStringKey(&'static str),

    #[error("Duplicate map key `{0}`")]
    DuplicateKey(String),

    #[error("Invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Value of {size} bytes exceeds limit of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("Value nesting exceeds limit of {0}")]
    NestingTooDeep(usize),

    #[error("Structure 0x{signature:02X} expects {expected} fields, got {actual}")]
    InvalidStructSize {
        signature: u8,
        expected: usize,
        actual: usize,
    },
}

impl PackStreamError {
    /// A well-encoded value of the wrong type, as opposed to bytes that
    /// cannot be decoded at all.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            PackStreamError::UnexpectedType { .. }
                | PackStreamError::NonStringKey(_)
                | PackStreamError::DuplicateKey(_)
        )
    }

    /// Error for a `marker` found where a value of type `expected` must be.
    pub(crate) fn mismatch(expected: &'static str, marker: u8) -> Self {
        match marker::type_name(marker) {
            Some(found) => PackStreamError::UnexpectedType { expected, found },
            None => PackStreamError::UnknownMarker(marker),
        }
    }
}

/// Structure header: field count and signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructHeader {
    pub field_count: usize,
    pub signature: u8,
}

/// Forward-only decoder over one connection's message stream.
///
/// Reads must happen in wire order. After any error the position in the
/// stream is undefined and no further reads should be attempted.
pub trait Unpacker {
    /// Read a structure marker and its signature byte.
    fn unpack_struct_header(&mut self) -> Result<StructHeader, PackStreamError>;

    /// Read a string; fails if the next value is of another type.
    fn unpack_string(&mut self) -> Result<String, PackStreamError>;

    /// Read a string-keyed map.
    ///
    /// Returns [`MapSlot::Error`] when the map was well formed but contained
    /// a value the decoder rejects; the whole map has been consumed either way.
    fn unpack_map(&mut self) -> Result<MapSlot, PackStreamError>;
}

impl<U: Unpacker + ?Sized> Unpacker for &mut U {
    fn unpack_struct_header(&mut self) -> Result<StructHeader, PackStreamError> {
        (**self).unpack_struct_header()
    }

    fn unpack_string(&mut self) -> Result<String, PackStreamError> {
        (**self).unpack_string()
    }

    fn unpack_map(&mut self) -> Result<MapSlot, PackStreamError> {
        (**self).unpack_map()
    }
}
