//! Byte-level PackStream decoder.

use std::io::Read;

use super::marker::*;
use super::struct_sig;
use super::{PackStreamError, StructHeader, Unpacker};
use crate::config::UnpackerConfig;
use crate::status::{ExternalError, Status};
use crate::value::{MapSlot, Point, Temporal, Value, ValueMap};

type Result<T> = std::result::Result<T, PackStreamError>;

/// Upper bound on capacity reserved from a declared collection size.
/// Larger collections grow as their elements actually arrive.
const PREALLOC_LIMIT: usize = 1024;

/// PackStream decoder over any byte source.
///
/// Temporal and spatial structures are decoded when the configured protocol
/// version supports them. Other structures inside values (graph entities,
/// unknown signatures) are consumed field by field and reported through
/// [`MapSlot::Error`] by the enclosing `unpack_map` call.
#[derive(Debug)]
pub struct PackStreamUnpacker<R> {
    input: R,
    config: UnpackerConfig,
}

impl<R: Read> PackStreamUnpacker<R> {
    pub fn new(input: R) -> Self {
        Self::with_config(input, UnpackerConfig::default())
    }

    pub fn with_config(input: R, config: UnpackerConfig) -> Self {
        Self { input, config }
    }

    pub fn config(&self) -> &UnpackerConfig {
        &self.config
    }

    /// Remaining input; for a byte slice this is the unread tail.
    pub fn get_ref(&self) -> &R {
        &self.input
    }

    pub fn into_inner(self) -> R {
        self.input
    }

    // ========================================================================
    // Raw reads
    // ========================================================================

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.input.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Read exactly `len` bytes without trusting `len` for allocation.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > self.config.max_value_size {
            return Err(PackStreamError::ValueTooLarge {
                size: len,
                max: self.config.max_value_size,
            });
        }
        let mut buf = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        (&mut self.input).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        Ok(buf)
    }

    fn read_string(&mut self, len: usize) -> Result<String> {
        Ok(String::from_utf8(self.read_bytes(len)?)?)
    }

    // ========================================================================
    // Sizes by marker (None: marker belongs to another type)
    // ========================================================================

    fn sized(&mut self, marker: u8, tiny: u8, m8: u8, m16: u8, m32: Option<u8>) -> Result<Option<usize>> {
        if marker & 0xF0 == tiny {
            return Ok(Some((marker & 0x0F) as usize));
        }
        if marker == m8 {
            return Ok(Some(self.read_u8()? as usize));
        }
        if marker == m16 {
            return Ok(Some(self.read_u16()? as usize));
        }
        if Some(marker) == m32 {
            return Ok(Some(self.read_u32()? as usize));
        }
        Ok(None)
    }

    fn string_size(&mut self, marker: u8) -> Result<Option<usize>> {
        self.sized(marker, TINY_STRING, STRING_8, STRING_16, Some(STRING_32))
    }

    fn list_size(&mut self, marker: u8) -> Result<Option<usize>> {
        self.sized(marker, TINY_LIST, LIST_8, LIST_16, Some(LIST_32))
    }

    fn map_size(&mut self, marker: u8) -> Result<Option<usize>> {
        self.sized(marker, TINY_MAP, MAP_8, MAP_16, Some(MAP_32))
    }

    fn struct_size(&mut self, marker: u8) -> Result<Option<usize>> {
        self.sized(marker, TINY_STRUCT, STRUCT_8, STRUCT_16, None)
    }

    fn bytes_size(&mut self, marker: u8) -> Result<Option<usize>> {
        Ok(match marker {
            BYTES_8 => Some(self.read_u8()? as usize),
            BYTES_16 => Some(self.read_u16()? as usize),
            BYTES_32 => Some(self.read_u32()? as usize),
            _ => None,
        })
    }

    // ========================================================================
    // Values
    // ========================================================================

    fn enter(&self, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(PackStreamError::NestingTooDeep(self.config.max_depth));
        }
        Ok(())
    }

    fn integer(&mut self, marker: u8) -> Result<i64> {
        Ok(match marker {
            0x00..=0x7F | 0xF0..=0xFF => marker as i8 as i64,
            INT_8 => i8::from_be_bytes(self.read_array()?) as i64,
            INT_16 => i16::from_be_bytes(self.read_array()?) as i64,
            INT_32 => i32::from_be_bytes(self.read_array()?) as i64,
            INT_64 => i64::from_be_bytes(self.read_array()?),
            _ => return Err(PackStreamError::mismatch("Integer", marker)),
        })
    }

    /// Decode the value introduced by `marker`.
    ///
    /// `depth` is the nesting level of the value itself. Structures that are
    /// not acceptable as values are skipped, decode as `Null`, and record the
    /// first such error in `rejected`.
    fn value(&mut self, marker: u8, depth: usize, rejected: &mut Option<ExternalError>) -> Result<Value> {
        match marker {
            NULL => return Ok(Value::Null),
            TRUE => return Ok(Value::Boolean(true)),
            FALSE => return Ok(Value::Boolean(false)),
            FLOAT_64 => return Ok(Value::Float(f64::from_be_bytes(self.read_array()?))),
            0x00..=0x7F | 0xF0..=0xFF | INT_8..=INT_64 => return Ok(Value::Integer(self.integer(marker)?)),
            _ => {}
        }

        if let Some(len) = self.string_size(marker)? {
            return Ok(Value::String(self.read_string(len)?));
        }
        if let Some(len) = self.bytes_size(marker)? {
            return Ok(Value::Bytes(self.read_bytes(len)?));
        }
        if let Some(len) = self.list_size(marker)? {
            self.enter(depth)?;
            let mut items = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            for _ in 0..len {
                let item_marker = self.read_u8()?;
                items.push(self.value(item_marker, depth + 1, rejected)?);
            }
            return Ok(Value::List(items));
        }
        if let Some(len) = self.map_size(marker)? {
            return Ok(Value::Map(self.map_entries(len, depth, rejected)?));
        }
        if let Some(len) = self.struct_size(marker)? {
            self.enter(depth)?;
            let signature = self.read_u8()?;
            return self.structure(signature, len, depth, rejected);
        }

        Err(PackStreamError::UnknownMarker(marker))
    }

    fn map_entries(
        &mut self,
        len: usize,
        depth: usize,
        rejected: &mut Option<ExternalError>,
    ) -> Result<ValueMap> {
        self.enter(depth)?;
        let mut map = ValueMap::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            let key_marker = self.read_u8()?;
            let key = match self.string_size(key_marker)? {
                Some(key_len) => self.read_string(key_len)?,
                None => {
                    return Err(match type_name(key_marker) {
                        Some(found) => PackStreamError::NonStringKey(found),
                        None => PackStreamError::UnknownMarker(key_marker),
                    })
                }
            };
            if map.contains_key(&key) {
                return Err(PackStreamError::DuplicateKey(key));
            }
            let value_marker = self.read_u8()?;
            let value = self.value(value_marker, depth + 1, rejected)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn structure(
        &mut self,
        signature: u8,
        len: usize,
        depth: usize,
        rejected: &mut Option<ExternalError>,
    ) -> Result<Value> {
        use struct_sig::*;

        let error = match signature {
            DATE | TIME | LOCAL_TIME | LOCAL_DATE_TIME | DATE_TIME_WITH_OFFSET
            | DATE_TIME_WITH_ZONE_NAME | DURATION | POINT_2D | POINT_3D
                if self.config.protocol_version.supports_temporal() =>
            {
                return self.temporal_or_point(signature, len);
            }
            NODE | RELATIONSHIP | UNBOUND_RELATIONSHIP | PATH | DATE | TIME | LOCAL_TIME
            | LOCAL_DATE_TIME | DATE_TIME_WITH_OFFSET | DATE_TIME_WITH_ZONE_NAME | DURATION
            | POINT_2D | POINT_3D => ExternalError::new(
                Status::StatementTypeError,
                format!(
                    "{} values cannot be unpacked with this version of bolt.",
                    struct_sig::name(signature).unwrap_or("Structure")
                ),
            ),
            _ => ExternalError::new(
                Status::RequestInvalid,
                format!("Unknown struct signature 0x{:02X}.", signature),
            ),
        };

        // Outer structure is reported before anything nested in its fields.
        rejected.get_or_insert(error);

        // Consume the fields so the message framing stays intact.
        for _ in 0..len {
            let field_marker = self.read_u8()?;
            self.value(field_marker, depth + 1, rejected)?;
        }
        Ok(Value::Null)
    }

    fn temporal_or_point(&mut self, signature: u8, len: usize) -> Result<Value> {
        use struct_sig::*;

        let expected = match signature {
            DATE | LOCAL_TIME => 1,
            TIME | LOCAL_DATE_TIME => 2,
            DATE_TIME_WITH_OFFSET | DATE_TIME_WITH_ZONE_NAME | POINT_2D => 3,
            _ => 4,
        };
        if len != expected {
            return Err(PackStreamError::InvalidStructSize {
                signature,
                expected,
                actual: len,
            });
        }

        let value = match signature {
            DATE => Temporal::Date { epoch_day: self.int_field()? }.into(),
            TIME => Temporal::Time {
                nano_of_day: self.int_field()?,
                offset_seconds: self.int_field()?,
            }
            .into(),
            LOCAL_TIME => Temporal::LocalTime { nano_of_day: self.int_field()? }.into(),
            LOCAL_DATE_TIME => Temporal::LocalDateTime {
                epoch_second: self.int_field()?,
                nano: self.int_field()?,
            }
            .into(),
            DATE_TIME_WITH_OFFSET => Temporal::DateTime {
                epoch_second: self.int_field()?,
                nano: self.int_field()?,
                offset_seconds: self.int_field()?,
            }
            .into(),
            DATE_TIME_WITH_ZONE_NAME => Temporal::DateTimeZoneId {
                epoch_second: self.int_field()?,
                nano: self.int_field()?,
                zone_id: self.unpack_string()?,
            }
            .into(),
            DURATION => Temporal::Duration {
                months: self.int_field()?,
                days: self.int_field()?,
                seconds: self.int_field()?,
                nanos: self.int_field()?,
            }
            .into(),
            POINT_2D => Value::Point(Point {
                srid: self.int_field()?,
                x: self.float_field()?,
                y: self.float_field()?,
                z: None,
            }),
            _ => Value::Point(Point {
                srid: self.int_field()?,
                x: self.float_field()?,
                y: self.float_field()?,
                z: Some(self.float_field()?),
            }),
        };
        Ok(value)
    }

    fn int_field(&mut self) -> Result<i64> {
        let marker = self.read_u8()?;
        self.integer(marker)
    }

    fn float_field(&mut self) -> Result<f64> {
        match self.read_u8()? {
            FLOAT_64 => Ok(f64::from_be_bytes(self.read_array()?)),
            other => Err(PackStreamError::mismatch("Float", other)),
        }
    }
}

impl<R: Read> Unpacker for PackStreamUnpacker<R> {
    fn unpack_struct_header(&mut self) -> Result<StructHeader> {
        let marker = self.read_u8()?;
        match self.struct_size(marker)? {
            Some(field_count) => Ok(StructHeader {
                field_count,
                signature: self.read_u8()?,
            }),
            None => Err(PackStreamError::mismatch("Structure", marker)),
        }
    }

    fn unpack_string(&mut self) -> Result<String> {
        let marker = self.read_u8()?;
        match self.string_size(marker)? {
            Some(len) => self.read_string(len),
            None => Err(PackStreamError::mismatch("String", marker)),
        }
    }

    fn unpack_map(&mut self) -> Result<MapSlot> {
        let marker = self.read_u8()?;
        let len = match self.map_size(marker)? {
            Some(len) => len,
            None => return Err(PackStreamError::mismatch("Map", marker)),
        };
        let mut rejected = None;
        let map = self.map_entries(len, 1, &mut rejected)?;
        Ok(match rejected {
            Some(error) => MapSlot::Error(error),
            None => MapSlot::Map(map),
        })
    }
}
