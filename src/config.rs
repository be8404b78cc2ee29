//! Decoder configuration

use std::path::Path;

use serde::Deserialize;

/// Default limit on value nesting (maps and lists inside maps and lists).
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit on a single string or byte array (16 MB).
pub const DEFAULT_MAX_VALUE_SIZE: usize = 16 * 1024 * 1024;

/// Bolt protocol version negotiated for the connection.
///
/// Version 2 adds temporal and spatial parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u32")]
pub enum ProtocolVersion {
    V1,
    #[default]
    V2,
}

impl ProtocolVersion {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Whether temporal and spatial structures are accepted as values
    pub fn supports_temporal(self) -> bool {
        matches!(self, Self::V2)
    }
}

impl TryFrom<u32> for ProtocolVersion {
    type Error = String;

    fn try_from(v: u32) -> std::result::Result<Self, Self::Error> {
        Self::from_u32(v).ok_or_else(|| format!("unsupported protocol version: {}", v))
    }
}

/// Limits and protocol options for [`PackStreamUnpacker`](crate::PackStreamUnpacker).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnpackerConfig {
    pub protocol_version: ProtocolVersion,
    /// Maximum nesting of lists, maps and structures inside a message field
    pub max_depth: usize,
    /// Maximum declared length of a string or byte array, in bytes
    pub max_value_size: usize,
}

impl Default for UnpackerConfig {
    fn default() -> Self {
        Self {
            protocol_version: ProtocolVersion::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }
}

impl UnpackerConfig {
    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_value_size(mut self, max_value_size: usize) -> Self {
        self.max_value_size = max_value_size;
        self
    }

    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Errors loading a config file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
