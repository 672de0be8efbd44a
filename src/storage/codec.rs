/// Record file encodings
///
/// A record file is the bincode encoding of its ordered entry list, optionally
/// compressed with zstd.
use anyhow::{Context, Result};

use super::StoredRecord;
use crate::error::CacheError;

const ZSTD_LEVEL: i32 = 3;

/// Named serialization backend for record files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Bincode,
    Zstd,
}

impl Codec {
    pub const NAMES: [&'static str; 2] = ["bincode", "zstd"];

    pub fn from_name(name: &str) -> Result<Self, CacheError> {
        match name {
            "bincode" => Ok(Codec::Bincode),
            "zstd" => Ok(Codec::Zstd),
            _ => Err(CacheError::config(format!(
                "Unknown backend type: `{}`. Supported backends are: `{}`",
                name,
                Self::NAMES.join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Codec::Bincode => "bincode",
            Codec::Zstd => "zstd",
        }
    }

    /// Extension used when none is configured
    pub fn default_extension(&self) -> &'static str {
        match self {
            Codec::Bincode => ".bincode",
            Codec::Zstd => ".bincode.zst",
        }
    }

    pub fn encode(&self, record: &StoredRecord) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(record).context("Failed to serialize record")?;

        match self {
            Codec::Bincode => Ok(bytes),
            Codec::Zstd => zstd::encode_all(bytes.as_slice(), ZSTD_LEVEL)
                .context("Failed to compress record with zstd"),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<StoredRecord> {
        let raw = match self {
            Codec::Bincode => bytes.to_vec(),
            Codec::Zstd => zstd::decode_all(bytes).context("Failed to decompress record with zstd")?,
        };

        bincode::deserialize(&raw).context("Failed to deserialize record")
    }
}
