//! Byte encodings of [`Packed`].
//!
//! - `Json`: the keyed record `{"GlobalAges": [...], "TeamAges": {...}}`.
//!   Missing keys default, unknown keys are ignored, wrong shapes fail.
//! - `Binary`: postcard payload behind a 5-byte frame
//!   (`AGES` magic + format tag). Strict: any framing problem fails.

use super::Packed;
use crate::error::PersistenceError;
use serde::{Deserialize, Serialize};

/// Magic bytes opening every binary payload.
pub const BINARY_MAGIC: [u8; 4] = *b"AGES";

/// Format tag following the magic.
pub const BINARY_FORMAT: u8 = 1;

const HEADER_LEN: usize = BINARY_MAGIC.len() + 1;

/// How a [`Packed`] record is turned into bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Json,
    Binary,
}

impl Encoding {
    /// File extension used by file-backed storage.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "bin",
        }
    }

    /// The other encoding.
    #[must_use]
    pub fn alternate(self) -> Self {
        match self {
            Self::Json => Self::Binary,
            Self::Binary => Self::Json,
        }
    }

    /// Guess the encoding of stored bytes from the binary magic.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&BINARY_MAGIC) {
            Self::Binary
        } else {
            Self::Json
        }
    }

    pub fn encode(self, packed: &Packed) -> Result<Vec<u8>, PersistenceError> {
        match self {
            Self::Json => Ok(serde_json::to_vec_pretty(packed)?),
            Self::Binary => {
                let mut bytes = Vec::with_capacity(HEADER_LEN.saturating_add(64));
                bytes.extend_from_slice(&BINARY_MAGIC);
                bytes.push(BINARY_FORMAT);
                let payload = postcard::to_stdvec(packed)?;
                bytes.extend_from_slice(&payload);
                Ok(bytes)
            }
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Packed, PersistenceError> {
        match self {
            Self::Json => Ok(serde_json::from_slice(bytes)?),
            Self::Binary => decode_binary(bytes),
        }
    }
}

fn decode_binary(bytes: &[u8]) -> Result<Packed, PersistenceError> {
    if bytes.len() < HEADER_LEN {
        return Err(PersistenceError::BadHeader(format!(
            "payload is {} bytes, header needs {}",
            bytes.len(),
            HEADER_LEN
        )));
    }

    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..BINARY_MAGIC.len()] != BINARY_MAGIC {
        return Err(PersistenceError::BadHeader("magic mismatch".to_string()));
    }
    let format = header[BINARY_MAGIC.len()];
    if format != BINARY_FORMAT {
        return Err(PersistenceError::BadHeader(format!(
            "unknown format tag {format}"
        )));
    }

    let (packed, rest) = postcard::take_from_bytes::<Packed>(payload)?;
    if !rest.is_empty() {
        return Err(PersistenceError::Malformed(format!(
            "{} trailing bytes after payload",
            rest.len()
        )));
    }
    Ok(packed)
}
