//! Binary segment encoding
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                        │
//! │   Magic: "LSMS" (4) | Version: u16 (2) | Count: u64 (8)  │
//! ├──────────────────────────────────────────────────────────┤
//! │ Payload (variable)                                       │
//! │   bincode-encoded Vec<Record<K, V>>                      │
//! ├──────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                         │
//! │   PayloadCRC: u32                                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//! All integers little-endian. A zero-length file decodes as empty.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LsmError, Result};
use crate::record::Record;

/// Magic bytes identifying an lsmkv binary segment
pub(crate) const MAGIC: &[u8; 4] = b"LSMS";

/// Current binary segment format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + Count (8) = 14 bytes
pub(crate) const HEADER_SIZE: usize = 14;

/// Footer size: PayloadCRC (4) = 4 bytes
pub(crate) const FOOTER_SIZE: usize = 4;

pub(super) fn encode<K: Serialize, V: Serialize>(records: &[Record<K, V>]) -> Result<Vec<u8>> {
    let payload = bincode::serialize(records)?;
    let crc = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len() + FOOTER_SIZE);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(records.len() as u64).to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc.to_le_bytes());

    Ok(out)
}

pub(super) fn decode<K, V>(bytes: &[u8]) -> Result<Vec<Record<K, V>>>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
        return Err(LsmError::Corruption(format!(
            "Binary segment too short: {} bytes",
            bytes.len()
        )));
    }

    if &bytes[0..4] != MAGIC {
        return Err(LsmError::Corruption(format!(
            "Invalid segment magic: expected LSMS, got {:?}",
            &bytes[0..4]
        )));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(LsmError::Corruption(format!(
            "Unsupported segment version: {}",
            version
        )));
    }

    let count = u64::from_le_bytes(fixed(&bytes[6..HEADER_SIZE])?);

    let footer_start = bytes.len() - FOOTER_SIZE;
    let payload = &bytes[HEADER_SIZE..footer_start];
    let stored_crc = u32::from_le_bytes(fixed(&bytes[footer_start..])?);

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != stored_crc {
        return Err(LsmError::Corruption(format!(
            "Segment checksum mismatch: stored {:#010x}, computed {:#010x}",
            stored_crc, actual_crc
        )));
    }

    let records: Vec<Record<K, V>> = bincode::deserialize(payload)
        .map_err(|e| LsmError::Corruption(format!("Undecodable segment payload: {}", e)))?;

    if records.len() as u64 != count {
        return Err(LsmError::Corruption(format!(
            "Segment header claims {} records, payload holds {}",
            count,
            records.len()
        )));
    }

    Ok(records)
}

fn fixed<const N: usize>(slice: &[u8]) -> Result<[u8; N]> {
    slice
        .try_into()
        .map_err(|_| LsmError::Corruption(format!("Expected {} bytes, got {}", N, slice.len())))
}
