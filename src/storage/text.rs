//! Text segment encoding
//!
//! One record per line: `"{key} {value}\n"`. The key runs up to the first
//! space; the value is the rest of the line.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{LsmError, Result};
use crate::record::Record;

pub(super) fn encode<K: Display, V: Display>(records: &[Record<K, V>]) -> Result<Vec<u8>> {
    let mut out = String::new();

    for record in records {
        let (key, value) = render(record)?;
        out.push_str(&key);
        out.push(' ');
        out.push_str(&value);
        out.push('\n');
    }

    Ok(out.into_bytes())
}

/// Reject a record whose line would not parse back to the same record
pub(super) fn check<K: Display, V: Display>(record: &Record<K, V>) -> Result<()> {
    render(record).map(|_| ())
}

fn render<K: Display, V: Display>(record: &Record<K, V>) -> Result<(String, String)> {
    let key = record.key.to_string();
    let value = record.value.to_string();

    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(LsmError::Serialization(format!(
            "Text segment key must be non-empty without whitespace, got {:?}",
            key
        )));
    }
    if value.contains(['\n', '\r']) {
        return Err(LsmError::Serialization(format!(
            "Text segment value must not contain line breaks, got {:?}",
            value
        )));
    }

    Ok((key, value))
}

pub(super) fn decode<K: FromStr, V: FromStr>(bytes: &[u8]) -> Result<Vec<Record<K, V>>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| LsmError::Corruption(format!("Segment is not valid UTF-8: {}", e)))?;

    let mut records = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let (key, value) = line.split_once(' ').ok_or_else(|| {
            LsmError::Corruption(format!("Line {}: expected \"key value\", got {:?}", line_no, line))
        })?;

        let key = key
            .parse::<K>()
            .map_err(|_| LsmError::Corruption(format!("Line {}: invalid key {:?}", line_no, key)))?;
        let value = value.parse::<V>().map_err(|_| {
            LsmError::Corruption(format!("Line {}: invalid value {:?}", line_no, value))
        })?;

        records.push(Record::new(key, value));
    }

    Ok(records)
}
