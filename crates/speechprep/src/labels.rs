//! Label codecs: characters and phones to integer indices and back.
//!
//! Unknown phones are handled asymmetrically on purpose:
//! - [`PhoneIndexMap::encode`] drops symbols missing from the map and reports
//!   them as [`DroppedUnknownSymbol`]s
//! - [`PhoneIndexMap::decode`] fails with [`UnknownIndexError`]
//!
//! [`PhoneIndexMap::encode_strict`] is the failing counterpart of `encode`.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::constants::{ALPHABET_LEN, SPACE_INDEX};
use crate::error::{PrepError, Result};

/// Encode lowercase letters and spaces: space -> 0, `'a'..='z'` -> 1..=26.
pub fn char_to_indices(text: &str) -> Result<Vec<u32>> {
    text.chars()
        .map(|c| match c {
            ' ' => Ok(SPACE_INDEX),
            'a'..='z' => Ok(u32::from(c) - u32::from('a') + 1),
            other => Err(PrepError::InvalidCharacter(other)),
        })
        .collect()
}

/// Inverse of [`char_to_indices`].
pub fn indices_to_char(indices: &[u32]) -> Result<String> {
    indices
        .iter()
        .map(|&idx| match idx {
            SPACE_INDEX => Ok(' '),
            1..=ALPHABET_LEN => char::from_u32(u32::from('a') + idx - 1)
                .ok_or(PrepError::InvalidCharIndex(idx)),
            _ => Err(PrepError::InvalidCharIndex(idx)),
        })
        .collect()
}

/// A phone symbol skipped by [`PhoneIndexMap::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedUnknownSymbol {
    /// Position of the symbol in the input phone sequence.
    pub position: usize,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("label index {index} at position {position} is not in the phone map")]
pub struct UnknownIndexError {
    pub position: usize,
    pub index: u32,
}

/// Result of a lenient phone encode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneEncoding {
    pub indices: Vec<u32>,
    pub dropped: Vec<DroppedUnknownSymbol>,
}

/// Bijection between phone symbols and label indices.
#[derive(Debug, Clone)]
pub struct PhoneIndexMap {
    to_index: HashMap<String, u32>,
    to_phone: HashMap<u32, String>,
}

impl PhoneIndexMap {
    /// Parse `<phone> <index>` lines. Blank lines are skipped; duplicate
    /// phones or indices are rejected.
    pub fn from_table_str(table: &str, source_name: &str) -> Result<Self> {
        let malformed = |line: usize, reason: String| PrepError::MalformedTable {
            source_name: source_name.to_string(),
            line,
            reason,
        };

        let mut to_index = HashMap::new();
        let mut to_phone = HashMap::new();
        for (lineno, line) in table.lines().enumerate().map(|(i, l)| (i + 1, l)) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let (phone, raw_index) = match fields.as_slice() {
                [] => continue,
                [phone, index] => (*phone, *index),
                _ => {
                    return Err(malformed(
                        lineno,
                        format!("expected `<phone> <index>`, got {} fields", fields.len()),
                    ));
                }
            };
            let index: u32 = raw_index
                .parse()
                .map_err(|e| malformed(lineno, format!("index {raw_index:?}: {e}")))?;

            if to_index.contains_key(phone) {
                return Err(malformed(lineno, format!("duplicate phone {phone:?}")));
            }
            if let Some(prev) = to_phone.get(&index) {
                return Err(malformed(
                    lineno,
                    format!("index {index} already assigned to {prev:?}"),
                ));
            }
            to_index.insert(phone.to_string(), index);
            to_phone.insert(index, phone.to_string());
        }

        debug!(source = source_name, phones = to_index.len(), "loaded phone map");
        Ok(Self { to_index, to_phone })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        Self::from_table_str(&table, &path.display().to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.to_index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_index.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, phone: &str) -> Option<u32> {
        self.to_index.get(phone).copied()
    }

    #[must_use]
    pub fn phone_of(&self, index: u32) -> Option<&str> {
        self.to_phone.get(&index).map(String::as_str)
    }

    /// Encode whitespace-separated phones, dropping symbols not in the map.
    #[must_use]
    pub fn encode(&self, phones: &str) -> PhoneEncoding {
        let mut out = PhoneEncoding::default();
        for (position, symbol) in phones.split_whitespace().enumerate() {
            match self.index_of(symbol) {
                Some(idx) => out.indices.push(idx),
                None => out.dropped.push(DroppedUnknownSymbol {
                    position,
                    symbol: symbol.to_string(),
                }),
            }
        }
        if !out.dropped.is_empty() {
            warn!(
                dropped = out.dropped.len(),
                first = %out.dropped[0].symbol,
                "phone symbols missing from phone map were dropped"
            );
        }
        out
    }

    /// Encode whitespace-separated phones; the first unknown symbol fails.
    pub fn encode_strict(&self, phones: &str) -> Result<Vec<u32>> {
        phones
            .split_whitespace()
            .enumerate()
            .map(|(position, symbol)| {
                self.index_of(symbol).ok_or_else(|| PrepError::UnknownSymbol {
                    position,
                    symbol: symbol.to_string(),
                })
            })
            .collect()
    }

    /// Decode indices to space-joined phones; an unmapped index fails.
    pub fn decode(&self, indices: &[u32]) -> Result<String, UnknownIndexError> {
        let phones = indices
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                self.phone_of(index)
                    .ok_or(UnknownIndexError { position, index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(phones.join(" "))
    }
}
