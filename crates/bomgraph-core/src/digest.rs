//! Content digests and canonical serialization.
//!
//! A digest is the lowercase hex SHA-256 of a symbol's canonical bytes.
//! Canonical bytes are compact JSON with every object emitted in key order,
//! so two runs that build the same content always agree on its digest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::io::Read;

use crate::error::SymbolError;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// A content-addressed identity.
///
/// Never chosen, always derived: two symbols with byte-identical canonical
/// content share one digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(pub String);

impl Digest {
    /// Hash raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{hash:x}"))
    }

    /// Hash everything a reader yields.
    pub fn from_reader(mut reader: impl Read) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Hash the canonical serialization of any serializable value.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, SymbolError> {
        Ok(Self::from_bytes(&canonical_bytes(value)?))
    }

    /// Parse a digest read back from disk, rejecting anything that is not
    /// 64 lowercase hex characters.
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let valid = raw.len() == DIGEST_HEX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(SymbolError::InvalidDigest(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Object-store shard: the first two hex characters.
    pub fn shard(&self) -> &str {
        self.0.get(..2).unwrap_or(&self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serialize `value` to a JSON tree with every object's keys sorted.
pub fn canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, SymbolError> {
    let value = serde_json::to_value(value).map_err(|e| SymbolError::Serialize(e.to_string()))?;
    Ok(sort_keys(value))
}

/// Serialize `value` to compact, key-sorted JSON bytes.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SymbolError> {
    let value = canonical_value(value)?;
    serde_json::to_vec(&value).map_err(|e| SymbolError::Serialize(e.to_string()))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
