//! Native document identifiers.
//!
//! An [`ObjectId`] is 12 bytes: a 4-byte big-endian Unix timestamp, 5 bytes
//! chosen once per process, and a 3-byte counter seeded randomly. Inside a
//! document it is represented as the extended-JSON object `{"$oid": "<hex>"}`,
//! which keeps it distinguishable from plain strings in filters and exports.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::{Map, Value};

use crate::error_handling::StoreError;

/// Key of the extended-JSON wrapper object.
pub const OID_KEY: &str = "$oid";

const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generates a new identifier for the current second.
    pub fn new() -> Self {
        // Timestamps past 2106 wrap; the counter keeps ids unique within a process anyway
        let seconds = Utc::now().timestamp() as u32;
        let process = PROCESS_UNIQUE.get_or_init(|| rand::rng().random());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::rng().random_range(0..=COUNTER_MASK)))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parses a 24-character hexadecimal string.
    pub fn parse_str(s: &str) -> Result<Self, StoreError> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| StoreError::InvalidObjectId(format!("{s:?}: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time encoded in the first four bytes.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        DateTime::from_timestamp(i64::from(seconds), 0).unwrap_or_default()
    }

    /// Extended-JSON form stored inside documents.
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(1);
        map.insert(OID_KEY.to_string(), Value::String(self.to_hex()));
        Value::Object(map)
    }

    /// Reads the extended-JSON form; `None` for anything else.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        map.get(OID_KEY)?
            .as_str()
            .and_then(|hex| Self::parse_str(hex).ok())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        id.to_value()
    }
}

/// True for `{"$oid": "<string>"}` wrapper objects.
pub(crate) fn is_object_id(value: &Value) -> bool {
    ObjectId::from_value(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_ids_are_distinct_and_ordered_within_process() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        // Same process bytes
        assert_eq!(a.bytes()[4..9], b.bytes()[4..9]);
    }

    #[test]
    fn test_hex_parse_and_display_agree() {
        let id = ObjectId::parse_str("68332eb9da0b77ec6b8d1476").expect("valid hex");
        assert_eq!(id.to_string(), "68332eb9da0b77ec6b8d1476");
        assert_eq!(id.bytes()[0], 0x68);
        assert_eq!(id.timestamp().timestamp(), 0x6833_2eb9);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(ObjectId::parse_str("").is_err());
        assert!(ObjectId::parse_str("68332eb9da0b77ec6b8d147").is_err());
        assert!(ObjectId::parse_str("zz332eb9da0b77ec6b8d1476").is_err());
        assert!(ObjectId::parse_str("68332eb9da0b77ec6b8d147600").is_err());
        assert_eq!(
            ObjectId::parse_str("68332EB9DA0B77EC6B8D1476").unwrap().to_hex(),
            "68332eb9da0b77ec6b8d1476"
        );
        assert!(matches!(
            "not-an-id".parse::<ObjectId>(),
            Err(StoreError::InvalidObjectId(_))
        ));
    }

    #[test]
    fn test_extended_json_form() {
        let id = ObjectId::parse_str("68332eb9da0b77ec6b8d1476").unwrap();
        let value = id.to_value();
        assert_eq!(value, json!({"$oid": "68332eb9da0b77ec6b8d1476"}));
        assert_eq!(ObjectId::from_value(&value), Some(id));
        assert!(ObjectId::from_value(&json!("68332eb9da0b77ec6b8d1476")).is_none());
        assert!(ObjectId::from_value(&json!({"$oid": "x", "extra": 1})).is_none());
    }
}
