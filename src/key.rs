//! Lookup key - identity of an entity across all kinds
//!
//! Format: `<Kind>.<id>`
//!
//! Examples:
//! - `Region.4f1c0c9e-2b7a-4d3e-9a57-0d8f3b1e6c21`
//! - `Listing.9d2b6f0a-77c4-4f0e-8a0b-51d0c9a7e3f4`

use crate::kind::EntityKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Composite key `"<Kind>.<id>"` used by both backends and every mapping
/// returned from the storage contract.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupKey {
    pub kind: EntityKind,
    pub id: String,
}

impl LookupKey {
    /// Create a new LookupKey
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    /// Parse a key string into a LookupKey
    ///
    /// Expected format: `<Kind>.<id>`
    pub fn parse(key: &str) -> Result<Self> {
        let (kind_str, id) = key
            .split_once('.')
            .ok_or_else(|| Error::InvalidKey(format!("Key must be <Kind>.<id>: {}", key)))?;

        if id.is_empty() {
            return Err(Error::InvalidKey(format!("Key has an empty id: {}", key)));
        }

        let kind = EntityKind::from_str(kind_str)?;
        Ok(Self::new(kind, id))
    }

    /// Convert to key string
    pub fn to_key_string(&self) -> String {
        format!("{}.{}", self.kind.as_str(), self.id)
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key_string())
    }
}

impl FromStr for LookupKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for LookupKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_key_string())
    }
}

impl<'de> Deserialize<'de> for LookupKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        LookupKey::parse(&s).map_err(serde::de::Error::custom)
    }
}
