//! Entity model - identity, timestamps and attribute serialization
//!
//! Every persisted object is an [`Entity`]: a stable identifier, creation and
//! modification timestamps, and a kind-specific payload ([`EntityData`]).
//! Attributes flatten to a map of scalars ([`Attributes`]) which is what the
//! file store writes and what the relational backend binds to columns.

use crate::key::LookupKey;
use crate::kind::EntityKind;
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute name → scalar value
pub type Attributes = BTreeMap<String, Scalar>;

/// Attributes every kind carries
pub const COMMON_ATTRIBUTES: &[&str] = &["id", "created_at", "updated_at"];

/// A single attribute value. Nested objects are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            Scalar::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Scalar {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        use serde_json::Value;
        match value {
            Value::Null => Ok(Scalar::Null),
            Value::String(s) => Ok(Scalar::Text(s)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Scalar::Integer(i)),
                None => n
                    .as_f64()
                    .map(Scalar::Float)
                    .ok_or_else(|| Error::InvalidAttribute(format!("Unrepresentable number: {}", n))),
            },
            other => Err(Error::InvalidAttribute(format!("Not a scalar: {}", other))),
        }
    }
}

impl From<Scalar> for serde_json::Value {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Integer(i) => i.into(),
            Scalar::Float(f) => f.into(),
            Scalar::Text(s) => s.into(),
        }
    }
}

/// Current time truncated to the precision the stores keep
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(name: &str, value: Option<&Scalar>) -> Result<DateTime<Utc>> {
    let text = value
        .and_then(Scalar::as_str)
        .ok_or_else(|| Error::InvalidAttribute(format!("Missing timestamp: {}", name)))?;
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::InvalidAttribute(format!("Bad timestamp {}={}: {}", name, text, e)))
}

// ========== Kind payloads ==========

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Account {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            first_name: None,
            last_name: None,
        }
    }

    /// Create an account from a plaintext password, storing only its SHA-256 digest
    pub fn with_password(email: impl Into<String>, password: &str) -> Self {
        Self::new(email, hash_password(password))
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn verify_password(&self, password: &str) -> bool {
        self.password_hash == hash_password(password)
    }

    /// Replace a plaintext `password` attribute with its `password_hash`.
    /// The password must be text; a number would hash a different string than was typed.
    pub fn hash_password_attribute(attrs: &mut Attributes) -> Result<()> {
        match attrs.remove("password") {
            None => Ok(()),
            Some(Scalar::Text(password)) => {
                attrs.insert("password_hash".to_string(), Scalar::Text(hash_password(&password)));
                Ok(())
            }
            Some(other) => Err(Error::InvalidAttribute(format!(
                "password must be quoted text, got {}",
                other
            ))),
        }
    }
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A region (state, province)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A location (city) inside a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub region_id: String,
    pub name: String,
}

impl Location {
    pub fn new(region_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            name: name.into(),
        }
    }
}

/// A place to stay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub location_id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub number_rooms: i64,
    #[serde(default)]
    pub number_bathrooms: i64,
    #[serde(default)]
    pub max_guest: i64,
    #[serde(default)]
    pub price_by_night: i64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Listing {
    pub fn new(location_id: impl Into<String>, owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            owner_id: owner_id.into(),
            name: name.into(),
            description: None,
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: None,
            longitude: None,
        }
    }
}

/// A review of a listing written by an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub listing_id: String,
    pub author_id: String,
    pub text: String,
}

impl Review {
    pub fn new(listing_id: impl Into<String>, author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            listing_id: listing_id.into(),
            author_id: author_id.into(),
            text: text.into(),
        }
    }
}

/// A feature offered by listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    pub name: String,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Kind-specific payload of an entity
#[derive(Debug, Clone, PartialEq)]
pub enum EntityData {
    Account(Account),
    Region(Region),
    Location(Location),
    Listing(Listing),
    Review(Review),
    Amenity(Amenity),
}

impl EntityData {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityData::Account(_) => EntityKind::Account,
            EntityData::Region(_) => EntityKind::Region,
            EntityData::Location(_) => EntityKind::Location,
            EntityData::Listing(_) => EntityKind::Listing,
            EntityData::Review(_) => EntityKind::Review,
            EntityData::Amenity(_) => EntityKind::Amenity,
        }
    }

    /// Value of a foreign-reference attribute, if this payload has it
    pub fn reference(&self, name: &str) -> Option<&str> {
        match (self, name) {
            (EntityData::Location(l), "region_id") => Some(&l.region_id),
            (EntityData::Listing(l), "location_id") => Some(&l.location_id),
            (EntityData::Listing(l), "owner_id") => Some(&l.owner_id),
            (EntityData::Review(r), "listing_id") => Some(&r.listing_id),
            (EntityData::Review(r), "author_id") => Some(&r.author_id),
            _ => None,
        }
    }

    /// Display name for kinds that have one
    pub fn name(&self) -> Option<&str> {
        match self {
            EntityData::Region(r) => Some(&r.name),
            EntityData::Location(l) => Some(&l.name),
            EntityData::Listing(l) => Some(&l.name),
            EntityData::Amenity(a) => Some(&a.name),
            EntityData::Account(a) => Some(&a.email),
            EntityData::Review(_) => None,
        }
    }

    /// Kind-specific attributes, one per declared field
    fn attributes(&self) -> Attributes {
        let pairs: Vec<(&str, Scalar)> = match self {
            EntityData::Account(a) => vec![
                ("email", a.email.as_str().into()),
                ("password_hash", a.password_hash.as_str().into()),
                ("first_name", a.first_name.clone().into()),
                ("last_name", a.last_name.clone().into()),
            ],
            EntityData::Region(r) => vec![("name", r.name.as_str().into())],
            EntityData::Location(l) => vec![
                ("region_id", l.region_id.as_str().into()),
                ("name", l.name.as_str().into()),
            ],
            EntityData::Listing(l) => vec![
                ("location_id", l.location_id.as_str().into()),
                ("owner_id", l.owner_id.as_str().into()),
                ("name", l.name.as_str().into()),
                ("description", l.description.clone().into()),
                ("number_rooms", l.number_rooms.into()),
                ("number_bathrooms", l.number_bathrooms.into()),
                ("max_guest", l.max_guest.into()),
                ("price_by_night", l.price_by_night.into()),
                ("latitude", l.latitude.into()),
                ("longitude", l.longitude.into()),
            ],
            EntityData::Review(r) => vec![
                ("listing_id", r.listing_id.as_str().into()),
                ("author_id", r.author_id.as_str().into()),
                ("text", r.text.as_str().into()),
            ],
            EntityData::Amenity(a) => vec![("name", a.name.as_str().into())],
        };
        pairs.into_iter().map(|(name, value)| (name.to_string(), value)).collect()
    }

    /// Floats must be finite; JSON has no encoding for NaN or infinity
    fn check_finite<'a>(kind: EntityKind, values: impl IntoIterator<Item = (&'a String, &'a Scalar)>) -> Result<()> {
        for (name, value) in values {
            if let Scalar::Float(f) = value {
                if !f.is_finite() {
                    return Err(Error::InvalidAttribute(format!("{}.{} must be finite, got {}", kind, name, f)));
                }
            }
        }
        Ok(())
    }

    /// Rebuild a payload from attributes; attributes the kind does not declare are ignored
    pub fn from_attributes(kind: EntityKind, attrs: &Attributes) -> Result<Self> {
        Self::check_finite(kind, attrs.iter().filter(|(name, _)| kind.field(name).is_some()))?;
        let map: serde_json::Map<String, serde_json::Value> = kind
            .fields()
            .iter()
            .filter_map(|f| attrs.get(f.name).map(|v| (f.name.to_string(), v.clone().into())))
            .collect();
        let value = serde_json::Value::Object(map);

        Ok(match kind {
            EntityKind::Account => EntityData::Account(decode(kind, value)?),
            EntityKind::Region => EntityData::Region(decode(kind, value)?),
            EntityKind::Location => EntityData::Location(decode(kind, value)?),
            EntityKind::Listing => EntityData::Listing(decode(kind, value)?),
            EntityKind::Review => EntityData::Review(decode(kind, value)?),
            EntityKind::Amenity => EntityData::Amenity(decode(kind, value)?),
        })
    }
}

fn decode<T: DeserializeOwned>(kind: EntityKind, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::InvalidAttribute(format!("{}: {}", kind, e)))
}

macro_rules! impl_into_data {
    ($($ty:ident),*) => {
        $(impl From<$ty> for EntityData {
            fn from(value: $ty) -> Self {
                EntityData::$ty(value)
            }
        })*
    };
}

impl_into_data!(Account, Region, Location, Listing, Review, Amenity);

// ========== Entity ==========

/// A persisted domain object.
///
/// Equality, hashing and the lookup key depend only on (kind, id).
/// Identity and the creation timestamp cannot change after construction;
/// every mutation moves `updated_at` forward.
#[derive(Debug, Clone)]
pub struct Entity {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    data: EntityData,
}

impl Entity {
    /// Create a new entity with a fresh identifier and timestamps
    pub fn new(data: impl Into<EntityData>) -> Self {
        let now = now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            data: data.into(),
        }
    }

    /// Reconstruct an entity from its serialized attributes.
    ///
    /// `id`, `created_at` and `updated_at` are restored verbatim and must be present.
    pub fn from_attributes(kind: EntityKind, attrs: &Attributes) -> Result<Self> {
        let id = attrs
            .get("id")
            .and_then(Scalar::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidAttribute(format!("{} attributes have no id", kind)))?
            .to_string();

        Ok(Self {
            created_at: parse_timestamp("created_at", attrs.get("created_at"))?,
            updated_at: parse_timestamp("updated_at", attrs.get("updated_at"))?,
            data: EntityData::from_attributes(kind, attrs)?,
            id,
        })
    }

    /// Flatten to attribute name → scalar, including identity and timestamps
    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("id".to_string(), Scalar::Text(self.id.clone()));
        attrs.insert("created_at".to_string(), Scalar::Text(format_timestamp(&self.created_at)));
        attrs.insert("updated_at".to_string(), Scalar::Text(format_timestamp(&self.updated_at)));
        attrs.extend(self.data.attributes());
        attrs
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.data.kind()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn data(&self) -> &EntityData {
        &self.data
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name()
    }

    pub fn key(&self) -> LookupKey {
        LookupKey::new(self.kind(), self.id.clone())
    }

    /// `"<Kind>.<id>"`
    pub fn key_string(&self) -> String {
        format!("{}.{}", self.kind().as_str(), self.id)
    }

    /// Mutate the payload. The kind may not change.
    pub fn update(&mut self, f: impl FnOnce(&mut EntityData)) -> Result<()> {
        let kind = self.kind();
        let mut data = self.data.clone();
        f(&mut data);
        EntityData::check_finite(kind, &data.attributes())?;
        if data.kind() != kind {
            return Err(Error::InvalidAttribute(format!(
                "Cannot change {} into {}",
                kind,
                data.kind()
            )));
        }
        self.data = data;
        self.touch();
        Ok(())
    }

    /// Set one kind-specific attribute by name
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Scalar>) -> Result<()> {
        let kind = self.kind();
        if COMMON_ATTRIBUTES.contains(&name) {
            return Err(Error::InvalidAttribute(format!("{} is read-only", name)));
        }
        if kind.field(name).is_none() {
            return Err(Error::InvalidAttribute(format!("{} has no attribute {}", kind, name)));
        }

        let mut attrs = self.data.attributes();
        attrs.insert(name.to_string(), value.into());
        self.data = EntityData::from_attributes(kind, &attrs)?;
        self.touch();
        Ok(())
    }

    /// Move `updated_at` to now, never backwards
    pub fn touch(&mut self) {
        self.updated_at = now().max(self.updated_at);
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.id == other.id
    }
}

impl Eq for Entity {}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ({})", self.kind(), self.id)?;
        if let Some(name) = self.name() {
            write!(f, " {}", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Entity {
        let mut listing = Listing::new("loc-1", "acct-1", "Cozy loft");
        listing.number_rooms = 2;
        listing.price_by_night = 120;
        listing.latitude = Some(37.77);
        Entity::new(listing)
    }

    #[test]
    fn test_new_entity_identity() {
        let a = Entity::new(Region::new("California"));
        let b = Entity::new(Region::new("California"));

        assert_ne!(a.id(), b.id());
        assert_eq!(a.kind(), EntityKind::Region);
        assert_eq!(a.created_at(), a.updated_at());
        assert_eq!(a.key_string(), format!("Region.{}", a.id()));
    }

    #[test]
    fn test_reconstruction_keeps_identity() {
        let listing = sample_listing();
        let attrs = listing.to_attributes();

        let restored = Entity::from_attributes(EntityKind::Listing, &attrs).unwrap();
        assert_eq!(restored.id(), listing.id());
        assert_eq!(restored.created_at(), listing.created_at());
        assert_eq!(restored.updated_at(), listing.updated_at());
        assert_eq!(restored.data(), listing.data());
    }

    #[test]
    fn test_reconstruction_requires_id() {
        let mut attrs = Entity::new(Amenity::new("Wifi")).to_attributes();
        attrs.remove("id");
        assert!(Entity::from_attributes(EntityKind::Amenity, &attrs).is_err());
    }

    #[test]
    fn test_attributes_are_scalars() {
        let attrs = sample_listing().to_attributes();
        assert_eq!(attrs.get("number_rooms"), Some(&Scalar::Integer(2)));
        assert_eq!(attrs.get("latitude"), Some(&Scalar::Float(37.77)));
        assert_eq!(attrs.get("longitude"), Some(&Scalar::Null));
        assert_eq!(attrs.get("name").and_then(Scalar::as_str), Some("Cozy loft"));
        assert!(!attrs.contains_key("amenity_ids"));
    }

    #[test]
    fn test_set_attribute_touches() {
        let mut listing = sample_listing();
        let before = listing.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));

        listing.set_attribute("price_by_night", 99_i64).unwrap();
        assert!(listing.updated_at() > before);
        match listing.data() {
            EntityData::Listing(l) => assert_eq!(l.price_by_night, 99),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_set_attribute_rejects_identity_and_unknown() {
        let mut region = Entity::new(Region::new("Texas"));
        assert!(region.set_attribute("id", "other").is_err());
        assert!(region.set_attribute("created_at", "2020-01-01T00:00:00Z").is_err());
        assert!(region.set_attribute("color", "red").is_err());
        assert!(region.set_attribute("name", 5_i64).is_err());
    }

    #[test]
    fn test_update_cannot_change_kind() {
        let mut region = Entity::new(Region::new("Texas"));
        let id = region.id().to_string();
        let result = region.update(|data| *data = EntityData::Amenity(Amenity::new("Pool")));

        assert!(result.is_err());
        assert_eq!(region.kind(), EntityKind::Region);
        assert_eq!(region.id(), id);
    }

    #[test]
    fn test_equality_by_kind_and_id() {
        let region = Entity::new(Region::new("Nevada"));
        let mut renamed = region.clone();
        renamed.set_attribute("name", "Arizona").unwrap();
        assert_eq!(region, renamed);
    }

    #[test]
    fn test_password_hash() {
        let account = Account::with_password("a@b.c", "hunter2");
        assert_ne!(account.password_hash, "hunter2");
        assert_eq!(account.password_hash.len(), 64);
        assert!(account.verify_password("hunter2"));
        assert!(!account.verify_password("hunter3"));
    }

    #[test]
    fn test_password_attribute_is_hashed() {
        let mut attrs = Attributes::new();
        attrs.insert("email".to_string(), Scalar::from("a@b.c"));
        attrs.insert("password".to_string(), Scalar::from("1234"));
        Account::hash_password_attribute(&mut attrs).unwrap();

        assert!(!attrs.contains_key("password"));
        let account = match EntityData::from_attributes(EntityKind::Account, &attrs).unwrap() {
            EntityData::Account(a) => a,
            other => panic!("unexpected payload {:?}", other),
        };
        assert!(account.verify_password("1234"));
        assert!(!account.verify_password(""));
    }

    #[test]
    fn test_numeric_password_rejected() {
        for value in [Scalar::Integer(1234), Scalar::Float(12.5), Scalar::Null] {
            let mut attrs = Attributes::new();
            attrs.insert("password".to_string(), value);
            assert!(matches!(
                Account::hash_password_attribute(&mut attrs),
                Err(Error::InvalidAttribute(_))
            ));
            assert!(!attrs.contains_key("password_hash"));
        }
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        let mut listing = sample_listing();
        let before = listing.to_attributes();

        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert!(matches!(
                listing.set_attribute("latitude", bad),
                Err(Error::InvalidAttribute(_))
            ));
        }
        let result = listing.update(|data| {
            if let EntityData::Listing(l) = data {
                l.longitude = Some(f64::INFINITY);
            }
        });
        assert!(matches!(result, Err(Error::InvalidAttribute(_))));
        assert_eq!(listing.to_attributes(), before);
    }

    #[test]
    fn test_attributes_cover_declared_fields() {
        let samples = [
            Entity::new(Account::with_password("a@b.c", "pw")),
            Entity::new(Region::new("Utah")),
            Entity::new(Location::new("r", "Moab")),
            sample_listing(),
            Entity::new(Review::new("l", "a", "Fine")),
            Entity::new(Amenity::new("Pool")),
        ];
        for entity in samples {
            let attrs = entity.to_attributes();
            let mut expected: Vec<&str> = COMMON_ATTRIBUTES.to_vec();
            expected.extend(entity.kind().fields().iter().map(|f| f.name));
            expected.sort();
            let mut actual: Vec<&str> = attrs.keys().map(String::as_str).collect();
            actual.sort();
            assert_eq!(actual, expected, "{}", entity.kind());
        }
    }

    #[test]
    fn test_scalar_json_untagged() {
        let parsed: Attributes =
            serde_json::from_str(r#"{"a": null, "b": 3, "c": 2.5, "d": "x"}"#).unwrap();
        assert_eq!(parsed["a"], Scalar::Null);
        assert_eq!(parsed["b"], Scalar::Integer(3));
        assert_eq!(parsed["c"], Scalar::Float(2.5));
        assert_eq!(parsed["d"], Scalar::Text("x".to_string()));
    }
}
