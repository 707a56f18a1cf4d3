//! Entity kinds - the six persisted record types
//!
//! The kind is the discriminator used in lookup keys (`Listing.<id>`),
//! in relational table names and in the relationship schema.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Every kind of entity the engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A user of the system; owns listings and writes reviews
    Account,
    /// Top-level geographic grouping (state, province)
    Region,
    /// A city or town inside a region
    Location,
    /// A place to stay
    Listing,
    /// Free-text feedback on a listing
    Review,
    /// A feature a listing can offer
    Amenity,
}

/// Storage type of a single attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Real,
}

impl FieldType {
    /// SQL column type for this field
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Integer => "INTEGER",
            FieldType::Real => "REAL",
        }
    }
}

/// Descriptor of one kind-specific attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub nullable: bool,
}

const fn field(name: &'static str, ty: FieldType, nullable: bool) -> Field {
    Field { name, ty, nullable }
}

const ACCOUNT_FIELDS: &[Field] = &[
    field("email", FieldType::Text, false),
    field("password_hash", FieldType::Text, false),
    field("first_name", FieldType::Text, true),
    field("last_name", FieldType::Text, true),
];

const REGION_FIELDS: &[Field] = &[field("name", FieldType::Text, false)];

const LOCATION_FIELDS: &[Field] = &[
    field("region_id", FieldType::Text, false),
    field("name", FieldType::Text, false),
];

const LISTING_FIELDS: &[Field] = &[
    field("location_id", FieldType::Text, false),
    field("owner_id", FieldType::Text, false),
    field("name", FieldType::Text, false),
    field("description", FieldType::Text, true),
    field("number_rooms", FieldType::Integer, false),
    field("number_bathrooms", FieldType::Integer, false),
    field("max_guest", FieldType::Integer, false),
    field("price_by_night", FieldType::Integer, false),
    field("latitude", FieldType::Real, true),
    field("longitude", FieldType::Real, true),
];

const REVIEW_FIELDS: &[Field] = &[
    field("listing_id", FieldType::Text, false),
    field("author_id", FieldType::Text, false),
    field("text", FieldType::Text, false),
];

const AMENITY_FIELDS: &[Field] = &[field("name", FieldType::Text, false)];

impl EntityKind {
    /// Get the string representation used in lookup keys
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "Account",
            EntityKind::Region => "Region",
            EntityKind::Location => "Location",
            EntityKind::Listing => "Listing",
            EntityKind::Review => "Review",
            EntityKind::Amenity => "Amenity",
        }
    }

    /// Get all entity kinds
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Account,
            EntityKind::Region,
            EntityKind::Location,
            EntityKind::Listing,
            EntityKind::Review,
            EntityKind::Amenity,
        ]
    }

    /// Relational table holding this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Account => "accounts",
            EntityKind::Region => "regions",
            EntityKind::Location => "locations",
            EntityKind::Listing => "listings",
            EntityKind::Review => "reviews",
            EntityKind::Amenity => "amenities",
        }
    }

    /// Kind-specific attributes, excluding `id`, `created_at` and `updated_at`
    pub fn fields(&self) -> &'static [Field] {
        match self {
            EntityKind::Account => ACCOUNT_FIELDS,
            EntityKind::Region => REGION_FIELDS,
            EntityKind::Location => LOCATION_FIELDS,
            EntityKind::Listing => LISTING_FIELDS,
            EntityKind::Review => REVIEW_FIELDS,
            EntityKind::Amenity => AMENITY_FIELDS,
        }
    }

    /// Look up a kind-specific field by name
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields().iter().find(|f| f.name == name)
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "account" | "user" => Ok(EntityKind::Account),
            "region" | "state" => Ok(EntityKind::Region),
            "location" | "city" => Ok(EntityKind::Location),
            "listing" | "place" => Ok(EntityKind::Listing),
            "review" => Ok(EntityKind::Review),
            "amenity" => Ok(EntityKind::Amenity),
            _ => Err(Error::InvalidKey(format!("Unknown entity kind: {}", s))),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
