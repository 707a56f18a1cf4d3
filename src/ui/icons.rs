use crate::kind::EntityKind;

pub struct Icons;

impl Icons {
    pub const DATABASE: &str = "🗄️";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const LINK: &str = "🔗";
    pub const UNLINK: &str = "⛓️";
    pub const DEL: &str = "🗑️";

    pub const PERSON: &str = "👤";
    pub const PIN: &str = "📍";
    pub const HOUSE: &str = "🏠";
    pub const STAR: &str = "⭐";
    pub const SPARKLE: &str = "✨";

    pub fn for_kind(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Account => Self::PERSON,
            EntityKind::Region | EntityKind::Location => Self::PIN,
            EntityKind::Listing => Self::HOUSE,
            EntityKind::Review => Self::STAR,
            EntityKind::Amenity => Self::SPARKLE,
        }
    }
}
