//! Relationship schema - the single source of relationship facts
//!
//! Two edge shapes exist:
//! - `ChildEdge`: parent → children (1:N) through a foreign key attribute
//!   on the child, optionally cascading deletes
//! - `AssociationEdge`: N:N between two kinds through a join table (relational
//!   backend) or an id list on the left-hand record (file backend)
//!
//! Both backends derive cascades, join tables and lookups from the tables
//! below and nowhere else.

use crate::kind::EntityKind;

/// A 1:N edge from a parent kind to a child kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEdge {
    pub parent: EntityKind,
    pub child: EntityKind,
    /// Attribute on the child holding the parent's id
    pub foreign_key: &'static str,
    /// Deleting the parent deletes the children
    pub cascade: bool,
}

/// An N:N edge between two kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationEdge {
    /// Join table name
    pub name: &'static str,
    pub left: EntityKind,
    pub right: EntityKind,
    /// Join column referencing the left kind
    pub left_column: &'static str,
    /// Join column referencing the right kind
    pub right_column: &'static str,
    /// Id list attribute stored on left records by the file backend
    pub list_attribute: &'static str,
}

impl AssociationEdge {
    /// The kind on the other side of the association
    pub fn other(&self, kind: EntityKind) -> Option<EntityKind> {
        if kind == self.left {
            Some(self.right)
        } else if kind == self.right {
            Some(self.left)
        } else {
            None
        }
    }
}

pub static CHILD_EDGES: &[ChildEdge] = &[
    ChildEdge {
        parent: EntityKind::Region,
        child: EntityKind::Location,
        foreign_key: "region_id",
        cascade: true,
    },
    ChildEdge {
        parent: EntityKind::Location,
        child: EntityKind::Listing,
        foreign_key: "location_id",
        cascade: true,
    },
    ChildEdge {
        parent: EntityKind::Account,
        child: EntityKind::Listing,
        foreign_key: "owner_id",
        cascade: true,
    },
    ChildEdge {
        parent: EntityKind::Listing,
        child: EntityKind::Review,
        foreign_key: "listing_id",
        cascade: true,
    },
    ChildEdge {
        parent: EntityKind::Account,
        child: EntityKind::Review,
        foreign_key: "author_id",
        cascade: true,
    },
];

pub static ASSOCIATIONS: &[AssociationEdge] = &[AssociationEdge {
    name: "listing_amenities",
    left: EntityKind::Listing,
    right: EntityKind::Amenity,
    left_column: "listing_id",
    right_column: "amenity_id",
    list_attribute: "amenity_ids",
}];

/// A traversable relationship, seen from a source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Source is the parent; resolves to its children
    Children(&'static ChildEdge),
    /// Source is the child; resolves to its single parent
    Parent(&'static ChildEdge),
    /// Source is one side of an association; resolves to the other side
    Association(&'static AssociationEdge),
}

impl Relation {
    /// Kind of the entities this relation resolves to, from `source`
    pub fn target(&self, source: EntityKind) -> Option<EntityKind> {
        match self {
            Relation::Children(edge) => (edge.parent == source).then_some(edge.child),
            Relation::Parent(edge) => (edge.child == source).then_some(edge.parent),
            Relation::Association(edge) => edge.other(source),
        }
    }
}

/// Declared 1:N edges where `kind` is the parent
pub fn children_of(kind: EntityKind) -> impl Iterator<Item = &'static ChildEdge> {
    CHILD_EDGES.iter().filter(move |e| e.parent == kind)
}

/// Declared 1:N edges where `kind` is the child
pub fn parents_of(kind: EntityKind) -> impl Iterator<Item = &'static ChildEdge> {
    CHILD_EDGES.iter().filter(move |e| e.child == kind)
}

/// Declared N:N edges `kind` takes part in, on either side
pub fn associations_of(kind: EntityKind) -> impl Iterator<Item = &'static AssociationEdge> {
    ASSOCIATIONS.iter().filter(move |e| e.left == kind || e.right == kind)
}

/// The N:N edge joining two kinds, in either order
pub fn association_between(a: EntityKind, b: EntityKind) -> Option<&'static AssociationEdge> {
    ASSOCIATIONS
        .iter()
        .find(|e| (e.left == a && e.right == b) || (e.left == b && e.right == a))
}

/// The relation leading from `from` to `to`, if one is declared
pub fn relation(from: EntityKind, to: EntityKind) -> Option<Relation> {
    if let Some(edge) = CHILD_EDGES.iter().find(|e| e.parent == from && e.child == to) {
        return Some(Relation::Children(edge));
    }
    if let Some(edge) = CHILD_EDGES.iter().find(|e| e.child == from && e.parent == to) {
        return Some(Relation::Parent(edge));
    }
    association_between(from, to).map(Relation::Association)
}

/// Kinds ordered so every parent precedes its children
pub fn dependency_order() -> Vec<EntityKind> {
    let mut ordered: Vec<EntityKind> = Vec::new();
    let mut remaining: Vec<EntityKind> = EntityKind::all().to_vec();

    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|kind| {
            let ready = parents_of(*kind).all(|e| ordered.contains(&e.parent));
            if ready {
                ordered.push(*kind);
            }
            !ready
        });
        if remaining.len() == before {
            // A cycle; append the rest as declared
            ordered.append(&mut remaining);
        }
    }

    ordered
}
