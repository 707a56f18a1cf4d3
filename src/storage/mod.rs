//! Storage Layer - one contract, two backends
//!
//! ```text
//!                 ┌───────────────────────┐
//!                 │  Storage (facade)      │  selected once at startup
//!                 └──────────┬────────────┘
//!                            │ Box<dyn Backend>
//!              ┌─────────────┴─────────────┐
//!     ┌────────┴────────┐        ┌─────────┴────────┐
//!     │   FileStore     │        │   SqliteStore    │
//!     │ JSON snapshot,  │        │ tables, FKs,     │
//!     │ scans + id lists│        │ cascades, joins  │
//!     └─────────────────┘        └──────────────────┘
//! ```
//!
//! Both backends take their relationship facts from [`crate::relation`].

pub mod file;
pub mod schema;
pub mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

use crate::config::{BackendKind, StorageConfig};
use crate::entity::Entity;
use crate::key::LookupKey;
use crate::kind::EntityKind;
use crate::relation::{self, AssociationEdge, Relation};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Lookup key (`"<Kind>.<id>"`) → entity
pub type EntityMap = BTreeMap<String, Entity>;

/// The storage contract every backend implements.
///
/// All operations are synchronous and may block on disk or database I/O.
pub trait Backend {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// All entities, or only those of `kind`. Always a fresh map.
    fn enumerate(&mut self, kind: Option<EntityKind>) -> Result<EntityMap>;

    /// Add or replace an entity in the pending unit of work
    fn stage(&mut self, entity: &Entity) -> Result<()>;

    /// Make pending work durable, all or nothing
    fn persist(&mut self) -> Result<()>;

    /// Delete an entity and everything that cascades from it. `None` or an
    /// absent entity is a no-op.
    fn remove(&mut self, entity: Option<&Entity>) -> Result<()>;

    /// Load durable state / create schema and start a fresh unit of work
    fn reinitialize(&mut self) -> Result<()>;

    /// Discard uncommitted work and release resources. Idempotent.
    fn close(&mut self) -> Result<()>;

    /// Record an association pair. `left` and `right` follow the edge's sides.
    fn link(&mut self, edge: &'static AssociationEdge, left: &Entity, right: &Entity) -> Result<()>;

    /// Drop an association pair; absent pairs are a no-op
    fn unlink(&mut self, edge: &'static AssociationEdge, left: &Entity, right: &Entity) -> Result<()>;

    /// Resolve `relation` starting from `entity`. Dangling references are skipped.
    fn related(&mut self, relation: Relation, entity: &Entity) -> Result<EntityMap>;

    /// Fetch one entity by kind and id
    fn get(&mut self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        let key = LookupKey::new(kind, id).to_key_string();
        Ok(self.enumerate(Some(kind))?.remove(&key))
    }

    /// Number of entities, or of one kind
    fn count(&mut self, kind: Option<EntityKind>) -> Result<usize> {
        Ok(self.enumerate(kind)?.len())
    }
}

/// Order two entities as (left, right) of `edge`, rejecting kinds the edge does not join
pub(crate) fn orient<'e>(
    edge: &AssociationEdge,
    a: &'e Entity,
    b: &'e Entity,
) -> Result<(&'e Entity, &'e Entity)> {
    if a.kind() == edge.left && b.kind() == edge.right {
        Ok((a, b))
    } else if b.kind() == edge.left && a.kind() == edge.right {
        Ok((b, a))
    } else {
        Err(Error::IntegrityViolation(format!(
            "{} joins {} and {}, not {} and {}",
            edge.name,
            edge.left,
            edge.right,
            a.kind(),
            b.kind()
        )))
    }
}

/// Check that `entity` is a valid source for `relation`
pub(crate) fn check_source(relation: Relation, entity: &Entity) -> Result<EntityKind> {
    relation.target(entity.kind()).ok_or_else(|| {
        Error::NotFound(format!("{:?} does not start at {}", relation, entity.kind()))
    })
}

/// Process-wide storage entry point.
///
/// Constructed explicitly and passed around; the backend is chosen once and
/// never swapped. Every call is forwarded to the backend unchanged.
pub struct Storage {
    backend: Box<dyn Backend>,
}

impl Storage {
    /// Build the configured backend and load/create its state
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let backend: Box<dyn Backend> = match config.backend {
            BackendKind::File => Box::new(FileStore::new(config.file_path())),
            BackendKind::Relational => Box::new(SqliteStore::connect(&config.relational()?)?),
        };
        Self::with_backend(backend)
    }

    /// Wrap an already constructed backend; calls `reinitialize` once
    pub fn with_backend(mut backend: Box<dyn Backend>) -> Result<Self> {
        tracing::info!("Using {} storage backend", backend.name());
        backend.reinitialize()?;
        Ok(Self { backend })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn enumerate(&mut self, kind: Option<EntityKind>) -> Result<EntityMap> {
        self.backend.enumerate(kind)
    }

    pub fn stage(&mut self, entity: &Entity) -> Result<()> {
        self.backend.stage(entity)
    }

    pub fn persist(&mut self) -> Result<()> {
        self.backend.persist()
    }

    pub fn remove(&mut self, entity: Option<&Entity>) -> Result<()> {
        self.backend.remove(entity)
    }

    pub fn reinitialize(&mut self) -> Result<()> {
        self.backend.reinitialize()
    }

    pub fn close(&mut self) -> Result<()> {
        self.backend.close()
    }

    pub fn get(&mut self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        self.backend.get(kind, id)
    }

    /// Fetch by `"<Kind>.<id>"`
    pub fn get_by_key(&mut self, key: &str) -> Result<Option<Entity>> {
        let key = LookupKey::parse(key)?;
        self.backend.get(key.kind, &key.id)
    }

    pub fn count(&mut self, kind: Option<EntityKind>) -> Result<usize> {
        self.backend.count(kind)
    }

    /// Associate two entities joined by an N:N edge, in either argument order
    pub fn link(&mut self, a: &Entity, b: &Entity) -> Result<()> {
        let edge = association(a.kind(), b.kind())?;
        let (left, right) = orient(edge, a, b)?;
        self.backend.link(edge, left, right)
    }

    pub fn unlink(&mut self, a: &Entity, b: &Entity) -> Result<()> {
        let edge = association(a.kind(), b.kind())?;
        let (left, right) = orient(edge, a, b)?;
        self.backend.unlink(edge, left, right)
    }

    /// Entities of `kind` related to `entity` through the declared schema
    pub fn related(&mut self, entity: &Entity, kind: EntityKind) -> Result<EntityMap> {
        let relation = relation::relation(entity.kind(), kind).ok_or_else(|| {
            Error::NotFound(format!("No relationship from {} to {}", entity.kind(), kind))
        })?;
        self.backend.related(relation, entity)
    }

    /// Scope a unit of work; the session is closed when the guard drops,
    /// on every exit path.
    pub fn unit_of_work(&mut self) -> UnitOfWork<'_> {
        UnitOfWork { storage: self }
    }
}

fn association(a: EntityKind, b: EntityKind) -> Result<&'static AssociationEdge> {
    relation::association_between(a, b).ok_or_else(|| {
        Error::IntegrityViolation(format!("{} and {} have no many-to-many relationship", a, b))
    })
}

/// Guard returned by [`Storage::unit_of_work`]
pub struct UnitOfWork<'a> {
    storage: &'a mut Storage,
}

impl Deref for UnitOfWork<'_> {
    type Target = Storage;

    fn deref(&self) -> &Storage {
        self.storage
    }
}

impl DerefMut for UnitOfWork<'_> {
    fn deref_mut(&mut self) -> &mut Storage {
        self.storage
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.storage.close() {
            tracing::warn!("Failed to close {} session: {}", self.storage.backend_name(), e);
        }
    }
}
