//! File-backed storage
//!
//! The whole entity set lives in memory and is written as one JSON object:
//!
//! ```json
//! {
//!   "Region.<id>":  { "id": "..", "created_at": "..", "updated_at": "..", "name": "California" },
//!   "Listing.<id>": { "id": "..", ..., "amenity_ids": ["<amenity id>", ...] }
//! }
//! ```
//!
//! Relationships are never embedded. They are re-derived by scanning: a
//! child points at its parent through a foreign key attribute, and the left
//! side of an association carries the list of right-side ids. Writes go to a
//! temporary sibling file which is renamed over the store, so a failed
//! persist never leaves a partial snapshot behind.
//!
//! Single writer only: concurrent `persist` calls from different processes
//! are not serialized and the last snapshot written wins.

use super::{check_source, orient, Backend, EntityMap};
use crate::config::ensure_store_dir;
use crate::entity::{Attributes, Entity, Scalar};
use crate::key::LookupKey;
use crate::kind::EntityKind;
use crate::relation::{self, AssociationEdge, Relation};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// (association name, left id) → right ids
type Links = BTreeMap<(&'static str, String), BTreeSet<String>>;

/// On-disk shape: lookup key → attribute object
type Snapshot = BTreeMap<String, serde_json::Map<String, serde_json::Value>>;

/// Working set plus the last durable copy of it
#[derive(Debug, Clone, Default)]
struct State {
    objects: EntityMap,
    links: Links,
}

/// JSON snapshot storage that resolves relationships by linear scans
pub struct FileStore {
    path: PathBuf,
    working: State,
    durable: State,
    /// Keys staged since the last persist
    dirty: BTreeSet<String>,
    /// Pairs linked since the last persist
    dirty_links: BTreeSet<(&'static str, String, String)>,
}

impl FileStore {
    /// Create a store over `path`. Nothing is read until `reinitialize`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            working: State::default(),
            durable: State::default(),
            dirty: BTreeSet::new(),
            dirty_links: BTreeSet::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scan<'a>(&'a self, kind: EntityKind) -> impl Iterator<Item = &'a Entity> + 'a {
        self.working.objects.values().filter(move |e| e.kind() == kind)
    }

    fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.working.objects.contains_key(&LookupKey::new(kind, id).to_key_string())
    }

    /// Drop uncommitted work and return to the last durable state
    fn rollback(&mut self) {
        self.working = self.durable.clone();
        self.dirty.clear();
        self.dirty_links.clear();
    }

    // ========== Integrity ==========

    /// Every reference introduced since the last persist must resolve
    fn check_integrity(&self) -> Result<()> {
        for key in &self.dirty {
            let Some(entity) = self.working.objects.get(key) else {
                continue; // staged then removed
            };
            for edge in relation::parents_of(entity.kind()) {
                let Some(parent_id) = entity.data().reference(edge.foreign_key) else {
                    continue;
                };
                if !self.contains(edge.parent, parent_id) {
                    return Err(Error::IntegrityViolation(format!(
                        "{}.{} references missing {}.{}",
                        key, edge.foreign_key, edge.parent, parent_id
                    )));
                }
            }
        }

        for (name, left_id, right_id) in &self.dirty_links {
            let Some(edge) = relation::ASSOCIATIONS.iter().find(|e| e.name == *name) else {
                continue;
            };
            let still_linked = self
                .working
                .links
                .get(&(*name, left_id.clone()))
                .is_some_and(|ids| ids.contains(right_id));
            if !still_linked {
                continue;
            }
            if !self.contains(edge.left, left_id) || !self.contains(edge.right, right_id) {
                return Err(Error::IntegrityViolation(format!(
                    "{} pair ({}, {}) references a missing entity",
                    name, left_id, right_id
                )));
            }
        }

        Ok(())
    }

    // ========== Removal ==========

    /// Remove one entity and its cascading children; returns how many were removed
    fn remove_cascading(&mut self, kind: EntityKind, id: &str) -> usize {
        let key = LookupKey::new(kind, id).to_key_string();
        if self.working.objects.remove(&key).is_none() {
            return 0;
        }
        self.purge_links(kind, id);

        let mut removed = 1;
        for edge in relation::children_of(kind).filter(|e| e.cascade) {
            let children: Vec<String> = self
                .scan(edge.child)
                .filter(|child| child.data().reference(edge.foreign_key) == Some(id))
                .map(|child| child.id().to_string())
                .collect();
            for child_id in children {
                removed += self.remove_cascading(edge.child, &child_id);
            }
        }
        removed
    }

    /// Remove every association pair `kind`/`id` takes part in
    fn purge_links(&mut self, kind: EntityKind, id: &str) {
        for edge in relation::associations_of(kind) {
            if edge.left == kind {
                self.working.links.remove(&(edge.name, id.to_string()));
            }
            if edge.right == kind {
                for ((name, _), ids) in self.working.links.iter_mut() {
                    if *name == edge.name {
                        ids.remove(id);
                    }
                }
            }
        }
        self.working.links.retain(|_, ids| !ids.is_empty());
    }

    // ========== Snapshot I/O ==========

    fn to_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for (key, entity) in &self.working.objects {
            let mut record: serde_json::Map<String, serde_json::Value> = entity
                .to_attributes()
                .into_iter()
                .map(|(name, value)| (name, value.into()))
                .collect();

            for edge in relation::associations_of(entity.kind()).filter(|e| e.left == entity.kind()) {
                let ids: Vec<serde_json::Value> = self
                    .working
                    .links
                    .get(&(edge.name, entity.id().to_string()))
                    .map(|ids| ids.iter().cloned().map(serde_json::Value::String).collect())
                    .unwrap_or_default();
                record.insert(edge.list_attribute.to_string(), serde_json::Value::Array(ids));
            }

            snapshot.insert(key.clone(), record);
        }
        snapshot
    }

    fn from_snapshot(snapshot: Snapshot) -> Result<State> {
        let mut state = State::default();

        for (key, mut record) in snapshot {
            let key = LookupKey::parse(&key)?;

            for edge in relation::associations_of(key.kind).filter(|e| e.left == key.kind) {
                let Some(list) = record.remove(edge.list_attribute) else {
                    continue;
                };
                let ids: Vec<String> = serde_json::from_value(list).map_err(|e| {
                    Error::InvalidAttribute(format!("{}.{}: {}", key, edge.list_attribute, e))
                })?;
                if !ids.is_empty() {
                    state.links.insert((edge.name, key.id.clone()), ids.into_iter().collect());
                }
            }

            let attrs = record
                .into_iter()
                .map(|(name, value)| Ok((name, Scalar::try_from(value)?)))
                .collect::<Result<Attributes>>()?;
            let entity = Entity::from_attributes(key.kind, &attrs)?;
            if entity.id() != key.id {
                return Err(Error::InvalidKey(format!("{} holds entity {}", key, entity.id())));
            }
            state.objects.insert(key.to_key_string(), entity);
        }

        Ok(state)
    }

    /// Write the working set to a temp file, then rename it over the store
    fn write_snapshot(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.to_snapshot())?;
        ensure_store_dir(&self.path)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::Persistence(format!("{} is not a file path", self.path.display())))?;
        let tmp_path = self.path.with_file_name(format!("{}.tmp", file_name));

        let written = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::Persistence(format!("Failed to write {}: {}", self.path.display(), e)));
        }

        tracing::info!(
            "Saved {} entities to {} ({} bytes)",
            self.working.objects.len(),
            self.path.display(),
            bytes.len()
        );
        Ok(())
    }
}

impl Backend for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn enumerate(&mut self, kind: Option<EntityKind>) -> Result<EntityMap> {
        Ok(self
            .working
            .objects
            .iter()
            .filter(|(_, e)| kind.is_none_or(|k| e.kind() == k))
            .map(|(key, e)| (key.clone(), e.clone()))
            .collect())
    }

    fn stage(&mut self, entity: &Entity) -> Result<()> {
        let key = entity.key_string();
        tracing::debug!("Staging {}", key);
        self.working.objects.insert(key.clone(), entity.clone());
        self.dirty.insert(key);
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        let result = self.check_integrity().and_then(|_| self.write_snapshot());
        match result {
            Ok(()) => {
                self.durable = self.working.clone();
                self.dirty.clear();
                self.dirty_links.clear();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Persist to {} failed, rolling back: {}", self.path.display(), e);
                self.rollback();
                Err(e)
            }
        }
    }

    fn remove(&mut self, entity: Option<&Entity>) -> Result<()> {
        let Some(entity) = entity else {
            return Ok(());
        };
        let removed = self.remove_cascading(entity.kind(), entity.id());
        tracing::debug!("Removed {} ({} entities including cascades)", entity.key_string(), removed);
        Ok(())
    }

    fn reinitialize(&mut self) -> Result<()> {
        let state = match fs::read(&self.path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                Self::from_snapshot(snapshot)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No store at {}, starting empty", self.path.display());
                State::default()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Loaded {} entities from {}", state.objects.len(), self.path.display());
        self.durable = state.clone();
        self.working = state;
        self.dirty.clear();
        self.dirty_links.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.dirty.is_empty() || !self.dirty_links.is_empty() {
            tracing::debug!("Discarding {} unsaved changes", self.dirty.len() + self.dirty_links.len());
        }
        self.rollback();
        Ok(())
    }

    fn link(&mut self, edge: &'static AssociationEdge, left: &Entity, right: &Entity) -> Result<()> {
        let (left, right) = orient(edge, left, right)?;
        let ids = self
            .working
            .links
            .entry((edge.name, left.id().to_string()))
            .or_default();

        if !ids.insert(right.id().to_string()) {
            self.rollback();
            return Err(Error::IntegrityViolation(format!(
                "{} already links {} and {}",
                edge.name,
                left.key_string(),
                right.key_string()
            )));
        }
        self.dirty_links
            .insert((edge.name, left.id().to_string(), right.id().to_string()));
        Ok(())
    }

    fn unlink(&mut self, edge: &'static AssociationEdge, left: &Entity, right: &Entity) -> Result<()> {
        let (left, right) = orient(edge, left, right)?;
        let slot = (edge.name, left.id().to_string());
        if let Some(ids) = self.working.links.get_mut(&slot) {
            ids.remove(right.id());
            if ids.is_empty() {
                self.working.links.remove(&slot);
            }
        }
        Ok(())
    }

    fn related(&mut self, relation: Relation, entity: &Entity) -> Result<EntityMap> {
        let target = check_source(relation, entity)?;
        let mut found = EntityMap::new();

        match relation {
            Relation::Children(edge) => {
                for child in self
                    .scan(edge.child)
                    .filter(|c| c.data().reference(edge.foreign_key) == Some(entity.id()))
                {
                    found.insert(child.key_string(), child.clone());
                }
            }
            Relation::Parent(edge) => {
                let parent_id = entity.data().reference(edge.foreign_key).unwrap_or_default();
                for parent in self.scan(edge.parent).filter(|p| p.id() == parent_id) {
                    found.insert(parent.key_string(), parent.clone());
                }
                if found.is_empty() {
                    tracing::warn!(
                        "{}.{} points at missing {}.{}",
                        entity.key_string(),
                        edge.foreign_key,
                        edge.parent,
                        parent_id
                    );
                }
            }
            Relation::Association(edge) => {
                let wanted: BTreeSet<&str> = if entity.kind() == edge.left {
                    self.working
                        .links
                        .get(&(edge.name, entity.id().to_string()))
                        .map(|ids| ids.iter().map(String::as_str).collect())
                        .unwrap_or_default()
                } else {
                    self.working
                        .links
                        .iter()
                        .filter(|((name, _), ids)| *name == edge.name && ids.contains(entity.id()))
                        .map(|((_, left_id), _)| left_id.as_str())
                        .collect()
                };

                for other in self.scan(target).filter(|o| wanted.contains(o.id())) {
                    found.insert(other.key_string(), other.clone());
                }
                if found.len() < wanted.len() {
                    tracing::warn!(
                        "{} lists {} dangling {} ids for {}",
                        edge.name,
                        wanted.len() - found.len(),
                        target,
                        entity.key_string()
                    );
                }
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Account, Amenity, Listing, Location, Region, Review};

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        let mut store = FileStore::new(dir.path().join("file.json"));
        store.reinitialize().unwrap();
        store
    }

    fn listing_edge() -> &'static AssociationEdge {
        relation::association_between(EntityKind::Listing, EntityKind::Amenity).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert!(store.enumerate(None).unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_enumerate_returns_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let region = Entity::new(Region::new("California"));
        store.stage(&region).unwrap();

        let mut all = store.enumerate(None).unwrap();
        all.clear();
        assert_eq!(store.enumerate(Some(EntityKind::Region)).unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let region = Entity::new(Region::new("California"));
        let location = Entity::new(Location::new(region.id(), "San Francisco"));
        let owner = Entity::new(Account::with_password("host@example.com", "pw"));
        let listing = Entity::new(Listing::new(location.id(), owner.id(), "Loft"));
        let wifi = Entity::new(Amenity::new("Wifi"));
        for e in [&region, &location, &owner, &listing, &wifi] {
            store.stage(e).unwrap();
        }
        store.link(listing_edge(), &listing, &wifi).unwrap();
        store.persist().unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        let record = &raw[region.key_string()];
        assert_eq!(record["name"], "California");
        assert_eq!(record["id"], region.id());
        assert!(record.get("locations").is_none());

        let listing_record = &raw[listing.key_string()];
        assert_eq!(listing_record["amenity_ids"], serde_json::json!([wifi.id()]));
        assert!(!dir.path().join("file.json.tmp").exists());
    }

    #[test]
    fn test_reload_restores_graph() {
        let dir = tempfile::tempdir().unwrap();
        let region = Entity::new(Region::new("California"));
        let location = Entity::new(Location::new(region.id(), "San Francisco"));
        let owner = Entity::new(Account::with_password("host@example.com", "pw"));
        let listing = Entity::new(Listing::new(location.id(), owner.id(), "Loft"));
        let wifi = Entity::new(Amenity::new("Wifi"));
        {
            let mut store = store_in(&dir);
            for e in [&region, &location, &owner, &listing, &wifi] {
                store.stage(e).unwrap();
            }
            store.link(listing_edge(), &listing, &wifi).unwrap();
            store.persist().unwrap();
        }

        let mut store = store_in(&dir);
        let regions = store.enumerate(Some(EntityKind::Region)).unwrap();
        let restored = &regions[&region.key_string()];
        assert_eq!(restored.created_at(), region.created_at());
        assert_eq!(restored.updated_at(), region.updated_at());
        assert_eq!(restored.data(), region.data());

        let rel = relation::relation(EntityKind::Region, EntityKind::Location).unwrap();
        let children = store.related(rel, &region).unwrap();
        assert_eq!(children.len(), 1);

        // amenity_ids on the listing record rebuilds the pair for both directions
        let rel = relation::relation(EntityKind::Listing, EntityKind::Amenity).unwrap();
        let amenities = store.related(rel, &listing).unwrap();
        assert!(amenities.contains_key(&wifi.key_string()));
        let rel = relation::relation(EntityKind::Amenity, EntityKind::Listing).unwrap();
        let listings = store.related(rel, &wifi).unwrap();
        assert_eq!(listings.len(), 1);
        assert!(listings.contains_key(&listing.key_string()));
    }

    #[test]
    fn test_cascade_by_scanning() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let region = Entity::new(Region::new("California"));
        let location = Entity::new(Location::new(region.id(), "San Francisco"));
        let owner = Entity::new(Account::with_password("a@b.c", "pw"));
        let listing = Entity::new(Listing::new(location.id(), owner.id(), "Loft"));
        let review = Entity::new(Review::new(listing.id(), owner.id(), "Great"));
        let pool = Entity::new(Amenity::new("Pool"));
        for e in [&region, &location, &owner, &listing, &review, &pool] {
            store.stage(e).unwrap();
        }
        store.link(listing_edge(), &listing, &pool).unwrap();

        store.remove(Some(&region)).unwrap();

        assert!(store.enumerate(Some(EntityKind::Location)).unwrap().is_empty());
        assert!(store.enumerate(Some(EntityKind::Listing)).unwrap().is_empty());
        assert!(store.enumerate(Some(EntityKind::Review)).unwrap().is_empty());
        assert_eq!(store.enumerate(Some(EntityKind::Amenity)).unwrap().len(), 1);
        assert!(store.working.links.is_empty());
    }

    #[test]
    fn test_remove_none_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.remove(None).unwrap();
        store.remove(Some(&Entity::new(Region::new("Ghost")))).unwrap();
    }

    #[test]
    fn test_persist_rejects_dangling_reference() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let region = Entity::new(Region::new("California"));
        store.stage(&region).unwrap();
        store.persist().unwrap();

        let orphan = Entity::new(Location::new("no-such-region", "Nowhere"));
        store.stage(&orphan).unwrap();
        assert!(matches!(store.persist(), Err(Error::IntegrityViolation(_))));

        // Rolled back to the durable state, and the file still holds it
        assert!(store.enumerate(Some(EntityKind::Location)).unwrap().is_empty());
        let mut reloaded = store_in(&dir);
        assert_eq!(reloaded.count(None).unwrap(), 1);
    }

    #[test]
    fn test_dangling_reference_filtered_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        let listing = Entity::new(Listing::new("gone-location", "gone-owner", "Shack"));
        let mut record: serde_json::Map<String, serde_json::Value> = listing
            .to_attributes()
            .into_iter()
            .map(|(k, v)| (k, v.into()))
            .collect();
        record.insert("amenity_ids".to_string(), serde_json::json!(["gone-amenity"]));
        let mut snapshot = Snapshot::new();
        snapshot.insert(listing.key_string(), record);
        fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        let mut store = FileStore::new(&path);
        store.reinitialize().unwrap();

        let to_location = relation::relation(EntityKind::Listing, EntityKind::Location).unwrap();
        assert!(store.related(to_location, &listing).unwrap().is_empty());
        let to_amenities = relation::relation(EntityKind::Listing, EntityKind::Amenity).unwrap();
        assert!(store.related(to_amenities, &listing).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_link_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let listing = Entity::new(Listing::new("l", "o", "Loft"));
        let wifi = Entity::new(Amenity::new("Wifi"));

        store.link(listing_edge(), &listing, &wifi).unwrap();
        assert!(matches!(
            store.link(listing_edge(), &listing, &wifi),
            Err(Error::IntegrityViolation(_))
        ));
    }

    #[test]
    fn test_failed_write_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let region = Entity::new(Region::new("California"));
        store.stage(&region).unwrap();
        store.persist().unwrap();
        let before = fs::read(store.path()).unwrap();

        // A directory squatting on the temp path makes the write fail
        fs::create_dir(dir.path().join("file.json.tmp")).unwrap();
        store.stage(&Entity::new(Region::new("Nevada"))).unwrap();
        assert!(matches!(store.persist(), Err(Error::Persistence(_))));

        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.count(Some(EntityKind::Region)).unwrap(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.close().unwrap();
        store.close().unwrap();
    }
}
