//! SQLite storage implementation
//!
//! A session is one open SQLite transaction. Staged writes, removals and
//! association changes run inside it and are visible only on this
//! connection until `persist` commits. Foreign keys are deferred to commit
//! time, so parents and children can be staged in any order; cascades and
//! join-row cleanup are left to the `ON DELETE CASCADE` clauses the schema
//! declares.

use super::{check_source, orient, schema, Backend, EntityMap};
use crate::config::{RelationalConfig, ensure_store_dir};
use crate::entity::{Attributes, Entity, Scalar};
use crate::kind::EntityKind;
use crate::relation::{AssociationEdge, Relation};
use crate::{Error, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, ToSql, params, params_from_iter};

impl ToSql for Scalar {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Scalar::Null => ToSqlOutput::Owned(Value::Null),
            Scalar::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Scalar::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Scalar::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl FromSql for Scalar {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Scalar::Null),
            ValueRef::Integer(i) => Ok(Scalar::Integer(i)),
            ValueRef::Real(f) => Ok(Scalar::Float(f)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| Scalar::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

/// Bookkeeping for the open transaction
#[derive(Debug, Default)]
struct Session {
    writes: usize,
}

/// SQLite-backed storage with schema-enforced relationships
pub struct SqliteStore {
    conn: Connection,
    session: Option<Session>,
    location: String,
}

impl SqliteStore {
    /// Open the configured database. In test mode every table is dropped first.
    pub fn connect(config: &RelationalConfig) -> Result<Self> {
        let store = match config.database_path() {
            Some(path) => {
                ensure_store_dir(&path)?;
                Self::from_connection(Connection::open(&path)?, path.display().to_string())?
            }
            None => Self::from_connection(Connection::open_in_memory()?, ":memory:".to_string())?,
        };
        tracing::info!("Connected to {}", config.describe());

        if config.test_mode {
            store.drop_all()?;
        }
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, location: String) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            session: None,
            location,
        })
    }

    /// Drop every declared table
    fn drop_all(&self) -> Result<()> {
        tracing::warn!("Test mode: dropping all tables in {}", self.location);
        for stmt in schema::drop_statements() {
            self.conn.execute(&stmt, [])?;
        }
        Ok(())
    }

    /// Create any missing tables and indexes
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(&stmt, [])?;
        }
        tracing::info!("Schema ready in {}", self.location);
        Ok(())
    }

    // ========== Session ==========

    fn begin_session(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN; PRAGMA defer_foreign_keys = ON;")?;
        self.session = Some(Session::default());
        tracing::debug!("Opened session on {}", self.location);
        Ok(())
    }

    fn ensure_session(&mut self) -> Result<()> {
        if self.session.is_none() {
            self.begin_session()?;
        }
        Ok(())
    }

    /// Roll back whatever the open transaction holds
    fn rollback(&mut self) -> Result<()> {
        let session = self.session.take();
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK;")?;
            if let Some(session) = session {
                tracing::debug!("Rolled back session with {} writes", session.writes);
            }
        }
        Ok(())
    }

    /// An integrity failure aborts the whole session
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(Error::IntegrityViolation(msg)) = &result {
            tracing::warn!("Aborting session: {}", msg);
            self.rollback()?;
        }
        result
    }

    fn record_write(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.writes += 1;
        }
    }

    // ========== Queries ==========

    /// Run `SELECT <kind columns> FROM <table> t <tail>` and rebuild entities
    fn query_entities(&self, kind: EntityKind, tail: &str, args: &[&dyn ToSql]) -> Result<EntityMap> {
        let cols = schema::columns(kind);
        let select = cols.iter().map(|c| format!("t.{}", c)).collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT {} FROM {} t {}", select, kind.table_name(), tail);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(args, |row| {
                let mut attrs = Attributes::new();
                for (i, col) in cols.iter().enumerate() {
                    attrs.insert(col.to_string(), row.get::<_, Scalar>(i)?);
                }
                Ok(attrs)
            })?
            .collect::<rusqlite::Result<Vec<Attributes>>>()?;

        let mut entities = EntityMap::new();
        for attrs in rows {
            let entity = Entity::from_attributes(kind, &attrs)?;
            entities.insert(entity.key_string(), entity);
        }
        Ok(entities)
    }

    fn upsert(&self, entity: &Entity) -> Result<()> {
        let kind = entity.kind();
        let cols = schema::columns(kind);
        let placeholders = (1..=cols.len()).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ");
        let updates = cols
            .iter()
            .filter(|c| !matches!(**c, "id" | "created_at"))
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}",
            kind.table_name(),
            cols.join(", "),
            placeholders,
            updates
        );

        let attrs = entity.to_attributes();
        let values: Vec<&Scalar> = cols.iter().map(|c| attrs.get(*c).unwrap_or(&Scalar::Null)).collect();
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }
}

impl Backend for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn enumerate(&mut self, kind: Option<EntityKind>) -> Result<EntityMap> {
        self.ensure_session()?;
        let kinds = match kind {
            Some(k) => vec![k],
            None => EntityKind::all().to_vec(),
        };

        let mut all = EntityMap::new();
        for k in kinds {
            all.extend(self.query_entities(k, "", &[])?);
        }
        Ok(all)
    }

    fn stage(&mut self, entity: &Entity) -> Result<()> {
        self.ensure_session()?;
        tracing::debug!("Staging {}", entity.key_string());
        let result = self.upsert(entity);
        self.guard(result)?;
        self.record_write();
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        match self.conn.execute_batch("COMMIT;") {
            Ok(()) => {
                tracing::info!("Committed {} writes to {}", session.writes, self.location);
                Ok(())
            }
            Err(e) => {
                let err = Error::from(e);
                tracing::warn!("Commit to {} failed, rolling back: {}", self.location, err);
                if !self.conn.is_autocommit() {
                    self.conn.execute_batch("ROLLBACK;")?;
                }
                Err(err)
            }
        }
    }

    fn remove(&mut self, entity: Option<&Entity>) -> Result<()> {
        let Some(entity) = entity else {
            return Ok(());
        };
        self.ensure_session()?;

        let sql = format!("DELETE FROM {} WHERE id = ?1", entity.kind().table_name());
        let result = self.conn.execute(&sql, [entity.id()]).map_err(Error::from);
        let deleted = self.guard(result)?;
        tracing::debug!("Removed {} ({} rows)", entity.key_string(), deleted);
        self.record_write();
        Ok(())
    }

    fn reinitialize(&mut self) -> Result<()> {
        self.rollback()?;
        self.initialize_schema()?;
        self.begin_session()
    }

    fn close(&mut self) -> Result<()> {
        self.rollback()
    }

    fn link(&mut self, edge: &'static AssociationEdge, left: &Entity, right: &Entity) -> Result<()> {
        let (left, right) = orient(edge, left, right)?;
        self.ensure_session()?;

        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            edge.name, edge.left_column, edge.right_column
        );
        let result = self.conn.execute(&sql, params![left.id(), right.id()]).map_err(Error::from);
        self.guard(result)?;
        self.record_write();
        Ok(())
    }

    fn unlink(&mut self, edge: &'static AssociationEdge, left: &Entity, right: &Entity) -> Result<()> {
        let (left, right) = orient(edge, left, right)?;
        self.ensure_session()?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
            edge.name, edge.left_column, edge.right_column
        );
        self.conn.execute(&sql, params![left.id(), right.id()])?;
        self.record_write();
        Ok(())
    }

    fn related(&mut self, relation: Relation, entity: &Entity) -> Result<EntityMap> {
        let target = check_source(relation, entity)?;
        self.ensure_session()?;

        match relation {
            Relation::Children(edge) => {
                let tail = format!("WHERE t.{} = ?1", edge.foreign_key);
                self.query_entities(target, &tail, &[&entity.id()])
            }
            Relation::Parent(edge) => {
                let parent_id = entity.data().reference(edge.foreign_key).unwrap_or_default();
                self.query_entities(target, "WHERE t.id = ?1", &[&parent_id])
            }
            Relation::Association(edge) => {
                let (source_col, target_col) = if entity.kind() == edge.left {
                    (edge.left_column, edge.right_column)
                } else {
                    (edge.right_column, edge.left_column)
                };
                let tail = format!(
                    "JOIN {join} j ON j.{target_col} = t.id WHERE j.{source_col} = ?1",
                    join = edge.name,
                    target_col = target_col,
                    source_col = source_col
                );
                self.query_entities(target, &tail, &[&entity.id()])
            }
        }
    }

    fn get(&mut self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        self.ensure_session()?;
        Ok(self
            .query_entities(kind, "WHERE t.id = ?1", &[&id])?
            .into_values()
            .next())
    }

    fn count(&mut self, kind: Option<EntityKind>) -> Result<usize> {
        self.ensure_session()?;
        let kinds = match kind {
            Some(k) => vec![k],
            None => EntityKind::all().to_vec(),
        };

        let mut total = 0;
        for k in kinds {
            let sql = format!("SELECT COUNT(*) FROM {}", k.table_name());
            let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
            total += count as usize;
        }
        Ok(total)
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if let Err(e) = self.rollback() {
            tracing::warn!("Failed to release session on {}: {}", self.location, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Account, Amenity, Listing, Location, Region, Review};
    use crate::relation;

    fn store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.reinitialize().unwrap();
        store
    }

    fn edge() -> &'static AssociationEdge {
        relation::association_between(EntityKind::Listing, EntityKind::Amenity).unwrap()
    }

    /// Region → Location → Listing (owned by an account)
    fn seed(store: &mut SqliteStore) -> (Entity, Entity, Entity, Entity) {
        let region = Entity::new(Region::new("California"));
        let location = Entity::new(Location::new(region.id(), "San Francisco"));
        let owner = Entity::new(Account::with_password("host@example.com", "pw"));
        let listing = Entity::new(Listing::new(location.id(), owner.id(), "Loft"));
        for e in [&region, &location, &owner, &listing] {
            store.stage(e).unwrap();
        }
        store.persist().unwrap();
        (region, location, owner, listing)
    }

    #[test]
    fn test_stage_and_enumerate_all_rows() {
        let mut store = store();
        for name in ["Wifi", "Pool", "Kitchen"] {
            store.stage(&Entity::new(Amenity::new(name))).unwrap();
        }
        store.persist().unwrap();

        let amenities = store.enumerate(Some(EntityKind::Amenity)).unwrap();
        assert_eq!(amenities.len(), 3);
        assert_eq!(store.count(None).unwrap(), 3);
    }

    #[test]
    fn test_stage_updates_existing_row() {
        let mut store = store();
        let (region, location, _, _) = seed(&mut store);

        let mut renamed = region.clone();
        renamed.set_attribute("name", "Golden State").unwrap();
        store.stage(&renamed).unwrap();
        store.persist().unwrap();

        let fetched = store.get(EntityKind::Region, region.id()).unwrap().unwrap();
        assert_eq!(fetched.name(), Some("Golden State"));
        assert_eq!(fetched.created_at(), region.created_at());
        // Upsert must not fire the cascade a REPLACE would
        assert!(store.get(EntityKind::Location, location.id()).unwrap().is_some());
    }

    #[test]
    fn test_cascade_from_region() {
        let mut store = store();
        let (region, _, owner, listing) = seed(&mut store);
        let review = Entity::new(Review::new(listing.id(), owner.id(), "Lovely"));
        let wifi = Entity::new(Amenity::new("Wifi"));
        store.stage(&review).unwrap();
        store.stage(&wifi).unwrap();
        store.link(edge(), &listing, &wifi).unwrap();
        store.persist().unwrap();

        store.remove(Some(&region)).unwrap();
        store.persist().unwrap();

        assert_eq!(store.count(Some(EntityKind::Location)).unwrap(), 0);
        assert_eq!(store.count(Some(EntityKind::Listing)).unwrap(), 0);
        assert_eq!(store.count(Some(EntityKind::Review)).unwrap(), 0);
        assert_eq!(store.count(Some(EntityKind::Amenity)).unwrap(), 1);
        let pairs: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM listing_amenities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(pairs, 0);
    }

    #[test]
    fn test_dangling_reference_fails_at_persist() {
        let mut store = store();
        let orphan = Entity::new(Location::new("no-such-region", "Nowhere"));
        store.stage(&orphan).unwrap();

        assert!(matches!(store.persist(), Err(Error::IntegrityViolation(_))));
        assert_eq!(store.count(Some(EntityKind::Location)).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_pair_aborts_session() {
        let mut store = store();
        let (_, _, _, listing) = seed(&mut store);
        let wifi = Entity::new(Amenity::new("Wifi"));
        store.stage(&wifi).unwrap();
        store.link(edge(), &listing, &wifi).unwrap();
        store.persist().unwrap();

        let pool = Entity::new(Amenity::new("Pool"));
        store.stage(&pool).unwrap();
        assert!(matches!(store.link(edge(), &listing, &wifi), Err(Error::IntegrityViolation(_))));

        // The pool amenity was staged in the aborted session
        assert!(store.get(EntityKind::Amenity, pool.id()).unwrap().is_none());
        assert_eq!(store.count(Some(EntityKind::Amenity)).unwrap(), 1);
    }

    #[test]
    fn test_close_discards_uncommitted() {
        let mut store = store();
        store.stage(&Entity::new(Region::new("Oregon"))).unwrap();
        store.close().unwrap();
        store.close().unwrap();
        assert_eq!(store.count(None).unwrap(), 0);
    }

    #[test]
    fn test_persist_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelationalConfig {
            host: Some(dir.path().to_path_buf()),
            database: "lodgebook".to_string(),
            ..RelationalConfig::in_memory()
        };

        let region = Entity::new(Region::new("California"));
        {
            let mut store = SqliteStore::connect(&config).unwrap();
            store.reinitialize().unwrap();
            store.stage(&region).unwrap();
            store.persist().unwrap();
            store.close().unwrap();
        }

        let mut store = SqliteStore::connect(&config).unwrap();
        store.reinitialize().unwrap();
        let fetched = store.get(EntityKind::Region, region.id()).unwrap().unwrap();
        assert_eq!(fetched.updated_at(), region.updated_at());

        // Test mode starts from a clean slate
        drop(store);
        let mut store = SqliteStore::connect(&RelationalConfig { test_mode: true, ..config }).unwrap();
        store.reinitialize().unwrap();
        assert_eq!(store.count(None).unwrap(), 0);
    }

    #[test]
    fn test_related_through_join() {
        let mut store = store();
        let (_, location, _, listing) = seed(&mut store);
        let wifi = Entity::new(Amenity::new("Wifi"));
        let pool = Entity::new(Amenity::new("Pool"));
        store.stage(&wifi).unwrap();
        store.stage(&pool).unwrap();
        store.link(edge(), &listing, &wifi).unwrap();
        store.link(edge(), &pool, &listing).unwrap();
        store.persist().unwrap();

        let rel = relation::relation(EntityKind::Listing, EntityKind::Amenity).unwrap();
        assert_eq!(store.related(rel, &listing).unwrap().len(), 2);

        let rel = relation::relation(EntityKind::Amenity, EntityKind::Listing).unwrap();
        let listings = store.related(rel, &pool).unwrap();
        assert!(listings.contains_key(&listing.key_string()));

        let rel = relation::relation(EntityKind::Listing, EntityKind::Location).unwrap();
        let parents = store.related(rel, &listing).unwrap();
        assert_eq!(parents.len(), 1);
        assert!(parents.contains_key(&location.key_string()));
    }
}
