mod categories;
mod lego_sets;
mod schema;
mod sql;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::Connection;

use crate::config::NamingConfig;
use crate::events::Interceptors;
use crate::ids::{IdAssigner, IdSequence};
use crate::models::{LegoSet, Persistent};
use crate::naming::NamingStrategy;

use sql::{quote, Mapping};

/// Handle to the embedded store. Cloning shares the connection, naming,
/// id sequence and interceptors.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    naming: Arc<NamingStrategy>,
    ids: IdAssigner,
    interceptors: Arc<Interceptors>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "aggregates")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("aggregates.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let ids = IdAssigner::new(Arc::new(IdSequence::new()));
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            naming: Arc::new(NamingStrategy::from(&NamingConfig::default())),
            interceptors: Arc::new(Interceptors::standard()),
            ids,
        })
    }

    /// Replaces the naming strategy. Call before [`Database::migrate`].
    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    /// Shares `sequence` for new set ids. Every `AssignIds` hook draws from
    /// it, whatever interceptor list is installed.
    pub fn with_id_sequence(mut self, sequence: Arc<IdSequence>) -> Self {
        self.ids = IdAssigner::new(sequence);
        self
    }

    /// Replaces the pre-save hooks. The id sequence is kept.
    pub fn with_interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = Arc::new(interceptors);
        self
    }

    pub fn naming(&self) -> &NamingStrategy {
        &self.naming
    }

    pub fn id_assigner(&self) -> &IdAssigner {
        &self.ids
    }

    /// Applies pending migrations and moves the id sequence past every
    /// persisted set.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn, &self.naming)?;

        let sets = Mapping::of::<LegoSet>(&self.naming);
        let max_id: Option<i64> = conn.query_row(
            &format!(
                "SELECT MAX({}) FROM {}",
                quote(sets.id_column()),
                quote(&sets.table)
            ),
            [],
            |row| row.get(0),
        )?;
        if let Some(max_id) = max_id {
            self.ids.sequence().advance_to(max_id);
            tracing::debug!(
                "Id sequence for {} advanced to {}",
                LegoSet::TYPE_NAME,
                max_id
            );
        }
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            naming: self.naming.clone(),
            ids: self.ids.clone(),
            interceptors: self.interceptors.clone(),
        }
    }
}
