use crate::media::{DirectoryAccess, LocalDirectory};
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Version 2 gave the store an explicit primary key. Older stores are reset.
pub const SCHEMA_VERSION: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub last_accessed: i64, // epoch milliseconds
    pub location: PathBuf,
}

impl FolderRecord {
    pub fn for_directory(dir: &dyn DirectoryAccess, last_accessed: i64) -> Self {
        let name = dir.name();
        Self {
            id: name.clone(),
            name,
            last_accessed,
            location: dir.location(),
        }
    }

    pub fn last_accessed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_accessed).single()
    }

    /// Reopen the saved capability.
    pub fn open(&self) -> LocalDirectory {
        LocalDirectory::open(&self.location)
    }
}

pub struct FolderRegistry {
    conn: Connection,
}

impl FolderRegistry {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let registry = Self { conn };
        registry.migrate()?;
        Ok(registry)
    }

    fn migrate(&self) -> Result<()> {
        let version: i32 = self.conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version >= SCHEMA_VERSION {
            return Ok(());
        }

        if version > 0 {
            info!("Folder store is at schema v{}, resetting to v{}", version, SCHEMA_VERSION);
        }

        // Drop and recreate: v1 rows had no usable key and are not carried over
        self.conn.execute_batch(&format!(
            "BEGIN;
             DROP TABLE IF EXISTS folders;
             CREATE TABLE folders (
                 id TEXT PRIMARY KEY,
                 name TEXT NOT NULL,
                 last_accessed INTEGER NOT NULL,
                 location TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_folders_last_accessed ON folders(last_accessed);
             PRAGMA user_version = {};
             COMMIT;",
            SCHEMA_VERSION
        ))?;

        Ok(())
    }

    /// Save `dir` as accessed now, replacing any record with the same id.
    pub async fn upsert(&self, dir: &dyn DirectoryAccess) -> Result<FolderRecord> {
        let record = FolderRecord::for_directory(dir, Utc::now().timestamp_millis());
        self.upsert_record(&record).await?;
        Ok(record)
    }

    pub async fn upsert_record(&self, record: &FolderRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO folders (id, name, last_accessed, location)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.name,
                record.last_accessed,
                record.location.to_string_lossy().into_owned(),
            ],
        )?;
        info!("Saved folder '{}' ({})", record.name, record.location.display());
        Ok(())
    }

    /// All records, most recently accessed first.
    pub async fn list_all(&self) -> Result<Vec<FolderRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, last_accessed, location FROM folders ORDER BY last_accessed DESC",
        )?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<Option<FolderRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, last_accessed, location FROM folders WHERE id = ?1",
        )?;

        let record = stmt.query_row(params![id], Self::row_to_record).optional()?;
        Ok(record)
    }

    pub async fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM folders WHERE id = ?1", params![id])?;
        if removed > 0 {
            info!("Forgot folder '{}'", id);
        }
        Ok(removed > 0)
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<FolderRecord> {
        let location: String = row.get(3)?;
        Ok(FolderRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            last_accessed: row.get(2)?,
            location: PathBuf::from(location),
        })
    }
}
