mod inventory;
mod issues;
mod messages;
mod pages;
mod projects;
mod quests;
mod schema;
mod tags;
mod views;

pub use views::{quest_progress, section_issues};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::models::Tag;

/// Handle to the embedded store. Cheap to clone; all clones share one
/// connection behind a mutex.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "questlog")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("questlog.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Settings (single-row key/value store)
    // ============================================================

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

// ============================================================
// Row-mapping helpers shared by the entity modules
// ============================================================

pub(crate) fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

pub(crate) fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or_default()
}

/// Load the tags joined to one entity row via the given link table.
pub(crate) fn load_tags(
    conn: &Connection,
    link_table: &str,
    fk_column: &str,
    owner_id: Uuid,
) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT t.id, t.name, t.color, t.created_at
         FROM tags t JOIN {link_table} l ON l.tag_id = t.id
         WHERE l.{fk_column} = ? ORDER BY t.name"
    ))?;

    let tags = stmt
        .query_map([owner_id.to_string()], |row| {
            Ok(Tag {
                id: parse_uuid(row.get::<_, String>(0)?),
                name: row.get(1)?,
                color: row.get(2)?,
                created_at: parse_datetime(row.get::<_, String>(3)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tags)
}

/// Replace-all tag semantics: delete every existing link for the owner
/// and re-insert the given set. An empty set therefore clears all tags;
/// callers that want "leave unchanged" skip the call entirely.
pub(crate) fn replace_tags(
    conn: &Connection,
    link_table: &str,
    fk_column: &str,
    owner_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<()> {
    conn.execute(
        &format!("DELETE FROM {link_table} WHERE {fk_column} = ?"),
        [owner_id.to_string()],
    )?;
    for tag_id in tag_ids {
        conn.execute(
            &format!("INSERT OR IGNORE INTO {link_table} ({fk_column}, tag_id) VALUES (?, ?)"),
            (owner_id.to_string(), tag_id.to_string()),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_survive_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("data").join("questlog.db");

        {
            let db = Database::open(path.clone()).expect("Failed to open database");
            db.migrate().expect("Failed to migrate");
            db.set_setting("greeting", "hello").expect("Failed to set");
        }

        let db = Database::open(path).expect("Failed to reopen database");
        db.migrate().expect("Failed to migrate");
        assert_eq!(
            db.get_setting("greeting").expect("Failed to get").as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn set_setting_overwrites() {
        let db = Database::open_memory().expect("Failed to open database");
        db.migrate().expect("Failed to migrate");

        db.set_setting("key", "one").expect("Failed to set");
        db.set_setting("key", "two").expect("Failed to set");
        assert_eq!(
            db.get_setting("key").expect("Failed to get").as_deref(),
            Some("two")
        );
    }

    #[test]
    fn missing_setting_is_none() {
        let db = Database::open_memory().expect("Failed to open database");
        db.migrate().expect("Failed to migrate");
        assert!(db.get_setting("absent").expect("Failed to get").is_none());
    }
}
