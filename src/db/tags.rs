use anyhow::Result;
use chrono::Utc;
use rusqlite::Row;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::models::*;

fn tag_from_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}

impl Database {
    // ============================================================
    // Tag operations
    // ============================================================

    pub fn get_all_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT id, name, color, created_at FROM tags ORDER BY name")?;

        let tags = stmt
            .query_map([], tag_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    pub fn get_tag(&self, id: Uuid) -> Result<Option<Tag>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT id, name, color, created_at FROM tags WHERE id = ?")?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(tag_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_tag(&self, input: CreateTagInput) -> Result<Tag> {
        let conn = self.lock();

        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tags WHERE name = ?",
            [&input.name],
            |row| row.get(0),
        )?;
        if taken > 0 {
            anyhow::bail!("Tag name already exists");
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO tags (id, name, color, created_at) VALUES (?, ?, ?, ?)",
            (id.to_string(), &input.name, &input.color, now.to_rfc3339()),
        )?;

        Ok(Tag {
            id,
            name: input.name,
            color: input.color,
            created_at: now,
        })
    }

    pub fn update_tag(&self, id: Uuid, input: UpdateTagInput) -> Result<Option<Tag>> {
        let Some(existing) = self.get_tag(id)? else {
            return Ok(None);
        };

        let conn = self.lock();
        let name = input.name.unwrap_or(existing.name);
        let color = input.color.unwrap_or(existing.color);

        conn.execute(
            "UPDATE tags SET name = ?, color = ? WHERE id = ?",
            (&name, &color, id.to_string()),
        )?;

        Ok(Some(Tag {
            id,
            name,
            color,
            created_at: existing.created_at,
        }))
    }

    /// Delete a tag. All of its entity links cascade.
    pub fn delete_tag(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM tags WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
