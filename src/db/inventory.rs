use anyhow::Result;
use chrono::Utc;
use rusqlite::Row;
use uuid::Uuid;

use super::{load_tags, parse_datetime, parse_uuid, replace_tags, Database};
use crate::models::*;

fn item_from_row(row: &Row) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: parse_uuid(row.get::<_, String>(0)?),
        item_name: row.get(1)?,
        title: row.get(2)?,
        item_type: ItemType::from_str(&row.get::<_, String>(3)?).unwrap_or(ItemType::Inventory),
        visibility: Visibility::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(Visibility::Private),
        icon: row.get(5)?,
        popup_content: row.get(6)?,
        position: row.get(7)?,
        tags: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

const ITEM_COLUMNS: &str = "id, item_name, title, item_type, visibility, icon, popup_content, \
                            position, created_at, updated_at";

impl Database {
    // ============================================================
    // Inventory item operations
    // ============================================================

    pub fn get_all_items(&self, filter: &ItemFilter) -> Result<Vec<InventoryItem>> {
        let conn = self.lock();

        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(item_type) = filter.item_type {
            clauses.push("item_type = ?");
            params.push(Box::new(item_type.as_str().to_string()));
        }
        if let Some(visibility) = filter.visibility {
            clauses.push("visibility = ?");
            params.push(Box::new(visibility.as_str().to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items{where_sql} ORDER BY item_type, position"
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut items = stmt
            .query_map(params_ref.as_slice(), item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for item in &mut items {
            item.tags = load_tags(&conn, "item_tags", "item_id", item.id)?;
        }
        Ok(items)
    }

    pub fn get_item(&self, id: Uuid) -> Result<Option<InventoryItem>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut item = item_from_row(row)?;
            item.tags = load_tags(&conn, "item_tags", "item_id", item.id)?;
            Ok(Some(item))
        } else {
            Ok(None)
        }
    }

    pub fn create_item(&self, input: CreateItemInput) -> Result<InventoryItem> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let visibility = input.visibility.unwrap_or(Visibility::Private);

        let position = match input.position {
            Some(p) => p,
            None => conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM inventory_items WHERE item_type = ?",
                [input.item_type.as_str()],
                |row| row.get(0),
            )?,
        };

        conn.execute(
            "INSERT INTO inventory_items (id, item_name, title, item_type, visibility, icon, popup_content, position, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.item_name,
                &input.title,
                input.item_type.as_str(),
                visibility.as_str(),
                &input.icon,
                &input.popup_content,
                position,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        let tag_ids = input.tag_ids.unwrap_or_default();
        replace_tags(&conn, "item_tags", "item_id", id, &tag_ids)?;
        let tags = load_tags(&conn, "item_tags", "item_id", id)?;

        Ok(InventoryItem {
            id,
            item_name: input.item_name,
            title: input.title,
            item_type: input.item_type,
            visibility,
            icon: input.icon,
            popup_content: input.popup_content,
            position,
            tags,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_item(&self, id: Uuid, input: UpdateItemInput) -> Result<Option<InventoryItem>> {
        let Some(existing) = self.get_item(id)? else {
            return Ok(None);
        };

        let conn = self.lock();
        let now = Utc::now();
        let item_name = input.item_name.unwrap_or(existing.item_name);
        let title = input.title.unwrap_or(existing.title);
        let visibility = input.visibility.unwrap_or(existing.visibility);
        let icon = input.icon.unwrap_or(existing.icon);
        let popup_content = input.popup_content.or(existing.popup_content);

        conn.execute(
            "UPDATE inventory_items SET item_name = ?, title = ?, visibility = ?, icon = ?, popup_content = ?, updated_at = ? WHERE id = ?",
            (
                &item_name,
                &title,
                visibility.as_str(),
                &icon,
                &popup_content,
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        if let Some(tag_ids) = &input.tag_ids {
            replace_tags(&conn, "item_tags", "item_id", id, tag_ids)?;
        }
        let tags = load_tags(&conn, "item_tags", "item_id", id)?;

        Ok(Some(InventoryItem {
            id,
            item_name,
            title,
            item_type: existing.item_type,
            visibility,
            icon,
            popup_content,
            position: existing.position,
            tags,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_item(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM inventory_items WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Rewrite display positions for one item type in a single
    /// transaction, all-or-nothing. Every item of the type must appear
    /// in the new order exactly once.
    pub fn reorder_items(&self, input: &ReorderItemsInput) -> Result<Vec<InventoryItem>> {
        let mut conn = self.lock();

        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM inventory_items WHERE item_type = ?",
            [input.item_type.as_str()],
            |row| row.get(0),
        )?;
        let distinct: std::collections::HashSet<Uuid> =
            input.item_ids.iter().copied().collect();
        if existing != input.item_ids.len() as i64 || distinct.len() != input.item_ids.len() {
            anyhow::bail!("Reorder must include every item of the type exactly once");
        }

        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        for (position, id) in input.item_ids.iter().enumerate() {
            let rows = tx.execute(
                "UPDATE inventory_items SET position = ?, updated_at = ? WHERE id = ? AND item_type = ?",
                (
                    position as i64,
                    &now,
                    id.to_string(),
                    input.item_type.as_str(),
                ),
            )?;
            if rows == 0 {
                anyhow::bail!("Item {} is not a {} item", id, input.item_type.as_str());
            }
        }
        tx.commit()?;
        drop(conn);

        self.get_all_items(&ItemFilter {
            item_type: Some(input.item_type),
            visibility: None,
        })
    }
}
