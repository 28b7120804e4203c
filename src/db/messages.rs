use anyhow::Result;
use chrono::Utc;
use rusqlite::Row;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::models::*;

fn message_from_row(row: &Row) -> rusqlite::Result<ContactMessage> {
    Ok(ContactMessage {
        id: parse_uuid(row.get::<_, String>(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        category: MessageCategory::from_str(&row.get::<_, String>(3)?)
            .unwrap_or(MessageCategory::General),
        subject: row.get(4)?,
        message: row.get(5)?,
        status: MessageStatus::from_str(&row.get::<_, String>(6)?)
            .unwrap_or(MessageStatus::Unread),
        created_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

const MESSAGE_COLUMNS: &str = "id, email, name, category, subject, message, status, created_at";

impl Database {
    // ============================================================
    // Contact message operations
    // ============================================================

    pub fn get_all_messages(&self, filter: &MessageFilter) -> Result<Vec<ContactMessage>> {
        let conn = self.lock();

        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }
        if let Some(category) = filter.category {
            clauses.push("category = ?");
            params.push(Box::new(category.as_str().to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM contact_messages{where_sql} ORDER BY created_at DESC"
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let messages = stmt
            .query_map(params_ref.as_slice(), message_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    pub fn get_message(&self, id: Uuid) -> Result<Option<ContactMessage>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM contact_messages WHERE id = ?"
        ))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(message_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_message(&self, input: CreateMessageInput) -> Result<ContactMessage> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO contact_messages (id, email, name, category, subject, message, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 'unread', ?)",
            (
                id.to_string(),
                &input.email,
                &input.name,
                input.category.as_str(),
                &input.subject,
                &input.message,
                now.to_rfc3339(),
            ),
        )?;

        Ok(ContactMessage {
            id,
            email: input.email,
            name: input.name,
            category: input.category,
            subject: input.subject,
            message: input.message,
            status: MessageStatus::Unread,
            created_at: now,
        })
    }

    pub fn update_message_status(&self, id: Uuid, status: MessageStatus) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute(
            "UPDATE contact_messages SET status = ? WHERE id = ?",
            (status.as_str(), id.to_string()),
        )?;
        Ok(rows > 0)
    }

    pub fn delete_message(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM contact_messages WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
