use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{load_tags, parse_date, parse_datetime, parse_uuid, replace_tags, Database};
use crate::models::*;

pub(super) fn page_from_row(row: &Row) -> rusqlite::Result<Page> {
    Ok(Page {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        page_type: PageType::from_str(&row.get::<_, String>(2)?).unwrap_or(PageType::Notes),
        content: row.get(3)?,
        visibility: Visibility::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(Visibility::Private),
        project_status: row
            .get::<_, Option<String>>(5)?
            .as_deref()
            .and_then(ProjectStatus::from_str),
        project_start_date: row.get::<_, Option<String>>(6)?.map(parse_date),
        project_end_date: row.get::<_, Option<String>>(7)?.map(parse_date),
        tags: Vec::new(),
        connections: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

pub(super) const PAGE_COLUMNS: &str = "id, title, page_type, content, visibility, project_status, \
                            project_start_date, project_end_date, created_at, updated_at";

fn connection_from_row(row: &Row) -> rusqlite::Result<PageConnection> {
    let kind: String = row.get(2)?;
    let target_id = parse_uuid(row.get::<_, String>(3)?);
    Ok(PageConnection {
        id: parse_uuid(row.get::<_, String>(0)?),
        page_id: parse_uuid(row.get::<_, String>(1)?),
        // Unknown kinds cannot appear; the insert path writes the enum
        target: AttachTarget::from_parts(&kind, target_id)
            .unwrap_or(AttachTarget::Project(target_id)),
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

pub(super) fn load_connections(conn: &Connection, page_id: Uuid) -> Result<Vec<PageConnection>> {
    let mut stmt = conn.prepare(
        "SELECT id, page_id, target_type, target_id, created_at
         FROM page_connections WHERE page_id = ? ORDER BY created_at",
    )?;

    let connections = stmt
        .query_map([page_id.to_string()], connection_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(connections)
}

pub(super) fn hydrate_pages(conn: &Connection, mut pages: Vec<Page>) -> Result<Vec<Page>> {
    for page in &mut pages {
        page.tags = load_tags(conn, "page_tags", "page_id", page.id)?;
        page.connections = load_connections(conn, page.id)?;
    }
    Ok(pages)
}

impl Database {
    // ============================================================
    // Page operations
    // ============================================================

    pub fn get_all_pages(&self, filter: &PageFilter) -> Result<Vec<Page>> {
        let conn = self.lock();

        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(page_type) = filter.page_type {
            clauses.push("page_type = ?");
            params.push(Box::new(page_type.as_str().to_string()));
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
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages{where_sql} ORDER BY updated_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let pages = stmt
            .query_map(params_ref.as_slice(), page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        hydrate_pages(&conn, pages)
    }

    pub fn get_page(&self, id: Uuid) -> Result<Option<Page>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let page = page_from_row(row)?;
            let mut pages = hydrate_pages(&conn, vec![page])?;
            Ok(pages.pop())
        } else {
            Ok(None)
        }
    }

    pub fn create_page(&self, input: CreatePageInput) -> Result<Page> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let visibility = input.visibility.unwrap_or(Visibility::Private);

        conn.execute(
            "INSERT INTO pages (id, title, page_type, content, visibility, project_status, project_start_date, project_end_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.title,
                input.page_type.as_str(),
                &input.content,
                visibility.as_str(),
                input.project_status.map(|s| s.as_str().to_string()),
                input.project_start_date.map(|d| d.to_string()),
                input.project_end_date.map(|d| d.to_string()),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        let tag_ids = input.tag_ids.unwrap_or_default();
        replace_tags(&conn, "page_tags", "page_id", id, &tag_ids)?;
        let tags = load_tags(&conn, "page_tags", "page_id", id)?;

        Ok(Page {
            id,
            title: input.title,
            page_type: input.page_type,
            content: input.content,
            visibility,
            project_status: input.project_status,
            project_start_date: input.project_start_date,
            project_end_date: input.project_end_date,
            tags,
            connections: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_page(&self, id: Uuid, input: UpdatePageInput) -> Result<Option<Page>> {
        let Some(existing) = self.get_page(id)? else {
            return Ok(None);
        };

        let conn = self.lock();
        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);
        let page_type = input.page_type.unwrap_or(existing.page_type);
        let content = input.content.unwrap_or(existing.content);
        let visibility = input.visibility.unwrap_or(existing.visibility);
        let project_status = input.project_status.or(existing.project_status);
        let project_start_date = input.project_start_date.or(existing.project_start_date);
        let project_end_date = input.project_end_date.or(existing.project_end_date);

        conn.execute(
            "UPDATE pages SET title = ?, page_type = ?, content = ?, visibility = ?, project_status = ?, project_start_date = ?, project_end_date = ?, updated_at = ? WHERE id = ?",
            (
                &title,
                page_type.as_str(),
                &content,
                visibility.as_str(),
                project_status.map(|s| s.as_str().to_string()),
                project_start_date.map(|d| d.to_string()),
                project_end_date.map(|d| d.to_string()),
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        if let Some(tag_ids) = &input.tag_ids {
            replace_tags(&conn, "page_tags", "page_id", id, tag_ids)?;
        }
        let tags = load_tags(&conn, "page_tags", "page_id", id)?;
        let connections = load_connections(&conn, id)?;

        Ok(Some(Page {
            id,
            title,
            page_type,
            content,
            visibility,
            project_status,
            project_start_date,
            project_end_date,
            tags,
            connections,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_page(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM pages WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Page connection operations
    // ============================================================

    pub fn get_page_connections(&self, page_id: Uuid) -> Result<Vec<PageConnection>> {
        let conn = self.lock();
        load_connections(&conn, page_id)
    }

    pub fn connect_page(
        &self,
        page_id: Uuid,
        input: CreatePageConnectionInput,
    ) -> Result<PageConnection> {
        self.get_page(page_id)?
            .ok_or_else(|| anyhow::anyhow!("Page not found"))?;
        match input.target {
            AttachTarget::Project(id) => {
                self.get_project(id)?
                    .ok_or_else(|| anyhow::anyhow!("Target project not found"))?;
            }
            AttachTarget::Quest(id) => {
                self.get_quest(id)?
                    .ok_or_else(|| anyhow::anyhow!("Target quest not found"))?;
            }
        }

        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO page_connections (id, page_id, target_type, target_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                page_id.to_string(),
                input.target.kind(),
                input.target.id().to_string(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(PageConnection {
            id,
            page_id,
            target: input.target,
            created_at: now,
        })
    }

    pub fn disconnect_page(&self, connection_id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute(
            "DELETE FROM page_connections WHERE id = ?",
            [connection_id.to_string()],
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Devlog work-link operations
    // ============================================================

    pub fn get_devlog_issue_links(&self, page_id: Uuid) -> Result<Vec<DevlogIssueLink>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, page_id, issue_id, status_change, work_notes, created_at
             FROM devlog_issue_links WHERE page_id = ? ORDER BY created_at",
        )?;

        let links = stmt
            .query_map([page_id.to_string()], |row| {
                Ok(DevlogIssueLink {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    page_id: parse_uuid(row.get::<_, String>(1)?),
                    issue_id: parse_uuid(row.get::<_, String>(2)?),
                    status_change: row
                        .get::<_, Option<String>>(3)?
                        .as_deref()
                        .and_then(IssueStatus::from_str),
                    work_notes: row.get(4)?,
                    created_at: parse_datetime(row.get::<_, String>(5)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    /// Record devlog work on an issue. One record per devlog × issue;
    /// recording again overwrites the previous status change and notes.
    pub fn link_devlog_issue(
        &self,
        page_id: Uuid,
        input: CreateDevlogIssueLinkInput,
    ) -> Result<DevlogIssueLink> {
        self.get_page(page_id)?
            .ok_or_else(|| anyhow::anyhow!("Page not found"))?;
        self.get_issue(input.issue_id)?
            .ok_or_else(|| anyhow::anyhow!("Issue not found"))?;

        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO devlog_issue_links (id, page_id, issue_id, status_change, work_notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(page_id, issue_id) DO UPDATE SET
                status_change = excluded.status_change,
                work_notes = excluded.work_notes",
            (
                id.to_string(),
                page_id.to_string(),
                input.issue_id.to_string(),
                input.status_change.map(|s| s.as_str().to_string()),
                &input.work_notes,
                now.to_rfc3339(),
            ),
        )?;

        // On conflict the stored row keeps its original id and
        // created_at, so read the row back rather than echoing the
        // freshly generated values.
        let link = conn.query_row(
            "SELECT id, created_at FROM devlog_issue_links WHERE page_id = ? AND issue_id = ?",
            (page_id.to_string(), input.issue_id.to_string()),
            |row| {
                Ok(DevlogIssueLink {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    page_id,
                    issue_id: input.issue_id,
                    status_change: input.status_change,
                    work_notes: input.work_notes.clone(),
                    created_at: parse_datetime(row.get::<_, String>(1)?),
                })
            },
        )?;
        Ok(link)
    }

    pub fn unlink_devlog_issue(&self, page_id: Uuid, issue_id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute(
            "DELETE FROM devlog_issue_links WHERE page_id = ? AND issue_id = ?",
            (page_id.to_string(), issue_id.to_string()),
        )?;
        Ok(rows > 0)
    }

    pub fn get_devlog_subquest_links(&self, page_id: Uuid) -> Result<Vec<DevlogSubquestLink>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, page_id, subquest_id, completed, work_notes, created_at
             FROM devlog_subquest_links WHERE page_id = ? ORDER BY created_at",
        )?;

        let links = stmt
            .query_map([page_id.to_string()], |row| {
                Ok(DevlogSubquestLink {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    page_id: parse_uuid(row.get::<_, String>(1)?),
                    subquest_id: parse_uuid(row.get::<_, String>(2)?),
                    completed: row.get::<_, Option<i64>>(3)?.map(|v| v != 0),
                    work_notes: row.get(4)?,
                    created_at: parse_datetime(row.get::<_, String>(5)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    pub fn link_devlog_subquest(
        &self,
        page_id: Uuid,
        input: CreateDevlogSubquestLinkInput,
    ) -> Result<DevlogSubquestLink> {
        self.get_page(page_id)?
            .ok_or_else(|| anyhow::anyhow!("Page not found"))?;

        let conn = self.lock();

        let subquest_exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subquests WHERE id = ?",
            [input.subquest_id.to_string()],
            |row| row.get(0),
        )?;
        if subquest_exists == 0 {
            anyhow::bail!("Sub-quest not found");
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO devlog_subquest_links (id, page_id, subquest_id, completed, work_notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(page_id, subquest_id) DO UPDATE SET
                completed = excluded.completed,
                work_notes = excluded.work_notes",
            (
                id.to_string(),
                page_id.to_string(),
                input.subquest_id.to_string(),
                input.completed.map(|c| if c { 1 } else { 0 }),
                &input.work_notes,
                now.to_rfc3339(),
            ),
        )?;

        let link = conn.query_row(
            "SELECT id, created_at FROM devlog_subquest_links WHERE page_id = ? AND subquest_id = ?",
            (page_id.to_string(), input.subquest_id.to_string()),
            |row| {
                Ok(DevlogSubquestLink {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    page_id,
                    subquest_id: input.subquest_id,
                    completed: input.completed,
                    work_notes: input.work_notes.clone(),
                    created_at: parse_datetime(row.get::<_, String>(1)?),
                })
            },
        )?;
        Ok(link)
    }

    pub fn unlink_devlog_subquest(&self, page_id: Uuid, subquest_id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute(
            "DELETE FROM devlog_subquest_links WHERE page_id = ? AND subquest_id = ?",
            (page_id.to_string(), subquest_id.to_string()),
        )?;
        Ok(rows > 0)
    }
}
