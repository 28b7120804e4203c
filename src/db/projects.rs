use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{load_tags, parse_date, parse_datetime, parse_uuid, replace_tags, Database};
use crate::models::*;

pub(super) fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        slug: row.get(3)?,
        status: ProjectStatus::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(ProjectStatus::Planning),
        visibility: Visibility::from_str(&row.get::<_, String>(5)?)
            .unwrap_or(Visibility::Private),
        parent_id: row.get::<_, Option<String>>(6)?.map(parse_uuid),
        link: row.get(7)?,
        start_date: row.get::<_, Option<String>>(8)?.map(parse_date),
        end_date: row.get::<_, Option<String>>(9)?.map(parse_date),
        tags: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(10)?),
        updated_at: parse_datetime(row.get::<_, String>(11)?),
    })
}

pub(super) const PROJECT_COLUMNS: &str = "id, title, description, slug, status, visibility, parent_id, \
                               link, start_date, end_date, created_at, updated_at";

pub(super) fn attach_tags(conn: &Connection, mut projects: Vec<Project>) -> Result<Vec<Project>> {
    for project in &mut projects {
        project.tags = load_tags(conn, "project_tags", "project_id", project.id)?;
    }
    Ok(projects)
}

/// Derive a slug from the title that is unique across all projects,
/// appending `-1`, `-2`… until it no longer collides.
fn unique_slug(conn: &Connection, title: &str) -> Result<String> {
    let base = slug::slugify(title);
    let base = if base.is_empty() {
        "project".to_string()
    } else {
        base
    };

    let mut candidate = base.clone();
    let mut n = 0;
    loop {
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE slug = ?",
            [&candidate],
            |row| row.get(0),
        )?;
        if taken == 0 {
            return Ok(candidate);
        }
        n += 1;
        candidate = format!("{}-{}", base, n);
    }
}

impl Database {
    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_all_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let conn = self.lock();

        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }
        if let Some(visibility) = filter.visibility {
            clauses.push("visibility = ?");
            params.push(Box::new(visibility.as_str().to_string()));
        }
        if let Some(parent_id) = filter.parent_id {
            clauses.push("parent_id = ?");
            params.push(Box::new(parent_id.to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects{where_sql} ORDER BY updated_at DESC"
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let projects = stmt
            .query_map(params_ref.as_slice(), project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        attach_tags(&conn, projects)
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut project = project_from_row(row)?;
            project.tags = load_tags(&conn, "project_tags", "project_id", project.id)?;
            Ok(Some(project))
        } else {
            Ok(None)
        }
    }

    pub fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = ?"))?;

        let mut rows = stmt.query([slug])?;
        if let Some(row) = rows.next()? {
            let mut project = project_from_row(row)?;
            project.tags = load_tags(&conn, "project_tags", "project_id", project.id)?;
            Ok(Some(project))
        } else {
            Ok(None)
        }
    }

    pub fn get_child_projects(&self, parent_id: Uuid) -> Result<Vec<Project>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE parent_id = ? ORDER BY title"
        ))?;

        let projects = stmt
            .query_map([parent_id.to_string()], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        attach_tags(&conn, projects)
    }

    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let slug = unique_slug(&conn, &input.title)?;
        let status = input.status.unwrap_or(ProjectStatus::Planning);
        let visibility = input.visibility.unwrap_or(Visibility::Private);

        conn.execute(
            "INSERT INTO projects (id, title, description, slug, status, visibility, parent_id, link, start_date, end_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.title,
                &input.description,
                &slug,
                status.as_str(),
                visibility.as_str(),
                input.parent_id.map(|u| u.to_string()),
                &input.link,
                input.start_date.map(|d| d.to_string()),
                input.end_date.map(|d| d.to_string()),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        let tag_ids = input.tag_ids.unwrap_or_default();
        replace_tags(&conn, "project_tags", "project_id", id, &tag_ids)?;
        let tags = load_tags(&conn, "project_tags", "project_id", id)?;

        Ok(Project {
            id,
            title: input.title,
            description: input.description,
            slug,
            status,
            visibility,
            parent_id: input.parent_id,
            link: input.link,
            start_date: input.start_date,
            end_date: input.end_date,
            tags,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_project(&self, id: Uuid, input: UpdateProjectInput) -> Result<Option<Project>> {
        let Some(existing) = self.get_project(id)? else {
            return Ok(None);
        };

        let conn = self.lock();
        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);
        let description = input.description.or(existing.description);
        let status = input.status.unwrap_or(existing.status);
        let visibility = input.visibility.unwrap_or(existing.visibility);
        let parent_id = input.parent_id.or(existing.parent_id);
        let link = input.link.or(existing.link);
        let start_date = input.start_date.or(existing.start_date);
        let end_date = input.end_date.or(existing.end_date);

        conn.execute(
            "UPDATE projects SET title = ?, description = ?, status = ?, visibility = ?, parent_id = ?, link = ?, start_date = ?, end_date = ?, updated_at = ? WHERE id = ?",
            (
                &title,
                &description,
                status.as_str(),
                visibility.as_str(),
                parent_id.map(|u| u.to_string()),
                &link,
                start_date.map(|d| d.to_string()),
                end_date.map(|d| d.to_string()),
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        // None = leave tag links unchanged, Some = replace-all
        if let Some(tag_ids) = &input.tag_ids {
            replace_tags(&conn, "project_tags", "project_id", id, tag_ids)?;
        }
        let tags = load_tags(&conn, "project_tags", "project_id", id)?;

        Ok(Some(Project {
            id,
            title,
            description,
            slug: existing.slug,
            status,
            visibility,
            parent_id,
            link,
            start_date,
            end_date,
            tags,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a project. Quests and child projects are detached (their
    /// references set NULL by the schema), not cascaded; issues and
    /// page connections pointing at the project are removed since a
    /// polymorphic target cannot dangle behind a foreign key.
    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM issues WHERE target_type = 'project' AND target_id = ?",
            [id.to_string()],
        )?;
        conn.execute(
            "DELETE FROM page_connections WHERE target_type = 'project' AND target_id = ?",
            [id.to_string()],
        )?;
        let rows = conn.execute("DELETE FROM projects WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
