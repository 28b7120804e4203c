use anyhow::Result;
use chrono::Utc;
use rusqlite::Row;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::models::*;

pub(super) fn issue_from_row(row: &Row) -> rusqlite::Result<Issue> {
    let kind: String = row.get(1)?;
    let target_id = parse_uuid(row.get::<_, String>(2)?);
    Ok(Issue {
        id: parse_uuid(row.get::<_, String>(0)?),
        target: AttachTarget::from_parts(&kind, target_id)
            .unwrap_or(AttachTarget::Project(target_id)),
        issue_type: IssueType::from_str(&row.get::<_, String>(3)?).unwrap_or(IssueType::Bug),
        severity: row
            .get::<_, Option<String>>(4)?
            .as_deref()
            .and_then(Severity::from_str),
        title: row.get(5)?,
        description: row.get(6)?,
        status: IssueStatus::from_str(&row.get::<_, String>(7)?).unwrap_or(IssueStatus::Open),
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

pub(super) const ISSUE_COLUMNS: &str =
    "id, target_type, target_id, issue_type, severity, title, description, status, \
     created_at, updated_at";

/// Bugs must carry a severity; improvements never do.
fn check_severity(issue_type: IssueType, severity: Option<Severity>) -> Result<()> {
    match (issue_type, severity) {
        (IssueType::Bug, None) => anyhow::bail!("Bugs require a severity"),
        (IssueType::Improvement, Some(_)) => {
            anyhow::bail!("Improvements do not carry a severity")
        }
        _ => Ok(()),
    }
}

impl Database {
    // ============================================================
    // Issue operations
    // ============================================================

    pub fn get_all_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let conn = self.lock();

        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(issue_type) = filter.issue_type {
            clauses.push("issue_type = ?");
            params.push(Box::new(issue_type.as_str().to_string()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }
        if let Some(severity) = filter.severity {
            clauses.push("severity = ?");
            params.push(Box::new(severity.as_str().to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql =
            format!("SELECT {ISSUE_COLUMNS} FROM issues{where_sql} ORDER BY updated_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let issues = stmt
            .query_map(params_ref.as_slice(), issue_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    pub fn get_issue(&self, id: Uuid) -> Result<Option<Issue>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(issue_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Issues attached directly to one project or quest.
    pub fn get_issues_by_target(&self, target: AttachTarget) -> Result<Vec<Issue>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues
             WHERE target_type = ? AND target_id = ? ORDER BY updated_at DESC"
        ))?;

        let issues = stmt
            .query_map((target.kind(), target.id().to_string()), issue_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    pub fn create_issue(&self, input: CreateIssueInput) -> Result<Issue> {
        check_severity(input.issue_type, input.severity)?;
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
        let status = input.status.unwrap_or(IssueStatus::Open);

        conn.execute(
            "INSERT INTO issues (id, target_type, target_id, issue_type, severity, title, description, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.target.kind(),
                input.target.id().to_string(),
                input.issue_type.as_str(),
                input.severity.map(|s| s.as_str().to_string()),
                &input.title,
                &input.description,
                status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Issue {
            id,
            target: input.target,
            issue_type: input.issue_type,
            severity: input.severity,
            title: input.title,
            description: input.description,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_issue(&self, id: Uuid, input: UpdateIssueInput) -> Result<Option<Issue>> {
        let Some(existing) = self.get_issue(id)? else {
            return Ok(None);
        };

        let issue_type = input.issue_type.unwrap_or(existing.issue_type);
        // Moving to improvement drops any stored severity
        let severity = match issue_type {
            IssueType::Improvement => None,
            IssueType::Bug => input.severity.or(existing.severity),
        };
        check_severity(issue_type, severity)?;

        let conn = self.lock();
        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);
        let description = input.description.or(existing.description);
        let status = input.status.unwrap_or(existing.status);

        conn.execute(
            "UPDATE issues SET issue_type = ?, severity = ?, title = ?, description = ?, status = ?, updated_at = ? WHERE id = ?",
            (
                issue_type.as_str(),
                severity.map(|s| s.as_str().to_string()),
                &title,
                &description,
                status.as_str(),
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(Issue {
            id,
            target: existing.target,
            issue_type,
            severity,
            title,
            description,
            status,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_issue(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM issues WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
