use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{load_tags, parse_datetime, parse_uuid, replace_tags, Database};
use crate::models::*;

pub(super) fn quest_from_row(row: &Row) -> rusqlite::Result<Quest> {
    Ok(Quest {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        quest_type: QuestType::from_str(&row.get::<_, String>(2)?).unwrap_or(QuestType::Side),
        status: QuestStatus::from_str(&row.get::<_, String>(3)?).unwrap_or(QuestStatus::Planned),
        description: row.get(4)?,
        visibility: Visibility::from_str(&row.get::<_, String>(5)?)
            .unwrap_or(Visibility::Private),
        project_id: row.get::<_, Option<String>>(6)?.map(parse_uuid),
        parent_id: row.get::<_, Option<String>>(7)?.map(parse_uuid),
        tags: Vec::new(),
        subquests: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

pub(super) const QUEST_COLUMNS: &str = "id, title, quest_type, status, description, visibility, \
                             project_id, parent_id, created_at, updated_at";

fn subquest_from_row(row: &Row) -> rusqlite::Result<SubQuest> {
    Ok(SubQuest {
        id: parse_uuid(row.get::<_, String>(0)?),
        quest_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        completed: row.get::<_, i64>(3)? != 0,
        position: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn load_subquests(conn: &Connection, quest_id: Uuid) -> Result<Vec<SubQuest>> {
    let mut stmt = conn.prepare(
        "SELECT id, quest_id, title, completed, position, created_at
         FROM subquests WHERE quest_id = ? ORDER BY position",
    )?;

    let subquests = stmt
        .query_map([quest_id.to_string()], subquest_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(subquests)
}

pub(super) fn hydrate(conn: &Connection, mut quests: Vec<Quest>) -> Result<Vec<Quest>> {
    for quest in &mut quests {
        quest.tags = load_tags(conn, "quest_tags", "quest_id", quest.id)?;
        quest.subquests = load_subquests(conn, quest.id)?;
    }
    Ok(quests)
}

impl Database {
    // ============================================================
    // Quest operations
    // ============================================================

    pub fn get_all_quests(&self, filter: &QuestFilter) -> Result<Vec<Quest>> {
        let conn = self.lock();

        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(quest_type) = filter.quest_type {
            clauses.push("quest_type = ?");
            params.push(Box::new(quest_type.as_str().to_string()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }
        if let Some(visibility) = filter.visibility {
            clauses.push("visibility = ?");
            params.push(Box::new(visibility.as_str().to_string()));
        }
        if let Some(project_id) = filter.project_id {
            clauses.push("project_id = ?");
            params.push(Box::new(project_id.to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql =
            format!("SELECT {QUEST_COLUMNS} FROM quests{where_sql} ORDER BY updated_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let quests = stmt
            .query_map(params_ref.as_slice(), quest_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        hydrate(&conn, quests)
    }

    pub fn get_quest(&self, id: Uuid) -> Result<Option<Quest>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("SELECT {QUEST_COLUMNS} FROM quests WHERE id = ?"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut quest = quest_from_row(row)?;
            quest.tags = load_tags(&conn, "quest_tags", "quest_id", quest.id)?;
            quest.subquests = load_subquests(&conn, quest.id)?;
            Ok(Some(quest))
        } else {
            Ok(None)
        }
    }

    pub fn get_quests_by_project(&self, project_id: Uuid) -> Result<Vec<Quest>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {QUEST_COLUMNS} FROM quests WHERE project_id = ? ORDER BY updated_at DESC"
        ))?;

        let quests = stmt
            .query_map([project_id.to_string()], quest_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        hydrate(&conn, quests)
    }

    pub fn get_child_quests(&self, parent_id: Uuid) -> Result<Vec<Quest>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {QUEST_COLUMNS} FROM quests WHERE parent_id = ? ORDER BY created_at"
        ))?;

        let quests = stmt
            .query_map([parent_id.to_string()], quest_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        hydrate(&conn, quests)
    }

    pub fn create_quest(&self, input: CreateQuestInput) -> Result<Quest> {
        if let Some(project_id) = input.project_id {
            self.get_project(project_id)?
                .ok_or_else(|| anyhow::anyhow!("Project not found"))?;
        }

        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or(QuestStatus::Planned);
        let visibility = input.visibility.unwrap_or(Visibility::Private);

        conn.execute(
            "INSERT INTO quests (id, title, quest_type, status, description, visibility, project_id, parent_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.title,
                input.quest_type.as_str(),
                status.as_str(),
                &input.description,
                visibility.as_str(),
                input.project_id.map(|u| u.to_string()),
                input.parent_id.map(|u| u.to_string()),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        let tag_ids = input.tag_ids.unwrap_or_default();
        replace_tags(&conn, "quest_tags", "quest_id", id, &tag_ids)?;
        let tags = load_tags(&conn, "quest_tags", "quest_id", id)?;

        Ok(Quest {
            id,
            title: input.title,
            quest_type: input.quest_type,
            status,
            description: input.description,
            visibility,
            project_id: input.project_id,
            parent_id: input.parent_id,
            tags,
            subquests: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_quest(&self, id: Uuid, input: UpdateQuestInput) -> Result<Option<Quest>> {
        let Some(existing) = self.get_quest(id)? else {
            return Ok(None);
        };

        let conn = self.lock();
        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);
        let quest_type = input.quest_type.unwrap_or(existing.quest_type);
        let status = input.status.unwrap_or(existing.status);
        let description = input.description.or(existing.description);
        let visibility = input.visibility.unwrap_or(existing.visibility);
        let project_id = input.project_id.or(existing.project_id);
        let parent_id = input.parent_id.or(existing.parent_id);

        conn.execute(
            "UPDATE quests SET title = ?, quest_type = ?, status = ?, description = ?, visibility = ?, project_id = ?, parent_id = ?, updated_at = ? WHERE id = ?",
            (
                &title,
                quest_type.as_str(),
                status.as_str(),
                &description,
                visibility.as_str(),
                project_id.map(|u| u.to_string()),
                parent_id.map(|u| u.to_string()),
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        if let Some(tag_ids) = &input.tag_ids {
            replace_tags(&conn, "quest_tags", "quest_id", id, tag_ids)?;
        }
        let tags = load_tags(&conn, "quest_tags", "quest_id", id)?;
        let subquests = load_subquests(&conn, id)?;

        Ok(Some(Quest {
            id,
            title,
            quest_type,
            status,
            description,
            visibility,
            project_id,
            parent_id,
            tags,
            subquests,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a quest. Sub-quests, tag links and devlog links cascade;
    /// issues and page connections targeting the quest are removed the
    /// same way `delete_project` handles its polymorphic referrers.
    pub fn delete_quest(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM issues WHERE target_type = 'quest' AND target_id = ?",
            [id.to_string()],
        )?;
        conn.execute(
            "DELETE FROM page_connections WHERE target_type = 'quest' AND target_id = ?",
            [id.to_string()],
        )?;
        let rows = conn.execute("DELETE FROM quests WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Sub-quest operations
    // ============================================================

    pub fn get_subquests(&self, quest_id: Uuid) -> Result<Vec<SubQuest>> {
        let conn = self.lock();
        load_subquests(&conn, quest_id)
    }

    pub fn create_subquest(&self, quest_id: Uuid, input: CreateSubQuestInput) -> Result<SubQuest> {
        self.get_quest(quest_id)?
            .ok_or_else(|| anyhow::anyhow!("Quest not found"))?;

        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();

        let position = match input.position {
            Some(p) => p,
            None => {
                // Append after the current last position
                conn.query_row(
                    "SELECT COALESCE(MAX(position) + 1, 0) FROM subquests WHERE quest_id = ?",
                    [quest_id.to_string()],
                    |row| row.get(0),
                )?
            }
        };

        conn.execute(
            "INSERT INTO subquests (id, quest_id, title, completed, position, created_at)
             VALUES (?, ?, ?, 0, ?, ?)",
            (
                id.to_string(),
                quest_id.to_string(),
                &input.title,
                position,
                now.to_rfc3339(),
            ),
        )?;

        Ok(SubQuest {
            id,
            quest_id,
            title: input.title,
            completed: false,
            position,
            created_at: now,
        })
    }

    pub fn update_subquest(&self, id: Uuid, input: UpdateSubQuestInput) -> Result<bool> {
        let conn = self.lock();

        let mut updates = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(title) = input.title {
            updates.push("title = ?");
            params.push(Box::new(title));
        }
        if let Some(completed) = input.completed {
            updates.push("completed = ?");
            params.push(Box::new(if completed { 1 } else { 0 }));
        }

        if updates.is_empty() {
            return Ok(false);
        }

        params.push(Box::new(id.to_string()));

        let sql = format!("UPDATE subquests SET {} WHERE id = ?", updates.join(", "));
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = conn.execute(&sql, params_ref.as_slice())?;

        Ok(rows > 0)
    }

    pub fn delete_subquest(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM subquests WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Rewrite the positions of a quest's sub-quests in one transaction
    /// so a failure never leaves a partially reordered list. Every
    /// sub-quest of the quest must appear in `ordered_ids` exactly once.
    pub fn reorder_subquests(&self, quest_id: Uuid, ordered_ids: &[Uuid]) -> Result<Vec<SubQuest>> {
        let mut conn = self.lock();

        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subquests WHERE quest_id = ?",
            [quest_id.to_string()],
            |row| row.get(0),
        )?;
        let distinct: std::collections::HashSet<Uuid> = ordered_ids.iter().copied().collect();
        if existing != ordered_ids.len() as i64 || distinct.len() != ordered_ids.len() {
            anyhow::bail!("Reorder must include every sub-quest of the quest exactly once");
        }

        let tx = conn.transaction()?;
        for (position, id) in ordered_ids.iter().enumerate() {
            let rows = tx.execute(
                "UPDATE subquests SET position = ? WHERE id = ? AND quest_id = ?",
                (position as i64, id.to_string(), quest_id.to_string()),
            )?;
            if rows == 0 {
                anyhow::bail!("Sub-quest {} does not belong to the quest", id);
            }
        }
        tx.commit()?;

        load_subquests(&conn, quest_id)
    }
}
