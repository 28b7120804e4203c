//! Cascade views over the entity stores.
//!
//! "Everything connected to project P" means content attached directly
//! to P plus content attached to any quest owned by P, one level of
//! inheritance only, never further. The joins run in SQL; dedup and
//! grouping happen in memory on the already-fetched rows.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::issues::{issue_from_row, ISSUE_COLUMNS};
use super::pages::{hydrate_pages, page_from_row, PAGE_COLUMNS};
use super::Database;
use crate::models::*;
use crate::stats::CharacterCounts;

/// Completion progress over a set of sub-quests. Percentage is rounded
/// to the nearest integer; no sub-quests means 0%.
pub fn quest_progress(subquests: &[SubQuest]) -> QuestProgress {
    let total = subquests.len();
    let completed = subquests.iter().filter(|s| s.completed).count();
    let percentage = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };
    QuestProgress {
        completed,
        total,
        percentage,
    }
}

/// Partition a devlog's related issues into the four display buckets.
///
/// Rules are evaluated in order, first match wins:
/// 1. completed here: link records done/cancelled, or the issue is
///    terminal and has a link in this devlog
/// 2. in progress: link records in_progress, or carries notes without a
///    terminal status change
/// 3. newly added: linked and created at or after the devlog
/// 4. still outstanding: everything else that is not terminal
///
/// Terminal issues with no link in this devlog land in no bucket. The
/// newly-added rule compares creation times as a heuristic for "created
/// during this session"; it is an approximation, not a recorded fact.
pub fn section_issues(
    devlog_created_at: DateTime<Utc>,
    issues: Vec<Issue>,
    links: &[DevlogIssueLink],
) -> SectionedIssues {
    let by_issue: HashMap<Uuid, &DevlogIssueLink> =
        links.iter().map(|l| (l.issue_id, l)).collect();

    let mut sections = SectionedIssues::default();
    for issue in issues {
        let link = by_issue.get(&issue.id);

        let completed_here = match link {
            Some(l) => {
                l.status_change.is_some_and(|s| s.is_terminal()) || issue.status.is_terminal()
            }
            None => false,
        };
        if completed_here {
            sections.completed_in_devlog.push(issue);
            continue;
        }

        let in_progress_here = match link {
            Some(l) => {
                l.status_change == Some(IssueStatus::InProgress)
                    || (l.work_notes.is_some()
                        && !l.status_change.is_some_and(|s| s.is_terminal()))
            }
            None => false,
        };
        if in_progress_here {
            sections.in_progress.push(issue);
            continue;
        }

        if link.is_some() && issue.created_at >= devlog_created_at {
            sections.newly_added.push(issue);
            continue;
        }

        if !issue.status.is_terminal() {
            sections.still_outstanding.push(issue);
        }
    }

    for bucket in [
        &mut sections.completed_in_devlog,
        &mut sections.in_progress,
        &mut sections.newly_added,
        &mut sections.still_outstanding,
    ] {
        bucket.sort_by_key(|i| i.status.priority());
    }

    sections
}

fn status_counts<T, F: Fn(&T) -> &'static str>(items: &[T], status_of: F) -> StatusCounts {
    let mut counts = StatusCounts {
        total: items.len(),
        ..Default::default()
    };
    for item in items {
        *counts.by_status.entry(status_of(item).to_string()).or_insert(0) += 1;
    }
    counts
}

fn group_pages(pages: Vec<Page>) -> PageGroups {
    let mut groups = PageGroups {
        blogs: Vec::new(),
        devlogs: Vec::new(),
        notes: Vec::new(),
        project_docs: Vec::new(),
    };
    for page in pages {
        match page.page_type {
            PageType::Blog => groups.blogs.push(page),
            PageType::Devlog => groups.devlogs.push(page),
            PageType::Notes => groups.notes.push(page),
            PageType::ProjectDoc => groups.project_docs.push(page),
        }
    }
    groups
}

impl Database {
    // ============================================================
    // Cascade views
    // ============================================================

    /// Issues attached to quests owned by the given project.
    fn get_issues_via_quests(&self, project_id: Uuid) -> Result<Vec<Issue>> {
        let conn = self.lock();
        let columns = ISSUE_COLUMNS
            .split(", ")
            .map(|c| format!("i.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {columns} FROM issues i
             JOIN quests q ON i.target_type = 'quest' AND i.target_id = q.id
             WHERE q.project_id = ? ORDER BY i.updated_at DESC"
        ))?;

        let issues = stmt
            .query_map([project_id.to_string()], issue_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    /// Pages connected to one project or quest.
    pub fn get_pages_by_target(&self, target: AttachTarget) -> Result<Vec<Page>> {
        let conn = self.lock();
        let columns = PAGE_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {columns} FROM pages p
             JOIN page_connections c ON c.page_id = p.id
             WHERE c.target_type = ? AND c.target_id = ?
             ORDER BY p.updated_at DESC"
        ))?;

        let pages = stmt
            .query_map((target.kind(), target.id().to_string()), page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        hydrate_pages(&conn, pages)
    }

    /// Pages connected to quests owned by the given project.
    fn get_pages_via_quests(&self, project_id: Uuid) -> Result<Vec<Page>> {
        let conn = self.lock();
        let columns = PAGE_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {columns} FROM pages p
             JOIN page_connections c ON c.page_id = p.id
             JOIN quests q ON c.target_type = 'quest' AND c.target_id = q.id
             WHERE q.project_id = ? ORDER BY p.updated_at DESC"
        ))?;

        let pages = stmt
            .query_map([project_id.to_string()], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        hydrate_pages(&conn, pages)
    }

    /// Everything connected to a project, directly or via its quests.
    pub fn get_project_view(&self, id: Uuid) -> Result<Option<ProjectView>> {
        let Some(project) = self.get_project(id)? else {
            return Ok(None);
        };

        let quests = self.get_quests_by_project(id)?;
        let direct_issues = self.get_issues_by_target(AttachTarget::Project(id))?;
        let quest_issues = self.get_issues_via_quests(id)?;
        let children = self.get_child_projects(id)?;

        // Direct pages first, then quest pages; a page connected both
        // ways keeps its first-seen entry
        let mut seen = HashSet::new();
        let mut pages = Vec::new();
        for page in self
            .get_pages_by_target(AttachTarget::Project(id))?
            .into_iter()
            .chain(self.get_pages_via_quests(id)?)
        {
            if seen.insert(page.id) {
                pages.push(page);
            }
        }
        pages.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let statistics = ProjectStatistics {
            quests: status_counts(&quests, |q: &Quest| q.status.as_str()),
            issues: {
                let mut all = direct_issues.clone();
                all.extend(quest_issues.iter().cloned());
                status_counts(&all, |i: &Issue| i.status.as_str())
            },
        };

        let quests = quests
            .into_iter()
            .map(|quest| {
                let progress = quest_progress(&quest.subquests);
                QuestWithProgress { quest, progress }
            })
            .collect();

        Ok(Some(ProjectView {
            project,
            quests,
            issues: IssueBreakdown {
                direct: direct_issues,
                from_quests: quest_issues,
            },
            pages: group_pages(pages),
            children,
            statistics,
        }))
    }

    /// A quest with its attachments and child quests, one level deep.
    pub fn get_quest_view(&self, id: Uuid) -> Result<Option<QuestView>> {
        let Some(quest) = self.get_quest(id)? else {
            return Ok(None);
        };

        let children = self
            .get_child_quests(id)?
            .into_iter()
            .map(|child| {
                let issues = self.get_issues_by_target(AttachTarget::Quest(child.id))?;
                let pages = self.get_pages_by_target(AttachTarget::Quest(child.id))?;
                let progress = quest_progress(&child.subquests);
                Ok(QuestView {
                    quest: child,
                    progress,
                    issues,
                    pages,
                    children: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let progress = quest_progress(&quest.subquests);
        let issues = self.get_issues_by_target(AttachTarget::Quest(id))?;
        let pages = self.get_pages_by_target(AttachTarget::Quest(id))?;

        Ok(Some(QuestView {
            quest,
            progress,
            issues,
            pages,
            children,
        }))
    }

    /// A devlog page with its attachment target and the sectioned view
    /// of the target's issues.
    pub fn get_devlog_view(&self, page_id: Uuid) -> Result<Option<DevlogView>> {
        let Some(page) = self.get_page(page_id)? else {
            return Ok(None);
        };

        // Devlogs are expected to have a single connection; use the
        // first by creation order and ignore extras
        let target = match page.connections.first().map(|c| c.target) {
            Some(AttachTarget::Project(id)) => self.get_project(id)?.map(DevlogTarget::Project),
            Some(AttachTarget::Quest(id)) => self.get_quest(id)?.map(DevlogTarget::Quest),
            None => None,
        };

        let issues = match page.connections.first().map(|c| c.target) {
            Some(target) => self.get_issues_by_target(target)?,
            None => Vec::new(),
        };
        let links = self.get_devlog_issue_links(page_id)?;
        let sections = section_issues(page.created_at, issues, &links);

        Ok(Some(DevlogView {
            page,
            target,
            issues: sections,
        }))
    }

    /// The project hierarchy from `root` (or all roots), bounded by
    /// `max_depth` so an accidental cycle cannot recurse forever.
    pub fn get_project_tree(
        &self,
        root: Option<Uuid>,
        max_depth: usize,
    ) -> Result<Vec<ProjectTreeNode>> {
        let projects = self.get_all_projects(&ProjectFilter::default())?;

        let mut children_map: HashMap<Option<Uuid>, Vec<Project>> = HashMap::new();
        for project in projects {
            children_map
                .entry(project.parent_id)
                .or_default()
                .push(project);
        }

        fn build_subtree(
            parent_id: Option<Uuid>,
            children_map: &HashMap<Option<Uuid>, Vec<Project>>,
            depth: usize,
        ) -> Vec<ProjectTreeNode> {
            if depth == 0 {
                return Vec::new();
            }
            children_map
                .get(&parent_id)
                .map(|projects| {
                    projects
                        .iter()
                        .map(|p| ProjectTreeNode {
                            project: p.clone(),
                            children: build_subtree(Some(p.id), children_map, depth - 1),
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        match root {
            Some(id) => {
                let node = children_map
                    .values()
                    .flatten()
                    .find(|p| p.id == id)
                    .cloned();
                Ok(node
                    .map(|p| {
                        vec![ProjectTreeNode {
                            children: build_subtree(Some(p.id), &children_map, max_depth),
                            project: p,
                        }]
                    })
                    .unwrap_or_default())
            }
            None => Ok(build_subtree(None, &children_map, max_depth)),
        }
    }

    // ============================================================
    // Search
    // ============================================================

    /// Case-insensitive substring search across the requested entity
    /// types, each capped at `limit`.
    pub fn search_portfolio(
        &self,
        term: &str,
        types: &[SearchType],
        limit: u32,
    ) -> Result<SearchResults> {
        let mut results = SearchResults::default();

        for search_type in types {
            match search_type {
                SearchType::Projects => {
                    let conn = self.lock();
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM projects
                         WHERE title LIKE '%' || ?1 || '%' OR description LIKE '%' || ?1 || '%'
                         ORDER BY updated_at DESC LIMIT ?2",
                        super::projects::PROJECT_COLUMNS
                    ))?;
                    let projects = stmt
                        .query_map((term, limit), super::projects::project_from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    drop(stmt);
                    results.projects = Some(super::projects::attach_tags(&conn, projects)?);
                }
                SearchType::Quests => {
                    let conn = self.lock();
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM quests
                         WHERE title LIKE '%' || ?1 || '%' OR description LIKE '%' || ?1 || '%'
                         ORDER BY updated_at DESC LIMIT ?2",
                        super::quests::QUEST_COLUMNS
                    ))?;
                    let quests = stmt
                        .query_map((term, limit), super::quests::quest_from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    drop(stmt);
                    results.quests = Some(super::quests::hydrate(&conn, quests)?);
                }
                SearchType::Pages => {
                    let conn = self.lock();
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {PAGE_COLUMNS} FROM pages
                         WHERE title LIKE '%' || ?1 || '%' OR content LIKE '%' || ?1 || '%'
                         ORDER BY updated_at DESC LIMIT ?2"
                    ))?;
                    let pages = stmt
                        .query_map((term, limit), page_from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    drop(stmt);
                    results.pages = Some(hydrate_pages(&conn, pages)?);
                }
                SearchType::Issues => {
                    let conn = self.lock();
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {ISSUE_COLUMNS} FROM issues
                         WHERE title LIKE '%' || ?1 || '%' OR description LIKE '%' || ?1 || '%'
                         ORDER BY updated_at DESC LIMIT ?2"
                    ))?;
                    let issues = stmt
                        .query_map((term, limit), issue_from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    results.issues = Some(issues);
                }
                SearchType::Tags => {
                    let conn = self.lock();
                    let mut stmt = conn.prepare(
                        "SELECT id, name, color, created_at FROM tags
                         WHERE name LIKE '%' || ?1 || '%' ORDER BY name LIMIT ?2",
                    )?;
                    let tags = stmt
                        .query_map((term, limit), |row| {
                            Ok(Tag {
                                id: super::parse_uuid(row.get::<_, String>(0)?),
                                name: row.get(1)?,
                                color: row.get(2)?,
                                created_at: super::parse_datetime(row.get::<_, String>(3)?),
                            })
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    results.tags = Some(tags);
                }
            }
        }

        Ok(results)
    }

    // ============================================================
    // Character sheet counts
    // ============================================================

    /// The six raw counts feeding the stat deriver.
    pub fn character_counts(&self) -> Result<CharacterCounts> {
        let conn = self.lock();
        let count = |sql: &str, params: &[&dyn rusqlite::ToSql]| -> Result<u32> {
            Ok(conn.query_row(sql, params, |row| row.get::<_, i64>(0))? as u32)
        };

        let year_ago = (Utc::now() - Duration::days(365)).to_rfc3339();

        Ok(CharacterCounts {
            completed_quests: count("SELECT COUNT(*) FROM quests WHERE status = 'completed'", &[])?,
            achievements: count(
                "SELECT COUNT(*) FROM inventory_items WHERE item_type = 'achievement' AND visibility = 'public'",
                &[],
            )?,
            devlogs: count("SELECT COUNT(*) FROM pages WHERE page_type = 'devlog'", &[])?,
            projects_last_year: count(
                "SELECT COUNT(*) FROM projects WHERE created_at >= ?",
                &[&year_ago],
            )?,
            abandoned_quests: count("SELECT COUNT(*) FROM quests WHERE status = 'abandoned'", &[])?,
            linked_projects: count("SELECT COUNT(*) FROM projects WHERE link IS NOT NULL", &[])?,
        })
    }
}
