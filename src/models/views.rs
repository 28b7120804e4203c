use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::issue::Issue;
use super::page::Page;
use super::project::Project;
use super::quest::Quest;
use super::tag::Tag;

/// Everything connected to a project, directly or via its quests.
///
/// Quest-attached content is inherited one level only: quest → owning
/// project, no further transitive closure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub quests: Vec<QuestWithProgress>,
    pub issues: IssueBreakdown,
    pub pages: PageGroups,
    /// Direct child projects.
    pub children: Vec<Project>,
    pub statistics: ProjectStatistics,
}

/// Issues attached to the project itself vs. inherited from its quests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueBreakdown {
    pub direct: Vec<Issue>,
    pub from_quests: Vec<Issue>,
}

/// Pages connected to a project (directly or via its quests),
/// deduplicated by page id and grouped by page type. Each group is
/// sorted by update time, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGroups {
    pub blogs: Vec<Page>,
    pub devlogs: Vec<Page>,
    pub notes: Vec<Page>,
    pub project_docs: Vec<Page>,
}

/// Aggregate counts shown on the project dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStatistics {
    pub quests: StatusCounts,
    pub issues: StatusCounts,
}

/// A total plus per-status counts, keyed by the status wire name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
}

/// Completion progress over a quest's sub-quests.
///
/// `percentage` is rounded to the nearest integer and 0 when there are
/// no sub-quests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

/// A quest with its computed sub-quest progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestWithProgress {
    #[serde(flatten)]
    pub quest: Quest,
    pub progress: QuestProgress,
}

/// A quest with its direct attachments and child quests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestView {
    #[serde(flatten)]
    pub quest: Quest,
    pub progress: QuestProgress,
    pub issues: Vec<Issue>,
    pub pages: Vec<Page>,
    /// Child quests in the same shape, one level deep.
    pub children: Vec<QuestView>,
}

/// The target a devlog is attached to, resolved to the full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DevlogTarget {
    Project(Project),
    Quest(Quest),
}

/// A devlog page with its attachment target and the sectioned view of
/// the target's issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevlogView {
    #[serde(flatten)]
    pub page: Page,
    /// Resolved from the devlog's first connection; `None` when the
    /// devlog has no connection.
    pub target: Option<DevlogTarget>,
    pub issues: SectionedIssues,
}

/// The four display buckets for a devlog's related issues.
///
/// Rules are evaluated in bucket order, first match wins; each bucket
/// is sorted by [`IssueStatus::priority`](super::IssueStatus::priority).
/// Terminal issues with no work record in the devlog appear in no
/// bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionedIssues {
    /// Recorded as done/cancelled during this devlog's session, or
    /// currently terminal with a work record here.
    pub completed_in_devlog: Vec<Issue>,
    /// Moved to in-progress here, or worked on (notes) without a
    /// terminal status change.
    pub in_progress: Vec<Issue>,
    /// Worked on here and created at or after the devlog itself.
    pub newly_added: Vec<Issue>,
    /// No work record in this devlog and not terminal.
    pub still_outstanding: Vec<Issue>,
}

/// A project with its nested children, used for tree responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTreeNode {
    #[serde(flatten)]
    pub project: Project,
    pub children: Vec<ProjectTreeNode>,
}

/// Per-type results of a portfolio search. Only requested types are
/// present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quests: Option<Vec<Quest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<Page>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<Issue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// Entity types a portfolio search can cover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Projects,
    Quests,
    Pages,
    Issues,
    Tags,
}

impl SearchType {
    pub const ALL: [SearchType; 5] = [
        Self::Projects,
        Self::Quests,
        Self::Pages,
        Self::Issues,
        Self::Tags,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "projects" => Some(Self::Projects),
            "quests" => Some(Self::Quests),
            "pages" => Some(Self::Pages),
            "issues" => Some(Self::Issues),
            "tags" => Some(Self::Tags),
            _ => None,
        }
    }
}
