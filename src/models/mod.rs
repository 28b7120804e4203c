//! Domain models for questlog.
//!
//! # Core Concepts
//!
//! ## Content Entities
//!
//! - [`Project`]: Top-level container for quests, pages and issues.
//!   Projects can nest via `parent_id`, forming a tree.
//! - [`Quest`]: A task/work item, optionally owned by a project, with
//!   ordered checkable [`SubQuest`] records.
//! - [`Page`]: A content document (blog post, devlog, notes or project
//!   doc), connected to projects/quests via [`PageConnection`].
//! - [`Issue`]: A bug or improvement attached to exactly one project or
//!   quest (see [`AttachTarget`]).
//!
//! ## Side Records
//!
//! - [`Tag`]: Named colored labels joined to most entities.
//! - [`InventoryItem`]: Display items and achievements with a manual
//!   sort order.
//! - [`DevlogIssueLink`] / [`DevlogSubquestLink`]: per-devlog work
//!   records feeding the sectioned devlog view.
//! - [`ContactMessage`]: Inbox messages, independent of the rest of the
//!   graph.

mod inventory;
mod issue;
mod link;
mod message;
mod page;
mod project;
mod quest;
mod tag;
mod views;

pub use inventory::*;
pub use issue::*;
pub use link::*;
pub use message::*;
pub use page::*;
pub use project::*;
pub use quest::*;
pub use tag::*;
pub use views::*;
