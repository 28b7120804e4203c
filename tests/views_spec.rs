use chrono::{Duration, Utc};
use questlog::db::{quest_progress, section_issues, Database};
use questlog::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn create_project(db: &Database, title: &str) -> Project {
    db.create_project(CreateProjectInput {
        title: title.to_string(),
        description: None,
        status: None,
        visibility: None,
        parent_id: None,
        link: None,
        start_date: None,
        end_date: None,
        tag_ids: None,
    })
    .expect("Failed to create project")
}

fn create_child_project(db: &Database, title: &str, parent_id: Uuid) -> Project {
    db.create_project(CreateProjectInput {
        title: title.to_string(),
        description: None,
        status: None,
        visibility: None,
        parent_id: Some(parent_id),
        link: None,
        start_date: None,
        end_date: None,
        tag_ids: None,
    })
    .expect("Failed to create project")
}

fn create_quest(db: &Database, title: &str, project_id: Option<Uuid>) -> Quest {
    db.create_quest(CreateQuestInput {
        title: title.to_string(),
        quest_type: QuestType::Main,
        status: None,
        description: None,
        visibility: None,
        project_id,
        parent_id: None,
        tag_ids: None,
    })
    .expect("Failed to create quest")
}

fn create_devlog(db: &Database, title: &str) -> Page {
    db.create_page(CreatePageInput {
        title: title.to_string(),
        page_type: PageType::Devlog,
        content: "worked on things".to_string(),
        visibility: None,
        project_status: None,
        project_start_date: None,
        project_end_date: None,
        tag_ids: None,
    })
    .expect("Failed to create page")
}

fn create_issue_on(db: &Database, target: AttachTarget, title: &str) -> Issue {
    db.create_issue(CreateIssueInput {
        target,
        issue_type: IssueType::Improvement,
        severity: None,
        title: title.to_string(),
        description: None,
        status: None,
    })
    .expect("Failed to create issue")
}

fn fake_issue(status: IssueStatus, created_offset_hours: i64) -> Issue {
    Issue {
        id: Uuid::new_v4(),
        target: AttachTarget::Project(Uuid::new_v4()),
        issue_type: IssueType::Improvement,
        severity: None,
        title: "issue".to_string(),
        description: None,
        status,
        created_at: Utc::now() + Duration::hours(created_offset_hours),
        updated_at: Utc::now(),
    }
}

fn fake_link(
    issue_id: Uuid,
    status_change: Option<IssueStatus>,
    work_notes: Option<&str>,
) -> DevlogIssueLink {
    DevlogIssueLink {
        id: Uuid::new_v4(),
        page_id: Uuid::new_v4(),
        issue_id,
        status_change,
        work_notes: work_notes.map(str::to_string),
        created_at: Utc::now(),
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "quest_progress" {
        it "is zero percent with no subquests" {
            let progress = quest_progress(&[]);
            assert_eq!(progress, QuestProgress { completed: 0, total: 0, percentage: 0 });
        }

        it "rounds to the nearest integer" {
            let quest = create_quest(&db, "Progress", None);
            for title in ["a", "b", "c"] {
                db.create_subquest(quest.id, CreateSubQuestInput {
                    title: title.to_string(),
                    position: None,
                }).expect("Failed");
            }
            let subquests = db.get_subquests(quest.id).expect("Query failed");
            db.update_subquest(subquests[0].id, UpdateSubQuestInput {
                title: None,
                completed: Some(true),
            }).expect("Update failed");

            let subquests = db.get_subquests(quest.id).expect("Query failed");
            let progress = quest_progress(&subquests);
            assert_eq!(progress.completed, 1);
            assert_eq!(progress.total, 3);
            assert_eq!(progress.percentage, 33);
        }

        it "reports half done as fifty percent" {
            let quest = create_quest(&db, "Halfway", None);
            let first = db.create_subquest(quest.id, CreateSubQuestInput {
                title: "done".to_string(),
                position: None,
            }).expect("Failed");
            db.create_subquest(quest.id, CreateSubQuestInput {
                title: "todo".to_string(),
                position: None,
            }).expect("Failed");
            db.update_subquest(first.id, UpdateSubQuestInput {
                title: None,
                completed: Some(true),
            }).expect("Update failed");

            let subquests = db.get_subquests(quest.id).expect("Query failed");
            assert_eq!(quest_progress(&subquests), QuestProgress {
                completed: 1,
                total: 2,
                percentage: 50,
            });
        }
    }

    describe "get_project_view" {
        it "inherits quest issues and pages one level" {
            let project = create_project(&db, "Cascade");
            let quest = create_quest(&db, "Quest", Some(project.id));
            let issue = create_issue_on(&db, AttachTarget::Quest(quest.id), "I1");

            let devlog = create_devlog(&db, "D");
            db.connect_page(devlog.id, CreatePageConnectionInput {
                target: AttachTarget::Project(project.id),
            }).expect("Connect failed");

            let view = db.get_project_view(project.id)
                .expect("Query failed")
                .expect("Project missing");

            assert!(view.issues.direct.is_empty());
            assert_eq!(view.issues.from_quests.len(), 1);
            assert_eq!(view.issues.from_quests[0].id, issue.id);

            assert_eq!(view.pages.devlogs.len(), 1);
            assert_eq!(view.pages.devlogs[0].id, devlog.id);

            assert_eq!(view.statistics.issues.total, 1);
            assert_eq!(view.statistics.quests.total, 1);
        }

        it "deduplicates pages connected to both the project and its quest" {
            let project = create_project(&db, "Dedup");
            let quest = create_quest(&db, "Quest", Some(project.id));
            let devlog = create_devlog(&db, "Shared");

            db.connect_page(devlog.id, CreatePageConnectionInput {
                target: AttachTarget::Project(project.id),
            }).expect("Connect failed");
            db.connect_page(devlog.id, CreatePageConnectionInput {
                target: AttachTarget::Quest(quest.id),
            }).expect("Connect failed");

            let view = db.get_project_view(project.id)
                .expect("Query failed")
                .expect("Project missing");
            assert_eq!(view.pages.devlogs.len(), 1);
        }

        it "does not inherit from grandchild quests" {
            let project = create_project(&db, "Shallow");
            let quest = create_quest(&db, "Child", Some(project.id));
            let grandchild = db.create_quest(CreateQuestInput {
                title: "Grandchild".to_string(),
                quest_type: QuestType::Side,
                status: None,
                description: None,
                visibility: None,
                project_id: None,
                parent_id: Some(quest.id),
                tag_ids: None,
            }).expect("Failed");
            create_issue_on(&db, AttachTarget::Quest(grandchild.id), "too deep");

            let view = db.get_project_view(project.id)
                .expect("Query failed")
                .expect("Project missing");
            assert!(view.issues.direct.is_empty());
            assert!(view.issues.from_quests.is_empty());
        }

        it "lists direct child projects" {
            let parent = create_project(&db, "Parent");
            let child = create_child_project(&db, "Child", parent.id);

            let view = db.get_project_view(parent.id)
                .expect("Query failed")
                .expect("Project missing");
            assert_eq!(view.children.len(), 1);
            assert_eq!(view.children[0].id, child.id);
        }
    }

    describe "get_quest_view" {
        it "includes child quests one level deep" {
            let quest = create_quest(&db, "Main", None);
            let child = db.create_quest(CreateQuestInput {
                title: "Side".to_string(),
                quest_type: QuestType::Side,
                status: None,
                description: None,
                visibility: None,
                project_id: None,
                parent_id: Some(quest.id),
                tag_ids: None,
            }).expect("Failed");
            create_issue_on(&db, AttachTarget::Quest(child.id), "child issue");

            let view = db.get_quest_view(quest.id)
                .expect("Query failed")
                .expect("Quest missing");
            assert_eq!(view.children.len(), 1);
            assert_eq!(view.children[0].quest.id, child.id);
            assert_eq!(view.children[0].issues.len(), 1);
            assert!(view.children[0].children.is_empty());
        }
    }

    describe "get_devlog_view" {
        it "resolves the first connection as the target" {
            let project = create_project(&db, "Target");
            let devlog = create_devlog(&db, "Entry");
            db.connect_page(devlog.id, CreatePageConnectionInput {
                target: AttachTarget::Project(project.id),
            }).expect("Connect failed");

            let view = db.get_devlog_view(devlog.id)
                .expect("Query failed")
                .expect("Page missing");
            match view.target {
                Some(DevlogTarget::Project(p)) => assert_eq!(p.id, project.id),
                other => panic!("Unexpected target: {:?}", other),
            }
        }

        it "has no target when unconnected" {
            let devlog = create_devlog(&db, "Loose");
            let view = db.get_devlog_view(devlog.id)
                .expect("Query failed")
                .expect("Page missing");
            assert!(view.target.is_none());
        }

        it "buckets the target's issues" {
            let project = create_project(&db, "Bucketed");
            let devlog = create_devlog(&db, "Entry");
            db.connect_page(devlog.id, CreatePageConnectionInput {
                target: AttachTarget::Project(project.id),
            }).expect("Connect failed");

            let worked = create_issue_on(&db, AttachTarget::Project(project.id), "worked");
            db.link_devlog_issue(devlog.id, CreateDevlogIssueLinkInput {
                issue_id: worked.id,
                status_change: Some(IssueStatus::InProgress),
                work_notes: Some("made progress".to_string()),
            }).expect("Link failed");

            let untouched = create_issue_on(&db, AttachTarget::Project(project.id), "untouched");

            let view = db.get_devlog_view(devlog.id)
                .expect("Query failed")
                .expect("Page missing");
            assert_eq!(view.issues.in_progress.len(), 1);
            assert_eq!(view.issues.in_progress[0].id, worked.id);
            assert!(view
                .issues
                .still_outstanding
                .iter()
                .any(|i| i.id == untouched.id));
        }
    }

    describe "section_issues" {
        it "places terminal status changes in completed" {
            let issue = fake_issue(IssueStatus::Done, -1);
            let links = vec![fake_link(issue.id, Some(IssueStatus::Done), None)];

            let sections = section_issues(Utc::now(), vec![issue], &links);
            assert_eq!(sections.completed_in_devlog.len(), 1);
            assert!(sections.in_progress.is_empty());
        }

        it "treats notes without a terminal change as in progress" {
            let issue = fake_issue(IssueStatus::Open, -1);
            let links = vec![fake_link(issue.id, None, Some("poked at it"))];

            let sections = section_issues(Utc::now(), vec![issue], &links);
            assert_eq!(sections.in_progress.len(), 1);
        }

        it "marks linked issues created after the devlog as newly added" {
            let issue = fake_issue(IssueStatus::Open, 2);
            let links = vec![fake_link(issue.id, None, None)];

            let sections = section_issues(Utc::now(), vec![issue], &links);
            assert_eq!(sections.newly_added.len(), 1);
        }

        it "falls back to still outstanding for unlinked open issues" {
            let issue = fake_issue(IssueStatus::Open, -1);
            let sections = section_issues(Utc::now(), vec![issue], &[]);
            assert_eq!(sections.still_outstanding.len(), 1);
        }

        it "omits terminal issues with no work record" {
            let issue = fake_issue(IssueStatus::Cancelled, -1);
            let sections = section_issues(Utc::now(), vec![issue], &[]);
            assert!(sections.completed_in_devlog.is_empty());
            assert!(sections.in_progress.is_empty());
            assert!(sections.newly_added.is_empty());
            assert!(sections.still_outstanding.is_empty());
        }

        it "places every non-terminal issue in exactly one bucket" {
            let issues: Vec<Issue> = [
                IssueStatus::Open,
                IssueStatus::InProgress,
                IssueStatus::Blocked,
                IssueStatus::Postponed,
            ]
            .into_iter()
            .map(|s| fake_issue(s, -1))
            .collect();
            let links = vec![fake_link(issues[1].id, Some(IssueStatus::InProgress), None)];

            let total = issues.len();
            let sections = section_issues(Utc::now(), issues, &links);
            let bucketed = sections.completed_in_devlog.len()
                + sections.in_progress.len()
                + sections.newly_added.len()
                + sections.still_outstanding.len();
            assert_eq!(bucketed, total);
        }

        it "sorts buckets by status priority" {
            let open = fake_issue(IssueStatus::Open, -1);
            let blocked = fake_issue(IssueStatus::Blocked, -1);
            let in_progress = fake_issue(IssueStatus::InProgress, -1);

            let sections = section_issues(
                Utc::now(),
                vec![open.clone(), blocked.clone(), in_progress.clone()],
                &[],
            );
            let order: Vec<Uuid> = sections.still_outstanding.iter().map(|i| i.id).collect();
            assert_eq!(order, vec![in_progress.id, blocked.id, open.id]);
        }
    }

    describe "get_project_tree" {
        it "nests children under their parents" {
            let root = create_project(&db, "Root");
            let child = create_child_project(&db, "Child", root.id);
            let grandchild = create_child_project(&db, "Grandchild", child.id);

            let tree = db.get_project_tree(None, 3).expect("Query failed");
            assert_eq!(tree.len(), 1);
            assert_eq!(tree[0].project.id, root.id);
            assert_eq!(tree[0].children[0].project.id, child.id);
            assert_eq!(tree[0].children[0].children[0].project.id, grandchild.id);
        }

        it "caps nesting at the requested depth" {
            let root = create_project(&db, "Root");
            let child = create_child_project(&db, "Child", root.id);
            create_child_project(&db, "Grandchild", child.id);

            let tree = db.get_project_tree(None, 1).expect("Query failed");
            assert_eq!(tree.len(), 1);
            assert!(tree[0].children.is_empty());
        }

        it "roots the tree at a specific project" {
            let root = create_project(&db, "Root");
            let child = create_child_project(&db, "Child", root.id);

            let tree = db.get_project_tree(Some(child.id), 3).expect("Query failed");
            assert_eq!(tree.len(), 1);
            assert_eq!(tree[0].project.id, child.id);
        }
    }

    describe "search_portfolio" {
        it "only returns requested types" {
            create_project(&db, "Searchable Project");
            create_quest(&db, "Searchable Quest", None);

            let results = db
                .search_portfolio("Searchable", &[SearchType::Projects], 10)
                .expect("Search failed");
            assert_eq!(results.projects.as_ref().map(Vec::len), Some(1));
            assert!(results.quests.is_none());
        }

        it "matches substrings case-insensitively via LIKE" {
            create_project(&db, "Orbital Mechanics");

            let results = db
                .search_portfolio("orbital", &[SearchType::Projects], 10)
                .expect("Search failed");
            assert_eq!(results.projects.as_ref().map(Vec::len), Some(1));
        }

        it "honors the per-type limit" {
            for i in 0..5 {
                create_project(&db, &format!("Limited {}", i));
            }

            let results = db
                .search_portfolio("Limited", &[SearchType::Projects], 2)
                .expect("Search failed");
            assert_eq!(results.projects.as_ref().map(Vec::len), Some(2));
        }
    }

    describe "character_counts" {
        it "counts completed and abandoned quests" {
            let done = create_quest(&db, "Done", None);
            db.update_quest(done.id, UpdateQuestInput {
                title: None,
                quest_type: None,
                status: Some(QuestStatus::Completed),
                description: None,
                visibility: None,
                project_id: None,
                parent_id: None,
                tag_ids: None,
            }).expect("Update failed");

            let dropped = create_quest(&db, "Dropped", None);
            db.update_quest(dropped.id, UpdateQuestInput {
                title: None,
                quest_type: None,
                status: Some(QuestStatus::Abandoned),
                description: None,
                visibility: None,
                project_id: None,
                parent_id: None,
                tag_ids: None,
            }).expect("Update failed");

            let counts = db.character_counts().expect("Query failed");
            assert_eq!(counts.completed_quests, 1);
            assert_eq!(counts.abandoned_quests, 1);
        }

        it "only counts public achievements as unlocked" {
            db.create_item(CreateItemInput {
                item_name: "public-achievement".to_string(),
                title: "Public".to_string(),
                item_type: ItemType::Achievement,
                visibility: Some(Visibility::Public),
                icon: "trophy.png".to_string(),
                popup_content: None,
                position: None,
                tag_ids: None,
            }).expect("Failed");
            db.create_item(CreateItemInput {
                item_name: "hidden-achievement".to_string(),
                title: "Hidden".to_string(),
                item_type: ItemType::Achievement,
                visibility: Some(Visibility::Private),
                icon: "trophy.png".to_string(),
                popup_content: None,
                position: None,
                tag_ids: None,
            }).expect("Failed");

            let counts = db.character_counts().expect("Query failed");
            assert_eq!(counts.achievements, 1);
        }

        it "counts devlogs and linked projects" {
            create_devlog(&db, "Entry");
            db.create_project(CreateProjectInput {
                title: "Linked".to_string(),
                description: None,
                status: None,
                visibility: None,
                parent_id: None,
                link: Some("https://example.com".to_string()),
                start_date: None,
                end_date: None,
                tag_ids: None,
            }).expect("Failed");
            create_project(&db, "Unlinked");

            let counts = db.character_counts().expect("Query failed");
            assert_eq!(counts.devlogs, 1);
            assert_eq!(counts.linked_projects, 1);
        }
    }
}
