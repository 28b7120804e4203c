use questlog::db::Database;
use questlog::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn create_test_project(db: &Database, title: &str) -> Project {
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

fn create_test_quest(db: &Database, project_id: Option<Uuid>) -> Quest {
    db.create_quest(CreateQuestInput {
        title: "Test Quest".to_string(),
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

fn create_test_tag(db: &Database, name: &str) -> Tag {
    db.create_tag(CreateTagInput {
        name: name.to_string(),
        color: "#ff8800".to_string(),
    })
    .expect("Failed to create tag")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "projects" {
        describe "create_project" {
            it "slugifies the title" {
                let project = create_test_project(&db, "My Project");
                assert_eq!(project.slug, "my-project");
                assert_eq!(project.status, ProjectStatus::Planning);
                assert_eq!(project.visibility, Visibility::Private);
            }

            it "suffixes the slug when the title collides" {
                let first = create_test_project(&db, "My Project");
                let second = create_test_project(&db, "My Project");
                let third = create_test_project(&db, "My Project");

                assert_eq!(first.slug, "my-project");
                assert_eq!(second.slug, "my-project-1");
                assert_eq!(third.slug, "my-project-2");
            }

            it "attaches requested tags" {
                let tag = create_test_tag(&db, "rust");
                let project = db.create_project(CreateProjectInput {
                    title: "Tagged".to_string(),
                    description: None,
                    status: None,
                    visibility: None,
                    parent_id: None,
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: Some(vec![tag.id]),
                }).expect("Failed to create project");

                assert_eq!(project.tags.len(), 1);
                assert_eq!(project.tags[0].name, "rust");
            }
        }

        describe "get_project_by_slug" {
            it "finds the project" {
                let created = create_test_project(&db, "Findable");
                let found = db.get_project_by_slug("findable").expect("Query failed");
                assert_eq!(found.unwrap().id, created.id);
            }

            it "returns None for an unknown slug" {
                assert!(db.get_project_by_slug("nope").expect("Query failed").is_none());
            }
        }

        describe "get_all_projects" {
            it "applies equality filters" {
                let public = db.create_project(CreateProjectInput {
                    title: "Public".to_string(),
                    description: None,
                    status: None,
                    visibility: Some(Visibility::Public),
                    parent_id: None,
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: None,
                }).expect("Failed");
                create_test_project(&db, "Private");

                let filter = ProjectFilter {
                    visibility: Some(Visibility::Public),
                    ..Default::default()
                };
                let projects = db.get_all_projects(&filter).expect("Query failed");
                assert_eq!(projects.len(), 1);
                assert_eq!(projects[0].id, public.id);
            }
        }

        describe "update_project" {
            it "keeps unspecified fields" {
                let project = create_test_project(&db, "Original");
                let updated = db.update_project(project.id, UpdateProjectInput {
                    title: None,
                    description: Some("now described".to_string()),
                    status: None,
                    visibility: None,
                    parent_id: None,
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: None,
                }).expect("Update failed").expect("Project missing");

                assert_eq!(updated.title, "Original");
                assert_eq!(updated.description, Some("now described".to_string()));
            }

            it "replaces all tags when tag_ids is given" {
                let old_tag = create_test_tag(&db, "old");
                let new_tag = create_test_tag(&db, "new");

                let project = db.create_project(CreateProjectInput {
                    title: "Retagged".to_string(),
                    description: None,
                    status: None,
                    visibility: None,
                    parent_id: None,
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: Some(vec![old_tag.id]),
                }).expect("Failed");

                let updated = db.update_project(project.id, UpdateProjectInput {
                    title: None,
                    description: None,
                    status: None,
                    visibility: None,
                    parent_id: None,
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: Some(vec![new_tag.id]),
                }).expect("Update failed").expect("Project missing");

                assert_eq!(updated.tags.len(), 1);
                assert_eq!(updated.tags[0].name, "new");
            }

            it "clears tags with an empty list but keeps them with None" {
                let tag = create_test_tag(&db, "sticky");
                let project = db.create_project(CreateProjectInput {
                    title: "Sticky".to_string(),
                    description: None,
                    status: None,
                    visibility: None,
                    parent_id: None,
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: Some(vec![tag.id]),
                }).expect("Failed");

                let kept = db.update_project(project.id, UpdateProjectInput {
                    title: Some("Renamed".to_string()),
                    description: None,
                    status: None,
                    visibility: None,
                    parent_id: None,
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: None,
                }).expect("Update failed").expect("Project missing");
                assert_eq!(kept.tags.len(), 1);

                let cleared = db.update_project(project.id, UpdateProjectInput {
                    title: None,
                    description: None,
                    status: None,
                    visibility: None,
                    parent_id: None,
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: Some(vec![]),
                }).expect("Update failed").expect("Project missing");
                assert!(cleared.tags.is_empty());
            }
        }

        describe "delete_project" {
            it "detaches quests and child projects instead of deleting them" {
                let parent = create_test_project(&db, "Parent");
                let quest = create_test_quest(&db, Some(parent.id));
                let child = db.create_project(CreateProjectInput {
                    title: "Child".to_string(),
                    description: None,
                    status: None,
                    visibility: None,
                    parent_id: Some(parent.id),
                    link: None,
                    start_date: None,
                    end_date: None,
                    tag_ids: None,
                }).expect("Failed");

                assert!(db.delete_project(parent.id).expect("Delete failed"));

                let quest = db.get_quest(quest.id).expect("Query failed").expect("Quest gone");
                assert!(quest.project_id.is_none());

                let child = db.get_project(child.id).expect("Query failed").expect("Child gone");
                assert!(child.parent_id.is_none());
            }

            it "removes issues attached to the project" {
                let project = create_test_project(&db, "Doomed");
                let issue = db.create_issue(CreateIssueInput {
                    target: AttachTarget::Project(project.id),
                    issue_type: IssueType::Bug,
                    severity: Some(Severity::Minor),
                    title: "Crashes".to_string(),
                    description: None,
                    status: None,
                }).expect("Failed to create issue");

                db.delete_project(project.id).expect("Delete failed");
                assert!(db.get_issue(issue.id).expect("Query failed").is_none());
            }
        }
    }

    describe "quests" {
        describe "create_quest" {
            it "rejects an unknown project id" {
                let result = db.create_quest(CreateQuestInput {
                    title: "Orphan".to_string(),
                    quest_type: QuestType::Side,
                    status: None,
                    description: None,
                    visibility: None,
                    project_id: Some(Uuid::new_v4()),
                    parent_id: None,
                    tag_ids: None,
                });
                assert!(result.is_err());
            }

            it "defaults to planned status" {
                let quest = create_test_quest(&db, None);
                assert_eq!(quest.status, QuestStatus::Planned);
            }
        }

        describe "delete_quest" {
            it "cascades to subquests" {
                let quest = create_test_quest(&db, None);
                let sub = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "Step one".to_string(),
                    position: None,
                }).expect("Failed to create subquest");

                db.delete_quest(quest.id).expect("Delete failed");

                let remaining = db.get_subquests(quest.id).expect("Query failed");
                assert!(remaining.iter().all(|s| s.id != sub.id));
                assert!(remaining.is_empty());
            }
        }

        describe "subquests" {
            it "appends positions in creation order" {
                let quest = create_test_quest(&db, None);
                let a = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "A".to_string(),
                    position: None,
                }).expect("Failed");
                let b = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "B".to_string(),
                    position: None,
                }).expect("Failed");

                assert!(a.position < b.position);
            }

            it "reorders atomically" {
                let quest = create_test_quest(&db, None);
                let a = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "A".to_string(),
                    position: None,
                }).expect("Failed");
                let b = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "B".to_string(),
                    position: None,
                }).expect("Failed");

                let reordered = db.reorder_subquests(quest.id, &[b.id, a.id])
                    .expect("Reorder failed");
                assert_eq!(reordered[0].id, b.id);
                assert_eq!(reordered[1].id, a.id);
            }

            it "rejects a reorder that misses a subquest" {
                let quest = create_test_quest(&db, None);
                let a = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "A".to_string(),
                    position: None,
                }).expect("Failed");
                db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "B".to_string(),
                    position: None,
                }).expect("Failed");

                assert!(db.reorder_subquests(quest.id, &[a.id]).is_err());
            }

            it "rejects a reorder that repeats a subquest" {
                let quest = create_test_quest(&db, None);
                let a = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "A".to_string(),
                    position: None,
                }).expect("Failed");
                let b = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "B".to_string(),
                    position: None,
                }).expect("Failed");

                assert!(db.reorder_subquests(quest.id, &[a.id, a.id]).is_err());

                // Positions stay distinct and untouched
                let subquests = db.get_subquests(quest.id).expect("Query failed");
                assert_eq!(subquests[0].id, a.id);
                assert_eq!(subquests[1].id, b.id);
                assert_ne!(subquests[0].position, subquests[1].position);
            }

            it "rejects a reorder containing a foreign subquest" {
                let quest = create_test_quest(&db, None);
                let other = create_test_quest(&db, None);
                let mine = db.create_subquest(quest.id, CreateSubQuestInput {
                    title: "Mine".to_string(),
                    position: None,
                }).expect("Failed");
                let theirs = db.create_subquest(other.id, CreateSubQuestInput {
                    title: "Theirs".to_string(),
                    position: None,
                }).expect("Failed");

                let result = db.reorder_subquests(quest.id, &[theirs.id]);
                assert!(result.is_err());

                // Original order is untouched
                let subquests = db.get_subquests(quest.id).expect("Query failed");
                assert_eq!(subquests.len(), 1);
                assert_eq!(subquests[0].id, mine.id);
            }
        }
    }

    describe "issues" {
        describe "severity rules" {
            it "requires a severity on bugs" {
                let project = create_test_project(&db, "Buggy");
                let result = db.create_issue(CreateIssueInput {
                    target: AttachTarget::Project(project.id),
                    issue_type: IssueType::Bug,
                    severity: None,
                    title: "No severity".to_string(),
                    description: None,
                    status: None,
                });
                assert!(result.is_err());
            }

            it "rejects a severity on improvements" {
                let project = create_test_project(&db, "Improvable");
                let result = db.create_issue(CreateIssueInput {
                    target: AttachTarget::Project(project.id),
                    issue_type: IssueType::Improvement,
                    severity: Some(Severity::Major),
                    title: "Too severe".to_string(),
                    description: None,
                    status: None,
                });
                assert!(result.is_err());
            }

            it "drops the severity when a bug becomes an improvement" {
                let project = create_test_project(&db, "Shifting");
                let issue = db.create_issue(CreateIssueInput {
                    target: AttachTarget::Project(project.id),
                    issue_type: IssueType::Bug,
                    severity: Some(Severity::Critical),
                    title: "Reclassified".to_string(),
                    description: None,
                    status: None,
                }).expect("Failed");

                let updated = db.update_issue(issue.id, UpdateIssueInput {
                    issue_type: Some(IssueType::Improvement),
                    severity: None,
                    title: None,
                    description: None,
                    status: None,
                }).expect("Update failed").expect("Issue missing");

                assert_eq!(updated.issue_type, IssueType::Improvement);
                assert!(updated.severity.is_none());
            }
        }

        describe "create_issue" {
            it "rejects an unknown target" {
                let result = db.create_issue(CreateIssueInput {
                    target: AttachTarget::Quest(Uuid::new_v4()),
                    issue_type: IssueType::Improvement,
                    severity: None,
                    title: "Dangling".to_string(),
                    description: None,
                    status: None,
                });
                assert!(result.is_err());
            }
        }

        describe "get_issues_by_target" {
            it "only returns issues on the given target" {
                let project = create_test_project(&db, "Mine");
                let quest = create_test_quest(&db, Some(project.id));

                db.create_issue(CreateIssueInput {
                    target: AttachTarget::Project(project.id),
                    issue_type: IssueType::Improvement,
                    severity: None,
                    title: "On project".to_string(),
                    description: None,
                    status: None,
                }).expect("Failed");
                db.create_issue(CreateIssueInput {
                    target: AttachTarget::Quest(quest.id),
                    issue_type: IssueType::Improvement,
                    severity: None,
                    title: "On quest".to_string(),
                    description: None,
                    status: None,
                }).expect("Failed");

                let on_project = db.get_issues_by_target(AttachTarget::Project(project.id))
                    .expect("Query failed");
                assert_eq!(on_project.len(), 1);
                assert_eq!(on_project[0].title, "On project");
            }
        }
    }

    describe "tags" {
        it "rejects duplicate names" {
            create_test_tag(&db, "unique");
            let result = db.create_tag(CreateTagInput {
                name: "unique".to_string(),
                color: "#000000".to_string(),
            });
            assert!(result.is_err());
        }

        it "deleting a tag removes it from tagged entities" {
            let tag = create_test_tag(&db, "fleeting");
            let project = db.create_project(CreateProjectInput {
                title: "Tagged".to_string(),
                description: None,
                status: None,
                visibility: None,
                parent_id: None,
                link: None,
                start_date: None,
                end_date: None,
                tag_ids: Some(vec![tag.id]),
            }).expect("Failed");

            db.delete_tag(tag.id).expect("Delete failed");

            let project = db.get_project(project.id).expect("Query failed").expect("Gone");
            assert!(project.tags.is_empty());
        }
    }

    describe "inventory" {
        it "appends positions per item type" {
            let inv = db.create_item(CreateItemInput {
                item_name: "sword".to_string(),
                title: "Sword".to_string(),
                item_type: ItemType::Inventory,
                visibility: None,
                icon: "sword.png".to_string(),
                popup_content: None,
                position: None,
                tag_ids: None,
            }).expect("Failed");
            let ach = db.create_item(CreateItemInput {
                item_name: "first-release".to_string(),
                title: "First Release".to_string(),
                item_type: ItemType::Achievement,
                visibility: None,
                icon: "trophy.png".to_string(),
                popup_content: None,
                position: None,
                tag_ids: None,
            }).expect("Failed");

            // Each type has its own position sequence
            assert_eq!(inv.position, 0);
            assert_eq!(ach.position, 0);
        }

        it "rejects reorders that mix item types" {
            let inv = db.create_item(CreateItemInput {
                item_name: "shield".to_string(),
                title: "Shield".to_string(),
                item_type: ItemType::Inventory,
                visibility: None,
                icon: "shield.png".to_string(),
                popup_content: None,
                position: None,
                tag_ids: None,
            }).expect("Failed");

            let result = db.reorder_items(&ReorderItemsInput {
                item_type: ItemType::Achievement,
                item_ids: vec![inv.id],
            });
            assert!(result.is_err());
        }

        it "rejects reorders that repeat an item" {
            let a = db.create_item(CreateItemInput {
                item_name: "sword".to_string(),
                title: "Sword".to_string(),
                item_type: ItemType::Inventory,
                visibility: None,
                icon: "sword.png".to_string(),
                popup_content: None,
                position: None,
                tag_ids: None,
            }).expect("Failed");
            let b = db.create_item(CreateItemInput {
                item_name: "shield".to_string(),
                title: "Shield".to_string(),
                item_type: ItemType::Inventory,
                visibility: None,
                icon: "shield.png".to_string(),
                popup_content: None,
                position: None,
                tag_ids: None,
            }).expect("Failed");

            let result = db.reorder_items(&ReorderItemsInput {
                item_type: ItemType::Inventory,
                item_ids: vec![a.id, a.id],
            });
            assert!(result.is_err());

            let items = db.get_all_items(&ItemFilter {
                item_type: Some(ItemType::Inventory),
                visibility: None,
            }).expect("Query failed");
            assert_eq!(items[0].id, a.id);
            assert_eq!(items[1].id, b.id);
            assert_ne!(items[0].position, items[1].position);
        }
    }

    describe "contact_messages" {
        it "starts unread and can be marked read" {
            let message = db.create_message(CreateMessageInput {
                email: "someone@example.com".to_string(),
                name: "Someone".to_string(),
                category: MessageCategory::Feedback,
                subject: None,
                message: "Nice site".to_string(),
            }).expect("Failed to create message");
            assert_eq!(message.status, MessageStatus::Unread);

            assert!(db.update_message_status(message.id, MessageStatus::Read)
                .expect("Update failed"));

            let reloaded = db.get_message(message.id).expect("Query failed").expect("Gone");
            assert_eq!(reloaded.status, MessageStatus::Read);
        }

        it "filters by status" {
            db.create_message(CreateMessageInput {
                email: "a@example.com".to_string(),
                name: "A".to_string(),
                category: MessageCategory::General,
                subject: None,
                message: "hi".to_string(),
            }).expect("Failed");

            let unread = db.get_all_messages(&MessageFilter {
                status: Some(MessageStatus::Unread),
                category: None,
            }).expect("Query failed");
            assert_eq!(unread.len(), 1);

            let replied = db.get_all_messages(&MessageFilter {
                status: Some(MessageStatus::Replied),
                category: None,
            }).expect("Query failed");
            assert!(replied.is_empty());
        }
    }

    describe "page_connections" {
        it "rejects connecting to a missing target" {
            let page = db.create_page(CreatePageInput {
                title: "Devlog 1".to_string(),
                page_type: PageType::Devlog,
                content: "wrote code".to_string(),
                visibility: None,
                project_status: None,
                project_start_date: None,
                project_end_date: None,
                tag_ids: None,
            }).expect("Failed");

            let result = db.connect_page(page.id, CreatePageConnectionInput {
                target: AttachTarget::Project(Uuid::new_v4()),
            });
            assert!(result.is_err());
        }

        it "connects and disconnects a page" {
            let project = create_test_project(&db, "Connected");
            let page = db.create_page(CreatePageInput {
                title: "Devlog 1".to_string(),
                page_type: PageType::Devlog,
                content: "wrote code".to_string(),
                visibility: None,
                project_status: None,
                project_start_date: None,
                project_end_date: None,
                tag_ids: None,
            }).expect("Failed");

            let conn = db.connect_page(page.id, CreatePageConnectionInput {
                target: AttachTarget::Project(project.id),
            }).expect("Connect failed");

            let connections = db.get_page_connections(page.id).expect("Query failed");
            assert_eq!(connections.len(), 1);

            assert!(db.disconnect_page(conn.id).expect("Disconnect failed"));
            assert!(db.get_page_connections(page.id).expect("Query failed").is_empty());
        }
    }

    describe "devlog_links" {
        it "re-linking an issue keeps the stored link row" {
            let project = create_test_project(&db, "Linked");
            let issue = db.create_issue(CreateIssueInput {
                target: AttachTarget::Project(project.id),
                issue_type: IssueType::Bug,
                severity: Some(Severity::Minor),
                title: "Flaky save".to_string(),
                description: None,
                status: None,
            }).expect("Failed");
            let devlog = db.create_page(CreatePageInput {
                title: "Devlog 1".to_string(),
                page_type: PageType::Devlog,
                content: "worked on saves".to_string(),
                visibility: None,
                project_status: None,
                project_start_date: None,
                project_end_date: None,
                tag_ids: None,
            }).expect("Failed");

            let first = db.link_devlog_issue(devlog.id, CreateDevlogIssueLinkInput {
                issue_id: issue.id,
                status_change: None,
                work_notes: Some("dug in".to_string()),
            }).expect("Link failed");
            let second = db.link_devlog_issue(devlog.id, CreateDevlogIssueLinkInput {
                issue_id: issue.id,
                status_change: Some(IssueStatus::Done),
                work_notes: Some("fixed".to_string()),
            }).expect("Relink failed");

            // Upsert keeps the original row id and created_at but
            // overwrites the status change and notes
            assert_eq!(second.id, first.id);
            assert_eq!(second.created_at, first.created_at);

            let links = db.get_devlog_issue_links(devlog.id).expect("Query failed");
            assert_eq!(links.len(), 1);
            assert_eq!(links[0].id, second.id);
            assert_eq!(links[0].status_change, Some(IssueStatus::Done));
            assert_eq!(links[0].work_notes, Some("fixed".to_string()));
        }

        it "re-linking a subquest keeps the stored link row" {
            let quest = create_test_quest(&db, None);
            let sub = db.create_subquest(quest.id, CreateSubQuestInput {
                title: "Stepwise".to_string(),
                position: None,
            }).expect("Failed");
            let devlog = db.create_page(CreatePageInput {
                title: "Devlog 2".to_string(),
                page_type: PageType::Devlog,
                content: "chipped away".to_string(),
                visibility: None,
                project_status: None,
                project_start_date: None,
                project_end_date: None,
                tag_ids: None,
            }).expect("Failed");

            let first = db.link_devlog_subquest(devlog.id, CreateDevlogSubquestLinkInput {
                subquest_id: sub.id,
                completed: None,
                work_notes: None,
            }).expect("Link failed");
            let second = db.link_devlog_subquest(devlog.id, CreateDevlogSubquestLinkInput {
                subquest_id: sub.id,
                completed: Some(true),
                work_notes: None,
            }).expect("Relink failed");

            assert_eq!(second.id, first.id);

            let links = db.get_devlog_subquest_links(devlog.id).expect("Query failed");
            assert_eq!(links.len(), 1);
            assert_eq!(links[0].id, first.id);
            assert_eq!(links[0].completed, Some(true));
        }
    }
}
