use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;

use super::TodoState;
use super::TodoStore;
use crate::domain::models::ClientError;
use crate::domain::models::LoginRequest;
use crate::domain::models::NewTodo;
use crate::domain::models::StorageArc;
use crate::domain::models::Todo;
use crate::domain::models::TodoChanges;
use crate::domain::services::fake_gateway::FakeGateway;
use crate::domain::services::SessionStore;
use crate::infrastructure::storage::memory::MemoryStorage;

fn todo(id: i64, name: &str, completed: bool) -> Todo {
    return Todo {
        id,
        name: name.to_string(),
        description: format!("{name} description"),
        completed,
    };
}

fn seed() -> Vec<Todo> {
    return vec![
        todo(1, "Buy oats", false),
        todo(2, "Water plants", true),
        todo(3, "Call the bank", false),
    ];
}

fn setup(todos: Vec<Todo>) -> (Arc<FakeGateway>, Arc<SessionStore>, TodoStore) {
    let gateway = Arc::new(FakeGateway::with_todos(todos));
    let storage: StorageArc = Arc::new(MemoryStorage::default());
    let session = Arc::new(SessionStore::new(gateway.clone(), storage));
    let store = TodoStore::new(gateway.clone(), session.clone());
    return (gateway, session, store);
}

fn assert_unique_ids(todos: &[Todo]) {
    let ids = todos.iter().map(|todo| return todo.id).collect::<HashSet<i64>>();
    assert_eq!(ids.len(), todos.len());
}

mod state {
    use super::*;

    #[test]
    fn it_collapses_duplicate_ids() {
        let mut state = TodoState::default();
        state.set_todos(vec![
            todo(1, "first", false),
            todo(2, "second", false),
            todo(1, "first again", true),
        ]);

        assert_eq!(state.todos.len(), 2);
        assert_eq!(state.todos[0].name, "first again");
        assert_unique_ids(&state.todos);
    }

    #[test]
    fn it_replaces_instead_of_duplicating_on_add() {
        let mut state = TodoState::default();
        state.set_todos(seed());
        state.add_todo(todo(2, "Water plants twice", false));

        assert_eq!(state.todos.len(), 3);
        assert_eq!(state.todos[1].name, "Water plants twice");
    }

    #[test]
    fn it_replaces_list_entry_and_selection_on_update() {
        let mut state = TodoState::default();
        state.set_todos(seed());
        state.current_todo = Some(todo(1, "Buy oats", false));

        let updated = Todo {
            id: 1,
            name: "Buy oats".to_string(),
            description: "".to_string(),
            completed: true,
        };
        state.update_todo(updated.clone());

        assert_eq!(state.todos[0], updated);
        assert_eq!(state.current_todo, Some(updated));
    }

    #[test]
    fn it_leaves_other_selection_alone_on_update() {
        let mut state = TodoState::default();
        state.set_todos(seed());
        state.current_todo = Some(todo(3, "Call the bank", false));

        state.update_todo(todo(1, "Buy oats", true));

        assert_eq!(state.current_todo, Some(todo(3, "Call the bank", false)));
    }

    #[test]
    fn it_clears_selection_on_delete() {
        let mut state = TodoState::default();
        state.set_todos(seed());
        state.current_todo = Some(todo(2, "Water plants", true));

        state.delete_todo(2);

        assert_eq!(state.todos.len(), 2);
        assert_eq!(state.current_todo, None);
    }
}

mod getters {
    use super::*;

    #[tokio::test]
    async fn it_splits_completed_and_pending() -> Result<()> {
        let (_gateway, _session, store) = setup(seed());
        store.fetch_todos().await?;

        assert_eq!(store.todo_count(), 3);
        assert_eq!(store.completed_count(), 1);
        assert_eq!(store.pending_count(), 2);
        assert_eq!(store.completed_todos()[0].id, 2);
        assert_eq!(store.todo_by_id(3).map(|e| return e.name), Some("Call the bank".to_string()));
        assert_eq!(store.todo_by_id(99), None);
        return Ok(());
    }
}

mod actions {
    use super::*;

    #[tokio::test]
    async fn it_fetches_todos() -> Result<()> {
        let (_gateway, _session, store) = setup(seed());

        let res = store.fetch_todos().await?;

        assert_eq!(res.len(), 3);
        assert_eq!(store.all_todos(), seed());
        assert!(!store.is_loading());
        assert_eq!(store.error(), None);
        return Ok(());
    }

    #[tokio::test]
    async fn it_stores_fetch_failures() {
        let (gateway, _session, store) = setup(seed());
        gateway.fail("list", ClientError::service(500, "Failed to fetch todos"));

        let err = store.fetch_todos().await.unwrap_err();

        assert_eq!(err.message(), "Failed to fetch todos");
        assert_eq!(store.error(), Some("Failed to fetch todos".to_string()));
        assert!(!store.is_loading());
        assert!(store.all_todos().is_empty());
    }

    #[tokio::test]
    async fn it_selects_a_standalone_todo() -> Result<()> {
        let (_gateway, _session, store) = setup(seed());

        let res = store.fetch_todo_by_id(2).await?;

        assert_eq!(res.id, 2);
        assert_eq!(store.current_todo(), Some(res));
        assert!(store.all_todos().is_empty());

        store.clear_current_todo();
        assert_eq!(store.current_todo(), None);
        return Ok(());
    }

    #[tokio::test]
    async fn it_counts_guest_creates() -> Result<()> {
        let (_gateway, session, store) = setup(vec![]);

        let created = store.create_todo(NewTodo::new("Sweep", "Kitchen")).await?;

        assert_eq!(store.all_todos(), vec![created]);
        assert_eq!(session.guest_todo_count(), 1);
        return Ok(());
    }

    #[tokio::test]
    async fn it_does_not_count_authenticated_creates() -> Result<()> {
        let (_gateway, session, store) = setup(vec![]);
        session
            .login(LoginRequest {
                username_or_email: "a@b.com".to_string(),
                password: "x".to_string(),
            })
            .await?;

        store.create_todo(NewTodo::new("Sweep", "Kitchen")).await?;

        assert_eq!(session.guest_todo_count(), 0);
        return Ok(());
    }

    #[tokio::test]
    async fn it_keeps_guest_limit_flag_on_create() -> Result<()> {
        let (gateway, session, store) = setup(seed());
        store.fetch_todos().await?;
        session.set_guest_todo_count(3);
        gateway.fail(
            "create",
            ClientError::GuestLimitExceeded {
                message: "limit reached".to_string(),
            },
        );

        let err = store
            .create_todo(NewTodo::new("Fourth", ""))
            .await
            .unwrap_err();

        assert!(err.guest_limit_reached());
        assert_eq!(store.error(), Some("limit reached".to_string()));
        assert_eq!(store.all_todos(), seed());
        assert_eq!(session.guest_todo_count(), 3);
        return Ok(());
    }

    #[tokio::test]
    async fn it_commits_the_server_record_on_update() -> Result<()> {
        let (gateway, _session, store) = setup(seed());
        store.fetch_todos().await?;
        store.fetch_todo_by_id(1).await?;

        let mut changed_elsewhere = todo(1, "Buy oats", false);
        changed_elsewhere.description = "Changed on the server".to_string();
        gateway.edit_server_todo(changed_elsewhere);

        let res = store
            .update_todo(
                1,
                TodoChanges {
                    completed: Some(true),
                    ..TodoChanges::default()
                },
            )
            .await?;

        assert_eq!(res.description, "Changed on the server");
        assert_eq!(store.todo_by_id(1), Some(res.clone()));
        assert_eq!(store.current_todo(), Some(res));
        return Ok(());
    }

    #[tokio::test]
    async fn it_leaves_list_unchanged_when_update_fails() -> Result<()> {
        let (gateway, _session, store) = setup(seed());
        store.fetch_todos().await?;
        gateway.fail("update", ClientError::service(500, "Failed to update todo"));

        let err = store
            .update_todo(1, TodoChanges::toggled(&todo(1, "Buy oats", false)))
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::service(500, "Failed to update todo"));
        assert_eq!(store.error(), Some("Failed to update todo".to_string()));
        assert!(!store.is_loading());
        assert_eq!(store.all_todos(), seed());

        store.clear_error();
        assert_eq!(store.error(), None);
        return Ok(());
    }

    #[tokio::test]
    async fn it_clears_selection_when_deleting_it() -> Result<()> {
        let (_gateway, _session, store) = setup(seed());
        store.fetch_todos().await?;
        store.fetch_todo_by_id(3).await?;

        store.delete_todo(3).await?;

        assert_eq!(store.current_todo(), None);
        assert_eq!(store.todo_by_id(3), None);
        assert_eq!(store.todo_count(), 2);
        return Ok(());
    }

    #[tokio::test]
    async fn it_releases_guest_quota_on_delete() -> Result<()> {
        let (_gateway, session, store) = setup(seed());
        store.fetch_todos().await?;
        session.set_guest_todo_count(1);

        store.delete_todo(1).await?;
        store.delete_todo(2).await?;

        assert_eq!(session.guest_todo_count(), 0);
        return Ok(());
    }

    #[tokio::test]
    async fn it_never_duplicates_ids() -> Result<()> {
        let (_gateway, _session, store) = setup(seed());
        store.fetch_todos().await?;

        let first = store.create_todo(NewTodo::new("a", "")).await?;
        store.create_todo(NewTodo::new("b", "")).await?;
        store.delete_todo(first.id).await?;
        store.create_todo(NewTodo::new("c", "")).await?;
        store.fetch_todos().await?;
        store.delete_todo(2).await?;

        assert_eq!(store.todo_count(), 4);
        assert_unique_ids(&store.all_todos());
        return Ok(());
    }
}

mod toggle {
    use super::*;

    #[tokio::test]
    async fn it_flips_only_completed() -> Result<()> {
        let (_gateway, _session, store) = setup(seed());
        store.fetch_todos().await?;

        let res = store.toggle_todo_complete(2).await?;

        assert!(!res.completed);
        assert_eq!(res.name, "Water plants");
        assert_eq!(res.description, "Water plants description");
        assert_eq!(store.todo_by_id(2), Some(res));
        return Ok(());
    }

    #[tokio::test]
    async fn it_fails_without_a_network_call_for_unknown_ids() {
        let (gateway, _session, store) = setup(seed());

        let err = store.toggle_todo_complete(5).await.unwrap_err();

        assert_eq!(err, ClientError::NotFound { id: 5 });
        assert!(gateway.calls().is_empty());
        assert_eq!(store.snapshot(), TodoState::default());
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn it_lets_the_last_action_to_finish_set_the_flags() -> Result<()> {
        let (gateway, _session, store) = setup(seed());
        gateway.fail("delete", ClientError::service(500, "Failed to delete todo"));
        let gate = gateway.hold("delete");

        let (deleted, listed) = tokio::join!(store.delete_todo(1), async {
            let res = store.fetch_todos().await;
            gate.notify_one();
            return res;
        });

        assert!(deleted.is_err());
        assert_eq!(listed?.len(), 3);
        assert_eq!(store.error(), Some("Failed to delete todo".to_string()));
        assert!(!store.is_loading());
        assert_eq!(store.todo_count(), 3);
        return Ok(());
    }

    #[tokio::test]
    async fn it_does_not_deduplicate_requests() -> Result<()> {
        let (gateway, _session, store) = setup(vec![]);

        let (first, second) = tokio::join!(
            store.create_todo(NewTodo::new("same", "")),
            store.create_todo(NewTodo::new("same", ""))
        );

        assert_ne!(first?.id, second?.id);
        assert_eq!(gateway.server_todos().len(), 2);
        assert_eq!(store.todo_count(), 2);
        return Ok(());
    }
}
