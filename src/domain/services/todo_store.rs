#[cfg(test)]
#[path = "todo_store_test.rs"]
mod tests;

use std::sync::Arc;

use parking_lot::Mutex;

use super::SessionStore;
use crate::domain::models::ClientError;
use crate::domain::models::ClientResult;
use crate::domain::models::GatewayArc;
use crate::domain::models::NewTodo;
use crate::domain::models::Todo;
use crate::domain::models::TodoChanges;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoState {
    pub todos: Vec<Todo>,
    pub current_todo: Option<Todo>,
    pub loading: bool,
    pub error: Option<String>,
}

impl TodoState {
    /// Replaces the list. Repeated ids collapse into one entry holding the
    /// last record seen for that id.
    pub fn set_todos(&mut self, todos: Vec<Todo>) {
        self.todos = Vec::with_capacity(todos.len());
        for todo in todos {
            self.upsert(todo);
        }
    }

    pub fn add_todo(&mut self, todo: Todo) {
        self.upsert(todo);
    }

    /// Swaps in the service's record wholesale, both in the list and in the
    /// current selection.
    pub fn update_todo(&mut self, todo: Todo) {
        if let Some(existing) = self.todos.iter_mut().find(|e| return e.id == todo.id) {
            *existing = todo.clone();
        }

        if self.current_todo.as_ref().map(|e| return e.id) == Some(todo.id) {
            self.current_todo = Some(todo);
        }
    }

    pub fn delete_todo(&mut self, id: i64) {
        self.todos.retain(|todo| return todo.id != id);

        if self.current_todo.as_ref().map(|e| return e.id) == Some(id) {
            self.current_todo = None;
        }
    }

    fn upsert(&mut self, todo: Todo) {
        match self.todos.iter_mut().find(|e| return e.id == todo.id) {
            Some(existing) => *existing = todo,
            None => self.todos.push(todo),
        }
    }
}

/// The client's copy of the to-do list. Every action makes exactly one call to
/// the gateway and then commits the service's answer.
///
/// `loading` and `error` are shared by all actions. When actions overlap, the
/// one that finishes last decides what they read.
pub struct TodoStore {
    gateway: GatewayArc,
    session: Arc<SessionStore>,
    state: Mutex<TodoState>,
}

impl TodoStore {
    pub fn new(gateway: GatewayArc, session: Arc<SessionStore>) -> TodoStore {
        return TodoStore {
            gateway,
            session,
            state: Mutex::new(TodoState::default()),
        };
    }

    pub fn snapshot(&self) -> TodoState {
        return self.state.lock().clone();
    }

    pub fn all_todos(&self) -> Vec<Todo> {
        return self.state.lock().todos.clone();
    }

    pub fn completed_todos(&self) -> Vec<Todo> {
        return self.filtered(true);
    }

    pub fn pending_todos(&self) -> Vec<Todo> {
        return self.filtered(false);
    }

    pub fn current_todo(&self) -> Option<Todo> {
        return self.state.lock().current_todo.clone();
    }

    pub fn is_loading(&self) -> bool {
        return self.state.lock().loading;
    }

    pub fn error(&self) -> Option<String> {
        return self.state.lock().error.clone();
    }

    pub fn todo_count(&self) -> usize {
        return self.state.lock().todos.len();
    }

    pub fn completed_count(&self) -> usize {
        return self.completed_todos().len();
    }

    pub fn pending_count(&self) -> usize {
        return self.pending_todos().len();
    }

    pub fn todo_by_id(&self, id: i64) -> Option<Todo> {
        return self
            .state
            .lock()
            .todos
            .iter()
            .find(|todo| return todo.id == id)
            .cloned();
    }

    #[allow(clippy::implicit_return)]
    pub async fn fetch_todos(&self) -> ClientResult<Vec<Todo>> {
        self.begin();
        let res = self.gateway.list_todos().await;
        return self.settle("fetch_todos", res, |state, todos| {
            state.set_todos(todos.to_vec());
        });
    }

    #[allow(clippy::implicit_return)]
    pub async fn fetch_todo_by_id(&self, id: i64) -> ClientResult<Todo> {
        self.begin();
        let res = self.gateway.get_todo(id).await;
        return self.settle("fetch_todo_by_id", res, |state, todo| {
            state.current_todo = Some(todo.clone());
        });
    }

    /// Guests have their local quota counter bumped on success.
    #[allow(clippy::implicit_return)]
    pub async fn create_todo(&self, todo: NewTodo) -> ClientResult<Todo> {
        self.begin();
        let res = self.gateway.create_todo(todo).await;
        let res = self.settle("create_todo", res, |state, todo| {
            state.add_todo(todo.clone());
        });

        if res.is_ok() && !self.session.is_authenticated() {
            self.session.increment_guest_count();
        }

        return res;
    }

    #[allow(clippy::implicit_return)]
    pub async fn update_todo(&self, id: i64, changes: TodoChanges) -> ClientResult<Todo> {
        self.begin();
        let res = self.gateway.update_todo(id, changes).await;
        return self.settle("update_todo", res, |state, todo| {
            state.update_todo(todo.clone());
        });
    }

    #[allow(clippy::implicit_return)]
    pub async fn delete_todo(&self, id: i64) -> ClientResult<()> {
        self.begin();
        let res = self.gateway.delete_todo(id).await;
        let res = self.settle("delete_todo", res, |state, _| {
            state.delete_todo(id);
        });

        if res.is_ok() && !self.session.is_authenticated() {
            self.session.decrement_guest_count();
        }

        return res;
    }

    /// Flips `completed` on a to-do already in the list. Does not fetch, an
    /// unknown id fails without touching the network or the store.
    #[allow(clippy::implicit_return)]
    pub async fn toggle_todo_complete(&self, id: i64) -> ClientResult<Todo> {
        let todo = match self.todo_by_id(id) {
            Some(todo) => todo,
            None => {
                tracing::warn!(id = id, "Cannot toggle a todo that is not loaded");
                return Err(ClientError::NotFound { id });
            }
        };

        return self.update_todo(id, TodoChanges::toggled(&todo)).await;
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    pub fn clear_current_todo(&self) {
        self.state.lock().current_todo = None;
    }

    fn filtered(&self, completed: bool) -> Vec<Todo> {
        return self
            .state
            .lock()
            .todos
            .iter()
            .filter(|todo| return todo.completed == completed)
            .cloned()
            .collect();
    }

    fn begin(&self) {
        let mut state = self.state.lock();
        state.loading = true;
        state.error = None;
    }

    fn settle<T, F>(&self, action: &str, res: ClientResult<T>, commit: F) -> ClientResult<T>
    where
        F: FnOnce(&mut TodoState, &T),
    {
        let mut state = self.state.lock();
        state.loading = false;

        match res {
            Ok(val) => {
                commit(&mut *state, &val);
                return Ok(val);
            }
            Err(err) => {
                tracing::error!(
                    action = action,
                    error = %err,
                    status = ?err.status(),
                    guest_limit_reached = err.guest_limit_reached(),
                    "Todo action failed"
                );
                state.error = Some(err.message());
                return Err(err);
            }
        }
    }
}
