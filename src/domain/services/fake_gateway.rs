use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::domain::models::AuthResponse;
use crate::domain::models::ClientError;
use crate::domain::models::ClientResult;
use crate::domain::models::Gateway;
use crate::domain::models::LoginRequest;
use crate::domain::models::NewTodo;
use crate::domain::models::RegisterRequest;
use crate::domain::models::Todo;
use crate::domain::models::TodoChanges;
use crate::domain::models::User;

#[derive(Default)]
struct FakeState {
    todos: Vec<Todo>,
    next_id: i64,
    guest_count: u32,
    failures: HashMap<&'static str, ClientError>,
    calls: Vec<String>,
}

/// In-memory stand-in for the to-do service. Failures can be queued per
/// operation, and an operation can be held until the test releases it.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
    holds: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl FakeGateway {
    pub fn with_todos(todos: Vec<Todo>) -> FakeGateway {
        let gateway = FakeGateway::default();
        {
            let mut state = gateway.state.lock();
            state.next_id = todos.iter().map(|todo| return todo.id).max().unwrap_or(0) + 1;
            state.todos = todos;
        }

        return gateway;
    }

    pub fn set_guest_count(&self, count: u32) {
        self.state.lock().guest_count = count;
    }

    /// The next call of `op` fails with `err`.
    pub fn fail(&self, op: &'static str, err: ClientError) {
        self.state.lock().failures.insert(op, err);
    }

    /// Calls of `op` wait until the returned handle is notified.
    pub fn hold(&self, op: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds.lock().insert(op, notify.clone());
        return notify;
    }

    pub fn calls(&self) -> Vec<String> {
        return self.state.lock().calls.clone();
    }

    pub fn server_todos(&self) -> Vec<Todo> {
        return self.state.lock().todos.clone();
    }

    pub fn edit_server_todo(&self, todo: Todo) {
        let mut state = self.state.lock();
        if let Some(existing) = state.todos.iter_mut().find(|e| return e.id == todo.id) {
            *existing = todo;
        }
    }

    async fn enter(&self, op: &'static str) -> ClientResult<()> {
        self.state.lock().calls.push(op.to_string());

        let hold = self.holds.lock().get(op).cloned();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        if let Some(err) = self.state.lock().failures.remove(op) {
            return Err(err);
        }

        return Ok(());
    }
}

fn auth(user: User, token: &str) -> AuthResponse {
    return AuthResponse {
        user,
        token: token.to_string(),
        message: Some("Welcome".to_string()),
    };
}

#[async_trait]
impl Gateway for FakeGateway {
    #[allow(clippy::implicit_return)]
    async fn list_todos(&self) -> ClientResult<Vec<Todo>> {
        self.enter("list").await?;
        return Ok(self.server_todos());
    }

    #[allow(clippy::implicit_return)]
    async fn get_todo(&self, id: i64) -> ClientResult<Todo> {
        self.enter("get").await?;
        return self
            .server_todos()
            .into_iter()
            .find(|todo| return todo.id == id)
            .ok_or_else(|| return ClientError::service(404, "Todo not found (404)"));
    }

    #[allow(clippy::implicit_return)]
    async fn create_todo(&self, todo: NewTodo) -> ClientResult<Todo> {
        self.enter("create").await?;

        let mut state = self.state.lock();
        let created = Todo {
            id: state.next_id,
            name: todo.name,
            description: todo.description,
            completed: false,
        };
        state.next_id += 1;
        state.todos.push(created.clone());

        return Ok(created);
    }

    #[allow(clippy::implicit_return)]
    async fn update_todo(&self, id: i64, changes: TodoChanges) -> ClientResult<Todo> {
        self.enter("update").await?;

        let mut state = self.state.lock();
        let todo = match state.todos.iter_mut().find(|todo| return todo.id == id) {
            Some(todo) => todo,
            None => return Err(ClientError::service(404, "Todo not found")),
        };

        if let Some(name) = changes.name {
            todo.name = name;
        }
        if let Some(description) = changes.description {
            todo.description = description;
        }
        if let Some(completed) = changes.completed {
            todo.completed = completed;
        }

        return Ok(todo.clone());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_todo(&self, id: i64) -> ClientResult<()> {
        self.enter("delete").await?;

        let mut state = self.state.lock();
        let before = state.todos.len();
        state.todos.retain(|todo| return todo.id != id);
        if state.todos.len() == before {
            return Err(ClientError::service(404, "Todo not found"));
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn guest_todo_count(&self) -> ClientResult<u32> {
        self.enter("guest_count").await?;
        return Ok(self.state.lock().guest_count);
    }

    #[allow(clippy::implicit_return)]
    async fn login(&self, req: LoginRequest) -> ClientResult<AuthResponse> {
        self.enter("login").await?;
        let mut user = User::new(1);
        user.extra.insert(
            "email".to_string(),
            serde_json::Value::String(req.username_or_email),
        );
        return Ok(auth(user, "t1"));
    }

    #[allow(clippy::implicit_return)]
    async fn register(&self, req: RegisterRequest) -> ClientResult<AuthResponse> {
        self.enter("register").await?;
        let mut user = User::new(2);
        user.extra.insert(
            "username".to_string(),
            serde_json::Value::String(req.username),
        );
        return Ok(auth(user, "t2"));
    }
}
