use std::sync::Arc;

use async_trait::async_trait;

use super::AuthResponse;
use super::ClientResult;
use super::LoginRequest;
use super::NewTodo;
use super::RegisterRequest;
use super::Todo;
use super::TodoChanges;

/// The only component allowed to talk to the remote service. Each method is a
/// single round trip with no retries.
#[async_trait]
pub trait Gateway {
    async fn list_todos(&self) -> ClientResult<Vec<Todo>>;

    async fn get_todo(&self, id: i64) -> ClientResult<Todo>;

    /// Fails with `ClientError::GuestLimitExceeded` when a guest is over quota.
    async fn create_todo(&self, todo: NewTodo) -> ClientResult<Todo>;

    /// Returns the record as stored by the service after the update.
    async fn update_todo(&self, id: i64, changes: TodoChanges) -> ClientResult<Todo>;

    async fn delete_todo(&self, id: i64) -> ClientResult<()>;

    async fn guest_todo_count(&self) -> ClientResult<u32>;

    async fn login(&self, req: LoginRequest) -> ClientResult<AuthResponse>;

    async fn register(&self, req: RegisterRequest) -> ClientResult<AuthResponse>;
}

pub type GatewayArc = Arc<dyn Gateway + Send + Sync>;
