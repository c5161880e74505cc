#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::domain::models::AuthResponse;
use crate::domain::models::ClientError;
use crate::domain::models::ClientResult;
use crate::domain::models::Gateway;
use crate::domain::models::GuestCount;
use crate::domain::models::LoginRequest;
use crate::domain::models::NewTodo;
use crate::domain::models::RegisterRequest;
use crate::domain::models::StorageArc;
use crate::domain::models::Todo;
use crate::domain::models::TodoChanges;
use crate::domain::models::UpdateTodoRequest;
use crate::domain::models::NETWORK_ERROR_MESSAGE;
use crate::domain::models::TOKEN_KEY;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "guestLimitReached")]
    guest_limit_reached: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
enum Operation {
    ListTodos,
    GetTodo,
    CreateTodo,
    UpdateTodo,
    DeleteTodo,
    GuestTodoCount,
    Login,
    Register,
}

impl Operation {
    fn fallback_message(&self, status: u16) -> String {
        let msg = match self {
            Operation::ListTodos => "Failed to fetch todos",
            Operation::GetTodo => return format!("Todo not found ({status})"),
            Operation::CreateTodo => "Failed to create todo",
            Operation::UpdateTodo => "Failed to update todo",
            Operation::DeleteTodo => "Failed to delete todo",
            Operation::GuestTodoCount => "Failed to fetch guest todo count",
            Operation::Login => "Login failed",
            Operation::Register => "Registration failed",
        };

        return msg.to_string();
    }

    fn service_error(&self, status: u16, body: ErrorResponse) -> ClientError {
        let message = body
            .error
            .filter(|msg| return !msg.is_empty())
            .unwrap_or_else(|| return self.fallback_message(status));

        if *self == Operation::CreateTodo && status == 403 && body.guest_limit_reached {
            return ClientError::GuestLimitExceeded { message };
        }

        return ClientError::Service { status, message };
    }
}

/// Talks to the to-do service over HTTP. The bearer token is read from the
/// shared storage on every request, so a login in one place is picked up by
/// the next call without rebuilding the gateway.
pub struct HttpGateway {
    url: String,
    storage: StorageArc,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(url: &str, storage: StorageArc) -> HttpGateway {
        return HttpGateway {
            url: url.trim_end_matches('/').to_string(),
            storage,
            client: reqwest::Client::new(),
        };
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{url}{path}", url = self.url));

        if let Some(token) = self.storage.get_item(TOKEN_KEY) {
            if !token.is_empty() {
                req = req.bearer_auth(token);
            }
        }

        return req;
    }

    #[allow(clippy::implicit_return)]
    async fn send(&self, op: Operation, req: RequestBuilder) -> ClientResult<Response> {
        let res = match req.send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, operation = %op, "Todo service is not reachable");
                return Err(ClientError::network(NETWORK_ERROR_MESSAGE));
            }
        };

        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body: ErrorResponse = serde_json::from_str(&text).unwrap_or_default();
        let err = op.service_error(status, body);

        tracing::error!(
            status = status,
            operation = %op,
            message = %err,
            guest_limit_reached = err.guest_limit_reached(),
            "Todo service request failed"
        );

        return Err(err);
    }

    #[allow(clippy::implicit_return)]
    async fn decode<T: DeserializeOwned>(&self, op: Operation, res: Response) -> ClientResult<T> {
        let text = match res.text().await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = ?err, operation = %op, "Failed to read response body");
                return Err(ClientError::from(err));
            }
        };

        return serde_json::from_str::<T>(&text).map_err(|err| {
            tracing::error!(error = ?err, operation = %op, body = %text, "Failed to decode response body");
            return ClientError::from(err);
        });
    }

    fn form(todo: NewTodo) -> ClientResult<multipart::Form> {
        let mut form = multipart::Form::new()
            .text("name", todo.name)
            .text("description", todo.description);

        if let Some(image) = todo.image {
            let part = multipart::Part::bytes(image.bytes)
                .file_name(image.file_name.to_string())
                .mime_str(&image.mime)
                .map_err(|err| {
                    tracing::error!(
                        error = ?err,
                        operation = %Operation::CreateTodo,
                        file_name = %image.file_name,
                        mime = %image.mime,
                        "Attachment has an invalid mime type"
                    );
                    return ClientError::InvalidRequest {
                        message: format!("Invalid attachment type '{}'", image.mime),
                    };
                })?;
            form = form.part("image", part);
        }

        return Ok(form);
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[allow(clippy::implicit_return)]
    async fn list_todos(&self) -> ClientResult<Vec<Todo>> {
        let op = Operation::ListTodos;
        let res = self.send(op, self.request(Method::GET, "/todos")).await?;
        return self.decode(op, res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn get_todo(&self, id: i64) -> ClientResult<Todo> {
        let op = Operation::GetTodo;
        let req = self.request(Method::GET, &format!("/api/todos/{id}"));
        let res = self.send(op, req).await?;
        return self.decode(op, res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn create_todo(&self, todo: NewTodo) -> ClientResult<Todo> {
        let op = Operation::CreateTodo;
        let form = HttpGateway::form(todo)?;
        let req = self.request(Method::POST, "/todo").multipart(form);
        let res = self.send(op, req).await?;
        return self.decode(op, res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn update_todo(&self, id: i64, changes: TodoChanges) -> ClientResult<Todo> {
        let op = Operation::UpdateTodo;
        let req = self
            .request(Method::PUT, &format!("/todo/{id}"))
            .json(&UpdateTodoRequest { data: &changes });
        let res = self.send(op, req).await?;
        return self.decode(op, res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn delete_todo(&self, id: i64) -> ClientResult<()> {
        let op = Operation::DeleteTodo;
        let req = self.request(Method::DELETE, &format!("/todo/{id}"));
        self.send(op, req).await?;
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn guest_todo_count(&self) -> ClientResult<u32> {
        let op = Operation::GuestTodoCount;
        let res = self
            .send(op, self.request(Method::GET, "/guest/todo-count"))
            .await?;
        let body: GuestCount = self.decode(op, res).await?;
        return Ok(body.count);
    }

    #[allow(clippy::implicit_return)]
    async fn login(&self, req: LoginRequest) -> ClientResult<AuthResponse> {
        let op = Operation::Login;
        let res = self
            .send(op, self.request(Method::POST, "/auth/login").json(&req))
            .await?;
        return self.decode(op, res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn register(&self, req: RegisterRequest) -> ClientResult<AuthResponse> {
        let op = Operation::Register;
        let res = self
            .send(op, self.request(Method::POST, "/auth/register").json(&req))
            .await?;
        return self.decode(op, res).await;
    }
}
