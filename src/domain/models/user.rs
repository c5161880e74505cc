#[cfg(test)]
#[path = "user_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Map;
use serde_json::Value;

/// The authenticated user as returned by the service. Only the presence of
/// `id` is relied on, its type and every other field are carried through
/// untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new<T: Into<Value>>(id: T) -> User {
        return User {
            id: id.into(),
            extra: Map::new(),
        };
    }

    /// Best effort display name, falling back to the id.
    pub fn display_name(&self) -> String {
        for key in ["username", "email"] {
            if let Some(Value::String(val)) = self.extra.get(key) {
                if !val.is_empty() {
                    return val.to_string();
                }
            }
        }

        return format!("user #{}", self.id_label());
    }

    /// The id as text, without JSON quoting for string ids.
    pub fn id_label(&self) -> String {
        if let Value::String(id) = &self.id {
            return id.to_string();
        }

        return self.id.to_string();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "usernameOrEmail")]
    pub username_or_email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCount {
    pub count: u32,
}
