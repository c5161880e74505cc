#[cfg(test)]
#[path = "todo_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    pub fn format(&self) -> String {
        let mark = if self.completed { "x" } else { " " };
        let mut res = format!("[{mark}] ({}) {}", self.id, self.name);
        if !self.description.is_empty() {
            res = format!("{res} - {}", self.description);
        }

        return res;
    }
}

/// File part sent alongside a new to-do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Payload for creating a to-do. Sent as a multipart form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub name: String,
    pub description: String,
    pub image: Option<Attachment>,
}

impl NewTodo {
    pub fn new(name: &str, description: &str) -> NewTodo {
        return NewTodo {
            name: name.to_string(),
            description: description.to_string(),
            image: None,
        };
    }
}

/// Fields sent to the update endpoint. Absent fields are left out of the
/// request body entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoChanges {
    /// Full record for `todo` with only `completed` flipped.
    pub fn toggled(todo: &Todo) -> TodoChanges {
        return TodoChanges {
            name: Some(todo.name.to_string()),
            description: Some(todo.description.to_string()),
            completed: Some(!todo.completed),
        };
    }

    pub fn is_empty(&self) -> bool {
        return self.name.is_none() && self.description.is_none() && self.completed.is_none();
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateTodoRequest<'a> {
    pub data: &'a TodoChanges,
}
