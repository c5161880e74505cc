#[cfg(test)]
pub mod fake_gateway;
pub mod navigation;
mod session_store;
mod todo_store;

pub use session_store::*;
pub use todo_store::*;
