mod error;
mod gateway;
mod route;
mod storage;
mod todo;
mod user;

pub use error::*;
pub use gateway::*;
pub use route::*;
pub use storage::*;
pub use todo::*;
pub use user::*;
