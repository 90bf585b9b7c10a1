//! REST gateways for the ToolNest backend.

pub mod auth;
pub mod tasks;
pub mod tools;

pub use auth::AuthApi;
pub use tasks::{HttpTaskGateway, TaskGateway};
pub use tools::ToolsApi;
