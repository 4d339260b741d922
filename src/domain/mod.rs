//! Domain models for the task tracker
//!
//! Contains the core records and their rules without any I/O concerns.

mod id;
mod task;
mod user;

pub use id::{TaskId, UserId};
pub use task::{Priority, Task, TaskPatch, TaskStatus, TaskSummary};
pub use user::{normalize_email, validate_email, validate_name, User};
