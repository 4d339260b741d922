//! Task Tracker - a local-first, multi-user task list for the terminal
//!
//! Users own tasks with a priority, an optional due date and a
//! pending/completed status. Everything is kept in one JSON file that is
//! rewritten after every change.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Priority, Task, TaskId, TaskPatch, TaskStatus, User, UserId};
pub use storage::{ManagerError, TaskManager};
