//! # Command-Line Interface
//!
//! An interactive, menu-driven shell over the task manager.
//!
//! ## Modes
//!
//! | Mode | Meaningful actions |
//! |------|--------------------|
//! | No current user | Add, list and select users |
//! | Current user selected | All of the above plus every task action |
//!
//! Selecting another user switches directly; logging out returns to the
//! no-user mode.
//!
//! ## Flags
//!
//! - `--data-file <PATH>` (or `TASK_TRACKER_DATA`) - where users and tasks are stored
//! - `--verbose` / `-v` - debug logging on stderr
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and start the shell.

mod app;
mod interrupt;
mod output;
mod prompt;
mod shell;

pub use app::{run, Cli};
pub use output::Output;
pub use prompt::{parse_date, parse_index, parse_priority, parse_status, InputError};
pub use shell::Shell;
