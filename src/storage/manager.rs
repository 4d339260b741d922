//! The task manager
//!
//! [`TaskManager`] owns every user and task, enforces the business rules, and
//! rewrites the backing JSON file after each successful mutation.
//!
//! Persistence failures never abort a mutation: a failed load leaves an empty
//! store, and a failed save keeps the in-memory change and is reported through
//! [`TaskManager::take_save_error`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::json::{DataFile, StoreDocument};
use crate::domain::{
    normalize_email, validate_email, validate_name, Priority, Task, TaskId, TaskPatch,
    TaskStatus, TaskSummary, User, UserId,
};

#[derive(Debug, Error, PartialEq)]
pub enum ManagerError {
    /// Malformed or disallowed input value
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation needs state that has not been set up
    #[error("{0}")]
    Precondition(String),

    /// Reading or writing the data file failed
    #[error("{0}")]
    Persistence(String),
}

impl ManagerError {
    fn persistence(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{:#}", err))
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// In-memory users and tasks backed by a JSON file
#[derive(Debug)]
pub struct TaskManager {
    file: DataFile,
    users: HashMap<UserId, User>,
    tasks: HashMap<TaskId, Task>,
    current_user: Option<UserId>,
    load_warning: Option<ManagerError>,
    save_error: Option<ManagerError>,
}

impl TaskManager {
    /// Opens the store backed by `path`, loading existing data.
    ///
    /// Fails only when the path can never hold the data file (it is a
    /// directory, or its parent directory cannot be created). Unreadable
    /// contents fall back to an empty store; see [`Self::take_load_warning`].
    pub fn open(path: impl Into<PathBuf>) -> ManagerResult<Self> {
        let file = DataFile::new(path);

        if file.path().is_dir() {
            return Err(ManagerError::Persistence(format!(
                "Data file path is a directory: {}",
                file.path().display()
            )));
        }
        file.ensure_parent().map_err(ManagerError::persistence)?;

        let mut manager = Self {
            file,
            users: HashMap::new(),
            tasks: HashMap::new(),
            current_user: None,
            load_warning: None,
            save_error: None,
        };
        manager.load();
        Ok(manager)
    }

    /// Returns the path of the backing file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Replaces in-memory state with the contents of the backing file.
    ///
    /// A missing file yields an empty store. A corrupt or unreadable file also
    /// yields an empty store, and the cause is kept as a load warning.
    pub fn load(&mut self) {
        self.users.clear();
        self.tasks.clear();

        match self.file.read() {
            Ok(Some(document)) => {
                self.users = document.users.into_iter().map(|u| (u.id, u)).collect();
                self.tasks = document.tasks.into_iter().map(|t| (t.id, t)).collect();
                info!(
                    path = %self.file.path().display(),
                    users = self.users.len(),
                    tasks = self.tasks.len(),
                    "Loaded data file"
                );
            }
            Ok(None) => {
                debug!(path = %self.file.path().display(), "No data file yet, starting empty");
            }
            Err(e) => {
                let err = ManagerError::persistence(e);
                warn!(path = %self.file.path().display(), error = %err, "Could not load data file, starting empty");
                self.load_warning = Some(err);
            }
        }
    }

    /// Writes every user and task to the backing file
    pub fn save(&self) -> ManagerResult<()> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        self.file
            .write(&StoreDocument { users, tasks })
            .map_err(ManagerError::persistence)?;

        debug!(path = %self.file.path().display(), "Saved data file");
        Ok(())
    }

    fn autosave(&mut self) {
        if let Err(e) = self.save() {
            warn!(path = %self.file.path().display(), error = %e, "Auto-save failed");
            self.save_error = Some(e);
        }
    }

    /// Takes the warning recorded if the last load fell back to an empty store
    pub fn take_load_warning(&mut self) -> Option<ManagerError> {
        self.load_warning.take()
    }

    /// Takes the error from the most recent failed auto-save, if any
    pub fn take_save_error(&mut self) -> Option<ManagerError> {
        self.save_error.take()
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Creates a user after validating name and email uniqueness
    pub fn add_user(&mut self, name: &str, email: &str) -> ManagerResult<UserId> {
        let name = name.trim();
        let email = email.trim();

        validate_name(name).map_err(ManagerError::Validation)?;
        validate_email(email).map_err(ManagerError::Validation)?;

        if self.users.values().any(|u| u.has_email(email)) {
            return Err(ManagerError::Validation(format!(
                "A user with email '{}' already exists",
                normalize_email(email)
            )));
        }

        let user = User::new(name, email);
        let id = user.id;
        self.users.insert(id, user);
        info!(user_id = %id, "Added user");

        self.autosave();
        Ok(id)
    }

    pub fn get_user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    /// Returns all users, oldest first
    pub fn list_users(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        users
    }

    /// Makes `id` the user that new tasks are created for
    pub fn set_current_user(&mut self, id: &UserId) -> ManagerResult<()> {
        if !self.users.contains_key(id) {
            return Err(ManagerError::NotFound {
                kind: "User",
                id: id.to_string(),
            });
        }
        self.current_user = Some(*id);
        debug!(user_id = %id, "Selected current user");
        Ok(())
    }

    /// Clears the current user; returns the user who was selected, if any
    pub fn clear_current_user(&mut self) -> Option<UserId> {
        let previous = self.current_user.take();
        if let Some(id) = &previous {
            debug!(user_id = %id, "Cleared current user");
        }
        previous
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.current_user
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref().and_then(|id| self.users.get(id))
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Creates a pending task owned by the current user
    pub fn add_task(
        &mut self,
        title: &str,
        description: &str,
        priority: Priority,
        due_date: Option<NaiveDate>,
    ) -> ManagerResult<TaskId> {
        let user_id = self.current_user.ok_or_else(|| {
            ManagerError::Precondition("No user selected. Select a user first.".to_string())
        })?;

        let title = title.trim();
        if title.is_empty() {
            return Err(ManagerError::Validation(
                "Task title cannot be empty".to_string(),
            ));
        }
        self.ensure_unique_title(user_id, title, None)?;

        let task = Task::new(user_id, title, description.trim(), priority, due_date);
        let id = task.id;
        self.tasks.insert(id, task);
        info!(task_id = %id, user_id = %user_id, "Added task");

        self.autosave();
        Ok(id)
    }

    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Applies the supplied fields of `patch` to a task.
    ///
    /// Returns `Ok(false)` if no task has that ID. A supplied title must not be
    /// empty.
    pub fn update_task(&mut self, id: &TaskId, mut patch: TaskPatch) -> ManagerResult<bool> {
        if let Some(title) = patch.title.as_mut() {
            *title = title.trim().to_string();
            if title.is_empty() {
                return Err(ManagerError::Validation(
                    "Task title cannot be empty".to_string(),
                ));
            }
        }
        if let Some(description) = patch.description.as_mut() {
            *description = description.trim().to_string();
        }

        let Some(owner) = self.tasks.get(id).map(|t| t.user_id) else {
            debug!(task_id = %id, "Update of unknown task ignored");
            return Ok(false);
        };
        if let Some(title) = &patch.title {
            self.ensure_unique_title(owner, title, Some(id))?;
        }

        let Some(task) = self.tasks.get_mut(id) else {
            return Ok(false);
        };
        task.apply(patch);
        info!(task_id = %id, "Updated task");

        self.autosave();
        Ok(true)
    }

    /// Rejects `title` if another task of `owner` already uses it, ignoring case
    fn ensure_unique_title(
        &self,
        owner: UserId,
        title: &str,
        except: Option<&TaskId>,
    ) -> ManagerResult<()> {
        let needle = title.to_lowercase();
        let taken = self.tasks.values().any(|t| {
            t.user_id == owner && Some(&t.id) != except && t.title.to_lowercase() == needle
        });
        if taken {
            return Err(ManagerError::Validation(format!(
                "A task titled '{}' already exists",
                title
            )));
        }
        Ok(())
    }

    /// Removes a task; returns false if no task has that ID
    pub fn delete_task(&mut self, id: &TaskId) -> bool {
        if self.tasks.remove(id).is_none() {
            return false;
        }
        info!(task_id = %id, "Deleted task");

        self.autosave();
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Tasks owned by `user_id`, or by the current user when `None`.
    ///
    /// Ordered oldest first; empty if no user resolves.
    pub fn user_tasks(&self, user_id: Option<&UserId>) -> Vec<&Task> {
        let Some(owner) = user_id.copied().or(self.current_user) else {
            return Vec::new();
        };

        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.user_id == owner)
            .collect();
        tasks.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        tasks
    }

    pub fn tasks_by_status(&self, status: TaskStatus, user_id: Option<&UserId>) -> Vec<&Task> {
        self.filter_tasks(user_id, |t| t.status == status)
    }

    pub fn tasks_by_priority(&self, priority: Priority, user_id: Option<&UserId>) -> Vec<&Task> {
        self.filter_tasks(user_id, |t| t.priority == priority)
    }

    /// Overdue tasks as of today's local date
    pub fn overdue_tasks(&self, user_id: Option<&UserId>) -> Vec<&Task> {
        self.filter_tasks(user_id, Task::is_overdue)
    }

    /// Overdue tasks as of `today`
    pub fn overdue_tasks_on(&self, today: NaiveDate, user_id: Option<&UserId>) -> Vec<&Task> {
        self.filter_tasks(user_id, |t| t.is_overdue_on(today))
    }

    /// Case-insensitive substring search over title and description
    pub fn search_tasks(&self, query: &str, user_id: Option<&UserId>) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.filter_tasks(user_id, |t| t.matches(&needle))
    }

    /// Pending/completed/overdue counts for a user's tasks
    pub fn summary(&self, user_id: Option<&UserId>) -> TaskSummary {
        TaskSummary::tally(self.user_tasks(user_id), Local::now().date_naive())
    }

    fn filter_tasks(&self, user_id: Option<&UserId>, keep: impl Fn(&Task) -> bool) -> Vec<&Task> {
        self.user_tasks(user_id)
            .into_iter()
            .filter(|t| keep(t))
            .collect()
    }
}
