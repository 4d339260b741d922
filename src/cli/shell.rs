//! Interactive menu loop
//!
//! The shell reads a numbered menu choice, collects the fields that action
//! needs, checks their format, and hands off to the [`TaskManager`]. Business
//! and format errors are printed and the loop continues; only terminal I/O
//! failures end it early.

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::Local;
use tracing::debug;

use super::output::Output;
use super::prompt::{
    parse_date, parse_index, parse_optional_date, parse_priority, parse_status, InputError,
};
use crate::domain::{Priority, Task, TaskId, TaskPatch, TaskStatus, User};
use crate::storage::{ManagerError, TaskManager};

const MENU: &[(&str, &str)] = &[
    ("1", "Add user"),
    ("2", "List users"),
    ("3", "Select user"),
    ("4", "Add task"),
    ("5", "View all tasks"),
    ("6", "Edit task"),
    ("7", "Delete task"),
    ("8", "Mark task complete"),
    ("9", "Mark task pending"),
    ("10", "View tasks by status"),
    ("11", "View tasks by priority"),
    ("12", "View overdue tasks"),
    ("13", "Search tasks"),
    ("14", "Log out"),
    ("0", "Exit"),
];

/// What the loop does after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Menu-driven session over a task manager
pub struct Shell<'m, R, W> {
    manager: &'m mut TaskManager,
    input: R,
    output: Output<W>,
}

impl<'m, R: BufRead, W: Write> Shell<'m, R, W> {
    pub fn new(manager: &'m mut TaskManager, input: R, output: W) -> Self {
        Self {
            manager,
            input,
            output: Output::new(output),
        }
    }

    /// Returns the writer, for inspecting a finished session
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    /// Runs until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        self.output.line("Welcome to Task Tracker!")?;
        if let Some(warning) = self.manager.take_load_warning() {
            self.output.warning(&format!(
                "Could not load saved data, starting with an empty store: {}",
                warning
            ))?;
        }

        loop {
            self.print_menu()?;

            let outcome = self
                .read_line("Enter your choice: ")
                .and_then(|choice| self.dispatch(&choice));

            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) if is_end_of_input(&e) => {
                    self.output.blank()?;
                    break;
                }
                Err(e) => match user_facing(&e) {
                    Some(message) => self.output.error(&message)?,
                    None => return Err(e),
                },
            }

            if let Some(err) = self.manager.take_save_error() {
                self.output.warning(&format!(
                    "Change kept in memory but not saved: {}",
                    err
                ))?;
            }
        }

        self.output.success("Goodbye!")?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        self.output.blank()?;
        self.output.line("TASK TRACKER")?;
        self.output.line(&"=".repeat(30))?;
        if let Some(user) = self.manager.current_user() {
            let line = format!("Current user: {} <{}>", user.name, user.email);
            self.output.line(&line)?;
            self.output.line(&"-".repeat(30))?;
        }
        for (key, label) in MENU {
            self.output.line(&format!("{:>2}. {}", key, label))?;
        }
        Ok(())
    }

    fn dispatch(&mut self, choice: &str) -> Result<Flow> {
        debug!(choice, "Menu selection");
        match choice {
            "0" => return Ok(Flow::Exit),
            "1" => self.add_user()?,
            "2" => self.list_users()?,
            "3" => self.select_user()?,
            "4" => self.add_task()?,
            "5" => self.view_all_tasks()?,
            "6" => self.edit_task()?,
            "7" => self.delete_task()?,
            "8" => self.set_status(TaskStatus::Completed)?,
            "9" => self.set_status(TaskStatus::Pending)?,
            "10" => self.view_by_status()?,
            "11" => self.view_by_priority()?,
            "12" => self.view_overdue()?,
            "13" => self.search()?,
            "14" => self.log_out()?,
            other => self
                .output
                .error(&format!("Invalid choice '{}'. Please try again.", other))?,
        }
        Ok(Flow::Continue)
    }

    // =========================================================================
    // Users
    // =========================================================================

    fn add_user(&mut self) -> Result<()> {
        let name = self.read_line("Name: ")?;
        let email = self.read_line("Email: ")?;

        let id = self.manager.add_user(&name, &email)?;
        self.output
            .success(&format!("User '{}' added (ID: {})", name.trim(), id.short()))?;
        Ok(())
    }

    fn list_users(&mut self) -> Result<()> {
        self.output.heading("Users")?;
        let current = self.manager.current_user_id();
        self.output.user_table(self.manager.list_users(), current)?;
        Ok(())
    }

    fn select_user(&mut self) -> Result<()> {
        let users: Vec<User> = self.manager.list_users().into_iter().cloned().collect();
        if users.is_empty() {
            return Err(
                ManagerError::Precondition("No users yet. Add a user first.".to_string()).into(),
            );
        }

        self.output.heading("Users")?;
        self.output
            .user_table(&users, self.manager.current_user_id())?;

        let choice = self.read_line("Select user number: ")?;
        let user = &users[parse_index(&choice, users.len())?];

        self.manager.set_current_user(&user.id)?;
        self.output
            .success(&format!("Current user is now {}", user.name))?;
        Ok(())
    }

    fn log_out(&mut self) -> Result<()> {
        let user = self.require_user()?;
        self.manager.clear_current_user();
        self.output
            .success(&format!("Logged out from {}", user.name))?;
        Ok(())
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    fn add_task(&mut self) -> Result<()> {
        self.require_user()?;

        let title = self.read_line("Title: ")?;
        let description = self.read_line("Description: ")?;
        let priority = self.read_line("Priority (High/Medium/Low) [Medium]: ")?;
        let priority = if priority.is_empty() {
            Priority::default()
        } else {
            parse_priority(&priority)?
        };
        let due = self.read_line("Due date (YYYY-MM-DD, blank for none): ")?;
        let due_date = parse_optional_date(&due)?;

        self.manager
            .add_task(&title, &description, priority, due_date)?;
        self.output
            .success(&format!("Task '{}' added", title.trim()))?;
        Ok(())
    }

    fn view_all_tasks(&mut self) -> Result<()> {
        let user = self.require_user()?;
        let today = Local::now().date_naive();

        self.output.heading(&format!("Tasks for {}", user.name))?;
        self.output
            .task_table(self.manager.user_tasks(None), today)?;
        self.output.blank()?;
        self.output.summary(&self.manager.summary(None))?;
        Ok(())
    }

    fn edit_task(&mut self) -> Result<()> {
        self.require_user()?;
        let tasks = self.owned_tasks(self.manager.user_tasks(None));
        let Some(task) = self.pick_task(&tasks, "Tasks", "Select task number to edit: ")? else {
            return Ok(());
        };

        self.output
            .line("Press Enter to keep a value; enter '-' to clear description or due date.")?;

        let mut patch = TaskPatch::new();

        let title = self.read_line(&format!("Title [{}]: ", task.title))?;
        if !title.is_empty() {
            patch = patch.title(title);
        }

        let description = self.read_line(&format!("Description [{}]: ", task.description))?;
        match description.as_str() {
            "" => {}
            "-" => patch = patch.description(""),
            text => patch = patch.description(text),
        }

        let priority = self.read_line(&format!("Priority [{}]: ", task.priority))?;
        if !priority.is_empty() {
            patch = patch.priority(parse_priority(&priority)?);
        }

        let current_due = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "none".to_string());
        let due = self.read_line(&format!("Due date [{}]: ", current_due))?;
        match due.as_str() {
            "" => {}
            "-" => patch = patch.due_date(None),
            text => patch = patch.due_date(Some(parse_date(text)?)),
        }

        if patch.is_empty() {
            self.output.line("No changes made.")?;
            return Ok(());
        }

        self.update(&task.id, patch)?;
        self.output.success("Task updated")?;
        Ok(())
    }

    fn delete_task(&mut self) -> Result<()> {
        self.require_user()?;
        let tasks = self.owned_tasks(self.manager.user_tasks(None));
        let Some(task) = self.pick_task(&tasks, "Tasks", "Select task number to delete: ")? else {
            return Ok(());
        };

        let answer = self.read_line(&format!(
            "Delete '{}'? Type 'yes' to confirm: ",
            task.title
        ))?;
        if answer != "yes" {
            self.output.line("Deletion cancelled.")?;
            return Ok(());
        }

        if !self.manager.delete_task(&task.id) {
            return Err(not_found(&task.id).into());
        }
        self.output
            .success(&format!("Task '{}' deleted", task.title))?;
        Ok(())
    }

    fn set_status(&mut self, status: TaskStatus) -> Result<()> {
        self.require_user()?;
        let (from, verb) = match status {
            TaskStatus::Completed => (TaskStatus::Pending, "complete"),
            TaskStatus::Pending => (TaskStatus::Completed, "pending"),
        };

        let tasks = self.owned_tasks(self.manager.tasks_by_status(from, None));
        let heading = format!("{} tasks", from);
        let prompt = format!("Select task number to mark {}: ", verb);
        let Some(task) = self.pick_task(&tasks, &heading, &prompt)? else {
            return Ok(());
        };

        self.update(&task.id, TaskPatch::new().status(status))?;
        self.output
            .success(&format!("Task '{}' marked {}", task.title, verb))?;
        Ok(())
    }

    fn view_by_status(&mut self) -> Result<()> {
        self.require_user()?;
        let status = parse_status(&self.read_line("Status (Pending/Completed): ")?)?;

        self.output.heading(&format!("{} tasks", status))?;
        self.output.task_table(
            self.manager.tasks_by_status(status, None),
            Local::now().date_naive(),
        )?;
        Ok(())
    }

    fn view_by_priority(&mut self) -> Result<()> {
        self.require_user()?;
        let priority = parse_priority(&self.read_line("Priority (High/Medium/Low): ")?)?;

        self.output
            .heading(&format!("{} priority tasks", priority))?;
        self.output.task_table(
            self.manager.tasks_by_priority(priority, None),
            Local::now().date_naive(),
        )?;
        Ok(())
    }

    fn view_overdue(&mut self) -> Result<()> {
        self.require_user()?;
        let today = Local::now().date_naive();

        self.output.heading("Overdue tasks")?;
        self.output
            .task_table(self.manager.overdue_tasks_on(today, None), today)?;
        Ok(())
    }

    fn search(&mut self) -> Result<()> {
        self.require_user()?;
        let query = self.read_line("Search for: ")?;
        if query.is_empty() {
            return Err(InputError::EmptyInput("Search query").into());
        }

        self.output
            .heading(&format!("Search results for '{}'", query))?;
        self.output.task_table(
            self.manager.search_tasks(&query, None),
            Local::now().date_naive(),
        )?;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Prints `label`, reads one line, and returns it trimmed
    fn read_line(&mut self, label: &str) -> Result<String> {
        self.output.prompt(label)?;

        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Err(InputError::EndOfInput.into());
        }
        let line = String::from_utf8(buf).map_err(|_| InputError::InvalidEncoding)?;
        Ok(line.trim().to_string())
    }

    fn require_user(&self) -> Result<User, ManagerError> {
        self.manager.current_user().cloned().ok_or_else(|| {
            ManagerError::Precondition("No user selected. Select a user first.".to_string())
        })
    }

    fn owned_tasks(&self, tasks: Vec<&Task>) -> Vec<Task> {
        tasks.into_iter().cloned().collect()
    }

    /// Lists `tasks` and reads a 1-based choice; `None` if there is nothing to pick
    fn pick_task(&mut self, tasks: &[Task], heading: &str, prompt: &str) -> Result<Option<Task>> {
        self.output.heading(heading)?;
        self.output.task_table(tasks, Local::now().date_naive())?;
        if tasks.is_empty() {
            return Ok(None);
        }

        let choice = self.read_line(prompt)?;
        let index = parse_index(&choice, tasks.len())?;
        Ok(Some(tasks[index].clone()))
    }

    fn update(&mut self, id: &TaskId, patch: TaskPatch) -> Result<()> {
        if !self.manager.update_task(id, patch)? {
            return Err(not_found(id).into());
        }
        Ok(())
    }
}

fn not_found(id: &TaskId) -> ManagerError {
    ManagerError::NotFound {
        kind: "Task",
        id: id.to_string(),
    }
}

fn is_end_of_input(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<InputError>(), Some(InputError::EndOfInput))
}

/// Message for errors the user can recover from, `None` for anything else
fn user_facing(err: &anyhow::Error) -> Option<String> {
    if let Some(e) = err.downcast_ref::<ManagerError>() {
        return Some(e.to_string());
    }
    if let Some(e) = err.downcast_ref::<InputError>() {
        return Some(e.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Runs a scripted session (one input per line) and returns the transcript
    fn session(manager: &mut TaskManager, script: &[&str]) -> String {
        let input = script.join("\n") + "\n";
        let mut shell = Shell::new(manager, Cursor::new(input), Vec::new());
        shell.run().unwrap();
        String::from_utf8(shell.into_output()).unwrap()
    }

    fn open_manager(dir: &TempDir) -> TaskManager {
        TaskManager::open(dir.path().join("data.json")).unwrap()
    }

    #[test]
    fn exit_immediately() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);

        let out = session(&mut manager, &["0"]);

        assert!(out.contains("Welcome to Task Tracker!"));
        assert!(out.contains("13. Search tasks"));
        assert!(out.trim_end().ends_with("Goodbye!"));
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);

        let mut shell = Shell::new(&mut manager, Cursor::new(""), Vec::new());
        shell.run().unwrap();
        let out = String::from_utf8(shell.into_output()).unwrap();

        assert!(out.trim_end().ends_with("Goodbye!"));
    }

    #[test]
    fn end_of_input_mid_action_exits_cleanly() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);

        let mut shell = Shell::new(&mut manager, Cursor::new("1\nAlice\n"), Vec::new());
        shell.run().unwrap();
        let out = String::from_utf8(shell.into_output()).unwrap();

        assert!(out.trim_end().ends_with("Goodbye!"));
        assert!(manager.list_users().is_empty());
    }

    #[test]
    fn invalid_choice_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);

        let out = session(&mut manager, &["42", "0"]);

        assert!(out.contains("Error: Invalid choice '42'"));
    }

    #[test]
    fn task_actions_need_a_current_user() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);

        // No further prompts are consumed; "0" is read as the next menu choice
        let out = session(&mut manager, &["4", "0"]);

        assert!(out.contains("Error: No user selected"));
        assert!(!out.contains("Title: "));
    }

    #[test]
    fn add_and_select_user() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);

        let out = session(
            &mut manager,
            &["1", "Alice Johnson", "alice@example.com", "3", "1", "0"],
        );

        assert!(out.contains("User 'Alice Johnson' added"));
        assert!(out.contains("Current user is now Alice Johnson"));
        assert!(out.contains("Current user: Alice Johnson <alice@example.com>"));
        assert_eq!(manager.current_user().unwrap().name, "Alice Johnson");
    }

    #[test]
    fn log_out_returns_to_no_user_mode() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();

        let out = session(&mut manager, &["14", "5", "14", "0"]);

        assert!(out.contains("Logged out from Alice"));
        assert_eq!(out.matches("Error: No user selected").count(), 2);
        assert!(manager.current_user().is_none());
    }

    #[test]
    fn invalid_utf8_line_is_reported_and_session_continues() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);

        let mut input = b"1\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"a@b.c\n2\n0\n");

        let mut shell = Shell::new(&mut manager, Cursor::new(input), Vec::new());
        shell.run().unwrap();
        let out = String::from_utf8(shell.into_output()).unwrap();

        assert!(out.contains("Error: Input is not valid UTF-8 text"));
        assert!(out.contains("No users found."));
        assert!(out.trim_end().ends_with("Goodbye!"));
        assert!(manager.list_users().is_empty());
    }

    #[test]
    fn duplicate_task_title_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();

        let out = session(
            &mut manager,
            &["4", "Pay rent", "", "", "", "4", "pay rent", "", "", "", "0"],
        );

        assert!(out.contains("Error: A task titled 'pay rent' already exists"));
        assert_eq!(manager.user_tasks(None).len(), 1);
    }

    #[test]
    fn duplicate_email_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);

        let out = session(
            &mut manager,
            &["1", "Alice", "alice@example.com", "1", "Alias", "ALICE@example.com", "0"],
        );

        assert!(out.contains("Error: A user with email"));
        assert_eq!(manager.list_users().len(), 1);
    }

    #[test]
    fn select_user_rejects_out_of_range_index() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        manager.add_user("Alice", "alice@example.com").unwrap();

        let out = session(&mut manager, &["3", "7", "3", "abc", "0"]);

        assert_eq!(out.matches("Error: Invalid selection").count(), 2);
        assert!(manager.current_user().is_none());
    }

    #[test]
    fn add_task_with_bad_date_aborts() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();

        let out = session(&mut manager, &["4", "Pay rent", "", "High", "01/01/2024", "0"]);

        assert!(out.contains("Error: Invalid date '01/01/2024'"));
        assert!(manager.user_tasks(None).is_empty());
    }

    #[test]
    fn add_task_with_bad_priority_aborts() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();

        let out = session(&mut manager, &["4", "Pay rent", "", "urgent", "0"]);

        assert!(out.contains("Error: Invalid priority 'urgent'"));
        assert!(manager.user_tasks(None).is_empty());
    }

    #[test]
    fn add_complete_and_reopen_task() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();

        let out = session(
            &mut manager,
            &["4", "Pay rent", "Flat 4B", "high", "2024-01-01", "8", "1", "0"],
        );

        assert!(out.contains("Task 'Pay rent' added"));
        assert!(out.contains("Task 'Pay rent' marked complete"));

        let task = manager.user_tasks(None)[0].clone();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.priority, Priority::High);
        assert!(manager.overdue_tasks(Some(&alice)).is_empty());

        session(&mut manager, &["3", "1", "9", "1", "0"]);
        assert_eq!(manager.get_task(&task.id).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn edit_keeps_blank_fields_and_clears_dash() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();
        let id = manager
            .add_task("Pay rent", "Flat 4B", Priority::Low, parse_date("2024-01-01").ok())
            .unwrap();

        let out = session(&mut manager, &["6", "1", "", "-", "medium", "-", "0"]);

        assert!(out.contains("Task updated"));
        let task = manager.get_task(&id).unwrap();
        assert_eq!(task.title, "Pay rent");
        assert_eq!(task.description, "");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn edit_with_no_changes() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();
        manager.add_task("Pay rent", "", Priority::Low, None).unwrap();

        let out = session(&mut manager, &["6", "1", "", "", "", "", "0"]);

        assert!(out.contains("No changes made."));
    }

    #[test]
    fn delete_requires_literal_yes() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();
        manager.add_task("Pay rent", "", Priority::Low, None).unwrap();

        let out = session(&mut manager, &["7", "1", "y", "0"]);
        assert!(out.contains("Deletion cancelled."));
        assert_eq!(manager.user_tasks(None).len(), 1);

        let out = session(&mut manager, &["3", "1", "7", "1", "yes", "0"]);
        assert!(out.contains("Task 'Pay rent' deleted"));
        assert!(manager.user_tasks(None).is_empty());
    }

    #[test]
    fn search_rejects_empty_query() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();
        manager
            .add_task("Complete project proposal", "", Priority::High, None)
            .unwrap();

        let out = session(&mut manager, &["13", "", "13", "PROJ", "0"]);

        assert!(out.contains("Error: Search query cannot be empty"));
        assert!(out.contains("Complete project proposal"));
    }

    #[test]
    fn mark_complete_with_nothing_pending() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        let alice = manager.add_user("Alice", "alice@example.com").unwrap();
        manager.set_current_user(&alice).unwrap();

        let out = session(&mut manager, &["8", "0"]);

        assert!(out.contains("No tasks found."));
        assert!(!out.contains("Select task number"));
    }

    #[test]
    fn save_failure_is_reported_as_warning() {
        let dir = TempDir::new().unwrap();
        let mut manager = open_manager(&dir);
        std::fs::create_dir(dir.path().join("data.json.tmp")).unwrap();

        let out = session(&mut manager, &["1", "Alice", "alice@example.com", "0"]);

        assert!(out.contains("User 'Alice' added"));
        assert!(out.contains("Warning: Change kept in memory but not saved"));
        assert_eq!(manager.list_users().len(), 1);
    }

    #[test]
    fn load_warning_is_shown_at_startup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let mut manager = TaskManager::open(&path).unwrap();

        let out = session(&mut manager, &["0"]);

        assert!(out.contains("Warning: Could not load saved data"));
    }
}
