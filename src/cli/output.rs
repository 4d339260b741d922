//! Output formatting for the interactive shell

use std::io::{self, Write};

use chrono::NaiveDate;

use crate::domain::{Task, TaskSummary, User, UserId};

/// Output helper for consistent formatting
pub struct Output<W> {
    out: W,
}

impl<W: Write> Output<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints a plain line
    pub fn line(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)
    }

    /// Prints a success message
    pub fn success(&mut self, message: &str) -> io::Result<()> {
        self.line(message)
    }

    /// Prints an error message
    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "Error: {}", message)
    }

    /// Prints a warning message
    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "Warning: {}", message)
    }

    /// Prints a blank line
    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    /// Prints a prompt without a newline and flushes it
    pub fn prompt(&mut self, label: &str) -> io::Result<()> {
        write!(self.out, "{}", label)?;
        self.out.flush()
    }

    /// Prints a titled section header
    pub fn heading(&mut self, title: &str) -> io::Result<()> {
        self.blank()?;
        self.line(title)?;
        self.line(&"-".repeat(title.chars().count().max(20)))
    }

    /// Prints a numbered table of tasks, marking those overdue as of `today`
    pub fn task_table<'a>(
        &mut self,
        tasks: impl IntoIterator<Item = &'a Task>,
        today: NaiveDate,
    ) -> io::Result<()> {
        let tasks: Vec<&Task> = tasks.into_iter().collect();
        if tasks.is_empty() {
            return self.line("No tasks found.");
        }

        writeln!(
            self.out,
            "{:<4} {:<30} {:<8} {:<10} {:<10}",
            "#", "TITLE", "PRIORITY", "STATUS", "DUE"
        )?;
        self.line(&"-".repeat(70))?;

        for (i, task) in tasks.iter().enumerate() {
            let due = task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            let flag = if task.is_overdue_on(today) { "  OVERDUE" } else { "" };

            writeln!(
                self.out,
                "{:<4} {:<30} {:<8} {:<10} {:<10}{}",
                i + 1,
                task.title,
                task.priority,
                task.status,
                due,
                flag
            )?;

            if !task.description.is_empty() {
                writeln!(self.out, "     {}", task.description)?;
            }
        }

        Ok(())
    }

    /// Prints a numbered table of users, marking the current one
    pub fn user_table<'a>(
        &mut self,
        users: impl IntoIterator<Item = &'a User>,
        current: Option<UserId>,
    ) -> io::Result<()> {
        let users: Vec<&User> = users.into_iter().collect();
        if users.is_empty() {
            return self.line("No users found.");
        }

        writeln!(self.out, "{:<4} {:<24} {:<30} ID", "#", "NAME", "EMAIL")?;
        self.line(&"-".repeat(70))?;

        for (i, user) in users.iter().enumerate() {
            let marker = if Some(user.id) == current { "  (current)" } else { "" };
            writeln!(
                self.out,
                "{:<4} {:<24} {:<30} {}{}",
                i + 1,
                user.name,
                user.email,
                user.id.short(),
                marker
            )?;
        }

        Ok(())
    }

    /// Prints task counts
    pub fn summary(&mut self, summary: &TaskSummary) -> io::Result<()> {
        writeln!(
            self.out,
            "{} task(s): {} pending, {} completed, {} overdue",
            summary.total, summary.pending, summary.completed, summary.overdue
        )
    }
}
