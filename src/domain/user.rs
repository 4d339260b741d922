//! User domain model
//!
//! Users own tasks. They are created once and never modified or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// A person on whose behalf tasks are tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Contact address, unique across users (case-insensitive)
    pub email: String,

    /// When the user was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a fresh ID.
    ///
    /// Does not validate; see [`validate_name`] and [`validate_email`].
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }

    /// Returns true if this user's email matches `email`, ignoring case
    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }
}

/// Checks that a display name is non-empty after trimming
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    Ok(())
}

/// Checks that an email has an `@` followed somewhere by a `.`
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    let valid = email
        .find('@')
        .map(|at| email[at + 1..].contains('.'))
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(format!("Invalid email address: '{}'", email))
    }
}

/// Canonical form used for uniqueness comparisons
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
