//! Input format validation
//!
//! These helpers only check that text has the right shape (a date, a known
//! label, an in-range number). Business rules are left to the task manager.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Priority, TaskStatus};

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("Invalid date '{0}'. Use the format YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid priority '{0}'. Use High, Medium or Low")]
    InvalidPriority(String),

    #[error("Invalid status '{0}'. Use Pending or Completed")]
    InvalidStatus(String),

    #[error("Invalid selection '{input}'. Enter a number from 1 to {max}")]
    InvalidIndex { input: String, max: usize },

    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),

    #[error("Input is not valid UTF-8 text")]
    InvalidEncoding,

    #[error("End of input")]
    EndOfInput,
}

/// Parses a date written exactly as `YYYY-MM-DD`
pub fn parse_date(input: &str) -> Result<NaiveDate, InputError> {
    let input = input.trim();
    let invalid = || InputError::InvalidDate(input.to_string());

    let well_formed = input.len() == 10
        && input.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| invalid())
}

/// Parses an optional date; blank input means no date
pub fn parse_optional_date(input: &str) -> Result<Option<NaiveDate>, InputError> {
    if input.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(input).map(Some)
    }
}

pub fn parse_priority(input: &str) -> Result<Priority, InputError> {
    Priority::from_label(input).ok_or_else(|| InputError::InvalidPriority(input.trim().to_string()))
}

pub fn parse_status(input: &str) -> Result<TaskStatus, InputError> {
    TaskStatus::from_label(input).ok_or_else(|| InputError::InvalidStatus(input.trim().to_string()))
}

/// Parses a 1-based selection out of `len` items into a 0-based index
pub fn parse_index(input: &str, len: usize) -> Result<usize, InputError> {
    let input = input.trim();
    match input.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Ok(n - 1),
        _ => Err(InputError::InvalidIndex {
            input: input.to_string(),
            max: len,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_iso_dates() {
        assert_eq!(
            parse_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_date(" 2024-02-29 ").is_ok());
    }

    #[test]
    fn rejects_other_date_shapes() {
        for bad in [
            "2024-1-5",
            "15/01/2024",
            "2024/01/15",
            "20240115",
            "2024-01-15T00:00",
            "tomorrow",
            "",
        ] {
            assert!(
                matches!(parse_date(bad), Err(InputError::InvalidDate(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("2024-00-10").is_err());
    }

    #[test]
    fn optional_date_blank_is_none() {
        assert_eq!(parse_optional_date("   ").unwrap(), None);
        assert!(parse_optional_date("2024-01-01").unwrap().is_some());
        assert!(parse_optional_date("soon").is_err());
    }

    #[test]
    fn priority_labels() {
        assert_eq!(parse_priority("high").unwrap(), Priority::High);
        assert_eq!(parse_priority("Medium").unwrap(), Priority::Medium);
        assert_eq!(parse_priority("LOW").unwrap(), Priority::Low);
        assert_eq!(
            parse_priority("critical"),
            Err(InputError::InvalidPriority("critical".to_string()))
        );
    }

    #[test]
    fn status_labels() {
        assert_eq!(parse_status("completed").unwrap(), TaskStatus::Completed);
        assert_eq!(parse_status(" pending").unwrap(), TaskStatus::Pending);
        assert!(parse_status("done").is_err());
    }

    #[test]
    fn index_selection() {
        assert_eq!(parse_index("1", 3).unwrap(), 0);
        assert_eq!(parse_index(" 3 ", 3).unwrap(), 2);

        assert_eq!(
            parse_index("0", 3),
            Err(InputError::InvalidIndex {
                input: "0".to_string(),
                max: 3
            })
        );
        assert!(parse_index("4", 3).is_err());
        assert!(parse_index("-1", 3).is_err());
        assert!(parse_index("two", 3).is_err());
        assert!(parse_index("1", 0).is_err());
    }
}
