//! Client portal: task requests and the message thread between staff and
//! client.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::{require_max_len, require_non_blank};

pub const MAX_TASK_TITLE_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
}

impl TaskStatus {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            _ => Err(CoreError::Validation(format!(
                "Invalid task status '{s}'. Must be one of: pending, in_progress, complete"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Complete)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(CoreError::Validation(format!(
                "Invalid task priority '{s}'. Must be one of: low, medium, high"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    Staff,
    Client,
}

impl MessageSender {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "staff" => Ok(Self::Staff),
            "client" => Ok(Self::Client),
            _ => Err(CoreError::Validation(format!(
                "Invalid message sender '{s}'. Must be one of: staff, client"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Client => "client",
        }
    }
}

pub fn validate_task_title(title: &str) -> Result<(), CoreError> {
    require_non_blank("title", title)?;
    require_max_len("title", title, MAX_TASK_TITLE_LEN)
}

pub fn validate_message_body(body: &str) -> Result<(), CoreError> {
    require_non_blank("body", body)?;
    require_max_len("body", body, MAX_MESSAGE_LEN)
}

/// Split tasks into open (pending or in progress) and completed, keeping
/// their relative order.
pub fn partition_tasks<T, F>(tasks: Vec<T>, status_of: F) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> TaskStatus,
{
    tasks.into_iter().partition(|t| status_of(t).is_open())
}

/// Messages from staff the client has not read yet.
pub fn unread_count<I>(messages: I) -> usize
where
    I: IntoIterator<Item = (MessageSender, bool)>,
{
    messages
        .into_iter()
        .filter(|(sender, read)| *sender == MessageSender::Staff && !read)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_strings() {
        for s in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Complete] {
            assert_eq!(TaskStatus::from_str_db(s.as_str()).unwrap(), s);
        }
        assert!(TaskStatus::from_str_db("in-progress").is_err());
    }

    #[test]
    fn priority_orders_low_to_high() {
        assert!(TaskPriority::High > TaskPriority::Medium);
        assert!(TaskPriority::Medium > TaskPriority::Low);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert!(TaskPriority::from_str_db("urgent").is_err());
    }

    #[test]
    fn partition_keeps_order() {
        let tasks = vec![
            ("upload w2", TaskStatus::Pending),
            ("sign organizer", TaskStatus::Complete),
            ("estimates", TaskStatus::InProgress),
        ];
        let (open, done) = partition_tasks(tasks, |t| t.1);
        assert_eq!(open.iter().map(|t| t.0).collect::<Vec<_>>(), ["upload w2", "estimates"]);
        assert_eq!(done.len(), 1);
    }

    #[test]
    fn unread_counts_staff_messages_only() {
        let messages = [
            (MessageSender::Staff, false),
            (MessageSender::Staff, true),
            (MessageSender::Client, false),
            (MessageSender::Staff, false),
        ];
        assert_eq!(unread_count(messages), 2);
    }

    #[test]
    fn validation() {
        assert!(validate_task_title("Upload W-2 Forms").is_ok());
        assert!(validate_task_title("").is_err());
        assert!(validate_message_body(" ").is_err());
        assert!(validate_message_body(&"x".repeat(MAX_MESSAGE_LEN + 1)).is_err());
    }
}
