//! Client type and lifecycle status, dashboard filtering and counts.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::{require_max_len, require_non_blank};

/// Maximum length of a client display name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of the free-text assignee.
pub const MAX_ASSIGNEE_LEN: usize = 120;

// ---------------------------------------------------------------------------
// Client type
// ---------------------------------------------------------------------------

/// The four categories of client the firm serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Individual,
    Business,
    Trust,
    Nonprofit,
}

impl ClientType {
    pub const ALL: [ClientType; 4] = [
        ClientType::Individual,
        ClientType::Business,
        ClientType::Trust,
        ClientType::Nonprofit,
    ];

    /// Parse a type string from the database or a request path.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "individual" => Ok(Self::Individual),
            "business" => Ok(Self::Business),
            "trust" => Ok(Self::Trust),
            "nonprofit" => Ok(Self::Nonprofit),
            _ => Err(CoreError::Validation(format!(
                "Invalid client type '{s}'. Must be one of: individual, business, trust, nonprofit"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Business => "business",
            Self::Trust => "trust",
            Self::Nonprofit => "nonprofit",
        }
    }

    /// Capitalized display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::Business => "Business",
            Self::Trust => "Trust",
            Self::Nonprofit => "Nonprofit",
        }
    }

    /// Whether the intake questionnaire has a type-specific section.
    pub fn has_specific_questions(&self) -> bool {
        !matches!(self, Self::Individual)
    }
}

// ---------------------------------------------------------------------------
// Client status
// ---------------------------------------------------------------------------

/// Lifecycle status: new -> in_progress -> ready -> complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    New,
    InProgress,
    Ready,
    Complete,
}

impl ClientStatus {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "ready" => Ok(Self::Ready),
            "complete" => Ok(Self::Complete),
            _ => Err(CoreError::Validation(format!(
                "Invalid client status '{s}'. Must be one of: new, in_progress, ready, complete"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Ready => "ready",
            Self::Complete => "complete",
        }
    }
}

/// Derive the status implied by a new setup-progress percentage.
///
/// A completed client stays complete. Full progress makes a client ready,
/// any partial progress puts it in progress, and zero progress only moves a
/// client back to `new` if it was never past `in_progress`.
pub fn status_for_progress(current: ClientStatus, progress: i32) -> ClientStatus {
    if current == ClientStatus::Complete {
        return current;
    }
    match progress {
        p if p >= 100 => ClientStatus::Ready,
        p if p > 0 => ClientStatus::InProgress,
        _ if current == ClientStatus::Ready => ClientStatus::InProgress,
        _ => current,
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

pub fn validate_client_name(name: &str) -> Result<(), CoreError> {
    require_non_blank("name", name)?;
    require_max_len("name", name, MAX_NAME_LEN)
}

pub fn validate_assignee(assignee: &str) -> Result<(), CoreError> {
    require_max_len("assigned_to", assignee, MAX_ASSIGNEE_LEN)
}

/// Setup progress is an integer percentage.
pub fn validate_setup_progress(progress: i32) -> Result<(), CoreError> {
    if !(0..=100).contains(&progress) {
        return Err(CoreError::Validation(format!(
            "setup_progress {progress} is out of range (0..=100)"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dashboard filtering
// ---------------------------------------------------------------------------

/// Status filter applied to the dashboard list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(ClientStatus),
}

impl StatusFilter {
    /// Parse `all` or one of the status strings. Missing means `All`.
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value {
            None | Some("") | Some("all") => Ok(Self::All),
            Some(s) => ClientStatus::from_str_db(s).map(Self::Only),
        }
    }

    pub fn matches(&self, status: ClientStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(s) => *s == status,
        }
    }
}

/// Case-insensitive substring match of the search box against a name.
pub fn matches_search(name: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

/// Per-status counts shown above the dashboard list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub ready: usize,
    pub complete: usize,
}

impl DashboardStats {
    pub fn from_statuses<I: IntoIterator<Item = ClientStatus>>(statuses: I) -> Self {
        Self::from_counts(statuses.into_iter().map(|s| (s, 1)))
    }

    /// Build from pre-aggregated `(status, count)` pairs, as returned by a
    /// grouped query. Repeated statuses are summed.
    pub fn from_counts<I: IntoIterator<Item = (ClientStatus, usize)>>(counts: I) -> Self {
        let mut stats = Self::default();
        for (status, n) in counts {
            stats.total += n;
            match status {
                ClientStatus::New => stats.new += n,
                ClientStatus::InProgress => stats.in_progress += n,
                ClientStatus::Ready => stats.ready += n,
                ClientStatus::Complete => stats.complete += n,
            }
        }
        stats
    }
}
