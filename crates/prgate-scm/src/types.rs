//! Wire-level source-control types consumed by the gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Created but not yet picked up.
    Queued,
    /// Currently executing.
    InProgress,
    /// Reached a terminal state; a conclusion is present.
    Completed,
}

/// Terminal verdict of a completed check run.
///
/// Only `Success` is accepted by the gate as "no actionable findings".
/// Values the provider may add in the future deserialize as `Unknown`
/// rather than failing the whole poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    TimedOut,
    ActionRequired,
    Skipped,
    Stale,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for CheckConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
            Self::Skipped => "skipped",
            Self::Stale => "stale",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A named, revision-scoped unit of CI status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRun {
    /// Provider-assigned numeric identifier.
    pub id: u64,
    /// Human-readable check name (e.g. "ai-review").
    pub name: String,
    /// Lifecycle status.
    pub status: CheckStatus,
    /// Terminal verdict, present once `status` is `Completed`.
    pub conclusion: Option<CheckConclusion>,
    /// When the run started executing. May be absent for queued runs.
    pub started_at: Option<DateTime<Utc>>,
    /// Link to the provider's detail page for this run.
    pub details_url: Option<String>,
}

impl CheckRun {
    /// Whether this run has reached its terminal state.
    pub fn is_completed(&self) -> bool {
        self.status == CheckStatus::Completed
    }
}

/// A pull-request comment as read from or written to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueComment {
    /// Provider-assigned numeric identifier.
    pub id: u64,
    /// Raw comment body.
    pub body: String,
}
