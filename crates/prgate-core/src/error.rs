//! Error taxonomy for the policy gate.

use thiserror::Error;

use prgate_scm::{CheckConclusion, ScmError};

use crate::drift::DriftViolation;

/// Errors that can fail a gate run.
///
/// Every variant is fatal to the run; the orchestrator never swallows one.
/// The only non-fatal path in the whole gate (a failed rerun-comment post)
/// is logged inside the review coordinator and never surfaces here.
#[derive(Error, Debug)]
pub enum GateError {
    /// Missing run context, unreadable policy file, or invalid contract content.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Policy contract is not valid JSON or is missing required keys.
    #[error("Policy contract parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Source-control API failure on a load-bearing read.
    #[error("Source control fetch failed: {0}")]
    Fetch(#[from] ScmError),

    /// One or more docs-drift rules triggered without their companion update.
    #[error("{} docs-drift violation(s)", .violations.len())]
    DocsDrift { violations: Vec<DriftViolation> },

    /// The review check never completed inside the configured window.
    #[error("Review check '{check_name}' did not complete within {minutes} minute(s)")]
    ReviewTimeout { check_name: String, minutes: u64 },

    /// The review check completed with a conclusion other than `success`.
    #[error("Review check '{check_name}' for {head_sha} concluded '{conclusion}', expected 'success'")]
    ReviewRejected {
        check_name: String,
        head_sha: String,
        conclusion: CheckConclusion,
        details_url: Option<String>,
    },

    /// Filesystem failure while writing step outputs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GateError {
    /// Multi-line operator-facing explanation for CI logs.
    ///
    /// States what was violated and the evidence that triggered it, not just
    /// an error code.
    pub fn summary(&self) -> String {
        match self {
            GateError::DocsDrift { violations } => {
                let mut out = String::from("Docs-drift check failed:\n");
                for violation in violations {
                    out.push_str(&format!("  - {}\n", violation.message));
                    out.push_str(&format!(
                        "    expected an update to any of: {}\n",
                        violation.expected_patterns.join(", ")
                    ));
                    out.push_str("    changed files:\n");
                    for file in &violation.changed_files {
                        out.push_str(&format!("      - {}\n", file));
                    }
                }
                out
            }
            GateError::ReviewTimeout {
                check_name,
                minutes,
            } => format!(
                "Review agent timed out: check run '{}' never reached 'completed' \
                 within {} minute(s). The gate cannot verify the review verdict.",
                check_name, minutes
            ),
            GateError::ReviewRejected {
                check_name,
                head_sha,
                conclusion,
                details_url,
            } => {
                let mut out = format!(
                    "Review gate failed: check run '{}' for revision {} concluded \
                     '{}'. Any conclusion other than 'success' means the review \
                     agent reported unresolved findings.\n",
                    check_name, head_sha, conclusion
                );
                if let Some(url) = details_url {
                    out.push_str(&format!("Details: {}\n", url));
                }
                out
            }
            other => other.to_string(),
        }
    }
}
