//! Backend-agnostic source-control client trait.

use async_trait::async_trait;

use crate::types::{CheckRun, IssueComment};
use crate::ScmResult;

/// Read/write surface of the source-control API that the gate consumes.
///
/// All reads are idempotent; the single write (`create_comment`) is guarded
/// by the caller's deduplication check. Implementations are expected to
/// follow pagination to exhaustion on the list operations.
#[async_trait]
pub trait ScmClient: Send + Sync {
    /// List the full set of file paths changed in a pull request.
    async fn list_changed_files(&self, pr_number: u64) -> ScmResult<Vec<String>>;

    /// List check runs for a revision, filtered by check name.
    ///
    /// Multiple runs with the same name may exist for one revision (reruns);
    /// the caller decides which is authoritative.
    async fn list_check_runs(&self, head_sha: &str, check_name: &str) -> ScmResult<Vec<CheckRun>>;

    /// List all comments on a pull request.
    async fn list_comments(&self, pr_number: u64) -> ScmResult<Vec<IssueComment>>;

    /// Post a new comment on a pull request.
    async fn create_comment(&self, pr_number: u64, body: &str) -> ScmResult<()>;
}
