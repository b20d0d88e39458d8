//! Review-agent coordination: request a rerun, wait for the check run,
//! assert its conclusion.
//!
//! Applies only to tiers that require review. The rerun-comment post is the
//! one non-fatal step in the whole gate; everything after it blocks the run.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use prgate_scm::{CheckConclusion, CheckRun, ScmClient};

use crate::contract::ReviewAgentConfig;
use crate::error::GateError;

/// Fixed delay between check-run polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Terminal state of the authoritative review check run.
#[derive(Debug, Clone)]
pub struct CompletedCheck {
    pub conclusion: CheckConclusion,
    pub details_url: Option<String>,
}

/// Drives the review agent to completion for one PR revision.
pub struct ReviewCoordinator<'a> {
    scm: &'a dyn ScmClient,
    config: &'a ReviewAgentConfig,
    poll_interval: Duration,
}

impl<'a> ReviewCoordinator<'a> {
    pub fn new(scm: &'a dyn ScmClient, config: &'a ReviewAgentConfig) -> Self {
        Self {
            scm,
            config,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll interval (tests use short virtual intervals).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Full coordinator sequence: request, wait, assert.
    pub async fn run(&self, pr_number: u64, head_sha: &str) -> Result<(), GateError> {
        self.ensure_rerun_comment(pr_number, head_sha).await;
        let completed = self.wait_for_completion(head_sha).await?;
        self.assert_success(head_sha, &completed)
    }

    /// Post the rerun comment unless one already exists for this revision.
    ///
    /// A comment bearing both the configured marker and the `sha:<revision>`
    /// tag suppresses the post. Failures here are logged and swallowed: the
    /// agent may already be triggered by a push-event webhook, so the gate
    /// must not abort over a comment.
    pub async fn ensure_rerun_comment(&self, pr_number: u64, head_sha: &str) {
        let tag = format!("sha:{}", head_sha);
        match self.scm.list_comments(pr_number).await {
            Ok(comments) => {
                let exists = comments
                    .iter()
                    .any(|c| c.body.contains(&self.config.comment_marker) && c.body.contains(&tag));
                if exists {
                    debug!(head_sha, "rerun comment already present for revision");
                    return;
                }
            }
            Err(err) => {
                warn!(error = %err, "could not list comments for rerun dedup, posting anyway");
            }
        }

        let body = format!(
            "{}\n\n{} {}",
            self.config.rerun_command, self.config.comment_marker, tag
        );
        match self.scm.create_comment(pr_number, &body).await {
            Ok(()) => info!(head_sha, "posted review rerun comment"),
            Err(err) => {
                warn!(
                    error = %err,
                    "rerun comment post failed; review may already be triggered elsewhere"
                );
            }
        }
    }

    /// Poll the named check run until it completes or the deadline passes.
    ///
    /// The deadline is computed once at loop entry. Among same-named reruns
    /// the most recently started run is authoritative.
    pub async fn wait_for_completion(&self, head_sha: &str) -> Result<CompletedCheck, GateError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_minutes * 60);
        info!(
            check = %self.config.check_name,
            timeout_minutes = self.config.timeout_minutes,
            "waiting for review check run"
        );

        loop {
            if Instant::now() >= deadline {
                return Err(GateError::ReviewTimeout {
                    check_name: self.config.check_name.clone(),
                    minutes: self.config.timeout_minutes,
                });
            }

            let runs = self
                .scm
                .list_check_runs(head_sha, &self.config.check_name)
                .await?;

            match authoritative_run(&runs) {
                Some(run) if run.is_completed() => {
                    info!(
                        check = %run.name,
                        conclusion = ?run.conclusion,
                        "review check run completed"
                    );
                    return Ok(CompletedCheck {
                        conclusion: run.conclusion.unwrap_or(CheckConclusion::Unknown),
                        details_url: run.details_url.clone(),
                    });
                }
                Some(run) => {
                    debug!(check = %run.name, status = ?run.status, "review check still running");
                }
                None => {
                    debug!(check = %self.config.check_name, "review check run not found yet");
                }
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Require the completed run's conclusion to be exactly `success`.
    ///
    /// `neutral` and `action_required` are not exemptions: anything other
    /// than `success` means unresolved actionable findings.
    pub fn assert_success(
        &self,
        head_sha: &str,
        completed: &CompletedCheck,
    ) -> Result<(), GateError> {
        if completed.conclusion == CheckConclusion::Success {
            info!(check = %self.config.check_name, "review check concluded success");
            return Ok(());
        }
        Err(GateError::ReviewRejected {
            check_name: self.config.check_name.clone(),
            head_sha: head_sha.to_string(),
            conclusion: completed.conclusion,
            details_url: completed.details_url.clone(),
        })
    }
}

/// Pick the authoritative run among same-named reruns: latest `started_at`,
/// tie-broken by highest run id when start times are equal or absent.
fn authoritative_run(runs: &[CheckRun]) -> Option<&CheckRun> {
    runs.iter().max_by_key(|r| (r.started_at, r.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use prgate_scm::fakes::MemoryScm;
    use prgate_scm::CheckStatus;

    fn config(timeout_minutes: u64) -> ReviewAgentConfig {
        ReviewAgentConfig {
            provider: "github-app".to_string(),
            check_name: "ai-review".to_string(),
            timeout_minutes,
            comment_marker: "<!-- prgate-rerun -->".to_string(),
            rerun_command: "@reviewer rerun".to_string(),
        }
    }

    fn run_at(id: u64, status: CheckStatus, conclusion: Option<CheckConclusion>, secs: i64) -> CheckRun {
        CheckRun {
            id,
            name: "ai-review".to_string(),
            status,
            conclusion,
            started_at: Some(Utc.timestamp_opt(secs, 0).unwrap()),
            details_url: Some(format!("https://example.com/runs/{}", id)),
        }
    }

    #[test]
    fn test_authoritative_run_latest_started() {
        let runs = vec![
            run_at(1, CheckStatus::Completed, Some(CheckConclusion::Failure), 100),
            run_at(2, CheckStatus::InProgress, None, 200),
        ];
        assert_eq!(authoritative_run(&runs).unwrap().id, 2);
    }

    #[test]
    fn test_authoritative_run_tie_breaks_on_id() {
        let mut a = run_at(10, CheckStatus::Completed, Some(CheckConclusion::Success), 100);
        let mut b = run_at(11, CheckStatus::Completed, Some(CheckConclusion::Failure), 100);
        a.started_at = None;
        b.started_at = None;
        assert_eq!(authoritative_run(&[a, b]).unwrap().id, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_conclusion_after_polls() {
        let scm = MemoryScm::new();
        scm.push_check_runs(vec![run_at(1, CheckStatus::InProgress, None, 100)]);
        scm.push_check_runs(vec![run_at(1, CheckStatus::InProgress, None, 100)]);
        scm.push_check_runs(vec![run_at(
            1,
            CheckStatus::Completed,
            Some(CheckConclusion::Success),
            100,
        )]);

        let cfg = config(30);
        let coordinator = ReviewCoordinator::new(&scm, &cfg);
        let completed = coordinator.wait_for_completion("abc123").await.unwrap();
        assert_eq!(completed.conclusion, CheckConclusion::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_when_never_completed() {
        let scm = MemoryScm::new();
        scm.push_check_runs(vec![run_at(1, CheckStatus::InProgress, None, 100)]);

        let cfg = config(1);
        let coordinator =
            ReviewCoordinator::new(&scm, &cfg).with_poll_interval(Duration::from_secs(5));
        let err = coordinator.wait_for_completion("abc123").await.unwrap_err();
        assert!(matches!(
            err,
            GateError::ReviewTimeout { minutes: 1, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_picks_most_recent_rerun() {
        let scm = MemoryScm::new();
        scm.push_check_runs(vec![
            run_at(1, CheckStatus::Completed, Some(CheckConclusion::Failure), 100),
            run_at(2, CheckStatus::Completed, Some(CheckConclusion::Success), 200),
        ]);

        let cfg = config(30);
        let coordinator = ReviewCoordinator::new(&scm, &cfg);
        let completed = coordinator.wait_for_completion("abc123").await.unwrap();
        assert_eq!(completed.conclusion, CheckConclusion::Success);
    }

    #[test]
    fn test_assert_success_only_accepts_success() {
        let scm = MemoryScm::new();
        let cfg = config(30);
        let coordinator = ReviewCoordinator::new(&scm, &cfg);

        let ok = CompletedCheck {
            conclusion: CheckConclusion::Success,
            details_url: None,
        };
        assert!(coordinator.assert_success("abc123", &ok).is_ok());

        for conclusion in [
            CheckConclusion::Failure,
            CheckConclusion::Neutral,
            CheckConclusion::Cancelled,
            CheckConclusion::TimedOut,
            CheckConclusion::ActionRequired,
            CheckConclusion::Unknown,
        ] {
            let completed = CompletedCheck {
                conclusion,
                details_url: Some("https://example.com/runs/1".to_string()),
            };
            let err = coordinator.assert_success("abc123", &completed).unwrap_err();
            assert!(
                matches!(err, GateError::ReviewRejected { .. }),
                "conclusion {:?} must be rejected",
                conclusion
            );
        }
    }

    #[tokio::test]
    async fn test_rerun_comment_posted_once_per_revision() {
        let scm = MemoryScm::new();
        let cfg = config(30);
        let coordinator = ReviewCoordinator::new(&scm, &cfg);

        coordinator.ensure_rerun_comment(42, "abc123").await;
        coordinator.ensure_rerun_comment(42, "abc123").await;

        let comments = scm.comments();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].body.contains("@reviewer rerun"));
        assert!(comments[0].body.contains("sha:abc123"));
    }

    #[tokio::test]
    async fn test_rerun_comment_new_revision_posts_again() {
        let scm = MemoryScm::new();
        let cfg = config(30);
        let coordinator = ReviewCoordinator::new(&scm, &cfg);

        coordinator.ensure_rerun_comment(42, "abc123").await;
        coordinator.ensure_rerun_comment(42, "def456").await;

        assert_eq!(scm.comments().len(), 2);
    }

    #[tokio::test]
    async fn test_rerun_comment_post_failure_is_not_fatal() {
        let scm = MemoryScm::new().failing_comment_posts();
        let cfg = config(30);
        let coordinator = ReviewCoordinator::new(&scm, &cfg);

        // Must not panic or error; the failure is logged and swallowed.
        coordinator.ensure_rerun_comment(42, "abc123").await;
        assert!(scm.comments().is_empty());
    }
}
