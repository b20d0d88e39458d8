//! In-memory fake for the `ScmClient` trait (testing only)
//!
//! `MemoryScm` satisfies the trait contract without any network access.
//! Check-run listings are scripted: each call to `list_check_runs` consumes
//! the next scripted response, and the final response repeats once the
//! script is drained — which makes poll-loop tests deterministic.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::ScmClient;
use crate::types::{CheckRun, IssueComment};
use crate::{ScmError, ScmResult};

/// In-memory `ScmClient` backed by mutex-held vectors.
#[derive(Debug, Default)]
pub struct MemoryScm {
    changed_files: Vec<String>,
    comments: Mutex<Vec<IssueComment>>,
    next_comment_id: Mutex<u64>,
    check_run_script: Mutex<VecDeque<Vec<CheckRun>>>,
    last_check_runs: Mutex<Vec<CheckRun>>,
    fail_changed_files: bool,
    fail_comment_posts: bool,
}

impl MemoryScm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the changed-file listing returned for any pull request.
    pub fn with_changed_files(mut self, files: &[&str]) -> Self {
        self.changed_files = files.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Seed an existing comment.
    pub fn with_comment(self, body: &str) -> Self {
        {
            let mut comments = self.comments.lock().unwrap();
            let mut next_id = self.next_comment_id.lock().unwrap();
            *next_id += 1;
            comments.push(IssueComment {
                id: *next_id,
                body: body.to_string(),
            });
        }
        self
    }

    /// Make `list_changed_files` fail with an API error.
    pub fn failing_changed_files(mut self) -> Self {
        self.fail_changed_files = true;
        self
    }

    /// Make `create_comment` fail with an API error.
    pub fn failing_comment_posts(mut self) -> Self {
        self.fail_comment_posts = true;
        self
    }

    /// Append one scripted `list_check_runs` response.
    pub fn push_check_runs(&self, runs: Vec<CheckRun>) {
        self.check_run_script.lock().unwrap().push_back(runs);
    }

    /// Snapshot of all comments currently on the fake.
    pub fn comments(&self) -> Vec<IssueComment> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScmClient for MemoryScm {
    async fn list_changed_files(&self, _pr_number: u64) -> ScmResult<Vec<String>> {
        if self.fail_changed_files {
            return Err(ScmError::Api {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self.changed_files.clone())
    }

    async fn list_check_runs(&self, _head_sha: &str, check_name: &str) -> ScmResult<Vec<CheckRun>> {
        let runs = {
            let mut script = self.check_run_script.lock().unwrap();
            match script.pop_front() {
                Some(runs) => {
                    *self.last_check_runs.lock().unwrap() = runs.clone();
                    runs
                }
                None => self.last_check_runs.lock().unwrap().clone(),
            }
        };
        Ok(runs
            .into_iter()
            .filter(|r| r.name == check_name)
            .collect())
    }

    async fn list_comments(&self, _pr_number: u64) -> ScmResult<Vec<IssueComment>> {
        Ok(self.comments())
    }

    async fn create_comment(&self, _pr_number: u64, body: &str) -> ScmResult<()> {
        if self.fail_comment_posts {
            return Err(ScmError::Api {
                status: 403,
                body: "forbidden".to_string(),
            });
        }
        let mut comments = self.comments.lock().unwrap();
        let mut next_id = self.next_comment_id.lock().unwrap();
        *next_id += 1;
        comments.push(IssueComment {
            id: *next_id,
            body: body.to_string(),
        });
        Ok(())
    }
}
