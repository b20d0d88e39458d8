//! Source-control API boundary for the prgate policy gate.
//!
//! This crate isolates every network-facing concern of the gate behind the
//! async [`ScmClient`] trait:
//!
//! - listing the files changed in a pull request
//! - listing check runs for a revision, filtered by name
//! - listing and creating pull-request comments
//!
//! ## Key Components
//!
//! - `ScmClient`: backend-agnostic trait consumed by the gate orchestrator
//! - `GitHubClient`: REST v3 implementation over `reqwest`
//! - `fakes::MemoryScm`: in-memory fake for tests

mod client;
mod error;
pub mod fakes;
mod github;
mod types;

pub use client::ScmClient;
pub use error::ScmError;
pub use github::GitHubClient;
pub use types::{CheckConclusion, CheckRun, CheckStatus, IssueComment};

/// Result type for source-control operations.
pub type ScmResult<T> = std::result::Result<T, ScmError>;
