//! prgate-core — deterministic PR policy gating
//!
//! This crate holds the policy domain of the gate:
//!
//! - Policy contract loading and eager validation
//! - Risk-tier classification of changed files
//! - Required-checks resolution per tier
//! - Docs-drift enforcement (paired trigger/companion glob rules)
//! - Review-agent coordination (rerun request, poll, assert)
//! - The single-pass gate orchestrator
//!
//! Everything network-facing is injected via `prgate_scm::ScmClient`, so the
//! whole gate runs against an in-memory fake in tests.

pub mod contract;
pub mod drift;
pub mod error;
pub mod gate;
pub mod outputs;
pub mod review;
pub mod telemetry;
pub mod tier;

pub use contract::{DocsDriftRule, MergePolicyEntry, PolicyContract, ReviewAgentConfig, ShaPolicy};
pub use drift::{DriftMatcher, DriftVerdict, DriftViolation};
pub use error::GateError;
pub use gate::{run_gate, GateRun, PullRequestContext};
pub use outputs::OutputSink;
pub use review::{CompletedCheck, ReviewCoordinator};
pub use telemetry::init_tracing;
pub use tier::{RiskTier, TierMatcher};

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
