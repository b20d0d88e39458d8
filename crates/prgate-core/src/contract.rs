//! Policy contract loading and eager validation.
//!
//! The contract is a JSON document at a well-known repository path
//! (`.pr-policy.json`). Every field the gate reads must be present; there is
//! no defaulting. The full shape is validated eagerly at load time so a
//! malformed contract fails the run before any API call is made.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::drift::DriftMatcher;
use crate::error::GateError;
use crate::tier::{RiskTier, TierMatcher};

/// Merge requirements for a single risk tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePolicyEntry {
    /// Mandatory CI check names, matched verbatim against provider checks.
    pub required_checks: Vec<String>,
    /// Minimum human reviewer count.
    pub min_reviewers: u32,
    /// Evidence identifiers that must accompany the merge.
    pub required_evidence: Vec<String>,
    /// Whether PRs at this tier are eligible for auto-merge.
    pub auto_merge: bool,
}

/// A paired trigger/companion rule detecting documentation drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsDriftRule {
    /// Glob patterns that arm the rule when any changed file matches.
    pub triggers: Vec<String>,
    /// Satisfied when ANY changed file matches any of these patterns.
    pub require_updated: Vec<String>,
    /// Operator-facing violation message.
    pub message: String,
}

/// Configuration for the external review agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAgentConfig {
    /// Provider identifier (informational).
    pub provider: String,
    /// Name of the check run the agent publishes.
    pub check_name: String,
    /// Wall-clock budget for the agent to complete, in minutes.
    pub timeout_minutes: u64,
    /// Marker string used to deduplicate rerun comments.
    pub comment_marker: String,
    /// Exact comment text that re-triggers the agent.
    pub rerun_command: String,
}

/// Revision-freshness rules.
///
/// Declared in the contract and validated, but not enforced by the
/// orchestrator. See DESIGN.md.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShaPolicy {
    pub require_current_head: bool,
    pub stale_after_push_events: Vec<String>,
    pub max_reruns_per_sha: u32,
}

/// The declarative policy document, immutable for the run's duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyContract {
    pub version: String,
    /// Tier name to glob patterns; a file may match several tiers.
    pub risk_tier_rules: BTreeMap<RiskTier, Vec<String>>,
    /// Tier name to merge requirements. Must cover every tier.
    pub merge_policy: BTreeMap<RiskTier, MergePolicyEntry>,
    /// Ordered drift rules, each evaluated independently.
    pub docs_drift_rules: Vec<DocsDriftRule>,
    pub review_agent: ReviewAgentConfig,
    pub sha_policy: ShaPolicy,
}

impl PolicyContract {
    /// Load and validate the contract at `path`.
    ///
    /// A missing or unreadable file is a `Configuration` error; invalid JSON
    /// or a missing required key is a `Parse` error; a shape that parses but
    /// fails validation is a `Configuration` error.
    pub fn load(path: &Path) -> Result<Self, GateError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            GateError::Configuration(format!(
                "policy contract not readable at {}: {}",
                path.display(),
                err
            ))
        })?;
        let contract: PolicyContract = serde_json::from_str(&raw)?;
        contract.validate()?;
        info!(
            version = %contract.version,
            drift_rules = contract.docs_drift_rules.len(),
            review_check = %contract.review_agent.check_name,
            "policy contract loaded"
        );
        Ok(contract)
    }

    /// Validate the full contract shape eagerly.
    ///
    /// Checks that every glob in every section compiles, that the merge
    /// policy covers all four tiers, and that the review-agent block is
    /// usable.
    pub fn validate(&self) -> Result<(), GateError> {
        TierMatcher::compile(&self.risk_tier_rules)?;
        DriftMatcher::compile(&self.docs_drift_rules)?;

        for tier in RiskTier::ALL {
            if !self.merge_policy.contains_key(&tier) {
                return Err(GateError::Configuration(format!(
                    "mergePolicy is missing an entry for tier '{}'",
                    tier
                )));
            }
        }

        if self.version.trim().is_empty() {
            return Err(GateError::Configuration(
                "contract version must not be empty".to_string(),
            ));
        }
        if self.review_agent.check_name.trim().is_empty() {
            return Err(GateError::Configuration(
                "reviewAgent.checkName must not be empty".to_string(),
            ));
        }
        if self.review_agent.comment_marker.trim().is_empty() {
            return Err(GateError::Configuration(
                "reviewAgent.commentMarker must not be empty".to_string(),
            ));
        }
        if self.review_agent.rerun_command.trim().is_empty() {
            return Err(GateError::Configuration(
                "reviewAgent.rerunCommand must not be empty".to_string(),
            ));
        }
        if self.review_agent.timeout_minutes == 0 {
            return Err(GateError::Configuration(
                "reviewAgent.timeoutMinutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The mandatory CI check names for a tier, verbatim from the contract.
    ///
    /// A missing tier is unreachable after `validate()`; it is still
    /// surfaced as a configuration error rather than a panic.
    pub fn required_checks(&self, tier: RiskTier) -> Result<&[String], GateError> {
        self.merge_policy
            .get(&tier)
            .map(|entry| entry.required_checks.as_slice())
            .ok_or_else(|| {
                GateError::Configuration(format!(
                    "mergePolicy is missing an entry for tier '{}'",
                    tier
                ))
            })
    }
}
