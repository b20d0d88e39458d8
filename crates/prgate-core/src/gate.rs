//! Gate orchestration: the single-pass sequence from changed files to verdict.

use tracing::info;

use prgate_scm::ScmClient;

use crate::contract::PolicyContract;
use crate::drift::DriftMatcher;
use crate::error::GateError;
use crate::outputs::OutputSink;
use crate::review::ReviewCoordinator;
use crate::tier::{RiskTier, TierMatcher};

/// Read-only identity of the pull request under evaluation.
#[derive(Debug, Clone)]
pub struct PullRequestContext {
    /// Repository owner (organization or user).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub number: u64,
    /// Head revision (full commit hash).
    pub head_sha: String,
}

/// Outcome of a gate pass that ran to completion.
#[derive(Debug, Clone)]
pub struct GateRun {
    /// Maximum tier triggered by the changed files.
    pub tier: RiskTier,
    /// Mandatory CI check names for that tier.
    pub required_checks: Vec<String>,
    /// Whether the review coordinator was required (and therefore ran).
    pub needs_review_agent: bool,
    /// Whether the gate passed. Always true on the `Ok` path; failures
    /// surface as `GateError`.
    pub passed: bool,
}

/// Run the full gate sequence for one pull request revision.
///
/// Stages, in strict order: fetch changed files (fatal on error), classify
/// tier, resolve required checks, enforce docs drift, and, for tiers that
/// require review, drive the review coordinator to completion. The first
/// failing stage aborts the run; later stages never execute.
///
/// Informational outputs (`risk_tier`, `required_checks`,
/// `needs_review_agent`) are emitted as soon as each is known, so a failing
/// run still exposes everything determined before the failure.
pub async fn run_gate(
    contract: &PolicyContract,
    ctx: &PullRequestContext,
    scm: &dyn ScmClient,
    outputs: &OutputSink,
) -> Result<GateRun, GateError> {
    info!(
        repo = %format!("{}/{}", ctx.owner, ctx.repo),
        pr = ctx.number,
        head_sha = %ctx.head_sha,
        "starting policy gate"
    );

    let changed_files = scm.list_changed_files(ctx.number).await?;
    info!(count = changed_files.len(), "fetched changed files");

    let tier = TierMatcher::compile(&contract.risk_tier_rules)?.classify(&changed_files);
    info!(tier = %tier, "classified risk tier");
    outputs.set("risk_tier", tier)?;

    let required_checks = contract.required_checks(tier)?.to_vec();
    outputs.set("required_checks", required_checks.join(","))?;

    let needs_review_agent = tier.requires_review();
    outputs.set("needs_review_agent", needs_review_agent)?;

    let verdict = DriftMatcher::compile(&contract.docs_drift_rules)?.enforce(&changed_files);
    if !verdict.passed {
        return Err(GateError::DocsDrift {
            violations: verdict.violations,
        });
    }
    info!("docs-drift check passed");

    if needs_review_agent {
        ReviewCoordinator::new(scm, &contract.review_agent)
            .run(ctx.number, &ctx.head_sha)
            .await?;
    } else {
        info!(tier = %tier, "tier does not require the review agent, skipping");
    }

    info!("policy gate passed");
    Ok(GateRun {
        tier,
        required_checks,
        needs_review_agent,
        passed: true,
    })
}
