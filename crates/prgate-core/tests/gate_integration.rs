//! Integration tests for the full gate sequence with MemoryScm.

use chrono::{TimeZone, Utc};
use prgate_core::{run_gate, GateError, OutputSink, PolicyContract, PullRequestContext, RiskTier};
use prgate_scm::fakes::MemoryScm;
use prgate_scm::{CheckConclusion, CheckRun, CheckStatus};

const CONTRACT: &str = r#"{
    "version": "1",
    "riskTierRules": {
        "critical": ["infra/terraform/**"],
        "high": ["src/auth/**"],
        "medium": ["src/**"],
        "low": ["docs/**"]
    },
    "mergePolicy": {
        "critical": {
            "requiredChecks": ["build", "test", "security-scan"],
            "minReviewers": 2,
            "requiredEvidence": ["rollback-plan"],
            "autoMerge": false
        },
        "high": {
            "requiredChecks": ["build", "test"],
            "minReviewers": 1,
            "requiredEvidence": [],
            "autoMerge": false
        },
        "medium": {
            "requiredChecks": ["build", "test"],
            "minReviewers": 1,
            "requiredEvidence": [],
            "autoMerge": true
        },
        "low": {
            "requiredChecks": ["build"],
            "minReviewers": 0,
            "requiredEvidence": [],
            "autoMerge": true
        }
    },
    "docsDriftRules": [
        {
            "triggers": ["src/api/**"],
            "requireUpdated": ["docs/**"],
            "message": "API changes must update the API docs"
        }
    ],
    "reviewAgent": {
        "provider": "github-app",
        "checkName": "ai-review",
        "timeoutMinutes": 1,
        "commentMarker": "<!-- prgate-rerun -->",
        "rerunCommand": "@reviewer rerun"
    },
    "shaPolicy": {
        "requireCurrentHead": true,
        "staleAfterPushEvents": ["synchronize"],
        "maxRerunsPerSha": 3
    }
}"#;

fn contract() -> PolicyContract {
    let contract: PolicyContract = serde_json::from_str(CONTRACT).expect("contract fixture");
    contract.validate().expect("contract fixture valid");
    contract
}

fn ctx() -> PullRequestContext {
    PullRequestContext {
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
        number: 42,
        head_sha: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
    }
}

fn review_run(status: CheckStatus, conclusion: Option<CheckConclusion>) -> CheckRun {
    CheckRun {
        id: 1,
        name: "ai-review".to_string(),
        status,
        conclusion,
        started_at: Some(Utc.timestamp_opt(1_000, 0).unwrap()),
        details_url: Some("https://example.com/runs/1".to_string()),
    }
}

/// Scenario: API change with its docs update, review agent succeeds.
#[tokio::test(start_paused = true)]
async fn test_drift_satisfied_gate_passes() {
    let scm = MemoryScm::new().with_changed_files(&["src/api/payments.ts", "docs/payments.md"]);
    scm.push_check_runs(vec![review_run(
        CheckStatus::Completed,
        Some(CheckConclusion::Success),
    )]);

    let run = run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
        .await
        .expect("gate should pass");
    assert_eq!(run.tier, RiskTier::Medium);
    assert!(run.needs_review_agent);
    assert!(run.passed);
}

/// Scenario: API change without a docs update is a blocking violation.
#[tokio::test]
async fn test_drift_violation_blocks_before_review() {
    let scm = MemoryScm::new().with_changed_files(&["src/api/payments.ts"]);

    let err = run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
        .await
        .unwrap_err();
    match err {
        GateError::DocsDrift { violations } => {
            assert_eq!(violations.len(), 1);
            assert!(violations[0].expected_patterns.contains(&"docs/**".to_string()));
            assert_eq!(violations[0].changed_files, ["src/api/payments.ts"]);
        }
        other => panic!("expected DocsDrift, got {:?}", other),
    }
    // Review coordinator never ran: no rerun comment was posted.
    assert!(scm.comments().is_empty());
}

/// Scenario: terraform change classifies critical and invokes the coordinator.
#[tokio::test(start_paused = true)]
async fn test_critical_tier_runs_review_agent() {
    let scm = MemoryScm::new().with_changed_files(&["infra/terraform/prod.tf"]);
    scm.push_check_runs(vec![review_run(
        CheckStatus::Completed,
        Some(CheckConclusion::Success),
    )]);

    let run = run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
        .await
        .expect("gate should pass");
    assert_eq!(run.tier, RiskTier::Critical);
    assert_eq!(run.required_checks, ["build", "test", "security-scan"]);
    assert!(run.needs_review_agent);

    let comments = scm.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].body.contains("sha:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
}

/// Scenario: README-only change is low tier; review skipped entirely.
#[tokio::test]
async fn test_low_tier_skips_review_agent() {
    let scm = MemoryScm::new().with_changed_files(&["README.md"]);

    let run = run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
        .await
        .expect("gate should pass");
    assert_eq!(run.tier, RiskTier::Low);
    assert!(!run.needs_review_agent);
    assert!(scm.comments().is_empty());
}

/// Scenario: check run completes with success on the third poll.
#[tokio::test(start_paused = true)]
async fn test_review_completes_after_polling() {
    let scm = MemoryScm::new().with_changed_files(&["src/lib.rs"]);
    scm.push_check_runs(vec![review_run(CheckStatus::InProgress, None)]);
    scm.push_check_runs(vec![review_run(CheckStatus::InProgress, None)]);
    scm.push_check_runs(vec![review_run(
        CheckStatus::Completed,
        Some(CheckConclusion::Success),
    )]);

    let run = run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
        .await
        .expect("gate should pass");
    assert!(run.passed);
}

/// Scenario: check run never completes inside the one-minute window.
#[tokio::test(start_paused = true)]
async fn test_review_timeout_fails_gate() {
    let scm = MemoryScm::new().with_changed_files(&["src/lib.rs"]);
    scm.push_check_runs(vec![review_run(CheckStatus::InProgress, None)]);

    let err = run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::ReviewTimeout { minutes: 1, .. }));
}

/// Non-success conclusions are all rejected the same way as failure.
#[tokio::test(start_paused = true)]
async fn test_non_success_conclusions_rejected() {
    for conclusion in [
        CheckConclusion::Failure,
        CheckConclusion::Neutral,
        CheckConclusion::ActionRequired,
        CheckConclusion::Cancelled,
    ] {
        let scm = MemoryScm::new().with_changed_files(&["src/lib.rs"]);
        scm.push_check_runs(vec![review_run(CheckStatus::Completed, Some(conclusion))]);

        let err = run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
            .await
            .unwrap_err();
        match err {
            GateError::ReviewRejected { conclusion: got, .. } => assert_eq!(got, conclusion),
            other => panic!("expected ReviewRejected for {:?}, got {:?}", conclusion, other),
        }
    }
}

/// A changed-files fetch failure is immediately fatal.
#[tokio::test]
async fn test_changed_files_fetch_failure_is_fatal() {
    let scm = MemoryScm::new().failing_changed_files();

    let err = run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::Fetch(_)));
}

/// Informational outputs are emitted even when a later stage fails.
#[tokio::test]
async fn test_outputs_emitted_before_drift_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outputs.txt");
    let scm = MemoryScm::new().with_changed_files(&["src/api/payments.ts"]);

    let result = run_gate(&contract(), &ctx(), &scm, &OutputSink::to_path(&path)).await;
    assert!(result.is_err());

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("risk_tier=medium"));
    assert!(content.contains("required_checks=build,test"));
    assert!(content.contains("needs_review_agent=true"));
    // gate_passed is the caller's to write; the orchestrator never claims it.
    assert!(!content.contains("gate_passed"));
}

/// An existing rerun comment for the same revision suppresses a second post.
#[tokio::test(start_paused = true)]
async fn test_existing_rerun_comment_not_duplicated() {
    let scm = MemoryScm::new()
        .with_changed_files(&["src/lib.rs"])
        .with_comment(
            "@reviewer rerun\n\n<!-- prgate-rerun --> sha:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        );
    scm.push_check_runs(vec![review_run(
        CheckStatus::Completed,
        Some(CheckConclusion::Success),
    )]);

    run_gate(&contract(), &ctx(), &scm, &OutputSink::logging_only())
        .await
        .expect("gate should pass");
    assert_eq!(scm.comments().len(), 1);
}
