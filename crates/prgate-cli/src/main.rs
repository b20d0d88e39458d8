//! prgate — deterministic PR policy gate for CI
//!
//! The `prgate` command classifies a pull request into a risk tier from its
//! changed files, resolves the mandatory CI checks for that tier, enforces
//! docs-drift coupling rules, and for risky tiers blocks until the external
//! review agent's check run concludes `success`.
//!
//! ## Commands
//!
//! - `run`: execute the full gate for a pull request (CI entry point)
//! - `validate`: load and validate a policy contract file
//! - `classify`: offline dry-run of classification and drift rules

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, Level};

use prgate_core::{
    init_tracing, run_gate, DriftMatcher, GateError, OutputSink, PolicyContract,
    PullRequestContext, TierMatcher,
};
use prgate_scm::GitHubClient;

#[derive(Parser)]
#[command(name = "prgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic PR policy gate for CI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full policy gate for a pull request
    Run {
        /// Repository identity as owner/name
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: Option<String>,

        /// Pull request number
        #[arg(long, env = "PR_NUMBER")]
        pr: Option<String>,

        /// Head revision (full commit hash)
        #[arg(long, env = "HEAD_SHA")]
        head_sha: Option<String>,

        /// Source-control API token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Path to the policy contract file
        #[arg(long, default_value = ".pr-policy.json")]
        contract: PathBuf,
    },

    /// Load and validate a policy contract file
    Validate {
        /// Path to the policy contract file
        #[arg(long, default_value = ".pr-policy.json")]
        contract: PathBuf,
    },

    /// Classify changed files offline (no network, no review agent)
    Classify {
        /// Path to the policy contract file
        #[arg(long, default_value = ".pr-policy.json")]
        contract: PathBuf,

        /// Changed file path (repeatable)
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<String>,
    },
}

/// Validated run context assembled from flags and environment.
#[derive(Debug)]
struct RunContext {
    owner: String,
    repo: String,
    pr_number: u64,
    head_sha: String,
    token: String,
}

impl RunContext {
    /// Validate all required inputs at once.
    ///
    /// Every missing or malformed value is collected so the operator sees
    /// the complete list in a single error, before any API call is made.
    fn resolve(
        repo: Option<&str>,
        pr: Option<&str>,
        head_sha: Option<&str>,
        token: Option<&str>,
    ) -> Result<Self, GateError> {
        let mut problems = Vec::new();

        let (owner, name) = match repo {
            Some(value) => match value.split_once('/') {
                Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                    (owner.to_string(), name.to_string())
                }
                _ => {
                    problems
                        .push("GITHUB_REPOSITORY (--repo) must have the form owner/name".to_string());
                    (String::new(), String::new())
                }
            },
            None => {
                problems.push("GITHUB_REPOSITORY (--repo) is not set".to_string());
                (String::new(), String::new())
            }
        };

        let pr_number = match pr {
            Some(value) => match value.parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    problems.push("PR_NUMBER (--pr) must be a positive integer".to_string());
                    0
                }
            },
            None => {
                problems.push("PR_NUMBER (--pr) is not set".to_string());
                0
            }
        };

        let head_sha = match head_sha {
            Some(value) if value.len() == 40 && value.chars().all(|c| c.is_ascii_hexdigit()) => {
                value.to_string()
            }
            Some(_) => {
                problems
                    .push("HEAD_SHA (--head-sha) must be a full 40-character commit hash".to_string());
                String::new()
            }
            None => {
                problems.push("HEAD_SHA (--head-sha) is not set".to_string());
                String::new()
            }
        };

        let token = match token {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => {
                problems.push("GITHUB_TOKEN (--token) is not set".to_string());
                String::new()
            }
        };

        if !problems.is_empty() {
            return Err(GateError::Configuration(format!(
                "missing or invalid run context: {}",
                problems.join("; ")
            )));
        }

        Ok(RunContext {
            owner,
            repo: name,
            pr_number,
            head_sha,
            token,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            repo,
            pr,
            head_sha,
            token,
            contract,
        } => {
            cmd_run(
                repo.as_deref(),
                pr.as_deref(),
                head_sha.as_deref(),
                token.as_deref(),
                &contract,
            )
            .await
        }
        Commands::Validate { contract } => cmd_validate(&contract),
        Commands::Classify { contract, files } => cmd_classify(&contract, &files),
    }
}

async fn cmd_run(
    repo: Option<&str>,
    pr: Option<&str>,
    head_sha: Option<&str>,
    token: Option<&str>,
    contract_path: &PathBuf,
) -> Result<()> {
    let outputs = OutputSink::from_env();

    let ctx = match RunContext::resolve(repo, pr, head_sha, token) {
        Ok(ctx) => ctx,
        Err(err) => return fail_gate(&outputs, err),
    };

    let contract = match PolicyContract::load(contract_path) {
        Ok(contract) => contract,
        Err(err) => return fail_gate(&outputs, err),
    };

    let scm = GitHubClient::new(&ctx.token, &ctx.owner, &ctx.repo);
    let pr_ctx = PullRequestContext {
        owner: ctx.owner.clone(),
        repo: ctx.repo.clone(),
        number: ctx.pr_number,
        head_sha: ctx.head_sha.clone(),
    };

    match run_gate(&contract, &pr_ctx, &scm, &outputs).await {
        Ok(run) => {
            outputs.set("gate_passed", true)?;
            println!("Gate: ✓ PASSED");
            println!("Risk tier: {}", run.tier);
            println!("Required checks: {}", run.required_checks.join(", "));
            println!(
                "Review agent: {}",
                if run.needs_review_agent {
                    "completed with success"
                } else {
                    "not required"
                }
            );
            Ok(())
        }
        Err(err) => fail_gate(&outputs, err),
    }
}

/// Convert any gate failure into the externally observable failure state:
/// `gate_passed=false`, an operator-facing explanation, and a non-zero exit.
fn fail_gate(outputs: &OutputSink, err: GateError) -> Result<()> {
    outputs.set("gate_passed", false).ok();
    error!("{}", err.summary());
    println!("Gate: ✗ FAILED");
    anyhow::bail!("policy gate failed: {}", err)
}

fn cmd_validate(contract_path: &PathBuf) -> Result<()> {
    match PolicyContract::load(contract_path) {
        Ok(contract) => {
            println!("Contract: ✓ VALID ({})", contract_path.display());
            println!("Version: {}", contract.version);
            for (tier, patterns) in &contract.risk_tier_rules {
                println!("  {} tier: {} pattern(s)", tier, patterns.len());
            }
            println!("Docs-drift rules: {}", contract.docs_drift_rules.len());
            println!(
                "Review agent: '{}' via {} (timeout {}m)",
                contract.review_agent.check_name,
                contract.review_agent.provider,
                contract.review_agent.timeout_minutes
            );
            Ok(())
        }
        Err(err) => {
            error!("{}", err.summary());
            println!("Contract: ✗ INVALID ({})", contract_path.display());
            anyhow::bail!("contract validation failed: {}", err)
        }
    }
}

fn cmd_classify(contract_path: &PathBuf, files: &[String]) -> Result<()> {
    let contract = PolicyContract::load(contract_path)?;

    let tier = TierMatcher::compile(&contract.risk_tier_rules)?.classify(files);
    let required_checks = contract.required_checks(tier)?;
    println!("Risk tier: {}", tier);
    println!("Required checks: {}", required_checks.join(", "));
    println!(
        "Review agent required: {}",
        if tier.requires_review() { "yes" } else { "no" }
    );

    let verdict = DriftMatcher::compile(&contract.docs_drift_rules)?.enforce(files);
    if verdict.passed {
        println!("Docs drift: ✓ no violations");
        Ok(())
    } else {
        let err = GateError::DocsDrift {
            violations: verdict.violations,
        };
        error!("{}", err.summary());
        println!("Docs drift: ✗ {}", err);
        anyhow::bail!("classification found docs-drift violations")
    }
}
