//! Risk tiers and changed-file classification.

use std::collections::BTreeMap;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// Risk tier assigned to a pull request from the files it touches.
///
/// Strictly ordered: `Low < Medium < High < Critical`. A PR's tier is the
/// maximum tier triggered by any of its changed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// No risky paths touched; merge gated by baseline checks only.
    Low,
    /// Moderate risk; review agent required.
    Medium,
    /// High risk; review agent required.
    High,
    /// Critical paths touched; outranks every other tier.
    Critical,
}

impl RiskTier {
    /// All tiers in ascending order.
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::Critical,
    ];

    /// All tiers from highest to lowest priority (classification order).
    pub const DESCENDING: [RiskTier; 4] = [
        RiskTier::Critical,
        RiskTier::High,
        RiskTier::Medium,
        RiskTier::Low,
    ];

    /// Whether this tier requires the external review agent to pass.
    ///
    /// Everything except `Low` does.
    pub fn requires_review(self) -> bool {
        self != RiskTier::Low
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Compile a list of glob patterns into one matcher set.
///
/// Patterns use shell-glob semantics matched against the full posix-style
/// relative path: `*` crosses directory separators, dotfiles are matchable,
/// `**` is available. An invalid pattern is a contract defect.
pub(crate) fn compile_globs(patterns: &[String]) -> Result<GlobSet, GateError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| {
            GateError::Configuration(format!("invalid glob pattern '{}': {}", pattern, err))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| GateError::Configuration(format!("glob set build failed: {}", err)))
}

/// Pre-compiled per-tier glob sets for changed-file classification.
#[derive(Debug)]
pub struct TierMatcher {
    sets: BTreeMap<RiskTier, GlobSet>,
}

impl TierMatcher {
    /// Compile the contract's tier rules. Tiers absent from the mapping
    /// simply never match.
    pub fn compile(rules: &BTreeMap<RiskTier, Vec<String>>) -> Result<Self, GateError> {
        let mut sets = BTreeMap::new();
        for (tier, patterns) in rules {
            sets.insert(*tier, compile_globs(patterns)?);
        }
        Ok(TierMatcher { sets })
    }

    fn matches(&self, tier: RiskTier, path: &str) -> bool {
        self.sets.get(&tier).is_some_and(|set| set.is_match(path))
    }

    /// Classify a changed-file set into its maximum triggered tier.
    ///
    /// Per-file-then-maximum: a file matching patterns in two tiers counts
    /// for the higher one. Returns as soon as `Critical` is confirmed since
    /// no tier can outrank it. Falls back to `Low` when nothing matches.
    pub fn classify(&self, changed_files: &[String]) -> RiskTier {
        let mut best = RiskTier::Low;
        for file in changed_files {
            for tier in RiskTier::DESCENDING {
                if tier <= best {
                    break;
                }
                if self.matches(tier, file) {
                    if tier == RiskTier::Critical {
                        return RiskTier::Critical;
                    }
                    best = tier;
                    break;
                }
            }
        }
        best
    }
}
