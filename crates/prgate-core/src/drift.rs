//! Docs-drift enforcement.
//!
//! Each rule pairs trigger globs with "must also update" globs. A rule that
//! triggers without any companion match is a blocking violation. Rules are
//! evaluated independently; all violations are collected before the verdict
//! is returned.

use globset::GlobSet;

use crate::contract::DocsDriftRule;
use crate::error::GateError;
use crate::tier::compile_globs;

/// One drift rule that triggered without its companion update.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftViolation {
    /// The rule's configured message.
    pub message: String,
    /// Patterns any one of which would have satisfied the rule.
    pub expected_patterns: Vec<String>,
    /// Full changed-file list, for diagnosis.
    pub changed_files: Vec<String>,
}

/// Outcome of evaluating every drift rule against a changed-file set.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftVerdict {
    /// Whether no rule was violated.
    pub passed: bool,
    /// Violations found (empty when passed).
    pub violations: Vec<DriftViolation>,
}

struct CompiledDriftRule {
    triggers: GlobSet,
    companions: GlobSet,
    companion_patterns: Vec<String>,
    message: String,
}

/// Pre-compiled drift rules.
pub struct DriftMatcher {
    rules: Vec<CompiledDriftRule>,
}

impl DriftMatcher {
    /// Compile the contract's drift rules.
    pub fn compile(rules: &[DocsDriftRule]) -> Result<Self, GateError> {
        let compiled = rules
            .iter()
            .map(|rule| {
                Ok(CompiledDriftRule {
                    triggers: compile_globs(&rule.triggers)?,
                    companions: compile_globs(&rule.require_updated)?,
                    companion_patterns: rule.require_updated.clone(),
                    message: rule.message.clone(),
                })
            })
            .collect::<Result<Vec<_>, GateError>>()?;
        Ok(DriftMatcher { rules: compiled })
    }

    /// Evaluate every rule against the changed-file set.
    ///
    /// A rule is triggered when any changed file matches any trigger glob,
    /// and satisfied when any changed file matches any companion glob. A
    /// rule that never triggers is vacuously satisfied.
    pub fn enforce(&self, changed_files: &[String]) -> DriftVerdict {
        let mut violations = Vec::new();
        for rule in &self.rules {
            let triggered = changed_files.iter().any(|f| rule.triggers.is_match(f));
            if !triggered {
                continue;
            }
            let satisfied = changed_files.iter().any(|f| rule.companions.is_match(f));
            if !satisfied {
                violations.push(DriftViolation {
                    message: rule.message.clone(),
                    expected_patterns: rule.companion_patterns.clone(),
                    changed_files: changed_files.to_vec(),
                });
            }
        }
        DriftVerdict {
            passed: violations.is_empty(),
            violations,
        }
    }
}
