//! Badge completion evaluation.
//!
//! Pure functions over data already loaded into memory. Requirements roll up
//! into modules, modules roll up into the badge. Nothing here touches storage;
//! `ProgressManager` feeds these functions and persists the outcome.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::types::{
    BadgeCompletionRule, BadgeRequirement, BadgeStructure, MemberBadgeProgress,
    MemberRequirementProgress, ModuleCompletionRule, ModuleStructure, ProgressStatus,
};

/// Requirement progress rows keyed by requirement id.
pub type ProgressIndex = HashMap<Uuid, MemberRequirementProgress>;

/// Build a [`ProgressIndex`] from a list of rows.
pub fn index_progress(rows: Vec<MemberRequirementProgress>) -> ProgressIndex {
    rows.into_iter().map(|p| (p.requirement_id, p)).collect()
}

/// Whether a requirement is satisfied by the member's progress row.
///
/// A missing row counts as zero completions.
pub fn requirement_satisfied(
    requirement: &BadgeRequirement,
    progress: Option<&MemberRequirementProgress>,
) -> bool {
    let count = progress.map(|p| p.completion_count).unwrap_or(0);
    count >= requirement.completions_needed()
}

/// Fractional completion of a single requirement, capped at 1.0.
pub fn requirement_fraction(
    requirement: &BadgeRequirement,
    progress: Option<&MemberRequirementProgress>,
) -> f64 {
    let count = progress.map(|p| p.completion_count).unwrap_or(0) as f64;
    (count / requirement.completions_needed() as f64).min(1.0)
}

/// Number of satisfied requirements a module needs.
///
/// Under x-of-n an unset or zero `required_count` degrades to all-required.
pub fn requirements_needed(
    rule: ModuleCompletionRule,
    required_count: Option<u32>,
    total: usize,
) -> usize {
    match rule {
        ModuleCompletionRule::AllRequired => total,
        ModuleCompletionRule::XOfNRequired => match required_count {
            Some(n) if n > 0 => n as usize,
            _ => total,
        },
    }
}

/// Module satisfaction from per-requirement results.
///
/// An empty module is never satisfied.
pub fn module_satisfied(
    rule: ModuleCompletionRule,
    required_count: Option<u32>,
    requirement_results: &[bool],
) -> bool {
    if requirement_results.is_empty() {
        return false;
    }

    let satisfied = requirement_results.iter().filter(|r| **r).count();
    match rule {
        ModuleCompletionRule::AllRequired => satisfied == requirement_results.len(),
        ModuleCompletionRule::XOfNRequired => {
            satisfied >= requirements_needed(rule, required_count, requirement_results.len())
        }
    }
}

/// Badge satisfaction from per-module results.
pub fn badge_satisfied(rule: BadgeCompletionRule, module_results: &[bool]) -> bool {
    match rule {
        BadgeCompletionRule::OneModule => module_results.iter().any(|m| *m),
        BadgeCompletionRule::AllModules
        | BadgeCompletionRule::Custom
        | BadgeCompletionRule::Manual => {
            !module_results.is_empty() && module_results.iter().all(|m| *m)
        }
    }
}

/// Outcome of evaluating one module for one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleEvaluation {
    pub module_id: Uuid,
    pub satisfied: bool,
    pub satisfied_count: usize,
    pub needed: usize,
    /// Partial-completion fraction for display, not used for gating
    pub progress: f64,
}

/// Evaluate a module against the member's requirement progress.
pub fn evaluate_module(module: &ModuleStructure, progress: &ProgressIndex) -> ModuleEvaluation {
    let results: Vec<bool> = module
        .requirements
        .iter()
        .map(|r| requirement_satisfied(r, progress.get(&r.id)))
        .collect();

    let rule = module.module.completion_rule;
    let required_count = module.module.required_count;
    let satisfied_count = results.iter().filter(|r| **r).count();
    let needed = requirements_needed(rule, required_count, results.len());

    let fraction = if results.is_empty() || needed == 0 {
        0.0
    } else {
        match rule {
            ModuleCompletionRule::XOfNRequired => {
                satisfied_count.min(needed) as f64 / needed as f64
            }
            ModuleCompletionRule::AllRequired => {
                let credit: f64 = module
                    .requirements
                    .iter()
                    .map(|r| requirement_fraction(r, progress.get(&r.id)))
                    .sum();
                credit / module.requirements.len() as f64
            }
        }
    };

    ModuleEvaluation {
        module_id: module.module.id,
        satisfied: module_satisfied(rule, required_count, &results),
        satisfied_count,
        needed,
        progress: fraction,
    }
}

/// Outcome of evaluating one badge for one member.
///
/// `computed_complete` is the fresh answer from requirement data and is the
/// only input to award gating. A cached `Completed` row is still honoured as
/// an affirmative signal by [`BadgeEvaluation::is_complete`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeEvaluation {
    pub badge_id: Uuid,
    pub computed_complete: bool,
    /// Badge has modules and every module has requirements
    pub structure_complete: bool,
    pub cached_status: Option<ProgressStatus>,
    /// Requirements with at least one recorded completion
    pub requirements_started: usize,
    pub progress: f64,
    pub modules: Vec<ModuleEvaluation>,
}

impl BadgeEvaluation {
    /// Fresh result OR legacy cached completion.
    pub fn is_complete(&self) -> bool {
        self.computed_complete || self.cached_status == Some(ProgressStatus::Completed)
    }

    /// Status to display; `None` means the member has not started the badge.
    pub fn effective_status(&self) -> Option<ProgressStatus> {
        if self.is_complete() {
            Some(ProgressStatus::Completed)
        } else if self.requirements_started > 0 || self.cached_status.is_some() {
            Some(ProgressStatus::InProgress)
        } else {
            None
        }
    }

    /// Cache says completed but the fresh computation disagrees.
    pub fn is_legacy_completion(&self) -> bool {
        !self.computed_complete && self.cached_status == Some(ProgressStatus::Completed)
    }
}

/// Evaluate a badge for one member.
pub fn evaluate_badge(
    structure: &BadgeStructure,
    progress: &ProgressIndex,
    cached: Option<&MemberBadgeProgress>,
) -> BadgeEvaluation {
    let modules: Vec<ModuleEvaluation> = structure
        .modules
        .iter()
        .map(|m| evaluate_module(m, progress))
        .collect();

    let results: Vec<bool> = modules.iter().map(|m| m.satisfied).collect();
    let rule = structure.badge.completion_rule;

    let fraction = if modules.is_empty() {
        0.0
    } else if rule == BadgeCompletionRule::OneModule {
        modules.iter().map(|m| m.progress).fold(0.0, f64::max)
    } else {
        modules.iter().map(|m| m.progress).sum::<f64>() / modules.len() as f64
    };

    let requirements_started = structure
        .modules
        .iter()
        .flat_map(|m| m.requirements.iter())
        .filter(|r| progress.get(&r.id).is_some_and(|p| p.completion_count > 0))
        .count();

    BadgeEvaluation {
        badge_id: structure.badge.id,
        computed_complete: badge_satisfied(rule, &results),
        structure_complete: structure.is_complete(),
        cached_status: cached.map(|c| c.status),
        requirements_started,
        progress: fraction,
        modules,
    }
}
