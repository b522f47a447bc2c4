//! Core types for the badge progress engine.
//!
//! Defines badge definitions, their module/requirement tree, per-member
//! progress rows, awards and stock. Every free-text column in storage maps to
//! one of the closed enums below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::members::Section;

/// Which section a badge is offered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeSection {
    Only(Section),
    All,
}

impl BadgeSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeSection::Only(section) => section.as_str(),
            BadgeSection::All => "all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(BadgeSection::All),
            other => Section::from_str(other).map(BadgeSection::Only),
        }
    }

    /// Whether members of `section` can earn this badge.
    pub fn includes(&self, section: Section) -> bool {
        match self {
            BadgeSection::Only(s) => *s == section,
            BadgeSection::All => true,
        }
    }
}

/// Badge category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Activity,
    Challenge,
    Staged,
    Core,
}

impl BadgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeCategory::Activity => "activity",
            BadgeCategory::Challenge => "challenge",
            BadgeCategory::Staged => "staged",
            BadgeCategory::Core => "core",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "activity" => Some(BadgeCategory::Activity),
            "challenge" => Some(BadgeCategory::Challenge),
            "staged" => Some(BadgeCategory::Staged),
            "core" => Some(BadgeCategory::Core),
            _ => None,
        }
    }
}

/// How a badge's modules roll up into badge completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCompletionRule {
    /// Every module must be complete
    #[default]
    AllModules,
    /// Any one module completes the badge (alternative paths)
    OneModule,
    /// Bespoke rule; evaluated like `AllModules`
    Custom,
    /// Completed by a leader rather than by requirement tracking
    Manual,
}

impl BadgeCompletionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeCompletionRule::AllModules => "all_modules",
            BadgeCompletionRule::OneModule => "one_module",
            BadgeCompletionRule::Custom => "custom",
            BadgeCompletionRule::Manual => "manual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all_modules" => Some(BadgeCompletionRule::AllModules),
            "one_module" => Some(BadgeCompletionRule::OneModule),
            "custom" => Some(BadgeCompletionRule::Custom),
            "manual" => Some(BadgeCompletionRule::Manual),
            _ => None,
        }
    }
}

/// How a module's requirements roll up into module completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleCompletionRule {
    #[default]
    AllRequired,
    XOfNRequired,
}

impl ModuleCompletionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleCompletionRule::AllRequired => "all_required",
            ModuleCompletionRule::XOfNRequired => "x_of_n_required",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all_required" => Some(ModuleCompletionRule::AllRequired),
            "x_of_n_required" => Some(ModuleCompletionRule::XOfNRequired),
            _ => None,
        }
    }
}

/// Badge definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: Uuid,
    pub name: String,
    pub section: BadgeSection,
    pub category: BadgeCategory,
    pub completion_rule: BadgeCompletionRule,
    /// Shared by every stage of a staged family (e.g. "nights_away")
    pub badge_family_id: Option<String>,
    /// Stage within the family, strictly increasing
    pub stage_number: Option<u32>,
    pub is_chief_scout_award: bool,
    pub image_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl BadgeDefinition {
    /// Create a new badge with the default `AllModules` rule.
    pub fn new(name: &str, section: BadgeSection, category: BadgeCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            section,
            category,
            completion_rule: BadgeCompletionRule::default(),
            badge_family_id: None,
            stage_number: None,
            is_chief_scout_award: false,
            image_url: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_rule(mut self, rule: BadgeCompletionRule) -> Self {
        self.completion_rule = rule;
        self
    }

    /// Mark as a stage of a staged family.
    pub fn staged(mut self, family_id: &str, stage_number: u32) -> Self {
        self.category = BadgeCategory::Staged;
        self.badge_family_id = Some(family_id.to_string());
        self.stage_number = Some(stage_number);
        self
    }

    pub fn chief_scout_award(mut self) -> Self {
        self.is_chief_scout_award = true;
        self
    }
}

/// Named group of requirements with its own completion policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeModule {
    pub id: Uuid,
    pub badge_id: Uuid,
    pub name: String,
    pub completion_rule: ModuleCompletionRule,
    /// Only meaningful under `XOfNRequired`
    pub required_count: Option<u32>,
    pub order: u32,
}

impl BadgeModule {
    pub fn new(badge_id: Uuid, name: &str, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            badge_id,
            name: name.trim().to_string(),
            completion_rule: ModuleCompletionRule::AllRequired,
            required_count: None,
            order,
        }
    }

    /// Switch to x-of-n semantics needing `count` requirements.
    pub fn x_of_n(mut self, count: u32) -> Self {
        self.completion_rule = ModuleCompletionRule::XOfNRequired;
        self.required_count = Some(count);
        self
    }
}

/// Atomic criterion a member must fulfil, possibly more than once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeRequirement {
    pub id: Uuid,
    pub module_id: Uuid,
    pub badge_id: Uuid,
    pub text: String,
    /// Times the requirement must be fulfilled (at least 1)
    pub required_completions: u32,
    pub order: u32,
}

impl BadgeRequirement {
    pub fn new(module: &BadgeModule, text: &str, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id: module.id,
            badge_id: module.badge_id,
            text: text.trim().to_string(),
            required_completions: 1,
            order,
        }
    }

    pub fn times(mut self, required_completions: u32) -> Self {
        self.required_completions = required_completions;
        self
    }

    /// Completions needed, treating an unset (zero) value as 1.
    pub fn completions_needed(&self) -> u32 {
        self.required_completions.max(1)
    }
}

/// A module together with its requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleStructure {
    pub module: BadgeModule,
    pub requirements: Vec<BadgeRequirement>,
}

/// A badge together with its full module/requirement tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeStructure {
    pub badge: BadgeDefinition,
    pub modules: Vec<ModuleStructure>,
}

impl BadgeStructure {
    /// At least one module, and every module has at least one requirement.
    pub fn is_complete(&self) -> bool {
        !self.modules.is_empty() && self.modules.iter().all(|m| !m.requirements.is_empty())
    }

    pub fn requirement_count(&self) -> usize {
        self.modules.iter().map(|m| m.requirements.len()).sum()
    }
}

/// One member's progress on one requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRequirementProgress {
    pub id: Uuid,
    pub member_id: Uuid,
    pub requirement_id: Uuid,
    pub badge_id: Uuid,
    /// Always positive while the row exists
    pub completion_count: u32,
    pub completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Cached badge-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(ProgressStatus::InProgress),
            "completed" => Some(ProgressStatus::Completed),
            _ => None,
        }
    }
}

/// Cached rollup of one member's status on one badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBadgeProgress {
    pub id: Uuid,
    pub member_id: Uuid,
    pub badge_id: Uuid,
    pub status: ProgressStatus,
    pub completion_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a completed badge has been physically handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardStatus {
    Pending,
    Awarded,
}

impl AwardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwardStatus::Pending => "pending",
            AwardStatus::Awarded => "awarded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AwardStatus::Pending),
            "awarded" => Some(AwardStatus::Awarded),
            _ => None,
        }
    }
}

/// Award record for a completed badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBadgeAward {
    pub id: Uuid,
    pub member_id: Uuid,
    pub badge_id: Uuid,
    pub award_status: AwardStatus,
    pub created_at: DateTime<Utc>,
    pub awarded_date: Option<DateTime<Utc>>,
    pub awarded_by: Option<String>,
}

impl MemberBadgeAward {
    pub fn pending(member_id: Uuid, badge_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id,
            badge_id,
            award_status: AwardStatus::Pending,
            created_at: Utc::now(),
            awarded_date: None,
            awarded_by: None,
        }
    }
}

/// Physical badges on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeStock {
    pub badge_id: Uuid,
    /// Can go negative after an admin override
    pub current_stock: i64,
    pub minimum_threshold: i64,
    pub updated_at: DateTime<Utc>,
}

/// Audit log entry for a stock change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub id: Uuid,
    pub badge_id: Uuid,
    pub delta: i64,
    pub reason: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}
