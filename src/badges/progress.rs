//! Member badge progress management.
//!
//! Records requirement completions, recomputes badge status from them, keeps
//! the cached `member_badge_progress` row in step and creates the pending
//! award on the transition into completed. Every mutation runs in one
//! immediate transaction covering read, compute and write.

use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::chief_scout::{self, ChiefScoutStatus};
use super::evaluator::{evaluate_badge, index_progress, BadgeEvaluation};
use super::staged::{self, StageAward};
use super::types::{
    AwardStatus, BadgeCategory, MemberBadgeAward, MemberRequirementProgress, ProgressStatus,
};
use super::BadgeError;
use crate::accounts::LeaderAccount;
use crate::storage::{
    begin_immediate, AppConfig, AwardStore, BadgeStore, DatabaseError, MemberStore, ProgressStore,
    RegressionPolicy,
};

/// Change of cached badge status caused by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTransition {
    /// no progress -> in progress
    Started,
    /// in progress (or no progress) -> completed
    Completed,
    /// completed -> in progress
    Regressed,
}

/// Result of settling one (member, badge) pair.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeUpdate {
    pub member_id: Uuid,
    pub badge_id: Uuid,
    pub evaluation: BadgeEvaluation,
    pub transition: Option<StatusTransition>,
    /// Pending award created by this update
    pub award_created: Option<MemberBadgeAward>,
    /// Pending award removed under `RetractPendingAward`
    pub award_retracted: bool,
}

/// Result of changing a requirement's completion count.
#[derive(Debug, Clone, Serialize)]
pub struct RequirementUpdate {
    /// `None` when the row was deleted (count reached zero)
    pub progress: Option<MemberRequirementProgress>,
    pub badge: BadgeUpdate,
}

/// One badge as seen on a member's record.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeSummary {
    pub badge_id: Uuid,
    pub badge_name: String,
    pub category: BadgeCategory,
    pub progress: f64,
    pub status: ProgressStatus,
    pub award_status: Option<AwardStatus>,
}

/// Manager for member badge progress.
pub struct ProgressManager<'a> {
    conn: &'a Connection,
    config: &'a AppConfig,
}

impl<'a> ProgressManager<'a> {
    /// Create a new progress manager.
    pub fn new(conn: &'a Connection, config: &'a AppConfig) -> Self {
        Self { conn, config }
    }

    /// Record one more completion of a requirement.
    pub fn increment_requirement(
        &self,
        member_id: Uuid,
        requirement_id: Uuid,
    ) -> Result<RequirementUpdate, BadgeError> {
        self.adjust_requirement(member_id, requirement_id, 1)
    }

    /// Remove one completion of a requirement.
    pub fn decrement_requirement(
        &self,
        member_id: Uuid,
        requirement_id: Uuid,
    ) -> Result<RequirementUpdate, BadgeError> {
        self.adjust_requirement(member_id, requirement_id, -1)
    }

    /// Tick or untick a requirement.
    ///
    /// An unsatisfied requirement gains one completion; a satisfied one is
    /// cleared entirely, so on-then-off leaves no progress row behind.
    pub fn toggle_requirement(
        &self,
        member_id: Uuid,
        requirement_id: Uuid,
    ) -> Result<RequirementUpdate, BadgeError> {
        let tx = begin_immediate(self.conn)?;
        let requirement = BadgeStore::new(&tx)
            .get_requirement(requirement_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("requirement {}", requirement_id)))?;
        let current = ProgressStore::new(&tx)
            .get_requirement_progress(member_id, requirement_id)?
            .map(|p| p.completion_count)
            .unwrap_or(0);

        let delta = if current >= requirement.completions_needed() {
            -(current as i64)
        } else {
            1
        };

        let update = self.adjust_in(&tx, member_id, requirement_id, delta)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(update)
    }

    /// Change a requirement's completion count by `delta`, clamped at zero.
    pub fn adjust_requirement(
        &self,
        member_id: Uuid,
        requirement_id: Uuid,
        delta: i64,
    ) -> Result<RequirementUpdate, BadgeError> {
        if delta == 0 {
            return Err(BadgeError::ValidationError(
                "Completion change must be non-zero".to_string(),
            ));
        }

        let tx = begin_immediate(self.conn)?;
        let update = self.adjust_in(&tx, member_id, requirement_id, delta)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(update)
    }

    fn adjust_in(
        &self,
        conn: &Connection,
        member_id: Uuid,
        requirement_id: Uuid,
        delta: i64,
    ) -> Result<RequirementUpdate, BadgeError> {
        if MemberStore::new(conn).get_member(member_id)?.is_none() {
            return Err(BadgeError::NotFound(format!("member {}", member_id)));
        }
        let requirement = BadgeStore::new(conn)
            .get_requirement(requirement_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("requirement {}", requirement_id)))?;

        let store = ProgressStore::new(conn);
        let existing = store.get_requirement_progress(member_id, requirement_id)?;
        let old_count = existing.as_ref().map(|p| p.completion_count).unwrap_or(0);
        let new_count = (old_count as i64).saturating_add(delta).clamp(0, u32::MAX as i64) as u32;
        let now = Utc::now();

        let progress = if new_count == 0 {
            if existing.is_some() {
                store.delete_requirement_progress(member_id, requirement_id)?;
            }
            None
        } else {
            let completed = new_count >= requirement.completions_needed();
            let completed_date = if completed {
                existing
                    .as_ref()
                    .and_then(|p| p.completed_date)
                    .or(Some(now))
            } else {
                None
            };

            let row = MemberRequirementProgress {
                id: existing.as_ref().map(|p| p.id).unwrap_or_else(Uuid::new_v4),
                member_id,
                requirement_id,
                badge_id: requirement.badge_id,
                completion_count: new_count,
                completed,
                completed_date,
                updated_at: now,
            };
            store.upsert_requirement_progress(&row)?;
            Some(row)
        };

        tracing::debug!(
            "Requirement {} for member {}: {} -> {}",
            requirement_id,
            member_id,
            old_count,
            new_count
        );

        let badge = self.settle(conn, member_id, requirement.badge_id, delta < 0)?;
        Ok(RequirementUpdate { progress, badge })
    }

    /// Evaluate a badge for a member without writing anything.
    pub fn evaluate(&self, member_id: Uuid, badge_id: Uuid) -> Result<BadgeEvaluation, BadgeError> {
        evaluate_in(self.conn, member_id, badge_id)
    }

    /// Bring the cached status for one badge in line with requirement data.
    ///
    /// Writes only when the cache disagrees with the fresh result. A cached
    /// completion the fresh result does not support is kept: reconciliation
    /// never regresses a member.
    pub fn reconcile(&self, member_id: Uuid, badge_id: Uuid) -> Result<BadgeUpdate, BadgeError> {
        let tx = begin_immediate(self.conn)?;
        let update = self.settle(&tx, member_id, badge_id, false)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(update)
    }

    /// Reconcile every badge the member has progress or a cached status on.
    pub fn reconcile_member(&self, member_id: Uuid) -> Result<Vec<BadgeUpdate>, BadgeError> {
        let tx = begin_immediate(self.conn)?;
        let mut updates = Vec::new();
        for badge_id in touched_badges(&tx, member_id)? {
            updates.push(self.settle(&tx, member_id, badge_id, false)?);
        }
        tx.commit().map_err(DatabaseError::from)?;
        Ok(updates)
    }

    /// Mark a badge complete by hand.
    ///
    /// Used for `Manual` badges and for badges imported without their module
    /// structure. Creates the pending award if the member has none.
    pub fn mark_badge_complete(
        &self,
        member_id: Uuid,
        badge_id: Uuid,
        actor: &LeaderAccount,
    ) -> Result<Option<MemberBadgeAward>, BadgeError> {
        if !actor.is_leader() {
            return Err(BadgeError::Unauthorized(format!(
                "{} cannot complete badges",
                actor.display_name
            )));
        }

        let tx = begin_immediate(self.conn)?;
        if MemberStore::new(&tx).get_member(member_id)?.is_none() {
            return Err(BadgeError::NotFound(format!("member {}", member_id)));
        }
        let badge = BadgeStore::new(&tx)
            .get_badge(badge_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("badge {}", badge_id)))?;

        let cached = ProgressStore::new(&tx).get_badge_progress(member_id, badge_id)?;
        if cached.is_some_and(|c| c.status == ProgressStatus::Completed) {
            return Err(BadgeError::Duplicate(format!(
                "{} is already completed",
                badge.name
            )));
        }

        let award = record_completion(&tx, member_id, badge_id)?;
        tx.commit().map_err(DatabaseError::from)?;

        tracing::info!(
            "{} marked {} complete for member {}",
            actor.display_name,
            badge.name,
            member_id
        );
        Ok(award)
    }

    /// Award any staged-family stages the member's counters have reached.
    pub fn check_staged_badges(&self, member_id: Uuid) -> Result<Vec<StageAward>, BadgeError> {
        let tx = begin_immediate(self.conn)?;
        let member = MemberStore::new(&tx)
            .get_member(member_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("member {}", member_id)))?;
        let awards = staged::award_reached_stages(&tx, self.config, &member)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(awards)
    }

    /// Assess Chief Scout Award eligibility and complete the award badge
    /// when the member qualifies.
    pub fn check_chief_scout_award(
        &self,
        member_id: Uuid,
    ) -> Result<(ChiefScoutStatus, Option<MemberBadgeAward>), BadgeError> {
        let tx = begin_immediate(self.conn)?;
        let member = MemberStore::new(&tx)
            .get_member(member_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("member {}", member_id)))?;

        let badges: Vec<_> = BadgeStore::new(&tx)
            .list_badges(false)?
            .into_iter()
            .filter(|b| b.section.includes(member.section))
            .collect();
        // Fresh evaluation, so a completion the cache has not caught up with
        // still counts. Untouched badges cannot be complete.
        let touched = touched_badges(&tx, member_id)?;
        let mut completed = HashSet::new();
        for badge in badges.iter().filter(|b| touched.contains(&b.id)) {
            if evaluate_in(&tx, member_id, badge.id)?.is_complete() {
                completed.insert(badge.id);
            }
        }

        let status = chief_scout::assess(
            &badges,
            &completed,
            self.config.chief_scout.activity_badges_required,
        );

        let mut award = None;
        if status.eligible {
            match badges.iter().find(|b| b.is_chief_scout_award) {
                Some(target) if !completed.contains(&target.id) => {
                    award = record_completion(&tx, member_id, target.id)?;
                }
                Some(_) => {}
                None => tracing::warn!(
                    "Member {} is eligible but no Chief Scout Award badge exists for {}",
                    member_id,
                    member.section
                ),
            }
        }

        tx.commit().map_err(DatabaseError::from)?;
        Ok((status, award))
    }

    /// Every badge the member has touched, with progress and award state.
    pub fn member_badge_summaries(&self, member_id: Uuid) -> Result<Vec<BadgeSummary>, BadgeError> {
        let badges = BadgeStore::new(self.conn);
        let awards = AwardStore::new(self.conn);

        let mut summaries = Vec::new();
        for badge_id in touched_badges(self.conn, member_id)? {
            let Some(structure) = badges.load_structure(badge_id)? else {
                continue;
            };
            let evaluation = evaluate_in(self.conn, member_id, badge_id)?;
            let Some(status) = evaluation.effective_status() else {
                continue;
            };

            summaries.push(BadgeSummary {
                badge_id,
                badge_name: structure.badge.name,
                category: structure.badge.category,
                progress: evaluation.progress,
                status,
                award_status: awards.find_award(member_id, badge_id)?.map(|a| a.award_status),
            });
        }

        summaries.sort_by(|a, b| a.badge_name.cmp(&b.badge_name));
        Ok(summaries)
    }

    /// Recompute one (member, badge) pair and write the cache if it disagrees.
    ///
    /// `allow_regression` is set only when a leader removed a completion.
    fn settle(
        &self,
        conn: &Connection,
        member_id: Uuid,
        badge_id: Uuid,
        allow_regression: bool,
    ) -> Result<BadgeUpdate, BadgeError> {
        let mut evaluation = evaluate_in(conn, member_id, badge_id)?;
        let store = ProgressStore::new(conn);

        let mut transition = None;
        let mut award_created = None;
        let mut award_retracted = false;

        match (evaluation.computed_complete, evaluation.cached_status) {
            (true, Some(ProgressStatus::Completed)) => {}
            (true, _) => {
                award_created = record_completion(conn, member_id, badge_id)?;
                evaluation.cached_status = Some(ProgressStatus::Completed);
                transition = Some(StatusTransition::Completed);
            }
            (false, Some(ProgressStatus::Completed)) => {
                if allow_regression && evaluation.structure_complete {
                    store.upsert_badge_progress(
                        member_id,
                        badge_id,
                        ProgressStatus::InProgress,
                        None,
                    )?;
                    evaluation.cached_status = Some(ProgressStatus::InProgress);
                    transition = Some(StatusTransition::Regressed);

                    if self.config.badges.regression_policy == RegressionPolicy::RetractPendingAward
                    {
                        award_retracted =
                            AwardStore::new(conn).delete_pending(member_id, badge_id)?;
                    }

                    tracing::info!(
                        "Badge {} regressed to in progress for member {} ({})",
                        badge_id,
                        member_id,
                        self.config.badges.regression_policy
                    );
                } else {
                    tracing::debug!(
                        "Keeping cached completion of badge {} for member {}",
                        badge_id,
                        member_id
                    );
                }
            }
            (false, None) if evaluation.requirements_started > 0 => {
                store.upsert_badge_progress(member_id, badge_id, ProgressStatus::InProgress, None)?;
                evaluation.cached_status = Some(ProgressStatus::InProgress);
                transition = Some(StatusTransition::Started);
            }
            (false, _) => {}
        }

        Ok(BadgeUpdate {
            member_id,
            badge_id,
            evaluation,
            transition,
            award_created,
            award_retracted,
        })
    }
}

/// Load everything needed and evaluate one badge for one member.
fn evaluate_in(
    conn: &Connection,
    member_id: Uuid,
    badge_id: Uuid,
) -> Result<BadgeEvaluation, BadgeError> {
    let structure = BadgeStore::new(conn)
        .load_structure(badge_id)?
        .ok_or_else(|| BadgeError::NotFound(format!("badge {}", badge_id)))?;

    let store = ProgressStore::new(conn);
    let progress = index_progress(store.list_requirement_progress(member_id, badge_id)?);
    let cached = store.get_badge_progress(member_id, badge_id)?;

    Ok(evaluate_badge(&structure, &progress, cached.as_ref()))
}

/// Badges with requirement progress or a cached status for the member.
fn touched_badges(conn: &Connection, member_id: Uuid) -> Result<BTreeSet<Uuid>, DatabaseError> {
    let store = ProgressStore::new(conn);
    let mut badges: BTreeSet<Uuid> = store.list_started_badges(member_id)?.into_iter().collect();
    badges.extend(store.list_badge_progress(member_id)?.into_iter().map(|p| p.badge_id));
    Ok(badges)
}

/// Write a `Completed` cache row (unless already completed) and create the
/// pending award if the member has none for this badge.
pub(crate) fn record_completion(
    conn: &Connection,
    member_id: Uuid,
    badge_id: Uuid,
) -> Result<Option<MemberBadgeAward>, DatabaseError> {
    let store = ProgressStore::new(conn);
    let already_completed = store
        .get_badge_progress(member_id, badge_id)?
        .is_some_and(|p| p.status == ProgressStatus::Completed);

    if !already_completed {
        store.upsert_badge_progress(
            member_id,
            badge_id,
            ProgressStatus::Completed,
            Some(Utc::now()),
        )?;
    }

    create_pending_award(conn, member_id, badge_id)
}

/// Create a pending award unless the (member, badge) pair already has one.
///
/// The lookup is a fast path; the table's unique key is the real guard.
pub(crate) fn create_pending_award(
    conn: &Connection,
    member_id: Uuid,
    badge_id: Uuid,
) -> Result<Option<MemberBadgeAward>, DatabaseError> {
    let awards = AwardStore::new(conn);
    if awards.find_award(member_id, badge_id)?.is_some() {
        return Ok(None);
    }

    let award = MemberBadgeAward::pending(member_id, badge_id);
    if awards.insert_if_absent(&award)? {
        tracing::info!(
            "Pending award {} created for member {} badge {}",
            award.id,
            member_id,
            badge_id
        );
        Ok(Some(award))
    } else {
        Ok(None)
    }
}
