//! Staged badge families driven by cumulative member counters.
//!
//! Each configured family maps a counter (nights away, hikes away) to a list
//! of thresholds. Reaching a threshold completes the family badge whose
//! `stage_number` equals it.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::progress::record_completion;
use super::types::{MemberBadgeAward, ProgressStatus};
use crate::members::Member;
use crate::storage::{AppConfig, BadgeStore, DatabaseError, ProgressStore, StagedCounter};

/// A stage newly completed by a counter check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageAward {
    pub family_id: String,
    pub threshold: u32,
    pub badge_id: Uuid,
    /// `None` if the member already held an award for this stage
    pub award: Option<MemberBadgeAward>,
}

/// Current value of the counter driving a family.
pub fn counter_value(member: &Member, counter: StagedCounter) -> u32 {
    match counter {
        StagedCounter::NightsAway => member.total_nights_away,
        StagedCounter::HikesAway => member.total_hikes_away,
    }
}

/// Thresholds at or below `count`.
pub fn reached_thresholds(thresholds: &[u32], count: u32) -> Vec<u32> {
    thresholds.iter().copied().filter(|t| *t <= count).collect()
}

/// The next threshold above `count`, if any.
pub fn next_threshold(thresholds: &[u32], count: u32) -> Option<u32> {
    thresholds.iter().copied().find(|t| *t > count)
}

/// Complete every reached stage the member has not completed yet.
///
/// Safe to run repeatedly: a stage already completed is skipped, and the
/// award insert is guarded by the unique key.
pub(crate) fn award_reached_stages(
    conn: &Connection,
    config: &AppConfig,
    member: &Member,
) -> Result<Vec<StageAward>, DatabaseError> {
    let badges = BadgeStore::new(conn);
    let progress = ProgressStore::new(conn);
    let mut awarded = Vec::new();

    for family in &config.badges.staged_families {
        let count = counter_value(member, family.counter);
        let reached = reached_thresholds(&family.thresholds, count);
        if reached.is_empty() {
            continue;
        }

        let stages = badges.list_family(&family.family_id)?;
        for threshold in reached {
            let Some(badge) = stages.iter().find(|b| b.stage_number == Some(threshold)) else {
                tracing::warn!(
                    "No {} badge defined for stage {}",
                    family.family_id,
                    threshold
                );
                continue;
            };

            let completed = progress
                .get_badge_progress(member.id, badge.id)?
                .is_some_and(|p| p.status == ProgressStatus::Completed);
            if completed {
                continue;
            }

            let award = record_completion(conn, member.id, badge.id)?;
            tracing::info!(
                "{} reached {} stage {}",
                member.full_name(),
                family.family_id,
                threshold
            );
            awarded.push(StageAward {
                family_id: family.family_id.clone(),
                threshold,
                badge_id: badge.id,
                award,
            });
        }
    }

    Ok(awarded)
}
