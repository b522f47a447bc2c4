//! Handing over completed badges.
//!
//! Awarding takes one physical badge from stock per award. The stock check,
//! the decrement, the audit entry and the status change happen in a single
//! immediate transaction: either every award in a batch goes through or none
//! does.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::types::{AwardStatus, MemberBadgeAward, StockAdjustment};
use super::BadgeError;
use crate::accounts::LeaderAccount;
use crate::storage::{
    begin_immediate, AppConfig, AwardStore, BadgeStore, DatabaseError, MemberStore, StockStore,
};

/// Stock missing for one badge in an award batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockShortfall {
    pub badge_id: Uuid,
    pub badge_name: String,
    pub available: i64,
    pub required: i64,
    pub shortfall: i64,
}

/// Human readable summary of a list of shortfalls.
pub fn describe_shortfalls(shortfalls: &[StockShortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| {
            format!(
                "{} ({} in stock, {} needed, short by {})",
                s.badge_name, s.available, s.required, s.shortfall
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Manager for badge awards.
pub struct AwardManager<'a> {
    conn: &'a Connection,
    config: &'a AppConfig,
}

impl<'a> AwardManager<'a> {
    /// Create a new award manager.
    pub fn new(conn: &'a Connection, config: &'a AppConfig) -> Self {
        Self { conn, config }
    }

    /// Every award still waiting to be handed over, oldest first.
    pub fn pending_awards(&self) -> Result<Vec<MemberBadgeAward>, BadgeError> {
        Ok(AwardStore::new(self.conn).list_pending()?)
    }

    /// A member's awards, newest first.
    pub fn member_awards(&self, member_id: Uuid) -> Result<Vec<MemberBadgeAward>, BadgeError> {
        Ok(AwardStore::new(self.conn).list_member_awards(member_id)?)
    }

    /// Mark a batch of pending awards as handed over.
    ///
    /// If any badge would drop below zero the batch is rejected with
    /// `InsufficientStock`, unless the actor is an admin and passes
    /// `override_shortfall`.
    pub fn award(
        &self,
        award_ids: &[Uuid],
        actor: &LeaderAccount,
        override_shortfall: bool,
    ) -> Result<Vec<MemberBadgeAward>, BadgeError> {
        if !actor.is_leader() {
            return Err(BadgeError::Unauthorized(format!(
                "{} cannot award badges",
                actor.display_name
            )));
        }
        if award_ids.is_empty() {
            return Err(BadgeError::ValidationError(
                "No awards selected".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = award_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let tx = begin_immediate(self.conn)?;
        let awards = AwardStore::new(&tx);
        let badges = BadgeStore::new(&tx);
        let stock = StockStore::new(&tx);
        let members = MemberStore::new(&tx);

        let mut batch = Vec::with_capacity(ids.len());
        for id in &ids {
            let award = awards
                .get_award(*id)?
                .ok_or_else(|| BadgeError::NotFound(format!("award {}", id)))?;
            if award.award_status == AwardStatus::Awarded {
                return Err(BadgeError::Duplicate(format!(
                    "award {} has already been handed over",
                    id
                )));
            }
            batch.push(award);
        }

        let mut required: BTreeMap<Uuid, i64> = BTreeMap::new();
        for award in &batch {
            *required.entry(award.badge_id).or_insert(0) += 1;
        }

        let mut shortfalls = Vec::new();
        for (badge_id, needed) in &required {
            let available = stock.get_stock(*badge_id)?.map(|s| s.current_stock).unwrap_or(0);
            if available < *needed {
                let badge_name = badges
                    .get_badge(*badge_id)?
                    .map(|b| b.name)
                    .unwrap_or_else(|| badge_id.to_string());
                shortfalls.push(StockShortfall {
                    badge_id: *badge_id,
                    badge_name,
                    available,
                    required: *needed,
                    shortfall: needed - available,
                });
            }
        }

        if !shortfalls.is_empty() {
            if !(actor.is_admin() && override_shortfall) {
                return Err(BadgeError::InsufficientStock { shortfalls });
            }
            tracing::warn!(
                "{} overrode stock shortfall: {}",
                actor.display_name,
                describe_shortfalls(&shortfalls)
            );
        }

        let now = Utc::now();
        let mut awarded = Vec::with_capacity(batch.len());
        for mut award in batch {
            let member_name = members
                .get_member(award.member_id)?
                .map(|m| m.full_name())
                .unwrap_or_else(|| award.member_id.to_string());

            let level = stock.apply_delta(
                award.badge_id,
                -1,
                self.config.stock.default_minimum_threshold,
            )?;
            stock.insert_adjustment(&StockAdjustment {
                id: Uuid::new_v4(),
                badge_id: award.badge_id,
                delta: -1,
                reason: format!("award to {}", member_name),
                actor: actor.display_name.clone(),
                created_at: now,
            })?;
            awards.mark_awarded(award.id, now, &actor.display_name)?;

            tracing::info!(
                "Awarded badge {} to {} (stock now {})",
                award.badge_id,
                member_name,
                level
            );

            award.award_status = AwardStatus::Awarded;
            award.awarded_date = Some(now);
            award.awarded_by = Some(actor.display_name.clone());
            awarded.push(award);
        }

        tx.commit().map_err(DatabaseError::from)?;
        Ok(awarded)
    }

    /// Return an awarded badge to pending and put it back in stock.
    pub fn revoke(
        &self,
        award_id: Uuid,
        actor: &LeaderAccount,
    ) -> Result<MemberBadgeAward, BadgeError> {
        if !actor.is_leader() {
            return Err(BadgeError::Unauthorized(format!(
                "{} cannot revoke awards",
                actor.display_name
            )));
        }

        let tx = begin_immediate(self.conn)?;
        let awards = AwardStore::new(&tx);
        let stock = StockStore::new(&tx);

        let mut award = awards
            .get_award(award_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("award {}", award_id)))?;
        if award.award_status != AwardStatus::Awarded {
            return Err(BadgeError::ValidationError(format!(
                "award {} has not been handed over",
                award_id
            )));
        }

        let member_name = MemberStore::new(&tx)
            .get_member(award.member_id)?
            .map(|m| m.full_name())
            .unwrap_or_else(|| award.member_id.to_string());

        awards.mark_pending(award_id)?;
        stock.apply_delta(award.badge_id, 1, self.config.stock.default_minimum_threshold)?;
        stock.insert_adjustment(&StockAdjustment {
            id: Uuid::new_v4(),
            badge_id: award.badge_id,
            delta: 1,
            reason: format!("award to {} revoked", member_name),
            actor: actor.display_name.clone(),
            created_at: Utc::now(),
        })?;

        tx.commit().map_err(DatabaseError::from)?;
        tracing::info!("{} revoked award {}", actor.display_name, award_id);

        award.award_status = AwardStatus::Pending;
        award.awarded_date = None;
        award.awarded_by = None;
        Ok(award)
    }
}
