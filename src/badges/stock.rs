//! Badge stock management and reporting.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::awards::StockShortfall;
use super::deficit::{self, LowStock, StockDeficit};
use super::types::{BadgeStock, StockAdjustment};
use super::BadgeError;
use crate::accounts::LeaderAccount;
use crate::storage::{
    begin_immediate, AppConfig, AwardStore, BadgeStore, DatabaseError, ProgressStore, StockStore,
};

/// Manager for physical badge stock.
pub struct StockManager<'a> {
    conn: &'a Connection,
    config: &'a AppConfig,
}

impl<'a> StockManager<'a> {
    /// Create a new stock manager.
    pub fn new(conn: &'a Connection, config: &'a AppConfig) -> Self {
        Self { conn, config }
    }

    /// Restock or correct a badge's stock level, recording who and why.
    ///
    /// Only an admin may take stock below zero.
    pub fn adjust(
        &self,
        badge_id: Uuid,
        delta: i64,
        reason: &str,
        actor: &LeaderAccount,
    ) -> Result<BadgeStock, BadgeError> {
        if !actor.is_leader() {
            return Err(BadgeError::Unauthorized(format!(
                "{} cannot change stock",
                actor.display_name
            )));
        }
        if delta == 0 {
            return Err(BadgeError::ValidationError(
                "Stock change must be non-zero".to_string(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(BadgeError::ValidationError(
                "A reason is required for stock changes".to_string(),
            ));
        }

        let tx = begin_immediate(self.conn)?;
        let badge = BadgeStore::new(&tx)
            .get_badge(badge_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("badge {}", badge_id)))?;
        let stock = StockStore::new(&tx);

        let available = stock.get_stock(badge_id)?.map(|s| s.current_stock).unwrap_or(0);
        if available + delta < 0 && !actor.is_admin() {
            return Err(BadgeError::InsufficientStock {
                shortfalls: vec![StockShortfall {
                    badge_id,
                    badge_name: badge.name,
                    available,
                    required: -delta,
                    shortfall: -(available + delta),
                }],
            });
        }

        let level =
            stock.apply_delta(badge_id, delta, self.config.stock.default_minimum_threshold)?;
        stock.insert_adjustment(&StockAdjustment {
            id: Uuid::new_v4(),
            badge_id,
            delta,
            reason: reason.trim().to_string(),
            actor: actor.display_name.clone(),
            created_at: Utc::now(),
        })?;
        let updated = stock
            .get_stock(badge_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("stock for badge {}", badge_id)))?;

        tx.commit().map_err(DatabaseError::from)?;
        tracing::info!(
            "{} adjusted {} stock by {} to {} ({})",
            actor.display_name,
            badge.name,
            delta,
            level,
            reason.trim()
        );
        Ok(updated)
    }

    /// Set the level at or below which a badge shows on the low-stock report.
    pub fn set_minimum_threshold(
        &self,
        badge_id: Uuid,
        minimum: i64,
        actor: &LeaderAccount,
    ) -> Result<(), BadgeError> {
        if !actor.is_leader() {
            return Err(BadgeError::Unauthorized(format!(
                "{} cannot change stock",
                actor.display_name
            )));
        }
        if minimum < 0 {
            return Err(BadgeError::ValidationError(
                "Minimum threshold cannot be negative".to_string(),
            ));
        }
        if BadgeStore::new(self.conn).get_badge(badge_id)?.is_none() {
            return Err(BadgeError::NotFound(format!("badge {}", badge_id)));
        }

        StockStore::new(self.conn).set_minimum_threshold(badge_id, minimum)?;
        Ok(())
    }

    /// Every stock row.
    pub fn levels(&self) -> Result<Vec<BadgeStock>, BadgeError> {
        Ok(StockStore::new(self.conn).list_stock()?)
    }

    /// A badge's stock audit log, newest first.
    pub fn history(&self, badge_id: Uuid) -> Result<Vec<StockAdjustment>, BadgeError> {
        Ok(StockStore::new(self.conn).list_adjustments(badge_id)?)
    }

    /// Badges with more pending awards than stock.
    pub fn pending_deficits(&self) -> Result<Vec<StockDeficit>, BadgeError> {
        let badges = BadgeStore::new(self.conn).list_badges(true)?;
        let demand = AwardStore::new(self.conn).pending_counts()?;
        let stock = StockStore::new(self.conn).list_stock()?;
        Ok(deficit::derive_deficits(&badges, &demand, &stock))
    }

    /// Badges to order: pending awards plus members working on badges
    /// scheduled in their section's term running on `today`.
    pub fn shopping_list(&self, today: NaiveDate) -> Result<Vec<StockDeficit>, BadgeError> {
        let badges = BadgeStore::new(self.conn).list_badges(true)?;
        let pending = AwardStore::new(self.conn).pending_counts()?;
        let in_progress = ProgressStore::new(self.conn).scheduled_in_progress_counts(today)?;
        let stock = StockStore::new(self.conn).list_stock()?;

        let demand = deficit::forecast_demand(&pending, &in_progress);
        Ok(deficit::derive_deficits(&badges, &demand, &stock))
    }

    /// Badges at or below their reorder threshold.
    pub fn low_stock_report(&self) -> Result<Vec<LowStock>, BadgeError> {
        let badges = BadgeStore::new(self.conn).list_badges(true)?;
        let stock = StockStore::new(self.conn).list_stock()?;
        Ok(deficit::low_stock(&badges, &stock))
    }
}
