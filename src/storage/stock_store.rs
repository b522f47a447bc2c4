//! Badge stock and stock audit log storage operations.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::badges::types::{BadgeStock, StockAdjustment};
use crate::storage::database::{get_timestamp, get_uuid, DatabaseError};

/// Stock store.
pub struct StockStore<'a> {
    conn: &'a Connection,
}

impl<'a> StockStore<'a> {
    /// Create a new stock store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Get the stock row for a badge.
    pub fn get_stock(&self, badge_id: Uuid) -> Result<Option<BadgeStock>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT badge_id, current_stock, minimum_threshold, updated_at
                 FROM badge_stock WHERE badge_id = ?1",
                params![badge_id.to_string()],
                parse_stock_row,
            )
            .optional()?)
    }

    /// List every stock row.
    pub fn list_stock(&self) -> Result<Vec<BadgeStock>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT badge_id, current_stock, minimum_threshold, updated_at FROM badge_stock",
        )?;
        let rows = stmt.query_map([], parse_stock_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Apply a delta to a badge's stock, creating the row at zero if needed.
    ///
    /// Returns the stock level after the change.
    pub fn apply_delta(
        &self,
        badge_id: Uuid,
        delta: i64,
        default_minimum: i64,
    ) -> Result<i64, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO badge_stock (badge_id, current_stock, minimum_threshold, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(badge_id) DO UPDATE SET
                 current_stock = current_stock + excluded.current_stock,
                 updated_at = excluded.updated_at",
            params![badge_id.to_string(), delta, default_minimum, now],
        )?;

        Ok(self.conn.query_row(
            "SELECT current_stock FROM badge_stock WHERE badge_id = ?1",
            params![badge_id.to_string()],
            |row| row.get(0),
        )?)
    }

    /// Set the reorder threshold for a badge.
    pub fn set_minimum_threshold(&self, badge_id: Uuid, minimum: i64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO badge_stock (badge_id, current_stock, minimum_threshold, updated_at)
             VALUES (?1, 0, ?2, ?3)
             ON CONFLICT(badge_id) DO UPDATE SET
                 minimum_threshold = excluded.minimum_threshold,
                 updated_at = excluded.updated_at",
            params![badge_id.to_string(), minimum, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Append an entry to the stock audit log.
    pub fn insert_adjustment(&self, adjustment: &StockAdjustment) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO stock_adjustments (id, badge_id, delta, reason, actor, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                adjustment.id.to_string(),
                adjustment.badge_id.to_string(),
                adjustment.delta,
                adjustment.reason,
                adjustment.actor,
                adjustment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Audit history for a badge, newest first.
    pub fn list_adjustments(&self, badge_id: Uuid) -> Result<Vec<StockAdjustment>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, badge_id, delta, reason, actor, created_at
             FROM stock_adjustments WHERE badge_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![badge_id.to_string()], |row| {
            Ok(StockAdjustment {
                id: get_uuid(row, 0)?,
                badge_id: get_uuid(row, 1)?,
                delta: row.get(2)?,
                reason: row.get(3)?,
                actor: row.get(4)?,
                created_at: get_timestamp(row, 5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn parse_stock_row(row: &Row<'_>) -> rusqlite::Result<BadgeStock> {
    Ok(BadgeStock {
        badge_id: get_uuid(row, 0)?,
        current_stock: row.get(1)?,
        minimum_threshold: row.get(2)?,
        updated_at: get_timestamp(row, 3)?,
    })
}
