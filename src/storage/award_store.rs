//! Badge award storage operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::badges::types::{AwardStatus, MemberBadgeAward};
use crate::storage::database::{get_enum, get_opt_timestamp, get_timestamp, get_uuid, DatabaseError};

const AWARD_COLUMNS: &str =
    "id, member_id, badge_id, award_status, created_at, awarded_date, awarded_by";

/// Award store. At most one award row exists per (member, badge).
pub struct AwardStore<'a> {
    conn: &'a Connection,
}

impl<'a> AwardStore<'a> {
    /// Create a new award store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Get an award by ID.
    pub fn get_award(&self, id: Uuid) -> Result<Option<MemberBadgeAward>, DatabaseError> {
        let sql = format!("SELECT {} FROM member_badge_awards WHERE id = ?1", AWARD_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], parse_award_row)
            .optional()?)
    }

    /// Find the award for a (member, badge) pair.
    pub fn find_award(
        &self,
        member_id: Uuid,
        badge_id: Uuid,
    ) -> Result<Option<MemberBadgeAward>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM member_badge_awards WHERE member_id = ?1 AND badge_id = ?2",
            AWARD_COLUMNS
        );
        Ok(self
            .conn
            .query_row(
                &sql,
                params![member_id.to_string(), badge_id.to_string()],
                parse_award_row,
            )
            .optional()?)
    }

    /// Insert an award unless one already exists for the pair.
    ///
    /// Returns `true` when a row was written. The unique key makes this safe
    /// even if an earlier existence check raced with another writer.
    pub fn insert_if_absent(&self, award: &MemberBadgeAward) -> Result<bool, DatabaseError> {
        let inserted = self.conn.execute(
            "INSERT INTO member_badge_awards
                 (id, member_id, badge_id, award_status, created_at, awarded_date, awarded_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(member_id, badge_id) DO NOTHING",
            params![
                award.id.to_string(),
                award.member_id.to_string(),
                award.badge_id.to_string(),
                award.award_status.as_str(),
                award.created_at.to_rfc3339(),
                award.awarded_date.map(|dt| dt.to_rfc3339()),
                award.awarded_by,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Mark an award as physically handed over.
    pub fn mark_awarded(
        &self,
        id: Uuid,
        awarded_date: DateTime<Utc>,
        awarded_by: &str,
    ) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE member_badge_awards SET award_status = 'awarded', awarded_date = ?2,
                 awarded_by = ?3
             WHERE id = ?1 AND award_status = 'pending'",
            params![id.to_string(), awarded_date.to_rfc3339(), awarded_by],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("pending award {}", id)));
        }
        Ok(())
    }

    /// Return an awarded badge to pending, clearing the hand-over details.
    pub fn mark_pending(&self, id: Uuid) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE member_badge_awards SET award_status = 'pending', awarded_date = NULL,
                 awarded_by = NULL
             WHERE id = ?1 AND award_status = 'awarded'",
            params![id.to_string()],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("awarded award {}", id)));
        }
        Ok(())
    }

    /// Delete a pending award. Awarded rows are never deleted here.
    pub fn delete_pending(&self, member_id: Uuid, badge_id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self.conn.execute(
            "DELETE FROM member_badge_awards
             WHERE member_id = ?1 AND badge_id = ?2 AND award_status = 'pending'",
            params![member_id.to_string(), badge_id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    /// List a member's awards, newest first.
    pub fn list_member_awards(
        &self,
        member_id: Uuid,
    ) -> Result<Vec<MemberBadgeAward>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM member_badge_awards WHERE member_id = ?1 ORDER BY created_at DESC",
            AWARD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![member_id.to_string()], parse_award_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// List all pending awards, oldest first.
    pub fn list_pending(&self) -> Result<Vec<MemberBadgeAward>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM member_badge_awards
             WHERE award_status = 'pending' ORDER BY created_at ASC",
            AWARD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], parse_award_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Pending award count per badge.
    pub fn pending_counts(&self) -> Result<HashMap<Uuid, u32>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT badge_id, COUNT(*) FROM member_badge_awards
             WHERE award_status = 'pending' GROUP BY badge_id",
        )?;
        let rows = stmt.query_map([], |row| Ok((get_uuid(row, 0)?, row.get::<_, u32>(1)?)))?;
        Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
    }
}

/// Parse a database row into a MemberBadgeAward.
fn parse_award_row(row: &Row<'_>) -> rusqlite::Result<MemberBadgeAward> {
    Ok(MemberBadgeAward {
        id: get_uuid(row, 0)?,
        member_id: get_uuid(row, 1)?,
        badge_id: get_uuid(row, 2)?,
        award_status: get_enum(row, 3, "award status", AwardStatus::from_str)?,
        created_at: get_timestamp(row, 4)?,
        awarded_date: get_opt_timestamp(row, 5)?,
        awarded_by: row.get(6)?,
    })
}
