//! Member progress storage operations.
//!
//! Requirement-level progress rows are the source of truth; badge-level rows
//! are a derived cache kept in step by `ProgressManager`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::badges::types::{MemberBadgeProgress, MemberRequirementProgress, ProgressStatus};
use crate::storage::database::{
    get_enum, get_opt_timestamp, get_timestamp, get_uuid, DatabaseError,
};

const REQUIREMENT_PROGRESS_COLUMNS: &str =
    "id, member_id, requirement_id, badge_id, completion_count, completed, completed_date,
     updated_at";

const BADGE_PROGRESS_COLUMNS: &str =
    "id, member_id, badge_id, status, completion_date, updated_at";

/// Progress store for requirement and badge progress rows.
pub struct ProgressStore<'a> {
    conn: &'a Connection,
}

impl<'a> ProgressStore<'a> {
    /// Create a new progress store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Requirement Progress ==========

    /// Get one member's progress on one requirement.
    pub fn get_requirement_progress(
        &self,
        member_id: Uuid,
        requirement_id: Uuid,
    ) -> Result<Option<MemberRequirementProgress>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM member_requirement_progress
             WHERE member_id = ?1 AND requirement_id = ?2",
            REQUIREMENT_PROGRESS_COLUMNS
        );
        Ok(self
            .conn
            .query_row(
                &sql,
                params![member_id.to_string(), requirement_id.to_string()],
                parse_requirement_progress_row,
            )
            .optional()?)
    }

    /// List one member's requirement progress rows for a badge.
    pub fn list_requirement_progress(
        &self,
        member_id: Uuid,
        badge_id: Uuid,
    ) -> Result<Vec<MemberRequirementProgress>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM member_requirement_progress WHERE member_id = ?1 AND badge_id = ?2",
            REQUIREMENT_PROGRESS_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![member_id.to_string(), badge_id.to_string()],
            parse_requirement_progress_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Badges on which the member has any requirement progress.
    pub fn list_started_badges(&self, member_id: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT badge_id FROM member_requirement_progress WHERE member_id = ?1",
        )?;
        let rows = stmt.query_map(params![member_id.to_string()], |row| get_uuid(row, 0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Insert or update a requirement progress row.
    ///
    /// The `(member_id, requirement_id)` unique key means a concurrent insert
    /// turns into an update rather than a second row.
    pub fn upsert_requirement_progress(
        &self,
        progress: &MemberRequirementProgress,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO member_requirement_progress
                 (id, member_id, requirement_id, badge_id, completion_count, completed,
                  completed_date, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(member_id, requirement_id) DO UPDATE SET
                 completion_count = excluded.completion_count,
                 completed = excluded.completed,
                 completed_date = excluded.completed_date,
                 updated_at = excluded.updated_at",
            params![
                progress.id.to_string(),
                progress.member_id.to_string(),
                progress.requirement_id.to_string(),
                progress.badge_id.to_string(),
                progress.completion_count,
                progress.completed,
                progress.completed_date.map(|dt| dt.to_rfc3339()),
                progress.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Delete a requirement progress row. Returns whether a row existed.
    pub fn delete_requirement_progress(
        &self,
        member_id: Uuid,
        requirement_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let deleted = self.conn.execute(
            "DELETE FROM member_requirement_progress WHERE member_id = ?1 AND requirement_id = ?2",
            params![member_id.to_string(), requirement_id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    // ========== Badge Progress ==========

    /// Get the cached badge status for a member.
    pub fn get_badge_progress(
        &self,
        member_id: Uuid,
        badge_id: Uuid,
    ) -> Result<Option<MemberBadgeProgress>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM member_badge_progress WHERE member_id = ?1 AND badge_id = ?2",
            BADGE_PROGRESS_COLUMNS
        );
        Ok(self
            .conn
            .query_row(
                &sql,
                params![member_id.to_string(), badge_id.to_string()],
                parse_badge_progress_row,
            )
            .optional()?)
    }

    /// List every cached badge status for a member.
    pub fn list_badge_progress(
        &self,
        member_id: Uuid,
    ) -> Result<Vec<MemberBadgeProgress>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM member_badge_progress WHERE member_id = ?1",
            BADGE_PROGRESS_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![member_id.to_string()], parse_badge_progress_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Write the cached badge status, creating the row if needed.
    pub fn upsert_badge_progress(
        &self,
        member_id: Uuid,
        badge_id: Uuid,
        status: ProgressStatus,
        completion_date: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO member_badge_progress
                 (id, member_id, badge_id, status, completion_date, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(member_id, badge_id) DO UPDATE SET
                 status = excluded.status,
                 completion_date = excluded.completion_date,
                 updated_at = excluded.updated_at",
            params![
                Uuid::new_v4().to_string(),
                member_id.to_string(),
                badge_id.to_string(),
                status.as_str(),
                completion_date.map(|dt| dt.to_rfc3339()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Number of active members per badge whose cached status is `InProgress`
    /// and whose own section's term running on `date` schedules the badge.
    ///
    /// Members already holding an award row for the badge are left out; a
    /// second completion never creates a second award.
    pub fn scheduled_in_progress_counts(
        &self,
        date: NaiveDate,
    ) -> Result<HashMap<Uuid, u32>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.badge_id, COUNT(DISTINCT p.member_id)
             FROM member_badge_progress p
             JOIN members m ON m.id = p.member_id
             JOIN terms t ON t.section = m.section_id
                 AND t.start_date <= ?1 AND t.end_date >= ?1
             JOIN term_badges tb ON tb.term_id = t.id AND tb.badge_id = p.badge_id
             WHERE p.status = 'in_progress' AND m.active = 1
               AND NOT EXISTS (
                   SELECT 1 FROM member_badge_awards a
                   WHERE a.member_id = p.member_id AND a.badge_id = p.badge_id
               )
             GROUP BY p.badge_id",
        )?;
        let rows = stmt.query_map(params![date.to_string()], |row| {
            Ok((get_uuid(row, 0)?, row.get::<_, u32>(1)?))
        })?;
        Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
    }
}

/// Parse a database row into a MemberRequirementProgress.
fn parse_requirement_progress_row(row: &Row<'_>) -> rusqlite::Result<MemberRequirementProgress> {
    Ok(MemberRequirementProgress {
        id: get_uuid(row, 0)?,
        member_id: get_uuid(row, 1)?,
        requirement_id: get_uuid(row, 2)?,
        badge_id: get_uuid(row, 3)?,
        completion_count: row.get(4)?,
        completed: row.get(5)?,
        completed_date: get_opt_timestamp(row, 6)?,
        updated_at: get_timestamp(row, 7)?,
    })
}

/// Parse a database row into a MemberBadgeProgress.
fn parse_badge_progress_row(row: &Row<'_>) -> rusqlite::Result<MemberBadgeProgress> {
    Ok(MemberBadgeProgress {
        id: get_uuid(row, 0)?,
        member_id: get_uuid(row, 1)?,
        badge_id: get_uuid(row, 2)?,
        status: get_enum(row, 3, "progress status", ProgressStatus::from_str)?,
        completion_date: get_opt_timestamp(row, 4)?,
        updated_at: get_timestamp(row, 5)?,
    })
}
