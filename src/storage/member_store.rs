//! Member storage operations.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::members::types::{Member, Section};
use crate::storage::database::{get_enum, get_opt_date, get_timestamp, get_uuid, DatabaseError};

const MEMBER_COLUMNS: &str = "id, first_name, last_name, section_id, date_of_birth,
     total_nights_away, total_hikes_away, active, created_at, updated_at";

/// Member store.
pub struct MemberStore<'a> {
    conn: &'a Connection,
}

impl<'a> MemberStore<'a> {
    /// Create a new member store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new member.
    pub fn insert_member(&self, member: &Member) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO members (id, first_name, last_name, section_id, date_of_birth,
                 total_nights_away, total_hikes_away, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                member.id.to_string(),
                member.first_name,
                member.last_name,
                member.section.as_str(),
                member.date_of_birth.map(|d| d.to_string()),
                member.total_nights_away,
                member.total_hikes_away,
                member.active,
                member.created_at.to_rfc3339(),
                member.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Update a member's details (not the counters).
    pub fn update_member(&self, member: &Member) -> Result<bool, DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE members SET first_name = ?2, last_name = ?3, section_id = ?4,
                                date_of_birth = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                member.id.to_string(),
                member.first_name,
                member.last_name,
                member.section.as_str(),
                member.date_of_birth.map(|d| d.to_string()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(updated > 0)
    }

    /// Get a member by ID.
    pub fn get_member(&self, id: Uuid) -> Result<Option<Member>, DatabaseError> {
        let sql = format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], parse_member_row)
            .optional()?)
    }

    /// List members, optionally restricted to one section.
    pub fn list_members(
        &self,
        section: Option<Section>,
        include_archived: bool,
    ) -> Result<Vec<Member>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM members
             WHERE (?1 IS NULL OR section_id = ?1) AND (active = 1 OR ?2)
             ORDER BY last_name ASC, first_name ASC",
            MEMBER_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![section.map(|s| s.as_str()), include_archived],
            parse_member_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Set the active flag.
    pub fn set_active(&self, id: Uuid, active: bool) -> Result<bool, DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE members SET active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), active, Utc::now().to_rfc3339()],
        )?;
        Ok(updated > 0)
    }

    /// Store new nights/hikes counter values.
    pub fn set_counters(
        &self,
        id: Uuid,
        total_nights_away: u32,
        total_hikes_away: u32,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE members SET total_nights_away = ?2, total_hikes_away = ?3, updated_at = ?4
             WHERE id = ?1",
            params![
                id.to_string(),
                total_nights_away,
                total_hikes_away,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Permanently delete a member. Progress and awards cascade.
    pub fn delete_member(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM members WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }
}

/// Parse a database row into a Member.
fn parse_member_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: get_uuid(row, 0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        section: get_enum(row, 3, "section", Section::from_str)?,
        date_of_birth: get_opt_date(row, 4)?,
        total_nights_away: row.get(5)?,
        total_hikes_away: row.get(6)?,
        active: row.get(7)?,
        created_at: get_timestamp(row, 8)?,
        updated_at: get_timestamp(row, 9)?,
    })
}
