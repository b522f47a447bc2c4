//! Term and programme storage operations.

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::members::Section;
use crate::programme::types::Term;
use crate::storage::database::{get_date, get_enum, get_uuid, DatabaseError};

/// Programme store.
pub struct ProgrammeStore<'a> {
    conn: &'a Connection,
}

impl<'a> ProgrammeStore<'a> {
    /// Create a new programme store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new term.
    pub fn insert_term(&self, term: &Term) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO terms (id, section, title, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                term.id.to_string(),
                term.section.as_str(),
                term.title,
                term.start_date.to_string(),
                term.end_date.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Get a term by ID.
    pub fn get_term(&self, id: Uuid) -> Result<Option<Term>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, section, title, start_date, end_date FROM terms WHERE id = ?1",
                params![id.to_string()],
                parse_term_row,
            )
            .optional()?)
    }

    /// List a section's terms, most recent first.
    pub fn list_terms(&self, section: Section) -> Result<Vec<Term>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, section, title, start_date, end_date FROM terms
             WHERE section = ?1 ORDER BY start_date DESC",
        )?;
        let rows = stmt.query_map(params![section.as_str()], parse_term_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The section's term covering `date`, latest start wins on overlap.
    pub fn term_on(
        &self,
        section: Section,
        date: NaiveDate,
    ) -> Result<Option<Term>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, section, title, start_date, end_date FROM terms
                 WHERE section = ?1 AND start_date <= ?2 AND end_date >= ?2
                 ORDER BY start_date DESC LIMIT 1",
                params![section.as_str(), date.to_string()],
                parse_term_row,
            )
            .optional()?)
    }

    /// Add a badge to a term's programme. Returns `false` if already scheduled.
    pub fn schedule_badge(&self, term_id: Uuid, badge_id: Uuid) -> Result<bool, DatabaseError> {
        let inserted = self.conn.execute(
            "INSERT INTO term_badges (term_id, badge_id) VALUES (?1, ?2)
             ON CONFLICT(term_id, badge_id) DO NOTHING",
            params![term_id.to_string(), badge_id.to_string()],
        )?;
        Ok(inserted > 0)
    }

    /// Remove a badge from a term's programme.
    pub fn unschedule_badge(&self, term_id: Uuid, badge_id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self.conn.execute(
            "DELETE FROM term_badges WHERE term_id = ?1 AND badge_id = ?2",
            params![term_id.to_string(), badge_id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    /// Badges scheduled in one term.
    pub fn scheduled_badges(&self, term_id: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT badge_id FROM term_badges WHERE term_id = ?1")?;
        let rows = stmt.query_map(params![term_id.to_string()], |row| get_uuid(row, 0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Badges scheduled in any term running on `date`, across all sections.
    pub fn scheduled_badges_on(&self, date: NaiveDate) -> Result<HashSet<Uuid>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT tb.badge_id
             FROM term_badges tb
             JOIN terms t ON t.id = tb.term_id
             WHERE t.start_date <= ?1 AND t.end_date >= ?1",
        )?;
        let rows = stmt.query_map(params![date.to_string()], |row| get_uuid(row, 0))?;
        Ok(rows.collect::<Result<HashSet<_>, _>>()?)
    }
}

fn parse_term_row(row: &Row<'_>) -> rusqlite::Result<Term> {
    Ok(Term {
        id: get_uuid(row, 0)?,
        section: get_enum(row, 1, "section", Section::from_str)?,
        title: row.get(2)?,
        start_date: get_date(row, 3)?,
        end_date: get_date(row, 4)?,
    })
}
