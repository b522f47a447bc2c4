//! Term and programme management.

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use super::types::Term;
use crate::members::Section;
use crate::storage::{BadgeStore, DatabaseError, ProgrammeStore};

/// Manager for terms and the badges scheduled in them.
pub struct TermManager<'a> {
    conn: &'a Connection,
}

impl<'a> TermManager<'a> {
    /// Create a new term manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a term.
    pub fn create_term(&self, term: &Term) -> Result<(), ProgrammeError> {
        if term.title.is_empty() {
            return Err(ProgrammeError::ValidationError(
                "Term title is required".to_string(),
            ));
        }
        if term.end_date < term.start_date {
            return Err(ProgrammeError::ValidationError(format!(
                "Term {} ends before it starts",
                term.title
            )));
        }

        ProgrammeStore::new(self.conn).insert_term(term)?;
        Ok(())
    }

    /// Get a term by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<Term>, ProgrammeError> {
        Ok(ProgrammeStore::new(self.conn).get_term(id)?)
    }

    /// A section's terms, most recent first.
    pub fn list_terms(&self, section: Section) -> Result<Vec<Term>, ProgrammeError> {
        Ok(ProgrammeStore::new(self.conn).list_terms(section)?)
    }

    /// The section's term running on `today`, if any.
    pub fn current_term(
        &self,
        section: Section,
        today: NaiveDate,
    ) -> Result<Option<Term>, ProgrammeError> {
        Ok(ProgrammeStore::new(self.conn).term_on(section, today)?)
    }

    /// Add a badge to a term's programme.
    pub fn schedule_badge(&self, term_id: Uuid, badge_id: Uuid) -> Result<(), ProgrammeError> {
        let store = ProgrammeStore::new(self.conn);
        if store.get_term(term_id)?.is_none() {
            return Err(ProgrammeError::NotFound(format!("term {}", term_id)));
        }
        if BadgeStore::new(self.conn).get_badge(badge_id)?.is_none() {
            return Err(ProgrammeError::NotFound(format!("badge {}", badge_id)));
        }

        if !store.schedule_badge(term_id, badge_id)? {
            return Err(ProgrammeError::Duplicate(format!(
                "badge {} is already scheduled in term {}",
                badge_id, term_id
            )));
        }
        Ok(())
    }

    /// Remove a badge from a term's programme.
    pub fn unschedule_badge(&self, term_id: Uuid, badge_id: Uuid) -> Result<bool, ProgrammeError> {
        Ok(ProgrammeStore::new(self.conn).unschedule_badge(term_id, badge_id)?)
    }

    /// Badges scheduled in a term.
    pub fn scheduled_badges(&self, term_id: Uuid) -> Result<Vec<Uuid>, ProgrammeError> {
        Ok(ProgrammeStore::new(self.conn).scheduled_badges(term_id)?)
    }

    /// Badges scheduled in any section's term running on `today`.
    pub fn scheduled_badges_on(&self, today: NaiveDate) -> Result<HashSet<Uuid>, ProgrammeError> {
        Ok(ProgrammeStore::new(self.conn).scheduled_badges_on(today)?)
    }
}

/// Programme errors.
#[derive(Debug, thiserror::Error)]
pub enum ProgrammeError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
