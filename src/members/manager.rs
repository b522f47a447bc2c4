//! Member management.

use rusqlite::Connection;
use uuid::Uuid;

use super::types::{Member, Section};
use crate::badges::staged::{self, StageAward};
use crate::storage::{begin_immediate, AppConfig, DatabaseError, MemberStore, StagedCounter};

/// Manager for youth members.
pub struct MemberManager<'a> {
    conn: &'a Connection,
    config: &'a AppConfig,
}

impl<'a> MemberManager<'a> {
    /// Create a new member manager with a database connection.
    pub fn new(conn: &'a Connection, config: &'a AppConfig) -> Self {
        Self { conn, config }
    }

    /// Create a new member.
    pub fn create(&self, member: &Member) -> Result<(), MemberError> {
        validate(member)?;
        MemberStore::new(self.conn).insert_member(member)?;
        tracing::info!("Added {} to {}", member.full_name(), member.section);
        Ok(())
    }

    /// Get a member by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<Member>, MemberError> {
        Ok(MemberStore::new(self.conn).get_member(id)?)
    }

    /// List members, optionally for one section.
    pub fn list(
        &self,
        section: Option<Section>,
        include_archived: bool,
    ) -> Result<Vec<Member>, MemberError> {
        Ok(MemberStore::new(self.conn).list_members(section, include_archived)?)
    }

    /// Update a member's name, section and date of birth.
    pub fn update(&self, member: &Member) -> Result<(), MemberError> {
        validate(member)?;
        if !MemberStore::new(self.conn).update_member(member)? {
            return Err(MemberError::NotFound(member.id));
        }
        Ok(())
    }

    /// Archive a member who has left. Their progress is kept.
    pub fn archive(&self, id: Uuid) -> Result<(), MemberError> {
        if !MemberStore::new(self.conn).set_active(id, false)? {
            return Err(MemberError::NotFound(id));
        }
        Ok(())
    }

    /// Restore an archived member.
    pub fn restore(&self, id: Uuid) -> Result<(), MemberError> {
        if !MemberStore::new(self.conn).set_active(id, true)? {
            return Err(MemberError::NotFound(id));
        }
        Ok(())
    }

    /// Permanently delete an archived member along with their progress.
    pub fn delete(&self, id: Uuid) -> Result<(), MemberError> {
        let store = MemberStore::new(self.conn);
        let member = store.get_member(id)?.ok_or(MemberError::NotFound(id))?;
        if member.active {
            return Err(MemberError::ValidationError(format!(
                "{} must be archived before deletion",
                member.full_name()
            )));
        }

        store.delete_member(id)?;
        tracing::info!("Deleted member {}", id);
        Ok(())
    }

    /// Add (or with a negative delta, remove) nights away and award any
    /// Nights Away stages reached.
    pub fn record_nights_away(
        &self,
        id: Uuid,
        delta: i64,
    ) -> Result<(Member, Vec<StageAward>), MemberError> {
        self.record_counter(id, StagedCounter::NightsAway, delta)
    }

    /// Add (or remove) hikes away and award any Hikes Away stages reached.
    pub fn record_hikes_away(
        &self,
        id: Uuid,
        delta: i64,
    ) -> Result<(Member, Vec<StageAward>), MemberError> {
        self.record_counter(id, StagedCounter::HikesAway, delta)
    }

    /// Counter update and stage check share one transaction. Counters clamp
    /// at zero; stages already completed are never taken away.
    fn record_counter(
        &self,
        id: Uuid,
        counter: StagedCounter,
        delta: i64,
    ) -> Result<(Member, Vec<StageAward>), MemberError> {
        let tx = begin_immediate(self.conn)?;
        let store = MemberStore::new(&tx);
        let mut member = store.get_member(id)?.ok_or(MemberError::NotFound(id))?;

        let apply = |value: u32| (value as i64 + delta).clamp(0, u32::MAX as i64) as u32;
        match counter {
            StagedCounter::NightsAway => member.total_nights_away = apply(member.total_nights_away),
            StagedCounter::HikesAway => member.total_hikes_away = apply(member.total_hikes_away),
        }
        store.set_counters(id, member.total_nights_away, member.total_hikes_away)?;

        let stages = staged::award_reached_stages(&tx, self.config, &member)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok((member, stages))
    }
}

fn validate(member: &Member) -> Result<(), MemberError> {
    if member.first_name.is_empty() || member.last_name.is_empty() {
        return Err(MemberError::ValidationError(
            "First and last name are required".to_string(),
        ));
    }
    Ok(())
}

/// Member management errors.
#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Member not found: {0}")]
    NotFound(Uuid),
}
