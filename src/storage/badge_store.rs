//! Badge catalogue storage operations.
//!
//! Provides persistence for:
//! - Badge definitions
//! - Badge modules
//! - Badge requirements

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::badges::types::{
    BadgeCategory, BadgeCompletionRule, BadgeDefinition, BadgeModule, BadgeRequirement,
    BadgeSection, BadgeStructure, ModuleCompletionRule, ModuleStructure,
};
use crate::storage::database::{get_enum, get_timestamp, get_uuid, DatabaseError};

const BADGE_COLUMNS: &str = "id, name, section, category, completion_rule, badge_family_id,
     stage_number, is_chief_scout_award, image_url, active, created_at";

const MODULE_COLUMNS: &str = "id, badge_id, name, completion_rule, required_count, display_order";

const REQUIREMENT_COLUMNS: &str =
    "id, module_id, badge_id, text, required_completions, display_order";

/// Badge store for the catalogue tree.
pub struct BadgeStore<'a> {
    conn: &'a Connection,
}

impl<'a> BadgeStore<'a> {
    /// Create a new badge store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Badge Operations ==========

    /// Insert a new badge definition.
    pub fn insert_badge(&self, badge: &BadgeDefinition) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO badges (id, name, section, category, completion_rule, badge_family_id,
                                 stage_number, is_chief_scout_award, image_url, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                badge.id.to_string(),
                badge.name,
                badge.section.as_str(),
                badge.category.as_str(),
                badge.completion_rule.as_str(),
                badge.badge_family_id,
                badge.stage_number,
                badge.is_chief_scout_award,
                badge.image_url,
                badge.active,
                badge.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Update a badge definition.
    pub fn update_badge(&self, badge: &BadgeDefinition) -> Result<bool, DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE badges SET name = ?2, section = ?3, category = ?4, completion_rule = ?5,
                               badge_family_id = ?6, stage_number = ?7,
                               is_chief_scout_award = ?8, image_url = ?9, active = ?10
             WHERE id = ?1",
            params![
                badge.id.to_string(),
                badge.name,
                badge.section.as_str(),
                badge.category.as_str(),
                badge.completion_rule.as_str(),
                badge.badge_family_id,
                badge.stage_number,
                badge.is_chief_scout_award,
                badge.image_url,
                badge.active,
            ],
        )?;
        Ok(updated > 0)
    }

    /// Get a badge by ID.
    pub fn get_badge(&self, id: Uuid) -> Result<Option<BadgeDefinition>, DatabaseError> {
        let sql = format!("SELECT {} FROM badges WHERE id = ?1", BADGE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], parse_badge_row)
            .optional()?)
    }

    /// List all badges, ordered by name.
    pub fn list_badges(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<BadgeDefinition>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM badges WHERE active = 1 OR ?1 ORDER BY name ASC",
            BADGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![include_inactive], parse_badge_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// List the stages of a staged family, lowest stage first.
    pub fn list_family(&self, family_id: &str) -> Result<Vec<BadgeDefinition>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM badges WHERE badge_family_id = ?1 ORDER BY stage_number ASC",
            BADGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![family_id], parse_badge_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ========== Module Operations ==========

    /// Insert a new module.
    pub fn insert_module(&self, module: &BadgeModule) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO badge_modules
                 (id, badge_id, name, completion_rule, required_count, display_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                module.id.to_string(),
                module.badge_id.to_string(),
                module.name,
                module.completion_rule.as_str(),
                module.required_count,
                module.order,
            ],
        )?;
        Ok(())
    }

    /// Get a module by ID.
    pub fn get_module(&self, id: Uuid) -> Result<Option<BadgeModule>, DatabaseError> {
        let sql = format!("SELECT {} FROM badge_modules WHERE id = ?1", MODULE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], parse_module_row)
            .optional()?)
    }

    /// List a badge's modules in display order.
    pub fn list_modules(&self, badge_id: Uuid) -> Result<Vec<BadgeModule>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM badge_modules WHERE badge_id = ?1 ORDER BY display_order ASC, name ASC",
            MODULE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![badge_id.to_string()], parse_module_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ========== Requirement Operations ==========

    /// Insert a new requirement.
    pub fn insert_requirement(&self, requirement: &BadgeRequirement) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO badge_requirements
                 (id, module_id, badge_id, text, required_completions, display_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                requirement.id.to_string(),
                requirement.module_id.to_string(),
                requirement.badge_id.to_string(),
                requirement.text,
                requirement.completions_needed(),
                requirement.order,
            ],
        )?;
        Ok(())
    }

    /// Get a requirement by ID.
    pub fn get_requirement(&self, id: Uuid) -> Result<Option<BadgeRequirement>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM badge_requirements WHERE id = ?1",
            REQUIREMENT_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], parse_requirement_row)
            .optional()?)
    }

    /// List a module's requirements in display order.
    pub fn list_module_requirements(
        &self,
        module_id: Uuid,
    ) -> Result<Vec<BadgeRequirement>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM badge_requirements WHERE module_id = ?1 ORDER BY display_order ASC",
            REQUIREMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![module_id.to_string()], parse_requirement_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Set a requirement's display order.
    pub fn set_requirement_order(&self, id: Uuid, order: u32) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE badge_requirements SET display_order = ?2 WHERE id = ?1",
            params![id.to_string(), order],
        )?;
        Ok(())
    }

    /// Load a badge together with its module and requirement tree.
    pub fn load_structure(&self, badge_id: Uuid) -> Result<Option<BadgeStructure>, DatabaseError> {
        let Some(badge) = self.get_badge(badge_id)? else {
            return Ok(None);
        };

        let mut modules = Vec::new();
        for module in self.list_modules(badge_id)? {
            let requirements = self.list_module_requirements(module.id)?;
            modules.push(ModuleStructure {
                module,
                requirements,
            });
        }

        Ok(Some(BadgeStructure { badge, modules }))
    }
}

/// Parse a database row into a BadgeDefinition.
fn parse_badge_row(row: &Row<'_>) -> rusqlite::Result<BadgeDefinition> {
    Ok(BadgeDefinition {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        section: get_enum(row, 2, "badge section", BadgeSection::from_str)?,
        category: get_enum(row, 3, "badge category", BadgeCategory::from_str)?,
        completion_rule: get_enum(row, 4, "badge completion rule", BadgeCompletionRule::from_str)?,
        badge_family_id: row.get(5)?,
        stage_number: row.get(6)?,
        is_chief_scout_award: row.get(7)?,
        image_url: row.get(8)?,
        active: row.get(9)?,
        created_at: get_timestamp(row, 10)?,
    })
}

/// Parse a database row into a BadgeModule.
fn parse_module_row(row: &Row<'_>) -> rusqlite::Result<BadgeModule> {
    Ok(BadgeModule {
        id: get_uuid(row, 0)?,
        badge_id: get_uuid(row, 1)?,
        name: row.get(2)?,
        completion_rule: get_enum(
            row,
            3,
            "module completion rule",
            ModuleCompletionRule::from_str,
        )?,
        required_count: row.get(4)?,
        order: row.get(5)?,
    })
}

/// Parse a database row into a BadgeRequirement.
fn parse_requirement_row(row: &Row<'_>) -> rusqlite::Result<BadgeRequirement> {
    Ok(BadgeRequirement {
        id: get_uuid(row, 0)?,
        module_id: get_uuid(row, 1)?,
        badge_id: get_uuid(row, 2)?,
        text: row.get(3)?,
        required_completions: row.get(4)?,
        order: row.get(5)?,
    })
}
