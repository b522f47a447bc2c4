//! Badge catalogue management.
//!
//! Badges are built up as a tree: the badge, then its modules, then each
//! module's requirements. Requirements are usually added after the module,
//! so an x-of-n count larger than the requirement list is accepted here.

use rusqlite::Connection;
use uuid::Uuid;

use super::types::{
    BadgeCategory, BadgeCompletionRule, BadgeDefinition, BadgeModule, BadgeRequirement,
    BadgeSection, BadgeStructure, ModuleCompletionRule,
};
use super::BadgeError;
use crate::members::Section;
use crate::storage::{begin_immediate, AppConfig, BadgeStore, DatabaseError};

/// Badge catalogue.
pub struct BadgeCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> BadgeCatalog<'a> {
    /// Create a new catalogue over a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Add a badge definition.
    pub fn create_badge(&self, badge: &BadgeDefinition) -> Result<(), BadgeError> {
        validate_badge(badge)?;

        let store = BadgeStore::new(self.conn);
        if let (Some(family), Some(stage)) = (&badge.badge_family_id, badge.stage_number) {
            let taken = store
                .list_family(family)?
                .iter()
                .any(|b| b.stage_number == Some(stage));
            if taken {
                return Err(BadgeError::Duplicate(format!(
                    "{} already has a stage {}",
                    family, stage
                )));
            }
        }

        store.insert_badge(badge).map_err(|e| match e {
            DatabaseError::ConstraintViolation(msg) => BadgeError::Duplicate(msg),
            other => other.into(),
        })?;
        tracing::info!("Created badge {} ({})", badge.name, badge.id);
        Ok(())
    }

    /// Update a badge definition.
    pub fn update_badge(&self, badge: &BadgeDefinition) -> Result<(), BadgeError> {
        validate_badge(badge)?;
        if !BadgeStore::new(self.conn).update_badge(badge)? {
            return Err(BadgeError::NotFound(format!("badge {}", badge.id)));
        }
        Ok(())
    }

    /// Get a badge definition by ID.
    pub fn get_badge(&self, id: Uuid) -> Result<Option<BadgeDefinition>, BadgeError> {
        Ok(BadgeStore::new(self.conn).get_badge(id)?)
    }

    /// Active badges a section can earn, including badges open to all.
    pub fn list_for_section(&self, section: Section) -> Result<Vec<BadgeDefinition>, BadgeError> {
        Ok(BadgeStore::new(self.conn)
            .list_badges(false)?
            .into_iter()
            .filter(|b| b.section.includes(section))
            .collect())
    }

    /// Add a module to an existing badge.
    pub fn add_module(&self, module: &BadgeModule) -> Result<(), BadgeError> {
        if module.name.is_empty() {
            return Err(BadgeError::ValidationError(
                "Module name is required".to_string(),
            ));
        }
        if module.completion_rule == ModuleCompletionRule::XOfNRequired
            && module.required_count.unwrap_or(0) == 0
        {
            return Err(BadgeError::ValidationError(format!(
                "Module {} needs a required count of at least 1",
                module.name
            )));
        }

        let store = BadgeStore::new(self.conn);
        if store.get_badge(module.badge_id)?.is_none() {
            return Err(BadgeError::NotFound(format!("badge {}", module.badge_id)));
        }
        store.insert_module(module)?;
        Ok(())
    }

    /// Add a requirement to an existing module.
    pub fn add_requirement(&self, requirement: &BadgeRequirement) -> Result<(), BadgeError> {
        if requirement.text.is_empty() {
            return Err(BadgeError::ValidationError(
                "Requirement text is required".to_string(),
            ));
        }
        if requirement.required_completions < 1 {
            return Err(BadgeError::ValidationError(
                "A requirement must be completed at least once".to_string(),
            ));
        }

        let store = BadgeStore::new(self.conn);
        let module = store
            .get_module(requirement.module_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("module {}", requirement.module_id)))?;
        if module.badge_id != requirement.badge_id {
            return Err(BadgeError::ValidationError(format!(
                "Module {} does not belong to badge {}",
                module.id, requirement.badge_id
            )));
        }

        store.insert_requirement(requirement)?;
        Ok(())
    }

    /// Move a requirement to position `new_order` (1-based) within its
    /// module and renumber its siblings.
    ///
    /// Returns the module's requirements in their new order.
    pub fn move_requirement(
        &self,
        requirement_id: Uuid,
        new_order: u32,
    ) -> Result<Vec<BadgeRequirement>, BadgeError> {
        let tx = begin_immediate(self.conn)?;
        let store = BadgeStore::new(&tx);

        let requirement = store
            .get_requirement(requirement_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("requirement {}", requirement_id)))?;
        let mut siblings = store.list_module_requirements(requirement.module_id)?;

        let count = siblings.len() as u32;
        if new_order < 1 || new_order > count {
            return Err(BadgeError::ValidationError(format!(
                "Order {} is outside 1..={}",
                new_order, count
            )));
        }

        let Some(current) = siblings.iter().position(|r| r.id == requirement_id) else {
            return Err(BadgeError::NotFound(format!("requirement {}", requirement_id)));
        };
        let moved = siblings.remove(current);
        siblings.insert(new_order as usize - 1, moved);

        for (i, sibling) in siblings.iter_mut().enumerate() {
            let order = i as u32 + 1;
            if sibling.order != order {
                store.set_requirement_order(sibling.id, order)?;
                sibling.order = order;
            }
        }

        tx.commit().map_err(DatabaseError::from)?;
        Ok(siblings)
    }

    /// Load a badge with its modules and requirements.
    pub fn badge_structure(&self, badge_id: Uuid) -> Result<BadgeStructure, BadgeError> {
        BadgeStore::new(self.conn)
            .load_structure(badge_id)?
            .ok_or_else(|| BadgeError::NotFound(format!("badge {}", badge_id)))
    }

    /// Create a `Manual` stage badge for every configured threshold that has
    /// none yet. Returns the badges created.
    pub fn ensure_staged_families(
        &self,
        config: &AppConfig,
    ) -> Result<Vec<BadgeDefinition>, BadgeError> {
        let tx = begin_immediate(self.conn)?;
        let store = BadgeStore::new(&tx);
        let mut created = Vec::new();

        for family in &config.badges.staged_families {
            let existing = store.list_family(&family.family_id)?;
            for threshold in &family.thresholds {
                if existing.iter().any(|b| b.stage_number == Some(*threshold)) {
                    continue;
                }

                let badge = BadgeDefinition::new(
                    &format!("{} {}", family_title(&family.family_id), threshold),
                    BadgeSection::All,
                    BadgeCategory::Staged,
                )
                .with_rule(BadgeCompletionRule::Manual)
                .staged(&family.family_id, *threshold);
                store.insert_badge(&badge)?;
                created.push(badge);
            }
        }

        tx.commit().map_err(DatabaseError::from)?;
        if !created.is_empty() {
            tracing::info!("Seeded {} staged badges", created.len());
        }
        Ok(created)
    }
}

fn validate_badge(badge: &BadgeDefinition) -> Result<(), BadgeError> {
    if badge.name.trim().is_empty() {
        return Err(BadgeError::ValidationError(
            "Badge name is required".to_string(),
        ));
    }

    match (&badge.badge_family_id, badge.stage_number) {
        (Some(_), Some(0)) => Err(BadgeError::ValidationError(
            "Stage numbers start at 1".to_string(),
        )),
        (Some(_), None) | (None, Some(_)) => Err(BadgeError::ValidationError(
            "Staged badges need both a family and a stage number".to_string(),
        )),
        _ => Ok(()),
    }
}

/// "nights_away" -> "Nights Away"
fn family_title(family_id: &str) -> String {
    family_id
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
