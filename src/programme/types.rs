//! Programme types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::members::Section;

/// A section's term, inclusive of both dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: Uuid,
    pub section: Section,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Term {
    pub fn new(section: Section, title: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            section,
            title: title.trim().to_string(),
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
