//! Member and section type definitions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Age section a member belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Squirrels,
    Beavers,
    Cubs,
    Scouts,
    Explorers,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Squirrels,
        Section::Beavers,
        Section::Cubs,
        Section::Scouts,
        Section::Explorers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Squirrels => "squirrels",
            Section::Beavers => "beavers",
            Section::Cubs => "cubs",
            Section::Scouts => "scouts",
            Section::Explorers => "explorers",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "squirrels" => Some(Section::Squirrels),
            "beavers" => Some(Section::Beavers),
            "cubs" => Some(Section::Cubs),
            "scouts" => Some(Section::Scouts),
            "explorers" => Some(Section::Explorers),
            _ => None,
        }
    }

    /// Human-readable section name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Section::Squirrels => "Squirrels",
            Section::Beavers => "Beavers",
            Section::Cubs => "Cubs",
            Section::Scouts => "Scouts",
            Section::Explorers => "Explorers",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A young person enrolled in a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Owning section
    pub section: Section,
    pub date_of_birth: Option<NaiveDate>,
    /// Cumulative nights away from home on Scout activities
    pub total_nights_away: u32,
    /// Cumulative hikes away
    pub total_hikes_away: u32,
    /// False once archived
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Create a new active member with zeroed counters.
    pub fn new(first_name: &str, last_name: &str, section: Section) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            section,
            date_of_birth: None,
            total_nights_away: 0,
            total_hikes_away: 0,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Age in whole years on the given date.
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        self.date_of_birth.and_then(|dob| date.years_since(dob))
    }
}
