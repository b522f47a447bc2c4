//! Chief Scout Award eligibility.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use super::types::{BadgeCategory, BadgeDefinition};

/// A member's standing against the Chief Scout Award criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChiefScoutStatus {
    pub challenge_completed: u32,
    pub challenge_total: u32,
    pub activity_completed: u32,
    pub activity_required: u32,
    pub eligible: bool,
}

impl ChiefScoutStatus {
    /// Challenge badges still outstanding.
    pub fn challenges_remaining(&self) -> u32 {
        self.challenge_total.saturating_sub(self.challenge_completed)
    }

    /// Activity or staged badges still needed.
    pub fn activities_remaining(&self) -> u32 {
        self.activity_required.saturating_sub(self.activity_completed)
    }
}

/// Assess eligibility from the badges offered to the member's section and
/// the set of badge ids the member has completed.
///
/// A section with no challenge badges defined is never eligible.
pub fn assess(
    section_badges: &[BadgeDefinition],
    completed: &HashSet<Uuid>,
    activity_required: u32,
) -> ChiefScoutStatus {
    let mut challenge_total = 0;
    let mut challenge_completed = 0;
    let mut activity_completed = 0;

    for badge in section_badges.iter().filter(|b| !b.is_chief_scout_award) {
        let done = completed.contains(&badge.id);
        match badge.category {
            BadgeCategory::Challenge => {
                challenge_total += 1;
                if done {
                    challenge_completed += 1;
                }
            }
            BadgeCategory::Activity | BadgeCategory::Staged if done => activity_completed += 1,
            _ => {}
        }
    }

    ChiefScoutStatus {
        challenge_completed,
        challenge_total,
        activity_completed,
        activity_required,
        eligible: challenge_total > 0
            && challenge_completed == challenge_total
            && activity_completed >= activity_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::types::BadgeSection;
    use crate::members::Section;

    fn badges(challenges: usize, activities: usize) -> Vec<BadgeDefinition> {
        let section = BadgeSection::Only(Section::Scouts);
        let mut all: Vec<_> = (0..challenges)
            .map(|i| {
                BadgeDefinition::new(
                    &format!("Challenge {}", i),
                    section,
                    BadgeCategory::Challenge,
                )
            })
            .chain((0..activities).map(|i| {
                BadgeDefinition::new(&format!("Activity {}", i), section, BadgeCategory::Activity)
            }))
            .collect();
        all.push(
            BadgeDefinition::new("Chief Scout's Gold Award", section, BadgeCategory::Challenge)
                .chief_scout_award(),
        );
        all
    }

    #[test]
    fn test_eligible_when_all_criteria_met() {
        let badges = badges(3, 8);
        let completed: HashSet<Uuid> = badges
            .iter()
            .filter(|b| !b.is_chief_scout_award)
            .take(3 + 6)
            .map(|b| b.id)
            .collect();

        let status = assess(&badges, &completed, 6);
        assert_eq!(status.challenge_total, 3);
        assert_eq!(status.activity_completed, 6);
        assert!(status.eligible);
    }

    #[test]
    fn test_missing_challenge_blocks_award() {
        let badges = badges(3, 8);
        let completed: HashSet<Uuid> = badges[1..].iter().map(|b| b.id).collect();

        let status = assess(&badges, &completed, 6);
        assert!(!status.eligible);
        assert_eq!(status.challenges_remaining(), 1);
    }

    #[test]
    fn test_not_enough_activities() {
        let badges = badges(2, 8);
        let completed: HashSet<Uuid> = badges.iter().take(2 + 5).map(|b| b.id).collect();

        let status = assess(&badges, &completed, 6);
        assert!(!status.eligible);
        assert_eq!(status.activities_remaining(), 1);
    }

    #[test]
    fn test_no_challenges_defined() {
        let badges = badges(0, 8);
        let completed: HashSet<Uuid> = badges.iter().map(|b| b.id).collect();
        assert!(!assess(&badges, &completed, 6).eligible);
    }
}
