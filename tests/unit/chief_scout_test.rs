//! Unit tests for Chief Scout Award eligibility.

use std::collections::HashSet;

use scoutbadge::badges::chief_scout::assess;
use scoutbadge::badges::{BadgeCategory, BadgeDefinition, BadgeSection};
use scoutbadge::Section;
use uuid::Uuid;

#[test]
fn test_staged_badges_count_towards_activities() {
    let section = BadgeSection::Only(Section::Cubs);
    let challenge = BadgeDefinition::new("Outdoors Challenge", section, BadgeCategory::Challenge);
    let staged = BadgeDefinition::new("Nights Away 1", BadgeSection::All, BadgeCategory::Staged)
        .staged("nights_away", 1);
    let activity = BadgeDefinition::new("Athletics", section, BadgeCategory::Activity);
    let core = BadgeDefinition::new("Membership", section, BadgeCategory::Core);

    let badges = vec![challenge.clone(), staged.clone(), activity.clone(), core.clone()];
    let completed: HashSet<Uuid> = [challenge.id, staged.id, activity.id, core.id]
        .into_iter()
        .collect();

    let status = assess(&badges, &completed, 2);
    assert_eq!(status.activity_completed, 2);
    assert!(status.eligible);

    let status = assess(&badges, &completed, 3);
    assert!(!status.eligible);
    assert_eq!(status.activities_remaining(), 1);
}
