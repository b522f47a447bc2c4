//! Integration tests for staged badges driven by member counters.

use scoutbadge::badges::ProgressStatus;
use scoutbadge::storage::{AwardStore, BadgeStore, ProgressStore};
use scoutbadge::{
    AppConfig, BadgeCatalog, Database, Member, MemberManager, ProgressManager, Section,
};

#[test]
fn test_nights_away_stages_awarded_once() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    BadgeCatalog::new(db.connection())
        .ensure_staged_families(&config)
        .unwrap();

    let members = MemberManager::new(db.connection(), &config);
    let member = Member::new("Camp", "Fire", Section::Scouts);
    members.create(&member).unwrap();

    let (_, stages) = members.record_nights_away(member.id, 3).unwrap();
    assert_eq!(stages.len(), 1);
    let (_, stages) = members.record_nights_away(member.id, 4).unwrap();
    let reached: Vec<u32> = stages.iter().map(|s| s.threshold).collect();
    assert_eq!(reached, vec![5]);

    // maintenance pass finds nothing new
    let progress = ProgressManager::new(db.connection(), &config);
    assert!(progress.check_staged_badges(member.id).unwrap().is_empty());

    let awards = AwardStore::new(db.connection())
        .list_member_awards(member.id)
        .unwrap();
    assert_eq!(awards.len(), 2);

    let stage_five = BadgeStore::new(db.connection())
        .list_family("nights_away")
        .unwrap()
        .into_iter()
        .find(|b| b.stage_number == Some(5))
        .unwrap();
    let cached = ProgressStore::new(db.connection())
        .get_badge_progress(member.id, stage_five.id)
        .unwrap()
        .unwrap();
    assert_eq!(cached.status, ProgressStatus::Completed);
}

#[test]
fn test_hikes_and_nights_are_independent() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    BadgeCatalog::new(db.connection())
        .ensure_staged_families(&config)
        .unwrap();

    let members = MemberManager::new(db.connection(), &config);
    let member = Member::new("Trail", "Walker", Section::Explorers);
    members.create(&member).unwrap();

    let (updated, stages) = members.record_hikes_away(member.id, 10).unwrap();
    assert_eq!(updated.total_hikes_away, 10);
    assert_eq!(updated.total_nights_away, 0);
    assert!(stages.iter().all(|s| s.family_id == "hikes_away"));
    assert_eq!(stages.len(), 3);
}
