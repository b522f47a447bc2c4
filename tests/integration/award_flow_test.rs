//! Integration tests for handing over awards against badge stock.

use scoutbadge::badges::{
    AwardStatus, BadgeCategory, BadgeCompletionRule, BadgeDefinition, BadgeSection,
};
use scoutbadge::storage::StockStore;
use scoutbadge::{
    AppConfig, AwardManager, BadgeCatalog, BadgeError, Database, LeaderAccount, Member,
    MemberManager, ProgressManager, Role, Section, StockManager,
};
use uuid::Uuid;

fn leader() -> LeaderAccount {
    LeaderAccount::new("akela@example.org", "Akela", Role::Leader)
}

fn admin() -> LeaderAccount {
    LeaderAccount::new("gsl@example.org", "Group Scout Leader", Role::Admin)
}

/// Completes `badge` by hand for `count` new Cubs and returns the award ids.
fn pending_awards(
    db: &Database,
    config: &AppConfig,
    badge: &BadgeDefinition,
    count: usize,
) -> Vec<Uuid> {
    let members = MemberManager::new(db.connection(), config);
    let progress = ProgressManager::new(db.connection(), config);
    (0..count)
        .map(|i| {
            let member = Member::new("Cub", &format!("No{}", i), Section::Cubs);
            members.create(&member).unwrap();
            progress
                .mark_badge_complete(member.id, badge.id, &leader())
                .unwrap()
                .unwrap()
                .id
        })
        .collect()
}

fn manual_badge(db: &Database, name: &str) -> BadgeDefinition {
    let badge = BadgeDefinition::new(name, BadgeSection::All, BadgeCategory::Activity)
        .with_rule(BadgeCompletionRule::Manual);
    BadgeCatalog::new(db.connection()).create_badge(&badge).unwrap();
    badge
}

fn level(db: &Database, badge: &BadgeDefinition) -> i64 {
    StockStore::new(db.connection())
        .get_stock(badge.id)
        .unwrap()
        .map(|s| s.current_stock)
        .unwrap_or(0)
}

#[test]
fn test_award_with_enough_stock() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    let badge = manual_badge(&db, "Chef");
    StockManager::new(db.connection(), &config)
        .adjust(badge.id, 4, "delivery", &leader())
        .unwrap();
    let ids = pending_awards(&db, &config, &badge, 3);

    let awarded = AwardManager::new(db.connection(), &config)
        .award(&ids, &leader(), false)
        .unwrap();
    assert!(awarded.iter().all(|a| a.award_status == AwardStatus::Awarded));
    assert!(awarded.iter().all(|a| a.awarded_by.as_deref() == Some("Akela")));
    assert_eq!(level(&db, &badge), 1);

    let history = StockManager::new(db.connection(), &config)
        .history(badge.id)
        .unwrap();
    assert_eq!(history.iter().filter(|h| h.delta == -1).count(), 3);
}

#[test]
fn test_shortfall_on_one_badge_blocks_the_batch() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    let stocked = manual_badge(&db, "Athletics");
    let empty = manual_badge(&db, "Book Reader");
    StockManager::new(db.connection(), &config)
        .adjust(stocked.id, 5, "delivery", &leader())
        .unwrap();

    let mut ids = pending_awards(&db, &config, &stocked, 2);
    ids.extend(pending_awards(&db, &config, &empty, 1));

    let err = AwardManager::new(db.connection(), &config)
        .award(&ids, &leader(), false)
        .unwrap_err();
    match err {
        BadgeError::InsufficientStock { shortfalls } => {
            assert_eq!(shortfalls.len(), 1);
            assert_eq!(shortfalls[0].badge_name, "Book Reader");
            assert_eq!(shortfalls[0].shortfall, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    // nothing from the batch was applied
    assert_eq!(level(&db, &stocked), 5);
    assert_eq!(
        AwardManager::new(db.connection(), &config)
            .pending_awards()
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn test_admin_override_goes_negative() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    let badge = manual_badge(&db, "Scientist");
    let ids = pending_awards(&db, &config, &badge, 2);
    let manager = AwardManager::new(db.connection(), &config);

    assert!(matches!(
        manager.award(&ids, &admin(), false),
        Err(BadgeError::InsufficientStock { .. })
    ));
    assert_eq!(level(&db, &badge), 0);

    manager.award(&ids, &admin(), true).unwrap();
    assert_eq!(level(&db, &badge), -2);

    let low = StockManager::new(db.connection(), &config)
        .low_stock_report()
        .unwrap();
    assert_eq!(low[0].badge_name, "Scientist");
}

#[test]
fn test_unknown_award_rejects_whole_batch() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    let badge = manual_badge(&db, "Swimmer");
    StockManager::new(db.connection(), &config)
        .adjust(badge.id, 10, "delivery", &leader())
        .unwrap();
    let mut ids = pending_awards(&db, &config, &badge, 2);
    ids.push(Uuid::new_v4());

    assert!(matches!(
        AwardManager::new(db.connection(), &config).award(&ids, &leader(), false),
        Err(BadgeError::NotFound(_))
    ));
    assert_eq!(level(&db, &badge), 10);
}
