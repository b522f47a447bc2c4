//! Integration tests for the stock shopping list forecast.

use chrono::NaiveDate;
use scoutbadge::badges::{
    BadgeCategory, BadgeDefinition, BadgeModule, BadgeRequirement, BadgeSection,
};
use scoutbadge::programme::Term;
use scoutbadge::{
    AppConfig, BadgeCatalog, Database, LeaderAccount, Member, MemberManager, ProgressManager, Role,
    Section, StockManager, TermManager,
};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

/// A badge with one requirement needing two completions, so one tick leaves
/// a member in progress.
fn two_step_badge(catalog: &BadgeCatalog, name: &str) -> (BadgeDefinition, BadgeRequirement) {
    let badge = BadgeDefinition::new(name, BadgeSection::All, BadgeCategory::Activity);
    catalog.create_badge(&badge).unwrap();
    let module = BadgeModule::new(badge.id, "Main", 1);
    catalog.add_module(&module).unwrap();
    let req = BadgeRequirement::new(&module, "Practise", 1).times(2);
    catalog.add_requirement(&req).unwrap();
    (badge, req)
}

#[test]
fn test_shopping_list_counts_scheduled_in_progress() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    let catalog = BadgeCatalog::new(db.connection());
    let (scheduled, scheduled_req) = two_step_badge(&catalog, "Navigator");
    let (unscheduled, unscheduled_req) = two_step_badge(&catalog, "Photographer");

    let terms = TermManager::new(db.connection());
    let term = Term::new(Section::Scouts, "Autumn", date(9, 1), date(12, 15));
    terms.create_term(&term).unwrap();
    terms.schedule_badge(term.id, scheduled.id).unwrap();

    let members = MemberManager::new(db.connection(), &config);
    let progress = ProgressManager::new(db.connection(), &config);
    for i in 0..3 {
        let member = Member::new("Scout", &format!("No{}", i), Section::Scouts);
        members.create(&member).unwrap();
        progress.increment_requirement(member.id, scheduled_req.id).unwrap();
        progress.increment_requirement(member.id, unscheduled_req.id).unwrap();
    }

    let stock = StockManager::new(db.connection(), &config);
    let leader = LeaderAccount::new("skip@example.org", "Skip", Role::Leader);
    stock.adjust(scheduled.id, 1, "left over", &leader).unwrap();

    let list = stock.shopping_list(date(10, 1)).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].badge_id, scheduled.id);
    assert_eq!(list[0].needed, 3);
    assert_eq!(list[0].deficit, 2);
    assert!(list.iter().all(|d| d.badge_id != unscheduled.id));

    // outside the term only pending awards count, and there are none
    assert!(stock.shopping_list(date(1, 10)).unwrap().is_empty());
    assert!(stock.pending_deficits().unwrap().is_empty());
}

#[test]
fn test_archived_members_not_forecast() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    let catalog = BadgeCatalog::new(db.connection());
    let (badge, req) = two_step_badge(&catalog, "Cyclist");

    let terms = TermManager::new(db.connection());
    let term = Term::new(Section::Cubs, "Spring", date(1, 5), date(3, 31));
    terms.create_term(&term).unwrap();
    terms.schedule_badge(term.id, badge.id).unwrap();

    let members = MemberManager::new(db.connection(), &config);
    let member = Member::new("Cub", "Leaver", Section::Cubs);
    members.create(&member).unwrap();
    ProgressManager::new(db.connection(), &config)
        .increment_requirement(member.id, req.id)
        .unwrap();
    members.archive(member.id).unwrap();

    let list = StockManager::new(db.connection(), &config)
        .shopping_list(date(2, 1))
        .unwrap();
    assert!(list.is_empty());
}

#[test]
fn test_regressed_member_with_pending_award_counted_once() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    let catalog = BadgeCatalog::new(db.connection());
    let badge = BadgeDefinition::new("Explorer", BadgeSection::All, BadgeCategory::Activity);
    catalog.create_badge(&badge).unwrap();
    let module = BadgeModule::new(badge.id, "Main", 1);
    catalog.add_module(&module).unwrap();
    let req = BadgeRequirement::new(&module, "Explore", 1);
    catalog.add_requirement(&req).unwrap();

    let terms = TermManager::new(db.connection());
    let term = Term::new(Section::Beavers, "Autumn", date(9, 1), date(12, 15));
    terms.create_term(&term).unwrap();
    terms.schedule_badge(term.id, badge.id).unwrap();

    let member = Member::new("Beaver", "Busy", Section::Beavers);
    MemberManager::new(db.connection(), &config).create(&member).unwrap();
    let progress = ProgressManager::new(db.connection(), &config);
    progress.toggle_requirement(member.id, req.id).unwrap();
    progress.toggle_requirement(member.id, req.id).unwrap();

    let list = StockManager::new(db.connection(), &config)
        .shopping_list(date(10, 1))
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].needed, 1);
    assert_eq!(list[0].deficit, 1);
}

#[test]
fn test_other_sections_term_not_forecast() {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();
    let catalog = BadgeCatalog::new(db.connection());
    let (badge, req) = two_step_badge(&catalog, "Astronomer");

    let terms = TermManager::new(db.connection());
    let term = Term::new(Section::Beavers, "Autumn", date(9, 1), date(12, 15));
    terms.create_term(&term).unwrap();
    terms.schedule_badge(term.id, badge.id).unwrap();

    let members = MemberManager::new(db.connection(), &config);
    let progress = ProgressManager::new(db.connection(), &config);
    let beaver = Member::new("Beaver", "Keen", Section::Beavers);
    let scout = Member::new("Scout", "Keen", Section::Scouts);
    for member in [&beaver, &scout] {
        members.create(member).unwrap();
        progress.increment_requirement(member.id, req.id).unwrap();
    }

    let list = StockManager::new(db.connection(), &config)
        .shopping_list(date(10, 1))
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].needed, 1);
}
