//! Integration tests for requirement progress through to pending awards.
//!
//! Covers the full path: leader ticks requirements, the badge completes, the
//! cached rollup follows, and exactly one pending award appears.

use scoutbadge::badges::{
    AwardStatus, BadgeCategory, BadgeDefinition, BadgeModule, BadgeRequirement, BadgeSection,
    ProgressStatus, StatusTransition,
};
use scoutbadge::storage::{AwardStore, ProgressStore, RegressionPolicy};
use scoutbadge::{
    AppConfig, BadgeCatalog, Database, Member, MemberManager, ProgressManager, Section,
};

struct Troop {
    db: Database,
    config: AppConfig,
    member: Member,
    badge: BadgeDefinition,
    requirements: Vec<BadgeRequirement>,
}

/// One member and a single-module badge with three one-off requirements.
fn troop() -> Troop {
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig::default();

    let member = Member::new("Tiger", "Lily", Section::Beavers);
    MemberManager::new(db.connection(), &config).create(&member).unwrap();

    let catalog = BadgeCatalog::new(db.connection());
    let badge = BadgeDefinition::new("Explore", BadgeSection::All, BadgeCategory::Activity);
    catalog.create_badge(&badge).unwrap();
    let module = BadgeModule::new(badge.id, "Explore", 1);
    catalog.add_module(&module).unwrap();
    let requirements: Vec<_> = ["Visit a park", "Find five leaves", "Draw a map"]
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let req = BadgeRequirement::new(&module, text, i as u32 + 1);
            catalog.add_requirement(&req).unwrap();
            req
        })
        .collect();

    Troop {
        db,
        config,
        member,
        badge,
        requirements,
    }
}

fn awards_for(troop: &Troop) -> usize {
    AwardStore::new(troop.db.connection())
        .list_member_awards(troop.member.id)
        .unwrap()
        .len()
}

#[test]
fn test_third_requirement_completes_badge() {
    let troop = troop();
    let manager = ProgressManager::new(troop.db.connection(), &troop.config);

    manager
        .increment_requirement(troop.member.id, troop.requirements[0].id)
        .unwrap();
    let second = manager
        .increment_requirement(troop.member.id, troop.requirements[1].id)
        .unwrap();
    assert!(!second.badge.evaluation.computed_complete);
    assert_eq!(
        second.badge.evaluation.cached_status,
        Some(ProgressStatus::InProgress)
    );
    assert_eq!(awards_for(&troop), 0);

    let third = manager
        .increment_requirement(troop.member.id, troop.requirements[2].id)
        .unwrap();
    assert_eq!(third.badge.transition, Some(StatusTransition::Completed));
    let award = third.badge.award_created.unwrap();
    assert_eq!(award.award_status, AwardStatus::Pending);
    assert_eq!(awards_for(&troop), 1);

    let cached = ProgressStore::new(troop.db.connection())
        .get_badge_progress(troop.member.id, troop.badge.id)
        .unwrap()
        .unwrap();
    assert_eq!(cached.status, ProgressStatus::Completed);
    assert!(cached.completion_date.is_some());
}

#[test]
fn test_reconcile_twice_is_noop() {
    let troop = troop();
    let manager = ProgressManager::new(troop.db.connection(), &troop.config);
    for req in &troop.requirements {
        manager.increment_requirement(troop.member.id, req.id).unwrap();
    }

    for _ in 0..2 {
        let update = manager.reconcile(troop.member.id, troop.badge.id).unwrap();
        assert!(update.transition.is_none());
        assert!(update.award_created.is_none());
    }
    assert_eq!(awards_for(&troop), 1);
}

#[test]
fn test_untick_after_award_keeps_awarded_record() {
    let mut troop = troop();
    troop.config.badges.regression_policy = RegressionPolicy::RetractPendingAward;
    let manager = ProgressManager::new(troop.db.connection(), &troop.config);
    for req in &troop.requirements {
        manager.increment_requirement(troop.member.id, req.id).unwrap();
    }

    let award = AwardStore::new(troop.db.connection())
        .find_award(troop.member.id, troop.badge.id)
        .unwrap()
        .unwrap();
    AwardStore::new(troop.db.connection())
        .mark_awarded(award.id, chrono::Utc::now(), "Rainbow")
        .unwrap();

    let update = manager
        .toggle_requirement(troop.member.id, troop.requirements[0].id)
        .unwrap();
    assert_eq!(update.badge.transition, Some(StatusTransition::Regressed));
    assert!(!update.badge.award_retracted);

    let kept = AwardStore::new(troop.db.connection())
        .get_award(award.id)
        .unwrap()
        .unwrap();
    assert_eq!(kept.award_status, AwardStatus::Awarded);
}

#[test]
fn test_badge_summaries() {
    let troop = troop();
    let manager = ProgressManager::new(troop.db.connection(), &troop.config);
    manager
        .increment_requirement(troop.member.id, troop.requirements[0].id)
        .unwrap();

    let summaries = manager.member_badge_summaries(troop.member.id).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].badge_name, "Explore");
    assert_eq!(summaries[0].status, ProgressStatus::InProgress);
    assert!((summaries[0].progress - 1.0 / 3.0).abs() < 1e-9);
    assert!(summaries[0].award_status.is_none());
}

#[test]
fn test_chief_scout_award_completed_once() {
    let db = Database::open_in_memory().unwrap();
    let mut config = AppConfig::default();
    config.chief_scout.activity_badges_required = 1;

    let member = Member::new("Robert", "Baden-Powell", Section::Scouts);
    MemberManager::new(db.connection(), &config).create(&member).unwrap();

    let catalog = BadgeCatalog::new(db.connection());
    let section = BadgeSection::Only(Section::Scouts);
    let challenge = BadgeDefinition::new("Expedition Challenge", section, BadgeCategory::Challenge)
        .with_rule(scoutbadge::badges::BadgeCompletionRule::Manual);
    let activity = BadgeDefinition::new("Camper", section, BadgeCategory::Activity)
        .with_rule(scoutbadge::badges::BadgeCompletionRule::Manual);
    let gold = BadgeDefinition::new("Chief Scout's Gold Award", section, BadgeCategory::Core)
        .chief_scout_award();
    for badge in [&challenge, &activity, &gold] {
        catalog.create_badge(badge).unwrap();
    }

    let leader =
        scoutbadge::LeaderAccount::new("skip@example.org", "Skip", scoutbadge::Role::Leader);
    let manager = ProgressManager::new(db.connection(), &config);

    let (status, award) = manager.check_chief_scout_award(member.id).unwrap();
    assert!(!status.eligible);
    assert!(award.is_none());

    manager.mark_badge_complete(member.id, challenge.id, &leader).unwrap();
    manager.mark_badge_complete(member.id, activity.id, &leader).unwrap();

    let (status, award) = manager.check_chief_scout_award(member.id).unwrap();
    assert!(status.eligible);
    assert_eq!(award.unwrap().badge_id, gold.id);

    let (_, again) = manager.check_chief_scout_award(member.id).unwrap();
    assert!(again.is_none());
}
