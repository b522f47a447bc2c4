//! Unit tests for stock deficit derivation.

use std::collections::HashMap;

use chrono::Utc;
use scoutbadge::badges::deficit::{derive_deficits, forecast_demand, pending_demand};
use scoutbadge::badges::{
    BadgeCategory, BadgeDefinition, BadgeSection, BadgeStock, MemberBadgeAward,
};
use uuid::Uuid;

fn badge(name: &str) -> BadgeDefinition {
    BadgeDefinition::new(name, BadgeSection::All, BadgeCategory::Activity)
}

fn stock(badge: &BadgeDefinition, level: i64) -> BadgeStock {
    BadgeStock {
        badge_id: badge.id,
        current_stock: level,
        minimum_threshold: 0,
        updated_at: Utc::now(),
    }
}

#[test]
fn test_five_pending_against_two_in_stock() {
    let swimmer = badge("Swimmer");
    let awards: Vec<_> = (0..5)
        .map(|_| MemberBadgeAward::pending(Uuid::new_v4(), swimmer.id))
        .collect();

    let deficits = derive_deficits(
        &[swimmer.clone()],
        &pending_demand(&awards),
        &[stock(&swimmer, 2)],
    );
    assert_eq!(deficits.len(), 1);
    assert_eq!(deficits[0].badge_name, "Swimmer");
    assert_eq!(deficits[0].deficit, 3);
}

#[test]
fn test_negative_stock_deepens_deficit() {
    let cyclist = badge("Cyclist");
    let mut demand = HashMap::new();
    demand.insert(cyclist.id, 1);

    let deficits = derive_deficits(&[cyclist.clone()], &demand, &[stock(&cyclist, -2)]);
    assert_eq!(deficits[0].deficit, 3);
}

#[test]
fn test_forecast_feeds_deficits() {
    let writer = badge("Writer");
    let mut in_progress = HashMap::new();
    in_progress.insert(writer.id, 6);

    let demand = forecast_demand(&HashMap::new(), &in_progress);
    let deficits = derive_deficits(&[writer.clone()], &demand, &[stock(&writer, 4)]);
    assert_eq!(deficits[0].needed, 6);
    assert_eq!(deficits[0].deficit, 2);
}

#[test]
fn test_no_demand_no_deficit() {
    let musician = badge("Musician");
    assert!(derive_deficits(&[musician], &HashMap::new(), &[]).is_empty());
}
