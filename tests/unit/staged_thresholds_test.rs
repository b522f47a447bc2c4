//! Unit tests for staged family thresholds.

use scoutbadge::badges::staged::{counter_value, next_threshold, reached_thresholds};
use scoutbadge::storage::StagedCounter;
use scoutbadge::{AppConfig, Member, Section};

#[test]
fn test_default_nights_away_thresholds() {
    let config = AppConfig::default();
    let family = config.staged_family("nights_away").unwrap();

    assert_eq!(reached_thresholds(&family.thresholds, 0), Vec::<u32>::new());
    assert_eq!(reached_thresholds(&family.thresholds, 12), vec![1, 5, 10]);
    assert_eq!(next_threshold(&family.thresholds, 12), Some(20));
    assert_eq!(reached_thresholds(&family.thresholds, 500).len(), 12);
    assert_eq!(next_threshold(&family.thresholds, 200), None);
}

#[test]
fn test_default_hikes_away_thresholds() {
    let config = AppConfig::default();
    let family = config.staged_family("hikes_away").unwrap();
    assert_eq!(family.counter, StagedCounter::HikesAway);
    assert_eq!(reached_thresholds(&family.thresholds, 35), vec![1, 5, 10, 20, 35]);
}

#[test]
fn test_counter_value_reads_matching_field() {
    let mut member = Member::new("Ray", "Mears", Section::Explorers);
    member.total_nights_away = 40;
    member.total_hikes_away = 3;

    assert_eq!(counter_value(&member, StagedCounter::NightsAway), 40);
    assert_eq!(counter_value(&member, StagedCounter::HikesAway), 3);
}
