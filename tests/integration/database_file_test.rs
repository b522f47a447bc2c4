//! Integration tests for the on-disk database and configuration files.

use scoutbadge::storage::config::{load_config_from, save_config_to};
use scoutbadge::storage::RegressionPolicy;
use scoutbadge::{AppConfig, Database, Member, MemberManager, Section};
use tempfile::TempDir;

#[test]
fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let member = Member::new("Persistent", "Pat", Section::Squirrels);

    {
        let db = Database::open(&config.database_path()).unwrap();
        MemberManager::new(db.connection(), &config)
            .create(&member)
            .unwrap();
    }

    let db = Database::open(&config.database_path()).unwrap();
    let loaded = MemberManager::new(db.connection(), &config)
        .get(member.id)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.full_name(), "Persistent Pat");
    assert_eq!(loaded.section, Section::Squirrels);
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = AppConfig::default();
    config.badges.regression_policy = RegressionPolicy::RetractPendingAward;
    config.chief_scout.activity_badges_required = 4;
    save_config_to(&config, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("retract_pending_award"));

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded.chief_scout.activity_badges_required, 4);
    assert_eq!(loaded.database_path(), dir.path().join("scoutbadge.db"));
}
