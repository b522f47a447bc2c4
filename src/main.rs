//! ScoutBadge - Badge Progress Tracking for Scout Groups
//!
//! Maintenance entry point: brings every active member's badge records up to
//! date and prints the badges that need ordering.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scoutbadge::storage::config::{get_config_path, load_config, save_config};
use scoutbadge::{BadgeCatalog, Database, MemberManager, ProgressManager, StockManager};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ScoutBadge v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("loading configuration")?;
    if !get_config_path().exists() {
        save_config(&config).context("writing default configuration")?;
        tracing::info!("Wrote default configuration to {}", get_config_path().display());
    }

    let db = Database::open(&config.database_path())
        .with_context(|| format!("opening {}", config.database_path().display()))?;
    let conn = db.connection();

    BadgeCatalog::new(conn).ensure_staged_families(&config)?;

    let progress = ProgressManager::new(conn, &config);
    let members = MemberManager::new(conn, &config).list(None, false)?;
    let mut changed = 0;
    for member in &members {
        let updates = progress.reconcile_member(member.id)?;
        changed += updates.iter().filter(|u| u.transition.is_some()).count();

        let stages = progress.check_staged_badges(member.id)?;
        changed += stages.len();
    }
    tracing::info!(
        "Reconciled {} members, {} badge records changed",
        members.len(),
        changed
    );

    let today = chrono::Local::now().date_naive();
    let shopping_list = StockManager::new(conn, &config).shopping_list(today)?;
    println!("{}", serde_json::to_string_pretty(&shopping_list)?);

    Ok(())
}
