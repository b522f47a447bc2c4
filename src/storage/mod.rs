//! Storage module for database and configuration.

pub mod award_store;
pub mod badge_store;
pub mod config;
pub mod database;
pub mod member_store;
pub mod programme_store;
pub mod progress_store;
pub mod schema;
pub mod stock_store;

pub use award_store::AwardStore;
pub use badge_store::BadgeStore;
pub use config::{AppConfig, ConfigError, RegressionPolicy, StagedCounter, StagedFamily};
pub use database::{begin_immediate, Database, DatabaseError};
pub use member_store::MemberStore;
pub use programme_store::ProgrammeStore;
pub use progress_store::ProgressStore;
pub use stock_store::StockStore;
