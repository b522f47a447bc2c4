//! ScoutBadge - Badge Progress Tracking for Scout Groups
//!
//! Tracks youth members' progress through badge requirements, keeps the
//! cached badge status consistent with that progress, creates awards on
//! completion and manages the physical badge stock they draw on.

pub mod accounts;
pub mod badges;
pub mod members;
pub mod programme;
pub mod storage;

// Re-export commonly used types
pub use accounts::{AccountManager, LeaderAccount, Role};
pub use badges::{AwardManager, BadgeCatalog, BadgeError, ProgressManager, StockManager};
pub use members::{Member, MemberManager, Section};
pub use programme::TermManager;
pub use storage::config::AppConfig;
pub use storage::Database;
