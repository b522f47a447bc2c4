//! Youth members module.
//!
//! Manages the members whose badge progress is tracked:
//! - Member records grouped by section (Squirrels through Explorers)
//! - Archiving and restoring members who leave
//! - Nights away and hikes away counters that drive staged badges

pub mod manager;
pub mod types;

// Re-exports for convenience
pub use manager::{MemberError, MemberManager};
pub use types::{Member, Section};
