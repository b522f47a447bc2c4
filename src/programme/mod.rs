//! Term programme module.
//!
//! Terms group a section's meetings between two dates. Badges scheduled in
//! a running term feed the stock forecast.

pub mod manager;
pub mod types;

// Re-exports for convenience
pub use manager::{ProgrammeError, TermManager};
pub use types::Term;
