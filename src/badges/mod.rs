//! Badge progress engine.
//!
//! Evaluates requirement, module and badge completion for members, keeps the
//! cached badge status in step with requirement progress, creates pending
//! awards, and ties awarding to badge stock.

pub mod awards;
pub mod catalog;
pub mod chief_scout;
pub mod deficit;
pub mod evaluator;
pub mod progress;
pub mod staged;
pub mod stock;
pub mod types;

use crate::storage::DatabaseError;

pub use awards::{AwardManager, StockShortfall};
pub use catalog::BadgeCatalog;
pub use chief_scout::ChiefScoutStatus;
pub use deficit::{LowStock, StockDeficit};
pub use evaluator::{BadgeEvaluation, ModuleEvaluation};
pub use progress::{
    BadgeSummary, BadgeUpdate, ProgressManager, RequirementUpdate, StatusTransition,
};
pub use staged::StageAward;
pub use stock::StockManager;
pub use types::*;

/// Badge engine errors.
#[derive(Debug, thiserror::Error)]
pub enum BadgeError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient stock: {}", awards::describe_shortfalls(.shortfalls))]
    InsufficientStock { shortfalls: Vec<StockShortfall> },

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorised: {0}")]
    Unauthorized(String),
}
