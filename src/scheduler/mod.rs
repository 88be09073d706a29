//! Spaced-repetition scheduling engine.
//!
//! Given a card's memory state and a graded review, computes the card's next
//! difficulty and stability and the moment it is due again.
//!
//! Core formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^DECAY
//! - Interval: t = S / FACTOR * (R_target^(1/DECAY) - 1)
//!
//! Everything here is pure computation over values. Callers own persistence
//! and must serialize read-review-write sequences for the same card.

pub mod algorithm;
pub mod candidates;
pub mod card;
pub mod engine;
pub mod params;
pub mod request;

use thiserror::Error;

pub use candidates::{GradeMap, SchedulingCards, SchedulingInfo};
pub use card::{Card, Grade, ReviewLog, Stage};
pub use engine::{ReviewContext, Scheduler};
pub use params::Parameters;
pub use request::{ensure_utc, parse_review_time, ReviewRequest, ReviewResponse};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("invalid weight: {0} (must be finite and > 0)")]
    InvalidWeight(f64),
    #[error("invalid grade: {0}")]
    InvalidGrade(String),
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("invalid card: {0}")]
    InvalidCard(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
