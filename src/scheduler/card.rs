use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_DIFFICULTY, MIN_DIFFICULTY, MIN_STABILITY};

use super::SchedulerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    New,
    Learning,
    Review,
    Relearning,
}

/// Learner-reported review outcome. The ordinal (1-4) feeds the formulas directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "GradeRepr")]
pub enum Grade {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn value(self) -> f64 {
        f64::from(self.ordinal())
    }

    /// Zero-based position, also the index of the grade's initial-stability weight.
    pub fn index(self) -> usize {
        usize::from(self.ordinal() - 1)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        };
        f.write_str(name)
    }
}

impl TryFrom<u8> for Grade {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Grade::Again),
            2 => Ok(Grade::Hard),
            3 => Ok(Grade::Good),
            4 => Ok(Grade::Easy),
            other => Err(SchedulerError::InvalidGrade(other.to_string())),
        }
    }
}

impl FromStr for Grade {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" | "1" => Ok(Grade::Again),
            "hard" | "2" => Ok(Grade::Hard),
            "good" | "3" => Ok(Grade::Good),
            "easy" | "4" => Ok(Grade::Easy),
            _ => Err(SchedulerError::InvalidGrade(s.to_string())),
        }
    }
}

// Grades arrive either as names ("good") or ordinals (3).
#[derive(Deserialize)]
#[serde(untagged)]
enum GradeRepr {
    Ordinal(u8),
    Name(String),
}

impl TryFrom<GradeRepr> for Grade {
    type Error = SchedulerError;

    fn try_from(repr: GradeRepr) -> Result<Self, Self::Error> {
        match repr {
            GradeRepr::Ordinal(n) => Grade::try_from(n),
            GradeRepr::Name(name) => name.parse(),
        }
    }
}

/// Per-item memory state.
///
/// Serializes to the persisted record shape
/// `{stage, difficulty, stability, elapsed_days, scheduled_days, reps, lapses, last_review, due}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(alias = "state")]
    pub stage: Stage,
    pub difficulty: f64,
    pub stability: f64,
    pub elapsed_days: u32,
    pub scheduled_days: u32,
    pub reps: u32,
    pub lapses: u32,
    pub last_review: Option<DateTime<Utc>>,
    pub due: DateTime<Utc>,
}

impl Default for Card {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Card {
    /// A never-reviewed card, due at `due`.
    pub fn new(due: DateTime<Utc>) -> Self {
        Self {
            stage: Stage::New,
            difficulty: 0.0,
            stability: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            last_review: None,
            due,
        }
    }

    pub fn is_new(&self) -> bool {
        self.stage == Stage::New
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }

    /// Checks the invariants a reviewed card must satisfy before it can be scheduled again.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.stage == Stage::New {
            return Ok(());
        }
        if self.last_review.is_none() {
            return Err(SchedulerError::InvalidCard(format!(
                "{:?} card has no last_review",
                self.stage
            )));
        }
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(SchedulerError::InvalidCard(format!(
                "difficulty {} outside [{MIN_DIFFICULTY},{MAX_DIFFICULTY}]",
                self.difficulty
            )));
        }
        if !(self.stability.is_finite() && self.stability >= MIN_STABILITY) {
            return Err(SchedulerError::InvalidCard(format!(
                "stability {} below {MIN_STABILITY}",
                self.stability
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SchedulerError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, SchedulerError> {
        let card: Card = serde_json::from_str(raw)?;
        card.validate()?;
        Ok(card)
    }
}

/// Immutable record of one review event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub grade: Grade,
    /// The card as it was before this review.
    pub card: Card,
    pub scheduled_days: u32,
    pub elapsed_days: u32,
    pub review: DateTime<Utc>,
    pub stage: Stage,
}
