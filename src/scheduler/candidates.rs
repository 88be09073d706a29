use std::ops::{Index, IndexMut};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::constants::{
    RELEARN_AGAIN_MINUTES, SECONDS_PER_DAY, SECONDS_PER_MINUTE, SHORT_TERM_HARD_MINUTES,
};

use super::card::{Card, Grade, ReviewLog, Stage};
use super::SchedulerError;

/// Fixed-size mapping with exactly one slot per grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeMap<T>([T; 4]);

impl<T> GradeMap<T> {
    pub fn from_fn(f: impl FnMut(Grade) -> T) -> Self {
        Self(Grade::ALL.map(f))
    }

    pub fn get(&self, grade: Grade) -> &T {
        &self.0[grade.index()]
    }

    pub fn get_mut(&mut self, grade: Grade) -> &mut T {
        &mut self.0[grade.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Grade, &T)> {
        Grade::ALL.into_iter().zip(self.0.iter())
    }

    /// Consumes the map, keeping only the entry for `grade`.
    pub fn take(self, grade: Grade) -> T {
        let [again, hard, good, easy] = self.0;
        match grade {
            Grade::Again => again,
            Grade::Hard => hard,
            Grade::Good => good,
            Grade::Easy => easy,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Grade, T) -> U) -> GradeMap<U> {
        let [again, hard, good, easy] = self.0;
        GradeMap([
            f(Grade::Again, again),
            f(Grade::Hard, hard),
            f(Grade::Good, good),
            f(Grade::Easy, easy),
        ])
    }
}

impl<T> Index<Grade> for GradeMap<T> {
    type Output = T;

    fn index(&self, grade: Grade) -> &T {
        self.get(grade)
    }
}

impl<T> IndexMut<Grade> for GradeMap<T> {
    fn index_mut(&mut self, grade: Grade) -> &mut T {
        self.get_mut(grade)
    }
}

/// Candidate outcome for one grade: the next card and the log entry that would record it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulingInfo {
    pub card: Card,
    pub review_log: ReviewLog,
}

/// Working set of four hypothetical next states, one per grade.
///
/// All four are computed on every review because the interval ordering
/// between Hard, Good and Easy needs every candidate's stability.
#[derive(Debug, Clone)]
pub struct SchedulingCards {
    cards: GradeMap<Card>,
    weight: f64,
}

/// `base_secs * weight` as a strictly positive offset.
pub(crate) fn weighted_offset(base_secs: f64, weight: f64) -> Duration {
    let micros = (base_secs * weight * 1_000_000.0).round() as i64;
    Duration::microseconds(micros.max(1))
}

pub(crate) fn shift(
    now: DateTime<Utc>,
    base_secs: f64,
    weight: f64,
) -> Result<DateTime<Utc>, SchedulerError> {
    now.checked_add_signed(weighted_offset(base_secs, weight))
        .ok_or(SchedulerError::InvalidWeight(weight))
}

pub(crate) fn minutes(n: f64) -> f64 {
    n * SECONDS_PER_MINUTE
}

pub(crate) fn days(n: u32) -> f64 {
    f64::from(n) * SECONDS_PER_DAY
}

impl SchedulingCards {
    pub fn new(card: &Card, weight: f64) -> Self {
        Self {
            cards: GradeMap::from_fn(|_| card.clone()),
            weight,
        }
    }

    pub fn card(&self, grade: Grade) -> &Card {
        &self.cards[grade]
    }

    pub fn card_mut(&mut self, grade: Grade) -> &mut Card {
        &mut self.cards[grade]
    }

    /// Assigns each candidate's stage from the pre-review stage and counts the lapse on Again.
    pub fn update_stage(&mut self, stage: Stage) {
        for grade in Grade::ALL {
            self.cards[grade].stage = match (stage, grade) {
                (Stage::New, _) => Stage::Learning,
                (Stage::Learning | Stage::Relearning, Grade::Again | Grade::Hard) => stage,
                (Stage::Learning | Stage::Relearning, Grade::Good | Grade::Easy) => Stage::Review,
                (Stage::Review, Grade::Again) => Stage::Relearning,
                (Stage::Review, _) => Stage::Review,
            };
        }
        self.cards[Grade::Again].lapses += 1;
    }

    /// Sets scheduled days and weighted due timestamps for a non-New review.
    ///
    /// `hard_interval == 0` keeps Hard in the short-term loop (minutes, not days).
    pub fn schedule(
        &mut self,
        now: DateTime<Utc>,
        hard_interval: u32,
        good_interval: u32,
        easy_interval: u32,
    ) -> Result<(), SchedulerError> {
        let weight = self.weight;

        let again = &mut self.cards[Grade::Again];
        again.scheduled_days = 0;
        again.due = shift(now, minutes(RELEARN_AGAIN_MINUTES), weight)?;

        let hard = &mut self.cards[Grade::Hard];
        hard.scheduled_days = hard_interval;
        hard.due = if hard_interval > 0 {
            shift(now, days(hard_interval), weight)?
        } else {
            shift(now, minutes(SHORT_TERM_HARD_MINUTES), weight)?
        };

        let good = &mut self.cards[Grade::Good];
        good.scheduled_days = good_interval;
        good.due = shift(now, days(good_interval), weight)?;

        let easy = &mut self.cards[Grade::Easy];
        easy.scheduled_days = easy_interval;
        easy.due = shift(now, days(easy_interval), weight)?;

        Ok(())
    }

    /// Pairs every candidate with its log entry. `snapshot` is the card as submitted.
    pub fn record_log(
        self,
        snapshot: &Card,
        elapsed_days: u32,
        now: DateTime<Utc>,
    ) -> GradeMap<SchedulingInfo> {
        self.cards.map(|grade, card| SchedulingInfo {
            review_log: ReviewLog {
                grade,
                card: snapshot.clone(),
                scheduled_days: card.scheduled_days,
                elapsed_days,
                review: now,
                stage: snapshot.stage,
            },
            card,
        })
    }
}
