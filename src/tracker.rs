//! Per-learner word tracker: one card per word, focus-word selection and
//! proficiency reporting on top of the scheduler.
//!
//! Mutating calls take `&mut self`; share a tracker across tasks behind a lock
//! so that reviews of the same word never race.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{ALLOWED_WORDS_CHUNK, DEFAULT_INCIDENTAL_WEIGHT};
use crate::scheduler::{Card, Grade, ReviewContext, ReviewLog, Scheduler, SchedulerError};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("word not tracked: {0}")]
    UnknownWord(String),
    #[error("no focus word available")]
    NoFocusWord,
}

/// How never-reviewed words enter the proficiency mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnreviewedPolicy {
    #[default]
    Exclude,
    CountAsZero,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub words: BTreeMap<String, Card>,
}

#[derive(Debug, Clone)]
pub struct WordTracker {
    scheduler: Scheduler,
    words: BTreeMap<String, Card>,
    incidental_weight: f64,
}

impl WordTracker {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            words: BTreeMap::new(),
            incidental_weight: DEFAULT_INCIDENTAL_WEIGHT,
        }
    }

    /// Weight for words a sentence exercised without focusing on them.
    pub fn with_incidental_weight(mut self, weight: f64) -> Result<Self, TrackerError> {
        if !(weight.is_finite() && weight > 0.0) {
            tracing::warn!(weight, "Rejected incidental weight");
            return Err(SchedulerError::InvalidWeight(weight).into());
        }
        self.incidental_weight = weight;
        Ok(self)
    }

    pub fn from_snapshot(
        scheduler: Scheduler,
        snapshot: TrackerSnapshot,
    ) -> Result<Self, TrackerError> {
        for card in snapshot.words.values() {
            card.validate()?;
        }
        Ok(Self {
            words: snapshot.words,
            ..Self::new(scheduler)
        })
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            words: self.words.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, TrackerError> {
        Ok(serde_json::to_string(&self.snapshot()).map_err(SchedulerError::from)?)
    }

    pub fn from_json(scheduler: Scheduler, raw: &str) -> Result<Self, TrackerError> {
        let snapshot: TrackerSnapshot =
            serde_json::from_str(raw).map_err(SchedulerError::from)?;
        Self::from_snapshot(scheduler, snapshot)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn card(&self, word: &str) -> Option<&Card> {
        self.words.get(word)
    }

    pub fn card_or_err(&self, word: &str) -> Result<&Card, TrackerError> {
        self.words
            .get(word)
            .ok_or_else(|| TrackerError::UnknownWord(word.to_string()))
    }

    /// Reviews `word`, starting a new card if it was not tracked yet.
    pub fn review_word(
        &mut self,
        word: &str,
        grade: Grade,
        weight: f64,
        now: DateTime<Utc>,
    ) -> Result<ReviewLog, TrackerError> {
        let (next, log) = self.stage_review(word, grade, weight, now)?;
        self.commit(word.to_string(), next, grade);
        Ok(log)
    }

    /// Applies per-word correctness from one translated sentence.
    ///
    /// Correct words are graded Good, missed words Again. Focus words count
    /// fully, the rest of the sentence with the incidental weight. Either
    /// every word is updated or, on error, none is.
    pub fn record_sentence_result(
        &mut self,
        validations: &BTreeMap<String, bool>,
        focus_words: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, ReviewLog)>, TrackerError> {
        let mut staged = Vec::with_capacity(validations.len());
        for (word, &correct) in validations {
            let grade = if correct { Grade::Good } else { Grade::Again };
            let weight = if focus_words.iter().any(|f| f == word) {
                1.0
            } else {
                self.incidental_weight
            };
            let (next, log) = self.stage_review(word, grade, weight, now)?;
            staged.push((word.clone(), next, log));
        }

        Ok(staged
            .into_iter()
            .map(|(word, next, log)| {
                self.commit(word.clone(), next, log.grade);
                (word, log)
            })
            .collect())
    }

    fn stage_review(
        &self,
        word: &str,
        grade: Grade,
        weight: f64,
        now: DateTime<Utc>,
    ) -> Result<(Card, ReviewLog), TrackerError> {
        let current = self
            .words
            .get(word)
            .cloned()
            .unwrap_or_else(|| Card::new(now));
        let ctx = ReviewContext::at(now).with_weight(weight);
        Ok(self.scheduler.review_card(&current, grade, ctx)?)
    }

    fn commit(&mut self, word: String, next: Card, grade: Grade) {
        tracing::info!(
            word = %word,
            grade = %grade,
            stage = ?next.stage,
            due = %next.due,
            "Word reviewed"
        );
        self.words.insert(word, next);
    }

    /// Next word to practise: the most overdue tracked word, or else the first
    /// untracked word of `full_word_list`.
    pub fn focus_word(
        &self,
        full_word_list: &[String],
        now: DateTime<Utc>,
    ) -> Result<String, TrackerError> {
        let overdue = self
            .words
            .iter()
            .min_by_key(|(_, card)| card.due)
            .filter(|(_, card)| card.due < now);
        if let Some((word, _)) = overdue {
            return Ok(word.clone());
        }

        full_word_list
            .iter()
            .find(|w| !self.words.contains_key(w.as_str()))
            .cloned()
            .ok_or(TrackerError::NoFocusWord)
    }

    /// Vocabulary the learner has been exposed to, rounded down to whole chunks of the list.
    pub fn allowed_words<'a>(&self, full_word_list: &'a [String]) -> &'a [String] {
        let rounded = ALLOWED_WORDS_CHUNK * (self.words.len() / ALLOWED_WORDS_CHUNK);
        &full_word_list[..rounded.min(full_word_list.len())]
    }

    /// Tracked words due at `now`, earliest first.
    pub fn due_words(&self, now: DateTime<Utc>) -> Vec<&str> {
        let mut due: Vec<(&str, DateTime<Utc>)> = self
            .words
            .iter()
            .filter(|(_, card)| card.is_due(now))
            .map(|(word, card)| (word.as_str(), card.due))
            .collect();
        due.sort_by_key(|(_, at)| *at);
        due.into_iter().map(|(word, _)| word).collect()
    }

    /// Mean retrievability across tracked words.
    pub fn proficiency(&self, policy: UnreviewedPolicy, now: Option<DateTime<Utc>>) -> f64 {
        let values: Vec<f64> = self
            .words
            .values()
            .filter(|card| policy == UnreviewedPolicy::CountAsZero || !card.is_new())
            .map(|card| self.scheduler.approximate_retrievability(card, now))
            .collect();

        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }
}
