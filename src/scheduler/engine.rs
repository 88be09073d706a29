use chrono::{DateTime, Utc};

use crate::constants::{NEW_AGAIN_MINUTES, NEW_GOOD_MINUTES, NEW_HARD_MINUTES};

use super::algorithm::{
    forgetting_curve, init_difficulty, init_stability, next_difficulty, next_forget_stability,
    next_interval, next_recall_stability, short_term_stability,
};
use super::candidates::{days, minutes, shift, GradeMap, SchedulingCards, SchedulingInfo};
use super::card::{Card, Grade, ReviewLog, Stage};
use super::params::Parameters;
use super::SchedulerError;

/// Optional review inputs. `now` defaults to the current UTC time, `weight` to 1.0.
///
/// `weight` scales only the offset added to `now` to produce `due`, for
/// partial-credit reviews. Difficulty, stability and recorded
/// `scheduled_days` are unaffected. It applies alike to minute offsets of the
/// short-term loop and to day intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReviewContext {
    pub now: Option<DateTime<Utc>>,
    pub weight: Option<f64>,
}

impl ReviewContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Some(now),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    fn resolve(&self) -> Result<(DateTime<Utc>, f64), SchedulerError> {
        let weight = self.weight.unwrap_or(1.0);
        if !(weight.is_finite() && weight > 0.0) {
            tracing::warn!(weight, "Rejected review weight");
            return Err(SchedulerError::InvalidWeight(weight));
        }
        Ok((self.now.unwrap_or_else(Utc::now), weight))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    params: Parameters,
}

impl Scheduler {
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Applies `grade` to `card` and returns the next card plus its log entry.
    ///
    /// The input card is never modified; on error nothing is produced.
    pub fn review_card(
        &self,
        card: &Card,
        grade: Grade,
        ctx: ReviewContext,
    ) -> Result<(Card, ReviewLog), SchedulerError> {
        let info = self.repeat(card, ctx)?.take(grade);

        tracing::debug!(
            grade = %grade,
            from = ?card.stage,
            to = ?info.card.stage,
            scheduled_days = info.card.scheduled_days,
            elapsed_days = info.review_log.elapsed_days,
            due = %info.card.due,
            "Card reviewed"
        );

        Ok((info.card, info.review_log))
    }

    /// Computes the candidate outcome for every grade.
    pub fn repeat(
        &self,
        card: &Card,
        ctx: ReviewContext,
    ) -> Result<GradeMap<SchedulingInfo>, SchedulerError> {
        let (now, weight) = ctx.resolve()?;
        card.validate()?;

        let mut next = card.clone();
        next.elapsed_days = match card.last_review {
            Some(last_review) if card.stage != Stage::New => elapsed_days(last_review, now),
            _ => 0,
        };
        next.last_review = Some(now);
        next.reps += 1;

        let mut s = SchedulingCards::new(&next, weight);
        s.update_stage(card.stage);

        match card.stage {
            Stage::New => {
                self.init_ds(&mut s);

                for (grade, offset) in [
                    (Grade::Again, NEW_AGAIN_MINUTES),
                    (Grade::Hard, NEW_HARD_MINUTES),
                    (Grade::Good, NEW_GOOD_MINUTES),
                ] {
                    let candidate = s.card_mut(grade);
                    candidate.scheduled_days = 0;
                    candidate.due = shift(now, minutes(offset), weight)?;
                }

                let easy_interval = next_interval(&self.params, s.card(Grade::Easy).stability);
                let easy = s.card_mut(Grade::Easy);
                easy.scheduled_days = easy_interval;
                easy.due = shift(now, days(easy_interval), weight)?;
            }
            Stage::Learning | Stage::Relearning => {
                let retrievability =
                    forgetting_curve(f64::from(next.elapsed_days), card.stability);
                self.next_ds(&mut s, card, retrievability);

                let hard_interval = 0;
                let good_interval = next_interval(&self.params, s.card(Grade::Good).stability);
                let easy_interval = next_interval(&self.params, s.card(Grade::Easy).stability)
                    .max(good_interval.saturating_add(1));
                s.schedule(now, hard_interval, good_interval, easy_interval)?;
            }
            Stage::Review => {
                let retrievability =
                    forgetting_curve(f64::from(next.elapsed_days), card.stability);
                self.next_ds(&mut s, card, retrievability);

                let hard_interval = next_interval(&self.params, s.card(Grade::Hard).stability);
                let good_interval = next_interval(&self.params, s.card(Grade::Good).stability);
                let hard_interval = hard_interval.min(good_interval);
                let good_interval = good_interval.max(hard_interval.saturating_add(1));
                let easy_interval = next_interval(&self.params, s.card(Grade::Easy).stability)
                    .max(good_interval.saturating_add(1));
                s.schedule(now, hard_interval, good_interval, easy_interval)?;
            }
        }

        Ok(s.record_log(card, next.elapsed_days, now))
    }

    /// Due timestamp each grade would produce, without committing to one.
    pub fn preview(
        &self,
        card: &Card,
        ctx: ReviewContext,
    ) -> Result<GradeMap<DateTime<Utc>>, SchedulerError> {
        Ok(self.repeat(card, ctx)?.map(|_, info| info.card.due))
    }

    /// Forgetting-curve value for `card`, read-only.
    ///
    /// With `at`, elapsed days are measured from `last_review`; otherwise the
    /// card's recorded `elapsed_days` is used. Never-reviewed cards yield 0.
    pub fn approximate_retrievability(&self, card: &Card, at: Option<DateTime<Utc>>) -> f64 {
        let last_review = match (card.stage, card.last_review) {
            (Stage::New, _) | (_, None) => return 0.0,
            (_, Some(last_review)) => last_review,
        };
        if card.stability <= 0.0 {
            return 0.0;
        }
        let elapsed = match at {
            Some(at) => elapsed_days(last_review, at),
            None => card.elapsed_days,
        };
        forgetting_curve(f64::from(elapsed), card.stability).clamp(0.0, 1.0)
    }

    fn init_ds(&self, s: &mut SchedulingCards) {
        for grade in Grade::ALL {
            let candidate = s.card_mut(grade);
            candidate.difficulty = init_difficulty(&self.params, grade);
            candidate.stability = init_stability(&self.params, grade);
        }
    }

    fn next_ds(&self, s: &mut SchedulingCards, last: &Card, retrievability: f64) {
        let (last_d, last_s) = (last.difficulty, last.stability);
        for grade in Grade::ALL {
            let stability = match (last.stage, grade) {
                (Stage::Review, Grade::Again) => {
                    next_forget_stability(&self.params, last_d, last_s, retrievability)
                }
                (Stage::Review, _) => {
                    next_recall_stability(&self.params, last_d, last_s, retrievability, grade)
                }
                _ => short_term_stability(&self.params, last_s, grade),
            };
            let candidate = s.card_mut(grade);
            candidate.difficulty = next_difficulty(&self.params, last_d, grade);
            candidate.stability = stability;
        }
    }
}

/// Whole days between `last_review` and `now`, truncated; 0 if `now` precedes `last_review`.
fn elapsed_days(last_review: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = (now - last_review).num_days();
    if days < 0 {
        tracing::warn!(%last_review, %now, "Review timestamp precedes last review");
        return 0;
    }
    u32::try_from(days).unwrap_or(u32::MAX)
}
