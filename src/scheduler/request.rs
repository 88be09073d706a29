use chrono::{DateTime, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::card::{Card, Grade, ReviewLog};
use super::engine::{ReviewContext, Scheduler};
use super::SchedulerError;

/// Raw review input as received from an outer layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub card: Card,
    pub grade: Grade,
    /// RFC 3339 timestamp carrying a UTC designator (`Z` or `+00:00`).
    #[serde(default)]
    pub reviewed_at: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub card: Card,
    pub review_log: ReviewLog,
}

/// Accepts a zoned timestamp only if its offset is UTC.
pub fn ensure_utc<Tz: TimeZone>(dt: &DateTime<Tz>) -> Result<DateTime<Utc>, SchedulerError> {
    let offset = dt.offset().fix().local_minus_utc();
    if offset != 0 {
        return Err(SchedulerError::InvalidTimestamp(format!(
            "expected UTC, got offset of {offset} seconds"
        )));
    }
    Ok(dt.with_timezone(&Utc))
}

/// Parses an RFC 3339 review timestamp, rejecting naive and non-UTC values.
pub fn parse_review_time(raw: &str) -> Result<DateTime<Utc>, SchedulerError> {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => ensure_utc(&dt),
        Err(e) => {
            let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"));
            if naive.is_ok() {
                Err(SchedulerError::InvalidTimestamp(format!(
                    "{raw} has no time zone"
                )))
            } else {
                Err(SchedulerError::InvalidTimestamp(format!("{raw}: {e}")))
            }
        }
    }
}

impl Scheduler {
    /// Validates a raw request and applies it. Rejected input produces no card.
    pub fn handle(&self, request: &ReviewRequest) -> Result<ReviewResponse, SchedulerError> {
        self.apply_request(request)
            .inspect_err(|e| tracing::warn!(error = %e, "Rejected review request"))
    }

    fn apply_request(&self, request: &ReviewRequest) -> Result<ReviewResponse, SchedulerError> {
        let now = request
            .reviewed_at
            .as_deref()
            .map(parse_review_time)
            .transpose()?;

        let ctx = ReviewContext {
            now,
            weight: request.weight,
        };
        let (card, review_log) = self.review_card(&request.card, request.grade, ctx)?;
        Ok(ReviewResponse { card, review_log })
    }
}
