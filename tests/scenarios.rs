use brick_srs::scheduler::algorithm::{
    forgetting_curve, init_difficulty, init_stability, next_forget_stability, next_interval,
    next_recall_stability, short_term_stability,
};
use brick_srs::scheduler::{
    Card, Grade, Parameters, ReviewContext, ReviewRequest, Scheduler, SchedulerError, Stage,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 1, 8, 0, 0).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn review_card_at(last_review: DateTime<Utc>) -> Card {
    Card {
        stage: Stage::Review,
        difficulty: 5.0,
        stability: 10.0,
        elapsed_days: 0,
        scheduled_days: 10,
        reps: 4,
        lapses: 0,
        last_review: Some(last_review),
        due: last_review + Duration::days(10),
    }
}

#[test]
fn new_card_graded_good_enters_learning() {
    let scheduler = Scheduler::default();
    let w = Parameters::default().weights().to_owned();

    let (card, log) = scheduler
        .review_card(&Card::new(t0()), Grade::Good, ReviewContext::at(t0()))
        .unwrap();

    assert_eq!(card.stage, Stage::Learning);
    assert_eq!(card.due, t0() + Duration::minutes(10));
    assert_eq!(card.last_review, Some(t0()));
    assert_eq!(card.scheduled_days, 0);
    let expected_d = (w[4] - (w[5] * 2.0).exp() + 1.0).clamp(1.0, 10.0);
    assert!(approx(card.difficulty, expected_d));
    assert!(approx(card.stability, w[2]));
    assert_eq!(log.grade, Grade::Good);
    assert_eq!(log.stage, Stage::New);
}

#[test]
fn learning_card_reviewed_next_day_uses_short_term_stability() {
    let scheduler = Scheduler::default();
    let params = Parameters::default();

    let (learning, _) = scheduler
        .review_card(&Card::new(t0()), Grade::Good, ReviewContext::at(t0()))
        .unwrap();
    let next_day = t0() + Duration::days(1);
    let (card, log) = scheduler
        .review_card(&learning, Grade::Good, ReviewContext::at(next_day))
        .unwrap();

    assert_eq!(log.elapsed_days, 1);
    assert_eq!(card.elapsed_days, 1);
    assert_eq!(log.stage, Stage::Learning);
    assert_eq!(card.stage, Stage::Review);
    assert_eq!(card.reps, 2);

    let expected_s = short_term_stability(&params, learning.stability, Grade::Good);
    assert!(approx(card.stability, expected_s));
    let interval = next_interval(&params, expected_s);
    assert_eq!(card.scheduled_days, interval);
    assert_eq!(card.due, next_day + Duration::days(i64::from(interval)));
}

#[test]
fn lapse_of_review_card_uses_forget_stability() {
    let scheduler = Scheduler::default();
    let params = Parameters::default();
    let card = review_card_at(t0() - Duration::days(30));

    let candidates = scheduler.repeat(&card, ReviewContext::at(t0())).unwrap();
    let again = &candidates[Grade::Again];
    let good = &candidates[Grade::Good];

    let r = forgetting_curve(30.0, 10.0);
    assert_eq!(again.review_log.elapsed_days, 30);
    assert_eq!(again.card.stage, Stage::Relearning);
    assert_eq!(again.card.lapses, 1);
    assert_eq!(again.card.scheduled_days, 0);
    assert_eq!(again.card.due, t0() + Duration::minutes(5));
    assert!(approx(
        again.card.stability,
        next_forget_stability(&params, 5.0, 10.0, r)
    ));
    assert!(approx(
        good.card.stability,
        next_recall_stability(&params, 5.0, 10.0, r, Grade::Good)
    ));
    assert!(again.card.stability < good.card.stability);
}

#[test]
fn weight_halves_easy_offset_without_touching_memory_state() {
    let scheduler = Scheduler::default();
    let params = Parameters::default();
    let card = Card::new(t0());

    let (full, _) = scheduler
        .review_card(&card, Grade::Easy, ReviewContext::at(t0()))
        .unwrap();
    let (half, _) = scheduler
        .review_card(&card, Grade::Easy, ReviewContext::at(t0()).with_weight(0.5))
        .unwrap();

    let interval = next_interval(&params, init_stability(&params, Grade::Easy));
    assert_eq!(full.due - t0(), Duration::days(i64::from(interval)));
    assert_eq!((full.due - t0()) / 2, half.due - t0());
    assert_eq!(full.difficulty, half.difficulty);
    assert_eq!(full.stability, half.stability);
    assert_eq!(full.scheduled_days, half.scheduled_days);
    assert!(approx(full.difficulty, init_difficulty(&params, Grade::Easy)));
}

#[test]
fn review_card_hard_and_good_keep_interval_order() {
    let scheduler = Scheduler::default();
    let card = review_card_at(t0() - Duration::days(10));
    let candidates = scheduler.repeat(&card, ReviewContext::at(t0())).unwrap();

    let hard = candidates[Grade::Hard].card.scheduled_days;
    let good = candidates[Grade::Good].card.scheduled_days;
    let easy = candidates[Grade::Easy].card.scheduled_days;
    assert!(hard >= 1);
    assert!(hard <= good);
    assert!(good < easy);
    assert_eq!(candidates[Grade::Hard].card.stage, Stage::Review);
}

#[test]
fn relearning_hard_stays_in_short_term_loop() {
    let scheduler = Scheduler::default();
    let card = review_card_at(t0() - Duration::days(30));
    let (relearning, _) = scheduler
        .review_card(&card, Grade::Again, ReviewContext::at(t0()))
        .unwrap();

    let later = t0() + Duration::minutes(5);
    let candidates = scheduler
        .repeat(&relearning, ReviewContext::at(later))
        .unwrap();
    assert_eq!(candidates[Grade::Hard].card.stage, Stage::Relearning);
    assert_eq!(candidates[Grade::Hard].card.scheduled_days, 0);
    assert_eq!(candidates[Grade::Hard].card.due, later + Duration::minutes(10));
    assert_eq!(candidates[Grade::Good].card.stage, Stage::Review);
    assert!(
        candidates[Grade::Easy].card.scheduled_days
            > candidates[Grade::Good].card.scheduled_days
    );
}

#[test]
fn non_utc_review_time_is_rejected_and_card_unchanged() {
    let scheduler = Scheduler::default();
    let card = review_card_at(t0() - Duration::days(3));
    for raw in ["2024-11-01T08:00:00", "2024-11-01T10:00:00+02:00"] {
        let request = ReviewRequest {
            card: card.clone(),
            grade: Grade::Good,
            reviewed_at: Some(raw.to_string()),
            weight: None,
        };
        let result = scheduler.handle(&request);
        assert!(matches!(result, Err(SchedulerError::InvalidTimestamp(_))));
        assert_eq!(request.card, card);
    }
}

#[test]
fn request_with_invalid_weight_is_rejected() {
    let scheduler = Scheduler::default();
    let request = ReviewRequest {
        card: Card::new(t0()),
        grade: Grade::Hard,
        reviewed_at: Some("2024-11-01T08:00:00Z".to_string()),
        weight: Some(-0.5),
    };
    assert!(matches!(
        scheduler.handle(&request),
        Err(SchedulerError::InvalidWeight(_))
    ));
}

#[test]
fn request_decodes_named_grade_and_legacy_state_key() {
    let raw = r#"{
        "card": {"state":"review","difficulty":5.0,"stability":10.0,"elapsed_days":0,
                 "scheduled_days":10,"reps":4,"lapses":0,
                 "last_review":"2024-10-22T08:00:00Z","due":"2024-11-01T08:00:00Z"},
        "grade": "good",
        "reviewed_at": "2024-11-01T08:00:00+00:00",
        "weight": 1.0
    }"#;
    let request: ReviewRequest = serde_json::from_str(raw).unwrap();
    let response = Scheduler::default().handle(&request).unwrap();
    assert_eq!(response.review_log.elapsed_days, 10);
    assert_eq!(response.card.stage, Stage::Review);
    assert_eq!(response.card.last_review, Some(t0()));
}
