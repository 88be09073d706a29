//! Memory model formulas. All functions are total over valid parameters and
//! clamp their results into the documented difficulty / stability bounds.

use crate::constants::{DECAY, FACTOR, MAX_DIFFICULTY, MIN_DIFFICULTY, MIN_STABILITY};

use super::card::Grade;
use super::params::Parameters;

fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

fn floor_stability(s: f64) -> f64 {
    s.max(MIN_STABILITY)
}

/// Forgetting curve: probability of recall after `elapsed_days` at `stability`.
pub fn forgetting_curve(elapsed_days: f64, stability: f64) -> f64 {
    (1.0 + FACTOR * elapsed_days / stability).powf(DECAY)
}

/// Days until retrievability falls to the target retention, clamped to `[1, maximum_interval]`.
pub fn next_interval(params: &Parameters, stability: f64) -> u32 {
    let interval =
        stability / FACTOR * (params.request_retention().powf(1.0 / DECAY) - 1.0);
    let max = f64::from(params.maximum_interval());
    // Round half to even.
    interval.round_ties_even().clamp(1.0, max) as u32
}

pub fn init_stability(params: &Parameters, grade: Grade) -> f64 {
    floor_stability(params.weights()[grade.index()])
}

pub fn init_difficulty(params: &Parameters, grade: Grade) -> f64 {
    let w = params.weights();
    clamp_difficulty(w[4] - (w[5] * (grade.value() - 1.0)).exp() + 1.0)
}

fn mean_reversion(params: &Parameters, init: f64, current: f64) -> f64 {
    let w = params.weights();
    w[7] * init + (1.0 - w[7]) * current
}

/// Difficulty after a review, mean-reverted toward the Easy initial difficulty.
pub fn next_difficulty(params: &Parameters, difficulty: f64, grade: Grade) -> f64 {
    let w = params.weights();
    let next_d = difficulty - w[6] * (grade.value() - 3.0);
    clamp_difficulty(mean_reversion(
        params,
        init_difficulty(params, Grade::Easy),
        next_d,
    ))
}

/// Stability update while the card is in the (re)learning loop.
pub fn short_term_stability(params: &Parameters, stability: f64, grade: Grade) -> f64 {
    let w = params.weights();
    floor_stability(stability * (w[17] * (grade.value() - 3.0 + w[18])).exp())
}

/// Stability after successful recall (Hard / Good / Easy) of a Review card.
pub fn next_recall_stability(
    params: &Parameters,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    grade: Grade,
) -> f64 {
    let w = params.weights();
    let hard_penalty = if grade == Grade::Hard { w[15] } else { 1.0 };
    let easy_bonus = if grade == Grade::Easy { w[16] } else { 1.0 };

    floor_stability(
        stability
            * (1.0
                + w[8].exp()
                    * (11.0 - difficulty)
                    * stability.powf(-w[9])
                    * (((1.0 - retrievability) * w[10]).exp() - 1.0)
                    * hard_penalty
                    * easy_bonus),
    )
}

/// Stability after a lapse (Again) of a Review card.
pub fn next_forget_stability(
    params: &Parameters,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let w = params.weights();
    floor_stability(
        w[11]
            * difficulty.powf(-w[12])
            * ((stability + 1.0).powf(w[13]) - 1.0)
            * ((1.0 - retrievability) * w[14]).exp(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn forgetting_curve_is_one_at_zero_and_target_at_stability() {
        assert!(approx(forgetting_curve(0.0, 5.0), 1.0));
        // FACTOR is chosen so that R(t = S) = 0.9.
        assert!(approx(forgetting_curve(7.0, 7.0), 0.9));
        assert!(forgetting_curve(30.0, 7.0) < forgetting_curve(10.0, 7.0));
    }

    #[test]
    fn interval_matches_stability_at_ninety_percent() {
        let params = Parameters::default();
        assert_eq!(next_interval(&params, 15.4722), 15);
        assert_eq!(next_interval(&params, 0.1), 1);
        assert_eq!(next_interval(&params, 1.0e9), params.maximum_interval());
    }

    #[test]
    fn interval_rounds_to_nearest_day() {
        let params = Parameters::default();
        assert_eq!(next_interval(&params, 2.4), 2);
        assert_eq!(next_interval(&params, 2.6), 3);
    }

    #[test]
    fn initial_values_follow_weights() {
        let params = Parameters::default();
        let w = params.weights();
        assert!(approx(init_stability(&params, Grade::Good), w[2]));
        assert!(approx(
            init_difficulty(&params, Grade::Again),
            (w[4] - 1.0 + 1.0).clamp(1.0, 10.0)
        ));
        assert!(init_difficulty(&params, Grade::Easy) < init_difficulty(&params, Grade::Again));
    }

    #[test]
    fn difficulty_moves_with_grade() {
        let params = Parameters::default();
        let d = 5.0;
        let again = next_difficulty(&params, d, Grade::Again);
        let easy = next_difficulty(&params, d, Grade::Easy);
        assert!(again > easy);
        assert!((1.0..=10.0).contains(&again));
        assert!((1.0..=10.0).contains(&easy));
        assert!(approx(next_difficulty(&params, 10.0, Grade::Again), 10.0));
    }

    #[test]
    fn forget_stability_is_below_recall_stability() {
        let params = Parameters::default();
        let r = forgetting_curve(30.0, 10.0);
        let forget = next_forget_stability(&params, 5.0, 10.0, r);
        let hard = next_recall_stability(&params, 5.0, 10.0, r, Grade::Hard);
        let good = next_recall_stability(&params, 5.0, 10.0, r, Grade::Good);
        let easy = next_recall_stability(&params, 5.0, 10.0, r, Grade::Easy);
        assert!(forget < good);
        assert!(hard < good && good < easy);
    }

    #[test]
    fn short_term_stability_never_drops_below_floor() {
        let params = Parameters::default();
        let mut s = 0.2;
        for _ in 0..10 {
            s = short_term_stability(&params, s, Grade::Again);
        }
        assert!(s >= MIN_STABILITY);
    }
}
