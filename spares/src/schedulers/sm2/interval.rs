//! Interval, ease, and learning-step arithmetic (`spec.md` §4.6, §4.6.4).
//! Pure functions only — no store access — so the exact legacy truncation
//! and clamping rules (`spec.md` §9 "Interval rounding") can be unit
//! tested in isolation from queue assembly.

use crate::helpers::fuzz_interval;
use crate::model::{DeckConfig, FACTOR_MIN};
use rand::Rng;

/// How many of the remaining learning steps can still be completed before
/// the day cutoff, counting from the back of `delays` (`sched.py`'s
/// `_leftToday`, see `SPEC_FULL.md` §12).
pub fn today_completable(delays: &[f64], steps_remaining: usize, now: i64, day_cutoff: i64) -> u32 {
    let start = delays.len().saturating_sub(steps_remaining);
    let mut clock = now;
    let mut completable = 0;
    for &delay_minutes in &delays[start..] {
        clock += (delay_minutes * 60.0) as i64;
        if clock > day_cutoff {
            break;
        }
        completable += 1;
    }
    completable
}

/// `left := total_remaining_steps + today_completable_steps * 1000`
/// (`spec.md` §3 `Card.left`).
pub fn starting_left(delays: &[f64], now: i64, day_cutoff: i64) -> i64 {
    let total = delays.len();
    let completable = today_completable(delays, total, now, day_cutoff);
    total as i64 + i64::from(completable) * 1000
}

/// The delay (seconds) before a learning card with `left` remaining steps
/// is shown again, per `delays[-remaining_steps]` with the legacy
/// out-of-range fallback to `delays[0]` or 60s.
pub fn step_delay_secs(delays: &[f64], remaining_steps: i64) -> i64 {
    let idx = delays.len() as i64 - remaining_steps;
    let minutes = if idx >= 0 && (idx as usize) < delays.len() {
        delays[idx as usize]
    } else {
        delays.first().copied().unwrap_or(1.0)
    };
    (minutes * 60.0) as i64
}

/// `constrain(new, conf, prev) := floor(max(new * conf.ivlFct, prev+1))`
/// (`spec.md` §4.6.2).
pub fn constrain(new_ivl: f64, ivl_fct: f64, prev: i64, max_ivl: i64) -> i64 {
    let constrained = (new_ivl * ivl_fct).max((prev + 1) as f64).floor() as i64;
    constrained.min(max_ivl)
}

/// The next review interval on a non-lapse review answer (`spec.md`
/// §4.6.2), `ease` in `{2 (Hard), 3 (Good), 4 (Easy)}`.
pub fn next_review_interval(ivl: i64, factor: i64, ease: u32, delay: i64, rev: &crate::model::ReviewConfig) -> i64 {
    let ease4 = rev.ease4;
    let hard_factor = rev.hard_factor;
    let factor_ratio = factor as f64 / 1000.0;

    let ivl2 = constrain((ivl + delay / 4) as f64 * hard_factor, rev.ivl_fct, ivl, rev.max_ivl);
    let ivl3 = constrain((ivl + delay / 2) as f64 * factor_ratio, rev.ivl_fct, ivl2, rev.max_ivl);
    let ivl4 = constrain(
        (ivl + delay) as f64 * factor_ratio * ease4,
        rev.ivl_fct,
        ivl3,
        rev.max_ivl,
    );

    match ease {
        2 => ivl2,
        3 => ivl3,
        _ => ivl4,
    }
    .min(rev.max_ivl)
}

/// Ease-factor update on a non-lapse review answer: `Hard:-150, Good:0,
/// Easy:+150`, clamped to `FACTOR_MIN`.
pub fn updated_factor(factor: i64, ease: u32) -> i64 {
    let delta = match ease {
        2 => -150,
        4 => 150,
        _ => 0,
    };
    (factor + delta).max(FACTOR_MIN)
}

/// The graduating interval for a New card leaving learning (`spec.md`
/// §4.6.1 `_reschedule_as_review`), `early` iff graduated via Easy.
pub fn graduating_interval(conf: &DeckConfig, early: bool, rng: &mut impl Rng) -> i64 {
    let ideal = if early { conf.new.ints[1] } else { conf.new.ints[0] };
    fuzz_interval(ideal, rng)
}

/// `_dyn_ivl_boost` (`spec.md` §4.8): biases a filtered-deck review's
/// interval toward an ease of 1.2 the first time it's seen there.
pub fn dyn_ivl_boost(ivl: i64, factor: i64, odue: i64, today: i64, max_ivl: i64) -> i64 {
    let elapsed = ivl - (odue - today);
    let boosted_factor = (factor as f64 / 1000.0 + 1.2) / 2.0;
    let new_ivl = (elapsed as f64 * boosted_factor).floor() as i64;
    ivl.max(new_ivl).max(1).min(max_ivl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_completable_fits_entirely() {
        let delays = [1.0, 10.0];
        let now = 0;
        let day_cutoff = 86400;
        assert_eq!(today_completable(&delays, 2, now, day_cutoff), 2);
    }

    #[test]
    fn test_today_completable_cut_short() {
        let delays = [1.0, 10.0];
        let now = 86395;
        let day_cutoff = 86400;
        assert_eq!(today_completable(&delays, 2, now, day_cutoff), 0);
    }

    #[test]
    fn test_step_delay_secs_in_range() {
        let delays = [1.0, 10.0];
        assert_eq!(step_delay_secs(&delays, 2), 60);
        assert_eq!(step_delay_secs(&delays, 1), 600);
    }

    #[test]
    fn test_step_delay_secs_fallback() {
        let delays = [1.0, 10.0];
        assert_eq!(step_delay_secs(&delays, 5), 60);
    }

    #[test]
    fn test_constrain_floors_and_respects_prev() {
        assert_eq!(constrain(5.6, 1.0, 10, 36500), 11);
        assert_eq!(constrain(20.0, 1.0, 10, 36500), 20);
    }

    #[test]
    fn test_updated_factor_clamped() {
        assert_eq!(updated_factor(1300, 2), FACTOR_MIN);
        assert_eq!(updated_factor(2500, 4), 2650);
    }
}
