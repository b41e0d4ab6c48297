use chrono::{DateTime, Local, TimeZone, Utc};
use rand::Rng;

/// Number of seconds in a day, per `spec.md` §6 constants.
pub const DAY_SECS: i64 = 86400;

/// Shifts `now` back to 4 a.m. local time, used to seed `col.crt` at
/// collection creation so a late-night study session still counts as the
/// previous day (`spec.md` §4.2).
#[allow(clippy::missing_panics_doc)]
pub fn four_am_local(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = now.with_timezone(&Local).date_naive();
    let four_am = Local
        .from_local_datetime(&local_date.and_hms_opt(4, 0, 0).unwrap())
        .unwrap();
    let four_am = four_am.to_utc();
    if four_am > now {
        four_am - chrono::Duration::days(1)
    } else {
        four_am
    }
}

/// "Today" is `floor((now - crt) / 86400)` (`spec.md` §4.2).
pub fn days_since_creation(now: DateTime<Utc>, crt: DateTime<Utc>) -> i64 {
    (now - crt).num_seconds().div_euclid(DAY_SECS)
}

/// The Unix timestamp (seconds) at which day `day` rolls over into `day + 1`.
pub fn day_cutoff(crt: DateTime<Utc>, day: i64) -> i64 {
    crt.timestamp() + (day + 1) * DAY_SECS
}

/// Perturbs an interval (in days) by a small uniform-random jitter, per the
/// table in `spec.md` §4.6.4. `rng` is taken as a parameter so callers (and
/// tests) can inject a seeded generator.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn fuzzed_interval_range(ivl: i64) -> (i64, i64) {
    if ivl < 2 {
        (ivl, ivl)
    } else if ivl == 2 {
        (2, 3)
    } else if ivl < 7 {
        let delta = (ivl as f64 * 0.25).floor() as i64;
        (ivl - delta, ivl + delta)
    } else if ivl < 30 {
        let delta = std::cmp::max(2, (ivl as f64 * 0.15).floor() as i64);
        (ivl - delta, ivl + delta)
    } else {
        let delta = std::cmp::max(4, (ivl as f64 * 0.05).floor() as i64);
        (ivl - delta, ivl + delta)
    }
}

pub fn fuzz_interval(ivl: i64, rng: &mut impl Rng) -> i64 {
    let (low, high) = fuzzed_interval_range(ivl);
    if low >= high {
        return low.max(1);
    }
    rng.gen_range(low..=high).max(1)
}

#[allow(clippy::cast_precision_loss)]
pub fn mean(vec: &[f64]) -> Option<f64> {
    if vec.is_empty() {
        return None;
    }
    let sum: f64 = vec.iter().sum();
    let count = vec.len() as f64;
    Some(sum / count)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn test_days_since_creation() {
        let crt = Utc.with_ymd_and_hms(2024, 1, 1, 4, 0, 0).unwrap();
        let now = crt + chrono::Duration::hours(23);
        assert_eq!(days_since_creation(now, crt), 0);
        let now = crt + chrono::Duration::hours(25);
        assert_eq!(days_since_creation(now, crt), 1);
    }

    #[test]
    fn test_fuzzed_interval_range() {
        assert_eq!(fuzzed_interval_range(1), (1, 1));
        assert_eq!(fuzzed_interval_range(2), (2, 3));
        assert_eq!(fuzzed_interval_range(6), (5, 7));
        assert_eq!(fuzzed_interval_range(20), (17, 23));
        assert_eq!(fuzzed_interval_range(60), (57, 63));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1., 2., 3.]), Some(2.));
        assert_eq!(mean(&[]), None);
    }
}
