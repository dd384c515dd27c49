//! Conversions between chrono values and the two integer time scales found on
//! the wire: milliseconds since the Unix epoch, and 100ns ticks since
//! 0001-01-01T00:00:00.

use crate::error::{BsonError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

pub const TICKS_PER_MILLISECOND: i64 = 10_000;
pub const TICKS_PER_SECOND: i64 = 10_000_000;
pub const TICKS_PER_MINUTE: i64 = 60 * TICKS_PER_SECOND;
pub const TICKS_PER_HOUR: i64 = 60 * TICKS_PER_MINUTE;
pub const TICKS_PER_DAY: i64 = 24 * TICKS_PER_HOUR;
const NANOS_PER_TICK: i64 = 100;

pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
pub const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

pub const MIN_MILLIS_SINCE_EPOCH: i64 = -62_135_596_800_000;
pub const MAX_MILLIS_SINCE_EPOCH: i64 = 253_402_300_799_999;

/// 0001-01-01T00:00:00
pub fn min_date_time() -> NaiveDateTime {
    let date = NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN);
    NaiveDateTime::new(date, NaiveTime::MIN)
}

/// 9999-12-31T23:59:59.9999999
pub fn max_date_time() -> NaiveDateTime {
    min_date_time() + TimeDelta::seconds(MAX_TICKS / TICKS_PER_SECOND)
        + TimeDelta::nanoseconds((MAX_TICKS % TICKS_PER_SECOND) * NANOS_PER_TICK)
}

pub fn ticks_from_time_delta(delta: TimeDelta) -> Result<i64> {
    delta
        .num_seconds()
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add(delta.subsec_nanos() as i64 / NANOS_PER_TICK))
        .ok_or_else(|| BsonError::format(format!("{delta} is out of range for ticks.")))
}

pub fn time_delta_from_ticks(ticks: i64) -> TimeDelta {
    TimeDelta::seconds(ticks / TICKS_PER_SECOND)
        + TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK)
}

pub fn ticks_from_naive(value: &NaiveDateTime) -> Result<i64> {
    if *value < min_date_time() || *value > max_date_time() {
        return Err(BsonError::format(format!(
            "{value} is outside the representable tick range."
        )));
    }
    ticks_from_time_delta(value.signed_duration_since(min_date_time()))
}

pub fn naive_from_ticks(ticks: i64) -> Result<NaiveDateTime> {
    if !(0..=MAX_TICKS).contains(&ticks) {
        return Err(BsonError::format(format!(
            "Ticks value {ticks} is outside the range of valid DateTime values."
        )));
    }
    min_date_time()
        .checked_add_signed(time_delta_from_ticks(ticks))
        .ok_or_else(|| BsonError::format(format!("Ticks value {ticks} is out of range.")))
}

/// Milliseconds truncate toward zero, so sub-millisecond precision is dropped.
pub fn millis_from_naive(value: &NaiveDateTime) -> Result<i64> {
    let ticks = ticks_from_naive(value)?;
    Ok((ticks - UNIX_EPOCH_TICKS) / TICKS_PER_MILLISECOND)
}

/// Values at or beyond the boundaries clamp to the minimum and maximum
/// representable date-times, so those round-trip exactly despite carrying
/// sub-millisecond ticks.
pub fn naive_from_millis(millis: i64) -> Result<NaiveDateTime> {
    match millis {
        ..=MIN_MILLIS_SINCE_EPOCH => Ok(min_date_time()),
        MAX_MILLIS_SINCE_EPOCH.. => Ok(max_date_time()),
        _ => {
            let ticks = millis
                .checked_mul(TICKS_PER_MILLISECOND)
                .and_then(|t| t.checked_add(UNIX_EPOCH_TICKS))
                .ok_or_else(|| {
                    BsonError::format(format!("Milliseconds value {millis} is out of range."))
                })?;
            naive_from_ticks(ticks)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    #[test]
    fn epoch_and_bounds() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(ticks_from_naive(&epoch).unwrap(), UNIX_EPOCH_TICKS);
        assert_eq!(millis_from_naive(&epoch).unwrap(), 0);
        assert_eq!(ticks_from_naive(&max_date_time()).unwrap(), MAX_TICKS);
        assert_eq!(millis_from_naive(&max_date_time()).unwrap(), MAX_MILLIS_SINCE_EPOCH);
        assert_eq!(millis_from_naive(&min_date_time()).unwrap(), MIN_MILLIS_SINCE_EPOCH);
        assert_eq!(naive_from_millis(MAX_MILLIS_SINCE_EPOCH).unwrap(), max_date_time());
        assert_eq!(naive_from_millis(MIN_MILLIS_SINCE_EPOCH).unwrap(), min_date_time());
        assert_eq!(naive_from_millis(i64::MAX).unwrap(), max_date_time());
        assert_eq!(naive_from_millis(i64::MIN).unwrap(), min_date_time());
        assert!(naive_from_ticks(-1).is_err());
    }

    #[test]
    fn random_ticks() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let ticks = rng.gen_range(0..=MAX_TICKS);
            let dt = naive_from_ticks(ticks).unwrap();
            assert_eq!(ticks_from_naive(&dt).unwrap(), ticks);

            let span = rng.gen_range(-MAX_TICKS..=MAX_TICKS);
            assert_eq!(ticks_from_time_delta(time_delta_from_ticks(span)).unwrap(), span);
        }
    }
}
