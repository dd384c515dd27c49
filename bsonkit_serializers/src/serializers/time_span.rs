use super::{cannot_deserialize, invalid_text, unsupported};
use crate::options::{SerializationOptions, TimeSpanOptions, TimeSpanUnits};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::ticks::{self, TICKS_PER_DAY, TICKS_PER_HOUR, TICKS_PER_MINUTE, TICKS_PER_SECOND};
use bsonkit_types::{BsonError, BsonType, LossKind, Result};
use chrono::TimeDelta;
use std::fmt::Write;

/// A `TimeDelta` as `[-][d.]hh:mm:ss[.fffffff]` text (default), or as a
/// count of the configured units in an Int64, Int32 or Double. Precision is
/// one tick (100ns).
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSpanSerializer;

impl ValueSerializer for TimeSpanSerializer {
    type Value = TimeDelta;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &TimeDelta,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let opts = TimeSpanOptions::resolve::<TimeDelta>(options)?;
        let tick_count = ticks::ticks_from_time_delta(*value)?;
        match opts.representation {
            BsonType::String => w.write_string(&format_ticks(tick_count)),
            BsonType::Int64 => w.write_int64(to_units(tick_count, opts.units)?),
            BsonType::Int32 => {
                let count = to_units(tick_count, opts.units)?;
                let count = i32::try_from(count).map_err(|_| overflow("i64", "i32"))?;
                w.write_int32(count)
            }
            BsonType::Double => w.write_double(to_fractional_units(tick_count, opts.units)),
            other => Err(unsupported::<TimeDelta>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<TimeDelta> {
        let opts = TimeSpanOptions::resolve::<TimeDelta>(options)?;
        let tick_count = match r.current_bson_type()? {
            BsonType::String => {
                let s = r.read_string()?;
                parse_ticks(&s).ok_or_else(|| invalid_text::<TimeDelta>(&s))?
            }
            BsonType::Int64 => from_units(r.read_int64()?, opts.units)?,
            BsonType::Int32 => from_units(r.read_int32()? as i64, opts.units)?,
            BsonType::Double => from_fractional_units(r.read_double()?, opts.units)?,
            other => return Err(cannot_deserialize::<TimeDelta>(other)),
        };
        Ok(ticks::time_delta_from_ticks(tick_count))
    }
}

fn overflow(from: &'static str, to: &'static str) -> BsonError {
    BsonError::LossyConversion {
        kind: LossKind::Overflow,
        from,
        to,
    }
}

/// Ticks per unit, for every unit no finer than a tick.
fn ticks_per_unit(units: TimeSpanUnits) -> i64 {
    match units {
        TimeSpanUnits::Ticks | TimeSpanUnits::Nanoseconds => 1,
        TimeSpanUnits::Microseconds => 10,
        TimeSpanUnits::Milliseconds => ticks::TICKS_PER_MILLISECOND,
        TimeSpanUnits::Seconds => TICKS_PER_SECOND,
        TimeSpanUnits::Minutes => TICKS_PER_MINUTE,
        TimeSpanUnits::Hours => TICKS_PER_HOUR,
        TimeSpanUnits::Days => TICKS_PER_DAY,
    }
}

const NANOS_PER_TICK: i64 = 100;

/// Whole units; a partial unit is dropped.
fn to_units(tick_count: i64, units: TimeSpanUnits) -> Result<i64> {
    match units {
        TimeSpanUnits::Nanoseconds => tick_count
            .checked_mul(NANOS_PER_TICK)
            .ok_or_else(|| overflow("ticks", "nanoseconds")),
        _ => Ok(tick_count / ticks_per_unit(units)),
    }
}

fn from_units(count: i64, units: TimeSpanUnits) -> Result<i64> {
    match units {
        TimeSpanUnits::Nanoseconds => Ok(count / NANOS_PER_TICK),
        _ => count
            .checked_mul(ticks_per_unit(units))
            .ok_or_else(|| overflow("i64", "ticks")),
    }
}

fn to_fractional_units(tick_count: i64, units: TimeSpanUnits) -> f64 {
    match units {
        TimeSpanUnits::Nanoseconds => tick_count as f64 * NANOS_PER_TICK as f64,
        _ => tick_count as f64 / ticks_per_unit(units) as f64,
    }
}

fn from_fractional_units(count: f64, units: TimeSpanUnits) -> Result<i64> {
    let tick_count = match units {
        TimeSpanUnits::Nanoseconds => count / NANOS_PER_TICK as f64,
        _ => count * ticks_per_unit(units) as f64,
    };
    if !tick_count.is_finite() || tick_count < i64::MIN as f64 || tick_count >= i64::MAX as f64 {
        return Err(overflow("f64", "ticks"));
    }
    Ok(tick_count as i64)
}

fn format_ticks(tick_count: i64) -> String {
    let mut s = String::new();
    if tick_count < 0 {
        s.push('-');
    }
    let t = tick_count.unsigned_abs();
    let days = t / TICKS_PER_DAY as u64;
    let hours = t % TICKS_PER_DAY as u64 / TICKS_PER_HOUR as u64;
    let minutes = t % TICKS_PER_HOUR as u64 / TICKS_PER_MINUTE as u64;
    let seconds = t % TICKS_PER_MINUTE as u64 / TICKS_PER_SECOND as u64;
    let fraction = t % TICKS_PER_SECOND as u64;
    // Writing to a String cannot fail.
    if days > 0 {
        let _ = write!(s, "{days}.");
    }
    let _ = write!(s, "{hours:02}:{minutes:02}:{seconds:02}");
    if fraction > 0 {
        let _ = write!(s, ".{fraction:07}");
    }
    s
}

/// Accepts `[-]d` and `[-][d.]hh:mm[:ss[.fffffff]]`.
fn parse_ticks(s: &str) -> Option<i64> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, s),
    };

    let magnitude = match body.split_once(':') {
        None => digits(body)?.checked_mul(TICKS_PER_DAY)?,
        Some((head, rest)) => {
            let (days, hours) = match head.split_once('.') {
                Some((days, hours)) => (digits(days)?, digits(hours)?),
                None => (0, digits(head)?),
            };
            let (minutes, seconds) = match rest.split_once(':') {
                Some((minutes, seconds)) => (digits(minutes)?, Some(seconds)),
                None => (digits(rest)?, None),
            };
            let (seconds, fraction) = match seconds {
                None => (0, 0),
                Some(seconds) => match seconds.split_once('.') {
                    Some((whole, fraction)) => (digits(whole)?, fraction_ticks(fraction)?),
                    None => (digits(seconds)?, 0),
                },
            };
            if hours >= 24 || minutes >= 60 || seconds >= 60 {
                return None;
            }
            days.checked_mul(TICKS_PER_DAY)?
                .checked_add(hours * TICKS_PER_HOUR + minutes * TICKS_PER_MINUTE)?
                .checked_add(seconds * TICKS_PER_SECOND + fraction)?
        }
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Up to seven digits of a second.
fn fraction_ticks(s: &str) -> Option<i64> {
    if s.len() > 7 {
        return None;
    }
    let value = digits(s)?;
    Some(value * 10i64.pow(7 - s.len() as u32))
}
