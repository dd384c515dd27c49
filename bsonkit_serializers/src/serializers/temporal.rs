use super::{cannot_deserialize, missing_element, next_element, unexpected_element, unsupported};
use crate::describe::Describe;
use crate::options::{DateTimeKind, DateTimeOptions, RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::ticks;
use bsonkit_types::{BsonError, BsonType, Result};
use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use std::any;
use std::marker::PhantomData;

const DATE_TIME: &str = "DateTime";
const TICKS: &str = "Ticks";
const OFFSET: &str = "Offset";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar values the [`DateTimeSerializer`] handles.
pub trait DateTimeValue: Describe {
    /// Whether the type carries no time of day at all.
    const ALWAYS_DATE_ONLY: bool = false;

    /// The instant in UTC. Values without a zone are interpreted per `kind`.
    fn to_utc(&self, kind: DateTimeKind) -> Result<NaiveDateTime>;

    fn from_utc(utc: NaiveDateTime, kind: DateTimeKind) -> Result<Self>;

    /// The value as it reads on a calendar, without zone conversion.
    fn to_wall_clock(&self) -> NaiveDateTime;

    fn from_wall_clock(wall: NaiveDateTime) -> Result<Self>;
}

fn ambiguous_local(wall: &NaiveDateTime) -> BsonError {
    BsonError::format(format!("{wall} is not a unique local time."))
}

impl DateTimeValue for DateTime<Utc> {
    fn to_utc(&self, _kind: DateTimeKind) -> Result<NaiveDateTime> {
        Ok(self.naive_utc())
    }
    fn from_utc(utc: NaiveDateTime, _kind: DateTimeKind) -> Result<Self> {
        Ok(Utc.from_utc_datetime(&utc))
    }
    fn to_wall_clock(&self) -> NaiveDateTime {
        self.naive_utc()
    }
    fn from_wall_clock(wall: NaiveDateTime) -> Result<Self> {
        Ok(Utc.from_utc_datetime(&wall))
    }
}

impl DateTimeValue for DateTime<Local> {
    fn to_utc(&self, _kind: DateTimeKind) -> Result<NaiveDateTime> {
        Ok(self.naive_utc())
    }
    fn from_utc(utc: NaiveDateTime, _kind: DateTimeKind) -> Result<Self> {
        Ok(Local.from_utc_datetime(&utc))
    }
    fn to_wall_clock(&self) -> NaiveDateTime {
        self.naive_local()
    }
    fn from_wall_clock(wall: NaiveDateTime) -> Result<Self> {
        Local
            .from_local_datetime(&wall)
            .single()
            .ok_or_else(|| ambiguous_local(&wall))
    }
}

/// `Utc` and `Unspecified` store the value unconverted; `Local` converts
/// between local time and UTC.
impl DateTimeValue for NaiveDateTime {
    fn to_utc(&self, kind: DateTimeKind) -> Result<NaiveDateTime> {
        match kind {
            DateTimeKind::Utc | DateTimeKind::Unspecified => Ok(*self),
            DateTimeKind::Local => Ok(DateTime::<Local>::from_wall_clock(*self)?.naive_utc()),
        }
    }
    fn from_utc(utc: NaiveDateTime, kind: DateTimeKind) -> Result<Self> {
        match kind {
            DateTimeKind::Utc | DateTimeKind::Unspecified => Ok(utc),
            DateTimeKind::Local => Ok(Local.from_utc_datetime(&utc).naive_local()),
        }
    }
    fn to_wall_clock(&self) -> NaiveDateTime {
        *self
    }
    fn from_wall_clock(wall: NaiveDateTime) -> Result<Self> {
        Ok(wall)
    }
}

impl DateTimeValue for NaiveDate {
    const ALWAYS_DATE_ONLY: bool = true;

    fn to_utc(&self, _kind: DateTimeKind) -> Result<NaiveDateTime> {
        Ok(self.to_wall_clock())
    }
    fn from_utc(utc: NaiveDateTime, _kind: DateTimeKind) -> Result<Self> {
        Ok(utc.date())
    }
    fn to_wall_clock(&self) -> NaiveDateTime {
        self.and_time(NaiveTime::MIN)
    }
    fn from_wall_clock(wall: NaiveDateTime) -> Result<Self> {
        Ok(wall.date())
    }
}

/// Calendar values as a UTC DateTime (default), 100ns ticks since
/// 0001-01-01, RFC 3339 text, or a document carrying both numeric forms:
///
/// ```text
/// { "DateTime": <datetime>, "Ticks": <int64> }
/// ```
///
/// With `date_only`, the value is stored as its calendar date at midnight
/// with no zone conversion, and must have no time of day.
pub struct DateTimeSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: DateTimeValue> DateTimeSerializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: DateTimeValue> Default for DateTimeSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DateTimeValue> ValueSerializer for DateTimeSerializer<T> {
    type Value = T;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &T,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let opts = DateTimeOptions::resolve::<T>(options, BsonType::DateTime)?;
        let date_only = opts.date_only || T::ALWAYS_DATE_ONLY;
        let naive = if date_only {
            let wall = value.to_wall_clock();
            if wall.time() != NaiveTime::MIN {
                return Err(BsonError::Serialization(format!(
                    "{wall} has a time of day, so it cannot be written as a date only."
                )));
            }
            wall
        } else {
            value.to_utc(opts.kind)?
        };

        match opts.representation {
            BsonType::DateTime => w.write_date_time(ticks::millis_from_naive(&naive)?),
            BsonType::Int64 => w.write_int64(ticks::ticks_from_naive(&naive)?),
            BsonType::String if date_only => w.write_string(&naive.format(DATE_FORMAT).to_string()),
            BsonType::String => w.write_string(
                &Utc.from_utc_datetime(&naive)
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
            BsonType::Document => {
                w.write_start_document()?;
                w.write_name(DATE_TIME)?;
                w.write_date_time(ticks::millis_from_naive(&naive)?)?;
                w.write_name(TICKS)?;
                w.write_int64(ticks::ticks_from_naive(&naive)?)?;
                w.write_end_document()
            }
            other => Err(unsupported::<T>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<T> {
        let opts = DateTimeOptions::resolve::<T>(options, BsonType::DateTime)?;
        let date_only = opts.date_only || T::ALWAYS_DATE_ONLY;
        let naive = match r.current_bson_type()? {
            BsonType::DateTime => ticks::naive_from_millis(r.read_date_time()?)?,
            BsonType::Int64 => ticks::naive_from_ticks(r.read_int64()?)?,
            BsonType::String => parse_date_time(&r.read_string()?)?,
            BsonType::Document => read_document::<T>(r)?,
            other => return Err(cannot_deserialize::<T>(other)),
        };

        if date_only {
            if naive.time() != NaiveTime::MIN {
                return Err(BsonError::format(format!(
                    "{naive} has a time of day, so it cannot be read as a date only."
                )));
            }
            return T::from_wall_clock(naive);
        }
        T::from_utc(naive, opts.kind)
    }
}

fn parse_date_time(s: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| BsonError::format(format!("'{s}' is not a valid date time.")))
}

/// `Ticks` is authoritative; `DateTime` alone is accepted with millisecond
/// precision.
fn read_document<T>(r: &mut dyn BsonReader) -> Result<NaiveDateTime> {
    let mut millis = None;
    let mut tick_count = None;
    r.read_start_document()?;
    while let Some((bson_type, name)) = next_element(r)? {
        match (name.as_str(), bson_type) {
            (DATE_TIME, BsonType::DateTime) => millis = Some(r.read_date_time()?),
            (TICKS, BsonType::Int64) => tick_count = Some(r.read_int64()?),
            _ => return Err(unexpected_element::<T>(&name)),
        }
    }
    r.read_end_document()?;
    match (tick_count, millis) {
        (Some(tick_count), _) => ticks::naive_from_ticks(tick_count),
        (None, Some(millis)) => ticks::naive_from_millis(millis),
        (None, None) => Err(missing_element::<T>(TICKS)),
    }
}

/* date time with offset */

/// `DateTime<FixedOffset>` as `[local ticks, offset minutes]` (default), as
/// RFC 3339 text, or as a document:
///
/// ```text
/// { "DateTime": <utc datetime>, "Ticks": <local ticks>, "Offset": <minutes> }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeOffsetSerializer;

impl ValueSerializer for DateTimeOffsetSerializer {
    type Value = DateTime<FixedOffset>;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &DateTime<FixedOffset>,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<DateTime<FixedOffset>>(options, BsonType::Array)?;
        let offset_minutes = value.offset().local_minus_utc() / 60;
        match repr.representation {
            BsonType::Array => {
                w.write_start_array()?;
                w.write_int64(ticks::ticks_from_naive(&value.naive_local())?)?;
                w.write_int32(offset_minutes)?;
                w.write_end_array()
            }
            BsonType::Document => {
                w.write_start_document()?;
                w.write_name(DATE_TIME)?;
                w.write_date_time(ticks::millis_from_naive(&value.naive_utc())?)?;
                w.write_name(TICKS)?;
                w.write_int64(ticks::ticks_from_naive(&value.naive_local())?)?;
                w.write_name(OFFSET)?;
                w.write_int32(offset_minutes)?;
                w.write_end_document()
            }
            BsonType::String => w.write_string(&value.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            other => Err(unsupported::<DateTime<FixedOffset>>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<DateTime<FixedOffset>> {
        match r.current_bson_type()? {
            BsonType::Array => {
                r.read_start_array()?;
                let local_ticks = match r.read_bson_type()? {
                    BsonType::Int64 => r.read_int64()?,
                    other => return Err(cannot_deserialize::<i64>(other)),
                };
                let offset_minutes = match r.read_bson_type()? {
                    BsonType::Int32 => r.read_int32()?,
                    other => return Err(cannot_deserialize::<i32>(other)),
                };
                if r.read_bson_type()? != BsonType::EndOfDocument {
                    return Err(BsonError::format("Too many elements in a DateTime<FixedOffset> array."));
                }
                r.read_end_array()?;
                with_offset(local_ticks, offset_minutes)
            }
            BsonType::Document => {
                let mut local_ticks = None;
                let mut offset_minutes = None;
                r.read_start_document()?;
                while let Some((bson_type, name)) = next_element(r)? {
                    match (name.as_str(), bson_type) {
                        (DATE_TIME, BsonType::DateTime) => {
                            r.read_date_time()?;
                        }
                        (TICKS, BsonType::Int64) => local_ticks = Some(r.read_int64()?),
                        (OFFSET, BsonType::Int32) => offset_minutes = Some(r.read_int32()?),
                        _ => return Err(unexpected_element::<DateTime<FixedOffset>>(&name)),
                    }
                }
                r.read_end_document()?;
                let local_ticks =
                    local_ticks.ok_or_else(|| missing_element::<DateTime<FixedOffset>>(TICKS))?;
                let offset_minutes =
                    offset_minutes.ok_or_else(|| missing_element::<DateTime<FixedOffset>>(OFFSET))?;
                with_offset(local_ticks, offset_minutes)
            }
            BsonType::String => {
                let s = r.read_string()?;
                DateTime::parse_from_rfc3339(&s)
                    .map_err(|_| BsonError::format(format!("'{s}' is not a valid date time with offset.")))
            }
            other => Err(cannot_deserialize::<DateTime<FixedOffset>>(other)),
        }
    }
}

fn with_offset(local_ticks: i64, offset_minutes: i32) -> Result<DateTime<FixedOffset>> {
    let offset = offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| BsonError::format(format!("{offset_minutes} minutes is not a valid offset.")))?;
    let local = ticks::naive_from_ticks(local_ticks)?;
    offset.from_local_datetime(&local).single().ok_or_else(|| {
        BsonError::format(format!(
            "{local} with offset {offset} is not a valid {}.",
            any::type_name::<DateTime<FixedOffset>>()
        ))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::serializers::testing::{read, repr, round_trip, wire_type, wrap, write};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap() + chrono::TimeDelta::milliseconds(ms as i64)
    }

    fn date_time(representation: BsonType) -> SerializationOptions {
        SerializationOptions::DateTime(DateTimeOptions::new(representation))
    }

    #[test]
    fn utc_representations() {
        let value = utc(2011, 1, 2, 3, 4, 5, 678);
        for representation in [BsonType::DateTime, BsonType::Int64, BsonType::String, BsonType::Document] {
            let options = date_time(representation);
            assert_eq!(wire_type(&write(&value, Some(&options)).unwrap()), representation);
            round_trip(value, Some(&options));
        }
        assert_eq!(
            write(&value, None).unwrap(),
            wrap(|w| w.write_date_time(value.timestamp_millis()))
        );
        assert_eq!(
            write(&value, Some(&repr(BsonType::String))).unwrap(),
            wrap(|w| w.write_string("2011-01-02T03:04:05.678Z"))
        );
    }

    #[test]
    fn ticks_keep_precision() {
        let value = utc(2020, 5, 6, 7, 8, 9, 0) + chrono::TimeDelta::nanoseconds(1_234_500);
        round_trip(value, Some(&date_time(BsonType::Int64)));
        round_trip(value, Some(&date_time(BsonType::Document)));
    }

    #[test]
    fn limits_clamp() {
        let max = Utc.from_utc_datetime(&ticks::max_date_time());
        round_trip(max, None);
        let beyond = wrap(|w| w.write_date_time(i64::MAX));
        assert_eq!(read::<DateTime<Utc>>(&beyond, None).unwrap(), max);
    }

    #[test]
    fn date_only() {
        let options = SerializationOptions::DateTime(
            DateTimeOptions::new(BsonType::String).with_date_only(true),
        );
        let midnight = utc(2011, 1, 2, 0, 0, 0, 0);
        assert_eq!(
            write(&midnight, Some(&options)).unwrap(),
            wrap(|w| w.write_string("2011-01-02"))
        );
        round_trip(midnight, Some(&options));
        assert!(matches!(
            write(&utc(2011, 1, 2, 0, 0, 1, 0), Some(&options)),
            Err(BsonError::Serialization(_))
        ));

        let with_time = wrap(|w| w.write_string("2011-01-02T10:00:00Z"));
        assert!(matches!(
            read::<DateTime<Utc>>(&with_time, Some(&options)),
            Err(BsonError::Format(_))
        ));

        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        round_trip(date, None);
        round_trip(date, Some(&repr(BsonType::String)));
    }

    #[test]
    fn naive_and_local() {
        let naive = utc(2001, 2, 3, 4, 5, 6, 7).naive_utc();
        round_trip(naive, None);
        let local = SerializationOptions::DateTime(
            DateTimeOptions::new(BsonType::DateTime).with_kind(DateTimeKind::Local),
        );
        round_trip(naive, Some(&local));
        let unspecified = SerializationOptions::DateTime(
            DateTimeOptions::new(BsonType::Int64).with_kind(DateTimeKind::Unspecified),
        );
        round_trip(naive, Some(&unspecified));
        round_trip(Local.from_utc_datetime(&naive), None);
    }

    #[test]
    fn with_offsets() {
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let value = offset.with_ymd_and_hms(2010, 10, 11, 12, 13, 14).unwrap();
        assert_eq!(wire_type(&write(&value, None).unwrap()), BsonType::Array);
        for representation in [BsonType::Array, BsonType::Document, BsonType::String] {
            round_trip(value, Some(&repr(representation)));
        }
        assert_eq!(
            write(&value, Some(&repr(BsonType::String))).unwrap(),
            wrap(|w| w.write_string("2010-10-11T12:13:14-05:00"))
        );
        assert!(write(&value, Some(&repr(BsonType::Int64))).is_err());
    }
}
