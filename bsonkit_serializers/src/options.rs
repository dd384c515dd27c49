use bsonkit_types::{BsonError, BsonType, LossKind, Result};
use num_traits::{AsPrimitive, NumCast};
use std::any;

/// How a value is laid out on the wire. `None` wherever options are accepted
/// means the serializer's default.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializationOptions {
    Representation(RepresentationOptions),
    DateTime(DateTimeOptions),
    TimeSpan(TimeSpanOptions),
    Array(ArrayOptions),
    Dictionary(DictionaryOptions),
}

impl SerializationOptions {
    pub fn representation(representation: BsonType) -> Self {
        Self::Representation(RepresentationOptions::new(representation))
    }

    fn family(&self) -> &'static str {
        match self {
            Self::Representation(_) => "RepresentationOptions",
            Self::DateTime(_) => "DateTimeOptions",
            Self::TimeSpan(_) => "TimeSpanOptions",
            Self::Array(_) => "ArrayOptions",
            Self::Dictionary(_) => "DictionaryOptions",
        }
    }
}

fn invalid_options<T>(expected: &'static str, found: &SerializationOptions) -> BsonError {
    invalid_options_for(any::type_name::<T>(), expected, found)
}

fn invalid_options_for(type_name: &'static str, expected: &'static str, found: &SerializationOptions) -> BsonError {
    tracing::debug!(type_name, found = found.family(), expected, "Mismatched options family.");
    BsonError::InvalidOptions { type_name, expected }
}

/* representation */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepresentationOptions {
    pub representation: BsonType,
    pub allow_overflow: bool,
    pub allow_truncation: bool,
}

impl RepresentationOptions {
    pub fn new(representation: BsonType) -> Self {
        Self {
            representation,
            allow_overflow: false,
            allow_truncation: false,
        }
    }

    pub fn with_allow_overflow(mut self, allow_overflow: bool) -> Self {
        self.allow_overflow = allow_overflow;
        self
    }

    pub fn with_allow_truncation(mut self, allow_truncation: bool) -> Self {
        self.allow_truncation = allow_truncation;
        self
    }

    /// The options for a `T` serializer whose default representation is `default`.
    pub fn resolve<T>(options: Option<&SerializationOptions>, default: BsonType) -> Result<Self> {
        match options {
            None => Ok(Self::new(default)),
            Some(SerializationOptions::Representation(repr)) => Ok(*repr),
            Some(other) => Err(invalid_options::<T>("RepresentationOptions", other)),
        }
    }

    /// Numeric conversion between primitive types. A value outside the range
    /// of `D` overflows; a value inside it that does not survive the round
    /// trip back to `S` is truncated. Each fails unless allowed, in which case
    /// the plain cast result is returned.
    ///
    /// The trip back is checked as well, so `i64::MAX` rounding up to the
    /// double `2^63` counts as truncated.
    pub fn convert<S, D>(&self, value: S) -> Result<D>
    where
        S: Copy + PartialEq + NumCast + AsPrimitive<D>,
        D: Copy + NumCast + 'static,
    {
        match <D as NumCast>::from(value) {
            Some(converted) => {
                let exact = match <S as NumCast>::from(converted) {
                    Some(widened) => widened == value || (is_nan(widened) && is_nan(value)),
                    None => false,
                };
                if exact || self.allow_truncation {
                    Ok(converted)
                } else {
                    Err(lossy::<S, D>(LossKind::Truncation))
                }
            }
            None if self.allow_overflow => Ok(value.as_()),
            None => Err(lossy::<S, D>(LossKind::Overflow)),
        }
    }

    pub fn check_overflow(&self, overflowed: bool, from: &'static str, to: &'static str) -> Result<()> {
        self.check(LossKind::Overflow, overflowed, from, to)
    }

    pub fn check_truncation(&self, truncated: bool, from: &'static str, to: &'static str) -> Result<()> {
        self.check(LossKind::Truncation, truncated, from, to)
    }

    fn check(&self, kind: LossKind, lost: bool, from: &'static str, to: &'static str) -> Result<()> {
        let allowed = match kind {
            LossKind::Overflow => self.allow_overflow,
            LossKind::Truncation => self.allow_truncation,
        };
        if lost && !allowed {
            return Err(BsonError::LossyConversion { kind, from, to });
        }
        Ok(())
    }
}

#[allow(clippy::eq_op)]
fn is_nan<T: PartialEq + Copy>(value: T) -> bool {
    value != value
}

fn lossy<S, D>(kind: LossKind) -> BsonError {
    BsonError::LossyConversion {
        kind,
        from: any::type_name::<S>(),
        to: any::type_name::<D>(),
    }
}

/* date time */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateTimeKind {
    #[default]
    Utc,
    Local,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeOptions {
    pub representation: BsonType,
    pub kind: DateTimeKind,
    pub date_only: bool,
}

impl Default for DateTimeOptions {
    fn default() -> Self {
        Self {
            representation: BsonType::DateTime,
            kind: DateTimeKind::Utc,
            date_only: false,
        }
    }
}

impl DateTimeOptions {
    pub fn new(representation: BsonType) -> Self {
        Self {
            representation,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: DateTimeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_date_only(mut self, date_only: bool) -> Self {
        self.date_only = date_only;
        self
    }

    /// Accepts plain representation options as well.
    pub fn resolve<T>(options: Option<&SerializationOptions>, default: BsonType) -> Result<Self> {
        match options {
            None => Ok(Self::new(default)),
            Some(SerializationOptions::DateTime(opts)) => Ok(*opts),
            Some(SerializationOptions::Representation(repr)) => Ok(Self::new(repr.representation)),
            Some(other) => Err(invalid_options::<T>("DateTimeOptions", other)),
        }
    }
}

/* time span */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSpanUnits {
    #[default]
    Ticks,
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpanOptions {
    pub representation: BsonType,
    pub units: TimeSpanUnits,
}

impl Default for TimeSpanOptions {
    fn default() -> Self {
        Self {
            representation: BsonType::String,
            units: TimeSpanUnits::Ticks,
        }
    }
}

impl TimeSpanOptions {
    pub fn new(representation: BsonType, units: TimeSpanUnits) -> Self {
        Self {
            representation,
            units,
        }
    }

    /// Accepts plain representation options as well, with tick units.
    pub fn resolve<T>(options: Option<&SerializationOptions>) -> Result<Self> {
        match options {
            None => Ok(Self::default()),
            Some(SerializationOptions::TimeSpan(opts)) => Ok(*opts),
            Some(SerializationOptions::Representation(repr)) => {
                Ok(Self::new(repr.representation, TimeSpanUnits::Ticks))
            }
            Some(other) => Err(invalid_options::<T>("TimeSpanOptions", other)),
        }
    }
}

/* containers */

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayOptions {
    pub item_options: Option<Box<SerializationOptions>>,
}

impl ArrayOptions {
    pub fn with_item_options(item_options: SerializationOptions) -> Self {
        Self {
            item_options: Some(Box::new(item_options)),
        }
    }

    /// The item options. Containers are erased, so the caller names its type.
    pub fn resolve<'o>(
        type_name: &'static str,
        options: Option<&'o SerializationOptions>,
    ) -> Result<Option<&'o SerializationOptions>> {
        match options {
            None => Ok(None),
            Some(SerializationOptions::Array(opts)) => Ok(opts.item_options.as_deref()),
            Some(other) => Err(invalid_options_for(type_name, "ArrayOptions", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictionaryRepresentation {
    /// A document when every key is a usable element name, else `ArrayOfArrays`.
    #[default]
    Dynamic,
    Document,
    ArrayOfArrays,
    ArrayOfDocuments,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DictionaryOptions {
    pub representation: DictionaryRepresentation,
    pub key_options: Option<Box<SerializationOptions>>,
    pub value_options: Option<Box<SerializationOptions>>,
}

impl DictionaryOptions {
    pub fn new(representation: DictionaryRepresentation) -> Self {
        Self {
            representation,
            ..Self::default()
        }
    }

    pub fn with_key_options(mut self, key_options: SerializationOptions) -> Self {
        self.key_options = Some(Box::new(key_options));
        self
    }

    pub fn with_value_options(mut self, value_options: SerializationOptions) -> Self {
        self.value_options = Some(Box::new(value_options));
        self
    }

    pub fn resolve<'o>(
        type_name: &'static str,
        options: Option<&'o SerializationOptions>,
    ) -> Result<Option<&'o DictionaryOptions>> {
        match options {
            None => Ok(None),
            Some(SerializationOptions::Dictionary(opts)) => Ok(Some(opts)),
            Some(other) => Err(invalid_options_for(type_name, "DictionaryOptions", other)),
        }
    }
}
