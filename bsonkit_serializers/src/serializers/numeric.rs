use super::{cannot_deserialize, invalid_text, unsupported};
use crate::describe::Describe;
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BsonType, Result};
use num_traits::{AsPrimitive, Float, NumCast};
use std::fmt::{Debug, Display};
use std::marker::PhantomData;
use std::str::FromStr;

/* integers */

pub trait BsonInteger:
    Describe + Copy + PartialEq + NumCast + FromStr + Display + AsPrimitive<i32> + AsPrimitive<i64> + AsPrimitive<f64>
{
    const DEFAULT_REPRESENTATION: BsonType;
}

macro_rules! bson_integer {
    ($($t:ty => $repr:ident),* $(,)?) => {
        $(impl BsonInteger for $t {
            const DEFAULT_REPRESENTATION: BsonType = BsonType::$repr;
        })*
    };
}

bson_integer!(
    i8 => Int32,
    i16 => Int32,
    i32 => Int32,
    u8 => Int32,
    u16 => Int32,
    i64 => Int64,
    u32 => Int64,
    u64 => Int64,
);

/// Integers as Int32, Int64, Double or decimal text. Narrowing in either
/// direction is checked against the representation options.
pub struct IntegerSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: BsonInteger> IntegerSerializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: BsonInteger> Default for IntegerSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueSerializer for IntegerSerializer<T>
where
    T: BsonInteger,
    i32: AsPrimitive<T>,
    i64: AsPrimitive<T>,
    f64: AsPrimitive<T>,
{
    type Value = T;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &T,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<T>(options, T::DEFAULT_REPRESENTATION)?;
        match repr.representation {
            BsonType::Int32 => w.write_int32(repr.convert::<T, i32>(*value)?),
            BsonType::Int64 => w.write_int64(repr.convert::<T, i64>(*value)?),
            BsonType::Double => w.write_double(repr.convert::<T, f64>(*value)?),
            BsonType::String => w.write_string(&value.to_string()),
            other => Err(unsupported::<T>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<T> {
        let repr = RepresentationOptions::resolve::<T>(options, T::DEFAULT_REPRESENTATION)?;
        match r.current_bson_type()? {
            BsonType::Int32 => repr.convert::<i32, T>(r.read_int32()?),
            BsonType::Int64 => repr.convert::<i64, T>(r.read_int64()?),
            BsonType::Double => repr.convert::<f64, T>(r.read_double()?),
            BsonType::String => {
                let s = r.read_string()?;
                s.trim().parse::<T>().map_err(|_| invalid_text::<T>(&s))
            }
            other => Err(cannot_deserialize::<T>(other)),
        }
    }
}

/* floats */

pub trait BsonFloat:
    Describe + Float + NumCast + FromStr + Debug + AsPrimitive<i32> + AsPrimitive<i64> + AsPrimitive<f64>
{
    fn to_double(self) -> f64;

    fn from_double(value: f64, repr: &RepresentationOptions) -> Result<Self>;
}

impl BsonFloat for f64 {
    fn to_double(self) -> f64 {
        self
    }

    fn from_double(value: f64, _repr: &RepresentationOptions) -> Result<Self> {
        Ok(value)
    }
}

/// `f32::MIN`/`MAX` stand for `f64::MIN`/`MAX` on the wire.
impl BsonFloat for f32 {
    fn to_double(self) -> f64 {
        if self == f32::MIN {
            f64::MIN
        } else if self == f32::MAX {
            f64::MAX
        } else {
            self as f64
        }
    }

    fn from_double(value: f64, repr: &RepresentationOptions) -> Result<Self> {
        if value == f64::MIN {
            Ok(f32::MIN)
        } else if value == f64::MAX {
            Ok(f32::MAX)
        } else if value.is_finite() && value.abs() > f32::MAX as f64 {
            repr.check_overflow(true, "f64", "f32")?;
            Ok(value as f32)
        } else {
            repr.convert::<f64, f32>(value)
        }
    }
}

pub struct FloatSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: BsonFloat> FloatSerializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: BsonFloat> Default for FloatSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueSerializer for FloatSerializer<T>
where
    T: BsonFloat,
    i32: AsPrimitive<T>,
    i64: AsPrimitive<T>,
{
    type Value = T;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &T,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<T>(options, BsonType::Double)?;
        match repr.representation {
            BsonType::Double => w.write_double(value.to_double()),
            BsonType::Int32 => w.write_int32(repr.convert::<T, i32>(*value)?),
            BsonType::Int64 => w.write_int64(repr.convert::<T, i64>(*value)?),
            BsonType::String => w.write_string(&format_float(*value)),
            other => Err(unsupported::<T>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<T> {
        let repr = RepresentationOptions::resolve::<T>(options, BsonType::Double)?;
        match r.current_bson_type()? {
            BsonType::Double => T::from_double(r.read_double()?, &repr),
            BsonType::Int32 => repr.convert::<i32, T>(r.read_int32()?),
            BsonType::Int64 => repr.convert::<i64, T>(r.read_int64()?),
            BsonType::String => {
                let s = r.read_string()?;
                s.trim().parse::<T>().map_err(|_| invalid_text::<T>(&s))
            }
            other => Err(cannot_deserialize::<T>(other)),
        }
    }
}

/// Shortest round-trip text, with `NaN`, `Infinity` and `-Infinity`.
fn format_float<T: BsonFloat>(value: T) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_owned()
    } else {
        format!("{value:?}")
    }
}
