use super::{cannot_deserialize, unsupported};
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::Decimal;
use bsonkit_types::{BsonError, BsonType, Result};

/// `Decimal` as text (default), as its four 32-bit words, or as a number.
/// `Decimal::MIN`/`MAX` stand for `f64::MIN`/`MAX` in the Double form.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalSerializer;

impl ValueSerializer for DecimalSerializer {
    type Value = Decimal;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Decimal,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<Decimal>(options, BsonType::String)?;
        match repr.representation {
            BsonType::String => w.write_string(&value.to_string()),
            BsonType::Array => {
                w.write_start_array()?;
                for word in value.to_bits() {
                    w.write_int32(word)?;
                }
                w.write_end_array()
            }
            BsonType::Double => w.write_double(to_double(value, &repr)?),
            BsonType::Int32 => {
                let int = to_integer(value, &repr, "i32")?;
                let narrowed = i32::try_from(int);
                repr.check_overflow(narrowed.is_err(), "Decimal", "i32")?;
                w.write_int32(narrowed.unwrap_or(int as i32))
            }
            BsonType::Int64 => {
                let int = to_integer(value, &repr, "i64")?;
                let narrowed = i64::try_from(int);
                repr.check_overflow(narrowed.is_err(), "Decimal", "i64")?;
                w.write_int64(narrowed.unwrap_or(int as i64))
            }
            other => Err(unsupported::<Decimal>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<Decimal> {
        let repr = RepresentationOptions::resolve::<Decimal>(options, BsonType::String)?;
        match r.current_bson_type()? {
            BsonType::String => r.read_string()?.trim().parse(),
            BsonType::Array => read_bits(r),
            BsonType::Double => from_double(r.read_double()?, &repr),
            BsonType::Int32 => Ok(Decimal::from(r.read_int32()?)),
            BsonType::Int64 => Ok(Decimal::from(r.read_int64()?)),
            other => Err(cannot_deserialize::<Decimal>(other)),
        }
    }
}

fn to_double(value: &Decimal, repr: &RepresentationOptions) -> Result<f64> {
    if *value == Decimal::MIN {
        return Ok(f64::MIN);
    }
    if *value == Decimal::MAX {
        return Ok(f64::MAX);
    }
    let double = value.to_f64();
    repr.check_truncation(Decimal::from_f64(double) != Some(*value), "Decimal", "f64")?;
    Ok(double)
}

fn from_double(double: f64, repr: &RepresentationOptions) -> Result<Decimal> {
    if double == f64::MIN {
        return Ok(Decimal::MIN);
    }
    if double == f64::MAX {
        return Ok(Decimal::MAX);
    }
    if double.is_nan() {
        return Err(BsonError::format("NaN cannot be converted to Decimal."));
    }
    match Decimal::from_f64(double) {
        Some(value) => {
            repr.check_truncation(value.to_f64() != double, "f64", "Decimal")?;
            Ok(value)
        }
        None => {
            repr.check_overflow(true, "f64", "Decimal")?;
            Ok(if double < 0.0 { Decimal::MIN } else { Decimal::MAX })
        }
    }
}

fn to_integer(value: &Decimal, repr: &RepresentationOptions, to: &'static str) -> Result<i128> {
    repr.check_truncation(!value.is_integral(), "Decimal", to)?;
    Ok(value.trunc_to_i128())
}

fn read_bits(r: &mut dyn BsonReader) -> Result<Decimal> {
    r.read_start_array()?;
    let mut bits = [0i32; 4];
    for word in &mut bits {
        match r.read_bson_type()? {
            BsonType::Int32 => *word = r.read_int32()?,
            other => {
                return Err(BsonError::format(format!(
                    "Expected four Int32 words for a Decimal, found {other}."
                )))
            }
        }
    }
    if r.read_bson_type()? != BsonType::EndOfDocument {
        return Err(BsonError::format("Expected four Int32 words for a Decimal."));
    }
    r.read_end_array()?;
    Decimal::from_bits(bits)
}
