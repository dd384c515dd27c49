use super::{cannot_deserialize, invalid_text, unsupported};
use crate::describe::Describe;
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BsonError, BsonType, LossKind, Result};
use num_traits::{FromPrimitive, ToPrimitive};
use std::any;
use std::marker::PhantomData;

/// A fieldless enum with integer discriminants. Derive the numeric
/// conversions with `num-derive` and list the variant names:
///
/// ```ignore
/// #[derive(Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
/// enum Color { Red = 1, Green = 2 }
///
/// impl Describe for Color {}
/// impl BsonEnum for Color {
///     fn variants() -> &'static [(Self, &'static str)] {
///         &[(Color::Red, "Red"), (Color::Green, "Green")]
///     }
/// }
/// ```
pub trait BsonEnum: Describe + Copy + PartialEq + FromPrimitive + ToPrimitive {
    fn variants() -> &'static [(Self, &'static str)];

    fn name(&self) -> Option<&'static str> {
        Self::variants()
            .iter()
            .find(|(variant, _)| variant == self)
            .map(|(_, name)| *name)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::variants()
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(variant, _)| *variant)
    }
}

/// Enums by number, in the narrowest of Int32 and Int64 that fits the
/// value unless a representation is given, or by variant name as String.
pub struct EnumSerializer<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E: BsonEnum> EnumSerializer<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E: BsonEnum> Default for EnumSerializer<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn discriminant<E: BsonEnum>(value: &E) -> Result<i64> {
    value.to_i64().ok_or(BsonError::LossyConversion {
        kind: LossKind::Overflow,
        from: any::type_name::<E>(),
        to: "i64",
    })
}

fn from_discriminant<E: BsonEnum>(n: i64) -> Result<E> {
    E::from_i64(n).ok_or_else(|| {
        BsonError::format(format!("{n} is not a valid value of {}.", any::type_name::<E>()))
    })
}

impl<E: BsonEnum> ValueSerializer for EnumSerializer<E> {
    type Value = E;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &E,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let representation = match options {
            None => None,
            Some(_) => Some(RepresentationOptions::resolve::<E>(options, BsonType::Int32)?),
        };
        match representation {
            None => {
                let n = discriminant(value)?;
                match i32::try_from(n) {
                    Ok(n) => w.write_int32(n),
                    Err(_) => w.write_int64(n),
                }
            }
            Some(repr) => match repr.representation {
                BsonType::Int32 => w.write_int32(repr.convert::<i64, i32>(discriminant(value)?)?),
                BsonType::Int64 => w.write_int64(discriminant(value)?),
                BsonType::String => {
                    let name = value.name().ok_or_else(|| {
                        BsonError::Serialization(format!(
                            "Value {} of {} has no name.",
                            value.to_i64().unwrap_or_default(),
                            any::type_name::<E>()
                        ))
                    })?;
                    w.write_string(name)
                }
                other => Err(unsupported::<E>(other)),
            },
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<E> {
        match r.current_bson_type()? {
            BsonType::Int32 => from_discriminant(r.read_int32()? as i64),
            BsonType::Int64 => from_discriminant(r.read_int64()?),
            BsonType::String => {
                let s = r.read_string()?;
                E::from_name(&s).ok_or_else(|| invalid_text::<E>(&s))
            }
            other => Err(cannot_deserialize::<E>(other)),
        }
    }
}
