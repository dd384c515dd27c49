use super::{cannot_deserialize, invalid_text, unsupported};
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BsonType, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanSerializer;

impl ValueSerializer for BooleanSerializer {
    type Value = bool;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &bool,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<bool>(options, BsonType::Boolean)?;
        match repr.representation {
            BsonType::Boolean => w.write_boolean(*value),
            BsonType::Double => w.write_double(if *value { 1.0 } else { 0.0 }),
            BsonType::Int32 => w.write_int32(*value as i32),
            BsonType::Int64 => w.write_int64(*value as i64),
            BsonType::String => w.write_string(if *value { "true" } else { "false" }),
            other => Err(unsupported::<bool>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<bool> {
        match r.current_bson_type()? {
            BsonType::Boolean => r.read_boolean(),
            BsonType::Double => Ok(r.read_double()? != 0.0),
            BsonType::Int32 => Ok(r.read_int32()? != 0),
            BsonType::Int64 => Ok(r.read_int64()? != 0),
            BsonType::String => parse_bool(&r.read_string()?),
            other => Err(cannot_deserialize::<bool>(other)),
        }
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid_text::<bool>(s)),
    }
}
