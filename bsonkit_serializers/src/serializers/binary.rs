use super::{cannot_deserialize, unsupported};
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::{hex, ObjectId};
use bsonkit_types::{BinarySubType, BsonError, BsonType, Result};

/// A byte sequence as generic binary data (default) or as hex text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteArraySerializer;

impl ValueSerializer for ByteArraySerializer {
    type Value = Vec<u8>;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Vec<u8>,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<Vec<u8>>(options, BsonType::Binary)?;
        match repr.representation {
            BsonType::Binary => w.write_binary_data(value, BinarySubType::Binary),
            BsonType::String => w.write_string(&hex::encode(value)),
            other => Err(unsupported::<Vec<u8>>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<Vec<u8>> {
        match r.current_bson_type()? {
            BsonType::Binary => match r.read_binary_data()? {
                (bytes, BinarySubType::Binary | BinarySubType::OldBinary) => Ok(bytes),
                (_, sub_type) => Err(BsonError::format(format!(
                    "Invalid binary sub type {sub_type:?} for a byte array."
                ))),
            },
            BsonType::String => hex::decode(&r.read_string()?),
            other => Err(cannot_deserialize::<Vec<u8>>(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdSerializer;

impl ValueSerializer for ObjectIdSerializer {
    type Value = ObjectId;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &ObjectId,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<ObjectId>(options, BsonType::ObjectId)?;
        match repr.representation {
            BsonType::ObjectId => w.write_object_id(*value),
            BsonType::String => w.write_string(&value.to_hex()),
            other => Err(unsupported::<ObjectId>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<ObjectId> {
        match r.current_bson_type()? {
            BsonType::ObjectId => r.read_object_id(),
            BsonType::String => ObjectId::parse_str(&r.read_string()?),
            other => Err(cannot_deserialize::<ObjectId>(other)),
        }
    }
}
