use super::{cannot_deserialize, invalid_text, unsupported};
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::{GuidConverter, GuidRepresentation};
use bsonkit_types::{BinarySubType, BsonError, BsonType, Result};
use uuid::Uuid;

/// A GUID as binary data in the byte order the writer settings select, or
/// as hyphenated text.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidSerializer;

impl ValueSerializer for GuidSerializer {
    type Value = Uuid;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Uuid,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<Uuid>(options, BsonType::Binary)?;
        match repr.representation {
            BsonType::Binary => {
                let guid_repr = w.settings().guid_representation;
                let bytes = GuidConverter::to_bytes(value, guid_repr)?;
                w.write_binary_data(&bytes, guid_repr.sub_type()?)
            }
            BsonType::String => w.write_string(&value.hyphenated().to_string()),
            other => Err(unsupported::<Uuid>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<Uuid> {
        match r.current_bson_type()? {
            BsonType::Binary => {
                let guid_repr = r.settings().guid_representation;
                let (bytes, sub_type) = r.read_binary_data()?;
                match sub_type {
                    BinarySubType::UuidStandard => {
                        GuidConverter::from_bytes(&bytes, GuidRepresentation::Standard)
                    }
                    BinarySubType::UuidLegacy => match guid_repr {
                        GuidRepresentation::CSharpLegacy
                        | GuidRepresentation::JavaLegacy
                        | GuidRepresentation::PythonLegacy => GuidConverter::from_bytes(&bytes, guid_repr),
                        _ => Err(BsonError::format(format!(
                            "Binary sub type UuidLegacy requires a legacy GuidRepresentation, not {guid_repr:?}."
                        ))),
                    },
                    other => Err(BsonError::format(format!(
                        "Invalid binary sub type {other:?} for a Guid."
                    ))),
                }
            }
            BsonType::String => {
                let s = r.read_string()?;
                Uuid::parse_str(&s).map_err(|_| invalid_text::<Uuid>(&s))
            }
            other => Err(cannot_deserialize::<Uuid>(other)),
        }
    }
}
