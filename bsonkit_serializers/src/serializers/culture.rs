use super::{cannot_deserialize, missing_element, next_element, unexpected_element, unsupported};
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::Culture;
use bsonkit_types::{BsonType, Result};

const NAME: &str = "Name";
const USE_USER_OVERRIDE: &str = "UseUserOverride";

/// A culture by name. A culture that ignores user overrides does not fit in
/// a name alone, so it is always written as a document:
///
/// ```text
/// { "Name": <string>, "UseUserOverride": <bool> }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CultureSerializer;

impl ValueSerializer for CultureSerializer {
    type Value = Culture;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Culture,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<Culture>(options, BsonType::String)?;
        match repr.representation {
            BsonType::String if value.use_user_override() => w.write_string(value.name()),
            BsonType::String | BsonType::Document => {
                w.write_start_document()?;
                w.write_name(NAME)?;
                w.write_string(value.name())?;
                w.write_name(USE_USER_OVERRIDE)?;
                w.write_boolean(value.use_user_override())?;
                w.write_end_document()
            }
            other => Err(unsupported::<Culture>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<Culture> {
        match r.current_bson_type()? {
            BsonType::String => Culture::new(&r.read_string()?),
            BsonType::Document => {
                let mut name = None;
                let mut use_user_override = None;
                r.read_start_document()?;
                while let Some((bson_type, element)) = next_element(r)? {
                    match (element.as_str(), bson_type) {
                        (NAME, BsonType::String) => name = Some(r.read_string()?),
                        (USE_USER_OVERRIDE, BsonType::Boolean) => use_user_override = Some(r.read_boolean()?),
                        _ => return Err(unexpected_element::<Culture>(&element)),
                    }
                }
                r.read_end_document()?;
                let name = name.ok_or_else(|| missing_element::<Culture>(NAME))?;
                let use_user_override =
                    use_user_override.ok_or_else(|| missing_element::<Culture>(USE_USER_OVERRIDE))?;
                Culture::with_user_override(&name, use_user_override)
            }
            other => Err(cannot_deserialize::<Culture>(other)),
        }
    }
}
