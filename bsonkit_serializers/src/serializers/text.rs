use super::{cannot_deserialize, invalid_text, unsupported};
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::ObjectId;
use bsonkit_types::{BsonError, BsonType, Result};

/* char */

/// A `char` as its code point (default) or as one-character text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharSerializer;

impl ValueSerializer for CharSerializer {
    type Value = char;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &char,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<char>(options, BsonType::Int32)?;
        match repr.representation {
            BsonType::Int32 => w.write_int32(*value as u32 as i32),
            BsonType::String => w.write_string(value.encode_utf8(&mut [0; 4])),
            other => Err(unsupported::<char>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<char> {
        match r.current_bson_type()? {
            BsonType::Int32 => {
                let code = r.read_int32()?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| BsonError::format(format!("{code} is not a valid char.")))
            }
            BsonType::String => {
                let s = r.read_string()?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(invalid_text::<char>(&s)),
                }
            }
            other => Err(cannot_deserialize::<char>(other)),
        }
    }
}

/* string */

/// Text as String (default), Symbol, or an ObjectId given as 24 hex digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

impl ValueSerializer for StringSerializer {
    type Value = String;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &String,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<String>(options, BsonType::String)?;
        match repr.representation {
            BsonType::String => w.write_string(value),
            BsonType::Symbol => w.write_symbol(value),
            BsonType::ObjectId => w.write_object_id(ObjectId::parse_str(value)?),
            other => Err(unsupported::<String>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<String> {
        match r.current_bson_type()? {
            BsonType::String => r.read_string(),
            BsonType::Symbol => r.read_symbol(),
            BsonType::ObjectId => Ok(r.read_object_id()?.to_hex()),
            other => Err(cannot_deserialize::<String>(other)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::serializers::testing::{read, repr, round_trip, wrap, write};

    #[test]
    fn chars() {
        for c in ['a', 'é', '😀', '\0'] {
            round_trip(c, None);
            round_trip(c, Some(&repr(BsonType::String)));
        }
        assert_eq!(write(&'A', None).unwrap(), wrap(|w| w.write_int32(65)));
        let bytes = wrap(|w| w.write_string("ab"));
        assert!(read::<char>(&bytes, None).is_err());
        let bytes = wrap(|w| w.write_int32(0xD800));
        assert!(read::<char>(&bytes, None).is_err());
    }

    #[test]
    fn strings() {
        round_trip("plain".to_owned(), None);
        round_trip("sym".to_owned(), Some(&repr(BsonType::Symbol)));
        let hex = "0102030405060708090a0b0c".to_owned();
        let bytes = write(&hex, Some(&repr(BsonType::ObjectId))).unwrap();
        let oid = ObjectId::parse_str(&hex).unwrap();
        assert_eq!(bytes, wrap(|w| w.write_object_id(oid)));
        assert_eq!(read::<String>(&bytes, None).unwrap(), hex);
        assert!(write(&"xyz".to_owned(), Some(&repr(BsonType::ObjectId))).is_err());
        assert!(write(&"xyz".to_owned(), Some(&repr(BsonType::Int32))).is_err());
    }
}
