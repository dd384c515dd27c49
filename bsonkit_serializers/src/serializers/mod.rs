//! Built-in serializers. Each accepts every representation listed for its type
//! on read and writes the one selected by its options.

mod binary;
mod bit_set;
mod boolean;
mod culture;
mod decimal;
mod dictionary;
mod enumeration;
mod guid;
mod net;
mod nullable;
mod numeric;
mod sequence;
mod temporal;
mod text;
mod time_span;
mod version;

pub use binary::{ByteArraySerializer, ObjectIdSerializer};
pub use bit_set::BitSetSerializer;
pub use boolean::BooleanSerializer;
pub use culture::CultureSerializer;
pub use decimal::DecimalSerializer;
pub use dictionary::{DictionarySerializer, DictionarySerializerDefinition};
pub use enumeration::{BsonEnum, EnumSerializer};
pub use guid::GuidSerializer;
pub use net::{IpAddrSerializer, SocketAddrSerializer, UriSerializer};
pub use nullable::{BsonNullSerializer, NullableSerializer, NONE_SENTINEL};
pub use numeric::{BsonFloat, BsonInteger, FloatSerializer, IntegerSerializer};
pub use sequence::{SequenceKind, SequenceSerializer, SequenceSerializerDefinition};
pub use temporal::{DateTimeOffsetSerializer, DateTimeSerializer, DateTimeValue};
pub use text::{CharSerializer, StringSerializer};
pub use time_span::TimeSpanSerializer;
pub use version::VersionSerializer;

use bsonkit_types::io::BsonReader;
use bsonkit_types::{BsonError, BsonType, Result};
use std::any;

fn unsupported<T>(representation: BsonType) -> BsonError {
    BsonError::UnsupportedRepresentation {
        type_name: any::type_name::<T>(),
        representation,
    }
}

fn cannot_deserialize<T>(bson_type: BsonType) -> BsonError {
    BsonError::cannot_deserialize(any::type_name::<T>(), bson_type)
}

fn invalid_text<T>(text: &str) -> BsonError {
    BsonError::format(format!(
        "'{}' is not a valid {}.",
        text.escape_debug(),
        any::type_name::<T>()
    ))
}

/// Reads the next element of a document and returns its name, or `None` at
/// the end of the document.
fn next_element(r: &mut dyn BsonReader) -> Result<Option<(BsonType, String)>> {
    let bson_type = r.read_bson_type()?;
    if bson_type == BsonType::EndOfDocument {
        return Ok(None);
    }
    let name = r.current_name().unwrap_or_default().to_owned();
    Ok(Some((bson_type, name)))
}

fn unexpected_element<T>(name: &str) -> BsonError {
    BsonError::format(format!(
        "Invalid element '{}' while deserializing {}.",
        name.escape_debug(),
        any::type_name::<T>()
    ))
}

fn missing_element<T>(name: &str) -> BsonError {
    BsonError::format(format!(
        "Missing element '{name}' while deserializing {}.",
        any::type_name::<T>()
    ))
}
