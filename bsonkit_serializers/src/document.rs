//! Top-level entry points: whole documents to and from readers, writers and
//! byte buffers.

use crate::describe::Describe;
use crate::options::SerializationOptions;
use crate::registry::SerializerRegistry;
use crate::serializer::SerializationContext;
use bsonkit_types::io::{
    BsonBinaryReader, BsonBinaryWriter, BsonReader, BsonWriter, ReaderSettings, WriterSettings,
};
use bsonkit_types::{BsonError, BsonType, Result};
use std::io::{Cursor, Read, Seek};

/// Writes `value` as a top-level document. `T` must serialize as a document.
pub fn serialize_document<T: Describe>(
    registry: &SerializerRegistry,
    w: &mut dyn BsonWriter,
    value: &T,
) -> Result<()> {
    let ctx = SerializationContext::new(registry, T::describe());
    ctx.serialize_member(w, value, None)
}

pub fn deserialize_document<T: Describe>(registry: &SerializerRegistry, r: &mut dyn BsonReader) -> Result<T> {
    let ctx = SerializationContext::new(registry, T::describe());
    ctx.deserialize_member(r, None)
}

/// Reads the next top-level document from a stream. On failure the reader is
/// moved past the offending document, so the following one can still be read.
pub fn read_document<T: Describe, R: Read + Seek>(
    registry: &SerializerRegistry,
    r: &mut BsonBinaryReader<R>,
) -> Result<T> {
    let start = r.position();
    let res = deserialize_document::<T>(registry, r);
    if res.is_err() {
        r.abandon_document(start)?;
    }
    res
}

pub fn to_document_bytes<T: Describe>(registry: &SerializerRegistry, value: &T) -> Result<Vec<u8>> {
    to_document_bytes_with_settings(registry, value, WriterSettings::default())
}

pub fn to_document_bytes_with_settings<T: Describe>(
    registry: &SerializerRegistry,
    value: &T,
    settings: WriterSettings,
) -> Result<Vec<u8>> {
    let mut w = BsonBinaryWriter::with_settings(vec![], settings);
    serialize_document(registry, &mut w, value)?;
    Ok(w.into_inner())
}

pub fn from_document_bytes<T: Describe>(registry: &SerializerRegistry, bytes: &[u8]) -> Result<T> {
    from_document_bytes_with_settings(registry, bytes, ReaderSettings::default())
}

pub fn from_document_bytes_with_settings<T: Describe>(
    registry: &SerializerRegistry,
    bytes: &[u8],
    settings: ReaderSettings,
) -> Result<T> {
    let mut r = BsonBinaryReader::with_settings(Cursor::new(bytes), settings)?;
    deserialize_document(registry, &mut r)
}

/* wrapped values */

/// Writes `value` as the single element `name` of a document, so that values
/// of any representation (not only documents) can be stored at top level.
pub fn to_wrapped_bytes<T: Describe>(
    registry: &SerializerRegistry,
    name: &str,
    value: &T,
    options: Option<&SerializationOptions>,
) -> Result<Vec<u8>> {
    let mut w = BsonBinaryWriter::new(vec![]);
    let ctx = SerializationContext::new(registry, T::describe());
    w.write_start_document()?;
    w.write_name(name)?;
    ctx.serialize_member(&mut w, value, options)?;
    w.write_end_document()?;
    Ok(w.into_inner())
}

pub fn from_wrapped_bytes<T: Describe>(
    registry: &SerializerRegistry,
    name: &str,
    bytes: &[u8],
    options: Option<&SerializationOptions>,
) -> Result<T> {
    let mut r = BsonBinaryReader::new(Cursor::new(bytes))?;
    let ctx = SerializationContext::new(registry, T::describe());
    r.read_start_document()?;
    r.read_element(name)?;
    let value = ctx.deserialize_member(&mut r, options)?;
    match r.read_bson_type()? {
        BsonType::EndOfDocument => r.read_end_document()?,
        _ => {
            return Err(BsonError::format(format!(
                "Expected a single element '{name}', found '{}' as well.",
                r.current_name().unwrap_or_default()
            )))
        }
    }
    Ok(value)
}
