pub mod concurrency;
pub mod containers;
pub mod fixtures;
pub mod nulls;
pub mod polymorphism;
pub mod primitives;
pub mod records;
pub mod recovery;

use anyhow::Result;
use bsonkit_serializers::{Describe, SerializationOptions, SerializerRegistry};
use bsonkit_types::io::{BsonBinaryReader, BsonReader};
use bsonkit_types::BsonType;
use std::fmt::Debug;
use std::io::Cursor;

pub fn write<T: Describe>(
    registry: &SerializerRegistry,
    value: &T,
    options: Option<&SerializationOptions>,
) -> bsonkit_types::Result<Vec<u8>> {
    bsonkit_serializers::to_wrapped_bytes(registry, "v", value, options)
}

pub fn read<T: Describe>(
    registry: &SerializerRegistry,
    bytes: &[u8],
    options: Option<&SerializationOptions>,
) -> bsonkit_types::Result<T> {
    bsonkit_serializers::from_wrapped_bytes(registry, "v", bytes, options)
}

pub fn round_trip<T: Describe + PartialEq + Debug>(
    registry: &SerializerRegistry,
    value: T,
    options: Option<&SerializationOptions>,
) -> Result<()> {
    let bytes = write(registry, &value, options)?;
    let back = read::<T>(registry, &bytes, options)?;
    assert_eq!(back, value);
    Ok(())
}

/// Reader positioned on the wrapped value.
pub fn open(bytes: &[u8]) -> Result<BsonBinaryReader<Cursor<&[u8]>>> {
    let mut r = BsonBinaryReader::new(Cursor::new(bytes))?;
    r.read_start_document()?;
    let bson_type = r.read_bson_type()?;
    assert_ne!(bson_type, BsonType::EndOfDocument);
    Ok(r)
}
