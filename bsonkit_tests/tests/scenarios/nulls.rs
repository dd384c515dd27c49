use super::{open, read, round_trip, write};
use anyhow::Result;
use bsonkit_serializers::serializers::NONE_SENTINEL;
use bsonkit_serializers::SerializerRegistry;
use bsonkit_types::io::{BsonBinaryWriter, BsonReader, BsonWriter};
use bsonkit_types::values::BsonNull;
use bsonkit_types::BsonType;
use std::collections::BTreeMap;

pub fn test_null_and_absent() -> Result<()> {
    let registry = SerializerRegistry::with_defaults();

    // Zero is a value, not an absence.
    let bytes = write(&registry, &Some(0i32), None)?;
    let mut r = open(&bytes)?;
    assert_eq!(r.current_bson_type()?, BsonType::Int32);
    assert_eq!(r.read_int32()?, 0);

    let bytes = write(&registry, &None::<i32>, None)?;
    assert_eq!(open(&bytes)?.current_bson_type()?, BsonType::Null);
    assert_eq!(read::<Option<i32>>(&registry, &bytes, None)?, None);
    assert!(read::<i32>(&registry, &bytes, None).is_err());

    // Absent entries stay absent; null entries come back as None.
    let mut w = BsonBinaryWriter::new(vec![]);
    w.write_start_document()?;
    w.write_name("v")?;
    w.write_start_document()?;
    w.write_name("present")?;
    w.write_int32(0)?;
    w.write_name("null")?;
    w.write_null()?;
    w.write_end_document()?;
    w.write_end_document()?;
    let map: BTreeMap<String, Option<i32>> = read(&registry, &w.into_inner(), None)?;
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("present"), Some(&Some(0)));
    assert_eq!(map.get("null"), Some(&None));
    assert_eq!(map.get("absent"), None);

    // Where the inner value may itself be null, absence needs the sentinel.
    let bytes = write(&registry, &None::<Option<i32>>, None)?;
    let mut r = open(&bytes)?;
    r.read_start_document()?;
    assert_eq!(r.read_bson_type()?, BsonType::Boolean);
    assert_eq!(r.current_name(), Some(NONE_SENTINEL));
    for value in [None, Some(None), Some(Some(0i32))] {
        round_trip(&registry, value, None)?;
    }
    round_trip(&registry, vec![Some(BsonNull), None], None)?;
    Ok(())
}
