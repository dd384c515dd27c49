use super::fixtures::{self, Bag, CountingDefinition, BAG};
use super::{open, read, round_trip, write};
use anyhow::Result;
use bsonkit_serializers::options::{ArrayOptions, DictionaryOptions, DictionaryRepresentation};
use bsonkit_serializers::{SerializationOptions, SerializerRegistry, Stack};
use bsonkit_types::io::{BsonBinaryReader, BsonReader};
use bsonkit_types::{BsonError, BsonType};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::Arc;

pub fn test_list_layout() -> Result<()> {
    let registry = SerializerRegistry::with_defaults();
    let bytes = write(&registry, &vec![1i32, 2, 3], None)?;
    let mut r = open(&bytes)?;
    assert_eq!(r.current_bson_type()?, BsonType::Array);
    r.read_start_array()?;
    for (i, expected) in [1, 2, 3].into_iter().enumerate() {
        assert_eq!(r.read_bson_type()?, BsonType::Int32);
        assert_eq!(r.current_name(), Some(i.to_string().as_str()));
        assert_eq!(r.read_int32()?, expected);
    }
    assert_eq!(r.read_bson_type()?, BsonType::EndOfDocument);
    r.read_end_array()?;

    let as_text = SerializationOptions::Array(ArrayOptions::with_item_options(
        SerializationOptions::representation(BsonType::String),
    ));
    round_trip(&registry, vec![10u64, 20], Some(&as_text))?;
    round_trip(&registry, vec![vec!["a".to_owned()], vec![]], None)?;
    Ok(())
}

pub fn test_map_shapes() -> Result<()> {
    let registry = SerializerRegistry::with_defaults();

    let named = BTreeMap::from([("a".to_owned(), 1i32), ("b".to_owned(), 2)]);
    let bytes = write(&registry, &named, None)?;
    let mut r = open(&bytes)?;
    assert_eq!(r.current_bson_type()?, BsonType::Document);
    r.read_start_document()?;
    for (name, value) in [("a", 1), ("b", 2)] {
        assert_eq!(r.read_bson_type()?, BsonType::Int32);
        assert_eq!(r.current_name(), Some(name));
        assert_eq!(r.read_int32()?, value);
    }
    assert_eq!(r.read_bson_type()?, BsonType::EndOfDocument);
    round_trip(&registry, named, None)?;

    let numbered = BTreeMap::from([(1i32, "x".to_owned()), (2, "y".to_owned())]);
    let bytes = write(&registry, &numbered, None)?;
    let mut r = open(&bytes)?;
    assert_eq!(r.current_bson_type()?, BsonType::Array);
    r.read_start_array()?;
    for (key, value) in [(1, "x"), (2, "y")] {
        assert_eq!(r.read_bson_type()?, BsonType::Array);
        r.read_start_array()?;
        r.read_bson_type()?;
        assert_eq!(r.read_int32()?, key);
        r.read_bson_type()?;
        assert_eq!(r.read_string()?, value);
        assert_eq!(r.read_bson_type()?, BsonType::EndOfDocument);
        r.read_end_array()?;
    }
    round_trip(&registry, numbered, None)?;

    let awkward = HashMap::from([("$set".to_owned(), 1i32), ("a.b".to_owned(), 2), ("_t".to_owned(), 3)]);
    let bytes = write(&registry, &awkward, None)?;
    assert_eq!(open(&bytes)?.current_bson_type()?, BsonType::Array);
    round_trip(&registry, awkward, None)?;

    let forced = SerializationOptions::Dictionary(DictionaryOptions::new(DictionaryRepresentation::Document));
    let err = write(&registry, &BTreeMap::from([(1i32, 1i32)]), Some(&forced)).unwrap_err();
    assert!(matches!(err, BsonError::Serialization(_)));

    let documents =
        SerializationOptions::Dictionary(DictionaryOptions::new(DictionaryRepresentation::ArrayOfDocuments));
    round_trip(&registry, HashMap::from([(5u16, 0.5f64)]), Some(&documents))?;
    Ok(())
}

pub fn test_stack_order() -> Result<()> {
    let registry = SerializerRegistry::with_defaults();
    let mut stack = Stack::new();
    for i in [1i32, 2, 3] {
        stack.push(i);
    }
    let bytes = write(&registry, &stack, None)?;
    assert_eq!(bytes, write(&registry, &vec![1i32, 2, 3], None)?);

    let mut back: Stack<i32> = read(&registry, &bytes, None)?;
    assert_eq!(back.len(), 3);
    assert_eq!(back.pop(), Some(3));
    assert_eq!(back.pop(), Some(2));
    assert_eq!(back.pop(), Some(1));
    assert!(back.is_empty());
    Ok(())
}

pub fn test_user_defined_shape() -> Result<()> {
    let registry = fixtures::registry()?;
    assert!(matches!(
        registry.lookup::<Bag<i32>>(),
        Err(BsonError::UnregisteredType(_))
    ));

    let definition = Arc::new(CountingDefinition::default());
    registry.register_generic_definition(BAG, definition.clone())?;
    round_trip(&registry, Bag(vec![1i32, 2]), None)?;
    round_trip(&registry, Bag(vec!["a".to_owned()]), None)?;
    round_trip(&registry, Bag(vec![1i32]), None)?;
    assert_eq!(definition.closings(), 2);

    let bytes = write(&registry, &Bag(vec![7i64]), None)?;
    let mut r = BsonBinaryReader::new(Cursor::new(&bytes[..]))?;
    r.read_start_document()?;
    assert_eq!(r.read_bson_type()?, BsonType::Array);
    Ok(())
}
