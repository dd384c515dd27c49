use super::fixtures::{self, Animal, Cat, Dog};
use super::{open, read, write};
use anyhow::Result;
use bsonkit_serializers::discriminator::DISCRIMINATOR_ELEMENT;
use bsonkit_serializers::polymorphic::ENVELOPE_VALUE;
use bsonkit_serializers::{AnyValue, Describe};
use bsonkit_types::io::{BsonBinaryWriter, BsonReader, BsonWriter};
use bsonkit_types::{BsonError, BsonType, DiscriminatorError};
use std::collections::HashMap;

fn dog() -> Dog {
    Dog {
        name: "Rex".to_owned(),
        good: true,
    }
}

fn cat() -> Cat {
    Cat {
        name: "Tom".to_owned(),
        lives: 9,
    }
}

fn wrapped_document(build: impl FnOnce(&mut dyn BsonWriter) -> bsonkit_types::Result<()>) -> Result<Vec<u8>> {
    let mut w = BsonBinaryWriter::new(vec![]);
    w.write_start_document()?;
    w.write_name("v")?;
    w.write_start_document()?;
    build(&mut w)?;
    w.write_end_document()?;
    w.write_end_document()?;
    Ok(w.into_inner())
}

pub fn test_discriminators() -> Result<()> {
    let registry = fixtures::registry()?;

    // Declared as itself: no discriminator.
    let bytes = write(&registry, &dog(), None)?;
    let mut r = open(&bytes)?;
    r.read_start_document()?;
    r.read_bson_type()?;
    assert_eq!(r.current_name(), Some("name"));
    assert_eq!(read::<Dog>(&registry, &bytes, None)?, dog());

    // Declared as the root: the dog writes the alias into its own document.
    let animals: Vec<Box<dyn Animal>> = vec![Box::new(dog()), Box::new(cat())];
    let bytes = write(&registry, &animals, None)?;
    let mut r = open(&bytes)?;
    r.read_start_array()?;
    assert_eq!(r.read_bson_type()?, BsonType::Document);
    r.read_start_document()?;
    assert_eq!(r.read_bson_type()?, BsonType::String);
    assert_eq!(r.current_name(), Some(DISCRIMINATOR_ELEMENT));
    assert_eq!(r.read_string()?, "dog");
    while r.read_bson_type()? != BsonType::EndOfDocument {
        r.skip_value()?;
    }
    r.read_end_document()?;

    // The cat is wrapped and discriminated by its type name.
    assert_eq!(r.read_bson_type()?, BsonType::Document);
    r.read_start_document()?;
    r.read_bson_type()?;
    assert_eq!(r.current_name(), Some(DISCRIMINATOR_ELEMENT));
    assert_eq!(r.read_string()?, Cat::describe().name());
    assert_eq!(r.read_bson_type()?, BsonType::Document);
    assert_eq!(r.current_name(), Some(ENVELOPE_VALUE));

    let back: Vec<Box<dyn Animal>> = read(&registry, &bytes, None)?;
    assert_eq!(back.len(), 2);
    assert_eq!(back[0].as_any().downcast_ref::<Dog>(), Some(&dog()));
    assert_eq!(back[1].as_any().downcast_ref::<Cat>(), Some(&cat()));
    assert_eq!(back[1].name(), "Tom");

    // A discriminator on a value read as its concrete type is skipped.
    let tagged = wrapped_document(|w| {
        w.write_name(DISCRIMINATOR_ELEMENT)?;
        w.write_string("dog")?;
        w.write_name("good")?;
        w.write_boolean(false)?;
        w.write_name("name")?;
        w.write_string("Fido")
    })?;
    let fido: Dog = read(&registry, &tagged, None)?;
    assert!(!fido.good);
    let fido: Box<dyn Animal> = read(&registry, &tagged, None)?;
    assert_eq!(fido.name(), "Fido");
    Ok(())
}

pub fn test_discriminator_errors() -> Result<()> {
    let registry = fixtures::registry()?;

    let untagged = wrapped_document(|w| {
        w.write_name("name")?;
        w.write_string("Rex")?;
        w.write_name("good")?;
        w.write_boolean(true)
    })?;
    assert!(matches!(
        read::<Box<dyn Animal>>(&registry, &untagged, None),
        Err(BsonError::Discriminator(DiscriminatorError::Missing { .. }))
    ));

    let ferret = wrapped_document(|w| {
        w.write_name(DISCRIMINATOR_ELEMENT)?;
        w.write_string("ferret")
    })?;
    assert!(matches!(
        read::<Box<dyn Animal>>(&registry, &ferret, None),
        Err(BsonError::Discriminator(DiscriminatorError::Unknown(name))) if name == "ferret"
    ));

    let numbered = wrapped_document(|w| {
        w.write_name(DISCRIMINATOR_ELEMENT)?;
        w.write_int32(1)
    })?;
    assert!(matches!(
        read::<Box<dyn Animal>>(&registry, &numbered, None),
        Err(BsonError::Discriminator(DiscriminatorError::Malformed(BsonType::Int32)))
    ));

    // Known to the registry, but not an animal.
    let person = wrapped_document(|w| {
        w.write_name(DISCRIMINATOR_ELEMENT)?;
        w.write_string(fixtures::Person::describe().name())
    })?;
    assert!(matches!(
        read::<Box<dyn Animal>>(&registry, &person, None),
        Err(BsonError::Discriminator(DiscriminatorError::NotAssignable { .. }))
    ));
    Ok(())
}

pub fn test_any_values() -> Result<()> {
    let registry = fixtures::registry()?;
    let values = vec![
        AnyValue::new(5i32),
        AnyValue::new("five".to_owned()),
        AnyValue::new(5u8),
        AnyValue::new(dog()),
    ];
    let bytes = write(&registry, &values, None)?;
    let mut r = open(&bytes)?;
    r.read_start_array()?;
    assert_eq!(r.read_bson_type()?, BsonType::Int32);
    r.skip_value()?;
    assert_eq!(r.read_bson_type()?, BsonType::String);
    r.skip_value()?;
    // Not a natural type of any tag, so it is wrapped.
    assert_eq!(r.read_bson_type()?, BsonType::Document);

    let back: Vec<AnyValue> = read(&registry, &bytes, None)?;
    assert_eq!(back[0].downcast_ref::<i32>(), Some(&5));
    assert_eq!(back[1].downcast_ref::<String>().map(String::as_str), Some("five"));
    assert_eq!(back[2].downcast_ref::<u8>(), Some(&5));
    assert_eq!(back[3].downcast_ref::<Dog>(), Some(&dog()));
    assert_eq!(back[3].descriptor(), &Dog::describe());

    // Untagged documents read as maps of any values.
    let plain = wrapped_document(|w| {
        w.write_name("n")?;
        w.write_double(0.5)
    })?;
    let back: AnyValue = read(&registry, &plain, None)?;
    let map = back
        .downcast::<HashMap<String, AnyValue>>()
        .map_err(|v| anyhow::anyhow!("read {v:?}"))?;
    assert_eq!(map["n"].downcast_ref::<f64>(), Some(&0.5));
    Ok(())
}
