use super::fixtures::{self, Animal, Dog};
use anyhow::Result;
use bsonkit_serializers::discriminator::DISCRIMINATOR_ELEMENT;
use bsonkit_serializers::document::serialize_document;
use bsonkit_serializers::{read_document, Describe};
use bsonkit_types::io::{BsonBinaryReader, BsonBinaryWriter, BsonWriter};
use bsonkit_types::{BsonError, DiscriminatorError};
use std::io::Cursor;

pub fn test_stream_recovery() -> Result<()> {
    let registry = fixtures::registry()?;
    let rex = Dog {
        name: "Rex".to_owned(),
        good: true,
    };
    let fido = Dog {
        name: "Fido".to_owned(),
        good: false,
    };

    let mut w = BsonBinaryWriter::new(vec![]);
    serialize_document(&registry, &mut w, &rex)?;
    // A dog whose name is a number, followed by a nested document the
    // reader never gets to.
    w.write_start_document()?;
    w.write_name("name")?;
    w.write_int32(5)?;
    w.write_name("extra")?;
    w.write_start_document()?;
    w.write_name("x")?;
    w.write_string("unread")?;
    w.write_end_document()?;
    w.write_end_document()?;
    serialize_document(&registry, &mut w, &fido)?;
    assert!(w.is_done());
    let bytes = w.into_inner();

    let mut r = BsonBinaryReader::new(Cursor::new(&bytes[..]))?;
    assert_eq!(read_document::<Dog, _>(&registry, &mut r)?, rex);
    assert!(!r.is_at_end()?);
    assert!(read_document::<Dog, _>(&registry, &mut r).is_err());
    assert!(!r.is_at_end()?);
    assert_eq!(read_document::<Dog, _>(&registry, &mut r)?, fido);
    assert!(r.is_at_end()?);
    Ok(())
}

/// Failures found before the document is entered, such as an unresolvable
/// discriminator, still skip the whole document.
pub fn test_recovery_before_entering() -> Result<()> {
    let registry = fixtures::registry()?;
    let rex: Box<dyn Animal> = Box::new(Dog {
        name: "Rex".to_owned(),
        good: true,
    });

    let mut w = BsonBinaryWriter::new(vec![]);
    w.write_start_document()?;
    w.write_name(DISCRIMINATOR_ELEMENT)?;
    w.write_string("NoSuchAnimal")?;
    w.write_end_document()?;
    serialize_document(&registry, &mut w, &rex)?;
    // Known to the registry, but not an animal.
    w.write_start_document()?;
    w.write_name(DISCRIMINATOR_ELEMENT)?;
    w.write_string(fixtures::Person::describe().name())?;
    w.write_end_document()?;
    serialize_document(&registry, &mut w, &rex)?;
    let bytes = w.into_inner();

    let mut r = BsonBinaryReader::new(Cursor::new(&bytes[..]))?;
    assert!(matches!(
        read_document::<Box<dyn Animal>, _>(&registry, &mut r),
        Err(BsonError::Discriminator(DiscriminatorError::Unknown(_)))
    ));
    let first = read_document::<Box<dyn Animal>, _>(&registry, &mut r)?;
    assert_eq!(first.name(), "Rex");
    assert!(matches!(
        read_document::<Box<dyn Animal>, _>(&registry, &mut r),
        Err(BsonError::Discriminator(DiscriminatorError::NotAssignable { .. }))
    ));
    let second = read_document::<Box<dyn Animal>, _>(&registry, &mut r)?;
    assert_eq!(second.as_any().downcast_ref::<Dog>().map(|d| d.good), Some(true));
    assert!(r.is_at_end()?);
    Ok(())
}
