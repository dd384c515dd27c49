use super::fixtures::{self, Person, Rgb, RgbSerializer, Role};
use super::{open, read, round_trip, write};
use anyhow::Result;
use bsonkit_serializers::document::{from_document_bytes_with_settings, to_document_bytes_with_settings};
use bsonkit_serializers::{from_document_bytes, to_document_bytes, Describe};
use bsonkit_types::io::{BsonBinaryReader, BsonReader, ReaderSettings, WriterSettings};
use bsonkit_types::values::GuidRepresentation;
use bsonkit_types::{BsonError, BsonType};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use uuid::Uuid;

fn person() -> Person {
    Person {
        id: Uuid::from_u128(0x6ba7_b810_9dad_11d1_80b4_00c0_4fd4_30c8),
        name: "Ada".to_owned(),
        age: Some(36),
        role: Role::Admin,
        joined: DateTime::<Utc>::from_timestamp_millis(1_600_000_000_000).unwrap_or_default(),
        scores: BTreeMap::from([("chess".to_owned(), 0.75), ("go".to_owned(), 0.5)]),
        tags: vec!["math".to_owned(), "engines".to_owned()],
    }
}

pub fn test_person() -> Result<()> {
    let registry = fixtures::registry()?;
    let ada = person();

    let bytes = to_document_bytes(&registry, &ada)?;
    let mut r = BsonBinaryReader::new(Cursor::new(&bytes[..]))?;
    r.read_start_document()?;
    let mut layout = vec![];
    while r.read_bson_type()? != BsonType::EndOfDocument {
        layout.push((r.current_name().unwrap_or_default().to_owned(), r.current_bson_type()?));
        r.skip_value()?;
    }
    r.read_end_document()?;
    assert_eq!(
        layout,
        vec![
            ("id".to_owned(), BsonType::Binary),
            ("name".to_owned(), BsonType::String),
            ("age".to_owned(), BsonType::Int32),
            ("role".to_owned(), BsonType::Int32),
            ("joined".to_owned(), BsonType::DateTime),
            ("scores".to_owned(), BsonType::Document),
            ("tags".to_owned(), BsonType::Array),
        ]
    );
    assert_eq!(from_document_bytes::<Person>(&registry, &bytes)?, ada);

    let anonymous = Person {
        age: None,
        tags: vec![],
        ..person()
    };
    let bytes = to_document_bytes(&registry, &anonymous)?;
    assert_eq!(from_document_bytes::<Person>(&registry, &bytes)?, anonymous);

    // Legacy GUID layouts round-trip when both sides agree.
    let legacy_w = WriterSettings::default().with_guid_representation(GuidRepresentation::CSharpLegacy);
    let legacy_r = ReaderSettings::default().with_guid_representation(GuidRepresentation::CSharpLegacy);
    let bytes = to_document_bytes_with_settings(&registry, &ada, legacy_w)?;
    assert_eq!(from_document_bytes_with_settings::<Person>(&registry, &bytes, legacy_r)?, ada);
    assert!(from_document_bytes::<Person>(&registry, &bytes).is_err());

    // Values that are not documents cannot stand at top level.
    assert!(to_document_bytes(&registry, &5i32).is_err());
    assert!(matches!(
        from_document_bytes::<Person>(&registry, &to_document_bytes(&registry, &BTreeMap::<String, i32>::new())?),
        Err(BsonError::Format(_))
    ));
    Ok(())
}

pub fn test_attached_serializer() -> Result<()> {
    let registry = fixtures::registry()?;
    let first = registry.lookup::<Rgb>()?;
    assert!(Arc::ptr_eq(&first, &registry.lookup::<Rgb>()?));
    assert!(first.value_type() == Rgb::describe());

    let teal = Rgb(0, 128, 128);
    let bytes = write(&registry, &teal, None)?;
    let mut r = open(&bytes)?;
    assert_eq!(r.read_string()?, "#008080");
    assert_eq!(read::<Rgb>(&registry, &bytes, None)?, teal);

    // Containers and nullables close over it like any registered type.
    round_trip(&registry, vec![teal, Rgb(255, 255, 0)], None)?;
    round_trip(&registry, Some(teal), None)?;
    round_trip(&registry, BTreeMap::from([("sea".to_owned(), teal)]), None)?;

    let bad = write(&registry, &"#00zz00".to_owned(), None)?;
    assert!(matches!(read::<Rgb>(&registry, &bad, None), Err(BsonError::Format(_))));

    // The type is taken once its own serializer is in use.
    assert!(matches!(
        registry.register(RgbSerializer),
        Err(BsonError::DuplicateRegistration(_))
    ));
    Ok(())
}
