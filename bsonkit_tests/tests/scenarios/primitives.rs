use super::fixtures::{self, Role};
use super::{open, read, round_trip, write};
use anyhow::Result;
use bsonkit_serializers::options::RepresentationOptions;
use bsonkit_serializers::{SerializationOptions, SerializerRegistry};
use bsonkit_types::io::BsonReader;
use bsonkit_types::{BsonError, BsonType, LossKind};
use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

fn repr(representation: BsonType) -> SerializationOptions {
    SerializationOptions::representation(representation)
}

pub fn test_round_trip_grid() -> Result<()> {
    let registry = SerializerRegistry::with_defaults();

    let integer_reprs = [BsonType::Int32, BsonType::Int64, BsonType::Double, BsonType::String];
    let edges = [i32::MIN, -1, 0, 1, i32::MAX];
    for (representation, value) in integer_reprs.into_iter().cartesian_product(edges) {
        round_trip(&registry, value, Some(&repr(representation)))?;
        round_trip(&registry, value as i64, Some(&repr(representation)))?;
    }
    for value in [i64::MIN, i64::MAX] {
        round_trip(&registry, value, None)?;
        round_trip(&registry, value, Some(&repr(BsonType::String)))?;
    }
    round_trip(&registry, u64::MAX >> 1, None)?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(17);
    for _ in 0..100 {
        round_trip(&registry, rng.gen::<i16>(), None)?;
        round_trip(&registry, rng.gen::<u32>(), None)?;
        round_trip(&registry, rng.gen::<f64>(), None)?;
        round_trip(&registry, rng.gen::<f64>(), Some(&repr(BsonType::String)))?;
    }

    round_trip(&registry, "".to_owned(), None)?;
    round_trip(&registry, "with\0nul and ünïcödé".to_owned(), None)?;
    round_trip(&registry, 'λ', None)?;
    round_trip(&registry, Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff), None)?;
    round_trip(&registry, vec![0u8, 1, 255], None)?;

    let now = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap_or_default();
    for representation in [BsonType::DateTime, BsonType::Int64, BsonType::String, BsonType::Document] {
        round_trip(&registry, now, Some(&repr(representation)))?;
    }
    round_trip(&registry, TimeDelta::milliseconds(-90_061_001), None)?;
    Ok(())
}

pub fn test_lossy_conversions() -> Result<()> {
    let registry = SerializerRegistry::with_defaults();
    let as_int32 = repr(BsonType::Int32);

    let bytes = write(&registry, &42i64, Some(&as_int32))?;
    let mut r = open(&bytes)?;
    assert_eq!(r.current_bson_type()?, BsonType::Int32);
    assert_eq!(r.read_int32()?, 42);

    let err = write(&registry, &(1i64 << 40), Some(&as_int32)).unwrap_err();
    assert!(err.is_lossy());
    assert!(matches!(
        err,
        BsonError::LossyConversion {
            kind: LossKind::Overflow,
            ..
        }
    ));

    let lenient = SerializationOptions::Representation(
        RepresentationOptions::new(BsonType::Int32).with_allow_overflow(true),
    );
    write(&registry, &(1i64 << 40), Some(&lenient))?;

    let big = write(&registry, &(1i64 << 40), None)?;
    assert!(read::<i32>(&registry, &big, None).unwrap_err().is_lossy());
    assert!(read::<u8>(&registry, &write(&registry, &-1i32, None)?, None).unwrap_err().is_lossy());
    assert!(write(&registry, &1.5f64, Some(&repr(BsonType::Int64))).unwrap_err().is_lossy());
    Ok(())
}

pub fn test_boolean_text() -> Result<()> {
    let registry = SerializerRegistry::with_defaults();
    let bytes = write(&registry, &true, Some(&repr(BsonType::String)))?;
    let mut r = open(&bytes)?;
    assert_eq!(r.read_string()?, "true");

    for (text, expected) in [("true", true), ("TRUE", true), ("False", false), ("0", false)] {
        let bytes = write(&registry, &text.to_owned(), None)?;
        assert_eq!(read::<bool>(&registry, &bytes, None)?, expected);
    }
    let maybe = write(&registry, &"maybe".to_owned(), None)?;
    assert!(matches!(read::<bool>(&registry, &maybe, None), Err(BsonError::Format(_))));
    Ok(())
}

pub fn test_enums() -> Result<()> {
    let registry = fixtures::registry()?;
    for role in [Role::Guest, Role::Member, Role::Admin] {
        round_trip(&registry, role, None)?;
        round_trip(&registry, role, Some(&repr(BsonType::String)))?;
    }

    let bytes = write(&registry, &Role::Admin, Some(&repr(BsonType::String)))?;
    let mut r = open(&bytes)?;
    assert_eq!(r.read_string()?, "Admin");

    let bytes = write(&registry, &Role::Member, None)?;
    let mut r = open(&bytes)?;
    assert_eq!(r.current_bson_type()?, BsonType::Int32);
    assert_eq!(r.read_int32()?, 1);

    let unknown = write(&registry, &7i32, None)?;
    assert!(matches!(read::<Role>(&registry, &unknown, None), Err(BsonError::Format(_))));
    Ok(())
}
