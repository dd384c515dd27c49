use crate::any_value::AnyValue;
use crate::describe::Describe;
use crate::descriptor::TypeDescriptor;
use crate::registry::SerializerRegistry;
use bsonkit_types::io::BsonReader;
use bsonkit_types::values::{BsonNull, ObjectId};
use bsonkit_types::{BsonError, BsonType, DiscriminatorError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub const DISCRIMINATOR_ELEMENT: &str = "_t";

/// Maps between concrete types and the discriminator values recorded for
/// them when they are written where a more general type is declared.
pub trait DiscriminatorConvention: Send + Sync {
    fn element_name(&self) -> &str;

    /// The concrete type of the value the reader is positioned on. Leaves the
    /// reader where it was.
    fn get_actual_type(
        &self,
        registry: &SerializerRegistry,
        r: &mut dyn BsonReader,
        nominal: &TypeDescriptor,
    ) -> Result<TypeDescriptor>;

    /// The discriminator to record for an `actual` value declared as
    /// `nominal`, or `None` if none is needed.
    fn get_discriminator(
        &self,
        registry: &SerializerRegistry,
        nominal: &TypeDescriptor,
        actual: &TypeDescriptor,
    ) -> Option<String>;
}

/// Discriminators live in the `_t` element and are either a registered alias
/// or the type name. Values declared as [`AnyValue`] without a discriminator
/// take the natural type of their wire tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDiscriminatorConvention;

impl DiscriminatorConvention for StandardDiscriminatorConvention {
    fn element_name(&self) -> &str {
        DISCRIMINATOR_ELEMENT
    }

    fn get_actual_type(
        &self,
        registry: &SerializerRegistry,
        r: &mut dyn BsonReader,
        nominal: &TypeDescriptor,
    ) -> Result<TypeDescriptor> {
        if !registry.is_polymorphic(nominal) {
            return Ok(*nominal);
        }
        let bson_type = r.current_bson_type()?;
        if bson_type == BsonType::Document {
            if let Some(discriminator) = peek_discriminator(r, self.element_name())? {
                let actual = resolve(registry, nominal, &discriminator)?;
                tracing::trace!(
                    discriminator = discriminator.as_str(),
                    nominal = nominal.name(),
                    actual = actual.name(),
                    "Resolved discriminator."
                );
                return Ok(actual);
            }
        }
        if nominal.is::<AnyValue>() {
            return natural_type(bson_type)
                .ok_or_else(|| BsonError::cannot_deserialize(nominal.name(), bson_type));
        }
        Err(DiscriminatorError::Missing {
            nominal: nominal.name(),
        }
        .into())
    }

    fn get_discriminator(
        &self,
        registry: &SerializerRegistry,
        nominal: &TypeDescriptor,
        actual: &TypeDescriptor,
    ) -> Option<String> {
        if actual == nominal || (nominal.is::<AnyValue>() && is_natural(actual)) {
            return None;
        }
        let discriminator = registry
            .alias_for(nominal, actual)
            .unwrap_or_else(|| actual.name().to_owned());
        Some(discriminator)
    }
}

/// Scans the document the reader is positioned on for `element`.
fn peek_discriminator(r: &mut dyn BsonReader, element: &str) -> Result<Option<String>> {
    let bookmark = r.bookmark()?;
    let found = scan_for(r, element);
    r.return_to_bookmark(&bookmark)?;
    found
}

fn scan_for(r: &mut dyn BsonReader, element: &str) -> Result<Option<String>> {
    r.read_start_document()?;
    loop {
        let bson_type = r.read_bson_type()?;
        if bson_type == BsonType::EndOfDocument {
            return Ok(None);
        }
        if r.current_name() == Some(element) {
            if bson_type != BsonType::String {
                return Err(DiscriminatorError::Malformed(bson_type).into());
            }
            return r.read_string().map(Some);
        }
        r.skip_value()?;
    }
}

fn resolve(registry: &SerializerRegistry, nominal: &TypeDescriptor, discriminator: &str) -> Result<TypeDescriptor> {
    let candidates = registry.discriminator_candidates(discriminator);
    if candidates.is_empty() {
        return Err(DiscriminatorError::Unknown(discriminator.to_owned()).into());
    }
    let compatible = candidates
        .iter()
        .filter(|c| *c != nominal && registry.is_assignable(nominal, c))
        .collect::<Vec<_>>();
    match compatible[..] {
        [actual] => Ok(*actual),
        [] => Err(DiscriminatorError::NotAssignable {
            actual: candidates[0].name(),
            nominal: nominal.name(),
        }
        .into()),
        _ => Err(DiscriminatorError::Ambiguous(discriminator.to_owned()).into()),
    }
}

fn natural_type(bson_type: BsonType) -> Option<TypeDescriptor> {
    let natural = match bson_type {
        BsonType::Double => f64::describe(),
        BsonType::String | BsonType::Symbol => String::describe(),
        BsonType::Document => HashMap::<String, AnyValue>::describe(),
        BsonType::Array => Vec::<AnyValue>::describe(),
        BsonType::Binary => Vec::<u8>::describe(),
        BsonType::ObjectId => ObjectId::describe(),
        BsonType::Boolean => bool::describe(),
        BsonType::DateTime => DateTime::<Utc>::describe(),
        BsonType::Null => BsonNull::describe(),
        BsonType::Int32 => i32::describe(),
        BsonType::Int64 => i64::describe(),
        _ => return None,
    };
    Some(natural)
}

fn is_natural(actual: &TypeDescriptor) -> bool {
    actual.is::<f64>()
        || actual.is::<String>()
        || actual.is::<HashMap<String, AnyValue>>()
        || actual.is::<Vec<AnyValue>>()
        || actual.is::<Vec<u8>>()
        || actual.is::<ObjectId>()
        || actual.is::<bool>()
        || actual.is::<DateTime<Utc>>()
        || actual.is::<BsonNull>()
        || actual.is::<i32>()
        || actual.is::<i64>()
}
