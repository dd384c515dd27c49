use super::next_element;
use crate::any_value::AnyValue;
use crate::descriptor::{ContainerAccess, MapAccess, TypeDescriptor};
use crate::options::{DictionaryOptions, DictionaryRepresentation, SerializationOptions};
use crate::polymorphic;
use crate::registry::GenericSerializerDefinition;
use crate::serializer::{BsonSerializer, ErasedValue, SerializationContext};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BsonError, BsonType, Result};
use std::any::Any;
use std::sync::Arc;

const KEY: &str = "k";
const VALUE: &str = "v";

/// Serializer for one closed map type. Writes a document keyed by the map's
/// keys when they are usable element names, otherwise an array of
/// `[key, value]` pairs. Reads every shape.
pub struct DictionarySerializer {
    descriptor: TypeDescriptor,
    access: MapAccess,
}

impl DictionarySerializer {
    pub fn new(descriptor: TypeDescriptor, access: MapAccess) -> Self {
        Self { descriptor, access }
    }

    fn entry_types(&self) -> (TypeDescriptor, TypeDescriptor) {
        ((self.access.key)(), (self.access.value)())
    }
}

/// The key as text, if it is a string.
fn key_text(key: &dyn Any) -> Option<&str> {
    if let Some(s) = key.downcast_ref::<String>() {
        return Some(s);
    }
    key.downcast_ref::<AnyValue>()
        .and_then(|any_value| any_value.downcast_ref::<String>())
        .map(String::as_str)
}

/// Whether `name` can be written as an element name and read back as the
/// same key.
fn is_plain_name(ctx: &SerializationContext<'_>, name: &str) -> bool {
    !name.is_empty()
        && !name.contains('\0')
        && !name.starts_with('$')
        && !name.contains('.')
        && !ctx.is_discriminator_element(name)
}

fn key_from_name(key_type: &TypeDescriptor, name: &str) -> Result<ErasedValue> {
    if key_type.is::<String>() {
        return Ok(Box::new(name.to_owned()));
    }
    if key_type.is::<AnyValue>() {
        return Ok(Box::new(AnyValue::new(name.to_owned())));
    }
    Err(BsonError::format(format!(
        "Element name '{}' cannot be read as a key of type {}.",
        name.escape_debug(),
        key_type.name()
    )))
}

impl BsonSerializer for DictionarySerializer {
    fn value_type(&self) -> TypeDescriptor {
        self.descriptor
    }

    fn serialize(
        &self,
        ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &dyn Any,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let opts = DictionaryOptions::resolve(self.descriptor.name(), options)?;
        let key_options = opts.and_then(|o| o.key_options.as_deref());
        let value_options = opts.and_then(|o| o.value_options.as_deref());
        let entries = (self.access.entries)(value).ok_or(BsonError::TypeMismatch {
            expected: self.descriptor.name(),
        })?;
        let (key_type, value_type) = self.entry_types();

        let representation = match opts.map(|o| o.representation).unwrap_or_default() {
            DictionaryRepresentation::Dynamic => {
                let all_plain = entries
                    .iter()
                    .all(|(key, _)| key_text(*key).map_or(false, |name| is_plain_name(ctx, name)));
                if all_plain {
                    DictionaryRepresentation::Document
                } else {
                    DictionaryRepresentation::ArrayOfArrays
                }
            }
            other => other,
        };
        tracing::trace!(type_name = self.descriptor.name(), ?representation, "Writing map.");

        match representation {
            DictionaryRepresentation::Dynamic | DictionaryRepresentation::Document => {
                w.write_start_document()?;
                for (key, value) in entries {
                    let name = key_text(key).ok_or_else(|| {
                        BsonError::Serialization(format!(
                            "{} keys are not strings, so the map cannot be written as a document.",
                            key_type.name()
                        ))
                    })?;
                    w.write_name(name)?;
                    polymorphic::serialize_value(ctx, w, &value_type, value, value_options)?;
                }
                w.write_end_document()
            }
            DictionaryRepresentation::ArrayOfArrays => {
                w.write_start_array()?;
                for (key, value) in entries {
                    w.write_start_array()?;
                    polymorphic::serialize_value(ctx, w, &key_type, key, key_options)?;
                    polymorphic::serialize_value(ctx, w, &value_type, value, value_options)?;
                    w.write_end_array()?;
                }
                w.write_end_array()
            }
            DictionaryRepresentation::ArrayOfDocuments => {
                w.write_start_array()?;
                for (key, value) in entries {
                    w.write_start_document()?;
                    w.write_name(KEY)?;
                    polymorphic::serialize_value(ctx, w, &key_type, key, key_options)?;
                    w.write_name(VALUE)?;
                    polymorphic::serialize_value(ctx, w, &value_type, value, value_options)?;
                    w.write_end_document()?;
                }
                w.write_end_array()
            }
        }
    }

    fn deserialize(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<ErasedValue> {
        let opts = DictionaryOptions::resolve(self.descriptor.name(), options)?;
        let key_options = opts.and_then(|o| o.key_options.as_deref());
        let value_options = opts.and_then(|o| o.value_options.as_deref());
        let (key_type, value_type) = self.entry_types();
        let mut entries = vec![];

        match r.current_bson_type()? {
            BsonType::Document => {
                r.read_start_document()?;
                while let Some((_, name)) = next_element(r)? {
                    let key = key_from_name(&key_type, &name)?;
                    let value = polymorphic::deserialize_value(ctx, r, &value_type, value_options)?;
                    entries.push((key, value));
                }
                r.read_end_document()?;
            }
            BsonType::Array => {
                r.read_start_array()?;
                while r.read_bson_type()? != BsonType::EndOfDocument {
                    let entry = match r.current_bson_type()? {
                        BsonType::Array => {
                            r.read_start_array()?;
                            let key = self.read_pair_item(ctx, r, &key_type, key_options)?;
                            let value = self.read_pair_item(ctx, r, &value_type, value_options)?;
                            if r.read_bson_type()? != BsonType::EndOfDocument {
                                return Err(BsonError::format(format!(
                                    "A {} entry array has more than two items.",
                                    self.descriptor.name()
                                )));
                            }
                            r.read_end_array()?;
                            (key, value)
                        }
                        BsonType::Document => {
                            let (mut key, mut value) = (None, None);
                            r.read_start_document()?;
                            while let Some((_, name)) = next_element(r)? {
                                match name.as_str() {
                                    KEY => key = Some(polymorphic::deserialize_value(ctx, r, &key_type, key_options)?),
                                    VALUE => {
                                        value = Some(polymorphic::deserialize_value(ctx, r, &value_type, value_options)?)
                                    }
                                    _ => {
                                        return Err(BsonError::format(format!(
                                            "Invalid element '{}' in a {} entry document.",
                                            name.escape_debug(),
                                            self.descriptor.name()
                                        )))
                                    }
                                }
                            }
                            r.read_end_document()?;
                            match (key, value) {
                                (Some(key), Some(value)) => (key, value),
                                _ => {
                                    return Err(BsonError::format(format!(
                                        "A {} entry document needs both '{KEY}' and '{VALUE}'.",
                                        self.descriptor.name()
                                    )))
                                }
                            }
                        }
                        other => return Err(BsonError::cannot_deserialize(self.descriptor.name(), other)),
                    };
                    entries.push(entry);
                }
                r.read_end_array()?;
            }
            other => return Err(BsonError::cannot_deserialize(self.descriptor.name(), other)),
        }
        (self.access.collect)(entries)
    }
}

impl DictionarySerializer {
    fn read_pair_item(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        nominal: &TypeDescriptor,
        options: Option<&SerializationOptions>,
    ) -> Result<ErasedValue> {
        if r.read_bson_type()? == BsonType::EndOfDocument {
            return Err(BsonError::format(format!(
                "A {} entry array has fewer than two items.",
                self.descriptor.name()
            )));
        }
        polymorphic::deserialize_value(ctx, r, nominal, options)
    }
}

/// The open serializer for every map shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionarySerializerDefinition;

impl GenericSerializerDefinition for DictionarySerializerDefinition {
    fn close(&self, closed: &TypeDescriptor, access: &ContainerAccess) -> Result<Arc<dyn BsonSerializer>> {
        match access {
            ContainerAccess::Map(access) => Ok(Arc::new(DictionarySerializer::new(*closed, *access))),
            ContainerAccess::Sequence(_) => Err(BsonError::invalid_operation(format!(
                "{} is a sequence, not a map.",
                closed.name()
            ))),
        }
    }
}
