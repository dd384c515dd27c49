use crate::descriptor::{ContainerAccess, SequenceAccess, TypeDescriptor};
use crate::options::{ArrayOptions, SerializationOptions};
use crate::polymorphic;
use crate::registry::GenericSerializerDefinition;
use crate::serializer::{BsonSerializer, ErasedValue, SerializationContext};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BsonError, BsonType, Result};
use std::any::Any;
use std::sync::Arc;

/// Sequence flavours. All encode as a BSON array; they differ in how the
/// collection is rebuilt and in element order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// Fixed length, checked on read.
    Array,
    List,
    Set,
    Queue,
    /// Written bottom to top, so reading pushes the items back in order.
    Stack,
}

/// Serializer for one closed sequence type. Each item is written against the
/// item type as its nominal type, so subtypes carry a discriminator.
pub struct SequenceSerializer {
    descriptor: TypeDescriptor,
    access: SequenceAccess,
    kind: SequenceKind,
}

impl SequenceSerializer {
    pub fn new(descriptor: TypeDescriptor, access: SequenceAccess, kind: SequenceKind) -> Self {
        Self {
            descriptor,
            access,
            kind,
        }
    }
}

impl BsonSerializer for SequenceSerializer {
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
        let item_options = ArrayOptions::resolve(self.descriptor.name(), options)?;
        let mut items = (self.access.items)(value).ok_or(BsonError::TypeMismatch {
            expected: self.descriptor.name(),
        })?;
        if self.kind == SequenceKind::Stack {
            items.reverse();
        }

        let item_type = (self.access.item)();
        w.write_start_array()?;
        for item in items {
            polymorphic::serialize_value(ctx, w, &item_type, item, item_options)?;
        }
        w.write_end_array()
    }

    fn deserialize(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<ErasedValue> {
        let item_options = ArrayOptions::resolve(self.descriptor.name(), options)?;
        match r.current_bson_type()? {
            BsonType::Array => {
                let item_type = (self.access.item)();
                let mut items = vec![];
                r.read_start_array()?;
                while r.read_bson_type()? != BsonType::EndOfDocument {
                    items.push(polymorphic::deserialize_value(ctx, r, &item_type, item_options)?);
                }
                r.read_end_array()?;
                (self.access.collect)(items)
            }
            other => Err(BsonError::cannot_deserialize(self.descriptor.name(), other)),
        }
    }
}

/// The open serializer for one sequence flavour.
#[derive(Debug, Clone, Copy)]
pub struct SequenceSerializerDefinition {
    kind: SequenceKind,
}

impl SequenceSerializerDefinition {
    pub fn new(kind: SequenceKind) -> Self {
        Self { kind }
    }
}

impl GenericSerializerDefinition for SequenceSerializerDefinition {
    fn close(&self, closed: &TypeDescriptor, access: &ContainerAccess) -> Result<Arc<dyn BsonSerializer>> {
        match access {
            ContainerAccess::Sequence(access) => {
                Ok(Arc::new(SequenceSerializer::new(*closed, *access, self.kind)))
            }
            ContainerAccess::Map(_) => Err(BsonError::invalid_operation(format!(
                "{} is a map, not a sequence.",
                closed.name()
            ))),
        }
    }
}
