//! Writing and reading values whose concrete type may differ from the type
//! declared where they appear.
//!
//! A value whose concrete type differs from its declared type carries a
//! discriminator. Serializers that write documents and handle discriminators
//! place it in their own document; every other value is wrapped:
//!
//! ```text
//! { "_t": <discriminator>, "_v": <value> }
//! ```

use crate::descriptor::TypeDescriptor;
use crate::options::SerializationOptions;
use crate::serializer::{BsonSerializer, ErasedValue, SerializationContext};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BsonError, BsonType, Result};
use std::any::Any;

pub const ENVELOPE_VALUE: &str = "_v";

pub(crate) fn serialize_value(
    ctx: &SerializationContext<'_>,
    w: &mut dyn BsonWriter,
    nominal: &TypeDescriptor,
    value: &dyn Any,
    options: Option<&SerializationOptions>,
) -> Result<()> {
    let registry = ctx.registry();
    let (actual, value) = registry.actual_type_of(nominal, value)?;
    let serializer = registry.lookup_descriptor(&actual)?;
    let discriminator = registry.convention().get_discriminator(registry, nominal, &actual);
    let Some(discriminator) = discriminator else {
        return serializer.serialize(&ctx.child(actual), w, value, options);
    };

    if serializer.handles_discriminator() {
        return serializer.serialize(&ctx.discriminated(actual, &discriminator), w, value, options);
    }

    tracing::trace!(discriminator = discriminator.as_str(), "Writing envelope.");
    w.write_start_document()?;
    w.write_name(registry.convention().element_name())?;
    w.write_string(&discriminator)?;
    w.write_name(ENVELOPE_VALUE)?;
    serializer.serialize(&ctx.child(actual), w, value, options)?;
    w.write_end_document()
}

pub(crate) fn deserialize_value(
    ctx: &SerializationContext<'_>,
    r: &mut dyn BsonReader,
    nominal: &TypeDescriptor,
    options: Option<&SerializationOptions>,
) -> Result<ErasedValue> {
    let registry = ctx.registry();
    let actual = registry.convention().get_actual_type(registry, r, nominal)?;
    let serializer = registry.lookup_descriptor(&actual)?;
    if actual == *nominal {
        return serializer.deserialize(&ctx.child(actual), r, options);
    }

    let enveloped = !serializer.handles_discriminator() && read_envelope_start(ctx, r)?;
    let value = serializer.deserialize(&ctx.child(actual), r, options)?;
    if enveloped {
        read_envelope_end(r)?;
    }
    registry.upcast(nominal, &actual, value)
}

/// Positions the reader on the envelope's `_v` if the current value is an
/// envelope. Otherwise leaves the reader untouched.
fn read_envelope_start(ctx: &SerializationContext<'_>, r: &mut dyn BsonReader) -> Result<bool> {
    if r.current_bson_type()? != BsonType::Document {
        return Ok(false);
    }
    let bookmark = r.bookmark()?;
    r.read_start_document()?;
    let element = ctx.registry().convention().element_name();
    let mut is_envelope =
        r.read_bson_type()? == BsonType::String && r.current_name() == Some(element);
    if is_envelope {
        r.skip_value()?;
        is_envelope =
            r.read_bson_type()? != BsonType::EndOfDocument && r.current_name() == Some(ENVELOPE_VALUE);
    }
    if !is_envelope {
        r.return_to_bookmark(&bookmark)?;
    }
    tracing::trace!(is_envelope, "Checked for envelope.");
    Ok(is_envelope)
}

fn read_envelope_end(r: &mut dyn BsonReader) -> Result<()> {
    match r.read_bson_type()? {
        BsonType::EndOfDocument => r.read_end_document(),
        bson_type => Err(BsonError::format(format!(
            "Unexpected {bson_type} element '{}' after the envelope value.",
            r.current_name().unwrap_or_default()
        ))),
    }
}

/// Serializer registered for a polymorphic root. Dispatches every value to
/// the serializer of its concrete type.
pub struct PolymorphicSerializer {
    descriptor: TypeDescriptor,
}

impl PolymorphicSerializer {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self { descriptor }
    }
}

impl BsonSerializer for PolymorphicSerializer {
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
        serialize_value(ctx, w, &self.descriptor, value, options)
    }

    fn deserialize(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<ErasedValue> {
        deserialize_value(ctx, r, &self.descriptor, options)
    }

    /// `AnyValue` may hold a null.
    fn may_write_null(&self) -> bool {
        self.descriptor.is::<crate::any_value::AnyValue>()
    }
}
