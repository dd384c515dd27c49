use crate::describe::Describe;
use crate::descriptor::TypeDescriptor;
use crate::options::SerializationOptions;
use crate::polymorphic;
use crate::registry::SerializerRegistry;
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BsonError, Result};
use std::any::{self, Any};

pub type ErasedValue = Box<dyn Any + Send + Sync>;

/// Encodes and decodes values of one type. Instances are immutable and
/// shared across threads.
pub trait BsonSerializer: Send + Sync + 'static {
    fn value_type(&self) -> TypeDescriptor;

    fn serialize(
        &self,
        ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &dyn Any,
        options: Option<&SerializationOptions>,
    ) -> Result<()>;

    fn deserialize(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<ErasedValue>;

    /// Whether this serializer writes documents and places a pending
    /// discriminator ([`SerializationContext::write_discriminator`]) in them
    /// itself. Otherwise discriminated values are wrapped in an envelope.
    fn handles_discriminator(&self) -> bool {
        false
    }

    /// Whether a present value may be encoded as the null tag.
    fn may_write_null(&self) -> bool {
        false
    }
}

/// Typed form of [`BsonSerializer`]. Every implementor is a `BsonSerializer`.
pub trait ValueSerializer: Send + Sync + 'static {
    type Value: Describe;

    fn serialize_value(
        &self,
        ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Self::Value,
        options: Option<&SerializationOptions>,
    ) -> Result<()>;

    fn deserialize_value(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<Self::Value>;

    fn handles_discriminator(&self) -> bool {
        false
    }

    fn may_write_null(&self) -> bool {
        false
    }
}

impl<S: ValueSerializer> BsonSerializer for S {
    fn value_type(&self) -> TypeDescriptor {
        S::Value::describe()
    }

    fn serialize(
        &self,
        ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &dyn Any,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let value = value
            .downcast_ref::<S::Value>()
            .ok_or(BsonError::TypeMismatch {
                expected: any::type_name::<S::Value>(),
            })?;
        self.serialize_value(ctx, w, value, options)
    }

    fn deserialize(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<ErasedValue> {
        let value = self.deserialize_value(ctx, r, options)?;
        Ok(Box::new(value))
    }

    fn handles_discriminator(&self) -> bool {
        ValueSerializer::handles_discriminator(self)
    }

    fn may_write_null(&self) -> bool {
        ValueSerializer::may_write_null(self)
    }
}

/// Per-call state threaded through nested serializers: the registry handle,
/// the nominal type at the current position, and a discriminator the
/// serializer is expected to write.
#[derive(Clone, Copy)]
pub struct SerializationContext<'a> {
    registry: &'a SerializerRegistry,
    nominal_type: TypeDescriptor,
    discriminator: Option<&'a str>,
}

impl<'a> SerializationContext<'a> {
    pub fn new(registry: &'a SerializerRegistry, nominal_type: TypeDescriptor) -> Self {
        Self {
            registry,
            nominal_type,
            discriminator: None,
        }
    }

    pub fn registry(&self) -> &'a SerializerRegistry {
        self.registry
    }

    pub fn nominal_type(&self) -> &TypeDescriptor {
        &self.nominal_type
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator
    }

    pub fn child(&self, nominal_type: TypeDescriptor) -> SerializationContext<'a> {
        Self::new(self.registry, nominal_type)
    }

    pub(crate) fn discriminated<'b>(
        &self,
        nominal_type: TypeDescriptor,
        discriminator: &'b str,
    ) -> SerializationContext<'b>
    where
        'a: 'b,
    {
        SerializationContext {
            registry: self.registry,
            nominal_type,
            discriminator: Some(discriminator),
        }
    }

    /// Writes the pending discriminator as the next element, if there is one.
    /// Document serializers that handle discriminators call this right after
    /// starting their document.
    pub fn write_discriminator(&self, w: &mut dyn BsonWriter) -> Result<()> {
        if let Some(discriminator) = self.discriminator {
            w.write_name(self.registry.convention().element_name())?;
            w.write_string(discriminator)?;
        }
        Ok(())
    }

    /// Whether `name` is the discriminator element, which document
    /// serializers handling discriminators skip when reading.
    pub fn is_discriminator_element(&self, name: &str) -> bool {
        name == self.registry.convention().element_name()
    }

    /// Serializes a member whose declared type is `T`, resolving its actual
    /// type and discriminator.
    pub fn serialize_member<T: Describe>(
        &self,
        w: &mut dyn BsonWriter,
        value: &T,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        polymorphic::serialize_value(self, w, &T::describe(), value, options)
    }

    pub fn deserialize_member<T: Describe>(
        &self,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<T> {
        let value = polymorphic::deserialize_value(self, r, &T::describe(), options)?;
        crate::describe::downcast_item::<T>(value)
    }
}
