//! Type-directed serialization of Rust values to and from the binary document
//! format: a registry of per-type serializers, representation options, a
//! discriminator convention for polymorphic values, and container and
//! nullable serializers built on top of them.

pub mod any_value;
pub mod describe;
pub mod descriptor;
pub mod discriminator;
pub mod document;
pub mod options;
pub mod polymorphic;
pub mod registry;
pub mod serializer;
pub mod serializers;
pub mod stack;

pub use any_value::AnyValue;
pub use describe::Describe;
pub use descriptor::{GenericShape, TypeDescriptor};
pub use discriminator::{DiscriminatorConvention, StandardDiscriminatorConvention};
pub use document::{
    from_document_bytes, from_wrapped_bytes, read_document, to_document_bytes, to_wrapped_bytes,
};
pub use options::SerializationOptions;
pub use registry::{GenericSerializerDefinition, SerializerRegistry};
pub use serializer::{BsonSerializer, ErasedValue, SerializationContext, ValueSerializer};
pub use stack::Stack;
