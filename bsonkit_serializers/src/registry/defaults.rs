use super::SerializerRegistry;
use crate::any_value::AnyValue;
use crate::describe::Describe;
use crate::descriptor::GenericShape;
use crate::serializer::ValueSerializer;
use crate::serializers::{
    BitSetSerializer, BooleanSerializer, BsonNullSerializer, ByteArraySerializer, CharSerializer,
    CultureSerializer, DateTimeOffsetSerializer, DateTimeSerializer, DecimalSerializer,
    DictionarySerializerDefinition, FloatSerializer, GuidSerializer, IntegerSerializer,
    IpAddrSerializer, ObjectIdSerializer, SequenceKind, SequenceSerializerDefinition,
    SocketAddrSerializer, StringSerializer, TimeSpanSerializer, UriSerializer, VersionSerializer,
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;

pub(super) fn install(registry: &mut SerializerRegistry) {
    /* primitives */
    put(registry, BooleanSerializer);
    put(registry, IntegerSerializer::<i8>::new());
    put(registry, IntegerSerializer::<i16>::new());
    put(registry, IntegerSerializer::<i32>::new());
    put(registry, IntegerSerializer::<i64>::new());
    put(registry, IntegerSerializer::<u8>::new());
    put(registry, IntegerSerializer::<u16>::new());
    put(registry, IntegerSerializer::<u32>::new());
    put(registry, IntegerSerializer::<u64>::new());
    put(registry, FloatSerializer::<f32>::new());
    put(registry, FloatSerializer::<f64>::new());
    put(registry, DecimalSerializer);
    put(registry, CharSerializer);
    put(registry, StringSerializer);
    put(registry, ByteArraySerializer);
    put(registry, ObjectIdSerializer);
    put(registry, GuidSerializer);
    put(registry, BsonNullSerializer);

    /* temporal */
    put(registry, DateTimeSerializer::<DateTime<Utc>>::new());
    put(registry, DateTimeSerializer::<DateTime<Local>>::new());
    put(registry, DateTimeSerializer::<NaiveDateTime>::new());
    put(registry, DateTimeSerializer::<NaiveDate>::new());
    put(registry, DateTimeOffsetSerializer);
    put(registry, TimeSpanSerializer);

    /* other values */
    put(registry, CultureSerializer);
    put(registry, UriSerializer);
    put(registry, VersionSerializer);
    put(registry, BitSetSerializer);
    put(registry, IpAddrSerializer);
    put(registry, SocketAddrSerializer);

    /* containers */
    let sequences = [
        (GenericShape::ARRAY, SequenceKind::Array),
        (GenericShape::BOXED_SLICE, SequenceKind::Array),
        (GenericShape::VEC, SequenceKind::List),
        (GenericShape::LINKED_LIST, SequenceKind::List),
        (GenericShape::HASH_SET, SequenceKind::Set),
        (GenericShape::BTREE_SET, SequenceKind::Set),
        (GenericShape::VEC_DEQUE, SequenceKind::Queue),
        (GenericShape::STACK, SequenceKind::Stack),
    ];
    for (shape, kind) in sequences {
        registry.install_generic(shape, Arc::new(SequenceSerializerDefinition::new(kind)));
    }
    for shape in [GenericShape::HASH_MAP, GenericShape::BTREE_MAP] {
        registry.install_generic(shape, Arc::new(DictionarySerializerDefinition));
    }

    registry.install_root::<AnyValue>(AnyValue::as_any);
}

fn put<S: ValueSerializer>(registry: &mut SerializerRegistry, serializer: S) {
    registry.install(S::Value::describe(), Arc::new(serializer));
}
