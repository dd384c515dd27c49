use crate::any_value::AnyValue;
use crate::descriptor::{
    ContainerAccess, GenericShape, MapAccess, NullableShape, SequenceAccess, TypeDescriptor,
};
use crate::serializer::{BsonSerializer, ErasedValue};
use crate::serializers::NullableSerializer;
use crate::stack::Stack;
use bsonkit_types::values::{BsonNull, Culture, Decimal, ObjectId, Uri, Version};
use bsonkit_types::{BsonError, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use fixedbitset::FixedBitSet;
use std::any::{self, Any};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use uuid::Uuid;

/// Types the registry can serialize. Plain types use the default methods:
///
/// ```ignore
/// impl Describe for Point {}
/// ```
///
/// A type may carry its own serializer, used when nothing is registered for
/// it:
///
/// ```ignore
/// impl Describe for Point {
///     fn serializer() -> Option<Arc<dyn BsonSerializer>> {
///         Some(Arc::new(PointSerializer))
///     }
/// }
/// ```
pub trait Describe: Any + Send + Sync + Sized {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::concrete::<Self>()
    }

    /// Serializer attached to the type itself. Consulted once, on the first
    /// lookup of a concrete type with no registration; the result is cached.
    fn serializer() -> Option<Arc<dyn BsonSerializer>> {
        None
    }
}

macro_rules! impl_describe {
    ($($t:ty),* $(,)?) => {
        $(impl Describe for $t {})*
    };
}

impl_describe!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    char,
    String,
    Decimal,
    ObjectId,
    Uuid,
    DateTime<Utc>,
    DateTime<Local>,
    DateTime<FixedOffset>,
    NaiveDateTime,
    NaiveDate,
    TimeDelta,
    Culture,
    Uri,
    Version,
    FixedBitSet,
    IpAddr,
    SocketAddr,
    BsonNull,
    AnyValue,
);

/* nullable */

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::nullable::<Self>(NullableShape {
            inner: T::describe,
            wrap: wrap_nullable::<T>,
        })
    }
}

fn wrap_nullable<T: Describe>(inner: Arc<dyn BsonSerializer>) -> Arc<dyn BsonSerializer> {
    Arc::new(NullableSerializer::<T>::new(inner))
}

/* helpers */

pub(crate) fn downcast_item<T: Any>(item: ErasedValue) -> Result<T> {
    item.downcast::<T>()
        .map(|b| *b)
        .map_err(|_| BsonError::TypeMismatch {
            expected: any::type_name::<T>(),
        })
}

fn downcast_items<T: Any>(items: Vec<ErasedValue>) -> Result<Vec<T>> {
    items.into_iter().map(downcast_item::<T>).collect()
}

fn downcast_entries<K: Any, V: Any>(entries: Vec<(ErasedValue, ErasedValue)>) -> Result<Vec<(K, V)>> {
    entries
        .into_iter()
        .map(|(k, v)| Ok((downcast_item::<K>(k)?, downcast_item::<V>(v)?)))
        .collect()
}

fn unique_entries<M, K, V>(entries: Vec<(K, V)>, map: &mut M, insert: fn(&mut M, K, V) -> bool) -> Result<()> {
    for (k, v) in entries {
        if !insert(map, k, v) {
            return Err(BsonError::format(format!(
                "Duplicate key while deserializing {}.",
                any::type_name::<M>()
            )));
        }
    }
    Ok(())
}

fn sequence<C: Describe, T: Describe>(
    definition: GenericShape,
    items: for<'a> fn(&'a dyn Any) -> Option<Vec<&'a dyn Any>>,
    collect: fn(Vec<ErasedValue>) -> Result<ErasedValue>,
) -> TypeDescriptor {
    TypeDescriptor::generic::<C>(
        definition,
        ContainerAccess::Sequence(SequenceAccess {
            item: T::describe,
            items,
            collect,
        }),
    )
}

fn map<C: Describe, K: Describe, V: Describe>(
    definition: GenericShape,
    entries: for<'a> fn(&'a dyn Any) -> Option<Vec<(&'a dyn Any, &'a dyn Any)>>,
    collect: fn(Vec<(ErasedValue, ErasedValue)>) -> Result<ErasedValue>,
) -> TypeDescriptor {
    TypeDescriptor::generic::<C>(
        definition,
        ContainerAccess::Map(MapAccess {
            key: K::describe,
            value: V::describe,
            entries,
            collect,
        }),
    )
}

/* sequences */

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>(
            GenericShape::VEC,
            |v| {
                let v = v.downcast_ref::<Self>()?;
                Some(v.iter().map(|i| i as &dyn Any).collect())
            },
            |items| Ok(Box::new(downcast_items::<T>(items)?)),
        )
    }
}

impl<T: Describe> Describe for LinkedList<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>(
            GenericShape::LINKED_LIST,
            |v| {
                let v = v.downcast_ref::<Self>()?;
                Some(v.iter().map(|i| i as &dyn Any).collect())
            },
            |items| Ok(Box::new(downcast_items::<T>(items)?.into_iter().collect::<Self>())),
        )
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>(
            GenericShape::VEC_DEQUE,
            |v| {
                let v = v.downcast_ref::<Self>()?;
                Some(v.iter().map(|i| i as &dyn Any).collect())
            },
            |items| Ok(Box::new(downcast_items::<T>(items)?.into_iter().collect::<Self>())),
        )
    }
}

impl<T: Describe + Eq + Hash> Describe for HashSet<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>(
            GenericShape::HASH_SET,
            |v| {
                let v = v.downcast_ref::<Self>()?;
                Some(v.iter().map(|i| i as &dyn Any).collect())
            },
            |items| Ok(Box::new(downcast_items::<T>(items)?.into_iter().collect::<Self>())),
        )
    }
}

impl<T: Describe + Ord> Describe for BTreeSet<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>(
            GenericShape::BTREE_SET,
            |v| {
                let v = v.downcast_ref::<Self>()?;
                Some(v.iter().map(|i| i as &dyn Any).collect())
            },
            |items| Ok(Box::new(downcast_items::<T>(items)?.into_iter().collect::<Self>())),
        )
    }
}

impl<T: Describe> Describe for Stack<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>(
            GenericShape::STACK,
            |v| {
                let v = v.downcast_ref::<Self>()?;
                Some(v.iter().map(|i| i as &dyn Any).collect())
            },
            |items| Ok(Box::new(downcast_items::<T>(items)?.into_iter().collect::<Self>())),
        )
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>(
            GenericShape::ARRAY,
            |v| {
                let v = v.downcast_ref::<Self>()?;
                Some(v.iter().map(|i| i as &dyn Any).collect())
            },
            |items| {
                let items = downcast_items::<T>(items)?;
                let len = items.len();
                let array = <[T; N]>::try_from(items).map_err(|_| {
                    BsonError::format(format!("Expected an array of length {N}, found {len}."))
                })?;
                Ok(Box::new(array))
            },
        )
    }
}

impl<T: Describe> Describe for Box<[T]> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>(
            GenericShape::BOXED_SLICE,
            |v| {
                let v = v.downcast_ref::<Self>()?;
                Some(v.iter().map(|i| i as &dyn Any).collect())
            },
            |items| Ok(Box::new(downcast_items::<T>(items)?.into_boxed_slice())),
        )
    }
}

/* maps */

impl<K: Describe + Eq + Hash, V: Describe> Describe for HashMap<K, V> {
    fn describe() -> TypeDescriptor {
        map::<Self, K, V>(
            GenericShape::HASH_MAP,
            |m| {
                let m = m.downcast_ref::<Self>()?;
                Some(m.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Any)).collect())
            },
            |entries| {
                let entries = downcast_entries::<K, V>(entries)?;
                let mut m = Self::with_capacity(entries.len());
                unique_entries(entries, &mut m, |m, k, v| m.insert(k, v).is_none())?;
                Ok(Box::new(m))
            },
        )
    }
}

impl<K: Describe + Ord, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        map::<Self, K, V>(
            GenericShape::BTREE_MAP,
            |m| {
                let m = m.downcast_ref::<Self>()?;
                Some(m.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Any)).collect())
            },
            |entries| {
                let entries = downcast_entries::<K, V>(entries)?;
                let mut m = Self::new();
                unique_entries(entries, &mut m, |m, k, v| m.insert(k, v).is_none())?;
                Ok(Box::new(m))
            },
        )
    }
}
