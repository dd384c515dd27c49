use crate::describe::Describe;
use crate::serializer::{BsonSerializer, ErasedValue};
use bsonkit_types::Result;
use std::any::{self, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Static identity of a value type plus what the registry needs to build a
/// serializer for it without reflection.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    shape: TypeShape,
}

#[derive(Clone, Copy)]
pub enum TypeShape {
    Concrete(ConcreteShape),
    Nullable(NullableShape),
    Generic(GenericBinding),
}

/// A plain type, possibly carrying its own serializer.
#[derive(Clone, Copy)]
pub struct ConcreteShape {
    pub attached: fn() -> Option<Arc<dyn BsonSerializer>>,
}

#[derive(Clone, Copy)]
pub struct NullableShape {
    pub inner: fn() -> TypeDescriptor,
    pub(crate) wrap: fn(Arc<dyn BsonSerializer>) -> Arc<dyn BsonSerializer>,
}

/// A closed generic type: the open shape it was closed from, plus accessors
/// over its contents.
#[derive(Clone, Copy)]
pub struct GenericBinding {
    pub definition: GenericShape,
    pub access: ContainerAccess,
}

/// An open generic type, e.g. `HashMap<_, _>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GenericShape {
    name: &'static str,
    arity: usize,
}

impl GenericShape {
    pub const ARRAY: Self = Self::new("[T; N]", 1);
    pub const BOXED_SLICE: Self = Self::new("Box<[T]>", 1);
    pub const VEC: Self = Self::new("Vec", 1);
    pub const LINKED_LIST: Self = Self::new("LinkedList", 1);
    pub const VEC_DEQUE: Self = Self::new("VecDeque", 1);
    pub const HASH_SET: Self = Self::new("HashSet", 1);
    pub const BTREE_SET: Self = Self::new("BTreeSet", 1);
    pub const STACK: Self = Self::new("Stack", 1);
    pub const HASH_MAP: Self = Self::new("HashMap", 2);
    pub const BTREE_MAP: Self = Self::new("BTreeMap", 2);

    pub const fn new(name: &'static str, arity: usize) -> Self {
        Self { name, arity }
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn arity(&self) -> usize {
        self.arity
    }
}

#[derive(Clone, Copy)]
pub enum ContainerAccess {
    Sequence(SequenceAccess),
    Map(MapAccess),
}

impl ContainerAccess {
    pub fn type_args(&self) -> Vec<TypeDescriptor> {
        match self {
            Self::Sequence(seq) => vec![(seq.item)()],
            Self::Map(map) => vec![(map.key)(), (map.value)()],
        }
    }
}

/// Enumerates a sequence in its natural order and rebuilds one from items.
#[derive(Clone, Copy)]
pub struct SequenceAccess {
    pub item: fn() -> TypeDescriptor,
    pub items: for<'a> fn(&'a dyn Any) -> Option<Vec<&'a dyn Any>>,
    pub collect: fn(Vec<ErasedValue>) -> Result<ErasedValue>,
}

/// Enumerates a map's entries and rebuilds one from entries.
#[derive(Clone, Copy)]
pub struct MapAccess {
    pub key: fn() -> TypeDescriptor,
    pub value: fn() -> TypeDescriptor,
    pub entries: for<'a> fn(&'a dyn Any) -> Option<Vec<(&'a dyn Any, &'a dyn Any)>>,
    pub collect: fn(Vec<(ErasedValue, ErasedValue)>) -> Result<ErasedValue>,
}

impl TypeDescriptor {
    pub fn concrete<T: Describe>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            shape: TypeShape::Concrete(ConcreteShape {
                attached: T::serializer,
            }),
        }
    }

    pub fn nullable<T: Any>(shape: NullableShape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            shape: TypeShape::Nullable(shape),
        }
    }

    pub fn generic<T: Any>(definition: GenericShape, access: ContainerAccess) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            shape: TypeShape::Generic(GenericBinding { definition, access }),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self.name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
