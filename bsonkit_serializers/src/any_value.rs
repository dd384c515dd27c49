use crate::describe::Describe;
use crate::descriptor::TypeDescriptor;
use crate::serializer::ErasedValue;
use std::any::Any;
use std::fmt;

/// A value of any registered type. Used as the nominal type wherever the
/// concrete type is only known at run time, and discovered from the
/// discriminator or the wire type when decoding.
pub struct AnyValue {
    value: ErasedValue,
    descriptor: TypeDescriptor,
}

impl AnyValue {
    pub fn new<T: Describe>(value: T) -> Self {
        Self {
            value: Box::new(value),
            descriptor: T::describe(),
        }
    }

    pub(crate) fn from_erased(value: ErasedValue, descriptor: TypeDescriptor) -> Self {
        Self { value, descriptor }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.value
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let descriptor = self.descriptor;
        self.value
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|value| Self { value, descriptor })
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyValue({})", self.descriptor.name())
    }
}
