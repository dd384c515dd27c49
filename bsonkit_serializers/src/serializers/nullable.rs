use super::cannot_deserialize;
use crate::describe::{downcast_item, Describe};
use crate::descriptor::TypeDescriptor;
use crate::options::SerializationOptions;
use crate::serializer::{BsonSerializer, ErasedValue, SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::BsonNull;
use bsonkit_types::{BsonError, BsonType, Result};
use std::any::{self, Any};
use std::marker::PhantomData;
use std::sync::Arc;

/// Marks an absent `Option` whose inner type can itself be null.
pub const NONE_SENTINEL: &str = "_none";

/// `Option<T>` around the serializer for `T`. `None` is the null tag, or
/// `{ "_none": true }` when the inner serializer may write null for a
/// present value.
pub struct NullableSerializer<T> {
    inner: Arc<dyn BsonSerializer>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Describe> NullableSerializer<T> {
    pub fn new(inner: Arc<dyn BsonSerializer>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    fn is_sentinel(&self, r: &mut dyn BsonReader) -> Result<bool> {
        if !self.inner.may_write_null() || r.current_bson_type()? != BsonType::Document {
            return Ok(false);
        }
        let bookmark = r.bookmark()?;
        r.read_start_document()?;
        let is_sentinel = r.read_bson_type()? == BsonType::Boolean
            && r.current_name() == Some(NONE_SENTINEL)
            && r.read_boolean()?
            && r.read_bson_type()? == BsonType::EndOfDocument;
        if is_sentinel {
            r.read_end_document()?;
        } else {
            r.return_to_bookmark(&bookmark)?;
        }
        Ok(is_sentinel)
    }
}

impl<T: Describe> BsonSerializer for NullableSerializer<T> {
    fn value_type(&self) -> TypeDescriptor {
        Option::<T>::describe()
    }

    fn serialize(
        &self,
        ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &dyn Any,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let value = value
            .downcast_ref::<Option<T>>()
            .ok_or(BsonError::TypeMismatch {
                expected: any::type_name::<Option<T>>(),
            })?;
        match value {
            Some(value) => self.inner.serialize(&ctx.child(T::describe()), w, value, options),
            None if self.inner.may_write_null() => {
                w.write_start_document()?;
                w.write_name(NONE_SENTINEL)?;
                w.write_boolean(true)?;
                w.write_end_document()
            }
            None => w.write_null(),
        }
    }

    fn deserialize(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        options: Option<&SerializationOptions>,
    ) -> Result<ErasedValue> {
        if r.current_bson_type()? == BsonType::Null && !self.inner.may_write_null() {
            r.read_null()?;
            return Ok(Box::new(None::<T>));
        }
        if self.is_sentinel(r)? {
            return Ok(Box::new(None::<T>));
        }
        let value = self.inner.deserialize(&ctx.child(T::describe()), r, options)?;
        Ok(Box::new(Some(downcast_item::<T>(value)?)))
    }

    fn may_write_null(&self) -> bool {
        true
    }
}

/// The null value itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsonNullSerializer;

impl ValueSerializer for BsonNullSerializer {
    type Value = BsonNull;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        _value: &BsonNull,
        _options: Option<&SerializationOptions>,
    ) -> Result<()> {
        w.write_null()
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<BsonNull> {
        match r.current_bson_type()? {
            BsonType::Null => {
                r.read_null()?;
                Ok(BsonNull)
            }
            other => Err(cannot_deserialize::<BsonNull>(other)),
        }
    }

    fn may_write_null(&self) -> bool {
        true
    }
}
