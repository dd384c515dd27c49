use bsonkit_serializers::descriptor::{ContainerAccess, SequenceAccess};
use bsonkit_serializers::serializers::{BsonEnum, SequenceKind, SequenceSerializerDefinition};
use bsonkit_serializers::{
    BsonSerializer, Describe, ErasedValue, GenericSerializerDefinition, GenericShape,
    SerializationContext, SerializerRegistry, TypeDescriptor, ValueSerializer,
};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BsonError, BsonType, Result};
use chrono::{DateTime, Utc};
use num_derive::{FromPrimitive, ToPrimitive};
use std::any::{self, Any};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

fn read_fields(
    r: &mut dyn BsonReader,
    ctx: &SerializationContext<'_>,
    mut read_field: impl FnMut(&mut dyn BsonReader, &str) -> Result<()>,
) -> Result<()> {
    r.read_start_document()?;
    while r.read_bson_type()? != BsonType::EndOfDocument {
        let name = r.current_name().unwrap_or_default().to_owned();
        if ctx.is_discriminator_element(&name) {
            r.skip_value()?;
            continue;
        }
        read_field(r, &name)?;
    }
    r.read_end_document()
}

fn missing(type_name: &str, field: &str) -> BsonError {
    BsonError::format(format!("{type_name} is missing '{field}'."))
}

fn unknown(type_name: &str, field: &str) -> BsonError {
    BsonError::format(format!("{type_name} has no field '{field}'."))
}

/* records */

#[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
pub enum Role {
    Guest = 0,
    Member = 1,
    Admin = 2,
}

impl Describe for Role {}
impl BsonEnum for Role {
    fn variants() -> &'static [(Self, &'static str)] {
        &[(Role::Guest, "Guest"), (Role::Member, "Member"), (Role::Admin, "Admin")]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub age: Option<u8>,
    pub role: Role,
    pub joined: DateTime<Utc>,
    pub scores: BTreeMap<String, f64>,
    pub tags: Vec<String>,
}

impl Describe for Person {}

pub struct PersonSerializer;

impl ValueSerializer for PersonSerializer {
    type Value = Person;

    fn serialize_value(
        &self,
        ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Person,
        _options: Option<&bsonkit_serializers::SerializationOptions>,
    ) -> Result<()> {
        w.write_start_document()?;
        w.write_name("id")?;
        ctx.serialize_member(w, &value.id, None)?;
        w.write_name("name")?;
        ctx.serialize_member(w, &value.name, None)?;
        w.write_name("age")?;
        ctx.serialize_member(w, &value.age, None)?;
        w.write_name("role")?;
        ctx.serialize_member(w, &value.role, None)?;
        w.write_name("joined")?;
        ctx.serialize_member(w, &value.joined, None)?;
        w.write_name("scores")?;
        ctx.serialize_member(w, &value.scores, None)?;
        w.write_name("tags")?;
        ctx.serialize_member(w, &value.tags, None)?;
        w.write_end_document()
    }

    fn deserialize_value(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&bsonkit_serializers::SerializationOptions>,
    ) -> Result<Person> {
        let (mut id, mut name, mut age, mut role, mut joined, mut scores, mut tags) =
            (None, None, None, None, None, None, None);
        read_fields(r, ctx, |r, field| {
            match field {
                "id" => id = Some(ctx.deserialize_member(r, None)?),
                "name" => name = Some(ctx.deserialize_member(r, None)?),
                "age" => age = Some(ctx.deserialize_member(r, None)?),
                "role" => role = Some(ctx.deserialize_member(r, None)?),
                "joined" => joined = Some(ctx.deserialize_member(r, None)?),
                "scores" => scores = Some(ctx.deserialize_member(r, None)?),
                "tags" => tags = Some(ctx.deserialize_member(r, None)?),
                _ => return Err(unknown("Person", field)),
            }
            Ok(())
        })?;
        Ok(Person {
            id: id.ok_or_else(|| missing("Person", "id"))?,
            name: name.ok_or_else(|| missing("Person", "name"))?,
            age: age.unwrap_or_default(),
            role: role.ok_or_else(|| missing("Person", "role"))?,
            joined: joined.ok_or_else(|| missing("Person", "joined"))?,
            scores: scores.unwrap_or_default(),
            tags: tags.unwrap_or_default(),
        })
    }
}

/* animals */

pub trait Animal: Any + Send + Sync + Debug {
    fn name(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

impl Describe for Box<dyn Animal> {}

/// Writes its discriminator inside its own document.
#[derive(Debug, Clone, PartialEq)]
pub struct Dog {
    pub name: String,
    pub good: bool,
}

/// Relies on the envelope for its discriminator.
#[derive(Debug, Clone, PartialEq)]
pub struct Cat {
    pub name: String,
    pub lives: i32,
}

impl Describe for Dog {}
impl Describe for Cat {}

impl Animal for Dog {
    fn name(&self) -> &str {
        &self.name
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Animal for Cat {
    fn name(&self) -> &str {
        &self.name
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct DogSerializer;

impl ValueSerializer for DogSerializer {
    type Value = Dog;

    fn serialize_value(
        &self,
        ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Dog,
        _options: Option<&bsonkit_serializers::SerializationOptions>,
    ) -> Result<()> {
        w.write_start_document()?;
        ctx.write_discriminator(w)?;
        w.write_name("name")?;
        w.write_string(&value.name)?;
        w.write_name("good")?;
        w.write_boolean(value.good)?;
        w.write_end_document()
    }

    fn deserialize_value(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&bsonkit_serializers::SerializationOptions>,
    ) -> Result<Dog> {
        let (mut name, mut good) = (None, None);
        read_fields(r, ctx, |r, field| {
            match field {
                "name" => name = Some(r.read_string()?),
                "good" => good = Some(r.read_boolean()?),
                _ => return Err(unknown("Dog", field)),
            }
            Ok(())
        })?;
        Ok(Dog {
            name: name.ok_or_else(|| missing("Dog", "name"))?,
            good: good.ok_or_else(|| missing("Dog", "good"))?,
        })
    }

    fn handles_discriminator(&self) -> bool {
        true
    }
}

pub struct CatSerializer;

impl ValueSerializer for CatSerializer {
    type Value = Cat;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Cat,
        _options: Option<&bsonkit_serializers::SerializationOptions>,
    ) -> Result<()> {
        w.write_start_document()?;
        w.write_name("name")?;
        w.write_string(&value.name)?;
        w.write_name("lives")?;
        w.write_int32(value.lives)?;
        w.write_end_document()
    }

    fn deserialize_value(
        &self,
        ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&bsonkit_serializers::SerializationOptions>,
    ) -> Result<Cat> {
        let (mut name, mut lives) = (None, None);
        read_fields(r, ctx, |r, field| {
            match field {
                "name" => name = Some(r.read_string()?),
                "lives" => lives = Some(r.read_int32()?),
                _ => return Err(unknown("Cat", field)),
            }
            Ok(())
        })?;
        Ok(Cat {
            name: name.ok_or_else(|| missing("Cat", "name"))?,
            lives: lives.ok_or_else(|| missing("Cat", "lives"))?,
        })
    }
}

fn unwrap_animal(animal: &Box<dyn Animal>) -> &dyn Any {
    animal.as_any()
}

/// A registry with every fixture type registered. Dogs are discriminated as
/// `dog`, cats by their type name.
/* a type carrying its own serializer */

/// Never registered; found through [`Describe::serializer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Describe for Rgb {
    fn serializer() -> Option<Arc<dyn BsonSerializer>> {
        Some(Arc::new(RgbSerializer))
    }
}

/// Writes `#rrggbb`.
pub struct RgbSerializer;

impl ValueSerializer for RgbSerializer {
    type Value = Rgb;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Rgb,
        _options: Option<&bsonkit_serializers::SerializationOptions>,
    ) -> Result<()> {
        w.write_string(&format!("#{:02x}{:02x}{:02x}", value.0, value.1, value.2))
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&bsonkit_serializers::SerializationOptions>,
    ) -> Result<Rgb> {
        let text = r.read_string()?;
        let channel = |at: usize| {
            text.get(at..at + 2)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| BsonError::format(format!("'{text}' is not a color.")))
        };
        if text.len() != 7 || !text.starts_with('#') {
            return Err(BsonError::format(format!("'{text}' is not a color.")));
        }
        Ok(Rgb(channel(1)?, channel(3)?, channel(5)?))
    }
}

pub fn registry() -> Result<SerializerRegistry> {
    let registry = SerializerRegistry::with_defaults();
    registry.register(PersonSerializer)?;
    registry.register_enum::<Role>()?;
    registry.register(DogSerializer)?;
    registry.register(CatSerializer)?;
    registry.register_polymorphic_root::<Box<dyn Animal>>(unwrap_animal)?;
    registry.register_subtype::<Box<dyn Animal>, Dog>(Some("dog"), |dog| Box::new(dog))?;
    registry.register_subtype::<Box<dyn Animal>, Cat>(None, |cat| Box::new(cat))?;
    Ok(registry)
}

/* a user-defined generic shape */

#[derive(Debug, Clone, PartialEq)]
pub struct Bag<T>(pub Vec<T>);

pub const BAG: GenericShape = GenericShape::new("Bag", 1);

impl<T: Describe> Describe for Bag<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::generic::<Self>(
            BAG,
            ContainerAccess::Sequence(SequenceAccess {
                item: T::describe,
                items: |v| {
                    let bag = v.downcast_ref::<Self>()?;
                    Some(bag.0.iter().map(|item| item as &dyn Any).collect())
                },
                collect: |items| {
                    let items = items
                        .into_iter()
                        .map(|item: ErasedValue| {
                            item.downcast::<T>().map(|b| *b).map_err(|_| BsonError::TypeMismatch {
                                expected: any::type_name::<T>(),
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Box::new(Bag(items)))
                },
            }),
        )
    }
}

/// Closes `Bag<T>` as a list, counting closings. Each closing is slow, so
/// concurrent first lookups overlap.
pub struct CountingDefinition {
    closings: AtomicUsize,
    inner: SequenceSerializerDefinition,
}

impl Default for CountingDefinition {
    fn default() -> Self {
        Self {
            closings: AtomicUsize::new(0),
            inner: SequenceSerializerDefinition::new(SequenceKind::List),
        }
    }
}

impl CountingDefinition {
    pub fn closings(&self) -> usize {
        self.closings.load(Ordering::SeqCst)
    }
}

impl GenericSerializerDefinition for CountingDefinition {
    fn close(&self, closed: &TypeDescriptor, access: &ContainerAccess) -> Result<Arc<dyn BsonSerializer>> {
        self.closings.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.inner.close(closed, access)
    }
}
