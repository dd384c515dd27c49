use crate::any_value::AnyValue;
use crate::describe::Describe;
use crate::descriptor::{ContainerAccess, GenericShape, TypeDescriptor, TypeShape};
use crate::discriminator::{DiscriminatorConvention, StandardDiscriminatorConvention};
use crate::polymorphic::PolymorphicSerializer;
use crate::serializer::{BsonSerializer, ErasedValue, ValueSerializer};
use crate::serializers::{BsonEnum, EnumSerializer};
use bsonkit_types::{BsonError, DiscriminatorError, Result};
use hierarchy::{Hierarchy, TypedRoot, TypedSubtype, Upcast};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

mod defaults;
mod hierarchy;

/// An open serializer: given a closed generic type, builds the serializer for it.
///
/// `close` runs inside the registry's one-time initialization of `closed`. It
/// may look up the serializers of the type arguments, but must not look up
/// `closed` itself: that lookup waits on the initialization in progress and
/// never returns.
pub trait GenericSerializerDefinition: Send + Sync {
    fn close(
        &self,
        closed: &TypeDescriptor,
        access: &ContainerAccess,
    ) -> Result<Arc<dyn BsonSerializer>>;
}

type Specialization = Arc<OnceCell<Arc<dyn BsonSerializer>>>;

#[derive(Default)]
struct RegistryState {
    serializers: HashMap<TypeId, Arc<dyn BsonSerializer>>,
    generic_definitions: HashMap<GenericShape, Arc<dyn GenericSerializerDefinition>>,
    /// Type name -> descriptor, for resolving type-name discriminators.
    known_by_name: HashMap<&'static str, TypeDescriptor>,
    hierarchy: Hierarchy,
}

/// Maps value types to serializers.
///
/// Lookup order: an explicit registration, then the serializer a concrete
/// type carries itself, then a nullable wrapper around the inner type's
/// serializer, then the generic definition registered for the type's open
/// shape. Built serializers are cached per type; each is built at
/// most once even under concurrent first lookups.
pub struct SerializerRegistry {
    convention: Arc<dyn DiscriminatorConvention>,
    state: RwLock<RegistryState>,
    specializations: RwLock<HashMap<TypeId, Specialization>>,
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SerializerRegistry {
    /// An empty registry using the standard discriminator convention.
    pub fn new() -> Self {
        Self::empty(Arc::new(StandardDiscriminatorConvention))
    }

    /// A registry populated with every built-in serializer.
    pub fn with_defaults() -> Self {
        Self::with_convention(Arc::new(StandardDiscriminatorConvention))
    }

    /// A registry populated with every built-in serializer, resolving
    /// discriminators with `convention`.
    pub fn with_convention(convention: Arc<dyn DiscriminatorConvention>) -> Self {
        let mut registry = Self::empty(convention);
        defaults::install(&mut registry);
        registry
    }

    fn empty(convention: Arc<dyn DiscriminatorConvention>) -> Self {
        Self {
            convention,
            state: RwLock::new(RegistryState::default()),
            specializations: RwLock::new(HashMap::new()),
        }
    }

    pub fn convention(&self) -> &dyn DiscriminatorConvention {
        &*self.convention
    }

    /* registration */

    pub fn register<S: ValueSerializer>(&self, serializer: S) -> Result<()> {
        self.register_serializer(S::Value::describe(), Arc::new(serializer))
    }

    pub fn register_serializer(
        &self,
        descriptor: TypeDescriptor,
        serializer: Arc<dyn BsonSerializer>,
    ) -> Result<()> {
        let mut state = self.state.write();
        // A live cell means some lookup has built, or is building, its own
        // serializer for this type. Failed lookups drop their cell.
        let specialized = self.specializations.read().contains_key(&descriptor.id());
        if specialized || state.serializers.contains_key(&descriptor.id()) {
            return Err(BsonError::DuplicateRegistration(descriptor.name().to_owned()));
        }
        tracing::debug!(type_name = descriptor.name(), "Registering serializer.");
        state.serializers.insert(descriptor.id(), serializer);
        state.known_by_name.insert(descriptor.name(), descriptor);
        Ok(())
    }

    pub fn register_generic_definition(
        &self,
        shape: GenericShape,
        definition: Arc<dyn GenericSerializerDefinition>,
    ) -> Result<()> {
        let mut state = self.state.write();
        if state.generic_definitions.contains_key(&shape) {
            return Err(BsonError::DuplicateRegistration(shape.name().to_owned()));
        }
        tracing::debug!(shape = shape.name(), arity = shape.arity(), "Registering generic definition.");
        state.generic_definitions.insert(shape, definition);
        Ok(())
    }

    pub fn register_enum<E: BsonEnum>(&self) -> Result<()> {
        self.register(EnumSerializer::<E>::new())
    }

    /// Declares `N` a nominal type whose values are always one of its
    /// registered subtypes, e.g. `Box<dyn Shape>`. `unwrap` exposes the
    /// concrete value inside an `N`.
    pub fn register_polymorphic_root<N: Describe>(&self, unwrap: fn(&N) -> &dyn Any) -> Result<()> {
        let descriptor = N::describe();
        self.state
            .write()
            .hierarchy
            .add_root(descriptor, Arc::new(TypedRoot { unwrap }))?;
        self.register_serializer(descriptor, Arc::new(PolymorphicSerializer::new(descriptor)))
    }

    /// Records `S` as a subtype of the polymorphic root `N`, written with the
    /// discriminator `alias` (or its type name) and converted with `upcast`.
    pub fn register_subtype<N: Describe, S: Describe>(
        &self,
        alias: Option<&str>,
        upcast: fn(S) -> N,
    ) -> Result<()> {
        let nominal = N::describe();
        let actual = S::describe();
        let mut state = self.state.write();
        state.hierarchy.add_subtype(
            nominal,
            actual,
            alias.map(str::to_owned),
            Arc::new(TypedSubtype { upcast }),
        )?;
        state.known_by_name.insert(actual.name(), actual);
        tracing::debug!(
            nominal = nominal.name(),
            subtype = actual.name(),
            alias,
            "Registering subtype."
        );
        Ok(())
    }

    /// Registration while the registry is still exclusively owned.
    fn install(&mut self, descriptor: TypeDescriptor, serializer: Arc<dyn BsonSerializer>) {
        let state = self.state.get_mut();
        state.serializers.insert(descriptor.id(), serializer);
        state.known_by_name.insert(descriptor.name(), descriptor);
    }

    fn install_generic(&mut self, shape: GenericShape, definition: Arc<dyn GenericSerializerDefinition>) {
        self.state.get_mut().generic_definitions.insert(shape, definition);
    }

    fn install_root<N: Describe>(&mut self, unwrap: fn(&N) -> &dyn Any) {
        let descriptor = N::describe();
        let state = self.state.get_mut();
        state.hierarchy.install_root(descriptor, Arc::new(TypedRoot { unwrap }));
        state.serializers.insert(
            descriptor.id(),
            Arc::new(PolymorphicSerializer::new(descriptor)),
        );
        state.known_by_name.insert(descriptor.name(), descriptor);
    }

    /* lookup */

    pub fn lookup<T: Describe>(&self) -> Result<Arc<dyn BsonSerializer>> {
        self.lookup_descriptor(&T::describe())
    }

    pub fn lookup_descriptor(&self, descriptor: &TypeDescriptor) -> Result<Arc<dyn BsonSerializer>> {
        if let Some(serializer) = self.state.read().serializers.get(&descriptor.id()) {
            return Ok(Arc::clone(serializer));
        }
        let cell = self.specialization(descriptor.id());
        let built = cell.get_or_try_init(|| {
            // Registered after the check above, but before the cell existed.
            if let Some(serializer) = self.state.read().serializers.get(&descriptor.id()) {
                return Ok(Arc::clone(serializer));
            }
            self.specialize(descriptor)
        });
        match built {
            Ok(serializer) => Ok(Arc::clone(serializer)),
            Err(e) => {
                self.forget_specialization(descriptor.id(), &cell);
                Err(e)
            }
        }
    }

    fn forget_specialization(&self, id: TypeId, cell: &Specialization) {
        let mut specializations = self.specializations.write();
        let unbuilt = specializations
            .get(&id)
            .map_or(false, |current| Arc::ptr_eq(current, cell) && current.get().is_none());
        if unbuilt {
            specializations.remove(&id);
        }
    }

    fn specialization(&self, id: TypeId) -> Specialization {
        if let Some(cell) = self.specializations.read().get(&id) {
            return Arc::clone(cell);
        }
        Arc::clone(self.specializations.write().entry(id).or_default())
    }

    /// Runs with no registry lock held; building may look up other types.
    fn specialize(&self, descriptor: &TypeDescriptor) -> Result<Arc<dyn BsonSerializer>> {
        let serializer = match descriptor.shape() {
            TypeShape::Concrete(concrete) => match (concrete.attached)() {
                Some(serializer) => {
                    tracing::debug!(type_name = descriptor.name(), "Using attached serializer.");
                    serializer
                }
                None => return Err(BsonError::UnregisteredType(descriptor.name().to_owned())),
            },
            TypeShape::Nullable(nullable) => {
                let inner = self.lookup_descriptor(&(nullable.inner)())?;
                tracing::debug!(type_name = descriptor.name(), "Wrapping nullable serializer.");
                (nullable.wrap)(inner)
            }
            TypeShape::Generic(binding) => {
                let definition = self
                    .state
                    .read()
                    .generic_definitions
                    .get(&binding.definition)
                    .cloned()
                    .ok_or_else(|| BsonError::UnregisteredType(descriptor.name().to_owned()))?;
                let type_args = binding.access.type_args();
                if type_args.len() != binding.definition.arity() {
                    return Err(BsonError::GenericArity {
                        definition: binding.definition.name(),
                        closed: descriptor.name(),
                        expected: binding.definition.arity(),
                        actual: type_args.len(),
                    });
                }
                tracing::debug!(
                    type_name = descriptor.name(),
                    definition = binding.definition.name(),
                    "Closing generic serializer."
                );
                definition.close(descriptor, &binding.access)?
            }
        };
        self.state
            .write()
            .known_by_name
            .insert(descriptor.name(), *descriptor);
        Ok(serializer)
    }

    /* hierarchy */

    pub fn is_polymorphic(&self, descriptor: &TypeDescriptor) -> bool {
        self.state.read().hierarchy.is_root(descriptor)
    }

    /// Whether a value of `actual` may stand where `nominal` is declared.
    pub fn is_assignable(&self, nominal: &TypeDescriptor, actual: &TypeDescriptor) -> bool {
        self.state.read().hierarchy.is_assignable(nominal, actual)
    }

    /// Types a discriminator value may denote: its alias registrations,
    /// else the type registered or built under that name.
    pub fn discriminator_candidates(&self, discriminator: &str) -> Vec<TypeDescriptor> {
        let state = self.state.read();
        let aliased = state.hierarchy.aliased(discriminator);
        if !aliased.is_empty() {
            return aliased;
        }
        state.known_by_name.get(discriminator).copied().into_iter().collect()
    }

    pub fn alias_for(&self, nominal: &TypeDescriptor, actual: &TypeDescriptor) -> Option<String> {
        self.state.read().hierarchy.alias_for(nominal, actual)
    }

    /// The concrete type of `value`, declared as `nominal`, and the concrete
    /// value itself.
    pub(crate) fn actual_type_of<'v>(
        &self,
        nominal: &TypeDescriptor,
        value: &'v dyn Any,
    ) -> Result<(TypeDescriptor, &'v dyn Any)> {
        if nominal.is::<AnyValue>() {
            let mut any_value = value.downcast_ref::<AnyValue>().ok_or(BsonError::TypeMismatch {
                expected: nominal.name(),
            })?;
            while let Some(nested) = any_value.downcast_ref::<AnyValue>() {
                any_value = nested;
            }
            return Ok((*any_value.descriptor(), any_value.as_any()));
        }
        let state = self.state.read();
        if !state.hierarchy.is_root(nominal) {
            return Ok((*nominal, value));
        }
        let inner = state.hierarchy.unwrap_root(nominal, value)?;
        let actual = state
            .hierarchy
            .subtype_by_id(nominal, inner.type_id())
            .ok_or_else(|| {
                BsonError::UnregisteredType(format!("unregistered subtype of {}", nominal.name()))
            })?;
        Ok((actual, inner))
    }

    /// Converts a decoded `actual` value to the declared `nominal` type.
    pub(crate) fn upcast(
        &self,
        nominal: &TypeDescriptor,
        actual: &TypeDescriptor,
        value: ErasedValue,
    ) -> Result<ErasedValue> {
        if nominal == actual {
            return Ok(value);
        }
        if nominal.is::<AnyValue>() {
            return Ok(Box::new(AnyValue::from_erased(value, *actual)));
        }
        let upcast = self.state.read().hierarchy.upcast_for(nominal, actual);
        match upcast {
            Some(upcast) => upcast.upcast(value),
            None => Err(DiscriminatorError::NotAssignable {
                actual: actual.name(),
                nominal: nominal.name(),
            }
            .into()),
        }
    }
}
