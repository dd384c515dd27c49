use crate::any_value::AnyValue;
use crate::describe::{downcast_item, Describe};
use crate::descriptor::TypeDescriptor;
use crate::serializer::ErasedValue;
use bsonkit_types::{BsonError, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Exposes the concrete value held by a polymorphic root.
pub(super) trait RootAccess: Send + Sync {
    fn unwrap<'v>(&self, value: &'v dyn Any) -> Option<&'v dyn Any>;
}

pub(super) struct TypedRoot<N> {
    pub unwrap: fn(&N) -> &dyn Any,
}

impl<N: Describe> RootAccess for TypedRoot<N> {
    fn unwrap<'v>(&self, value: &'v dyn Any) -> Option<&'v dyn Any> {
        value.downcast_ref::<N>().map(self.unwrap)
    }
}

/// Converts a decoded subtype value into its root.
pub(super) trait Upcast: Send + Sync {
    fn upcast(&self, value: ErasedValue) -> Result<ErasedValue>;
}

pub(super) struct TypedSubtype<N, S> {
    pub upcast: fn(S) -> N,
}

impl<N: Describe, S: Describe> Upcast for TypedSubtype<N, S> {
    fn upcast(&self, value: ErasedValue) -> Result<ErasedValue> {
        let value = downcast_item::<S>(value)?;
        Ok(Box::new((self.upcast)(value)))
    }
}

struct Root {
    access: Arc<dyn RootAccess>,
    subtypes: HashMap<TypeId, Subtype>,
}

struct Subtype {
    descriptor: TypeDescriptor,
    alias: Option<String>,
    upcast: Arc<dyn Upcast>,
}

/// Polymorphic roots, their subtypes, and discriminator aliases.
#[derive(Default)]
pub(super) struct Hierarchy {
    roots: HashMap<TypeId, Root>,
    /// Alias -> every subtype registered under it, across roots.
    aliases: HashMap<String, Vec<TypeDescriptor>>,
}

impl Hierarchy {
    pub fn add_root(&mut self, root: TypeDescriptor, access: Arc<dyn RootAccess>) -> Result<()> {
        if self.roots.contains_key(&root.id()) {
            return Err(BsonError::DuplicateRegistration(root.name().to_owned()));
        }
        self.install_root(root, access);
        Ok(())
    }

    pub fn install_root(&mut self, root: TypeDescriptor, access: Arc<dyn RootAccess>) {
        self.roots.insert(
            root.id(),
            Root {
                access,
                subtypes: HashMap::new(),
            },
        );
    }

    pub fn add_subtype(
        &mut self,
        root: TypeDescriptor,
        subtype: TypeDescriptor,
        alias: Option<String>,
        upcast: Arc<dyn Upcast>,
    ) -> Result<()> {
        let entry = self.roots.get_mut(&root.id()).ok_or_else(|| {
            BsonError::invalid_operation(format!(
                "{} is not registered as a polymorphic root.",
                root.name()
            ))
        })?;
        if root == subtype || entry.subtypes.contains_key(&subtype.id()) {
            return Err(BsonError::DuplicateRegistration(format!(
                "{} as a subtype of {}",
                subtype.name(),
                root.name()
            )));
        }
        if let Some(alias) = &alias {
            let same_alias = self.aliases.entry(alias.clone()).or_default();
            if !same_alias.contains(&subtype) {
                same_alias.push(subtype);
            }
        }
        entry.subtypes.insert(
            subtype.id(),
            Subtype {
                descriptor: subtype,
                alias,
                upcast,
            },
        );
        Ok(())
    }

    pub fn is_root(&self, descriptor: &TypeDescriptor) -> bool {
        self.roots.contains_key(&descriptor.id())
    }

    pub fn is_assignable(&self, nominal: &TypeDescriptor, actual: &TypeDescriptor) -> bool {
        if nominal == actual || nominal.is::<AnyValue>() {
            return true;
        }
        self.roots
            .get(&nominal.id())
            .map_or(false, |root| root.subtypes.contains_key(&actual.id()))
    }

    pub fn aliased(&self, alias: &str) -> Vec<TypeDescriptor> {
        self.aliases.get(alias).cloned().unwrap_or_default()
    }

    /// The alias `actual` is registered with under `nominal`. Under
    /// `AnyValue`, an alias from any root applies.
    pub fn alias_for(&self, nominal: &TypeDescriptor, actual: &TypeDescriptor) -> Option<String> {
        let direct = self
            .roots
            .get(&nominal.id())
            .and_then(|root| root.subtypes.get(&actual.id()))
            .and_then(|subtype| subtype.alias.clone());
        if direct.is_some() || !nominal.is::<AnyValue>() {
            return direct;
        }
        self.roots
            .values()
            .filter_map(|root| root.subtypes.get(&actual.id()))
            .find_map(|subtype| subtype.alias.clone())
    }

    pub fn unwrap_root<'v>(&self, root: &TypeDescriptor, value: &'v dyn Any) -> Result<&'v dyn Any> {
        self.roots
            .get(&root.id())
            .and_then(|entry| entry.access.unwrap(value))
            .ok_or(BsonError::TypeMismatch {
                expected: root.name(),
            })
    }

    pub fn subtype_by_id(&self, root: &TypeDescriptor, id: TypeId) -> Option<TypeDescriptor> {
        self.roots
            .get(&root.id())
            .and_then(|entry| entry.subtypes.get(&id))
            .map(|subtype| subtype.descriptor)
    }

    pub fn upcast_for(&self, root: &TypeDescriptor, subtype: &TypeDescriptor) -> Option<Arc<dyn Upcast>> {
        self.roots
            .get(&root.id())
            .and_then(|entry| entry.subtypes.get(&subtype.id()))
            .map(|subtype| Arc::clone(&subtype.upcast))
    }
}
