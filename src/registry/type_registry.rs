// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{FactoryError, RegistryError};
use crate::observability::messages::registry::{
    ComponentCreated, DuplicateTypeRejected, TypeRegistered, UnknownTypeRequested,
};
use crate::observability::messages::StructuredLog;

/// Configuration block that names the type it wants instantiated.
pub trait ComponentConfig {
    /// Registered type name to look up.
    fn type_name(&self) -> &str;

    /// Name of the instance, for diagnostics.
    fn instance_name(&self) -> &str;
}

/// Builds an instance of `P` from a configuration block `C`.
///
/// Implemented for every `Fn(&C) -> Result<Box<P>, FactoryError>`, so plain functions
/// and closures register directly. Implement it by hand when a factory carries state.
pub trait Factory<P: ?Sized, C>: Send + Sync {
    fn create(&self, config: &C) -> Result<Box<P>, FactoryError>;
}

impl<P: ?Sized, C, F> Factory<P, C> for F
where
    F: Fn(&C) -> Result<Box<P>, FactoryError> + Send + Sync,
{
    fn create(&self, config: &C) -> Result<Box<P>, FactoryError> {
        self(config)
    }
}

/// Map from type name to factory for one component family and element type.
///
/// The map is guarded by a single mutex. Registration happens once per type during
/// startup and lookups clone the factory handle out of the lock, so a factory may itself
/// create components through the registry without deadlocking.
///
/// # Examples
///
/// ```rust
/// use the_stagehand::registry::{ComponentConfig, TypeRegistry};
///
/// trait Shape: Send {
///     fn sides(&self) -> usize;
/// }
///
/// struct Square;
/// impl Shape for Square {
///     fn sides(&self) -> usize { 4 }
/// }
///
/// struct ShapeConfig(&'static str);
/// impl ComponentConfig for ShapeConfig {
///     fn type_name(&self) -> &str { self.0 }
///     fn instance_name(&self) -> &str { "example" }
/// }
///
/// let registry: TypeRegistry<dyn Shape, ShapeConfig> = TypeRegistry::new("shape", "n/a");
/// registry
///     .register("Square", |_config: &ShapeConfig| Ok(Box::new(Square) as Box<dyn Shape>))
///     .unwrap();
///
/// assert!(registry.register("Square", |_config: &ShapeConfig| Ok(Box::new(Square) as Box<dyn Shape>)).is_err());
/// assert_eq!(registry.create(&ShapeConfig("Square")).unwrap().sides(), 4);
/// assert!(registry.create(&ShapeConfig("Circle")).is_err());
/// assert_eq!(registry.list_types(), vec!["Square".to_string()]);
/// ```
pub struct TypeRegistry<P: ?Sized, C> {
    family: &'static str,
    element: &'static str,
    creators: Mutex<BTreeMap<String, Arc<dyn Factory<P, C>>>>,
}

impl<P: ?Sized + 'static, C: 'static> TypeRegistry<P, C> {
    /// Create an empty registry. `family` and `element` only feed diagnostics.
    pub fn new(family: &'static str, element: &'static str) -> Self {
        Self {
            family,
            element,
            creators: Mutex::new(BTreeMap::new()),
        }
    }

    /// Component family name (`"layer"`, `"solver"`).
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Register a function or closure under `type_name`.
    pub fn register<F>(&self, type_name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&C) -> Result<Box<P>, FactoryError> + Send + Sync + 'static,
    {
        self.register_factory(type_name, Arc::new(factory))
    }

    /// Register a shared factory under `type_name`.
    ///
    /// Fails with [`RegistryError::DuplicateType`] if the name is taken; the existing
    /// factory stays in place.
    pub fn register_factory(
        &self,
        type_name: &str,
        factory: Arc<dyn Factory<P, C>>,
    ) -> Result<(), RegistryError> {
        let mut creators = self.creators.lock();
        if creators.contains_key(type_name) {
            DuplicateTypeRejected {
                family: self.family,
                type_name,
                element: self.element,
            }
            .log();
            return Err(RegistryError::DuplicateType {
                family: self.family,
                type_name: type_name.to_string(),
            });
        }
        creators.insert(type_name.to_string(), factory);
        drop(creators);

        TypeRegistered {
            family: self.family,
            type_name,
            element: self.element,
        }
        .log();
        Ok(())
    }

    /// Registered type names, sorted.
    pub fn list_types(&self) -> Vec<String> {
        self.creators.lock().keys().cloned().collect()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.creators.lock().contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.creators.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.lock().is_empty()
    }
}

impl<P: ?Sized + 'static, C: ComponentConfig + 'static> TypeRegistry<P, C> {
    /// Instantiate the component `config` asks for.
    ///
    /// An unknown type fails with [`RegistryError::UnknownType`] listing every known
    /// type, and no factory is invoked.
    pub fn create(&self, config: &C) -> Result<Box<P>, RegistryError> {
        let type_name = config.type_name();
        let factory = self.creators.lock().get(type_name).cloned();

        let Some(factory) = factory else {
            let known = self.list_types();
            UnknownTypeRequested {
                family: self.family,
                type_name,
                instance: config.instance_name(),
                known: &known,
            }
            .log();
            return Err(RegistryError::UnknownType {
                family: self.family,
                type_name: type_name.to_string(),
                known,
            });
        };

        ComponentCreated {
            family: self.family,
            type_name,
            instance: config.instance_name(),
        }
        .log();

        factory
            .create(config)
            .map_err(|source| RegistryError::CreationFailed {
                family: self.family,
                type_name: type_name.to_string(),
                instance: config.instance_name().to_string(),
                source,
            })
    }
}

impl<P: ?Sized, C> fmt::Debug for TypeRegistry<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("family", &self.family)
            .field("element", &self.element)
            .field("types", &self.creators.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}
