//! Adapter registry and the runtime bridge handed to every conversion
//!
//! Each native type moves through two phases:
//!
//! - **Declared**: `declare::<T>()` returns an [`AdapterBuilder`] whose
//!   property map can still change.
//! - **Implemented**: `implement::<T>()` realizes the foreign descriptor and
//!   freezes the builder into a [`TypeAdapter`].
//!
//! Boxing and unboxing only ever see implemented adapters; asking for an
//! adapter that is declared but not implemented is `UninitializedAdapter`.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use ferry_sdk::{ForeignRuntime, ForeignValue, GcPause, TypeHandle};

use crate::adapter::{ErasedAdapter, TypeAdapter};
use crate::builder::AdapterBuilder;
use crate::config::AdapterOptions;
use crate::error::{AdapterError, AdapterResult};
use crate::marshal::Adaptable;
use crate::type_registry::{TypeRegistry, TypeTag};

/// A foreign runtime paired with the registry that knows how to convert
/// values for it
#[derive(Clone, Copy)]
pub struct Bridge<'a> {
    runtime: &'a dyn ForeignRuntime,
    registry: &'a AdapterRegistry,
}

impl<'a> Bridge<'a> {
    /// Pair `runtime` with `registry`
    pub fn new(runtime: &'a dyn ForeignRuntime, registry: &'a AdapterRegistry) -> Self {
        Self { runtime, registry }
    }

    /// The foreign runtime
    pub fn runtime(&self) -> &'a dyn ForeignRuntime {
        self.runtime
    }

    /// The adapter registry
    pub fn registry(&self) -> &'a AdapterRegistry {
        self.registry
    }

    /// Registry-wide options
    pub fn options(&self) -> &'a AdapterOptions {
        &self.registry.options
    }

    /// Pause collection unless the registry was configured not to
    pub fn pause(&self) -> Option<GcPause<'a>> {
        self.options().pause_gc.then(|| GcPause::new(self.runtime))
    }

    /// Box a value through its implemented adapter
    pub fn box_value<T: Adaptable>(&self, value: &T) -> AdapterResult<ForeignValue> {
        self.registry.adapter::<T>()?.box_instance(self, value)
    }

    /// Unbox a value through its implemented adapter
    pub fn unbox_value<T: Adaptable>(&self, value: ForeignValue) -> AdapterResult<T> {
        match self.registry.adapter::<T>() {
            Ok(adapter) => adapter.unbox_instance(self, value),
            // Abstract types fail the same way whether implemented or not
            Err(_) if T::default_instance().is_none() => {
                Err(AdapterError::AbstractInstantiation {
                    type_name: T::FOREIGN_NAME.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for Bridge<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

enum AdapterSlot {
    Declared(Box<dyn Any + Send + Sync>),
    Implemented(Box<dyn ErasedAdapter>),
}

/// Owner of every adapter known to an embedding
pub struct AdapterRegistry {
    options: AdapterOptions,
    names: TypeRegistry,
    slots: FxHashMap<TypeId, AdapterSlot>,
}

impl AdapterRegistry {
    /// Empty registry with default options
    pub fn new() -> Self {
        Self::with_options(AdapterOptions::default())
    }

    /// Empty registry with the given options
    pub fn with_options(options: AdapterOptions) -> Self {
        Self {
            options,
            names: TypeRegistry::new(),
            slots: FxHashMap::default(),
        }
    }

    /// Registry-wide options
    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Foreign name ↔ native type bindings of every declared adapter
    pub fn types(&self) -> &TypeRegistry {
        &self.names
    }

    /// Pair this registry with a runtime
    pub fn bridge<'a>(&'a self, runtime: &'a dyn ForeignRuntime) -> Bridge<'a> {
        Bridge::new(runtime, self)
    }

    /// Declare `T` or reopen its declaration.
    ///
    /// Fails when `T` is already implemented or its foreign name is bound to
    /// another native type.
    pub fn declare<T: Adaptable>(&mut self) -> AdapterResult<&mut AdapterBuilder<T>> {
        let id = TypeId::of::<T>();
        if !self.slots.contains_key(&id) {
            self.names.register(T::FOREIGN_NAME, TypeTag::of::<T>())?;
            let builder = AdapterBuilder::<T>::new()?;
            self.slots.insert(id, AdapterSlot::Declared(Box::new(builder)));
            log::debug!("[AdapterRegistry] declared '{}'", T::FOREIGN_NAME);
        }

        match self.slots.get_mut(&id) {
            Some(AdapterSlot::Declared(builder)) => {
                (**builder)
                    .downcast_mut::<AdapterBuilder<T>>()
                    .ok_or_else(|| AdapterError::UninitializedAdapter {
                        type_name: T::FOREIGN_NAME.to_string(),
                    })
            }
            Some(AdapterSlot::Implemented(_)) => Err(AdapterError::AlreadyImplemented {
                type_name: T::FOREIGN_NAME.to_string(),
            }),
            None => Err(AdapterError::UninitializedAdapter {
                type_name: T::FOREIGN_NAME.to_string(),
            }),
        }
    }

    /// Check if `T` was declared (implemented or not)
    pub fn is_declared<T: Adaptable>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Check if `T`'s foreign descriptor has been realized
    pub fn is_implemented<T: Adaptable>(&self) -> bool {
        matches!(
            self.slots.get(&TypeId::of::<T>()),
            Some(AdapterSlot::Implemented(_))
        )
    }

    /// Realize `T`'s foreign descriptor in `module` (the configured default
    /// module when `None`). Implementing twice is a no-op.
    ///
    /// On failure `T` stays declared and can be implemented again once the
    /// cause is fixed, e.g. after implementing a nested property's type.
    pub fn implement<T: Adaptable>(
        &mut self,
        runtime: &dyn ForeignRuntime,
        module: Option<&str>,
    ) -> AdapterResult<()> {
        let id = TypeId::of::<T>();
        let builder = match self.slots.get(&id) {
            Some(AdapterSlot::Implemented(_)) => return Ok(()),
            Some(AdapterSlot::Declared(builder)) => (**builder)
                .downcast_ref::<AdapterBuilder<T>>()
                .ok_or_else(|| AdapterError::UninitializedAdapter {
                    type_name: T::FOREIGN_NAME.to_string(),
                })?,
            None => {
                return Err(AdapterError::UninitializedAdapter {
                    type_name: T::FOREIGN_NAME.to_string(),
                })
            }
        };

        let module = module.unwrap_or(self.options.default_module.as_str()).to_string();
        log::debug!(
            "[AdapterRegistry] implementing '{}' in module '{}'",
            T::FOREIGN_NAME,
            module
        );

        let ancestor = match builder.ancestor() {
            Some(tag) => Some(self.implemented_handle(tag)?),
            None => None,
        };
        let (handle, symbols) = builder.realize(&self.bridge(runtime), &module, ancestor)?;

        let Some(AdapterSlot::Declared(builder)) = self.slots.remove(&id) else {
            return Err(AdapterError::UninitializedAdapter {
                type_name: T::FOREIGN_NAME.to_string(),
            });
        };
        let builder = builder.downcast::<AdapterBuilder<T>>().map_err(|_| {
            AdapterError::UninitializedAdapter {
                type_name: T::FOREIGN_NAME.to_string(),
            }
        })?;
        let adapter = builder.into_adapter(handle, symbols, module);
        self.slots
            .insert(id, AdapterSlot::Implemented(Box::new(adapter)));

        log::debug!(
            "[AdapterRegistry] implemented '{}' as type #{}",
            T::FOREIGN_NAME,
            handle.0
        );
        Ok(())
    }

    fn implemented_handle(&self, tag: TypeTag) -> AdapterResult<TypeHandle> {
        match self.slots.get(&tag.id()) {
            Some(AdapterSlot::Implemented(adapter)) => Ok(adapter.type_handle()),
            _ => Err(AdapterError::UninitializedAdapter {
                type_name: self
                    .names
                    .name_of(tag)
                    .unwrap_or(tag.rust_name())
                    .to_string(),
            }),
        }
    }

    /// Implemented adapter of `T`
    pub fn adapter<T: Adaptable>(&self) -> AdapterResult<&TypeAdapter<T>> {
        match self.slots.get(&TypeId::of::<T>()) {
            Some(AdapterSlot::Implemented(adapter)) => adapter
                .as_any()
                .downcast_ref::<TypeAdapter<T>>()
                .ok_or_else(|| AdapterError::UninitializedAdapter {
                    type_name: adapter.foreign_name().to_string(),
                }),
            _ => Err(AdapterError::UninitializedAdapter {
                type_name: T::FOREIGN_NAME.to_string(),
            }),
        }
    }

    /// Box `value` into a new foreign instance
    pub fn box_value<T: Adaptable>(
        &self,
        runtime: &dyn ForeignRuntime,
        value: &T,
    ) -> AdapterResult<ForeignValue> {
        self.bridge(runtime).box_value(value)
    }

    /// Unbox a foreign instance into a new native value
    pub fn unbox_value<T: Adaptable>(
        &self,
        runtime: &dyn ForeignRuntime,
        value: ForeignValue,
    ) -> AdapterResult<T> {
        self.bridge(runtime).unbox_value(value)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let implemented = self
            .slots
            .values()
            .filter(|slot| matches!(slot, AdapterSlot::Implemented(_)))
            .count();
        f.debug_struct("AdapterRegistry")
            .field("options", &self.options)
            .field("declared", &self.slots.len())
            .field("implemented", &implemented)
            .finish()
    }
}
