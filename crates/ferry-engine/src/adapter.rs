//! Implemented adapter: boxes and unboxes one native type through its
//! realized foreign descriptor

use std::any::Any;

use rustc_hash::FxHashMap;

use ferry_sdk::{ForeignValue, Symbol, TypeHandle};

use crate::config::DispatchPolicy;
use crate::error::{AdapterError, AdapterResult};
use crate::marshal::Adaptable;
use crate::property::PropertyDescriptor;
use crate::registry::Bridge;
use crate::type_registry::{TypeRegistry, TypeTag};

/// Adapter of `T` after its foreign type was realized.
///
/// Immutable apart from the dispatch caches of polymorphic properties.
pub struct TypeAdapter<T> {
    type_handle: TypeHandle,
    module: String,
    properties: Vec<PropertyDescriptor<T>>,
    symbols: Vec<Symbol>,
    index: FxHashMap<String, usize>,
    types: TypeRegistry,
    ancestor: Option<TypeTag>,
    is_abstract: bool,
}

impl<T: Adaptable> TypeAdapter<T> {
    pub(crate) fn new(
        type_handle: TypeHandle,
        module: String,
        properties: Vec<PropertyDescriptor<T>>,
        symbols: Vec<Symbol>,
        index: FxHashMap<String, usize>,
        types: TypeRegistry,
        ancestor: Option<TypeTag>,
        is_abstract: bool,
    ) -> Self {
        Self {
            type_handle,
            module,
            properties,
            symbols,
            index,
            types,
            ancestor,
            is_abstract,
        }
    }

    /// Foreign type name
    pub fn name(&self) -> &'static str {
        T::FOREIGN_NAME
    }

    /// Whether `T` has no native default representation
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Realized foreign descriptor
    pub fn type_handle(&self) -> TypeHandle {
        self.type_handle
    }

    /// Module the descriptor was promoted into
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Property names in field order
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name()).collect()
    }

    /// Look up one property
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor<T>> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    /// Foreign name ↔ native type bindings used for dispatch
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Declared direct supertype
    pub fn ancestor(&self) -> Option<TypeTag> {
        self.ancestor
    }

    /// Allocate a foreign instance and copy every property into it
    pub fn box_instance(&self, bridge: &Bridge<'_>, value: &T) -> AdapterResult<ForeignValue> {
        if self.is_abstract() {
            return Err(AdapterError::AbstractInstantiation {
                type_name: T::FOREIGN_NAME.to_string(),
            });
        }

        let rt = bridge.runtime();
        let _pause = bridge.pause();
        let instance = rt.instantiate(self.type_handle)?;
        for (property, symbol) in self.properties.iter().zip(&self.symbols) {
            let field = property.to_foreign(bridge, value)?;
            rt.set_field(instance, *symbol, field)?;
        }
        Ok(instance)
    }

    /// Build a native value from a foreign instance
    pub fn unbox_instance(&self, bridge: &Bridge<'_>, value: ForeignValue) -> AdapterResult<T> {
        if self.is_abstract {
            return Err(AdapterError::AbstractInstantiation {
                type_name: T::FOREIGN_NAME.to_string(),
            });
        }
        let mut instance =
            T::default_instance().ok_or_else(|| AdapterError::AbstractInstantiation {
                type_name: T::FOREIGN_NAME.to_string(),
            })?;
        self.populate(bridge, value, &mut instance)?;
        Ok(instance)
    }

    fn populate(&self, bridge: &Bridge<'_>, value: ForeignValue, instance: &mut T) -> AdapterResult<()> {
        let rt = bridge.runtime();
        let _pause = bridge.pause();

        let actual = rt.type_name(rt.type_of(value)?)?;
        if actual != T::FOREIGN_NAME {
            match bridge.options().dispatch_policy {
                DispatchPolicy::Strict => {
                    return Err(AdapterError::TypeMismatch {
                        expected: T::FOREIGN_NAME.to_string(),
                        got: actual,
                    });
                }
                DispatchPolicy::FallbackToDeclared => log::warn!(
                    "[TypeAdapter] unboxing '{}' as '{}' by field name",
                    actual,
                    T::FOREIGN_NAME
                ),
            }
        }

        for (property, symbol) in self.properties.iter().zip(&self.symbols) {
            if !property.is_writable() {
                continue;
            }
            let field = rt
                .get_field(value, *symbol)?
                .ok_or_else(|| AdapterError::PropertyNotFound {
                    type_name: actual.clone(),
                    property: property.name().to_string(),
                })?;
            let field_type = rt.type_name(rt.type_of(field)?)?;
            property.from_foreign(bridge, &self.types, instance, field, &field_type)?;
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for TypeAdapter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeAdapter")
            .field("type_handle", &self.type_handle)
            .field("module", &self.module)
            .field("properties", &self.properties)
            .finish()
    }
}

/// Object-safe view of an implemented adapter, used by the registry
pub(crate) trait ErasedAdapter: Any + Send + Sync {
    fn foreign_name(&self) -> &'static str;

    fn type_handle(&self) -> TypeHandle;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Adaptable> ErasedAdapter for TypeAdapter<T> {
    fn foreign_name(&self) -> &'static str {
        T::FOREIGN_NAME
    }

    fn type_handle(&self) -> TypeHandle {
        self.type_handle
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
