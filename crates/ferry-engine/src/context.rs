//! Embedding context: one foreign runtime plus the adapters declared for it

use parking_lot::{RwLock, RwLockReadGuard};

use ferry_sdk::{ForeignRuntime, ForeignValue};

use crate::builder::AdapterBuilder;
use crate::config::AdapterOptions;
use crate::error::AdapterResult;
use crate::marshal::Adaptable;
use crate::registry::AdapterRegistry;

/// Owns a foreign runtime and the registry of adapters for it.
///
/// Declaration and implementation take the registry's write lock; boxing,
/// unboxing and calls share the read lock.
pub struct AdapterContext<R: ForeignRuntime> {
    runtime: R,
    registry: RwLock<AdapterRegistry>,
}

impl<R: ForeignRuntime> AdapterContext<R> {
    /// Context with default options
    pub fn new(runtime: R) -> Self {
        Self::with_options(runtime, AdapterOptions::default())
    }

    /// Context with the given options
    pub fn with_options(runtime: R, options: AdapterOptions) -> Self {
        Self {
            runtime,
            registry: RwLock::new(AdapterRegistry::with_options(options)),
        }
    }

    /// The foreign runtime
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Read access to the registry
    pub fn registry(&self) -> RwLockReadGuard<'_, AdapterRegistry> {
        self.registry.read()
    }

    /// Declare `T` (or reopen its declaration) and edit its property map
    pub fn declare<T, F>(&self, f: F) -> AdapterResult<()>
    where
        T: Adaptable,
        F: FnOnce(&mut AdapterBuilder<T>) -> AdapterResult<()>,
    {
        let mut registry = self.registry.write();
        f(registry.declare::<T>()?)
    }

    /// Realize `T`'s foreign type in `module`, or the default module
    pub fn implement<T: Adaptable>(&self, module: Option<&str>) -> AdapterResult<()> {
        self.registry.write().implement::<T>(&self.runtime, module)
    }

    /// Check if `T`'s foreign type has been realized
    pub fn is_implemented<T: Adaptable>(&self) -> bool {
        self.registry.read().is_implemented::<T>()
    }

    /// Box a native value
    pub fn box_value<T: Adaptable>(&self, value: &T) -> AdapterResult<ForeignValue> {
        self.registry.read().box_value(&self.runtime, value)
    }

    /// Unbox a foreign value
    pub fn unbox_value<T: Adaptable>(&self, value: ForeignValue) -> AdapterResult<T> {
        self.registry.read().unbox_value(&self.runtime, value)
    }

    /// Call a foreign function by name. Runtime errors come back as
    /// `ForeignRuntimeFailure` (or `TypeMismatch` for argument mismatches).
    pub fn call(&self, name: &str, args: &[ForeignValue]) -> AdapterResult<ForeignValue> {
        let registry = self.registry.read();
        let bridge = registry.bridge(&self.runtime);
        let _pause = bridge.pause();
        log::trace!("[AdapterContext] calling '{}' with {} args", name, args.len());
        Ok(self.runtime.call_function(name, args)?)
    }
}

impl<R: ForeignRuntime> std::fmt::Debug for AdapterContext<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterContext")
            .field("registry", &*self.registry.read())
            .finish_non_exhaustive()
    }
}
