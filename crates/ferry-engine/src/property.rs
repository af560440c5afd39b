//! Property descriptors: one named foreign field and how to read/write it

use ferry_sdk::ForeignValue;

use crate::dispatch::DispatchResolver;
use crate::error::AdapterResult;
use crate::marshal::Marshal;
use crate::registry::Bridge;
use crate::type_registry::TypeRegistry;

/// Type-erased accessor pair of a property on `T`
pub(crate) trait PropertyAccess<T>: Send + Sync {
    fn declared_type(&self) -> &'static str;

    fn is_writable(&self) -> bool;

    fn alternatives(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn cache_len(&self) -> usize {
        0
    }

    fn to_foreign(&self, bridge: &Bridge<'_>, instance: &T) -> AdapterResult<ForeignValue>;

    fn from_foreign(
        &self,
        bridge: &Bridge<'_>,
        types: &TypeRegistry,
        instance: &mut T,
        value: ForeignValue,
        foreign_name: &str,
    ) -> AdapterResult<()>;
}

type Getter<T, V> = Box<dyn Fn(&T) -> V + Send + Sync>;
type Setter<T, V> = Box<dyn Fn(&mut T, V) + Send + Sync>;
type RefGetter<T, V> = Box<dyn Fn(&T) -> &V + Send + Sync>;

/// Non-polymorphic property. No setter means the field is foreign-only and
/// is never read back.
pub(crate) struct FieldAccess<T, V> {
    pub get: Getter<T, V>,
    pub set: Option<Setter<T, V>>,
}

impl<T, V: Marshal> PropertyAccess<T> for FieldAccess<T, V> {
    fn declared_type(&self) -> &'static str {
        V::FOREIGN_TYPE
    }

    fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    fn to_foreign(&self, bridge: &Bridge<'_>, instance: &T) -> AdapterResult<ForeignValue> {
        (self.get)(instance).to_foreign(bridge)
    }

    fn from_foreign(
        &self,
        bridge: &Bridge<'_>,
        _types: &TypeRegistry,
        instance: &mut T,
        value: ForeignValue,
        _foreign_name: &str,
    ) -> AdapterResult<()> {
        if let Some(set) = &self.set {
            set(instance, V::from_foreign(value, bridge)?);
        }
        Ok(())
    }
}

/// Property whose declared type `F` may hold any of several derived types
pub(crate) struct PolymorphicAccess<T, F> {
    pub get: RefGetter<T, F>,
    pub set: Setter<T, F>,
    pub resolver: DispatchResolver<F>,
}

impl<T, F: Marshal> PropertyAccess<T> for PolymorphicAccess<T, F> {
    fn declared_type(&self) -> &'static str {
        F::FOREIGN_TYPE
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn alternatives(&self) -> Vec<&'static str> {
        self.resolver
            .variants()
            .iter()
            .map(|v| v.foreign_name())
            .collect()
    }

    fn cache_len(&self) -> usize {
        self.resolver.cache_len()
    }

    fn to_foreign(&self, bridge: &Bridge<'_>, instance: &T) -> AdapterResult<ForeignValue> {
        self.resolver.box_value(bridge, (self.get)(instance))
    }

    fn from_foreign(
        &self,
        bridge: &Bridge<'_>,
        types: &TypeRegistry,
        instance: &mut T,
        value: ForeignValue,
        foreign_name: &str,
    ) -> AdapterResult<()> {
        let resolution =
            self.resolver
                .resolve(types, foreign_name, bridge.options().dispatch_policy)?;
        (self.set)(instance, resolution.convert(value, bridge)?);
        Ok(())
    }
}

/// One declared property of an adapted type
pub struct PropertyDescriptor<T> {
    name: String,
    access: Box<dyn PropertyAccess<T>>,
}

impl<T> PropertyDescriptor<T> {
    pub(crate) fn new(name: &str, access: Box<dyn PropertyAccess<T>>) -> Self {
        Self {
            name: name.to_string(),
            access,
        }
    }

    /// Foreign field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Foreign type used when no polymorphism is in play
    pub fn declared_type(&self) -> &'static str {
        self.access.declared_type()
    }

    /// Whether unboxing writes this property back
    pub fn is_writable(&self) -> bool {
        self.access.is_writable()
    }

    /// Whether derived alternatives were declared
    pub fn is_polymorphic(&self) -> bool {
        !self.access.alternatives().is_empty()
    }

    /// Foreign names of the declared derived alternatives
    pub fn alternatives(&self) -> Vec<&'static str> {
        self.access.alternatives()
    }

    /// Number of memoized dispatch resolutions
    pub fn dispatch_cache_len(&self) -> usize {
        self.access.cache_len()
    }

    /// Read the field off `instance` and convert it
    pub fn to_foreign(&self, bridge: &Bridge<'_>, instance: &T) -> AdapterResult<ForeignValue> {
        self.access.to_foreign(bridge, instance)
    }

    pub(crate) fn from_foreign(
        &self,
        bridge: &Bridge<'_>,
        types: &TypeRegistry,
        instance: &mut T,
        value: ForeignValue,
        foreign_name: &str,
    ) -> AdapterResult<()> {
        self.access
            .from_foreign(bridge, types, instance, value, foreign_name)
    }
}

impl<T> std::fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type())
            .field("alternatives", &self.alternatives())
            .finish()
    }
}
