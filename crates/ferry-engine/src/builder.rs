//! Declaration-phase adapter: the property map of a type whose foreign
//! descriptor does not exist yet

use rustc_hash::FxHashMap;

use ferry_sdk::{Symbol, TypeHandle};

use crate::adapter::TypeAdapter;
use crate::dispatch::{DispatchResolver, Subtype, Variants};
use crate::error::{AdapterError, AdapterResult};
use crate::marshal::{Adaptable, Marshal};
use crate::property::{FieldAccess, PolymorphicAccess, PropertyAccess, PropertyDescriptor};
use crate::registry::Bridge;
use crate::type_registry::{TypeRegistry, TypeTag};

/// Ordered property map of `T`, editable until the type is implemented.
///
/// ```ignore
/// registry
///     .declare::<Point>()?
///     .property("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v)?
///     .property("y", |p: &Point| p.y, |p: &mut Point, v| p.y = v)?;
/// ```
pub struct AdapterBuilder<T> {
    properties: Vec<PropertyDescriptor<T>>,
    index: FxHashMap<String, usize>,
    types: TypeRegistry,
    is_abstract: bool,
    ancestor: Option<TypeTag>,
}

impl<T: Adaptable> AdapterBuilder<T> {
    pub(crate) fn new() -> AdapterResult<Self> {
        let mut types = TypeRegistry::new();
        types.register(T::FOREIGN_NAME, TypeTag::of::<T>())?;
        Ok(Self {
            properties: Vec::new(),
            index: FxHashMap::default(),
            types,
            is_abstract: T::default_instance().is_none(),
            ancestor: None,
        })
    }

    /// Foreign type name
    pub fn name(&self) -> &'static str {
        T::FOREIGN_NAME
    }

    /// Whether `T` has no native default representation
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Declared property names in field order
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name()).collect()
    }

    /// Foreign name ↔ native type bindings known to this adapter
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Declared direct supertype
    pub fn ancestor(&self) -> Option<TypeTag> {
        self.ancestor
    }

    fn insert(&mut self, name: &str, access: Box<dyn PropertyAccess<T>>) -> AdapterResult<&mut Self> {
        if name.is_empty() {
            return Err(AdapterError::InvalidProperty(format!(
                "empty property name on '{}'",
                T::FOREIGN_NAME
            )));
        }

        let descriptor = PropertyDescriptor::new(name, access);
        match self.index.get(name) {
            // Redeclaring keeps the original field position
            Some(&position) => self.properties[position] = descriptor,
            None => {
                self.index.insert(name.to_string(), self.properties.len());
                self.properties.push(descriptor);
            }
        }
        log::trace!("[AdapterBuilder] {}.{} declared", T::FOREIGN_NAME, name);
        Ok(self)
    }

    /// Declare a read/write property of type `V`
    pub fn property<V, G, S>(&mut self, name: &str, get: G, set: S) -> AdapterResult<&mut Self>
    where
        V: Marshal,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let set: Box<dyn Fn(&mut T, V) + Send + Sync> = Box::new(set);
        self.insert(
            name,
            Box::new(FieldAccess::<T, V> {
                get: Box::new(get),
                set: Some(set),
            }),
        )
    }

    /// Declare a foreign-only field computed from the native value. Unboxing
    /// never reads it back.
    pub fn property_get<V, G>(&mut self, name: &str, get: G) -> AdapterResult<&mut Self>
    where
        V: Marshal,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.insert(
            name,
            Box::new(FieldAccess::<T, V> {
                get: Box::new(get),
                set: None,
            }),
        )
    }

    /// Declare a property of base type `F` that may hold any of `variants`.
    ///
    /// Every alternative is bound in this adapter's type registry so unboxing
    /// can map the foreign value's runtime type back to it.
    pub fn polymorphic_property<F, G, S>(
        &mut self,
        name: &str,
        get: G,
        set: S,
        variants: Variants<F>,
    ) -> AdapterResult<&mut Self>
    where
        F: Marshal,
        G: for<'a> Fn(&'a T) -> &'a F + Send + Sync + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        // All or nothing: a conflicting variant leaves the registry untouched
        let mut types = self.types.clone();
        for variant in variants.iter() {
            types.register(variant.foreign_name(), variant.tag())?;
        }
        self.types = types;
        self.insert(
            name,
            Box::new(PolymorphicAccess::<T, F> {
                get: Box::new(get),
                set: Box::new(set),
                resolver: DispatchResolver::new(variants),
            }),
        )
    }

    /// Chain `T` beneath `B`'s foreign descriptor. `B` must be implemented
    /// before `T` is.
    pub fn extends<B>(&mut self) -> AdapterResult<&mut Self>
    where
        B: Adaptable,
        T: Subtype<B>,
    {
        self.types.register(<B as Adaptable>::FOREIGN_NAME, TypeTag::of::<B>())?;
        self.ancestor = Some(TypeTag::of::<B>());
        Ok(self)
    }

    /// Build the foreign descriptor: intern every field name, seed a template
    /// with the default instance's field values in declared order, promote
    /// it into `module`.
    pub(crate) fn realize(
        &self,
        bridge: &Bridge<'_>,
        module: &str,
        ancestor: Option<TypeHandle>,
    ) -> AdapterResult<(TypeHandle, Vec<Symbol>)> {
        let rt = bridge.runtime();
        let _pause = bridge.pause();

        let symbols: Vec<Symbol> = self.properties.iter().map(|p| rt.intern(p.name())).collect();
        let template = rt.allocate_template(rt.intern(T::FOREIGN_NAME))?;

        // Abstract types anchor a hierarchy and carry no fields
        if let Some(instance) = T::default_instance() {
            for (property, symbol) in self.properties.iter().zip(&symbols) {
                let value = property.to_foreign(bridge, &instance)?;
                rt.set_template_field(template, *symbol, value)?;
            }
        }

        let handle = rt.promote_template(template, module, self.is_abstract, ancestor)?;
        Ok((handle, symbols))
    }

    pub(crate) fn into_adapter(
        self,
        type_handle: TypeHandle,
        symbols: Vec<Symbol>,
        module: String,
    ) -> TypeAdapter<T> {
        TypeAdapter::new(
            type_handle,
            module,
            self.properties,
            symbols,
            self.index,
            self.types,
            self.ancestor,
            self.is_abstract,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Point {
        x: i32,
        y: i32,
    }
    crate::adaptable!(Point => "Point");

    #[test]
    fn test_declaration_order() {
        let mut builder = AdapterBuilder::<Point>::new().unwrap();
        builder
            .property("y", |p: &Point| p.y, |p: &mut Point, v| p.y = v)
            .unwrap()
            .property("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v)
            .unwrap();
        assert_eq!(builder.property_names(), vec!["y", "x"]);
        assert_eq!(builder.name(), "Point");
        assert!(!builder.is_abstract());
        assert!(builder.types().contains("Point"));
    }

    #[test]
    fn test_redeclare_keeps_position() {
        let mut builder = AdapterBuilder::<Point>::new().unwrap();
        builder
            .property("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v)
            .unwrap()
            .property("y", |p: &Point| p.y, |p: &mut Point, v| p.y = v)
            .unwrap()
            .property_get("x", |p: &Point| p.x * 10)
            .unwrap();
        assert_eq!(builder.property_names(), vec!["x", "y"]);
        assert!(!builder.properties[0].is_writable());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut builder = AdapterBuilder::<Point>::new().unwrap();
        let result = builder.property_get("", |p: &Point| p.x);
        assert!(matches!(result, Err(AdapterError::InvalidProperty(_))));
        assert!(builder.property_names().is_empty());
    }
}
