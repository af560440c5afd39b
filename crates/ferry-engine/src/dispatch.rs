//! Dispatch resolver for polymorphic properties
//!
//! A polymorphic property is declared with a base type `F` and an ordered
//! list of derived alternatives. Boxing inspects the native value's dynamic
//! type with each alternative's downcast. Unboxing maps the foreign value's
//! runtime type name to the alternative to construct:
//!
//! 1. cache hit on the foreign name → done
//! 2. the declared type's own name → declared conversion
//! 3. foreign name → native tag through the adapter's type registry
//! 4. first alternative whose tag matches → its conversion
//!
//! Steps 2-4 write their result through to the cache. Anything that falls
//! through is a `TypeMismatch`, unless the registry was configured with
//! [`DispatchPolicy::FallbackToDeclared`].

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use ferry_sdk::ForeignValue;

use crate::config::DispatchPolicy;
use crate::error::{AdapterError, AdapterResult};
use crate::marshal::{Adaptable, Marshal};
use crate::registry::Bridge;
use crate::type_registry::{TypeRegistry, TypeTag};

/// A native type that may stand in for `B` inside a polymorphic property.
///
/// ```ignore
/// impl Subtype<Box<dyn Shape>> for Circle {
///     fn upcast(self) -> Box<dyn Shape> { Box::new(self) }
///     fn downcast(base: &Box<dyn Shape>) -> Option<&Self> { base.as_any().downcast_ref() }
/// }
/// ```
pub trait Subtype<B>: Adaptable + Marshal {
    /// Wrap a derived value as the base type
    fn upcast(self) -> B;

    /// View the base value as this type if that is its dynamic type
    fn downcast(base: &B) -> Option<&Self>;
}

type BoxFn<F> = fn(&Bridge<'_>, &F) -> Option<AdapterResult<ForeignValue>>;
type UnboxFn<F> = fn(ForeignValue, &Bridge<'_>) -> AdapterResult<F>;

fn box_variant<F, D: Subtype<F>>(bridge: &Bridge<'_>, base: &F) -> Option<AdapterResult<ForeignValue>> {
    <D as Subtype<F>>::downcast(base).map(|derived| derived.to_foreign(bridge))
}

fn unbox_variant<F, D: Subtype<F>>(value: ForeignValue, bridge: &Bridge<'_>) -> AdapterResult<F> {
    D::from_foreign(value, bridge).map(<D as Subtype<F>>::upcast)
}

fn unbox_declared<F: Marshal>(value: ForeignValue, bridge: &Bridge<'_>) -> AdapterResult<F> {
    F::from_foreign(value, bridge)
}

/// One declared alternative of a polymorphic property
pub struct Variant<F> {
    foreign_name: &'static str,
    tag: TypeTag,
    box_fn: BoxFn<F>,
    unbox_fn: UnboxFn<F>,
}

impl<F> Variant<F> {
    /// Foreign name of the alternative
    pub fn foreign_name(&self) -> &'static str {
        self.foreign_name
    }

    /// Native tag of the alternative
    pub fn tag(&self) -> TypeTag {
        self.tag
    }
}

/// Ordered list of derived alternatives for a base type `F`
pub struct Variants<F> {
    list: Vec<Variant<F>>,
}

impl<F: Marshal> Variants<F> {
    /// No alternatives yet
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Append `D` as an alternative. Earlier alternatives win when a native
    /// value downcasts to more than one.
    pub fn variant<D: Subtype<F>>(mut self) -> Self {
        self.list.push(Variant {
            foreign_name: D::FOREIGN_NAME,
            tag: TypeTag::of::<D>(),
            box_fn: box_variant::<F, D>,
            unbox_fn: unbox_variant::<F, D>,
        });
        self
    }

    /// Number of alternatives
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if no alternative was declared
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Alternatives in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Variant<F>> {
        self.list.iter()
    }
}

impl<F: Marshal> Default for Variants<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a resolution: which native variant to build and how
pub struct Resolution<F> {
    tag: TypeTag,
    convert: UnboxFn<F>,
}

impl<F> Clone for Resolution<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Resolution<F> {}

impl<F> Resolution<F> {
    /// Native tag that will be constructed
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Run the conversion
    pub fn convert(&self, value: ForeignValue, bridge: &Bridge<'_>) -> AdapterResult<F> {
        (self.convert)(value, bridge)
    }
}

/// Resolves foreign type names to native conversions for one property
pub struct DispatchResolver<F> {
    variants: Variants<F>,
    cache: Mutex<FxHashMap<String, Resolution<F>>>,
}

impl<F: Marshal> DispatchResolver<F> {
    /// Resolver over the given alternatives
    pub fn new(variants: Variants<F>) -> Self {
        Self {
            variants,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Declared alternatives
    pub fn variants(&self) -> &Variants<F> {
        &self.variants
    }

    /// Number of memoized resolutions
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if `foreign_name` has been resolved before
    pub fn is_cached(&self, foreign_name: &str) -> bool {
        self.cache.lock().contains_key(foreign_name)
    }

    fn declared(&self) -> Resolution<F> {
        Resolution {
            tag: TypeTag::of::<F>(),
            convert: unbox_declared::<F>,
        }
    }

    /// Resolve the conversion for a foreign value whose runtime type is
    /// `foreign_name`
    pub fn resolve(
        &self,
        types: &TypeRegistry,
        foreign_name: &str,
        policy: DispatchPolicy,
    ) -> AdapterResult<Resolution<F>> {
        if let Some(hit) = self.cache.lock().get(foreign_name) {
            return Ok(*hit);
        }

        let resolved = self.resolve_uncached(types, foreign_name, policy)?;
        self.cache
            .lock()
            .insert(foreign_name.to_string(), resolved);
        Ok(resolved)
    }

    fn resolve_uncached(
        &self,
        types: &TypeRegistry,
        foreign_name: &str,
        policy: DispatchPolicy,
    ) -> AdapterResult<Resolution<F>> {
        log::trace!(
            "[DispatchResolver] resolving '{}' for declared type '{}'",
            foreign_name,
            F::FOREIGN_TYPE
        );
        if foreign_name == F::FOREIGN_TYPE {
            return Ok(self.declared());
        }

        if let Some(tag) = types.lookup(foreign_name) {
            if let Some(variant) = self.variants.iter().find(|v| v.tag == tag) {
                return Ok(Resolution {
                    tag: variant.tag,
                    convert: variant.unbox_fn,
                });
            }
        }

        match policy {
            DispatchPolicy::Strict => Err(AdapterError::TypeMismatch {
                expected: F::FOREIGN_TYPE.to_string(),
                got: foreign_name.to_string(),
            }),
            DispatchPolicy::FallbackToDeclared => {
                log::warn!(
                    "[DispatchResolver] no alternative of '{}' matches '{}', using declared conversion",
                    F::FOREIGN_TYPE,
                    foreign_name
                );
                Ok(self.declared())
            }
        }
    }

    /// Box `base` through the first alternative its dynamic type matches,
    /// or through the declared type when none does
    pub fn box_value(&self, bridge: &Bridge<'_>, base: &F) -> AdapterResult<ForeignValue> {
        for variant in self.variants.iter() {
            if let Some(result) = (variant.box_fn)(bridge, base) {
                return result;
            }
        }
        base.to_foreign(bridge)
    }
}
