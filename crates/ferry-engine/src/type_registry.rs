//! Foreign name → native type identity table

use std::any::TypeId;

use rustc_hash::FxHashMap;

use crate::error::{AdapterError, AdapterResult};

/// Identity of a native type
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    rust_name: &'static str,
}

impl TypeTag {
    /// Tag of `T`
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            rust_name: std::any::type_name::<T>(),
        }
    }

    /// Underlying type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Rust type name, for diagnostics only
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl std::hash::Hash for TypeTag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Bidirectional one-to-one map between foreign type names and native tags.
///
/// Entries keep registration order.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: Vec<(String, TypeTag)>,
    by_name: FxHashMap<String, usize>,
    by_tag: FxHashMap<TypeTag, usize>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `tag`.
    ///
    /// Re-registering an identical pair is a no-op. Binding a known name to
    /// another tag, or a known tag to another name, is rejected.
    pub fn register(&mut self, name: &str, tag: TypeTag) -> AdapterResult<()> {
        if let Some(&index) = self.by_name.get(name) {
            let (_, existing) = &self.entries[index];
            if *existing == tag {
                return Ok(());
            }
            return Err(AdapterError::ConflictingRegistration {
                name: name.to_string(),
                existing: existing.rust_name().to_string(),
                requested: tag.rust_name().to_string(),
            });
        }
        if let Some(&index) = self.by_tag.get(&tag) {
            let (existing, _) = &self.entries[index];
            return Err(AdapterError::ConflictingRegistration {
                name: name.to_string(),
                existing: format!("{} (as '{}')", tag.rust_name(), existing),
                requested: tag.rust_name().to_string(),
            });
        }

        let index = self.entries.len();
        self.entries.push((name.to_string(), tag));
        self.by_name.insert(name.to_string(), index);
        self.by_tag.insert(tag, index);
        Ok(())
    }

    /// Native tag bound to a foreign name
    pub fn lookup(&self, name: &str) -> Option<TypeTag> {
        self.by_name.get(name).map(|&index| self.entries[index].1)
    }

    /// Foreign name bound to a native tag
    pub fn name_of(&self, tag: TypeTag) -> Option<&str> {
        self.by_tag
            .get(&tag)
            .map(|&index| self.entries[index].0.as_str())
    }

    /// Check if a foreign name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Foreign names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
