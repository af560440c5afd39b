//! Field-order view over a realized foreign type descriptor

use rustc_hash::FxHashMap;

use crate::error::AbiResult;
use crate::runtime::{ForeignRuntime, Symbol, TypeHandle};

/// Cached field layout of one foreign type.
///
/// Build once per type via `from_runtime`; field lookups by name are O(1).
#[derive(Debug, Clone)]
pub struct TypeSchema {
    handle: TypeHandle,
    type_name: String,
    is_abstract: bool,
    supertype: Option<TypeHandle>,
    field_lookup: FxHashMap<String, usize>,
    field_names: Vec<String>,
    field_symbols: Vec<Symbol>,
}

impl TypeSchema {
    /// Read the layout of `ty` from the runtime
    pub fn from_runtime(rt: &dyn ForeignRuntime, ty: TypeHandle) -> AbiResult<Self> {
        let field_symbols = rt.type_fields(ty)?;
        let mut field_lookup = FxHashMap::default();
        let mut field_names = Vec::with_capacity(field_symbols.len());
        for (index, symbol) in field_symbols.iter().enumerate() {
            let name = rt.symbol_name(*symbol)?;
            field_lookup.insert(name.clone(), index);
            field_names.push(name);
        }

        Ok(Self {
            handle: ty,
            type_name: rt.type_name(ty)?,
            is_abstract: rt.is_abstract_type(ty)?,
            supertype: rt.supertype(ty)?,
            field_lookup,
            field_names,
            field_symbols,
        })
    }

    /// Type handle this schema describes
    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    /// Type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether the type is abstract
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Declared supertype
    pub fn supertype(&self) -> Option<TypeHandle> {
        self.supertype
    }

    /// Look up field position by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_lookup.get(name).copied()
    }

    /// Symbol of the field at `index`
    pub fn field_symbol(&self, index: usize) -> Option<Symbol> {
        self.field_symbols.get(index).copied()
    }

    /// Number of fields
    pub fn field_count(&self) -> usize {
        self.field_names.len()
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }
}
