//! Heap slot and type descriptor layouts

use ferry_sdk::{ForeignValue, Symbol, TypeHandle};

/// A realized type descriptor
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Type name
    pub name: String,
    /// Module the type was promoted into (`Core` for builtins)
    pub module: String,
    /// Abstract types cannot be instantiated and carry no fields
    pub is_abstract: bool,
    /// Builtin scalar types are never instantiated through `instantiate`
    pub is_builtin: bool,
    /// Declared supertype
    pub supertype: Option<TypeHandle>,
    /// Field names in declaration order
    pub fields: Vec<Symbol>,
    /// Default value for each field, parallel to `fields`
    pub defaults: Vec<ForeignValue>,
}

impl TypeDescriptor {
    pub(crate) fn builtin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            module: "Core".to_string(),
            is_abstract: false,
            is_builtin: true,
            supertype: None,
            fields: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Position of a field
    pub fn field_index(&self, field: Symbol) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }
}

/// A type under construction
#[derive(Debug, Clone)]
pub(crate) struct Template {
    pub name: Symbol,
    pub fields: Vec<Symbol>,
    pub defaults: Vec<ForeignValue>,
}

/// One heap-allocated object
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Str(String),
    Struct {
        ty: TypeHandle,
        fields: Vec<ForeignValue>,
    },
}
