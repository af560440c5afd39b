//! ForeignRuntime trait - the operations an embedded dynamic runtime provides
//!
//! The adapter engine programs against this trait only. An embedding supplies
//! the concrete implementation; `ferry-runtime` ships an in-process one.

use crate::error::AbiResult;
use crate::value::ForeignValue;

/// Interned identifier for foreign field and type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub u32);

/// Handle to a realized foreign type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle(pub u32);

/// Handle to a type template under construction.
///
/// A template is consumed by `promote_template`; using it afterwards is an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateHandle(pub u32);

/// Abstract foreign runtime.
///
/// Calls take `&self`; implementations use interior mutability. Nothing here
/// is guaranteed to be thread-safe beyond what the implementation documents.
pub trait ForeignRuntime {
    // ========================================================================
    // Symbols
    // ========================================================================

    /// Intern a name, returning a stable symbol
    fn intern(&self, name: &str) -> Symbol;

    /// Resolve a symbol back to its name
    fn symbol_name(&self, symbol: Symbol) -> AbiResult<String>;

    // ========================================================================
    // Type introspection
    // ========================================================================

    /// Runtime type of a value
    fn type_of(&self, value: ForeignValue) -> AbiResult<TypeHandle>;

    /// Name of a type descriptor
    fn type_name(&self, ty: TypeHandle) -> AbiResult<String>;

    /// Find a type descriptor by name
    fn type_by_name(&self, name: &str) -> AbiResult<TypeHandle>;

    /// Field names of a type descriptor, in declaration order
    fn type_fields(&self, ty: TypeHandle) -> AbiResult<Vec<Symbol>>;

    /// Whether the type descriptor is abstract (cannot be instantiated)
    fn is_abstract_type(&self, ty: TypeHandle) -> AbiResult<bool>;

    /// Direct supertype of a type descriptor, if one was declared
    fn supertype(&self, ty: TypeHandle) -> AbiResult<Option<TypeHandle>>;

    // ========================================================================
    // Type construction
    // ========================================================================

    /// Start a new type template with the given name
    fn allocate_template(&self, name: Symbol) -> AbiResult<TemplateHandle>;

    /// Append a field to a template; `value` is the field's default
    fn set_template_field(
        &self,
        template: TemplateHandle,
        field: Symbol,
        value: ForeignValue,
    ) -> AbiResult<()>;

    /// Turn a template into a concrete type descriptor inside `module`,
    /// optionally declared as a subtype of `ancestor`
    fn promote_template(
        &self,
        template: TemplateHandle,
        module: &str,
        is_abstract: bool,
        ancestor: Option<TypeHandle>,
    ) -> AbiResult<TypeHandle>;

    // ========================================================================
    // Instances
    // ========================================================================

    /// Allocate a new instance of a concrete type, fields set to defaults
    fn instantiate(&self, ty: TypeHandle) -> AbiResult<ForeignValue>;

    /// Read a field; `Ok(None)` when the value has no such field
    fn get_field(&self, value: ForeignValue, field: Symbol) -> AbiResult<Option<ForeignValue>>;

    /// Write a field
    fn set_field(&self, value: ForeignValue, field: Symbol, field_value: ForeignValue)
        -> AbiResult<()>;

    /// Allocate a string
    fn create_string(&self, s: &str) -> AbiResult<ForeignValue>;

    /// Read string data
    fn read_string(&self, value: ForeignValue) -> AbiResult<String>;

    // ========================================================================
    // Execution
    // ========================================================================

    /// Call a foreign function by name
    fn call_function(&self, name: &str, args: &[ForeignValue]) -> AbiResult<ForeignValue>;

    // ========================================================================
    // Garbage collection
    // ========================================================================

    /// Suspend collection. Calls nest.
    fn pause_gc(&self);

    /// Undo one `pause_gc`
    fn resume_gc(&self);
}
