//! `Heap` - in-process implementation of `ForeignRuntime`
//!
//! A small dynamically typed object model: interned symbols, builtin scalar
//! types, nominal struct types built from templates (abstract supertypes may
//! anchor concrete subtypes, concrete types cannot be subtyped), string and
//! struct slots, named host-defined functions, and a nesting GC pause counter.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use ferry_sdk::{
    AbiResult, ForeignError, ForeignRuntime, ForeignValue, Symbol, TemplateHandle, TypeHandle,
};

use crate::object::{Slot, Template, TypeDescriptor};

/// Builtin scalar types, registered in this order by `Heap::new`
pub const BUILTIN_TYPES: &[&str] = &[
    "Nothing", "Bool", "Int32", "UInt32", "Float32", "Float64", "String",
];

/// A function callable through `ForeignRuntime::call_function`
pub type HeapFn = Arc<dyn Fn(&Heap, &[ForeignValue]) -> AbiResult<ForeignValue> + Send + Sync>;

#[derive(Default)]
struct HeapInner {
    symbols: Vec<String>,
    symbol_lookup: FxHashMap<String, Symbol>,
    types: Vec<TypeDescriptor>,
    type_lookup: FxHashMap<String, TypeHandle>,
    templates: Vec<Option<Template>>,
    slots: Vec<Slot>,
    gc_pause_depth: usize,
    gc_pauses_total: usize,
}

/// In-process foreign runtime
pub struct Heap {
    inner: Mutex<HeapInner>,
    functions: RwLock<FxHashMap<String, HeapFn>>,
}

impl Heap {
    /// Create a heap with the builtin scalar types registered
    pub fn new() -> Self {
        let mut inner = HeapInner::default();
        for name in BUILTIN_TYPES {
            let handle = TypeHandle(inner.types.len() as u32);
            inner.types.push(TypeDescriptor::builtin(name));
            inner.type_lookup.insert((*name).to_string(), handle);
        }
        Self {
            inner: Mutex::new(inner),
            functions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register a host-defined function under `name`, replacing any previous one
    pub fn define_function(
        &self,
        name: &str,
        func: impl Fn(&Heap, &[ForeignValue]) -> AbiResult<ForeignValue> + Send + Sync + 'static,
    ) {
        self.functions.write().insert(name.to_string(), Arc::new(func));
    }

    /// Check if a function is registered
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    /// Descriptor of a type
    pub fn descriptor(&self, ty: TypeHandle) -> AbiResult<TypeDescriptor> {
        let inner = self.inner.lock();
        inner.descriptor(ty).cloned()
    }

    /// Walk the supertype chain of `ty` looking for `ancestor`
    pub fn is_subtype(&self, ty: TypeHandle, ancestor: TypeHandle) -> AbiResult<bool> {
        let inner = self.inner.lock();
        let mut current = Some(ty);
        while let Some(handle) = current {
            if handle == ancestor {
                return Ok(true);
            }
            current = inner.descriptor(handle)?.supertype;
        }
        Ok(false)
    }

    /// Number of live heap slots
    pub fn slot_count(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Number of type descriptors, builtins included
    pub fn type_count(&self) -> usize {
        self.inner.lock().types.len()
    }

    /// Current pause nesting depth
    pub fn gc_pause_depth(&self) -> usize {
        self.inner.lock().gc_pause_depth
    }

    /// Whether collection is currently suspended
    pub fn is_gc_paused(&self) -> bool {
        self.gc_pause_depth() > 0
    }

    /// Number of `pause_gc` calls since creation
    pub fn gc_pauses_total(&self) -> usize {
        self.inner.lock().gc_pauses_total
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Heap")
            .field("types", &inner.types.len())
            .field("slots", &inner.slots.len())
            .field("gc_pause_depth", &inner.gc_pause_depth)
            .finish()
    }
}

impl HeapInner {
    fn descriptor(&self, ty: TypeHandle) -> AbiResult<&TypeDescriptor> {
        self.types
            .get(ty.0 as usize)
            .ok_or_else(|| ForeignError::InvalidHandle(format!("type #{}", ty.0)))
    }

    fn symbol(&self, symbol: Symbol) -> AbiResult<&str> {
        self.symbols
            .get(symbol.0 as usize)
            .map(|s| s.as_str())
            .ok_or_else(|| ForeignError::InvalidHandle(format!("symbol #{}", symbol.0)))
    }

    fn builtin(&self, name: &str) -> TypeHandle {
        // Builtins are registered first, in BUILTIN_TYPES order
        let index = BUILTIN_TYPES.iter().position(|b| *b == name).unwrap_or(0);
        TypeHandle(index as u32)
    }

    fn slot(&self, value: ForeignValue) -> AbiResult<&Slot> {
        let index = value.as_handle().ok_or_else(|| ForeignError::TypeMismatch {
            expected: "handle".to_string(),
            got: value.kind_name().to_string(),
        })?;
        self.slots
            .get(index as usize)
            .ok_or_else(|| ForeignError::InvalidHandle(format!("slot #{}", index)))
    }

    fn alloc(&mut self, slot: Slot) -> AbiResult<ForeignValue> {
        let index = self.slots.len() as u64;
        let value = ForeignValue::handle(index)
            .ok_or_else(|| ForeignError::Runtime("heap slot space exhausted".to_string()))?;
        self.slots.push(slot);
        Ok(value)
    }

    fn struct_field(&self, value: ForeignValue, field: Symbol) -> AbiResult<(TypeHandle, Option<usize>)> {
        match self.slot(value)? {
            Slot::Struct { ty, .. } => Ok((*ty, self.descriptor(*ty)?.field_index(field))),
            Slot::Str(_) => Err(ForeignError::TypeMismatch {
                expected: "struct".to_string(),
                got: "String".to_string(),
            }),
        }
    }
}

impl ForeignRuntime for Heap {
    fn intern(&self, name: &str) -> Symbol {
        let mut inner = self.inner.lock();
        if let Some(symbol) = inner.symbol_lookup.get(name) {
            return *symbol;
        }
        let symbol = Symbol(inner.symbols.len() as u32);
        inner.symbols.push(name.to_string());
        inner.symbol_lookup.insert(name.to_string(), symbol);
        symbol
    }

    fn symbol_name(&self, symbol: Symbol) -> AbiResult<String> {
        self.inner.lock().symbol(symbol).map(|s| s.to_string())
    }

    fn type_of(&self, value: ForeignValue) -> AbiResult<TypeHandle> {
        let inner = self.inner.lock();
        if let Some(name) = value.scalar_type_name() {
            return Ok(inner.builtin(name));
        }
        match inner.slot(value)? {
            Slot::Str(_) => Ok(inner.builtin("String")),
            Slot::Struct { ty, .. } => Ok(*ty),
        }
    }

    fn type_name(&self, ty: TypeHandle) -> AbiResult<String> {
        self.inner.lock().descriptor(ty).map(|d| d.name.clone())
    }

    fn type_by_name(&self, name: &str) -> AbiResult<TypeHandle> {
        self.inner
            .lock()
            .type_lookup
            .get(name)
            .copied()
            .ok_or_else(|| ForeignError::UnknownType(name.to_string()))
    }

    fn type_fields(&self, ty: TypeHandle) -> AbiResult<Vec<Symbol>> {
        self.inner.lock().descriptor(ty).map(|d| d.fields.clone())
    }

    fn is_abstract_type(&self, ty: TypeHandle) -> AbiResult<bool> {
        self.inner.lock().descriptor(ty).map(|d| d.is_abstract)
    }

    fn supertype(&self, ty: TypeHandle) -> AbiResult<Option<TypeHandle>> {
        self.inner.lock().descriptor(ty).map(|d| d.supertype)
    }

    fn allocate_template(&self, name: Symbol) -> AbiResult<TemplateHandle> {
        let mut inner = self.inner.lock();
        inner.symbol(name)?;
        let handle = TemplateHandle(inner.templates.len() as u32);
        inner.templates.push(Some(Template {
            name,
            fields: Vec::new(),
            defaults: Vec::new(),
        }));
        Ok(handle)
    }

    fn set_template_field(
        &self,
        template: TemplateHandle,
        field: Symbol,
        value: ForeignValue,
    ) -> AbiResult<()> {
        let mut inner = self.inner.lock();
        inner.symbol(field)?;
        let template = inner
            .templates
            .get_mut(template.0 as usize)
            .and_then(|t| t.as_mut())
            .ok_or_else(|| ForeignError::InvalidHandle(format!("template #{}", template.0)))?;
        match template.fields.iter().position(|f| *f == field) {
            Some(index) => template.defaults[index] = value,
            None => {
                template.fields.push(field);
                template.defaults.push(value);
            }
        }
        Ok(())
    }

    fn promote_template(
        &self,
        template: TemplateHandle,
        module: &str,
        is_abstract: bool,
        ancestor: Option<TypeHandle>,
    ) -> AbiResult<TypeHandle> {
        let mut inner = self.inner.lock();
        let pending = inner
            .templates
            .get(template.0 as usize)
            .and_then(|t| t.as_ref())
            .cloned()
            .ok_or_else(|| ForeignError::InvalidHandle(format!("template #{}", template.0)))?;
        let name = inner.symbol(pending.name)?.to_string();

        if inner.type_lookup.contains_key(&name) {
            return Err(ForeignError::Runtime(format!(
                "invalid redefinition of type '{}'",
                name
            )));
        }
        if is_abstract && !pending.fields.is_empty() {
            return Err(ForeignError::Runtime(format!(
                "abstract type '{}' cannot have fields",
                name
            )));
        }
        if let Some(ancestor) = ancestor {
            let parent = inner.descriptor(ancestor)?;
            if !parent.is_abstract {
                return Err(ForeignError::InvalidSupertype {
                    name,
                    ancestor: parent.name.clone(),
                });
            }
        }

        let handle = TypeHandle(inner.types.len() as u32);
        inner.types.push(TypeDescriptor {
            name: name.clone(),
            module: module.to_string(),
            is_abstract,
            is_builtin: false,
            supertype: ancestor,
            fields: pending.fields,
            defaults: pending.defaults,
        });
        inner.type_lookup.insert(name.clone(), handle);
        inner.templates[template.0 as usize] = None;
        log::trace!("[Heap] promoted {}.{} as type #{}", module, name, handle.0);
        Ok(handle)
    }

    fn instantiate(&self, ty: TypeHandle) -> AbiResult<ForeignValue> {
        let mut inner = self.inner.lock();
        let descriptor = inner.descriptor(ty)?;
        if descriptor.is_abstract {
            return Err(ForeignError::AbstractType(descriptor.name.clone()));
        }
        if descriptor.is_builtin {
            return Err(ForeignError::Runtime(format!(
                "builtin type '{}' has no generic constructor",
                descriptor.name
            )));
        }
        let fields = descriptor.defaults.clone();
        inner.alloc(Slot::Struct { ty, fields })
    }

    fn get_field(&self, value: ForeignValue, field: Symbol) -> AbiResult<Option<ForeignValue>> {
        let inner = self.inner.lock();
        let (_, index) = inner.struct_field(value, field)?;
        let Some(index) = index else {
            return Ok(None);
        };
        match inner.slot(value)? {
            Slot::Struct { fields, .. } => Ok(fields.get(index).copied()),
            Slot::Str(_) => Ok(None),
        }
    }

    fn set_field(
        &self,
        value: ForeignValue,
        field: Symbol,
        field_value: ForeignValue,
    ) -> AbiResult<()> {
        let mut inner = self.inner.lock();
        let (ty, index) = inner.struct_field(value, field)?;
        let Some(index) = index else {
            return Err(ForeignError::UnknownField {
                type_name: inner.descriptor(ty)?.name.clone(),
                field: inner.symbol(field)?.to_string(),
            });
        };
        if let Some(handle) = value.as_handle() {
            if let Some(Slot::Struct { fields, .. }) = inner.slots.get_mut(handle as usize) {
                fields[index] = field_value;
            }
        }
        Ok(())
    }

    fn create_string(&self, s: &str) -> AbiResult<ForeignValue> {
        self.inner.lock().alloc(Slot::Str(s.to_string()))
    }

    fn read_string(&self, value: ForeignValue) -> AbiResult<String> {
        let inner = self.inner.lock();
        match inner.slot(value)? {
            Slot::Str(s) => Ok(s.clone()),
            Slot::Struct { ty, .. } => Err(ForeignError::TypeMismatch {
                expected: "String".to_string(),
                got: inner.descriptor(*ty)?.name.clone(),
            }),
        }
    }

    fn call_function(&self, name: &str, args: &[ForeignValue]) -> AbiResult<ForeignValue> {
        // Clone the handle out so the function can call back into the heap
        let func = self
            .functions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ForeignError::UnknownFunction(name.to_string()))?;
        func(self, args)
    }

    fn pause_gc(&self) {
        let mut inner = self.inner.lock();
        inner.gc_pause_depth += 1;
        inner.gc_pauses_total += 1;
    }

    fn resume_gc(&self) {
        let mut inner = self.inner.lock();
        inner.gc_pause_depth = inner.gc_pause_depth.saturating_sub(1);
    }
}
