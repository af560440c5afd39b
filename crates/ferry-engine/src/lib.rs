//! Ferry Engine - bidirectional type adapters between native Rust types and a
//! foreign dynamic runtime
//!
//! A native type is described once as an ordered map of named properties.
//! From that description the engine realizes a foreign struct type, boxes
//! native values into foreign instances and unboxes foreign instances back,
//! including properties whose runtime type is one of several derived types.
//!
//! # Lifecycle
//!
//! 1. `declare::<T>()`: edit the property map ([`AdapterBuilder`])
//! 2. `implement::<T>()`: realize the foreign descriptor ([`TypeAdapter`])
//! 3. `box_value` / `unbox_value`
//!
//! Boxing or unboxing a type that was not implemented fails with
//! [`AdapterError::UninitializedAdapter`].
//!
//! # Example
//!
//! ```ignore
//! use ferry_engine::{adaptable, AdapterRegistry};
//! use ferry_runtime::Heap;
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//! adaptable!(Point => "Point");
//!
//! let heap = Heap::new();
//! let mut registry = AdapterRegistry::new();
//! registry
//!     .declare::<Point>()?
//!     .property("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v)?
//!     .property("y", |p: &Point| p.y, |p: &mut Point, v| p.y = v)?;
//! registry.implement::<Point>(&heap, None)?;
//!
//! let boxed = registry.box_value(&heap, &Point { x: 3, y: 4 })?;
//! let point: Point = registry.unbox_value(&heap, boxed)?;
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod builder;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod marshal;
pub mod property;
pub mod registry;
pub mod type_registry;

pub use adapter::TypeAdapter;
pub use builder::AdapterBuilder;
pub use config::{AdapterOptions, ConfigError, DispatchPolicy};
pub use context::AdapterContext;
pub use dispatch::{DispatchResolver, Subtype, Variants};
pub use error::{AdapterError, AdapterResult};
pub use marshal::{Adaptable, Marshal};
pub use property::PropertyDescriptor;
pub use registry::{AdapterRegistry, Bridge};
pub use type_registry::{TypeRegistry, TypeTag};

pub use ferry_sdk::{ForeignRuntime, ForeignValue, Symbol, TypeHandle};
