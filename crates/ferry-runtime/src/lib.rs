//! Ferry Runtime
//!
//! An in-process dynamic object model implementing
//! [`ferry_sdk::ForeignRuntime`]. Embedders that do not bring their own
//! runtime, and every engine test, use [`Heap`].

#![warn(missing_docs)]

pub mod heap;
pub mod object;

pub use heap::{Heap, HeapFn, BUILTIN_TYPES};
pub use object::TypeDescriptor;
