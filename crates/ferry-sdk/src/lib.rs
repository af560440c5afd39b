//! Ferry SDK - the boundary between native types and a foreign runtime
//!
//! This crate provides the minimal types and traits an embedded dynamic
//! runtime has to offer so that the adapter engine can box and unbox native
//! values through it:
//!
//! - [`ForeignValue`]: NaN-boxed value word
//! - [`ForeignRuntime`]: symbols, type construction, instances, calls, GC
//! - [`GcPause`]: scoped collection pause
//! - [`ToForeign`] / [`FromForeign`]: builtin scalar conversions
//! - [`TypeSchema`]: field order of a realized type
//!
//! # Example
//!
//! ```ignore
//! use ferry_sdk::{ForeignRuntime, FromForeign, GcPause, ToForeign};
//!
//! fn double(rt: &dyn ForeignRuntime, v: ferry_sdk::ForeignValue) -> ferry_sdk::AbiResult<ferry_sdk::ForeignValue> {
//!     let _pause = GcPause::new(rt);
//!     let n = i32::from_foreign(v, rt)?;
//!     (n * 2).to_foreign(rt)
//! }
//! ```

#![warn(missing_docs)]

pub mod convert;
pub mod error;
pub mod gc;
pub mod runtime;
pub mod schema;
pub mod value;

pub use convert::{FromForeign, ToForeign};
pub use error::{AbiResult, ForeignError};
pub use gc::GcPause;
pub use runtime::{ForeignRuntime, Symbol, TemplateHandle, TypeHandle};
pub use schema::TypeSchema;
pub use value::ForeignValue;
