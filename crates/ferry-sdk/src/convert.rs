//! Scalar box/unbox primitives.
//!
//! `ToForeign` and `FromForeign` cover the builtin scalar types. Struct-like
//! native types go through the adapter engine instead.

use crate::error::{AbiResult, ForeignError};
use crate::runtime::ForeignRuntime;
use crate::value::ForeignValue;

/// Convert a Rust value into a foreign value.
pub trait ToForeign {
    /// Builtin foreign type name produced by this conversion
    const FOREIGN_TYPE: &'static str;

    /// Convert to a ForeignValue, allocating through `rt` if needed
    fn to_foreign(&self, rt: &dyn ForeignRuntime) -> AbiResult<ForeignValue>;
}

/// Convert a foreign value into a Rust value.
pub trait FromForeign: Sized {
    /// Builtin foreign type name accepted by this conversion
    const FOREIGN_TYPE: &'static str;

    /// Convert from a ForeignValue, returning an error if the type doesn't match
    fn from_foreign(value: ForeignValue, rt: &dyn ForeignRuntime) -> AbiResult<Self>;
}

fn mismatch(expected: &str, value: ForeignValue) -> ForeignError {
    ForeignError::TypeMismatch {
        expected: expected.to_string(),
        got: value.kind_name().to_string(),
    }
}

macro_rules! inline_scalar {
    ($ty:ty, $name:literal, $ctor:ident, $get:ident) => {
        impl ToForeign for $ty {
            const FOREIGN_TYPE: &'static str = $name;

            fn to_foreign(&self, _rt: &dyn ForeignRuntime) -> AbiResult<ForeignValue> {
                Ok(ForeignValue::$ctor(*self))
            }
        }

        impl FromForeign for $ty {
            const FOREIGN_TYPE: &'static str = $name;

            fn from_foreign(value: ForeignValue, _rt: &dyn ForeignRuntime) -> AbiResult<Self> {
                value.$get().ok_or_else(|| mismatch($name, value))
            }
        }
    };
}

inline_scalar!(bool, "Bool", bool, as_bool);
inline_scalar!(i32, "Int32", i32, as_i32);
inline_scalar!(u32, "UInt32", u32, as_u32);
inline_scalar!(f32, "Float32", f32, as_f32);
inline_scalar!(f64, "Float64", f64, as_f64);

impl ToForeign for String {
    const FOREIGN_TYPE: &'static str = "String";

    fn to_foreign(&self, rt: &dyn ForeignRuntime) -> AbiResult<ForeignValue> {
        rt.create_string(self)
    }
}

impl FromForeign for String {
    const FOREIGN_TYPE: &'static str = "String";

    fn from_foreign(value: ForeignValue, rt: &dyn ForeignRuntime) -> AbiResult<Self> {
        if !value.is_handle() {
            return Err(mismatch("String", value));
        }
        rt.read_string(value)
    }
}

// Unit maps to the foreign `nothing`
impl ToForeign for () {
    const FOREIGN_TYPE: &'static str = "Nothing";

    fn to_foreign(&self, _rt: &dyn ForeignRuntime) -> AbiResult<ForeignValue> {
        Ok(ForeignValue::null())
    }
}

impl FromForeign for () {
    const FOREIGN_TYPE: &'static str = "Nothing";

    fn from_foreign(value: ForeignValue, _rt: &dyn ForeignRuntime) -> AbiResult<Self> {
        if value.is_null() {
            Ok(())
        } else {
            Err(mismatch("Nothing", value))
        }
    }
}
