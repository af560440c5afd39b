//! Per-value conversion traits and the `adaptable!` declaration macro.

use ferry_sdk::{ForeignValue, FromForeign, ToForeign};

use crate::error::AdapterResult;
use crate::registry::Bridge;

/// A native type with a foreign struct counterpart.
///
/// Implement through [`adaptable!`](crate::adaptable), which also provides
/// the matching [`Marshal`] impl.
pub trait Adaptable: Sized + 'static {
    /// Foreign-side type name
    const FOREIGN_NAME: &'static str;

    /// Default native instance, `None` for abstract types
    fn default_instance() -> Option<Self>;
}

/// Anything that can sit in an adapted property.
pub trait Marshal: Sized + 'static {
    /// Foreign type this value converts to when no polymorphism is in play
    const FOREIGN_TYPE: &'static str;

    /// Native → foreign
    fn to_foreign(&self, bridge: &Bridge<'_>) -> AdapterResult<ForeignValue>;

    /// Foreign → native
    fn from_foreign(value: ForeignValue, bridge: &Bridge<'_>) -> AdapterResult<Self>;
}

macro_rules! marshal_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Marshal for $ty {
                const FOREIGN_TYPE: &'static str = <$ty as ToForeign>::FOREIGN_TYPE;

                fn to_foreign(&self, bridge: &Bridge<'_>) -> AdapterResult<ForeignValue> {
                    Ok(ToForeign::to_foreign(self, bridge.runtime())?)
                }

                fn from_foreign(value: ForeignValue, bridge: &Bridge<'_>) -> AdapterResult<Self> {
                    Ok(<$ty as FromForeign>::from_foreign(value, bridge.runtime())?)
                }
            }
        )*
    };
}

marshal_scalar!((), bool, i32, u32, f32, f64, String);

/// Declare a native type adaptable under a foreign name.
///
/// Concrete types need `Default`; the default instance seeds the foreign
/// type's field defaults and is the starting point of every unbox. Abstract
/// types have no native default and can only anchor a hierarchy or act as a
/// polymorphic property's declared type.
///
/// ```ignore
/// #[derive(Default)]
/// struct Point { x: i32, y: i32 }
/// adaptable!(Point => "Point");
///
/// trait Shape: std::any::Any { fn as_any(&self) -> &dyn std::any::Any; }
/// adaptable!(abstract Box<dyn Shape> => "Shape");
/// ```
#[macro_export]
macro_rules! adaptable {
    (@marshal $ty:ty) => {
        impl $crate::Marshal for $ty {
            const FOREIGN_TYPE: &'static str = <$ty as $crate::Adaptable>::FOREIGN_NAME;

            fn to_foreign(
                &self,
                bridge: &$crate::Bridge<'_>,
            ) -> $crate::AdapterResult<$crate::ForeignValue> {
                bridge.box_value::<$ty>(self)
            }

            fn from_foreign(
                value: $crate::ForeignValue,
                bridge: &$crate::Bridge<'_>,
            ) -> $crate::AdapterResult<Self> {
                bridge.unbox_value::<$ty>(value)
            }
        }
    };
    (abstract $ty:ty => $name:literal) => {
        impl $crate::Adaptable for $ty {
            const FOREIGN_NAME: &'static str = $name;

            fn default_instance() -> Option<Self> {
                None
            }
        }
        $crate::adaptable!(@marshal $ty);
    };
    ($ty:ty => $name:literal) => {
        impl $crate::Adaptable for $ty {
            const FOREIGN_NAME: &'static str = $name;

            fn default_instance() -> Option<Self> {
                Some(<$ty as ::std::default::Default>::default())
            }
        }
        $crate::adaptable!(@marshal $ty);
    };
}
