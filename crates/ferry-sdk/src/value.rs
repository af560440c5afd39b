//! ForeignValue - NaN-boxed u64 value representation
//!
//! Scalars travel inline; everything the foreign runtime allocates (strings,
//! struct instances) travels as an opaque 48-bit handle whose meaning is owned
//! by the runtime implementation.
//!
//! # Encoding
//!
//! ```text
//! f64:    any value whose upper 13 bits != 0x1FFF (raw IEEE 754, NaN canonicalized)
//! Tagged: 0xFFF8 | 3-bit tag << 48 | 48-bit payload
//!   - handle: 0xFFF8_0000_0000_0000 | slot                    [tag=000]
//!   - i32:    0xFFF9_0000_0000_0000 | (i32 as u32 as u64)     [tag=001]
//!   - bool:   0xFFFA_0000_0000_0000 | (b as u64)              [tag=010]
//!   - u32:    0xFFFB_0000_0000_0000 | (u32 as u64)            [tag=011]
//!   - f32:    0xFFFC_0000_0000_0000 | (f32.to_bits() as u64)  [tag=100]
//!   - null:   0xFFFE_0000_0000_0000                           [tag=110]
//! ```

/// NaN-boxed 64-bit foreign value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ForeignValue(u64);

const NAN_BOX_BASE: u64 = 0xFFF8_0000_0000_0000;
const TAG_SHIFT: u64 = 48;
const TAG_MASK: u64 = 0x7 << TAG_SHIFT;
const PAYLOAD_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;
const PAYLOAD_MASK_32: u64 = 0x0000_0000_FFFF_FFFF;

const TAG_HANDLE: u64 = 0x0 << TAG_SHIFT;
const TAG_I32: u64 = 0x1 << TAG_SHIFT;
const TAG_BOOL: u64 = 0x2 << TAG_SHIFT;
const TAG_U32: u64 = 0x3 << TAG_SHIFT;
const TAG_F32: u64 = 0x4 << TAG_SHIFT;
const TAG_NULL: u64 = 0x6 << TAG_SHIFT;

const NULL_BITS: u64 = NAN_BOX_BASE | TAG_NULL;
const TRUE_BITS: u64 = NAN_BOX_BASE | TAG_BOOL | 1;
const FALSE_BITS: u64 = NAN_BOX_BASE | TAG_BOOL;
const CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;

/// Largest slot id a handle can carry.
pub const MAX_HANDLE: u64 = PAYLOAD_MASK;

impl ForeignValue {
    /// Create from raw u64 bits
    #[inline(always)]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Get raw u64 bits
    #[inline(always)]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Self(NULL_BITS)
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Self(if b { TRUE_BITS } else { FALSE_BITS })
    }

    /// Create an i32 value
    #[inline]
    pub const fn i32(i: i32) -> Self {
        Self(NAN_BOX_BASE | TAG_I32 | (i as u32 as u64))
    }

    /// Create a u32 value
    #[inline]
    pub const fn u32(u: u32) -> Self {
        Self(NAN_BOX_BASE | TAG_U32 | (u as u64))
    }

    /// Create an f32 value
    #[inline]
    pub fn f32(f: f32) -> Self {
        Self(NAN_BOX_BASE | TAG_F32 | (f.to_bits() as u64))
    }

    /// Create an f64 value (stored as raw IEEE 754 double, not NaN-boxed).
    ///
    /// NaN inputs are canonicalized so they never alias a tagged value.
    #[inline]
    pub fn f64(f: f64) -> Self {
        if f.is_nan() {
            Self(CANONICAL_NAN)
        } else {
            Self(f.to_bits())
        }
    }

    /// Create a handle to a runtime-owned slot.
    ///
    /// Returns `None` when `slot` does not fit the 48-bit payload.
    #[inline]
    pub const fn handle(slot: u64) -> Option<Self> {
        if slot > MAX_HANDLE {
            None
        } else {
            Some(Self(NAN_BOX_BASE | TAG_HANDLE | slot))
        }
    }

    // ========================================================================
    // Type checks
    // ========================================================================

    #[inline]
    const fn is_nan_boxed(&self) -> bool {
        (self.0 & NAN_BOX_BASE) == NAN_BOX_BASE
    }

    #[inline]
    const fn get_tag(&self) -> u64 {
        (self.0 & TAG_MASK) >> TAG_SHIFT
    }

    /// Check if value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == NULL_BITS
    }

    /// Check if value is a boolean
    #[inline]
    pub const fn is_bool(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == 2
    }

    /// Check if value is an i32
    #[inline]
    pub const fn is_i32(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == 1
    }

    /// Check if value is a u32
    #[inline]
    pub const fn is_u32(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == 3
    }

    /// Check if value is an f32
    #[inline]
    pub const fn is_f32(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == 4
    }

    /// Check if value is an f64
    #[inline]
    pub const fn is_f64(&self) -> bool {
        !self.is_nan_boxed()
    }

    /// Check if value is a runtime handle (string, struct instance, ...)
    #[inline]
    pub const fn is_handle(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == 0
    }

    // ========================================================================
    // Extractors
    // ========================================================================

    /// Extract boolean value
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        if self.is_bool() {
            Some((self.0 & PAYLOAD_MASK) != 0)
        } else {
            None
        }
    }

    /// Extract i32 value
    #[inline]
    pub const fn as_i32(&self) -> Option<i32> {
        if self.is_i32() {
            Some((self.0 & PAYLOAD_MASK_32) as u32 as i32)
        } else {
            None
        }
    }

    /// Extract u32 value
    #[inline]
    pub const fn as_u32(&self) -> Option<u32> {
        if self.is_u32() {
            Some((self.0 & PAYLOAD_MASK_32) as u32)
        } else {
            None
        }
    }

    /// Extract f32 value
    #[inline]
    pub fn as_f32(&self) -> Option<f32> {
        if self.is_f32() {
            Some(f32::from_bits((self.0 & PAYLOAD_MASK_32) as u32))
        } else {
            None
        }
    }

    /// Extract f64 value
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        if self.is_f64() {
            Some(f64::from_bits(self.0))
        } else {
            None
        }
    }

    /// Extract the runtime slot id of a handle
    #[inline]
    pub const fn as_handle(&self) -> Option<u64> {
        if self.is_handle() {
            Some(self.0 & PAYLOAD_MASK)
        } else {
            None
        }
    }

    /// Builtin foreign type name of a scalar, `None` for handles.
    ///
    /// Handles are typed by the runtime that owns them.
    pub const fn scalar_type_name(&self) -> Option<&'static str> {
        if !self.is_nan_boxed() {
            return Some("Float64");
        }
        match self.get_tag() {
            1 => Some("Int32"),
            2 => Some("Bool"),
            3 => Some("UInt32"),
            4 => Some("Float32"),
            6 => Some("Nothing"),
            _ => None,
        }
    }

    /// Short kind name for diagnostics
    pub const fn kind_name(&self) -> &'static str {
        match self.scalar_type_name() {
            Some(name) => name,
            None => "handle",
        }
    }
}

impl Default for ForeignValue {
    fn default() -> Self {
        Self::null()
    }
}

impl std::fmt::Debug for ForeignValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_nan_boxed() {
            return write!(f, "ForeignValue::F64({})", f64::from_bits(self.0));
        }
        match self.get_tag() {
            0 => write!(f, "ForeignValue::Handle({})", self.0 & PAYLOAD_MASK),
            1 => write!(f, "ForeignValue::I32({})", (self.0 & PAYLOAD_MASK_32) as u32 as i32),
            2 => write!(f, "ForeignValue::Bool({})", (self.0 & PAYLOAD_MASK) != 0),
            3 => write!(f, "ForeignValue::U32({})", (self.0 & PAYLOAD_MASK_32) as u32),
            4 => write!(f, "ForeignValue::F32({})", f32::from_bits((self.0 & PAYLOAD_MASK_32) as u32)),
            6 => write!(f, "ForeignValue::Null"),
            _ => write!(f, "ForeignValue::Unknown({:#x})", self.0),
        }
    }
}
