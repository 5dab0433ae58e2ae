//! Type definitions for conversion dispatch
//!
//! `PrimitiveKind` is the set of host scalar widths the scalar converter
//! handles; `TypeDescriptor` is the resolved shape of a conversion target and
//! `Strategy` the converter chosen for it.

use crate::host::HostType;

/// Host primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool,
    /// 16-bit code unit
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    String,
}

impl PrimitiveKind {
    /// Indexed by discriminant
    pub const ALL: [PrimitiveKind; 13] = [
        Self::Bool,
        Self::Char,
        Self::I8,
        Self::U8,
        Self::I16,
        Self::U16,
        Self::I32,
        Self::U32,
        Self::I64,
        Self::U64,
        Self::F32,
        Self::F64,
        Self::String,
    ];

    /// Get size of type in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::Char | Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 | Self::String => 8,
        }
    }

    /// Check if type is integral
    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Check if type is floating point
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Strings are the only reference-typed primitive
    #[inline]
    pub const fn is_value_type(self) -> bool {
        !matches!(self, Self::String)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
        }
    }

    /// Inclusive numeric range of integral kinds (and char)
    pub const fn range(self) -> Option<(i128, i128)> {
        match self {
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::U8 => Some((0, u8::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::U16 | Self::Char => Some((0, u16::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::U32 => Some((0, u32::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::U64 => Some((0, u64::MAX as i128)),
            Self::Bool | Self::F32 | Self::F64 | Self::String => None,
        }
    }
}

/// Resolved shape of a conversion target
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Array { element: HostType, rank: usize },
    Enum { underlying: PrimitiveKind, flags: bool },
    Nullable(HostType),
    AnyObject,
    AnyType,
    /// Host-side handle of a foreign object, passed through untouched
    ForeignHandle,
    /// Declared class or generic list; reachable only through identity unwrapping
    Instance(HostType),
}

/// Converter chosen for a target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Passthrough,
    Array,
    MultiArray,
    Enum,
    Nullable,
    AnyObject,
    AnyType,
    Scalar,
    Instance,
}

/// Cached dispatch row: immutable once published
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEntry {
    pub target: HostType,
    pub descriptor: TypeDescriptor,
    pub strategy: Strategy,
}
