//! Statically-typed layer over the dynamic engine
//!
//! Each Rust type names the host type it converts through, so typed
//! extraction shares the dispatch cache with the dynamic entry points.

use crate::foreign::ForeignRef;
use crate::host::{HostArray, HostType, HostValue};
use crate::interop::PrimitiveKind;

/// Rust types extractable from a foreign value
pub trait FromForeign: Sized {
    /// Conversion target on the host side
    fn host_type() -> HostType;

    /// Unbox the converted host value
    fn from_host(value: HostValue) -> Option<Self>;
}

/// Rust types convertible to a foreign value
pub trait IntoForeign {
    fn host_type() -> HostType;

    fn into_host(self) -> HostValue;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromForeign for $ty {
                #[inline]
                fn host_type() -> HostType {
                    HostType::primitive(PrimitiveKind::$variant)
                }

                #[inline]
                fn from_host(value: HostValue) -> Option<Self> {
                    match value {
                        HostValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl IntoForeign for $ty {
                #[inline]
                fn host_type() -> HostType {
                    HostType::primitive(PrimitiveKind::$variant)
                }

                #[inline]
                fn into_host(self) -> HostValue {
                    HostValue::$variant(self)
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

/// Host chars are single code units; surrogates do not extract
impl FromForeign for char {
    fn host_type() -> HostType {
        HostType::primitive(PrimitiveKind::Char)
    }

    fn from_host(value: HostValue) -> Option<Self> {
        match value {
            HostValue::Char(unit) => char::from_u32(u32::from(unit)),
            _ => None,
        }
    }
}

/// Characters outside the basic plane travel as strings
impl IntoForeign for char {
    fn host_type() -> HostType {
        HostType::primitive(PrimitiveKind::Char)
    }

    fn into_host(self) -> HostValue {
        match u16::try_from(u32::from(self)) {
            Ok(unit) => HostValue::Char(unit),
            Err(_) => HostValue::String(self.to_string()),
        }
    }
}

impl FromForeign for String {
    fn host_type() -> HostType {
        HostType::string()
    }

    fn from_host(value: HostValue) -> Option<Self> {
        match value {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl IntoForeign for String {
    fn host_type() -> HostType {
        HostType::string()
    }

    fn into_host(self) -> HostValue {
        HostValue::String(self)
    }
}

impl IntoForeign for &str {
    fn host_type() -> HostType {
        HostType::string()
    }

    fn into_host(self) -> HostValue {
        HostValue::String(self.to_owned())
    }
}

impl<T: FromForeign> FromForeign for Vec<T> {
    fn host_type() -> HostType {
        HostType::array(&T::host_type(), 1)
    }

    fn from_host(value: HostValue) -> Option<Self> {
        match value {
            HostValue::Array(array) if array.rank() == 1 => {
                array.items().iter().cloned().map(T::from_host).collect()
            }
            _ => None,
        }
    }
}

impl<T: IntoForeign> IntoForeign for Vec<T> {
    fn host_type() -> HostType {
        HostType::array(&T::host_type(), 1)
    }

    fn into_host(self) -> HostValue {
        let items = self.into_iter().map(IntoForeign::into_host).collect();
        HostValue::Array(HostArray::new(T::host_type(), items))
    }
}

/// Value types go through `Nullable<T>`; reference types are already nullable
fn optional_type(inner: HostType) -> HostType {
    if inner.is_value_type() {
        HostType::nullable(&inner)
    } else {
        inner
    }
}

impl<T: FromForeign> FromForeign for Option<T> {
    fn host_type() -> HostType {
        optional_type(T::host_type())
    }

    fn from_host(value: HostValue) -> Option<Self> {
        match value {
            HostValue::Null => Some(None),
            other => T::from_host(other).map(Some),
        }
    }
}

impl<T: IntoForeign> IntoForeign for Option<T> {
    fn host_type() -> HostType {
        optional_type(T::host_type())
    }

    fn into_host(self) -> HostValue {
        self.map_or(HostValue::Null, IntoForeign::into_host)
    }
}

impl FromForeign for ForeignRef {
    fn host_type() -> HostType {
        HostType::foreign_handle()
    }

    fn from_host(value: HostValue) -> Option<Self> {
        match value {
            HostValue::Foreign(handle) => Some(handle),
            _ => None,
        }
    }
}

impl IntoForeign for ForeignRef {
    fn host_type() -> HostType {
        HostType::foreign_handle()
    }

    fn into_host(self) -> HostValue {
        HostValue::Foreign(self)
    }
}
