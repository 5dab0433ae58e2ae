//! Host values - boxed scalars, arrays, enum members and object instances

use super::types::{HostType, TypeKind};
use crate::foreign::ForeignRef;
use crate::interop::PrimitiveKind;
use num_traits::ToPrimitive;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Any value in the host's own representation
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Bool(bool),
    /// UTF-16 code unit
    Char(u16),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Array(HostArray),
    List(HostList),
    Enum(EnumValue),
    Object(HostObject),
    Type(HostType),
    /// Host-side handle of a foreign object (owns one reference)
    Foreign(ForeignRef),
}

impl HostValue {
    /// Zero value of a primitive kind (`Null` for strings)
    pub fn zero(kind: PrimitiveKind) -> HostValue {
        match kind {
            PrimitiveKind::Bool => HostValue::Bool(false),
            PrimitiveKind::Char => HostValue::Char(0),
            PrimitiveKind::I8 => HostValue::I8(0),
            PrimitiveKind::U8 => HostValue::U8(0),
            PrimitiveKind::I16 => HostValue::I16(0),
            PrimitiveKind::U16 => HostValue::U16(0),
            PrimitiveKind::I32 => HostValue::I32(0),
            PrimitiveKind::U32 => HostValue::U32(0),
            PrimitiveKind::I64 => HostValue::I64(0),
            PrimitiveKind::U64 => HostValue::U64(0),
            PrimitiveKind::F32 => HostValue::F32(0.0),
            PrimitiveKind::F64 => HostValue::F64(0.0),
            PrimitiveKind::String => HostValue::Null,
        }
    }

    /// Narrow an integer into `kind`, `None` when it does not fit
    pub fn from_i128(kind: PrimitiveKind, value: i128) -> Option<HostValue> {
        Some(match kind {
            PrimitiveKind::I8 => HostValue::I8(value.to_i8()?),
            PrimitiveKind::U8 => HostValue::U8(value.to_u8()?),
            PrimitiveKind::I16 => HostValue::I16(value.to_i16()?),
            PrimitiveKind::U16 => HostValue::U16(value.to_u16()?),
            PrimitiveKind::I32 => HostValue::I32(value.to_i32()?),
            PrimitiveKind::U32 => HostValue::U32(value.to_u32()?),
            PrimitiveKind::I64 => HostValue::I64(value.to_i64()?),
            PrimitiveKind::U64 => HostValue::U64(value.to_u64()?),
            PrimitiveKind::Char => HostValue::Char(value.to_u16()?),
            PrimitiveKind::Bool
            | PrimitiveKind::F32
            | PrimitiveKind::F64
            | PrimitiveKind::String => return None,
        })
    }

    /// Integer payload of integral scalars and chars
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            HostValue::Char(v) => Some(i128::from(*v)),
            HostValue::I8(v) => Some(i128::from(*v)),
            HostValue::U8(v) => Some(i128::from(*v)),
            HostValue::I16(v) => Some(i128::from(*v)),
            HostValue::U16(v) => Some(i128::from(*v)),
            HostValue::I32(v) => Some(i128::from(*v)),
            HostValue::U32(v) => Some(i128::from(*v)),
            HostValue::I64(v) => Some(i128::from(*v)),
            HostValue::U64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// Primitive kind of a scalar or string value
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            HostValue::Bool(_) => PrimitiveKind::Bool,
            HostValue::Char(_) => PrimitiveKind::Char,
            HostValue::I8(_) => PrimitiveKind::I8,
            HostValue::U8(_) => PrimitiveKind::U8,
            HostValue::I16(_) => PrimitiveKind::I16,
            HostValue::U16(_) => PrimitiveKind::U16,
            HostValue::I32(_) => PrimitiveKind::I32,
            HostValue::U32(_) => PrimitiveKind::U32,
            HostValue::I64(_) => PrimitiveKind::I64,
            HostValue::U64(_) => PrimitiveKind::U64,
            HostValue::F32(_) => PrimitiveKind::F32,
            HostValue::F64(_) => PrimitiveKind::F64,
            HostValue::String(_) => PrimitiveKind::String,
            _ => return None,
        })
    }

    /// Runtime type of the value; `Null` has none
    pub fn runtime_type(&self) -> Option<HostType> {
        match self {
            HostValue::Null => None,
            HostValue::Array(array) => Some(array.array_type()),
            HostValue::List(list) => Some(HostType::list(list.element_type())),
            HostValue::Enum(value) => Some(value.ty.clone()),
            HostValue::Object(object) => Some(object.ty.clone()),
            HostValue::Type(_) => Some(HostType::type_type()),
            HostValue::Foreign(_) => Some(HostType::foreign_handle()),
            scalar => scalar.primitive_kind().map(HostType::primitive),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for HostValue {
                #[inline]
                fn from(value: $ty) -> Self {
                    HostValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
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
    String => String,
    HostArray => Array,
    HostList => List,
    EnumValue => Enum,
    HostObject => Object,
    HostType => Type,
    ForeignRef => Foreign,
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_owned())
    }
}

// ============================================================================
// Arrays
// ============================================================================

struct ArrayData {
    element_type: HostType,
    dims: SmallVec<[usize; 4]>,
    items: Vec<HostValue>,
}

/// Host array of one or more dimensions; items stored row-major
#[derive(Clone)]
pub struct HostArray {
    data: Arc<ArrayData>,
}

impl HostArray {
    /// One-dimensional array
    pub fn new(element_type: HostType, items: Vec<HostValue>) -> Self {
        let dims = smallvec::smallvec![items.len()];
        Self {
            data: Arc::new(ArrayData {
                element_type,
                dims,
                items,
            }),
        }
    }

    /// Array with explicit dimensions; `None` when the item count disagrees
    pub fn with_dims(element_type: HostType, dims: &[usize], items: Vec<HostValue>) -> Option<Self> {
        if dims.is_empty() || dims.iter().product::<usize>() != items.len() {
            return None;
        }
        Some(Self {
            data: Arc::new(ArrayData {
                element_type,
                dims: SmallVec::from_slice(dims),
                items,
            }),
        })
    }

    pub fn element_type(&self) -> &HostType {
        &self.data.element_type
    }

    pub fn array_type(&self) -> HostType {
        HostType::array(&self.data.element_type, self.rank())
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.data.dims.len()
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.data.dims
    }

    /// Total number of items
    #[inline]
    pub fn len(&self) -> usize {
        self.data.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.items.is_empty()
    }

    /// Row-major items
    #[inline]
    pub fn items(&self) -> &[HostValue] {
        &self.data.items
    }

    /// Item at a multidimensional index
    pub fn get(&self, index: &[usize]) -> Option<&HostValue> {
        if index.len() != self.rank() {
            return None;
        }

        let mut flat = 0;
        for (i, dim) in index.iter().zip(self.dims()) {
            if i >= dim {
                return None;
            }
            flat = flat * dim + i;
        }
        self.data.items.get(flat)
    }

    /// Same array instance
    pub fn ptr_eq(&self, other: &HostArray) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for HostArray {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.data.element_type == other.data.element_type
                && self.data.dims == other.data.dims
                && self.data.items == other.data.items)
    }
}

impl fmt::Debug for HostArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostArray")
            .field("type", &self.array_type())
            .field("dims", &self.dims())
            .field("items", &self.items())
            .finish()
    }
}

// ============================================================================
// Lists
// ============================================================================

struct ListData {
    element_type: HostType,
    items: Vec<HostValue>,
}

/// Generic host list
#[derive(Clone)]
pub struct HostList {
    data: Arc<ListData>,
}

impl HostList {
    pub fn new(element_type: HostType, items: Vec<HostValue>) -> Self {
        Self {
            data: Arc::new(ListData {
                element_type,
                items,
            }),
        }
    }

    pub fn element_type(&self) -> &HostType {
        &self.data.element_type
    }

    pub fn items(&self) -> &[HostValue] {
        &self.data.items
    }

    pub fn len(&self) -> usize {
        self.data.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.items.is_empty()
    }

    pub fn ptr_eq(&self, other: &HostList) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for HostList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.data.element_type == other.data.element_type
                && self.data.items == other.data.items)
    }
}

impl fmt::Debug for HostList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostList")
            .field("element_type", self.element_type())
            .field("items", &self.items())
            .finish()
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Enum member (or, for flags enums, any bit pattern)
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub ty: HostType,
    pub bits: i128,
}

impl EnumValue {
    pub fn new(ty: HostType, bits: i128) -> Self {
        Self { ty, bits }
    }

    /// The raw value boxed as the enum's underlying primitive
    pub fn underlying_value(&self) -> Option<HostValue> {
        let info = self.ty.enum_info()?;
        HostValue::from_i128(info.underlying, self.bits)
    }

    /// Declared member name, if the bits name one
    pub fn name(&self) -> Option<&str> {
        self.ty.enum_info()?.name_of(self.bits)
    }
}

// ============================================================================
// Objects
// ============================================================================

/// Host object instance with reference identity
#[derive(Clone)]
pub struct HostObject {
    pub ty: HostType,
    payload: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    /// Allocate an instance of a declared class
    pub fn new<T: Any + Send + Sync>(ty: HostType, payload: T) -> Self {
        debug_assert!(
            matches!(ty.kind(), TypeKind::Class(_)),
            "host objects are instances of declared classes"
        );
        Self {
            ty,
            payload: Arc::new(payload),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Same instance
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// Host objects compare by identity
impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({} @ {:p})", self.ty.name(), Arc::as_ptr(&self.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrowing() {
        assert_eq!(HostValue::from_i128(PrimitiveKind::I8, 127), Some(HostValue::I8(127)));
        assert_eq!(HostValue::from_i128(PrimitiveKind::I8, 128), None);
        assert_eq!(HostValue::from_i128(PrimitiveKind::U32, -1), None);
        assert_eq!(
            HostValue::from_i128(PrimitiveKind::U64, i128::from(u64::MAX)),
            Some(HostValue::U64(u64::MAX))
        );
        assert_eq!(HostValue::from_i128(PrimitiveKind::F64, 1), None);
    }

    #[test]
    fn test_runtime_types() {
        assert_eq!(HostValue::Null.runtime_type(), None);
        assert_eq!(
            HostValue::I32(1).runtime_type(),
            Some(HostType::primitive(PrimitiveKind::I32))
        );

        let array = HostArray::new(HostType::string(), vec!["a".into()]);
        assert_eq!(
            HostValue::Array(array).runtime_type(),
            Some(HostType::array(&HostType::string(), 1))
        );
    }

    #[test]
    fn test_multidimensional_indexing() {
        let int = HostType::primitive(PrimitiveKind::I32);
        let items = (0..6).map(HostValue::I32).collect();
        let array = HostArray::with_dims(int.clone(), &[2, 3], items).unwrap();

        assert_eq!(array.rank(), 2);
        assert_eq!(array.get(&[0, 0]), Some(&HostValue::I32(0)));
        assert_eq!(array.get(&[1, 2]), Some(&HostValue::I32(5)));
        assert_eq!(array.get(&[2, 0]), None);
        assert_eq!(array.get(&[0]), None);

        assert!(HostArray::with_dims(int, &[2, 2], vec![]).is_none());
    }

    #[test]
    fn test_object_identity() {
        let class = HostType::define_class("Widget", None, &[]);
        let a = HostObject::new(class.clone(), 42u32);
        let b = HostObject::new(class, 42u32);

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn test_enum_underlying() {
        let color = HostType::define_enum("Color", PrimitiveKind::U8, false, [("Red", 0), ("Blue", 2)]);
        let value = EnumValue::new(color, 2);
        assert_eq!(value.underlying_value(), Some(HostValue::U8(2)));
        assert_eq!(value.name(), Some("Blue"));
    }
}
