//! Host type descriptors - the reflection side of the host runtime
//!
//! Design: every `HostType` carries a process-unique `TypeKey`. Primitive
//! and root types are singletons, array/list/nullable types are interned by
//! structure, enums and classes get a fresh identity per declaration.

use super::value::{EnumValue, HostValue};
use crate::interop::PrimitiveKind;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

static PRIMITIVES: Lazy<Vec<HostType>> = Lazy::new(|| {
    PrimitiveKind::ALL
        .iter()
        .map(|kind| HostType::new(kind.name().to_owned(), TypeKind::Primitive(*kind)))
        .collect()
});
static OBJECT: Lazy<HostType> = Lazy::new(|| HostType::new("object".to_owned(), TypeKind::Object));
static TYPE: Lazy<HostType> = Lazy::new(|| HostType::new("Type".to_owned(), TypeKind::Type));
static FOREIGN_HANDLE: Lazy<HostType> =
    Lazy::new(|| HostType::new("ForeignObject".to_owned(), TypeKind::ForeignHandle));

static ARRAYS: Lazy<DashMap<(TypeKey, usize), HostType>> = Lazy::new(DashMap::new);
static LISTS: Lazy<DashMap<TypeKey, HostType>> = Lazy::new(DashMap::new);
static NULLABLES: Lazy<DashMap<TypeKey, HostType>> = Lazy::new(DashMap::new);

/// Process-unique type identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u64);

impl TypeKey {
    fn next() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shape of a host type
#[derive(Debug)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    /// Root of the type hierarchy ("any object")
    Object,
    /// Meta type whose instances are host types ("any type")
    Type,
    /// Host-side wrapper of a foreign object
    ForeignHandle,
    Array { element: HostType, rank: usize },
    List { element: HostType },
    Enum(EnumInfo),
    Nullable(HostType),
    Class(ClassInfo),
}

/// Enumeration metadata
#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub underlying: PrimitiveKind,
    pub flags: bool,
    members: Vec<(String, i128)>,
}

impl EnumInfo {
    pub fn is_defined(&self, bits: i128) -> bool {
        self.members.iter().any(|(_, value)| *value == bits)
    }

    pub fn name_of(&self, bits: i128) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, value)| *value == bits)
            .map(|(name, _)| name.as_str())
    }
}

/// Class metadata
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub base: Option<HostType>,
    pub interfaces: Vec<HostType>,
    pub value_type: bool,
}

struct TypeInfo {
    key: TypeKey,
    name: String,
    kind: TypeKind,
}

/// Runtime type descriptor of the host
#[derive(Clone)]
pub struct HostType {
    info: Arc<TypeInfo>,
}

impl HostType {
    fn new(name: String, kind: TypeKind) -> Self {
        Self {
            info: Arc::new(TypeInfo {
                key: TypeKey::next(),
                name,
                kind,
            }),
        }
    }

    // ========================================================================
    // Well-known types
    // ========================================================================

    pub fn primitive(kind: PrimitiveKind) -> HostType {
        PRIMITIVES[kind as usize].clone()
    }

    pub fn string() -> HostType {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn object() -> HostType {
        OBJECT.clone()
    }

    pub fn type_type() -> HostType {
        TYPE.clone()
    }

    pub fn foreign_handle() -> HostType {
        FOREIGN_HANDLE.clone()
    }

    /// Array type of `element` with `rank` dimensions (interned)
    pub fn array(element: &HostType, rank: usize) -> HostType {
        let rank = rank.max(1);
        ARRAYS
            .entry((element.key(), rank))
            .or_insert_with(|| {
                let name = format!("{}[{}]", element.name(), ",".repeat(rank - 1));
                HostType::new(
                    name,
                    TypeKind::Array {
                        element: element.clone(),
                        rank,
                    },
                )
            })
            .value()
            .clone()
    }

    /// Generic list type of `element` (interned)
    pub fn list(element: &HostType) -> HostType {
        LISTS
            .entry(element.key())
            .or_insert_with(|| {
                HostType::new(
                    format!("List<{}>", element.name()),
                    TypeKind::List {
                        element: element.clone(),
                    },
                )
            })
            .value()
            .clone()
    }

    /// Nullable wrapper of `inner` (interned; nullable of nullable collapses)
    pub fn nullable(inner: &HostType) -> HostType {
        if matches!(inner.kind(), TypeKind::Nullable(_)) {
            return inner.clone();
        }
        NULLABLES
            .entry(inner.key())
            .or_insert_with(|| {
                HostType::new(format!("{}?", inner.name()), TypeKind::Nullable(inner.clone()))
            })
            .value()
            .clone()
    }

    /// Declare a new enumeration type
    pub fn define_enum<N: Into<String>>(
        name: impl Into<String>,
        underlying: PrimitiveKind,
        flags: bool,
        members: impl IntoIterator<Item = (N, i128)>,
    ) -> HostType {
        debug_assert!(underlying.is_integral(), "enum underlying type must be integral");

        let members = members
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();

        HostType::new(
            name.into(),
            TypeKind::Enum(EnumInfo {
                underlying,
                flags,
                members,
            }),
        )
    }

    /// Declare a new reference class
    pub fn define_class(
        name: impl Into<String>,
        base: Option<&HostType>,
        interfaces: &[HostType],
    ) -> HostType {
        HostType::new(
            name.into(),
            TypeKind::Class(ClassInfo {
                base: base.cloned(),
                interfaces: interfaces.to_vec(),
                value_type: false,
            }),
        )
    }

    /// Declare a new value-type class (a struct)
    pub fn define_struct(name: impl Into<String>, interfaces: &[HostType]) -> HostType {
        HostType::new(
            name.into(),
            TypeKind::Class(ClassInfo {
                base: None,
                interfaces: interfaces.to_vec(),
                value_type: true,
            }),
        )
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    pub fn key(&self) -> TypeKey {
        self.info.key
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.info.kind
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind() {
            TypeKind::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn enum_info(&self) -> Option<&EnumInfo> {
        match self.kind() {
            TypeKind::Enum(info) => Some(info),
            _ => None,
        }
    }

    /// Element type of arrays and lists
    pub fn element_type(&self) -> Option<&HostType> {
        match self.kind() {
            TypeKind::Array { element, .. } | TypeKind::List { element } => Some(element),
            _ => None,
        }
    }

    /// Whether values of this type can never be null
    pub fn is_value_type(&self) -> bool {
        match self.kind() {
            TypeKind::Primitive(kind) => kind.is_value_type(),
            TypeKind::Enum(_) | TypeKind::Nullable(_) => true,
            TypeKind::Class(info) => info.value_type,
            TypeKind::Object
            | TypeKind::Type
            | TypeKind::ForeignHandle
            | TypeKind::Array { .. }
            | TypeKind::List { .. } => false,
        }
    }

    /// Whether a value whose runtime type is `other` may be stored in a
    /// location of this type
    pub fn is_assignable_from(&self, other: &HostType) -> bool {
        if self == other {
            return true;
        }

        match self.kind() {
            TypeKind::Object => true,
            TypeKind::Nullable(inner) => inner.is_assignable_from(other),
            TypeKind::Class(_) => other.inherits(self),
            TypeKind::Array { element, rank } => match other.kind() {
                TypeKind::Array {
                    element: other_element,
                    rank: other_rank,
                } => {
                    rank == other_rank
                        && !other_element.is_value_type()
                        && element.is_assignable_from(other_element)
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn inherits(&self, ancestor: &HostType) -> bool {
        match self.kind() {
            TypeKind::Class(info) => info
                .base
                .iter()
                .chain(info.interfaces.iter())
                .any(|parent| parent == ancestor || parent.inherits(ancestor)),
            _ => false,
        }
    }

    /// Value a freshly allocated array slot of this type holds
    pub fn default_value(&self) -> HostValue {
        match self.kind() {
            TypeKind::Primitive(kind) => HostValue::zero(*kind),
            TypeKind::Enum(_) => HostValue::Enum(EnumValue::new(self.clone(), 0)),
            _ => HostValue::Null,
        }
    }
}

impl PartialEq for HostType {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for HostType {}

impl Hash for HostType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostType({})", self.name())
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
