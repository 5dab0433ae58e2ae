//! Type alias table - builtin foreign type tags <-> host primitive types

use super::types::PrimitiveKind;
use crate::foreign::{ForeignRef, Gil, TypeTag};
use crate::host::HostType;

/// Host type a builtin foreign type tag stands for
pub fn host_type_for_alias(tag: TypeTag) -> Option<HostType> {
    let kind = match tag {
        TypeTag::Str => PrimitiveKind::String,
        TypeTag::Int => PrimitiveKind::I32,
        TypeTag::Long => PrimitiveKind::I64,
        TypeTag::Float => PrimitiveKind::F64,
        TypeTag::Bool => PrimitiveKind::Bool,
        _ => return None,
    };
    Some(HostType::primitive(kind))
}

/// Builtin foreign type tag a host type is aliased to
pub fn foreign_type_for_host(ty: &HostType) -> Option<TypeTag> {
    match ty.primitive_kind()? {
        PrimitiveKind::String => Some(TypeTag::Str),
        PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64 => Some(TypeTag::Int),
        PrimitiveKind::F32 | PrimitiveKind::F64 => Some(TypeTag::Float),
        PrimitiveKind::Bool => Some(TypeTag::Bool),
        _ => None,
    }
}

/// Host type for a foreign type object ("any type" targets)
///
/// Sequences map to the object array type; anything else the alias table
/// does not name has no host counterpart.
pub fn host_type_for_type_object(tag: TypeTag) -> Option<HostType> {
    match tag {
        TypeTag::List | TypeTag::Tuple => Some(HostType::array(&HostType::object(), 1)),
        _ => host_type_for_alias(tag),
    }
}

/// Foreign type object aliased to a host type (new reference)
pub fn foreign_type_object(py: Gil<'_>, ty: &HostType) -> Option<ForeignRef> {
    foreign_type_for_host(ty).map(|tag| py.type_object(tag))
}
