//! Object identity bridge - unwrap pre-wrapped host values instead of converting
//!
//! Wrapping itself belongs to the object-wrapping subsystem, consumed here
//! through `ObjectWrapper`. `DefaultWrapper` uses the foreign runtime's thin
//! host-instance and host-class wrapper objects.

use crate::errors::{ConversionError, ConversionResult};
use crate::foreign::{ForeignRef, Gil, ObjectData};
use crate::host::{HostType, HostValue, TypeKind};

/// What a foreign wrapper object stands for
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapped {
    Instance(HostValue),
    Class(HostType),
}

/// Identity-wrapping subsystem interface
pub trait ObjectWrapper: Send + Sync {
    /// Wrap a host instance as an opaque foreign object (new reference)
    fn wrap(&self, py: Gil<'_>, value: &HostValue) -> ForeignRef;

    /// Wrap a host type as a foreign class object (new reference)
    fn wrap_type(&self, py: Gil<'_>, ty: &HostType) -> ForeignRef;

    /// The host instance or type a borrowed foreign object wraps, if any
    fn unwrap(&self, value: &ForeignRef) -> Option<Wrapped>;
}

/// Wrapper backed by the foreign runtime's host wrapper objects
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultWrapper;

impl ObjectWrapper for DefaultWrapper {
    fn wrap(&self, py: Gil<'_>, value: &HostValue) -> ForeignRef {
        py.wrap_host_instance(value.clone())
    }

    fn wrap_type(&self, py: Gil<'_>, ty: &HostType) -> ForeignRef {
        py.wrap_host_class(ty.clone())
    }

    fn unwrap(&self, value: &ForeignRef) -> Option<Wrapped> {
        match value.data() {
            ObjectData::HostInstance(inner) => Some(Wrapped::Instance(inner.clone())),
            ObjectData::HostClass(ty) => Some(Wrapped::Class(ty.clone())),
            _ => None,
        }
    }
}

/// Identity short-circuit, run before every other foreign -> host path
///
/// `None` means `value` is not a wrapper and ordinary conversion proceeds.
pub fn try_unwrap(
    wrapper: &dyn ObjectWrapper,
    value: &ForeignRef,
    target: &HostType,
) -> Option<ConversionResult<HostValue>> {
    let wrapped = wrapper.unwrap(value)?;

    Some(match wrapped {
        Wrapped::Instance(instance) => match instance.runtime_type() {
            Some(ty) if target.is_assignable_from(&ty) => Ok(instance),
            Some(ty) => Err(ConversionError::type_mismatch(ty.name(), target.name())),
            // A wrapped null is still null
            None if !target.is_value_type() || is_nullable(target) => Ok(HostValue::Null),
            None => Err(ConversionError::type_mismatch("null", target.name())),
        },
        Wrapped::Class(ty) => match target.kind() {
            TypeKind::Object | TypeKind::Type => Ok(HostValue::Type(ty)),
            _ => Err(ConversionError::type_mismatch("type", target.name())
                .with_detail(format!("host class '{}'", ty.name()))),
        },
    })
}

fn is_nullable(ty: &HostType) -> bool {
    matches!(ty.kind(), TypeKind::Nullable(_))
}

/// Foreign handle targets keep the foreign object itself (new reference)
#[inline]
pub fn passthrough(value: &ForeignRef) -> HostValue {
    HostValue::Foreign(value.clone())
}
