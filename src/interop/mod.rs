//! Interoperability - value conversion between the host and foreign runtimes
//!
//! Design: type-directed dispatch, resolved once per host type and cached
//!
//! Architecture:
//! - `types.rs` - Primitive kinds, target descriptors, strategies
//! - `alias.rs` - Builtin foreign type tags <-> host primitives
//! - `marshal.rs` - Scalar conversions
//! - `composite.rs` - Arrays, multidimensional arrays, enums, nullables
//! - `identity.rs` - Unwrapping of pre-wrapped host instances and classes
//! - `dispatch.rs` - Per-type strategy cache
//! - `typed.rs` - Statically-typed extraction (`FromForeign`/`IntoForeign`)

mod alias;
mod composite;
mod dispatch;
mod identity;
mod marshal;
mod typed;
mod types;

pub use alias::{foreign_type_for_host, foreign_type_object, host_type_for_alias, host_type_for_type_object};
pub use dispatch::DispatchCache;
pub use identity::{try_unwrap, DefaultWrapper, ObjectWrapper, Wrapped};
pub use marshal::{to_foreign, to_host};
pub use typed::{FromForeign, IntoForeign};
pub use types::{DispatchEntry, PrimitiveKind, Strategy, TypeDescriptor};

use crate::config::BridgeConfig;
use crate::errors::{ConversionError, ConversionResult};
use crate::foreign::{ForeignRef, Gil, TypeTag};
use crate::host::{HostArray, HostType, HostValue};
use crate::logging::{log_conversion_failure, log_type_conversion};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Conversion façade used by every collaborator
pub struct ConversionEngine {
    cache: DispatchCache,
    wrapper: Arc<dyn ObjectWrapper>,
    config: BridgeConfig,
    counters: Counters,
}

#[derive(Default)]
struct Counters {
    to_host: AtomicUsize,
    to_foreign: AtomicUsize,
    failures: AtomicUsize,
}

/// Conversion statistics for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionStats {
    pub to_host: usize,
    pub to_foreign: usize,
    pub failures: usize,
    pub cached_types: usize,
}

impl ConversionEngine {
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_wrapper(config, Arc::new(DefaultWrapper))
    }

    /// Engine using a custom identity-wrapping subsystem
    pub fn with_wrapper(config: BridgeConfig, wrapper: Arc<dyn ObjectWrapper>) -> Self {
        Self {
            cache: DispatchCache::new(),
            wrapper,
            config,
            counters: Counters::default(),
        }
    }

    /// Dispatch entry for `target` (thread-safe, no foreign lock needed)
    #[inline]
    pub fn resolve(&self, target: &HostType) -> Arc<DispatchEntry> {
        self.cache.resolve(target)
    }

    pub fn cache(&self) -> &DispatchCache {
        &self.cache
    }

    pub fn wrapper(&self) -> &dyn ObjectWrapper {
        &*self.wrapper
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn stats(&self) -> ConversionStats {
        ConversionStats {
            to_host: self.counters.to_host.load(Ordering::Relaxed),
            to_foreign: self.counters.to_foreign.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            cached_types: self.cache.len(),
        }
    }

    // ========================================================================
    // Foreign -> host
    // ========================================================================

    /// Convert a borrowed foreign value to a host value of `target`
    ///
    /// With `report_error` set a failure is raised in the foreign error
    /// indicator exactly once; without it the indicator is never touched.
    pub fn foreign_to_host(
        &self,
        py: Gil<'_>,
        value: &ForeignRef,
        target: &HostType,
        report_error: bool,
    ) -> ConversionResult<HostValue> {
        self.counters.to_host.fetch_add(1, Ordering::Relaxed);

        let result = self.convert(py, value, target);
        match &result {
            Ok(_) => log_type_conversion(value.type_tag().name(), target.name()),
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                if report_error {
                    log_conversion_failure(&e.source_type, &e.target_type, &e.to_string());
                    py.set_error(e.to_foreign_error());
                }
            }
        }
        result
    }

    /// Full dispatch without error reporting; composite converters recurse here
    pub(crate) fn convert(
        &self,
        py: Gil<'_>,
        value: &ForeignRef,
        target: &HostType,
    ) -> ConversionResult<HostValue> {
        let entry = self.resolve(target);

        if entry.strategy == Strategy::Passthrough {
            return Ok(identity::passthrough(value));
        }

        if let Some(result) = identity::try_unwrap(&*self.wrapper, value, target) {
            return result;
        }

        if py.is_none(value) && !target.is_value_type() {
            return Ok(HostValue::Null);
        }

        match &entry.descriptor {
            TypeDescriptor::ForeignHandle => Ok(identity::passthrough(value)),
            TypeDescriptor::Primitive(kind) => marshal::extract(py, value, *kind),
            TypeDescriptor::Array { element, rank } => {
                if *rank > 1 {
                    composite::to_multi_array(self, py, value, target, element, *rank)
                } else {
                    composite::to_array(self, py, value, target, element)
                }
            }
            TypeDescriptor::Enum { .. } => composite::to_enum(py, value, target),
            TypeDescriptor::Nullable(inner) => composite::to_nullable(self, py, value, inner),
            TypeDescriptor::AnyObject => self.to_any_object(py, value),
            TypeDescriptor::AnyType => value
                .as_type_object()
                .and_then(host_type_for_type_object)
                .map(HostValue::Type)
                .ok_or_else(|| ConversionError::type_mismatch(py.type_name(value), target.name())),
            TypeDescriptor::Instance(_) => {
                Err(ConversionError::type_mismatch(py.type_name(value), target.name()))
            }
        }
    }

    /// Best-effort primitive sniffing for `object` targets
    fn to_any_object(&self, py: Gil<'_>, value: &ForeignRef) -> ConversionResult<HostValue> {
        match value.type_tag() {
            TypeTag::Str => marshal::extract(py, value, PrimitiveKind::String),
            TypeTag::Bool => marshal::extract(py, value, PrimitiveKind::Bool),
            TypeTag::Int => match value.as_i128().and_then(|v| i32::try_from(v).ok()) {
                Some(v) => Ok(HostValue::I32(v)),
                None => marshal::extract(py, value, PrimitiveKind::I64),
            },
            TypeTag::Long => marshal::extract(py, value, PrimitiveKind::I64),
            TypeTag::Float => marshal::extract(py, value, PrimitiveKind::F64),
            _ if py.sequence_check(value) => {
                let object = HostType::object();
                composite::to_array(self, py, value, &HostType::array(&object, 1), &object)
            }
            _ => Err(ConversionError::type_mismatch(py.type_name(value), "object")),
        }
    }

    // ========================================================================
    // Host -> foreign
    // ========================================================================

    /// Convert a host value to a new foreign reference
    ///
    /// `declared` is advisory: the runtime shape of `value` selects the
    /// conversion. Never fails; anything without a structural mapping is
    /// identity-wrapped.
    pub fn host_to_foreign(&self, py: Gil<'_>, value: &HostValue, declared: &HostType) -> ForeignRef {
        self.counters.to_foreign.fetch_add(1, Ordering::Relaxed);

        let object = self.to_foreign_inner(py, value);
        log_type_conversion(declared.name(), object.type_tag().name());
        object
    }

    /// `host_to_foreign` with `object` as the declared type
    pub fn host_to_foreign_implicit(&self, py: Gil<'_>, value: &HostValue) -> ForeignRef {
        self.host_to_foreign(py, value, &HostType::object())
    }

    fn to_foreign_inner(&self, py: Gil<'_>, value: &HostValue) -> ForeignRef {
        match value {
            HostValue::Null => py.none(),
            HostValue::Foreign(handle) => handle.clone(),
            HostValue::Array(array) => self.array_to_foreign(py, array, 0, 0),
            HostValue::List(list) => py.list(
                list.items()
                    .iter()
                    .map(|item| self.to_foreign_inner(py, item))
                    .collect(),
            ),
            HostValue::Enum(member) => match member.underlying_value() {
                Some(underlying) => self.to_foreign_inner(py, &underlying),
                None => self.wrapper.wrap(py, value),
            },
            HostValue::Object(_) => self.wrapper.wrap(py, value),
            HostValue::Type(ty) => {
                foreign_type_object(py, ty).unwrap_or_else(|| self.wrapper.wrap_type(py, ty))
            }
            scalar => marshal::to_foreign(py, scalar).unwrap_or_else(|| self.wrapper.wrap(py, scalar)),
        }
    }

    /// Nested lists for one dimension of a (possibly multidimensional) array
    fn array_to_foreign(&self, py: Gil<'_>, array: &HostArray, depth: usize, offset: usize) -> ForeignRef {
        let dims = array.dims();
        let stride: usize = dims[depth + 1..].iter().product();

        let items = (0..dims[depth])
            .map(|i| {
                let start = offset + i * stride;
                if depth + 1 == dims.len() {
                    self.to_foreign_inner(py, &array.items()[start])
                } else {
                    self.array_to_foreign(py, array, depth + 1, start)
                }
            })
            .collect();
        py.list(items)
    }

    // ========================================================================
    // Statically-typed layer
    // ========================================================================

    /// Extract a Rust value through the dispatch cache
    pub fn extract<T: FromForeign>(
        &self,
        py: Gil<'_>,
        value: &ForeignRef,
        report_error: bool,
    ) -> ConversionResult<T> {
        let target = T::host_type();
        let host = self.foreign_to_host(py, value, &target, report_error)?;
        T::from_host(host).ok_or_else(|| {
            ConversionError::type_mismatch(py.type_name(value), target.name())
        })
    }

    /// Convert a Rust value to a new foreign reference
    pub fn to_foreign_typed<T: IntoForeign>(&self, py: Gil<'_>, value: T) -> ForeignRef {
        let declared = T::host_type();
        self.host_to_foreign(py, &value.into_host(), &declared)
    }
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
