//! Property descriptors - host properties exposed as foreign attributes
//!
//! Glue only: reads go through `host_to_foreign` with the property type,
//! writes through `foreign_to_host`. The returned `ForeignError` is what
//! the foreign runtime raises for the attribute access.

use crate::foreign::{ForeignError, ForeignErrorKind, ForeignRef, Gil};
use crate::host::{HostType, HostValue};
use crate::interop::{ConversionEngine, Wrapped};
use crate::logging::debug;
use std::fmt;
use std::sync::Arc;

/// Fault raised by a host accessor, possibly wrapping its cause
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostFault {
    pub message: String,
    #[source]
    pub inner: Option<Box<HostFault>>,
}

impl HostFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            inner: None,
        }
    }

    /// Wrap `cause` in an outer fault (as reflection invocation does)
    pub fn wrapping(message: impl Into<String>, cause: HostFault) -> Self {
        Self {
            message: message.into(),
            inner: Some(Box::new(cause)),
        }
    }

    /// The original fault underneath any wrapping layers
    pub fn innermost(&self) -> &HostFault {
        let mut fault = self;
        while let Some(inner) = &fault.inner {
            fault = inner;
        }
        fault
    }
}

/// Property getter; receives the instance, or `None` for static properties
pub type Getter = Arc<dyn Fn(Option<&HostValue>) -> Result<HostValue, HostFault> + Send + Sync>;

/// Property setter; receives the instance (or `None`) and the new value
pub type Setter = Arc<dyn Fn(Option<&HostValue>, HostValue) -> Result<(), HostFault> + Send + Sync>;

#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    property_type: HostType,
    getter: Option<Getter>,
    setter: Option<Setter>,
    is_static: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, property_type: HostType) -> Self {
        Self {
            name: name.into(),
            property_type,
            getter: None,
            setter: None,
            is_static: false,
        }
    }

    pub fn with_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(Option<&HostValue>) -> Result<HostValue, HostFault> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(Option<&HostValue>, HostValue) -> Result<(), HostFault> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> &HostType {
        &self.property_type
    }

    /// Attribute read; `target` of `None` (or foreign `None`) is class access
    pub fn get(
        &self,
        engine: &ConversionEngine,
        py: Gil<'_>,
        target: Option<&ForeignRef>,
    ) -> Result<ForeignRef, ForeignError> {
        let getter = self
            .getter
            .as_ref()
            .ok_or_else(|| ForeignError::type_error("property cannot be read"))?;

        let instance = match target.filter(|t| !py.is_none(t)) {
            None if !self.is_static => {
                return Err(ForeignError::type_error(
                    "instance property must be accessed through a class instance",
                ));
            }
            None => None,
            Some(target) => Some(self.instance_of(engine, target)?),
        };

        let value = getter(instance.as_ref()).map_err(|fault| self.surface(&fault))?;
        Ok(engine.host_to_foreign(py, &value, &self.property_type))
    }

    /// Attribute write; `value` of `None` is a delete
    pub fn set(
        &self,
        engine: &ConversionEngine,
        py: Gil<'_>,
        target: Option<&ForeignRef>,
        value: Option<&ForeignRef>,
    ) -> Result<(), ForeignError> {
        let value = value.ok_or_else(|| ForeignError::type_error("cannot delete property"))?;
        let setter = self
            .setter
            .as_ref()
            .ok_or_else(|| ForeignError::type_error("property is read-only"))?;

        let converted = engine
            .foreign_to_host(py, value, &self.property_type, false)
            .map_err(|e| e.to_foreign_error())?;

        let instance = match target.filter(|t| !py.is_none(t)) {
            None if !self.is_static => {
                return Err(ForeignError::type_error(
                    "instance property must be set on an instance",
                ));
            }
            None => None,
            Some(_) if self.is_static => None,
            Some(target) => Some(self.instance_of(engine, target)?),
        };

        setter(instance.as_ref(), converted).map_err(|fault| self.surface(&fault))
    }

    pub fn repr(&self) -> String {
        format!("<property '{}'>", self.name)
    }

    fn instance_of(&self, engine: &ConversionEngine, target: &ForeignRef) -> Result<HostValue, ForeignError> {
        match engine.wrapper().unwrap(target) {
            Some(Wrapped::Instance(instance)) if !instance.is_null() => Ok(instance),
            _ => Err(ForeignError::type_error("invalid target")),
        }
    }

    fn surface(&self, fault: &HostFault) -> ForeignError {
        let cause = fault.innermost();
        debug!(property = %self.name, fault = %cause, "Property accessor raised");
        ForeignError::new(ForeignErrorKind::HostException, cause.message.clone())
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("property_type", &self.property_type)
            .field("readable", &self.getter.is_some())
            .field("writable", &self.setter.is_some())
            .field("is_static", &self.is_static)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foreign::Interpreter;
    use crate::host::HostObject;
    use crate::interop::PrimitiveKind;
    use parking_lot::Mutex;

    struct Counter {
        count: Mutex<i32>,
    }

    fn counter_property() -> (HostType, PropertyDescriptor) {
        let class = HostType::define_class("Counter", None, &[]);
        let property = PropertyDescriptor::new("count", HostType::primitive(PrimitiveKind::I32))
            .with_getter(|instance| {
                let object = match instance {
                    Some(HostValue::Object(object)) => object,
                    _ => return Err(HostFault::new("no instance")),
                };
                let counter = object
                    .downcast_ref::<Counter>()
                    .ok_or_else(|| HostFault::new("wrong payload"))?;
                Ok(HostValue::I32(*counter.count.lock()))
            })
            .with_setter(|instance, value| {
                let object = match instance {
                    Some(HostValue::Object(object)) => object,
                    _ => return Err(HostFault::new("no instance")),
                };
                let counter = object
                    .downcast_ref::<Counter>()
                    .ok_or_else(|| HostFault::new("wrong payload"))?;
                match value {
                    HostValue::I32(v) if v < 0 => Err(HostFault::wrapping(
                        "target of invocation threw",
                        HostFault::new("count must be non-negative"),
                    )),
                    HostValue::I32(v) => {
                        *counter.count.lock() = v;
                        Ok(())
                    }
                    _ => Err(HostFault::new("unexpected value")),
                }
            });
        (class, property)
    }

    #[test]
    fn test_get_and_set_through_instance() {
        let interp = Interpreter::new();
        let guard = interp.acquire();
        let py = guard.token();
        let engine = ConversionEngine::default();

        let (class, property) = counter_property();
        let object = HostValue::Object(HostObject::new(class, Counter { count: Mutex::new(3) }));
        let target = engine.host_to_foreign_implicit(py, &object);

        let read = property.get(&engine, py, Some(&target)).unwrap();
        assert_eq!(read.as_i128(), Some(3));

        property.set(&engine, py, Some(&target), Some(&py.int(9))).unwrap();
        let read = property.get(&engine, py, Some(&target)).unwrap();
        assert_eq!(read.as_i128(), Some(9));
    }

    #[test]
    fn test_fault_unwrapped_to_innermost() {
        let interp = Interpreter::new();
        let guard = interp.acquire();
        let py = guard.token();
        let engine = ConversionEngine::default();

        let (class, property) = counter_property();
        let object = HostValue::Object(HostObject::new(class, Counter { count: Mutex::new(0) }));
        let target = engine.host_to_foreign_implicit(py, &object);

        let err = property.set(&engine, py, Some(&target), Some(&py.int(-1))).unwrap_err();
        assert_eq!(err.kind, ForeignErrorKind::HostException);
        assert_eq!(err.message, "count must be non-negative");
    }

    #[test]
    fn test_access_errors() {
        let interp = Interpreter::new();
        let guard = interp.acquire();
        let py = guard.token();
        let engine = ConversionEngine::default();
        let (_, property) = counter_property();

        let err = property.get(&engine, py, None).unwrap_err();
        assert_eq!(err.message, "instance property must be accessed through a class instance");

        let err = property.get(&engine, py, Some(&py.int(1))).unwrap_err();
        assert_eq!(err.message, "invalid target");

        let err = property.set(&engine, py, None, Some(&py.int(1))).unwrap_err();
        assert_eq!(err.message, "instance property must be set on an instance");

        let err = property.set(&engine, py, None, None).unwrap_err();
        assert_eq!(err.message, "cannot delete property");

        let err = property.set(&engine, py, None, Some(&py.str("x"))).unwrap_err();
        assert_eq!(err.kind, ForeignErrorKind::TypeError);
        assert!(!py.error_occurred());
    }

    #[test]
    fn test_read_only_and_write_only() {
        let interp = Interpreter::new();
        let guard = interp.acquire();
        let py = guard.token();
        let engine = ConversionEngine::default();

        let version = PropertyDescriptor::new("version", HostType::string())
            .with_static(true)
            .with_getter(|_| Ok(HostValue::String("1.0".to_owned())));

        let read = version.get(&engine, py, None).unwrap();
        assert_eq!(read.as_str(), Some("1.0"));

        let err = version.set(&engine, py, None, Some(&py.str("2.0"))).unwrap_err();
        assert_eq!(err.message, "property is read-only");

        let sink = PropertyDescriptor::new("sink", HostType::string()).with_static(true);
        let err = sink.get(&engine, py, None).unwrap_err();
        assert_eq!(err.message, "property cannot be read");
        assert_eq!(sink.repr(), "<property 'sink'>");
    }
}
