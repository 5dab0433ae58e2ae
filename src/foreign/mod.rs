//! Foreign runtime - the refcounted, dynamically-typed side of the bridge
//!
//! Design: a minimal in-process object model exposing exactly what the
//! conversion core consumes:
//! 1. Owned/borrowed object handles with manual refcount discipline
//! 2. A re-entrant execution lock and a `Copy` token proving it is held
//! 3. A single error indicator
//! 4. Numeric, truth and sequence coercion protocols (`protocols.rs`)

mod object;
mod protocols;
mod refcount;


pub use object::{InstanceData, SequenceSlot, TypeTag};
pub use refcount::ForeignRef;

pub(crate) use object::ObjectData;

use crate::host::{HostType, HostValue};
use crate::logging::{debug, trace};
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::fmt;

/// Exception kinds the foreign runtime can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignErrorKind {
    TypeError,
    OverflowError,
    ValueError,
    IndexError,
    AttributeError,
    /// Fault raised by host code invoked from the foreign side
    HostException,
}

impl fmt::Display for ForeignErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TypeError => "TypeError",
            Self::OverflowError => "OverflowError",
            Self::ValueError => "ValueError",
            Self::IndexError => "IndexError",
            Self::AttributeError => "AttributeError",
            Self::HostException => "HostException",
        };
        f.write_str(name)
    }
}

/// A raised foreign exception
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ForeignError {
    pub kind: ForeignErrorKind,
    pub message: String,
}

impl ForeignError {
    pub fn new(kind: ForeignErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ForeignErrorKind::TypeError, message)
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new(ForeignErrorKind::OverflowError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ForeignErrorKind::ValueError, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(ForeignErrorKind::IndexError, message)
    }
}

/// Foreign interpreter state
pub struct Interpreter {
    none: ForeignRef,
    true_: ForeignRef,
    false_: ForeignRef,
    type_objects: Vec<ForeignRef>,
    error: Mutex<Option<ForeignError>>,
    lock: ReentrantMutex<()>,
}

impl Interpreter {
    pub fn new() -> Self {
        debug!("Foreign interpreter initializing");

        Self {
            none: ForeignRef::alloc(TypeTag::None, ObjectData::None),
            true_: ForeignRef::alloc(TypeTag::Bool, ObjectData::Bool(true)),
            false_: ForeignRef::alloc(TypeTag::Bool, ObjectData::Bool(false)),
            type_objects: TypeTag::ALL
                .iter()
                .map(|tag| ForeignRef::alloc(TypeTag::Type, ObjectData::Type(*tag)))
                .collect(),
            error: Mutex::new(None),
            lock: ReentrantMutex::new(()),
        }
    }

    /// Acquire the execution lock
    pub fn acquire(&self) -> GilGuard<'_> {
        GilGuard {
            interp: self,
            _guard: self.lock.lock(),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("error", &*self.error.lock())
            .finish_non_exhaustive()
    }
}

/// Held execution lock
pub struct GilGuard<'py> {
    interp: &'py Interpreter,
    _guard: ReentrantMutexGuard<'py, ()>,
}

impl<'py> GilGuard<'py> {
    /// Token proving the lock is held for the guard's lifetime
    #[inline]
    pub fn token(&self) -> Gil<'_> {
        Gil {
            interp: self.interp,
        }
    }
}

/// Proof that the execution lock is held
#[derive(Clone, Copy)]
pub struct Gil<'py> {
    interp: &'py Interpreter,
}

impl<'py> fmt::Debug for Gil<'py> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gil").finish_non_exhaustive()
    }
}

impl<'py> Gil<'py> {
    // ========================================================================
    // Constructors (every one returns a new reference)
    // ========================================================================

    #[inline]
    pub fn none(self) -> ForeignRef {
        self.interp.none.clone()
    }

    #[inline]
    pub fn bool(self, value: bool) -> ForeignRef {
        if value {
            self.interp.true_.clone()
        } else {
            self.interp.false_.clone()
        }
    }

    /// Integer object; values outside the machine-word range become `long`
    pub fn int(self, value: i128) -> ForeignRef {
        let tag = if i64::try_from(value).is_ok() {
            TypeTag::Int
        } else {
            TypeTag::Long
        };
        ForeignRef::alloc(tag, ObjectData::Int(value))
    }

    pub fn float(self, value: f64) -> ForeignRef {
        ForeignRef::alloc(TypeTag::Float, ObjectData::Float(value))
    }

    pub fn str(self, value: &str) -> ForeignRef {
        ForeignRef::alloc(TypeTag::Str, ObjectData::Str(value.to_owned()))
    }

    pub fn bytes(self, value: &[u8]) -> ForeignRef {
        ForeignRef::alloc(TypeTag::Bytes, ObjectData::Bytes(value.to_vec()))
    }

    /// List taking ownership of the item references
    pub fn list(self, items: Vec<ForeignRef>) -> ForeignRef {
        ForeignRef::alloc(TypeTag::List, ObjectData::List(items))
    }

    /// Tuple taking ownership of the item references
    pub fn tuple(self, items: Vec<ForeignRef>) -> ForeignRef {
        ForeignRef::alloc(TypeTag::Tuple, ObjectData::Tuple(items))
    }

    /// Interned builtin type object for `tag`
    pub fn type_object(self, tag: TypeTag) -> ForeignRef {
        self.interp.type_objects[tag as usize].clone()
    }

    pub fn instance(self, data: InstanceData) -> ForeignRef {
        ForeignRef::alloc(TypeTag::Instance, ObjectData::Instance(data))
    }

    /// Thin wrapper around a host instance (identity-wrapping subsystem)
    pub fn wrap_host_instance(self, value: HostValue) -> ForeignRef {
        ForeignRef::alloc(TypeTag::HostInstance, ObjectData::HostInstance(value))
    }

    /// Thin wrapper around a host type (identity-wrapping subsystem)
    pub fn wrap_host_class(self, ty: HostType) -> ForeignRef {
        ForeignRef::alloc(TypeTag::HostClass, ObjectData::HostClass(ty))
    }

    // ========================================================================
    // Error indicator
    // ========================================================================

    /// Raise `error`, replacing any pending one
    pub fn set_error(self, error: ForeignError) {
        trace!(event = "error_set", kind = %error.kind, message = %error.message);
        *self.interp.error.lock() = Some(error);
    }

    /// Clear and return the pending error
    pub fn take_error(self) -> Option<ForeignError> {
        self.interp.error.lock().take()
    }

    /// Pending error without clearing it
    pub fn peek_error(self) -> Option<ForeignError> {
        self.interp.error.lock().clone()
    }

    pub fn error_occurred(self) -> bool {
        self.interp.error.lock().is_some()
    }

    pub fn clear_error(self) {
        self.interp.error.lock().take();
    }

    // ========================================================================
    // Identity checks
    // ========================================================================

    #[inline]
    pub fn is_none(self, value: &ForeignRef) -> bool {
        value.is(&self.interp.none)
    }
}
