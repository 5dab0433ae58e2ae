//! Reference counting - owned handles to foreign heap objects
//!
//! A `ForeignRef` held by value is an owned ("new") reference: cloning it
//! increments the header count, dropping it releases exactly once. Borrowed
//! references are plain `&ForeignRef` and never touch the count.

use super::object::{ObjectData, TypeTag};
use crate::logging::trace;
use std::fmt;
use std::sync::atomic::{fence, AtomicU32, Ordering};
use std::sync::Arc;

/// Object header - prefixed to every foreign heap object
pub struct ObjectHeader {
    refcount: AtomicU32,
    tag: TypeTag,
}

impl ObjectHeader {
    /// Create header for new object (count starts at one)
    #[inline]
    pub const fn new(tag: TypeTag) -> Self {
        Self {
            refcount: AtomicU32::new(1),
            tag,
        }
    }

    /// Builtin type tag of the object
    #[inline]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }
}

pub(crate) struct HeapObject {
    header: ObjectHeader,
    data: ObjectData,
}

/// Owned reference to a foreign object
pub struct ForeignRef {
    ptr: Arc<HeapObject>,
}

impl ForeignRef {
    /// Allocate a new object; the returned handle is its only reference
    pub(crate) fn alloc(tag: TypeTag, data: ObjectData) -> Self {
        let ptr = Arc::new(HeapObject {
            header: ObjectHeader::new(tag),
            data,
        });

        trace!(event = "object_new", tag = tag.name(), address = ?Arc::as_ptr(&ptr));

        Self { ptr }
    }

    /// Increment reference count (hot path)
    #[inline(always)]
    fn inc(&self) {
        let old = self.ptr.header.refcount.fetch_add(1, Ordering::Relaxed);

        debug_assert!(old < u32::MAX, "refcount overflow");
    }

    /// Decrement reference count (hot path)
    #[inline(always)]
    fn dec(&self) {
        let old = self.ptr.header.refcount.fetch_sub(1, Ordering::Release);

        debug_assert!(old > 0, "refcount underflow");

        if old == 1 {
            // Synchronize with all previous decrements
            fence(Ordering::Acquire);
            self.destroy();
        }
    }

    #[cold]
    fn destroy(&self) {
        trace!(
            event = "object_destroy",
            tag = self.ptr.header.tag.name(),
            address = ?self.as_ptr(),
        );
    }

    /// Current reference count
    #[inline]
    pub fn refcount(&self) -> u32 {
        self.ptr.header.refcount.load(Ordering::Relaxed)
    }

    /// Identity comparison (same foreign object)
    #[inline]
    pub fn is(&self, other: &ForeignRef) -> bool {
        Arc::ptr_eq(&self.ptr, &other.ptr)
    }

    /// Object address, for diagnostics only
    #[inline]
    pub fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.ptr) as *const ()
    }

    #[inline]
    pub fn type_tag(&self) -> TypeTag {
        self.ptr.header.tag()
    }

    #[inline]
    pub(crate) fn data(&self) -> &ObjectData {
        &self.ptr.data
    }
}

impl Clone for ForeignRef {
    #[inline]
    fn clone(&self) -> Self {
        self.inc();
        Self {
            ptr: Arc::clone(&self.ptr),
        }
    }
}

impl Drop for ForeignRef {
    #[inline]
    fn drop(&mut self) {
        self.dec();
    }
}

/// Foreign handles compare by identity
impl PartialEq for ForeignRef {
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}

impl fmt::Debug for ForeignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignRef")
            .field("tag", &self.type_tag())
            .field("refcount", &self.refcount())
            .field("address", &self.as_ptr())
            .finish()
    }
}
