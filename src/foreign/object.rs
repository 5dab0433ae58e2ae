//! Object system - representation of foreign values
//!
//! One `ObjectData` variant per builtin type tag, plus the two wrapper kinds
//! the identity subsystem uses for host instances and host classes.

use super::refcount::ForeignRef;
use crate::host::{HostType, HostValue};

/// Builtin type tags for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    None = 0,
    Bool = 1,
    /// Machine-word integer (fits i64)
    Int = 2,
    /// Integer outside the machine-word range
    Long = 3,
    Float = 4,
    Str = 5,
    Bytes = 6,
    List = 7,
    Tuple = 8,
    Type = 9,
    HostInstance = 10,
    HostClass = 11,
    Instance = 12,
}

impl TypeTag {
    pub const ALL: [TypeTag; 13] = [
        Self::None,
        Self::Bool,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Str,
        Self::Bytes,
        Self::List,
        Self::Tuple,
        Self::Type,
        Self::HostInstance,
        Self::HostClass,
        Self::Instance,
    ];

    /// Name as reported by the foreign runtime
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Type => "type",
            Self::HostInstance => "host_instance",
            Self::HostClass => "host_class",
            Self::Instance => "object",
        }
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int | Self::Long)
    }
}

/// Object payload
pub(crate) enum ObjectData {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<ForeignRef>),
    Tuple(Vec<ForeignRef>),
    Type(TypeTag),
    HostInstance(HostValue),
    HostClass(HostType),
    Instance(InstanceData),
}

/// User-defined foreign object with optional protocol slots
#[derive(Debug, Clone)]
pub struct InstanceData {
    pub class_name: String,
    pub int_slot: Option<i128>,
    pub float_slot: Option<f64>,
    pub truthy: bool,
    pub sequence: Option<SequenceSlot>,
}

/// Sequence protocol slot of a user-defined object
///
/// `reported_len` is what the length query answers and may disagree with
/// `items`: a negative value makes the length query fail, a value larger than
/// `items.len()` makes fetches past the end fail. A `None` item models a fetch
/// that returns no object without raising.
#[derive(Debug, Clone)]
pub struct SequenceSlot {
    pub reported_len: isize,
    pub items: Vec<Option<ForeignRef>>,
}

impl InstanceData {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            int_slot: None,
            float_slot: None,
            truthy: true,
            sequence: None,
        }
    }

    pub fn with_int(mut self, value: i128) -> Self {
        self.int_slot = Some(value);
        self
    }

    pub fn with_float(mut self, value: f64) -> Self {
        self.float_slot = Some(value);
        self
    }

    pub fn with_truth(mut self, truthy: bool) -> Self {
        self.truthy = truthy;
        self
    }

    pub fn with_sequence(mut self, reported_len: isize, items: Vec<Option<ForeignRef>>) -> Self {
        self.sequence = Some(SequenceSlot { reported_len, items });
        self
    }
}

impl ForeignRef {
    /// Integer payload of an `int`/`long` object
    pub fn as_i128(&self) -> Option<i128> {
        match self.data() {
            ObjectData::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Payload of a `float` object
    pub fn as_f64(&self) -> Option<f64> {
        match self.data() {
            ObjectData::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Payload of a `bool` object
    pub fn as_bool(&self) -> Option<bool> {
        match self.data() {
            ObjectData::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Managed text of a `str` object
    pub fn as_str(&self) -> Option<&str> {
        match self.data() {
            ObjectData::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self.data() {
            ObjectData::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Items of a `list` or `tuple`, borrowed
    pub fn as_items(&self) -> Option<&[ForeignRef]> {
        match self.data() {
            ObjectData::List(items) | ObjectData::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Tag named by a builtin type object
    pub fn as_type_object(&self) -> Option<TypeTag> {
        match self.data() {
            ObjectData::Type(tag) => Some(*tag),
            _ => None,
        }
    }
}
