//! Host runtime - the statically-typed side of the bridge
//!
//! Architecture:
//! - `types.rs` - Reflection descriptors (`HostType`, `TypeKind`, enum/class metadata)
//! - `value.rs` - Boxed values (`HostValue`, `HostArray`, `HostList`, `EnumValue`, `HostObject`)

mod types;
mod value;

pub use types::{ClassInfo, EnumInfo, HostType, TypeKey, TypeKind};
pub use value::{EnumValue, HostArray, HostList, HostObject, HostValue};
