//! Typthon Bridge - value marshaling between the host and foreign runtimes
//!
//! The host side is statically typed and garbage collected; the foreign side
//! is dynamically typed and reference counted. `ConversionEngine` converts
//! single values across the boundary in both directions, preserving identity
//! for already-wrapped objects and honoring the foreign refcount discipline.

// Core modules
pub mod foreign;
pub mod host;
pub mod interop;

// Collaborators
pub mod args;
pub mod descriptor;

// Infrastructure
pub mod config;
pub mod errors;
pub mod logging;

// Re-export commonly used items
pub use args::{ArgError, ArgParser};
pub use config::{BridgeConfig, ConfigError, RaggedPolicy};
pub use descriptor::{HostFault, PropertyDescriptor};
pub use errors::{ConversionError, ConversionErrorKind, ConversionResult};
pub use foreign::{ForeignError, ForeignErrorKind, ForeignRef, Gil, GilGuard, Interpreter, TypeTag};
pub use host::{EnumValue, HostArray, HostList, HostObject, HostType, HostValue};
pub use interop::{
    ConversionEngine, ConversionStats, DispatchCache, DispatchEntry, FromForeign, IntoForeign, ObjectWrapper,
    PrimitiveKind, Strategy, TypeDescriptor,
};

/// Engine configured from `.bridgerc.toml` discovery, with logging from
/// `TYPTHON_BRIDGE_LOG_*`
///
/// Keep the returned guard alive so buffered logs are flushed.
pub fn init() -> (ConversionEngine, Option<tracing_appender::non_blocking::WorkerGuard>) {
    let guard = logging::init();
    let config = BridgeConfig::discover();
    logging::info!(ragged = ?config.arrays.ragged, "Conversion engine initializing");
    (ConversionEngine::new(config), guard)
}
