//! mockops Script Boundary
//!
//! Scripts are opaque to mockops: an engine receives a body and a set of
//! named variables, runs, and returns a JSON value or a [`ScriptError`].
//!
//! - [`ScriptExecutor`]: one engine instance with its variable environment
//! - [`ScriptEngineRegistry`]: creates executors by language id
//! - [`ScriptValue`] / [`ScriptLog`]: values bound into the environment

#![warn(missing_docs)]

mod executor;
mod registry;
mod value;

pub use executor::{ScriptError, ScriptExecutor};
pub use registry::{ScriptEngineFactory, ScriptEngineRegistry};
pub use value::{ScriptLog, ScriptValue};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
