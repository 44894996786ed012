//! mockops Check
//!
//! Runs a check against a test step in three fixed phases:
//! setup script → check body → teardown script.
//!
//! Phases are isolated from each other. A failing or panicking phase is
//! reported to an [`ErrorSink`] and the run continues, so teardown always
//! gets its chance to clean up. [`CheckRunner::run`] never returns an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use mockops_check::{CheckConfig, CheckRunner, TestStep};
//!
//! let config = CheckConfig::new("sql-injection")
//!     .with_setup("log.info('seeding')")
//!     .with_teardown("log.info('cleanup')");
//! let mut runner = CheckRunner::new(config, my_check, engine);
//! runner.run(&TestStep::new("GetInvoice"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod context;
mod error;
mod phase;
mod runner;
mod sink;

// Re-exports
pub use context::{CheckContext, TestStep, CHECK_RUNNER_KEY};
pub use error::{CheckError, PhaseError, PhaseFailure};
pub use phase::CheckPhase;
pub use runner::{Check, CheckConfig, CheckRunner};
pub use sink::{CollectingSink, ErrorSink, TracingSink};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
