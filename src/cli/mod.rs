//! Command-line display helpers.
//!
//! Used by the `agentreg` binary to render registry listings, statistics and
//! orchestration results in the terminal.
//!
//! # Example
//!
//! ```rust
//! use agentreg::cli::{statistics_table, truncate_with_ellipsis};
//! use agentreg::orchestration::RegistryOrchestrator;
//!
//! let orchestrator = RegistryOrchestrator::default();
//! println!("{}", statistics_table(&orchestrator.get_system_statistics()));
//! assert_eq!(truncate_with_ellipsis("registry", 6), "reg...");
//! ```

pub mod display;

pub use display::*;
