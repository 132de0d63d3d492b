//! testrig - declarative test automation for local and remote targets
//!
//! Tests and suites are YAML specs; a run materializes a selection of
//! them into a suite tree and executes every test command against a
//! target reached over SSH, serial, telnet, a bootloader console, or
//! the local machine.

pub mod catalog;
pub mod cli;
pub mod client;
pub mod commands;
pub mod common;
pub mod resolver;
pub mod router;
pub mod runner;
pub mod spec;
pub mod suite;
pub mod target;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use suite::{Status, Suite, SuiteResult, Test, TestResult};
pub use target::TargetUri;
