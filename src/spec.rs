//! Test and suite specifications
//!
//! Specs are read-only catalog entries, one per YAML file, tagged by a
//! `type: test` or `type: suite` field. They are never mutated by
//! execution; the resolver materializes fresh runtime objects from them
//! on every run.

use serde::Deserialize;

/// A spec file, either a test or a suite
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpecFile {
    Test(TestSpec),
    Suite(SuiteSpec),
}

impl SpecFile {
    /// Name of the contained spec
    pub fn name(&self) -> &str {
        match self {
            Self::Test(t) => &t.name,
            Self::Suite(s) => &s.name,
        }
    }
}

/// Specification of a test to run
#[derive(Deserialize, Debug, Clone)]
pub struct TestSpec {
    /// Unique name; shares a namespace with suite names
    pub name: String,
    /// One-line summary shown while running
    pub brief: String,
    /// Longer free-form description
    #[serde(default = "unknown_description")]
    pub description: String,
    #[serde(default = "unknown")]
    pub author: String,
    #[serde(default = "unknown")]
    pub category: String,
    /// Command to execute, possibly carrying a `context(...)` routing prefix
    pub command: String,
    /// Optional pattern the command output must match (unanchored search)
    #[serde(default)]
    pub expect: Option<String>,
    /// Commands run before the test command; failures are ignored
    #[serde(default)]
    pub setup: Vec<String>,
    /// Commands run after the test command; failures are ignored
    #[serde(default)]
    pub teardown: Vec<String>,
}

/// Specification of a suite to run
#[derive(Deserialize, Debug, Clone)]
pub struct SuiteSpec {
    /// Unique name; shares a namespace with test names
    pub name: String,
    /// One-line summary shown while running
    pub brief: String,
    #[serde(default = "unknown_description")]
    pub description: String,
    #[serde(default = "unknown")]
    pub author: String,
    #[serde(default = "unknown")]
    pub category: String,
    /// Ordered child test names
    #[serde(default)]
    pub tests: Vec<String>,
    /// Ordered child suite names (by reference, not embedding)
    #[serde(default)]
    pub suites: Vec<String>,
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn unknown_description() -> String {
    "No description given".to_string()
}
