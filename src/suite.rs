//! Runtime tests, suites and their results
//!
//! A `Suite` tree is materialized fresh for every invocation by the
//! resolver; ownership is strictly tree-shaped. Results mirror the tree:
//! a `TestResult` is terminal once created, a `SuiteResult` derives its
//! status from its children on demand.

use crate::spec::{SuiteSpec, TestSpec};

/// Name of the synthetic suite wrapping a run's top-level selection
pub const ROOT_SUITE: &str = "root";

/// A test materialized from its spec, ready to run
#[derive(Debug, Clone)]
pub struct Test {
    pub name: String,
    pub brief: String,
    pub command: String,
    pub expect: Option<String>,
    pub setup: Vec<String>,
    pub teardown: Vec<String>,
}

impl Test {
    /// Materialize a test from its spec
    pub fn from_spec(spec: &TestSpec) -> Self {
        Self {
            name: spec.name.clone(),
            brief: spec.brief.clone(),
            command: spec.command.clone(),
            expect: spec.expect.clone(),
            setup: spec.setup.clone(),
            teardown: spec.teardown.clone(),
        }
    }
}

/// An ordered grouping of tests and nested suites
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub brief: String,
    tests: Vec<Test>,
    suites: Vec<Suite>,
}

impl Suite {
    /// Create an empty suite; used for the synthetic root
    pub fn new(name: &str, brief: &str) -> Self {
        Self {
            name: name.to_string(),
            brief: brief.to_string(),
            tests: Vec::new(),
            suites: Vec::new(),
        }
    }

    /// Create an empty suite carrying a spec's metadata; children are
    /// attached by the resolver
    pub fn from_spec(spec: &SuiteSpec) -> Self {
        Self::new(&spec.name, &spec.brief)
    }

    /// The synthetic root suite holding a run's top-level selection
    pub fn root() -> Self {
        Self::new(ROOT_SUITE, "top-level selection")
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn add_test(&mut self, test: Test) {
        self.tests.push(test);
    }

    pub fn add_suite(&mut self, suite: Suite) {
        self.suites.push(suite);
    }
}

/// Outcome of a single test or of a whole suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    Failed,
}

/// Result of the execution of a test; terminal once created
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Name of the test that produced this result
    pub test: String,
    pub status: Status,
}

impl TestResult {
    pub fn new(test: &Test, status: Status) -> Self {
        Self {
            test: test.name.clone(),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Passed
    }
}

/// Result of the execution of a suite
///
/// The status is derived, not stored: a suite passes iff every child
/// test result and every child suite result passed. An empty suite
/// passes.
#[derive(Debug, Clone)]
pub struct SuiteResult {
    /// Name of the suite that produced this result
    pub suite: String,
    pub test_results: Vec<TestResult>,
    pub suite_results: Vec<SuiteResult>,
}

impl SuiteResult {
    pub fn new(suite: &Suite) -> Self {
        Self {
            suite: suite.name.clone(),
            test_results: Vec::new(),
            suite_results: Vec::new(),
        }
    }

    pub fn status(&self) -> Status {
        let children_passed = self.test_results.iter().all(TestResult::is_success)
            && self.suite_results.iter().all(SuiteResult::is_success);
        if children_passed {
            Status::Passed
        } else {
            Status::Failed
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == Status::Passed
    }

    /// Total number of leaf test results in this tree
    pub fn test_count(&self) -> usize {
        self.test_results.len()
            + self
                .suite_results
                .iter()
                .map(SuiteResult::test_count)
                .sum::<usize>()
    }

    /// Number of failed leaf test results in this tree
    pub fn failure_count(&self) -> usize {
        self.test_results
            .iter()
            .filter(|r| !r.is_success())
            .count()
            + self
                .suite_results
                .iter()
                .map(SuiteResult::failure_count)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_named(name: &str) -> Test {
        Test {
            name: name.to_string(),
            brief: String::new(),
            command: "true".to_string(),
            expect: None,
            setup: Vec::new(),
            teardown: Vec::new(),
        }
    }

    fn result(name: &str, status: Status) -> TestResult {
        TestResult::new(&test_named(name), status)
    }

    #[test]
    fn test_empty_suite_passes() {
        let suite = Suite::new("s", "");
        assert!(SuiteResult::new(&suite).is_success());
    }

    #[test]
    fn test_one_failed_test_fails_the_suite() {
        let suite = Suite::new("s", "");
        let mut sr = SuiteResult::new(&suite);
        sr.test_results.push(result("a", Status::Passed));
        sr.test_results.push(result("b", Status::Failed));
        assert_eq!(sr.status(), Status::Failed);
        assert_eq!(sr.test_count(), 2);
        assert_eq!(sr.failure_count(), 1);
    }

    #[test]
    fn test_failure_propagates_from_nested_suite() {
        let outer = Suite::new("outer", "");
        let inner = Suite::new("inner", "");

        let mut inner_result = SuiteResult::new(&inner);
        inner_result.test_results.push(result("a", Status::Failed));

        let mut outer_result = SuiteResult::new(&outer);
        outer_result.test_results.push(result("b", Status::Passed));
        outer_result.suite_results.push(inner_result);

        assert_eq!(outer_result.status(), Status::Failed);
        assert_eq!(outer_result.failure_count(), 1);
    }

    #[test]
    fn test_all_passed_suite_passes() {
        let suite = Suite::new("s", "");
        let mut sr = SuiteResult::new(&suite);
        sr.test_results.push(result("a", Status::Passed));

        let mut nested = SuiteResult::new(&Suite::new("n", ""));
        nested.test_results.push(result("c", Status::Passed));
        sr.suite_results.push(nested);

        assert!(sr.is_success());
    }
}
