//! Test execution
//!
//! The runner walks a materialized `Suite` tree depth-first and runs
//! every test strictly in sequence, narrating progress through an
//! [`EventSink`]. Transport-level failures are test verdicts, not run
//! aborts; only errors that no test can recover from (an invalid
//! expectation pattern, a failed initial connect) stop the walk.

pub mod event;

use regex::Regex;
use tracing::debug;

use crate::common::{Error, Result};
use crate::router::CommandRouter;
use crate::suite::{Status, Suite, SuiteResult, Test, TestResult};

pub use event::{Event, EventFormat, EventSink, HumanSink, MachineSink, Source};

/// Runs a suite tree against a set of connected execution contexts
pub struct Runner<'a> {
    router: &'a mut CommandRouter,
    sink: &'a mut dyn EventSink,
}

impl<'a> Runner<'a> {
    pub fn new(router: &'a mut CommandRouter, sink: &'a mut dyn EventSink) -> Self {
        Self { router, sink }
    }

    /// Run the whole tree, bracketed by router setup and teardown
    ///
    /// Teardown always runs, also when setup or the walk fails.
    pub async fn run(&mut self, root: &Suite) -> Result<SuiteResult> {
        let result = match self.router.setup().await {
            Ok(()) => self.run_suite(root).await,
            Err(e) => Err(e),
        };
        self.router.teardown().await;
        result
    }

    /// Run a suite: its own tests first, then its nested suites
    async fn run_suite(&mut self, suite: &Suite) -> Result<SuiteResult> {
        let source = Source::Suite {
            name: &suite.name,
            brief: &suite.brief,
        };
        self.sink.handle(source, Event::Begin, None);

        let mut result = SuiteResult::new(suite);

        for test in suite.tests() {
            let test_result = self.run_test(test).await?;
            result.test_results.push(test_result);
        }
        for child in suite.suites() {
            let child_result = Box::pin(self.run_suite(child)).await?;
            result.suite_results.push(child_result);
        }

        let verdict = match result.status() {
            Status::Passed => Event::Success,
            Status::Failed => Event::Failure,
        };
        self.sink.handle(source, verdict, None);
        self.sink.handle(source, Event::End, None);

        Ok(result)
    }

    /// Run a single test
    ///
    /// Setup and teardown steps are best-effort and never affect the
    /// verdict; teardown runs no matter how the command went, before
    /// the verdict is announced.
    async fn run_test(&mut self, test: &Test) -> Result<TestResult> {
        let source = Source::Test {
            name: &test.name,
            brief: &test.brief,
        };
        self.sink.handle(source, Event::Begin, None);

        for step in &test.setup {
            self.sink.handle(source, Event::Setup, Some(step));
            if let Err(e) = self.router.execute(step).await {
                debug!("setup step '{}' failed: {}", step, e);
            }
        }

        self.sink.handle(source, Event::Command, Some(&test.command));
        let outcome = self.check(test).await;

        for step in &test.teardown {
            self.sink.handle(source, Event::Teardown, Some(step));
            if let Err(e) = self.router.execute(step).await {
                debug!("teardown step '{}' failed: {}", step, e);
            }
        }

        let status = match outcome {
            Ok(()) => {
                self.sink.handle(source, Event::Success, None);
                Status::Passed
            }
            Err(e) if e.is_test_failure() => {
                debug!("test '{}' failed: {}", test.name, e);
                self.sink.handle(source, Event::Failure, Some(&e.to_string()));
                Status::Failed
            }
            Err(e) => return Err(e),
        };
        self.sink.handle(source, Event::End, None);

        Ok(TestResult::new(test, status))
    }

    /// Execute the test command and match its output against the
    /// expectation, if any
    async fn check(&mut self, test: &Test) -> Result<()> {
        let output = self.router.execute(&test.command).await?;

        let Some(expect) = test.expect.as_deref().filter(|e| !e.is_empty()) else {
            return Ok(());
        };
        let pattern = Regex::new(expect).map_err(|e| Error::InvalidPattern {
            pattern: expect.to_string(),
            error: e.to_string(),
        })?;
        if !pattern.is_match(&output) {
            debug!("output '{}' did not match '{}'", output.trim_end(), expect);
            return Err(Error::ExpectationMismatch);
        }
        Ok(())
    }
}
