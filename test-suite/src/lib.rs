//! Conformance suite driver.
//!
//! Reads suite documents (an array of groups, each with a `schema` and a
//! list of `data`/`valid` tests), runs them through a `SchemaRoot`, and
//! tabulates pass/fail counts.

pub mod case;
pub mod runner;

pub use case::{parse_suite, TestCase, TestGroup};
pub use runner::TestRunner;

/// The result of running every suite document.
#[derive(Debug, Default)]
pub struct TestResults {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub failures: Vec<TestFailure>,
}

impl TestResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self) {
        self.total += 1;
        self.passed += 1;
    }

    pub fn add_failure(&mut self, failure: TestFailure) {
        self.total += 1;
        self.failed += 1;
        self.failures.push(failure);
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} tests, {} passed, {} failed",
            self.total, self.passed, self.failed
        )
    }
}

/// What kind of failure a [`TestFailure`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The validation verdict disagreed with the expected one.
    Assertion,
    /// The group's schema did not compile.
    CompileError,
}

#[derive(Debug, Clone)]
pub struct TestFailure {
    pub test_name: String,
    pub error: String,
    pub kind: FailureKind,
}

impl TestFailure {
    pub fn new(test_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            error: error.into(),
            kind: FailureKind::Assertion,
        }
    }

    pub fn compile_error(test_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            error: error.into(),
            kind: FailureKind::CompileError,
        }
    }

    /// Short tag for report output.
    pub fn label(&self) -> &'static str {
        match self.kind {
            FailureKind::Assertion => "FAIL",
            FailureKind::CompileError => "COMPILE FAIL",
        }
    }
}
