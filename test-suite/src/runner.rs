use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vouch_schema::{ErrorSink, SchemaRoot};
use vouch_value::from_json;

use crate::{parse_suite, TestFailure, TestGroup, TestResults};

pub struct TestRunner {
    cases_dir: PathBuf,
}

impl TestRunner {
    pub fn new(cases_dir: impl Into<PathBuf>) -> Self {
        Self {
            cases_dir: cases_dir.into(),
        }
    }

    /// Discover and run every suite document under the cases directory.
    pub fn run_all(&self) -> Result<TestResults> {
        let mut results = TestResults::new();

        for suite_file in self.discover_suite_files()? {
            let content = fs::read_to_string(&suite_file)
                .with_context(|| format!("failed to read suite file {suite_file:?}"))?;
            let suite_name = suite_file
                .strip_prefix(&self.cases_dir)
                .unwrap_or(&suite_file)
                .with_extension("")
                .display()
                .to_string();

            match parse_suite(&content) {
                Ok(groups) => {
                    for group in &groups {
                        self.run_group(&suite_name, group, &mut results);
                    }
                }
                Err(e) => {
                    results.add_failure(TestFailure::new(
                        suite_name,
                        format!("failed to parse suite document: {e}"),
                    ));
                }
            }
        }

        Ok(results)
    }

    fn discover_suite_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.walk_directory(&self.cases_dir, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn walk_directory(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.walk_directory(&path, files)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(())
    }

    /// Compile the group schema once, then compare each verdict against the
    /// expected one.
    fn run_group(&self, suite_name: &str, group: &TestGroup, results: &mut TestResults) {
        log::debug!("running group '{}' from {suite_name}", group.description);

        let mut root = SchemaRoot::new();
        if let Err(e) = root.set_root_schema(from_json(&group.schema)) {
            // A schema that fails to compile accepts nothing, so tests
            // expecting rejection still pass; only tests expecting
            // acceptance fail, reported as compile failures.
            for test in &group.tests {
                if test.valid {
                    results.add_failure(TestFailure::compile_error(
                        format!(
                            "{suite_name} :: {} :: {}",
                            group.description, test.description
                        ),
                        format!("schema failed to compile: {e}"),
                    ));
                } else {
                    results.add_pass();
                }
            }
            return;
        }

        for test in &group.tests {
            let mut sink = ErrorSink::new();
            root.validate(&from_json(&test.data), &mut sink);
            let valid = !sink.has_error();

            if valid == test.valid {
                results.add_pass();
            } else {
                let detail = if test.valid {
                    let first = sink
                        .iter()
                        .next()
                        .map(|d| format!(" (first: {} at '{}')", d.message, d.path))
                        .unwrap_or_default();
                    format!("expected valid, got {} diagnostics{first}", sink.len())
                } else {
                    "expected invalid, validation passed".to_string()
                };
                results.add_failure(TestFailure::new(
                    format!(
                        "{suite_name} :: {} :: {}",
                        group.description, test.description
                    ),
                    detail,
                ));
            }
        }
    }
}
