//! Suite runner binary.
//!
//! Runs every suite document under the cases directory (or one given as an
//! argument) and reports a summary; exits nonzero on failure.

use std::path::PathBuf;

use test_suite::TestRunner;

fn main() {
    env_logger::init();
    std::process::exit(run());
}

fn run() -> i32 {
    let cases_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("cases"));

    println!("vouch conformance suite ({})", cases_dir.display());

    let results = match TestRunner::new(cases_dir).run_all() {
        Ok(results) => results,
        Err(e) => {
            eprintln!("failed to run suite: {e:#}");
            return 2;
        }
    };

    for failure in &results.failures {
        println!("[{}] {}", failure.label(), failure.test_name);
        println!("       {}", failure.error);
    }
    println!("{}", results.summary());

    if results.is_success() { 0 } else { 1 }
}
