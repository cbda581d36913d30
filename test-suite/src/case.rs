//! Suite document shape.

use serde::Deserialize;

/// One group: a schema and the tests that run against it.
#[derive(Debug, Clone, Deserialize)]
pub struct TestGroup {
    pub description: String,
    pub schema: serde_json::Value,
    pub tests: Vec<TestCase>,
}

/// One instance and the expected verdict.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub description: String,
    pub data: serde_json::Value,
    pub valid: bool,
}

/// Parse a suite document: a JSON array of groups.
pub fn parse_suite(content: &str) -> Result<Vec<TestGroup>, serde_json::Error> {
    serde_json::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_suite_shape() {
        let groups = parse_suite(
            r#"[
                {
                    "description": "integers",
                    "schema": {"type": "integer"},
                    "tests": [
                        {"description": "an integer", "data": 1, "valid": true},
                        {"description": "a string", "data": "x", "valid": false}
                    ]
                }
            ]"#,
        )
        .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].tests.len(), 2);
        assert!(groups[0].tests[0].valid);
        assert!(!groups[0].tests[1].valid);
    }
}
