//! Fixture loading from YAML files.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tagstream_core::ParserOptions;

/// A single test case from a fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub id: String,
    #[serde(default)]
    pub desc: String,
    pub input: String,
    #[serde(default)]
    pub options: FixtureOptions,
    pub events: Vec<ExpectedEvent>,
}

/// Parser options as written in fixtures. Anything left out keeps its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureOptions {
    pub case_insensitive_names: Option<bool>,
    pub normalize_whitespace_text: Option<bool>,
    pub recover_from_mismatched_tags: Option<bool>,
    pub trim_text: Option<bool>,
}

impl FixtureOptions {
    pub fn to_options(&self) -> ParserOptions {
        let mut options = ParserOptions::default();
        if let Some(on) = self.case_insensitive_names {
            options = options.case_insensitive_names(on);
        }
        if let Some(on) = self.normalize_whitespace_text {
            options = options.normalize_whitespace_text(on);
        }
        if let Some(on) = self.recover_from_mismatched_tags {
            options = options.recover_from_mismatched_tags(on);
        }
        if let Some(on) = self.trim_text {
            options = options.trim_text(on);
        }
        options
    }
}

/// Expected event: either a bare name or [name, content].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpectedEvent {
    /// Just the event name (e.g., "end")
    Bare(String),
    /// Event name with content (e.g., ["text", "hello"])
    WithContent(String, String),
}

/// Load test cases from a YAML file.
pub fn load_fixtures(path: &Path) -> Vec<TestCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read fixture file {:?}: {}", path, e));
    serde_yaml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture file {:?}: {}", path, e))
}

/// Load fixtures from the standard fixtures directory.
pub fn load_fixtures_by_name(name: &str) -> Vec<TestCase> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.yaml", name));
    load_fixtures(&path)
}
