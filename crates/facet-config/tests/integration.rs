//! Integration tests for facet-config.
//!
//! Tests the full configuration loading pipeline: discovery -> parse -> merge -> validate.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use facet_config::{Config, ConfigError, ConfigWarning, HttpMethod, is_global_config};
use facet_query::{FacetOrder, Fuzzify, Logic};

/// Test helper to create a temporary directory structure for tests.
struct TestEnv {
    /// Owned temporary root.
    root: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates a directory and returns its path.
    fn create_dir(&self, rel_path: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Creates a file with content and returns its path.
    fn create_file(&self, rel_path: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}

#[test]
fn test_load_root_config_only() {
    let env = TestEnv::new();
    env.create_file(
        "project/.facet.toml",
        r#"
root = true
nested = "stats"

[backend]
url = "http://localhost:9200/records/_search"
method = "post"

[search]
fuzzify = "*"
default_operator = "AND"

[[facet]]
field = "subject"
display = "Subject"
order = "count"
min_size = 3

[[facet]]
field = "stats.source"
display = "Source"
operator = "OR"
"#,
    );
    let cwd = env.create_dir("project/src");

    let config = Config::load(&cwd).unwrap();

    assert_eq!(config.config_root, Some(env.path().join("project")));
    assert_eq!(config.backend.method, HttpMethod::Post);
    assert_eq!(config.search.fuzzify, Fuzzify::Wildcard);
    assert_eq!(config.search.default_operator, Logic::And);
    assert_eq!(config.nested, vec!["stats".to_string()]);
    assert_eq!(config.facets.len(), 2);
    assert_eq!(config.facets[0].order, FacetOrder::Count);
    assert_eq!(config.facets[0].min_size, Some(3));
    assert_eq!(config.facets[1].operator, Logic::Or);
    assert_eq!(config.nested_prefix("stats.source"), Some("stats"));
    assert!(config.validate().is_empty());
}

#[test]
fn test_child_overrides_parent() {
    let env = TestEnv::new();
    env.create_file(
        ".facet.toml",
        r#"
root = true

[backend]
url = "http://parent"
timeout_secs = 5

[paging]
size = 50

[[facet]]
field = "year"
"#,
    );
    env.create_file(
        "child/.facet.toml",
        r#"
[backend]
url = "http://child"

[[facet]]
field = "subject"
"#,
    );
    let cwd = env.create_dir("child");

    let config = Config::load(&cwd).unwrap();

    assert_eq!(config.backend.url.as_deref(), Some("http://child"));
    assert_eq!(config.backend.timeout_secs, 5);
    assert_eq!(config.paging.size, 50);
    assert_eq!(config.facets.len(), 1);
    assert_eq!(config.facets[0].field, "subject");
}

#[test]
fn test_load_from_files_reports_parse_errors() {
    let env = TestEnv::new();
    let bad = env.create_file("bad.toml", "[[facet]\nfield = ");

    let err = Config::load_from_files(&[bad.clone()]).unwrap_err();
    match err {
        ConfigError::ParseToml { path, .. } => assert_eq!(path, bad),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_from_files_reports_missing_file() {
    let env = TestEnv::new();
    let missing = env.path().join("nope.toml");

    let err = Config::load_from_files(&[missing]).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn test_hierarchy_with_duplicate_leaf_is_fatal() {
    let env = TestEnv::new();
    let path = env.create_file(
        ".facet.toml",
        r#"
[[facet]]
field = "subject"

[hierarchy.subject]
Fruit = ["Apple"]
Red = ["Apple"]
"#,
    );

    let err = Config::load_from_files(&[path]).unwrap_err();
    assert!(err.to_string().contains("repeats leaf 'Apple'"));
}

#[test]
fn test_missing_backend_is_only_a_warning() {
    let env = TestEnv::new();
    env.create_file(
        ".facet.toml",
        "root = true\n[[facet]]\nfield = \"subject\"\ndisplay = \"Subject\"\n",
    );

    let config = Config::load(env.path()).unwrap();
    assert_eq!(config.validate(), vec![ConfigWarning::NoBackendUrl]);
}

#[test]
fn test_no_local_config_loads_defaults_or_global() {
    let env = TestEnv::new();
    let cwd = env.create_dir("a/b");

    let config = Config::load(&cwd).unwrap();
    if let Some(root) = &config.config_root {
        // Only the user's own ~/.facet.toml can contribute here.
        assert!(is_global_config(&root.join(".facet.toml")));
    } else {
        assert!(config.facets.is_empty());
        assert_eq!(config.paging.size, 10);
    }
}
