//! CLI integration tests for facet commands.
//!
//! These tests focus on exit codes and basic behavioral verification,
//! not specific output formatting which may change.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper to create a temp directory for tests.
fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Helper to get a facet command with HOME isolated to `home`.
fn facet(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("facet").unwrap();
    cmd.env("HOME", home).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// Writes a root config into `dir`.
fn write_config(dir: &Path, extra: &str) {
    let config = format!(
        r#"
root = true
nested = ["stats"]

[[facet]]
field = "size"
display = "Size"

[[facet]]
field = "year"
operator = "OR"

[[facet]]
field = "stats.year"

[predefined_filters]
type = {{ term = {{ type = "article" }} }}

{extra}
"#
    );
    fs::write(dir.join(".facet.toml"), config).unwrap();
}

/// Runs `facet compile` and parses its JSON output.
fn compile(dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = facet(dir)
        .current_dir(dir)
        .arg("compile")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

mod init {
    use super::*;

    #[test]
    fn creates_config_file() {
        let dir = temp_dir();
        facet(dir.path())
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created"));

        let contents = fs::read_to_string(dir.path().join(".facet.toml")).unwrap();
        assert!(contents.contains("# [[facet]]"));
    }

    #[test]
    fn fails_if_config_exists() {
        let dir = temp_dir();
        fs::write(dir.path().join(".facet.toml"), "existing").unwrap();

        facet(dir.path())
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn force_overwrites_invalid_config() {
        let dir = temp_dir();
        fs::write(dir.path().join(".facet.toml"), "not [valid toml").unwrap();

        facet(dir.path())
            .current_dir(dir.path())
            .args(["init", "--force"])
            .assert()
            .success();
    }
}

mod check {
    use super::*;

    #[test]
    fn no_config_is_fine() {
        let dir = temp_dir();
        facet(dir.path())
            .current_dir(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("No configuration files found"));
    }

    #[test]
    fn reports_warnings() {
        let dir = temp_dir();
        write_config(dir.path(), "");
        facet(dir.path())
            .current_dir(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("no backend url is configured"))
            .stdout(predicate::str::contains("nested in stats"));
    }

    #[test]
    fn invalid_config_fails() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".facet.toml"),
            "[[facet]]\nfield = \"a\"\n\n[[facet]]\nfield = \"a\"\n",
        )
        .unwrap();
        facet(dir.path())
            .current_dir(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }
}

mod config {
    use super::*;

    #[test]
    fn prints_effective_settings() {
        let dir = temp_dir();
        write_config(dir.path(), "[paging]\nsize = 25\n");
        facet(dir.path())
            .current_dir(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("size = 25"))
            .stdout(predicate::str::contains("[search]"));
    }
}

mod compile {
    use super::*;

    #[test]
    fn empty_selection_keeps_predefined_filter() {
        let dir = temp_dir();
        write_config(dir.path(), "");
        let doc = compile(dir.path(), &[]);
        assert_eq!(
            doc["query"],
            serde_json::json!({"bool": {"must": [{"term": {"type": "article"}}]}})
        );
        assert!(doc["facets"]["size"]["terms"].is_object());
    }

    #[test]
    fn or_selections_become_one_should_group() {
        let dir = temp_dir();
        write_config(dir.path(), "");
        let doc = compile(dir.path(), &["-f", "size=S", "-f", "size=M", "--or", "size"]);
        assert_eq!(
            doc["query"]["filtered"]["filter"],
            serde_json::json!({"bool": {"should": [
                {"term": {"size": "S"}},
                {"term": {"size": "M"}}
            ]}})
        );
    }

    #[test]
    fn nested_selections_share_one_wrapper() {
        let dir = temp_dir();
        write_config(dir.path(), "");
        let doc = compile(dir.path(), &["-f", "stats.year=2001", "-f", "stats.year=2002"]);
        let must = doc["query"]["bool"]["must"].as_array().unwrap();
        let nested: Vec<_> = must.iter().filter(|c| c.get("nested").is_some()).collect();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0]["nested"]["path"], "stats");
    }

    #[test]
    fn unknown_range_field_fails() {
        let dir = temp_dir();
        write_config(dir.path(), "");
        facet(dir.path())
            .current_dir(dir.path())
            .args(["compile", "--range", "price=1..2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not a configured facet"));
    }

    #[test]
    fn share_link_round_trips_through_decompile() {
        let dir = temp_dir();
        write_config(dir.path(), "");
        let output = facet(dir.path())
            .current_dir(dir.path())
            .args([
                "compile",
                "-f",
                "size=XL",
                "--from",
                "20",
                "--share",
                "https://example.org/search",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());
        let link = String::from_utf8(output.stdout).unwrap();
        assert!(link.starts_with("https://example.org/search?source="));

        let output = facet(dir.path())
            .current_dir(dir.path())
            .args(["decompile", "--json", link.trim()])
            .output()
            .unwrap();
        assert!(output.status.success());
        let decoded: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(decoded["state"]["paging"]["from"], 20);
        assert_eq!(decoded["state"]["selections"][0]["value"], "XL");
        assert_eq!(decoded["state"]["selections"].as_array().unwrap().len(), 1);
    }
}

mod decompile {
    use super::*;

    #[test]
    fn prints_selection_table() {
        let dir = temp_dir();
        write_config(dir.path(), "");
        facet(dir.path())
            .current_dir(dir.path())
            .args([
                "decompile",
                r#"{"query":{"bool":{"must":[{"term":{"size":"S"}},{"query_string":{"query":"einstein"}}]}}}"#,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("einstein"))
            .stdout(predicate::str::contains("size"));
    }

    #[test]
    fn link_without_source_fails() {
        let dir = temp_dir();
        facet(dir.path())
            .current_dir(dir.path())
            .args(["decompile", "https://example.org/?q=1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no source parameter"));
    }
}

mod search {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, query_param_contains},
    };

    use super::*;

    #[test]
    fn requires_backend_url() {
        let dir = temp_dir();
        write_config(dir.path(), "");
        facet(dir.path())
            .current_dir(dir.path())
            .arg("search")
            .assert()
            .failure()
            .stderr(predicate::str::contains("no backend url configured"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn prints_records_and_facets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param_contains("source", "\"size\":\"S\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": {"total": 1, "hits": [{"_source": {"title": "Relativity"}}]},
                "facets": {"size": {"terms": [{"term": "S", "count": 1}], "missing": 0}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        write_config(
            dir.path(),
            &format!("[backend]\nurl = \"{}/search\"\n", server.uri()),
        );

        tokio::task::spawn_blocking(move || {
            facet(dir.path())
                .current_dir(dir.path())
                .args(["search", "-f", "size=S"])
                .assert()
                .success()
                .stdout(predicate::str::contains("Relativity"))
                .stdout(predicate::str::contains("Showing 1-1 of 1"))
                .stdout(predicate::str::contains("Size"));
        })
        .await
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn backend_error_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let dir = temp_dir();
        write_config(dir.path(), &format!("[backend]\nurl = \"{}\"\n", server.uri()));

        tokio::task::spawn_blocking(move || {
            facet(dir.path())
                .current_dir(dir.path())
                .arg("search")
                .assert()
                .failure()
                .stderr(predicate::str::contains("backend returned 500"));
        })
        .await
        .unwrap();
    }
}
