use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use tempfile::tempdir;

fn repo_json(url: &str, name: &str) -> String {
    format!(
        r#"{{"name": "{name}", "full_name": "test-org/{name}", "url": "{url}/repos/test-org/{name}", "html_url": null}}"#
    )
}

fn feedstock_index_cmd(api_url: &str) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("feedstock-index"));
    cmd.env_remove("GITHUB_TOKEN").arg("--api-url").arg(api_url);
    cmd
}

#[test]
fn test_end_to_end_build_feedstock_index() {
    let mut server = Server::new();
    let url = server.url();

    let listing = format!(
        "[{}, {}, {}, {}]",
        repo_json(&url, "numpy-feedstock"),
        repo_json(&url, "bob.io.image-feedstock"),
        repo_json(&url, "staged-recipes"),
        repo_json(&url, "gcc-feedstock"),
    );
    let _mock_repos = server
        .mock("GET", "/orgs/test-org/repos")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(listing)
        .create();

    let _mock_numpy = server
        .mock("GET", "/repos/test-org/numpy-feedstock/contents/recipe/meta.yaml")
        .with_status(200)
        .with_body(
            "{% set version = \"2.0.0\" %}\n\
             package:\n  name: NumPy\n  version: {{ version }}\n\
             requirements:\n  build:\n    - {{ compiler('c') }}\n",
        )
        .create();

    let _mock_bob = server
        .mock("GET", "/repos/test-org/bob.io.image-feedstock/contents/recipe/meta.yaml")
        .with_status(404)
        .create();

    let _mock_gcc = server
        .mock("GET", "/repos/test-org/gcc-feedstock/contents/recipe/meta.yaml")
        .with_status(200)
        .with_body("package:\n  name: {{ compiler('c') }}\n")
        .create();

    let _mock_staged = server
        .mock("GET", "/repos/test-org/staged-recipes/contents/recipe/meta.yaml")
        .expect(0)
        .create();

    let dir = tempdir().unwrap();
    let output = dir.path().join("index.json");

    feedstock_index_cmd(&url)
        .arg("build-feedstock-index")
        .arg(&output)
        .arg("--gh-org")
        .arg("test-org")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unable to parse meta.yaml for"))
        .stdout(predicate::str::contains("guessing pkg name from feedstock url"))
        .stdout(predicate::str::contains("feedstocks index written to"));

    _mock_staged.assert();

    let written = std::fs::read_to_string(&output).unwrap();
    let index: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(
        index,
        serde_json::json!({
            "numpy": "test-org/numpy-feedstock",
            "bob.io.image": "test-org/bob.io.image-feedstock",
            "compiler('c')": "test-org/gcc-feedstock",
        })
    );
    assert!(!dir.path().join("index.json.tmp").exists());
}

#[test]
fn test_build_feedstock_index_is_idempotent() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_repos = server
        .mock("GET", "/orgs/test-org/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(
            "[{}, {}]",
            repo_json(&url, "zlib-feedstock"),
            repo_json(&url, "abseil-feedstock")
        ))
        .create();

    let _mock_contents = server
        .mock(
            "GET",
            Matcher::Regex(r"^/repos/test-org/.*/contents/recipe/meta.yaml$".into()),
        )
        .with_status(404)
        .create();

    let dir = tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    for output in [&first, &second] {
        feedstock_index_cmd(&url)
            .arg("build-feedstock-index")
            .arg(output)
            .arg("--gh-org")
            .arg("test-org")
            .assert()
            .success();
    }

    let first = std::fs::read(&first).unwrap();
    let second = std::fs::read(&second).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        String::from_utf8(first).unwrap(),
        r#"{"abseil":"test-org/abseil-feedstock","zlib":"test-org/zlib-feedstock"}"#
    );
}

#[test]
fn test_build_feedstock_index_fails_on_server_error() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_repos = server
        .mock("GET", "/orgs/test-org/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!("[{}]", repo_json(&url, "foo-feedstock")))
        .create();

    let _mock_contents = server
        .mock("GET", "/repos/test-org/foo-feedstock/contents/recipe/meta.yaml")
        .with_status(500)
        .create();

    let dir = tempdir().unwrap();
    let output = dir.path().join("index.json");

    feedstock_index_cmd(&url)
        .arg("build-feedstock-index")
        .arg(&output)
        .arg("--gh-org")
        .arg("test-org")
        .assert()
        .failure()
        .stderr(predicate::str::contains("foo-feedstock"));

    assert!(!output.exists());
}

#[test]
fn test_build_feedstock_index_fails_on_unknown_org() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_repos = server
        .mock("GET", "/orgs/nobody/repos")
        .match_query(Matcher::Any)
        .with_status(404)
        .create();

    let dir = tempdir().unwrap();

    feedstock_index_cmd(&url)
        .arg("build-feedstock-index")
        .arg(dir.path().join("index.json"))
        .arg("--gh-org")
        .arg("nobody")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to list repositories of nobody"));
}

#[test]
fn test_build_feedstock_index_fails_on_unwritable_output() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_repos = server
        .mock("GET", "/orgs/test-org/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();

    feedstock_index_cmd(&url)
        .arg("build-feedstock-index")
        .arg("/nonexistent/dir/index.json")
        .arg("--gh-org")
        .arg("test-org")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to write package index"));
}

#[test]
fn test_cli_requires_filename() {
    let mut cmd = Command::new(cargo::cargo_bin!("feedstock-index"));
    cmd.arg("build-feedstock-index").assert().failure();
}
