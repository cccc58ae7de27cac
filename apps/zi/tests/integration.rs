//! Integration tests for zi CLI

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use zi_catalog::CatalogDocument;
use zi_types::{Dependency, Feed, Implementation, Stability, Version};

const APP: &str = "http://example.com/app";
const LIB: &str = "http://example.com/lib";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("store");
        std::fs::create_dir_all(&store).unwrap();
        std::fs::write(
            dir.path().join("zi.toml"),
            format!(
                "[paths]\nstore_roots = [{:?}]\ncatalog = {:?}\n",
                store.display().to_string(),
                dir.path().join("catalog.json").display().to_string()
            ),
        )
        .unwrap();

        let version = |v: &str| Version::parse(v).unwrap();
        let app = Implementation::new("app-1.0", version("1.0"))
            .with_stability(Stability::Stable)
            .with_main("bin/app")
            .with_size(10_000)
            .requires(Dependency::essential(LIB).with_range("1.0..!2.0".parse().unwrap()));
        let libs = ["0.9", "1.5", "2.1"].into_iter().map(|v| {
            Implementation::new(format!("lib-{v}"), version(v)).with_stability(Stability::Stable)
        });
        let document = CatalogDocument::new(vec![
            Feed::new(APP).with_implementation(app),
            libs.fold(Feed::new(LIB), Feed::with_implementation),
        ]);
        std::fs::write(
            dir.path().join("catalog.json"),
            document.to_json().unwrap(),
        )
        .unwrap();

        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cache(&self, id: &str) {
        std::fs::create_dir_all(self.path("store").join(id)).unwrap();
    }

    fn zi(&self, args: &[&str]) -> Output {
        zi_with_config(&self.path("zi.toml"), args)
    }
}

fn zi_with_config(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_zi"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("ZI_NETWORK_USE")
        .env_remove("ZI_HELP_WITH_TESTING")
        .env_remove("ZI_FRESHNESS")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute zi")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_zi"))
        .arg("--version")
        .output()
        .expect("Failed to execute zi");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("zi"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_zi"))
        .arg("--help")
        .output()
        .expect("Failed to execute zi");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Zero Install dependency solver"));
    assert!(stdout.contains("select"));
    assert!(stdout.contains("fetch"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_zi"))
        .arg("invalid-command")
        .output()
        .expect("Failed to execute zi");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_select_json() {
    let fixture = Fixture::new();
    let output = fixture.zi(&["--json", "select", APP]);
    assert!(output.status.success(), "{output:?}");

    let json = stdout_json(&output);
    assert_eq!(json["interface"], APP);
    assert_eq!(json["command"], "run");
    let selections = json["selections"].as_array().unwrap();
    assert_eq!(selections.len(), 2);
    assert_eq!(selections[1]["interface"], LIB);
    assert_eq!(selections[1]["implementation"]["id"], "lib-1.5");
}

#[test]
fn test_select_table() {
    let fixture = Fixture::new();
    fixture.cache("app-1.0");
    let output = fixture.zi(&["select", APP]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(LIB));
    assert!(stdout.contains("1.5"));
    assert!(stdout.contains("cached"));
    assert!(stdout.contains("download"));
}

#[test]
fn test_offline_needs_cached_implementations() {
    let fixture = Fixture::new();
    let output = fixture.zi(&["select", "--offline", APP]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));

    fixture.cache("app-1.0");
    fixture.cache("lib-0.9");
    fixture.cache("lib-1.5");
    let output = fixture.zi(&["--json", "select", "--offline", APP]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_json(&output)["selections"][1]["implementation"]["id"],
        "lib-1.5"
    );
}

#[test]
fn test_unknown_interface_fails() {
    let fixture = Fixture::new();
    let output = fixture.zi(&["--json", "select", "http://example.com/nothing"]);
    assert!(!output.status.success());
    let error = stdout_json(&output)["error"].as_str().unwrap().to_string();
    assert!(error.contains("http://example.com/nothing"));
}

#[test]
fn test_fetch_plan() {
    let fixture = Fixture::new();
    fixture.cache("lib-1.5");
    let output = fixture.zi(&["--json", "fetch", APP]);
    assert!(output.status.success(), "{output:?}");

    let json = stdout_json(&output);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "app-1.0");
    assert_eq!(json["total_bytes"], 10_000);

    let output = fixture.zi(&["fetch", APP]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Need to download 1 implementation (9.8 KB)"));
}

#[test]
fn test_previous_selections() {
    let fixture = Fixture::new();
    let saved = fixture.path("selections.json");
    let saved_arg = saved.to_str().unwrap();

    let output = fixture.zi(&["select", APP, "--output", saved_arg]);
    assert!(output.status.success(), "{output:?}");
    assert!(saved.exists());

    let output = fixture.zi(&["--json", "select", APP, "--previous", saved_arg]);
    assert!(output.status.success(), "{output:?}");
    let json = stdout_json(&output);
    assert_eq!(json["changes"].as_array().unwrap().len(), 0);
    assert_eq!(json["selections"]["interface"], APP);
}

#[test]
fn test_config_get_and_set() {
    let fixture = Fixture::new();

    let output = fixture.zi(&["config", "freshness"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "30d");

    let output = fixture.zi(&["config", "help_with_testing", "TRUE"]);
    assert!(output.status.success(), "{output:?}");

    let output = fixture.zi(&["--json", "config"]);
    let json = stdout_json(&output);
    assert_eq!(json["help_with_testing"], "true");
    assert_eq!(json["network_use"], "full");

    let output = fixture.zi(&["config", "no_such_setting"]);
    assert!(!output.status.success());
}
