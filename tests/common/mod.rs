//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A temp workspace holding a config file and a fixture row store.
pub struct Workspace {
    pub dir: TempDir,
}

/// Parsed result of one `groceries` invocation.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub body: Value,
    pub stderr: String,
}

impl Workspace {
    pub fn new(ranges: Value) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("config.json"), r#"{"schema_version": 1}"#)
            .expect("write config");
        let fixture = serde_json::json!({ "ranges": ranges });
        std::fs::write(
            dir.path().join("rows.json"),
            serde_json::to_string_pretty(&fixture).expect("serialize fixture"),
        )
        .expect("write fixture");
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Current fixture contents, including recorded writes.
    #[allow(dead_code)]
    pub fn fixture(&self) -> Value {
        read_json(&self.path("rows.json"))
    }

    /// Run `groceries <command> --config .. --rows .. <args>`.
    pub fn run(&self, command: &str, args: &[&str]) -> RunResult {
        let output = Command::new(env!("CARGO_BIN_EXE_groceries"))
            .arg(command)
            .arg("--config")
            .arg(self.path("config.json"))
            .arg("--rows")
            .arg(self.path("rows.json"))
            .args(args)
            .env_remove("GROCERIES_CONFIG")
            .env_remove("GROCERIES_LM_COMMAND")
            .env_remove("GROCERIES_SPREADSHEET_ID")
            .env_remove("GROCERIES_LOG")
            .output()
            .expect("run groceries");
        RunResult::from_output(output)
    }
}

impl RunResult {
    fn from_output(output: Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let body = serde_json::from_str(stdout.trim()).unwrap_or(Value::Null);
        Self {
            success: output.status.success(),
            body,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).expect("read json");
    serde_json::from_str(&text).expect("parse json")
}
