use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway data root plus helpers for driving the binary against it.
pub struct TestEnv {
    dir: TempDir,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A `tally` command scoped to this data root, with ambient owner and
    /// config environment cleared.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tally").expect("tally binary");
        cmd.env("TALLY_DATA_DIR", self.dir.path());
        cmd.env_remove("TALLY_OWNER");
        cmd.env_remove("TALLY_CONFIG");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Same, with `--owner` preset.
    pub fn cmd_as(&self, owner: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["--owner", owner]);
        cmd
    }

    pub fn tasks_file(&self, owner: &str) -> PathBuf {
        self.dir
            .path()
            .join("owners")
            .join(owner)
            .join("tasks.json")
    }

    pub fn seq_file(&self, owner: &str) -> PathBuf {
        self.dir.path().join("owners").join(owner).join("seq.json")
    }

    /// Raw task records for an owner, empty when none were written.
    pub fn read_tasks(&self, owner: &str) -> Vec<serde_json::Value> {
        let path = self.tasks_file(owner);
        if !path.exists() {
            return Vec::new();
        }
        let raw = fs::read_to_string(path).expect("read tasks.json");
        serde_json::from_str(&raw).expect("parse tasks.json")
    }

    /// Add one task with fixed times and return its opaque id.
    pub fn add_task(&self, owner: &str, title: &str) -> String {
        self.cmd_as(owner)
            .args([
                "add",
                title,
                "--start",
                "2024-01-01T00:00:00Z",
                "--end",
                "2024-01-01T06:00:00Z",
            ])
            .assert()
            .success();

        let tasks = self.read_tasks(owner);
        tasks
            .iter()
            .find(|task| task["title"] == title)
            .and_then(|task| task["id"].as_str())
            .expect("created task id")
            .to_string()
    }
}
