//! Runs the `dealerflow` binary against a scratch store and session.

use std::path::PathBuf;
use std::process::{Command, Output};

use dealerflow::vehicle::CARS;
use dealerflow::{DocumentStore, SqliteStore};

struct Workspace(PathBuf);

impl Workspace {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("dealerflow-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn database(&self) -> PathBuf {
        self.0.join("dealerflow.db")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_dealerflow"))
            .arg("-c")
            .arg(self.0.join("config.toml"))
            .args(args)
            .env("DEALERFLOW_STORE__DATABASE_PATH", self.database())
            .env("DEALERFLOW_SESSION__SESSION_PATH", self.0.join("session.json"))
            .env("DEALERFLOW_PASSWORD", "lot-password")
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn started_car(ws: &Workspace, name: &str) -> String {
    let output = ws.run(&["new", name]);
    assert!(output.status.success(), "new failed: {}", stderr(&output));
    stdout(&output)
        .lines()
        .find_map(|line| line.strip_prefix("Started vehicle process "))
        .map(|id| id.trim().to_string())
        .unwrap()
}

#[tokio::test]
async fn sign_step_with_bad_step_fails_without_writing() {
    let ws = Workspace::new();
    let output = ws.run(&["signup", "boss@lot.example", "-o", "Pike Auto"]);
    assert!(output.status.success(), "signup failed: {}", stderr(&output));
    let car_id = started_car(&ws, "2016 Honda Civic");

    let output = ws.run(&["sign-step", &car_id, "9", "-i", "JD"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no step 9"), "stderr: {}", stderr(&output));
    assert!(!stderr(&output).contains("panicked"));

    let store = SqliteStore::open(ws.database()).unwrap();
    let record = store.get(CARS, &car_id).await.unwrap().unwrap();
    assert!(record.get("steps").is_none());
}

#[tokio::test]
async fn sign_step_saves_initials_for_a_real_step() {
    let ws = Workspace::new();
    let output = ws.run(&["signup", "boss@lot.example", "-o", "Pike Auto"]);
    assert!(output.status.success(), "signup failed: {}", stderr(&output));
    let car_id = started_car(&ws, "2016 Honda Civic");

    let output = ws.run(&["sign-step", &car_id, "3", "-i", "JD", "-d", "2024-05-01"]);
    assert!(output.status.success(), "sign-step failed: {}", stderr(&output));

    let store = SqliteStore::open(ws.database()).unwrap();
    let record = store.get(CARS, &car_id).await.unwrap().unwrap();
    assert_eq!(record["steps"][3]["initials"], "JD");
    assert_eq!(record["steps"][3]["date"], "2024-05-01");
}

#[test]
fn sign_step_without_initials_or_date_is_a_usage_error() {
    let ws = Workspace::new();
    let output = ws.run(&["sign-step", "any-car", "0"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!ws.database().exists());
}
