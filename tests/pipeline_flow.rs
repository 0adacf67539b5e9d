//! End-to-end flow over the CLI: setup, script generation, flag updates,
//! and status, all against a throwaway pipeline root.

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn acispipe(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_acispipe"))
        .args(args)
        .arg("--root")
        .arg(root)
        .output()
        .expect("run acispipe")
}

fn seed_cluster(root: &Path) {
    for obs in ["4977", "10434"] {
        std::fs::create_dir_all(root.join("cluster_data").join(obs)).expect("seed obs dir");
    }
}

#[test]
fn setup_merge_flag_status_round_trip() {
    let root = TempDir::new().expect("create temp root");
    seed_cluster(root.path());

    let setup = acispipe(
        root.path(),
        &[
            "setup",
            "--name",
            "Abell2029",
            "--sn-per-region",
            "10",
            "--smoothness",
            "0.1",
            "--cluster-dir",
            "cluster_data",
            "--parent-dir",
            "parent",
        ],
    );
    assert!(
        setup.status.success(),
        "setup failed: {}",
        String::from_utf8_lossy(&setup.stderr)
    );
    assert!(root.path().join("config.json").is_file());

    let merge = acispipe(root.path(), &["merge"]);
    assert!(
        merge.status.success(),
        "merge failed: {}",
        String::from_utf8_lossy(&merge.stderr)
    );
    let script = root
        .path()
        .join("parent/Abell2029/scripts/merge_data.sh");
    let text = std::fs::read_to_string(&script).expect("read merge script");
    assert!(text.contains("merge_obs @clean_evt.list"));
    assert!(text.trim_end().ends_with("merge_data"));

    let flag = acispipe(root.path(), &["flag", "merge_data"]);
    assert!(flag.status.success());
    assert!(String::from_utf8_lossy(&flag.stdout).contains("flag merge_data set"));

    let status = acispipe(root.path(), &["status", "--json"]);
    assert!(status.status.success());
    let doc: Value =
        serde_json::from_slice(&status.stdout).expect("status --json emits valid JSON");
    assert_eq!(doc["flags"]["merge_data"], Value::Bool(true));
    assert_eq!(doc["flags"]["flare_filtered"], Value::Bool(false));
    assert_eq!(doc["info_dict"]["name"], Value::String("Abell2029".into()));
}

#[test]
fn unknown_flag_fails_without_touching_the_config() {
    let root = TempDir::new().expect("create temp root");
    seed_cluster(root.path());
    let setup = acispipe(
        root.path(),
        &[
            "setup",
            "--name",
            "Abell2029",
            "--sn-per-region",
            "10",
            "--smoothness",
            "0.1",
            "--cluster-dir",
            "cluster_data",
            "--parent-dir",
            "parent",
        ],
    );
    assert!(setup.status.success());
    let before = std::fs::read(root.path().join("config.json")).expect("read config");

    let flag = acispipe(root.path(), &["flag", "no_such_stage"]);
    assert!(!flag.status.success());
    let message = format!(
        "{}{}",
        String::from_utf8_lossy(&flag.stdout),
        String::from_utf8_lossy(&flag.stderr)
    );
    assert!(message.contains("no_such_stage"), "got: {message}");

    let after = std::fs::read(root.path().join("config.json")).expect("reread config");
    assert_eq!(before, after);
}

#[test]
fn flag_requires_exactly_one_name() {
    let root = TempDir::new().expect("create temp root");

    let none = acispipe(root.path(), &["flag"]);
    assert!(!none.status.success());

    let two = acispipe(root.path(), &["flag", "merge_data", "flux_maps"]);
    assert!(!two.status.success());
}

#[test]
fn steps_without_a_config_fail_fast() {
    let root = TempDir::new().expect("create temp root");
    let merge = acispipe(root.path(), &["merge"]);
    assert!(!merge.status.success());
    let message = String::from_utf8_lossy(&merge.stderr);
    assert!(message.contains("acispipe setup"), "got: {message}");
}
