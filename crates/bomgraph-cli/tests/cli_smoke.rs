use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "bomgraph-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_bomgraph<I, S>(dir: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_bomgraph");
    Command::new(bin)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("bomgraph command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_bike(dir: &Path) {
    fs::write(
        dir.join("bike.bpo"),
        r#"
item "bike" {
  part_number = "B-100"
  from = [
    { ref = frame },
    { ref = wheel, qty = 2 },
  ]
}
item "frame" {}
item "wheel" {}
"#,
    )
    .expect("source should write");
}

#[test]
fn init_creates_catalog_layout() {
    let tmp = TempDirGuard::new("init");
    let output = run_bomgraph(tmp.path(), ["init"]);
    assert_success(&output);
    assert!(tmp.path().join(".bomgraph/objects").is_dir());
    assert!(tmp.path().join(".bomgraph/config.toml").is_file());
    assert!(stdout_text(&output).contains("bomgraph init .bomgraph"));
}

#[test]
fn bom_prints_csv_report_by_default() {
    let tmp = TempDirGuard::new("bom-csv");
    write_bike(tmp.path());
    let output = run_bomgraph(tmp.path(), ["bom", "bike.bpo", "bike"]);
    assert_success(&output);

    let text = stdout_text(&output);
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Part ID,Part Number,Name,Quantity"));
    assert!(text.lines().any(|line| line.ends_with(",B-100,bike,1.00")));
    assert!(text.lines().any(|line| line.ends_with(",wheel,2.00")));
    assert_eq!(text.lines().count(), 4);
}

#[test]
fn bom_json_and_tree_formats() {
    let tmp = TempDirGuard::new("bom-formats");
    write_bike(tmp.path());

    let output = run_bomgraph(tmp.path(), ["bom", "bike.bpo", "bike", "-o", "json"]);
    assert_success(&output);
    let json: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(json[".wheel"], 2.0);

    let output = run_bomgraph(tmp.path(), ["bom", "bike.bpo", "bike", "--output", "tree"]);
    assert_success(&output);
    assert_eq!(stdout_text(&output), ".bike x1\n  .frame x1\n  .wheel x2\n");
}

#[test]
fn build_writes_artifact_next_to_source() {
    let tmp = TempDirGuard::new("build");
    write_bike(tmp.path());
    let output = run_bomgraph(tmp.path(), ["build", "bike.bpo", "bike"]);
    assert_success(&output);

    let artifact = tmp.path().join("bike.bpc");
    let raw = fs::read_to_string(&artifact).expect("artifact should exist");
    let graph: Value = serde_json::from_str(&raw).expect("artifact json");
    assert_eq!(graph["items"].as_object().map(|items| items.len()), Some(3));
    assert_eq!(graph["nodes"].as_object().map(|nodes| nodes.len()), Some(3));
}

#[test]
fn commit_then_export_prints_edges() {
    let tmp = TempDirGuard::new("export");
    write_bike(tmp.path());
    assert_success(&run_bomgraph(tmp.path(), ["commit", "bike.bpo"]));

    let output = run_bomgraph(tmp.path(), ["--catalog", ".bomgraph", "export", "bike.bpo", "bike"]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().all(|line| line.len() == 129 && line.as_bytes()[64] == b':'));
}

#[test]
fn unknown_root_fails_without_artifact() {
    let tmp = TempDirGuard::new("missing");
    write_bike(tmp.path());
    let output = run_bomgraph(tmp.path(), ["build", "bike.bpo", "unicycle"]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
    assert!(!tmp.path().join("bike.bpc").exists());
}

#[test]
fn build_artifact_does_not_clobber_default_catalog() {
    let tmp = TempDirGuard::new("catalog-apart");
    write_bike(tmp.path());
    assert_success(&run_bomgraph(tmp.path(), ["build", "bike.bpo", "bike", "-o", ".bpc"]));
    assert!(tmp.path().join(".bpc").is_file());
    assert!(tmp.path().join(".bomgraph/objects").is_dir());

    let output = run_bomgraph(tmp.path(), ["export", "bike.bpo", "bike"]);
    assert_success(&output);
    assert_eq!(stdout_text(&output).lines().count(), 2);
}
