use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "pfabric-sim-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const TWO_FLOWS: &str = r#"
{
    "topology": { "num_leaves": 2, "num_spines": 1, "ports_per_leaf": 2, "port_capacity": 100.0 },
    "method": "pfabric",
    "flows": [
        { "id": 2, "src": 0, "dst": 1, "size_bytes": 3000, "arrival": 0.0 },
        { "id": 1, "src": 0, "dst": 1, "size_bytes": 1000, "arrival": 0.0 }
    ]
}
"#;

fn fct_lines(stdout: &str) -> Vec<Vec<String>> {
    stdout
        .lines()
        .filter(|line| line.starts_with("flow_fct "))
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}

#[test]
fn flow_sim_prints_completions_sorted_by_flow_id() {
    let dir = unique_temp_dir("flow-sim-stdout");
    let scenario = write_file(&dir, "scenario.json", TWO_FLOWS);

    let output = Command::new(env!("CARGO_BIN_EXE_flow_sim"))
        .args(["--scenario", scenario.to_str().unwrap(), "--quiet"])
        .output()
        .expect("run flow_sim");
    assert!(
        output.status.success(),
        "flow_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines = fct_lines(&stdout);
    assert_eq!(lines.len(), 2, "stdout={stdout}");
    assert_eq!(lines[0][1], "1");
    assert_eq!(lines[1][1], "2");

    let first: f64 = lines[0][2].parse().expect("completion time");
    let second: f64 = lines[1][2].parse().expect("completion time");
    assert!((first - 5.0).abs() < 1e-6, "flow 1 completion {first}");
    assert!((second - 20.0).abs() < 1e-6, "flow 2 completion {second}");
    assert_eq!(lines[1][3], "3000");
    assert!(
        stdout.lines().any(|l| l.starts_with("done events=") && l.contains("flows=2")),
        "missing done line: {stdout}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn flow_sim_method_override_and_json_output() {
    let dir = unique_temp_dir("flow-sim-json");
    let scenario = write_file(&dir, "scenario.json", TWO_FLOWS);
    let out_json = dir.join("fct.json");

    let output = Command::new(env!("CARGO_BIN_EXE_flow_sim"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--method",
            "maxmin",
            "--json",
            out_json.to_str().unwrap(),
            "--quiet",
        ])
        .output()
        .expect("run flow_sim");
    assert!(
        output.status.success(),
        "flow_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let raw = fs::read_to_string(&out_json).expect("read fct.json");
    let v: Value = serde_json::from_str(&raw).expect("parse fct.json");
    let arr = v.as_array().expect("fct.json must be a JSON array");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0].get("flow_id").and_then(Value::as_u64), Some(1));
    let completion = arr[0]
        .get("completion_time")
        .and_then(Value::as_f64)
        .expect("completion_time");
    // Fair share: flow 1 runs at half the link until it finishes.
    assert!((completion - 10.0).abs() < 1e-6, "completion {completion}");
    assert_eq!(arr[1].get("spine").and_then(Value::as_u64), Some(0));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn flow_sim_rejects_unknown_method() {
    let dir = unique_temp_dir("flow-sim-bad-method");
    let scenario = write_file(&dir, "scenario.json", TWO_FLOWS);

    let output = Command::new(env!("CARGO_BIN_EXE_flow_sim"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--method",
            "lottery",
            "--quiet",
        ])
        .output()
        .expect("run flow_sim");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unsupported scheduling method"),
        "stderr={stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}
