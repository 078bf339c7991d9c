use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    xdg_runtime: PathBuf,
    study: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let xdg_runtime = base.join("xdg-runtime");
        let study = base.join("study");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(xdg_config.join("dsqi")).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");
        fs::create_dir_all(&xdg_runtime).expect("failed to create XDG_RUNTIME_DIR");

        write_config(&xdg_config.join("dsqi/config.toml"));
        seed_study(&study);

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
            xdg_runtime,
            study,
        }
    }

    fn read_json(&self, relative: &str) -> Value {
        let path = self.study.join(relative);
        let text = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
        serde_json::from_str(&text).expect("record is not valid JSON")
    }
}

/// No WakaTime, and a line-count tool that never exists.
fn write_config(path: &Path) {
    fs::write(
        path,
        r#"
[line_count]
candidates = [["dsqi-no-such-line-counter"]]
timeout_secs = 5

[time_tracking]
enabled = false

[logging]
level = "debug"
"#,
    )
    .expect("failed to write config");
}

fn seed_study(study: &Path) {
    let data = study.join("data");
    fs::create_dir_all(&data).expect("failed to create data dir");
    fs::write(
        data.join("artifact-registry.json"),
        r#"{
  "study": {
    "title": "Disposable software in CS education",
    "current_phase": "planning",
    "target_journal": "Computers & Education"
  },
  "artifacts": [
    {"id": 1, "slug": "01-unit-testing-gauntlet", "name": "Unit Testing Gauntlet", "status": "not-started"},
    {"id": 2, "slug": "02-big-o-race", "name": "Big-O Race", "status": "not-started"}
  ]
}
"#,
    )
    .expect("failed to seed registry");

    let src = study.join("artifacts/01-unit-testing-gauntlet/src");
    fs::create_dir_all(&src).expect("failed to create source dir");
    fs::write(
        src.join("index.html"),
        "<!doctype html>\n<html>\n<body>\n<script src=\"game.js\"></script>\n</body>\n</html>\n",
    )
    .expect("failed to write index.html");
    fs::write(
        src.join("game.js"),
        "function check(answer) {\n  if (answer === 42 && ready) {\n    return 'pass';\n  }\n  return 'fail';\n}\n",
    )
    .expect("failed to write game.js");
}

fn run_bin(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> Output {
    let bin_path = match bin_name {
        "dsqi-session-start" => PathBuf::from(assert_cmd::cargo::cargo_bin!("dsqi-session-start")),
        "dsqi-session-close" => PathBuf::from(assert_cmd::cargo::cargo_bin!("dsqi-session-close")),
        "dsqi-collect" => PathBuf::from(assert_cmd::cargo::cargo_bin!("dsqi-collect")),
        "dsqi-status" => PathBuf::from(assert_cmd::cargo::cargo_bin!("dsqi-status")),
        "dsqi-validate" => PathBuf::from(assert_cmd::cargo::cargo_bin!("dsqi-validate")),
        _ => panic!("unsupported binary in test harness: {bin_name}"),
    };

    let mut command = Command::new(bin_path);

    command
        .args(args)
        .arg("--root")
        .arg(&env.study)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env("XDG_RUNTIME_DIR", &env.xdg_runtime)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute {bin_name}: {e}"))
}

fn assert_success(bin_name: &str, args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "{bin_name} {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_ok(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> String {
    let output = run_bin(env, bin_name, args);
    assert_success(bin_name, args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn session_lifecycle_and_collection() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, "dsqi-session-start", &["--artifact", "1"]);
    assert!(stdout.contains("Session started"), "got:\n{stdout}");
    assert!(stdout.contains("GitHub Copilot"));

    let registry = env.read_json("data/artifact-registry.json");
    assert_eq!(registry["study"]["current_phase"], "development");
    assert_eq!(registry["artifacts"][0]["status"], "in-development");
    assert_eq!(registry["study"]["target_journal"], "Computers & Education");

    let close_args = [
        "--artifact",
        "1",
        "--final",
        "--skip-wakatime",
        "--ai-ratio",
        "0.5",
        "--tech",
        "HTML, JavaScript",
    ];
    let stdout = run_ok(&env, "dsqi-session-close", &close_args);
    assert!(stdout.contains("Session 1 closed"), "got:\n{stdout}");
    assert!(stdout.contains("game.js"));
    assert!(stdout.contains("Total lines: 12"));

    let sessions = env.read_json("data/development-logs/sessions-01-unit-testing-gauntlet.json");
    let session = &sessions[0];
    assert_eq!(session["closed"], true);
    assert_eq!(session["total_lines"], 12);
    assert_eq!(session["ai_generated_lines"], 6);
    assert_eq!(session["human_written_lines"], 6);
    assert!(session["prompts"].is_array());

    let registry = env.read_json("data/artifact-registry.json");
    let artifact = &registry["artifacts"][0];
    assert_eq!(artifact["status"], "developed");
    assert_eq!(artifact["development"]["dependency_count"], 0);
    assert_eq!(artifact["tech_stack"], serde_json::json!(["HTML", "JavaScript"]));

    let output = run_bin(&env, "dsqi-collect", &["--artifact", "1"]);
    assert_success("dsqi-collect", &["--artifact", "1"], &output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("DSQI = 0.3×(1-M) + 0.2×(1-C) + 0.3×P + 0.2×E"));
    assert!(stdout.contains("GitHub Pages (static)"));
    assert!(stderr.contains("no line-count tool produced output"));

    let result = env.read_json("data/evaluations/layer1-dsqi/dsqi-01-unit-testing-gauntlet.json");
    assert_eq!(result["artifact_id"], 1);
    assert_eq!(result["maintenance_cost"]["deployment_steps"], 3);
    assert_eq!(result["creation_cost"]["ai_generation_ratio"], 0.5);
    assert!(result["dsqi_score"].is_null());
    assert!(env
        .study
        .join("data/static-analysis/01-unit-testing-gauntlet/complexity.json")
        .is_file());
    assert!(!env
        .study
        .join("data/static-analysis/01-unit-testing-gauntlet/cloc-output.json")
        .exists());

    let stdout = run_ok(&env, "dsqi-status", &[]);
    assert!(stdout.contains("Disposable software in CS education"));
    assert!(stdout.contains("Unit Testing Gauntlet"));
    assert!(stdout.contains("developed"));
    assert!(stdout.contains("not-started"));

    let stdout = run_ok(&env, "dsqi-validate", &[]);
    assert!(stdout.contains("✓ data/artifact-registry.json"), "got:\n{stdout}");
    assert!(stdout.contains("All 3 file(s) valid."));
}

#[test]
fn unknown_artifact_is_rejected() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, "dsqi-session-start", &["--artifact", "9"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("artifact 9 not found"), "got:\n{stderr}");

    let registry = env.read_json("data/artifact-registry.json");
    assert_eq!(registry["study"]["current_phase"], "planning");
}

#[test]
fn close_without_session_log_fails() {
    let env = CliTestEnv::new();

    let args = ["--artifact", "1", "--skip-wakatime"];
    let output = run_bin(&env, "dsqi-session-close", &args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no session log"), "got:\n{stderr}");
}

#[test]
fn collect_requires_source_directory() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, "dsqi-collect", &["--artifact", "2"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("source directory not found"), "got:\n{stderr}");
    assert!(!env
        .study
        .join("data/evaluations/layer1-dsqi/dsqi-02-big-o-race.json")
        .exists());
}

#[test]
fn validate_reports_inconsistent_registry() {
    let env = CliTestEnv::new();
    fs::write(
        env.study.join("data/artifact-registry.json"),
        r#"{"study": {"title": "t"}, "artifacts": [
            {"id": 1, "slug": "01-a", "name": "A", "status": "developed"},
            {"id": 1, "slug": "01-a", "name": "A again"}
        ]}"#,
    )
    .expect("failed to rewrite registry");

    let output = run_bin(&env, "dsqi-validate", &["--target", "registry"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✗ data/artifact-registry.json"), "got:\n{stdout}");
    assert!(stdout.contains("duplicate id"));
    assert!(stdout.contains("developed without a start date"));
}
