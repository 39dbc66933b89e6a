//! Launching a generated dashboard against a stand-in interpreter.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

use serde_json::json;
use viewx::{Dashboard, Dataset, LaunchOptions, MetricSpec};

fn fake_python(dir: &Path) -> std::path::PathBuf {
    let script = dir.join("python");
    std::fs::write(&script, "#!/bin/sh\necho \"$@\" > \"$0.args\"\nexec sleep 30\n")
        .expect("write script");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        .expect("chmod");
    script
}

fn wait_for(path: &Path) -> String {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(text) = std::fs::read_to_string(path)
            && !text.is_empty()
        {
            return text;
        }
        assert!(Instant::now() < deadline, "{} never appeared", path.display());
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn run_writes_program_launches_runtime_and_cleans_up() {
    let bin = tempfile::tempdir().expect("bin dir");
    let python = fake_python(bin.path());

    let data = Dataset::new(vec!["x".into()], vec![vec![json!(1)], vec![json!(2)]])
        .expect("dataset");
    let mut dashboard = Dashboard::new(data, "Launch");
    dashboard.add_metric(MetricSpec::new("Rows", 2));

    let options = LaunchOptions {
        python: Some(python.clone()),
        port: Some(8765),
        headless: true,
    };
    let run = dashboard.run(&options).expect("launch");
    assert_eq!(run.url(), "http://localhost:8765");
    assert!(run.app_file().starts_with(run.dir()));

    let program = std::fs::read_to_string(run.app_file()).expect("program");
    assert_eq!(program, dashboard.source());
    assert!(program.contains("st.metric(\"Rows\", \"2\")"));

    let args = wait_for(&python.with_extension("args"));
    let expected = format!(
        "-m streamlit run {} --server.headless=true --server.port=8765",
        run.app_file().display()
    );
    assert_eq!(args.trim_end(), expected);

    let dir = run.dir().to_path_buf();
    run.terminate(Duration::from_secs(5)).expect("terminate");
    assert!(!dir.exists(), "temporary directory removed after terminate");
}
