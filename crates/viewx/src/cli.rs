use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::{
    DashboardArgs, DoctorArgs, GridArgs, PdfArgs, run_dashboard, run_doctor, run_grid, run_pdf,
};
use crate::error::Result;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "VIEWX_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "viewx",
    about = "Build grid reports, dashboards and PDF reports from tabular data",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export (and optionally serve) a static grid report.
    Grid(GridArgs),

    /// Generate a Streamlit program and launch it.
    Dashboard(DashboardArgs),

    /// Generate and compile a LaTeX report.
    Pdf(PdfArgs),

    /// Check external tools.
    Doctor(DoctorArgs),
}

/// Install the stderr subscriber; filter from `VIEWX_LOG`, default `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Grid(args) => run_grid(args),
        Commands::Dashboard(args) => run_dashboard(args),
        Commands::Pdf(args) => run_pdf(args),
        Commands::Doctor(args) => run_doctor(args),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use clap::Parser;
    use tempfile::tempdir;

    use crate::commands::{DashboardArgs, GridArgs, PdfArgs};
    use crate::error::ViewxError;

    use super::{Cli, Commands, run};

    const IRIS: &str = "sepal_length,species\n5.1,setosa\n6.3,virginica\n";

    #[test]
    fn parses_grid_flags() {
        let cli = Cli::try_parse_from([
            "viewx", "grid", "--layout", "l.json", "--data", "d.csv", "--serve", "--port", "8123",
        ])
        .expect("parse");
        let Commands::Grid(args) = cli.command else {
            panic!("expected grid");
        };
        assert_eq!(args.port, 8123);
        assert!(args.serve);
        assert!(!args.open);
        assert_eq!(args.output, PathBuf::from("report.html"));
    }

    #[test]
    fn grid_command_exports_report() {
        let dir = tempdir().expect("tempdir");
        let layout = dir.path().join("layout.json");
        let data = dir.path().join("iris.csv");
        let output = dir.path().join("out").join("report.html");
        fs::write(&data, IRIS).expect("csv");
        fs::write(
            &layout,
            r#"{"rows": 2, "cols": 2, "slots": 2, "items": [
                {"slot": "div1", "row": 1, "col": 1, "width": 2, "component": {"type": "table"}},
                {"slot": "div2", "row": 2, "col": 1, "component": {"type": "chart", "kind": "hist", "x": "sepal_length"}}
            ]}"#,
        )
        .expect("layout");

        run(Cli {
            command: Commands::Grid(GridArgs {
                layout,
                data: Some(data),
                output: output.clone(),
                serve: false,
                port: 0,
                open: false,
            }),
        })
        .expect("grid");
        let html = fs::read_to_string(output).expect("report");
        assert!(html.contains("virginica"));
        assert!(html.contains("\"type\":\"histogram\""));
    }

    #[test]
    fn grid_command_reports_missing_layout() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("nope.json");
        let err = run(Cli {
            command: Commands::Grid(GridArgs {
                layout: missing.clone(),
                data: None,
                output: dir.path().join("r.html"),
                serve: false,
                port: 0,
                open: false,
            }),
        })
        .expect_err("missing layout");
        match err {
            ViewxError::MissingPath { path } => assert_eq!(path, missing),
            other => panic!("expected MissingPath, got {other}"),
        }
    }

    #[test]
    fn dashboard_command_emits_program() {
        let dir = tempdir().expect("tempdir");
        let layout = dir.path().join("dash.json");
        let data = dir.path().join("iris.csv");
        let emit = dir.path().join("app.py");
        fs::write(&data, IRIS).expect("csv");
        fs::write(
            &layout,
            r#"{"title": "Iris", "components": [{"type": "plot", "kind": "scatter", "x": "sepal_length", "y": "sepal_length"}]}"#,
        )
        .expect("layout");

        run(Cli {
            command: Commands::Dashboard(DashboardArgs {
                layout,
                data,
                emit: Some(emit.clone()),
                headless: true,
                port: None,
                python: None,
            }),
        })
        .expect("dashboard");
        let program = fs::read_to_string(emit).expect("program");
        assert!(program.contains("fig = px.scatter(data, x=\"sepal_length\", y=\"sepal_length\")"));
    }

    #[test]
    fn dashboard_command_rejects_grid_only_kind() {
        let dir = tempdir().expect("tempdir");
        let layout = dir.path().join("dash.json");
        let data = dir.path().join("iris.csv");
        fs::write(&data, IRIS).expect("csv");
        fs::write(
            &layout,
            r#"{"components": [{"type": "plot", "kind": "pie", "x": "species", "y": "sepal_length"}]}"#,
        )
        .expect("layout");
        let err = run(Cli {
            command: Commands::Dashboard(DashboardArgs {
                layout,
                data,
                emit: Some(dir.path().join("app.py")),
                headless: true,
                port: None,
                python: None,
            }),
        })
        .expect_err("pie is not a dashboard kind");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn pdf_command_writes_tex_only() {
        let dir = tempdir().expect("tempdir");
        let layout = dir.path().join("report.json");
        fs::write(
            &layout,
            r#"{"config": {"title": "Demo"}, "blocks": [{"type": "text", "text": "hello"}]}"#,
        )
        .expect("layout");
        let out_dir = dir.path().join("output");

        run(Cli {
            command: Commands::Pdf(PdfArgs {
                layout,
                out_dir: Some(out_dir.clone()),
                name: "demo".to_string(),
                tex_only: true,
            }),
        })
        .expect("pdf");
        let tex = fs::read_to_string(out_dir.join("demo.tex")).expect("tex");
        assert!(tex.contains("\\title{Demo}"));
        assert!(tex.contains("hello"));
    }
}
