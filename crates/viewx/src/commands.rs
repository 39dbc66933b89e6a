use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::Args;
use serde_json::json;

use crate::dataset::Dataset;
use crate::error::{Result, ViewxError};
use crate::layout::{DashboardDocument, GridDocument, PdfDocument};
use crate::preview::{DEFAULT_PREVIEW_PORT, PreviewOptions};
use crate::process::{LaunchOptions, resolve_python};
use crate::util::{CliOutput, OutputIntegration, command_exists, ensure_exists, output_for, write_string};

#[derive(Debug, Clone, Args)]
pub struct GridArgs {
    /// Grid layout document (JSON).
    #[arg(long)]
    pub layout: PathBuf,

    /// CSV dataset for tables and charts.
    #[arg(long)]
    pub data: Option<PathBuf>,

    #[arg(long, default_value = "report.html")]
    pub output: PathBuf,

    /// Serve the exported report until Enter is pressed.
    #[arg(long)]
    pub serve: bool,

    #[arg(long, default_value_t = DEFAULT_PREVIEW_PORT)]
    pub port: u16,

    /// Open the served report in a browser.
    #[arg(long)]
    pub open: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DashboardArgs {
    /// Dashboard layout document (JSON).
    #[arg(long)]
    pub layout: PathBuf,

    /// CSV dataset embedded into the program.
    #[arg(long)]
    pub data: PathBuf,

    /// Write the generated program here instead of launching it.
    #[arg(long)]
    pub emit: Option<PathBuf>,

    #[arg(long)]
    pub headless: bool,

    #[arg(long)]
    pub port: Option<u16>,

    /// Interpreter with streamlit installed.
    #[arg(long)]
    pub python: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct PdfArgs {
    /// Report document (JSON).
    #[arg(long)]
    pub layout: PathBuf,

    /// Overrides the document's output directory.
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,

    #[arg(long, default_value = "report")]
    pub name: String,

    /// Write the .tex source without compiling.
    #[arg(long = "tex-only")]
    pub tex_only: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DoctorArgs {
    /// Interpreter to check instead of python3/python on PATH.
    #[arg(long)]
    pub python: Option<PathBuf>,
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    ensure_exists(path)?;
    let data = Dataset::from_csv_path(path)?;
    let (rows, columns) = data.shape();
    tracing::debug!(path = %path.display(), rows, columns, "dataset loaded");
    Ok(data)
}

pub fn run_grid(args: GridArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let ui = output_for(&integration);

    ensure_exists(&args.layout)?;
    let document = GridDocument::from_path(&args.layout)?;
    let data = args.data.as_deref().map(load_dataset).transpose()?;
    let report = document.build(data)?;

    if args.serve {
        let server = report.show(
            &args.output,
            &PreviewOptions {
                port: args.port,
                open_browser: args.open,
            },
        )?;
        let url = server.url_for(&args.output)?;
        ui.success(&format!("serving {url}"));
        if integration.should_emit_json() {
            println!(
                "{}",
                json!({ "command": "grid", "status": "serving", "url": url })
            );
        }
        ui.info("press Enter to stop");
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        server.stop();
        return Ok(());
    }

    let artifact = report.export(&args.output)?;
    ui.success(&format!(
        "wrote {} ({} bytes)",
        artifact.path.display(),
        artifact.bytes
    ));
    if integration.should_emit_json() {
        println!(
            "{}",
            json!({ "command": "grid", "status": "ok", "artifact": artifact })
        );
    }
    Ok(())
}

pub fn run_dashboard(args: DashboardArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let ui = output_for(&integration);

    ensure_exists(&args.layout)?;
    let document = DashboardDocument::from_path(&args.layout)?;
    let dashboard = document.build(load_dataset(&args.data)?)?;

    if let Some(emit) = &args.emit {
        write_string(emit, &dashboard.source())?;
        ui.success(&format!("wrote {}", emit.display()));
        if integration.should_emit_json() {
            println!(
                "{}",
                json!({ "command": "dashboard", "status": "ok", "program": emit.display().to_string() })
            );
        }
        return Ok(());
    }

    let mut run = dashboard.run(&LaunchOptions {
        python: args.python.clone(),
        port: args.port,
        headless: args.headless,
    })?;
    ui.success(&format!("dashboard running at {}", run.url()));
    ui.info(&format!("program: {}", run.app_file().display()));
    if integration.should_emit_json() {
        println!(
            "{}",
            json!({
                "command": "dashboard",
                "status": "running",
                "url": run.url(),
                "pid": run.process().pid(),
            })
        );
    }

    let status = run.process().wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(ViewxError::exit(
            status.code().unwrap_or(1),
            "dashboard runtime exited with an error",
        ))
    }
}

pub fn run_pdf(args: PdfArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let ui = output_for(&integration);

    ensure_exists(&args.layout)?;
    let document = PdfDocument::from_path(&args.layout)?;
    let mut config = document.config.clone();
    if let Some(out_dir) = &args.out_dir {
        config.out_dir.clone_from(out_dir);
    }
    let report = document.build_with(config)?;

    if args.tex_only {
        let tex_path = report.write_tex(&args.name)?;
        ui.success(&format!("wrote {}", tex_path.display()));
        if integration.should_emit_json() {
            println!(
                "{}",
                json!({ "command": "pdf", "status": "ok", "tex": tex_path.display().to_string() })
            );
        }
        return Ok(());
    }

    match report.build(&args.name) {
        Ok(output) => {
            ui.success(&format!("wrote {}", output.pdf_path.display()));
            if integration.should_emit_json() {
                println!("{}", json!({ "command": "pdf", "status": "ok", "output": output }));
            }
            Ok(())
        }
        Err(error) => {
            if let ViewxError::RenderFailure {
                log_path,
                diagnostic,
                ..
            } = &error
            {
                ui.error(&format!("see {}", log_path.display()));
                if let Some(diagnostic) = diagnostic {
                    ui.error(diagnostic);
                }
            }
            Err(error)
        }
    }
}

fn check_python(args: &DoctorArgs, ui: &CliOutput) -> (Option<PathBuf>, bool) {
    let python = match resolve_python(args.python.as_deref()) {
        Ok(python) => {
            ui.success(&format!("python: {}", python.display()));
            python
        }
        Err(error) => {
            ui.warning(&format!("{error} (dashboards cannot be launched)"));
            return (None, false);
        }
    };
    let streamlit = Command::new(&python)
        .args(["-m", "streamlit", "--version"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    if streamlit {
        ui.success("streamlit importable");
    } else {
        ui.warning("streamlit not importable (dashboards cannot be launched)");
    }
    (Some(python), streamlit)
}

pub fn run_doctor(args: DoctorArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let ui = output_for(&integration);

    ui.rule(Some("viewx doctor"));
    ui.info(&format!(
        "fastapi_output mode={} agent={} ci={} tty={}",
        integration.fastapi_mode,
        integration.fastapi_agent,
        integration.fastapi_ci,
        integration.fastapi_tty
    ));
    ui.info(&format!(
        "sqlmodel_console mode={} agent={}",
        integration.sqlmodel_mode, integration.sqlmodel_agent
    ));

    ui.rule(Some("dashboard runtime"));
    let (python, streamlit) = check_python(&args, &ui);

    ui.rule(Some("document compiler"));
    let pdflatex = command_exists("pdflatex");
    if pdflatex {
        ui.success("command available: pdflatex");
    } else {
        ui.warning("command missing: pdflatex (pdf builds disabled, --tex-only still works)");
    }

    if integration.should_emit_json() {
        println!(
            "{}",
            json!({
                "command": "doctor",
                "status": "ok",
                "python": python.map(|path| path.display().to_string()),
                "streamlit": streamlit,
                "pdflatex": pdflatex,
                "integration": integration,
            })
        );
    }
    Ok(())
}
