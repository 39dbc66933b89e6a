//! Child process plumbing: dashboard runtime processes, port picking and
//! browser launch.

use std::ffi::OsString;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::{Result, ViewxError};
use crate::util::resolve_command;

/// How long `terminate` waits for a killed child to be reaped.
pub const TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

const BROWSER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Interpreter running the dashboard; `python3`, then `python`, on `PATH`
    /// when unset.
    pub python: Option<PathBuf>,
    /// Port for the dashboard server; a free one is picked when unset.
    pub port: Option<u16>,
    /// Suppress the runtime's own browser launch.
    pub headless: bool,
}

/// Resolve the interpreter: an explicit path must exist or be on `PATH`.
pub fn resolve_python(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => which::which(path).map_err(|_| ViewxError::MissingCommand {
            command: path.display().to_string(),
        }),
        None => resolve_command(&["python3", "python"]),
    }
}

/// Ask the OS for a currently unused local port.
pub fn free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

/// Arguments after the interpreter for `python -m streamlit run`.
#[must_use]
pub fn streamlit_args(app_file: &Path, port: u16, headless: bool) -> Vec<OsString> {
    vec![
        OsString::from("-m"),
        OsString::from("streamlit"),
        OsString::from("run"),
        app_file.as_os_str().to_os_string(),
        OsString::from(format!("--server.headless={headless}")),
        OsString::from(format!("--server.port={port}")),
    ]
}

/// Owned handle to a spawned runtime. Dropping it kills and reaps the child.
#[derive(Debug)]
pub struct DashboardProcess {
    child: Option<Child>,
    command: String,
}

impl DashboardProcess {
    pub fn spawn(mut command: Command) -> Result<Self> {
        let label = format!(
            "{} {}",
            command.get_program().to_string_lossy(),
            command
                .get_args()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let child = command.spawn()?;
        tracing::info!(pid = child.id(), command = %label, "dashboard process started");
        Ok(Self {
            child: Some(child),
            command: label,
        })
    }

    /// Start `python -m streamlit run <app_file>` without waiting for the
    /// server to become ready.
    pub fn launch_streamlit(
        python: &Path,
        app_file: &Path,
        port: u16,
        headless: bool,
    ) -> Result<Self> {
        let mut command = Command::new(python);
        command
            .args(streamlit_args(app_file, port, headless))
            .stdin(Stdio::null());
        Self::spawn(command)
    }

    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Exit status if the child has already exited.
    pub fn try_status(&mut self) -> Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => Ok(child.try_wait()?),
            None => Ok(None),
        }
    }

    /// Block until the child exits on its own.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        let child = self.child.as_mut().ok_or_else(|| {
            ViewxError::invalid(format!("process already reaped: {}", self.command))
        })?;
        let status = child.wait()?;
        self.child = None;
        Ok(status)
    }

    /// Kill the child and wait up to `timeout` for it to be reaped.
    pub fn terminate(&mut self, timeout: Duration) -> Result<ExitStatus> {
        let Some(mut child) = self.child.take() else {
            return Err(ViewxError::invalid(format!(
                "process already reaped: {}",
                self.command
            )));
        };
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        let _ = child.kill();
        match child.wait_timeout(timeout)? {
            Some(status) => {
                tracing::info!(pid = child.id(), "dashboard process terminated");
                Ok(status)
            }
            None => {
                let pid = child.id();
                self.child = Some(child);
                tracing::warn!(pid, "dashboard process did not exit after kill");
                Err(ViewxError::ExternalCommandTimedOut {
                    command: self.command.clone(),
                    seconds: timeout.as_secs(),
                })
            }
        }
    }
}

impl Drop for DashboardProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && matches!(child.try_wait(), Ok(None))
        {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn browser_command(url: &str) -> Result<Command> {
    let command = if cfg!(target_os = "macos") {
        let mut command = Command::new(resolve_command(&["open"])?);
        command.arg(url);
        command
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new(resolve_command(&["cmd"])?);
        command.args(["/C", "start", "", url]);
        command
    } else {
        let mut command = Command::new(resolve_command(&["xdg-open", "gio", "sensible-browser"])?);
        if command.get_program().to_string_lossy().ends_with("gio") {
            command.arg("open");
        }
        command.arg(url);
        command
    };
    Ok(command)
}

/// Open `url` with the desktop's default browser.
pub fn open_browser(url: &str) -> Result<()> {
    let mut child = browser_command(url)?
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if child.wait_timeout(BROWSER_TIMEOUT)?.is_none() {
        // Some openers stay in the foreground with the browser; leave it running.
        tracing::debug!(url, "browser opener still running");
    }
    Ok(())
}
