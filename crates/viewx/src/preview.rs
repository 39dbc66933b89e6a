//! Local static file server for previewing exported reports.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use axum::Router;
use tokio::sync::oneshot;
use tower_http::services::ServeDir;

use crate::error::{Result, ViewxError};
use crate::util::{ensure_exists, relative_to};

pub const DEFAULT_PREVIEW_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Port on 127.0.0.1; 0 picks a free one.
    pub port: u16,
    pub open_browser: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PREVIEW_PORT,
            open_browser: true,
        }
    }
}

/// A running preview server. Serving stops on [`PreviewServer::stop`] or when
/// the value is dropped.
#[derive(Debug)]
pub struct PreviewServer {
    addr: SocketAddr,
    root: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PreviewServer {
    /// Bind `127.0.0.1:port` and serve `root` from a background thread. Bind
    /// errors are returned here, before any thread is spawned.
    pub fn start(root: &Path, port: u16) -> Result<Self> {
        ensure_exists(root)?;
        let root = root.canonicalize()?;

        let listener = std::net::TcpListener::bind(("127.0.0.1", port))?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let app = Router::new().fallback_service(ServeDir::new(&root));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("viewx-preview".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(error) => {
                        tracing::error!(%error, "failed to start preview runtime");
                        return;
                    }
                };
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(listener) => listener,
                        Err(error) => {
                            tracing::error!(%error, "failed to register preview listener");
                            return;
                        }
                    };
                    let served = axum::serve(listener, app)
                        .with_graceful_shutdown(async {
                            let _ = shutdown_rx.await;
                        })
                        .await;
                    if let Err(error) = served {
                        tracing::error!(%error, "preview server stopped with an error");
                    }
                });
            })?;

        tracing::info!(%addr, root = %root.display(), "preview server listening");
        Ok(Self {
            addr,
            root,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL serving `path`, which must live under the served root.
    pub fn url_for(&self, path: &Path) -> Result<String> {
        let path = path.canonicalize()?;
        let relative = relative_to(&self.root, &path)
            .filter(|relative| !relative.starts_with(".."))
            .ok_or_else(|| {
                ViewxError::invalid(format!(
                    "{} is outside the preview root {}",
                    path.display(),
                    self.root.display()
                ))
            })?;
        Ok(format!("http://{}/{}", self.addr, url_path(&relative)))
    }

    /// Signal graceful shutdown and wait for the serving thread.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!(addr = %self.addr, "preview thread panicked");
            } else {
                tracing::debug!(addr = %self.addr, "preview server stopped");
            }
        }
    }
}

/// Percent-encoded URL path for a path relative to the served root.
fn url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| {
            urlencoding::encode(&component.as_os_str().to_string_lossy()).into_owned()
        })
        .collect::<Vec<_>>()
        .join("/")
}

impl Drop for PreviewServer {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::url_path;

    #[test]
    fn url_path_encodes_each_segment() {
        assert_eq!(url_path(Path::new("out/report.html")), "out/report.html");
        assert_eq!(url_path(Path::new("a#b.html")), "a%23b.html");
        assert_eq!(url_path(Path::new("q?.html")), "q%3F.html");
        assert_eq!(url_path(Path::new("my dir/50%.html")), "my%20dir/50%25.html");
    }
}
