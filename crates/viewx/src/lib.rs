#![forbid(unsafe_code)]

pub mod chart;
pub mod cli;
pub mod codegen;
pub mod commands;
pub mod component;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod html_report;
pub mod layout;
pub mod markup;
pub mod pdf_report;
pub mod placement;
pub mod preview;
pub mod process;
pub mod source;
pub mod theme;
pub mod util;

pub use chart::{ChartRenderer, PlotlyRenderer};
pub use cli::run_from_env;
pub use component::{ChartKind, ChartSpec, Component, MetricSpec, TextBlock};
pub use dashboard::{Dashboard, DashboardRun};
pub use dataset::Dataset;
pub use error::{ConstructionError, PlacementError, Result, ViewxError};
pub use html_report::{ExportedArtifact, GridReport};
pub use pdf_report::{PdfConfig, PdfReport};
pub use placement::{GridLayout, Placement, Region, validate_placement};
pub use preview::{PreviewOptions, PreviewServer};
pub use process::{DashboardProcess, LaunchOptions};
pub use theme::{PageConfig, Theme, ThemeOverrides};
