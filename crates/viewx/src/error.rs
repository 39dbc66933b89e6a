use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewxError>;

#[derive(Debug, Error)]
pub enum ViewxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid component: {0}")]
    Construction(#[from] ConstructionError),

    #[error("invalid placement: {0}")]
    Placement(#[from] PlacementError),

    #[error("resource '{name}' not found (searched: {})", display_paths(.searched))]
    MissingResource { name: String, searched: Vec<PathBuf> },

    #[error("document compiler failed: {command} (exit={exit_code}); see {}", .log_path.display())]
    RenderFailure {
        command: String,
        exit_code: i32,
        log_path: PathBuf,
        diagnostic: Option<String>,
    },

    #[error("missing dependency command: {command}")]
    MissingCommand { command: String },

    #[error("required path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("external command timed out: {command} ({seconds}s)")]
    ExternalCommandTimedOut { command: String, seconds: u64 },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

/// Bad input rejected by a component factory or builder call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("chart kind '{kind}' is not supported here")]
    UnsupportedChartKind { kind: String },

    #[error("column '{column}' does not exist in the dataset")]
    UnknownColumn { column: String },

    #[error("row has {widths} width ratios but {children} children")]
    RowArity { widths: usize, children: usize },

    #[error("{kind} needs at least one child region")]
    EmptyContainer { kind: &'static str },

    #[error("row width ratio at index {index} must be positive")]
    ZeroWidth { index: usize },

    #[error("tab label '{label}' is used more than once")]
    DuplicateTab { label: String },

    #[error("no dataset is bound to this builder")]
    NoData,

    #[error("dataset row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("plot needs matching coordinate lists (x={x}, y={y})")]
    CoordinateMismatch { x: usize, y: usize },

    #[error("multicols blocks are unbalanced ({open} left open)")]
    UnbalancedMulticols { open: usize },
}

/// A grid cell request that does not fit the declared grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("row and column start at 1 (got row={row}, col={col})")]
    OriginOutOfRange { row: u32, col: u32 },

    #[error("height and width must be at least 1 (got height={height}, width={width})")]
    EmptySpan { height: u32, width: u32 },

    #[error("block exceeds grid rows: {row} + {height} - 1 > {rows}")]
    RowOverflow { row: u32, height: u32, rows: u32 },

    #[error("block exceeds grid columns: {col} + {width} - 1 > {cols}")]
    ColumnOverflow { col: u32, width: u32, cols: u32 },

    #[error("slot '{slot}' does not exist")]
    UnknownSlot { slot: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ViewxError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::RenderFailure { exit_code, .. } => *exit_code,
            Self::Construction(_) | Self::Placement(_) | Self::InvalidArgument { .. } => 2,
            Self::ExternalCommandTimedOut { .. } => 124,
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
