//! JSON layout documents read by the command-line front end.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{Align, Component};
use crate::dashboard::{DEFAULT_DASHBOARD_TITLE, Dashboard};
use crate::dataset::{Dataset, cell_text};
use crate::error::Result;
use crate::html_report::{DEFAULT_REPORT_TITLE, GridReport};
use crate::pdf_report::{ImageOptions, PdfConfig, PdfReport};
use crate::placement::Placement;
use crate::theme::{PageConfig, ThemeOverrides};

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str::<T>(&content)?)
}

fn components_from(values: &[Value]) -> Result<Vec<Component>> {
    values.iter().map(Component::from_json).collect()
}

// ── Grid report ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridItem {
    #[serde(flatten)]
    pub placement: Placement,
    pub component: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDocument {
    #[serde(default = "default_report_title")]
    pub title: String,
    pub rows: u32,
    pub cols: u32,
    pub slots: usize,
    #[serde(default)]
    pub theme: ThemeOverrides,
    #[serde(default)]
    pub items: Vec<GridItem>,
}

fn default_report_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}

impl GridDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        read_document(path)
    }

    /// Build the report, placing items in document order. The first invalid
    /// item aborts the build.
    pub fn build(&self, data: Option<Dataset>) -> Result<GridReport> {
        let mut report = GridReport::new(self.rows, self.cols, self.slots);
        report.title(self.title.clone()).theme(&self.theme);
        if let Some(data) = data {
            report.data(data);
        }
        for item in &self.items {
            report.place(Component::from_json(&item.component)?, &item.placement)?;
        }
        Ok(report)
    }
}

// ── Dashboard ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardDocument {
    #[serde(default = "default_dashboard_title")]
    pub title: String,
    #[serde(default = "default_title_align")]
    pub title_align: Align,
    #[serde(default)]
    pub theme: ThemeOverrides,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub custom_css: Option<String>,
    #[serde(default)]
    pub sidebar: Vec<Value>,
    #[serde(default)]
    pub components: Vec<Value>,
}

fn default_dashboard_title() -> String {
    DEFAULT_DASHBOARD_TITLE.to_string()
}

fn default_title_align() -> Align {
    Align::Center
}

impl DashboardDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        read_document(path)
    }

    pub fn build(&self, data: Dataset) -> Result<Dashboard> {
        let mut dashboard = Dashboard::new(data, self.title.clone());
        dashboard
            .title_align(self.title_align)
            .set_theme(&self.theme)
            .set_page(self.page);
        if let Some(css) = &self.custom_css {
            dashboard.set_custom_css(css.clone());
        }
        for component in components_from(&self.sidebar)? {
            dashboard.add_sidebar(component)?;
        }
        for component in components_from(&self.components)? {
            dashboard.add_component(component)?;
        }
        Ok(dashboard)
    }
}

// ── PDF report ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PdfBlock {
    Text {
        text: String,
        #[serde(default)]
        bold: bool,
    },
    Section {
        title: String,
    },
    Subsection {
        title: String,
    },
    Image {
        filename: String,
        #[serde(flatten)]
        options: ImageOptions,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<Value>>,
        #[serde(default)]
        caption: String,
    },
    Itemize {
        items: Vec<String>,
    },
    Enumerate {
        items: Vec<String>,
    },
    Code {
        code: String,
        #[serde(default = "default_language")]
        language: String,
    },
    BeginMulticols {
        #[serde(default = "default_columns")]
        columns: u32,
    },
    EndMulticols,
    #[serde(rename = "box")]
    ColorBox {
        title: String,
        content: String,
        #[serde(default)]
        color: Option<String>,
    },
    Plot {
        x: Vec<f64>,
        y: Vec<f64>,
        #[serde(default)]
        caption: String,
    },
    Multiplot {
        series: Vec<Series>,
        #[serde(default)]
        caption: String,
    },
    NewPage,
}

fn default_language() -> String {
    "python".to_string()
}

fn default_columns() -> u32 {
    2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfDocument {
    #[serde(default)]
    pub config: PdfConfig,
    #[serde(default)]
    pub blocks: Vec<PdfBlock>,
}

impl PdfDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        read_document(path)
    }

    /// Build with `config` in place of the document's own configuration.
    pub fn build_with(&self, config: PdfConfig) -> Result<PdfReport> {
        let mut report = PdfReport::new(config)?;
        for block in &self.blocks {
            apply_block(&mut report, block)?;
        }
        Ok(report)
    }

    pub fn build(&self) -> Result<PdfReport> {
        self.build_with(self.config.clone())
    }
}

fn apply_block(report: &mut PdfReport, block: &PdfBlock) -> Result<()> {
    match block {
        PdfBlock::Text { text, bold } => {
            report.add_text(text, *bold);
        }
        PdfBlock::Section { title } => {
            report.add_section(title);
        }
        PdfBlock::Subsection { title } => {
            report.add_subsection(title);
        }
        PdfBlock::Image { filename, options } => {
            report.add_image(filename, options)?;
        }
        PdfBlock::Table {
            headers,
            rows,
            caption,
        } => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
                .collect::<Vec<_>>();
            report.add_table(headers.as_slice(), rows.as_slice(), caption)?;
        }
        PdfBlock::Itemize { items } => {
            report.add_itemize(items.as_slice());
        }
        PdfBlock::Enumerate { items } => {
            report.add_enumerate(items.as_slice());
        }
        PdfBlock::Code { code, language } => {
            report.add_code(code, language);
        }
        PdfBlock::BeginMulticols { columns } => {
            report.begin_multicols(*columns);
        }
        PdfBlock::EndMulticols => {
            report.end_multicols()?;
        }
        PdfBlock::ColorBox {
            title,
            content,
            color,
        } => {
            report.add_box(title, content, color.as_deref());
        }
        PdfBlock::Plot { x, y, caption } => {
            report.add_plot(x, y, caption)?;
        }
        PdfBlock::Multiplot { series, caption } => {
            let series = series
                .iter()
                .map(|series| (series.x.clone(), series.y.clone()))
                .collect::<Vec<_>>();
            report.add_multiplot(&series, caption)?;
        }
        PdfBlock::NewPage => {
            report.new_page();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use crate::component::Component;
    use crate::dataset::Dataset;
    use crate::error::{PlacementError, ViewxError};
    use crate::pdf_report::PdfConfig;

    use super::{DashboardDocument, GridDocument, PdfDocument};

    fn data() -> Dataset {
        Dataset::new(
            vec!["x".into(), "y".into()],
            vec![vec![json!(1), json!(2)]],
        )
        .expect("dataset")
    }

    #[test]
    fn grid_document_places_items_with_default_span() {
        let doc: GridDocument = serde_json::from_value(json!({
            "rows": 2, "cols": 2, "slots": 2,
            "items": [
                {"slot": "div1", "row": 1, "col": 1, "component": {"type": "text", "text": "hi"}},
                {"slot": "div2", "row": 2, "col": 1, "width": 2,
                 "component": {"type": "plot", "kind": "scatter", "x": "x", "y": "y"}}
            ]
        }))
        .expect("document");
        let report = doc.build(Some(data())).expect("report");
        let rules = report.layout().css();
        assert!(rules.contains(".div1 { grid-area: 1 / 1 / 2 / 2; }"));
        assert!(rules.contains(".div2 { grid-area: 2 / 1 / 3 / 3; }"));
    }

    #[test]
    fn grid_document_surfaces_placement_errors() {
        let doc: GridDocument = serde_json::from_value(json!({
            "rows": 1, "cols": 1, "slots": 1,
            "items": [{"slot": "div9", "row": 1, "col": 1, "component": {"type": "text", "text": "x"}}]
        }))
        .expect("document");
        assert!(matches!(
            doc.build(None).err().expect("unknown slot"),
            ViewxError::Placement(PlacementError::UnknownSlot { .. })
        ));
    }

    #[test]
    fn dashboard_document_keeps_unknown_kinds() {
        let doc: DashboardDocument = serde_json::from_value(json!({
            "title": "Ops",
            "page": {"layout": "centered"},
            "components": [
                {"type": "metric", "label": "A", "value": 1},
                {"type": "gauge", "value": 3}
            ]
        }))
        .expect("document");
        let dashboard = doc.build(data()).expect("dashboard");
        assert_eq!(dashboard.components()[1], Component::placeholder("gauge"));
        assert!(dashboard.source().contains("layout=\"centered\""));
    }

    #[test]
    fn pdf_document_applies_blocks_in_order() {
        let dir = tempdir().expect("tempdir");
        let doc: PdfDocument = serde_json::from_value(json!({
            "blocks": [
                {"type": "section", "title": "Results"},
                {"type": "table", "headers": ["Model", "F1"], "rows": [["tree", 0.88]]},
                {"type": "begin_multicols"},
                {"type": "itemize", "items": ["a"]},
                {"type": "end_multicols"},
                {"type": "multiplot", "series": [{"x": [0, 1], "y": [0, 1]}, {"x": [0, 1], "y": [1, 0]}]},
                {"type": "new_page"}
            ]
        }))
        .expect("document");
        let report = doc
            .build_with(PdfConfig {
                out_dir: dir.path().to_path_buf(),
                ..PdfConfig::default()
            })
            .expect("report");
        let tex = report.to_latex().expect("latex");
        let section = tex.find("\\section{Results}").expect("section");
        let table = tex.find("tree & 0.88").expect("table");
        let multicols = tex.find("\\begin{multicols}{2}").expect("multicols");
        assert!(section < table && table < multicols);
        assert_eq!(tex.matches("\\addplot coordinates").count(), 2);
    }
}
