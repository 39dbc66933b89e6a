// SPDX-License-Identifier: Apache-2.0
//! Static grid report builder.
//!
//! A [`GridReport`] declares a CSS grid of `rows` x `cols` tracks and `slots`
//! named containers (`div1..divN`). Every builder call validates its
//! placement first; a rejected call leaves the report unchanged. Components
//! are kept as values and lowered at render time, so theme overrides applied
//! late still reach components added earlier.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::chart::{ChartRenderer, PlotlyRenderer};
use crate::component::{ChartKind, ChartSpec, Component, MetricSpec};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::markup::{MarkupLowering, TAB_SCRIPT};
use crate::placement::{GridLayout, Placement, slot_name};
use crate::preview::{PreviewOptions, PreviewServer};
use crate::process::open_browser;
use crate::theme::{Theme, ThemeOverrides};
use crate::util::{now_utc_iso, sha256_hex, write_string};

pub const DEFAULT_REPORT_TITLE: &str = "ViewX Report";

/// What `export` wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedArtifact {
    pub path: PathBuf,
    pub bytes: usize,
    pub sha256: String,
    pub exported_at: String,
}

pub struct GridReport {
    title: String,
    data: Option<Dataset>,
    theme: Theme,
    layout: GridLayout,
    slots: Vec<Vec<Component>>,
    renderer: Box<dyn ChartRenderer>,
}

impl GridReport {
    #[must_use]
    pub fn new(rows: u32, cols: u32, slots: usize) -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            data: None,
            theme: Theme::light(),
            layout: GridLayout::new(rows, cols, slots),
            slots: vec![Vec::new(); slots],
            renderer: Box::new(PlotlyRenderer),
        }
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn data(&mut self, data: Dataset) -> &mut Self {
        self.data = Some(data);
        self
    }

    pub fn theme(&mut self, overrides: &ThemeOverrides) -> &mut Self {
        self.theme.apply(overrides);
        self
    }

    pub fn renderer(&mut self, renderer: Box<dyn ChartRenderer>) -> &mut Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[must_use]
    pub fn dataset(&self) -> Option<&Dataset> {
        self.data.as_ref()
    }

    /// Components stored in `slot`, in append order.
    #[must_use]
    pub fn slot(&self, slot: &str) -> Option<&[Component]> {
        let index = self.layout.slot_index(slot)?;
        self.slots.get(index - 1).map(Vec::as_slice)
    }

    /// Validate `component` and `placement`, then append the component to
    /// the placement's slot.
    pub fn place(&mut self, component: Component, placement: &Placement) -> Result<&mut Self> {
        component.check(self.data.as_ref(), &ChartKind::ALL)?;
        self.layout.register(placement)?;
        if let Some(index) = self.layout.slot_index(&placement.slot) {
            tracing::debug!(slot = %placement.slot, kind = component.kind(), "component placed");
            self.slots[index - 1].push(component);
        }
        Ok(self)
    }

    pub fn add_valuebox(&mut self, valuebox: MetricSpec, placement: &Placement) -> Result<&mut Self> {
        self.place(Component::Metric(valuebox), placement)
    }

    pub fn add_plot(&mut self, chart: ChartSpec, placement: &Placement) -> Result<&mut Self> {
        self.place(Component::Chart(chart), placement)
    }

    pub fn add_table(
        &mut self,
        columns: Option<Vec<String>>,
        placement: &Placement,
    ) -> Result<&mut Self> {
        self.place(Component::table(columns), placement)
    }

    pub fn add_text(&mut self, content: impl Into<String>, placement: &Placement) -> Result<&mut Self> {
        self.place(Component::text(content), placement)
    }

    /// The complete document. Rendering the same state twice yields the same
    /// bytes.
    pub fn render(&self) -> Result<String> {
        let mut lowering =
            MarkupLowering::new(&self.theme, self.data.as_ref(), self.renderer.as_ref());
        let mut body = String::new();
        for (offset, components) in self.slots.iter().enumerate() {
            let fragments = components
                .iter()
                .map(|component| lowering.lower(component))
                .collect::<Result<Vec<_>>>()?;
            body.push_str(&format!(
                "<div class=\"{}\">{}</div>\n",
                slot_name(offset + 1),
                fragments.join("\n")
            ));
        }

        let mut html = String::new();
        html.push_str(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        html.push_str(&format!(
            "<title>{}</title>\n",
            v_htmlescape::escape(&self.title)
        ));
        if lowering.chart_count() > 0 {
            html.push_str(&self.renderer.head_markup());
            html.push('\n');
        }
        html.push_str("<style>\n");
        html.push_str(&self.stylesheet());
        html.push_str("</style>\n</head>\n<body>\n<div class=\"parent\">\n");
        html.push_str(&body);
        html.push_str("</div>\n");
        if lowering.tab_group_count() > 0 {
            html.push_str(TAB_SCRIPT);
            html.push('\n');
        }
        html.push_str("</body>\n</html>\n");
        Ok(html)
    }

    fn stylesheet(&self) -> String {
        let theme = &self.theme;
        let mut css = String::new();
        css.push_str(&format!(
            "html, body {{ margin: 0; padding: 0; height: 100%; background: {}; color: {}; font-family: ui-sans-serif, -apple-system, Segoe UI, Roboto, Arial, sans-serif; }}\n",
            theme.background, theme.text
        ));
        css.push_str(&format!(
            ".parent {{ display: grid; grid-template-columns: repeat({}, 1fr); grid-template-rows: repeat({}, 1fr); gap: 8px; padding: 8px; width: 100vw; height: 100vh; box-sizing: border-box; }}\n",
            self.layout.cols(),
            self.layout.rows()
        ));
        css.push_str(".parent > div { min-width: 0; min-height: 0; overflow: auto; }\n");
        let regions = self.layout.css();
        if !regions.is_empty() {
            css.push_str(&regions);
            css.push('\n');
        }
        css.push_str(&format!(
            ".vx-card {{ background: {}; border: 1px solid #dddddd; border-radius: 12px; padding: 10px; box-sizing: border-box; width: 100%; height: 100%; }}\n",
            theme.card
        ));
        css.push_str(".vx-table { overflow: auto; }\n");
        css.push_str("table { width: 100%; border-collapse: collapse; font-size: 13px; }\n");
        css.push_str("th, td { border: 1px solid #cccccc; padding: 6px; }\n");
        css.push_str(
            ".vx-valuebox { display: flex; align-items: center; gap: 15px; padding: 20px; border-radius: 15px; color: white; box-shadow: 0 3px 10px rgba(0,0,0,0.15); width: 100%; height: 100%; box-sizing: border-box; }\n",
        );
        css.push_str(".vx-valuebox-icon { font-size: 48px; min-width: 80px; }\n");
        css.push_str(".vx-valuebox-value { font-size: 28px; font-weight: bold; }\n");
        css.push_str(".vx-valuebox-label { opacity: 0.85; font-size: 18px; }\n");
        css.push_str(".vx-valuebox-delta { opacity: 0.85; font-size: 14px; }\n");
        css.push_str(".vx-chart { width: 100%; height: 100%; min-height: 240px; }\n");
        css.push_str(".vx-row { display: flex; gap: 12px; }\n");
        css.push_str(".vx-col { min-width: 0; }\n");
        css.push_str(&format!(
            ".vx-tab-bar {{ display: flex; gap: 4px; border-bottom: 1px solid {}; margin-bottom: 8px; }}\n",
            theme.primary
        ));
        css.push_str(&format!(
            ".vx-tab-button {{ background: none; border: none; padding: 6px 12px; cursor: pointer; color: {}; }}\n",
            theme.text
        ));
        css.push_str(&format!(
            ".vx-tab-button.active {{ border-bottom: 2px solid {}; font-weight: bold; }}\n",
            theme.primary
        ));
        css.push_str(".vx-expander summary { cursor: pointer; font-weight: bold; }\n");
        css.push_str(
            ".vx-placeholder { border: 1px dashed #e03131; color: #e03131; padding: 8px; border-radius: 8px; }\n",
        );
        css
    }

    /// Write the document to `path`, creating parent directories.
    pub fn export(&self, path: &Path) -> Result<ExportedArtifact> {
        let html = self.render()?;
        write_string(path, &html)?;
        let artifact = ExportedArtifact {
            path: path.to_path_buf(),
            bytes: html.len(),
            sha256: sha256_hex(html.as_bytes()),
            exported_at: now_utc_iso(),
        };
        tracing::info!(
            path = %artifact.path.display(),
            bytes = artifact.bytes,
            sha256 = %artifact.sha256,
            "grid report exported"
        );
        Ok(artifact)
    }

    /// Export to `path` and serve its directory. The server runs until the
    /// returned handle is stopped or dropped.
    pub fn show(&self, path: &Path, options: &PreviewOptions) -> Result<PreviewServer> {
        let artifact = self.export(path)?;
        let root = artifact
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let server = PreviewServer::start(root, options.port)?;
        let url = server.url_for(&artifact.path)?;
        tracing::info!(%url, "grid report preview ready");
        if options.open_browser
            && let Err(error) = open_browser(&url)
        {
            tracing::warn!(%error, %url, "could not open a browser");
        }
        Ok(server)
    }
}
