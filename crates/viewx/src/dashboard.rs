// SPDX-License-Identifier: Apache-2.0
//! Dashboard builder: accumulates components and generates a Streamlit
//! program.
//!
//! Every call that references the dataset validates immediately. The program
//! is regenerated from the accumulated state on each [`Dashboard::source`] or
//! [`Dashboard::run`], so repeated calls produce identical text.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use crate::chart::{ChartRenderer, PlotlyRenderer};
use crate::codegen::{Stmt, format_program, py_str};
use crate::component::{Align, ChartKind, ChartSpec, Component, MetricSpec, TextBlock};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::process::{DashboardProcess, LaunchOptions, free_port, resolve_python};
use crate::source::SourceLowering;
use crate::theme::{PageConfig, Theme, ThemeOverrides};
use crate::util::write_string;

pub const DEFAULT_DASHBOARD_TITLE: &str = "ViewX Dashboard";
pub const APP_FILE_NAME: &str = "viewx_app.py";
pub const FOOTER_CAPTION: &str = "Generated by ViewX";

const NESTED_TITLE_SIZE: &str = "20px";

pub struct Dashboard {
    data: Dataset,
    title: String,
    title_align: Align,
    theme: Theme,
    custom_css: Option<String>,
    page: PageConfig,
    components: Vec<Component>,
    sidebar: Vec<Component>,
    renderer: Box<dyn ChartRenderer>,
}

impl Dashboard {
    #[must_use]
    pub fn new(data: Dataset, title: impl Into<String>) -> Self {
        Self {
            data,
            title: title.into(),
            title_align: Align::Center,
            theme: Theme::dark(),
            custom_css: None,
            page: PageConfig::default(),
            components: Vec::new(),
            sidebar: Vec::new(),
            renderer: Box::new(PlotlyRenderer),
        }
    }

    #[must_use]
    pub fn data(&self) -> &Dataset {
        &self.data
    }

    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    #[must_use]
    pub fn sidebar(&self) -> &[Component] {
        &self.sidebar
    }

    pub fn title_align(&mut self, align: Align) -> &mut Self {
        self.title_align = align;
        self
    }

    pub fn set_theme(&mut self, overrides: &ThemeOverrides) -> &mut Self {
        self.theme.apply(overrides);
        self
    }

    pub fn set_custom_css(&mut self, css: impl Into<String>) -> &mut Self {
        self.custom_css = Some(css.into());
        self
    }

    pub fn set_page(&mut self, page: PageConfig) -> &mut Self {
        self.page = page;
        self
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn ChartRenderer>) -> &mut Self {
        self.renderer = renderer;
        self
    }

    // ── Top-level components ───────────────────────────────────────────

    /// Validate `component` (chart kinds, referenced columns) and append it.
    pub fn add_component(&mut self, component: Component) -> Result<&mut Self> {
        component.check(Some(&self.data), &ChartKind::BASIC)?;
        tracing::debug!(kind = component.kind(), "dashboard component added");
        self.components.push(component);
        Ok(self)
    }

    pub fn add_title(&mut self, title: impl Into<TextBlock>) -> &mut Self {
        self.components.push(Component::Title(title.into()));
        self
    }

    pub fn add_text(&mut self, text: impl Into<TextBlock>) -> &mut Self {
        self.components.push(Component::Text(text.into()));
        self
    }

    pub fn add_table(&mut self, columns: Option<Vec<String>>) -> Result<&mut Self> {
        self.add_component(Component::table(columns))
    }

    pub fn add_metric(&mut self, metric: MetricSpec) -> &mut Self {
        self.components.push(Component::Metric(metric));
        self
    }

    pub fn add_plot(&mut self, chart: ChartSpec) -> Result<&mut Self> {
        self.add_component(Component::Chart(chart))
    }

    pub fn add_row(&mut self, widths: Vec<u32>, children: Vec<Component>) -> Result<&mut Self> {
        let row = Component::row(widths, children)?;
        self.add_component(row)
    }

    pub fn add_tabs<I, L>(&mut self, tabs: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (L, Vec<Component>)>,
        L: Into<String>,
    {
        let tabs = Component::tabs(tabs)?;
        self.add_component(tabs)
    }

    pub fn add_expander(
        &mut self,
        label: impl Into<String>,
        expanded: bool,
        children: Vec<Component>,
    ) -> Result<&mut Self> {
        self.add_component(Component::expander(label, expanded, children))
    }

    /// Vertical space of `height` pixels.
    pub fn add_blank(&mut self, height: u32) -> &mut Self {
        self.components.push(Component::spacer(height));
        self
    }

    pub fn add_sidebar(&mut self, component: Component) -> Result<&mut Self> {
        component.check(Some(&self.data), &ChartKind::BASIC)?;
        self.sidebar.push(component);
        Ok(self)
    }

    // ── Nested component factories ─────────────────────────────────────

    #[must_use]
    pub fn comp_title(&self, text: impl Into<String>) -> Component {
        Component::Title(TextBlock::new(text).size(NESTED_TITLE_SIZE))
    }

    /// Paragraph with optional color and font size; unset values follow the
    /// theme.
    #[must_use]
    pub fn comp_text(
        &self,
        text: impl Into<String>,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Component {
        let mut block = TextBlock::new(text);
        block.color = color.map(str::to_string);
        block.size = size.map(str::to_string);
        Component::Text(block)
    }

    /// Table of `columns`; each name must exist in the dataset.
    pub fn comp_table(&self, columns: Option<Vec<String>>) -> Result<Component> {
        let table = Component::table(columns);
        table.check(Some(&self.data), &ChartKind::BASIC)?;
        Ok(table)
    }

    #[must_use]
    pub fn comp_metric(
        &self,
        label: impl Into<String>,
        value: impl ToString,
        delta: Option<&dyn ToString>,
    ) -> Component {
        let mut metric = MetricSpec::new(label, value);
        metric.delta = delta.map(ToString::to_string);
        Component::Metric(metric)
    }

    /// Chart of a basic kind over existing columns, optionally colored.
    pub fn comp_plot(
        &self,
        kind: &str,
        x: Option<&str>,
        y: Option<&str>,
        color: Option<&str>,
    ) -> Result<Component> {
        let mut chart = Component::chart(kind, x, y)?;
        if let (Component::Chart(spec), Some(color)) = (&mut chart, color) {
            spec.color = Some(color.to_string());
        }
        chart.check(Some(&self.data), &ChartKind::BASIC)?;
        Ok(chart)
    }

    #[must_use]
    pub fn comp_blank(&self, height: u32) -> Component {
        Component::spacer(height)
    }

    pub fn comp_row(&self, widths: Vec<u32>, children: Vec<Component>) -> Result<Component> {
        Component::row(widths, children)
    }

    pub fn comp_tabs<I, L>(&self, tabs: I) -> Result<Component>
    where
        I: IntoIterator<Item = (L, Vec<Component>)>,
        L: Into<String>,
    {
        Component::tabs(tabs)
    }

    #[must_use]
    pub fn comp_expander(
        &self,
        label: impl Into<String>,
        expanded: bool,
        children: Vec<Component>,
    ) -> Component {
        Component::expander(label, expanded, children)
    }

    // ── Program generation ─────────────────────────────────────────────

    fn theme_css(&self) -> String {
        let theme = &self.theme;
        format!(
            "<style>\n\
             .stApp {{ background-color: {bg}; color: {text} !important; }}\n\
             .viewx-card {{ background: {card}; padding: 10px; border-radius: 8px; margin-bottom: 10px; }}\n\
             .viewx-title {{ color: {primary}; font-weight: 700; }}\n\
             .viewx-small {{ color: {text}; }}\n\
             </style>",
            bg = theme.background,
            text = theme.text,
            card = theme.card,
            primary = theme.primary,
        )
    }

    fn page_title(&self) -> Stmt {
        if self.title_align == Align::Left {
            return Stmt::line(format!("st.title({})", py_str(&self.title)));
        }
        Stmt::line(format!(
            "st.markdown({}, unsafe_allow_html=True)",
            py_str(&format!(
                "<h1 class=\"viewx-title\" style=\"text-align: {};\">{}</h1>",
                self.title_align.as_css(),
                self.title
            ))
        ))
    }

    /// The generated program as a statement list.
    #[must_use]
    pub fn program(&self) -> Vec<Stmt> {
        let mut lowering = SourceLowering::new(&self.theme, self.renderer.as_ref());
        let mut program = vec![
            Stmt::line("import json"),
            Stmt::Blank,
            Stmt::line("import pandas as pd"),
            Stmt::line("import plotly.express as px"),
            Stmt::line("import streamlit as st"),
            Stmt::Blank,
            Stmt::line(format!(
                "st.set_page_config(page_title={}, layout={}, initial_sidebar_state={})",
                py_str(&self.title),
                py_str(self.page.layout.as_str()),
                py_str(self.page.initial_sidebar_state.as_str())
            )),
            Stmt::Blank,
            Stmt::comment("Data"),
            Stmt::line(format!(
                "_payload = json.loads({})",
                py_str(&self.data.to_split_json())
            )),
            Stmt::line("data = pd.DataFrame(_payload[\"data\"], columns=_payload[\"columns\"])"),
            Stmt::Blank,
            Stmt::comment("Theme"),
            Stmt::line(format!(
                "st.markdown({}, unsafe_allow_html=True)",
                py_str(&self.theme_css())
            )),
        ];

        if let Some(css) = &self.custom_css {
            program.push(Stmt::Blank);
            program.push(Stmt::comment("Custom CSS"));
            program.push(Stmt::line(format!(
                "st.markdown({}, unsafe_allow_html=True)",
                py_str(css)
            )));
        }

        program.push(Stmt::Blank);
        program.push(Stmt::comment("Page title"));
        program.push(self.page_title());

        if !self.sidebar.is_empty() {
            program.push(Stmt::Blank);
            program.push(Stmt::block("with st.sidebar", lowering.lower_all(&self.sidebar)));
        }

        if !self.components.is_empty() {
            program.push(Stmt::Blank);
            program.push(Stmt::comment("Main components"));
            program.extend(lowering.lower_all(&self.components));
        }

        program.push(Stmt::Blank);
        program.push(Stmt::line(
            "st.markdown(\"<hr style=\\\"opacity:0.2\\\">\", unsafe_allow_html=True)",
        ));
        program.push(Stmt::line(format!("st.caption({})", py_str(FOOTER_CAPTION))));
        program
    }

    #[must_use]
    pub fn source(&self) -> String {
        format_program(&self.program())
    }

    /// Write the program to `dir/viewx_app.py`.
    pub fn write_source(&self, dir: &Path) -> Result<PathBuf> {
        let app_file = dir.join(APP_FILE_NAME);
        write_string(&app_file, &self.source())?;
        tracing::info!(path = %app_file.display(), "dashboard program written");
        Ok(app_file)
    }

    /// Write the program into a fresh temporary directory and launch the
    /// runtime against it. Readiness is not awaited.
    pub fn run(&self, options: &LaunchOptions) -> Result<DashboardRun> {
        let python = resolve_python(options.python.as_deref())?;
        let dir = tempfile::Builder::new().prefix("viewx-").tempdir()?;
        let app_file = self.write_source(dir.path())?;
        let port = match options.port {
            Some(port) => port,
            None => free_port()?,
        };
        let process =
            DashboardProcess::launch_streamlit(&python, &app_file, port, options.headless)?;
        let url = format!("http://localhost:{port}");
        tracing::info!(%url, app_file = %app_file.display(), "dashboard launched");
        Ok(DashboardRun {
            process,
            app_file,
            port,
            url,
            dir,
        })
    }
}

/// A launched dashboard. Fields drop in declaration order, so the process is
/// killed before its temporary directory is removed.
#[derive(Debug)]
pub struct DashboardRun {
    process: DashboardProcess,
    app_file: PathBuf,
    port: u16,
    url: String,
    dir: TempDir,
}

impl DashboardRun {
    #[must_use]
    pub fn app_file(&self) -> &Path {
        &self.app_file
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn process(&mut self) -> &mut DashboardProcess {
        &mut self.process
    }

    /// Kill the runtime, waiting at most `timeout`.
    pub fn terminate(mut self, timeout: Duration) -> Result<()> {
        self.process.terminate(timeout)?;
        Ok(())
    }
}
