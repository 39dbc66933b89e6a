// SPDX-License-Identifier: Apache-2.0
//! Source lowering: component trees to dashboard program statements.
//!
//! Each component becomes a list of [`Stmt`]s. Containers open one block per
//! child (`with row_1[0]:`); their handles are numbered per lowering pass so
//! nested containers never rebind an outer handle.

use crate::chart::ChartRenderer;
use crate::codegen::{Stmt, py_bool, py_int_list, py_str, py_str_list};
use crate::component::{Component, ExpanderSpec, MetricSpec, RowSpec, TableSpec, TabsSpec, TextBlock};
use crate::markup::{DEFAULT_TEXT_SIZE, DEFAULT_TITLE_SIZE};
use crate::theme::Theme;

fn markdown(html: &str) -> Stmt {
    Stmt::line(format!("st.markdown({}, unsafe_allow_html=True)", py_str(html)))
}

pub struct SourceLowering<'a> {
    theme: &'a Theme,
    renderer: &'a dyn ChartRenderer,
    rows: usize,
    tab_groups: usize,
}

impl<'a> SourceLowering<'a> {
    pub fn new(theme: &'a Theme, renderer: &'a dyn ChartRenderer) -> Self {
        Self {
            theme,
            renderer,
            rows: 0,
            tab_groups: 0,
        }
    }

    pub fn lower(&mut self, component: &Component) -> Vec<Stmt> {
        match component {
            Component::Title(block) => vec![self.title(block)],
            Component::Text(block) => vec![self.text(block)],
            Component::Table(table) => vec![table_stmt(table)],
            Component::Metric(metric) => vec![metric_stmt(metric)],
            Component::Chart(chart) => self.renderer.render_source(chart, self.theme),
            Component::Spacer { height } => vec![markdown(&format!(
                "<div style=\"height: {height}px;\"></div>"
            ))],
            Component::Row(row) => self.row(row),
            Component::Tabs(tabs) => self.tabs(tabs),
            Component::Expander(expander) => vec![self.expander(expander)],
            Component::Placeholder { kind } => {
                tracing::warn!(kind = %kind, "lowering unknown component kind as placeholder");
                vec![
                    Stmt::comment(format!("Unknown component type: {kind}")),
                    Stmt::line(format!(
                        "st.warning({})",
                        py_str(&format!("Unsupported component: {kind}"))
                    )),
                ]
            }
        }
    }

    pub fn lower_all(&mut self, components: &[Component]) -> Vec<Stmt> {
        components
            .iter()
            .flat_map(|component| self.lower(component))
            .collect()
    }

    fn title(&self, block: &TextBlock) -> Stmt {
        markdown(&format!(
            "<div style=\"display: flex; justify-content: {};\"><div class=\"viewx-card\"><h1 class=\"viewx-title\" style=\"font-size:{}; color:{}; margin:0;\">{}</h1></div></div>",
            block.align.as_flex(),
            block.size.as_deref().unwrap_or(DEFAULT_TITLE_SIZE),
            block.color.as_deref().unwrap_or(&self.theme.primary),
            block.text
        ))
    }

    fn text(&self, block: &TextBlock) -> Stmt {
        markdown(&format!(
            "<div class=\"viewx-card\"><p class=\"viewx-small\" style=\"font-size:{}; color:{}; margin:0; text-align:{};\">{}</p></div>",
            block.size.as_deref().unwrap_or(DEFAULT_TEXT_SIZE),
            block.color.as_deref().unwrap_or(&self.theme.text),
            block.align.as_css(),
            block.text
        ))
    }

    fn row(&mut self, row: &RowSpec) -> Vec<Stmt> {
        self.rows += 1;
        let handle = format!("row_{}", self.rows);
        let mut stmts = vec![Stmt::line(format!(
            "{handle} = st.columns({})",
            py_int_list(row.widths())
        ))];
        for (index, child) in row.children().iter().enumerate() {
            stmts.push(Stmt::block(
                format!("with {handle}[{index}]"),
                self.lower(child),
            ));
        }
        stmts
    }

    fn tabs(&mut self, tabs: &TabsSpec) -> Vec<Stmt> {
        self.tab_groups += 1;
        let handle = format!("tabs_{}", self.tab_groups);
        let labels = tabs.labels().collect::<Vec<_>>();
        let mut stmts = vec![Stmt::line(format!(
            "{handle} = st.tabs({})",
            py_str_list(&labels)
        ))];
        for (index, tab) in tabs.tabs().iter().enumerate() {
            stmts.push(Stmt::block(
                format!("with {handle}[{index}]"),
                self.lower_all(&tab.children),
            ));
        }
        stmts
    }

    fn expander(&mut self, expander: &ExpanderSpec) -> Stmt {
        Stmt::block(
            format!(
                "with st.expander({}, expanded={})",
                py_str(&expander.label),
                py_bool(expander.expanded)
            ),
            self.lower_all(&expander.children),
        )
    }
}

fn table_stmt(table: &TableSpec) -> Stmt {
    match &table.columns {
        Some(columns) if !columns.is_empty() => {
            Stmt::line(format!("st.dataframe(data[{}])", py_str_list(columns)))
        }
        _ => Stmt::line("st.dataframe(data)"),
    }
}

fn metric_stmt(metric: &MetricSpec) -> Stmt {
    match &metric.delta {
        Some(delta) => Stmt::line(format!(
            "st.metric({}, {}, delta={})",
            py_str(&metric.label),
            py_str(&metric.value),
            py_str(delta)
        )),
        None => Stmt::line(format!(
            "st.metric({}, {})",
            py_str(&metric.label),
            py_str(&metric.value)
        )),
    }
}
