// SPDX-License-Identifier: Apache-2.0
//! Markup lowering: component trees to HTML fragments.
//!
//! Caller text (titles, paragraphs, labels) is authoring markup and is
//! embedded as given. Dataset cells and unknown kind names come from data and
//! are escaped.

use crate::chart::ChartRenderer;
use crate::component::{
    Component, ExpanderSpec, IconSide, MetricSpec, RowSpec, TableSpec, TabsSpec, TextBlock,
};
use crate::dataset::Dataset;
use crate::error::{ConstructionError, Result};
use crate::theme::Theme;

pub const DEFAULT_TITLE_SIZE: &str = "28px";
pub const DEFAULT_TEXT_SIZE: &str = "14px";

/// Tab switching for every `.vx-tabs` group in the document.
pub const TAB_SCRIPT: &str = r#"<script>
document.querySelectorAll('.vx-tab-button').forEach(function (button) {
  button.addEventListener('click', function () {
    var group = document.getElementById(button.dataset.tabGroup);
    group.querySelectorAll(':scope > .vx-tab-bar > .vx-tab-button').forEach(function (other) {
      other.classList.toggle('active', other === button);
    });
    group.querySelectorAll(':scope > .vx-tab-panel').forEach(function (panel) {
      panel.hidden = panel.dataset.tabIndex !== button.dataset.tabIndex;
    });
    window.dispatchEvent(new Event('resize'));
  });
});
</script>"#;

fn html_escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

/// One lowering pass. Chart and tab group ids are numbered in visit order,
/// so lowering the same components twice yields identical markup.
pub struct MarkupLowering<'a> {
    theme: &'a Theme,
    data: Option<&'a Dataset>,
    renderer: &'a dyn ChartRenderer,
    charts: usize,
    tab_groups: usize,
}

impl<'a> MarkupLowering<'a> {
    pub fn new(
        theme: &'a Theme,
        data: Option<&'a Dataset>,
        renderer: &'a dyn ChartRenderer,
    ) -> Self {
        Self {
            theme,
            data,
            renderer,
            charts: 0,
            tab_groups: 0,
        }
    }

    /// Charts lowered so far.
    #[must_use]
    pub fn chart_count(&self) -> usize {
        self.charts
    }

    /// Tab groups lowered so far.
    #[must_use]
    pub fn tab_group_count(&self) -> usize {
        self.tab_groups
    }

    pub fn lower(&mut self, component: &Component) -> Result<String> {
        match component {
            Component::Title(block) => Ok(self.title(block)),
            Component::Text(block) => Ok(self.text(block)),
            Component::Table(table) => self.table(table),
            Component::Metric(metric) => Ok(self.metric(metric)),
            Component::Chart(chart) => {
                let data = self.data.ok_or(ConstructionError::NoData)?;
                self.charts += 1;
                let element_id = format!("vx-chart-{}", self.charts);
                self.renderer
                    .render_markup(data, chart, &element_id, self.theme)
            }
            Component::Spacer { height } => Ok(format!(
                "<div class=\"vx-spacer\" style=\"height:{height}px;\"></div>"
            )),
            Component::Row(row) => self.row(row),
            Component::Tabs(tabs) => self.tabs(tabs),
            Component::Expander(expander) => self.expander(expander),
            Component::Placeholder { kind } => {
                tracing::warn!(kind = %kind, "lowering unknown component kind as placeholder");
                Ok(format!(
                    "<div class=\"vx-placeholder\">Unsupported component: {}</div>",
                    html_escape(kind)
                ))
            }
        }
    }

    fn lower_all(&mut self, children: &[Component]) -> Result<String> {
        let fragments = children
            .iter()
            .map(|child| self.lower(child))
            .collect::<Result<Vec<_>>>()?;
        Ok(fragments.join("\n"))
    }

    fn title(&self, block: &TextBlock) -> String {
        format!(
            "<div class=\"vx-title-wrap\" style=\"display:flex;justify-content:{};\"><h1 class=\"vx-title\" style=\"font-size:{};color:{};margin:0;\">{}</h1></div>",
            block.align.as_flex(),
            block.size.as_deref().unwrap_or(DEFAULT_TITLE_SIZE),
            block.color.as_deref().unwrap_or(&self.theme.primary),
            block.text
        )
    }

    fn text(&self, block: &TextBlock) -> String {
        format!(
            "<div class=\"vx-card vx-text\" style=\"font-size:{};color:{};text-align:{};\">{}</div>",
            block.size.as_deref().unwrap_or(DEFAULT_TEXT_SIZE),
            block.color.as_deref().unwrap_or(&self.theme.text),
            block.align.as_css(),
            block.text
        )
    }

    fn table(&self, table: &TableSpec) -> Result<String> {
        let data = self.data.ok_or(ConstructionError::NoData)?;
        let table_html = match &table.columns {
            Some(columns) => data.project(columns)?.to_html_table(),
            None => data.to_html_table(),
        };
        Ok(format!("<div class=\"vx-card vx-table\">\n{table_html}\n</div>"))
    }

    fn metric(&self, metric: &MetricSpec) -> String {
        let direction = match metric.icon_side {
            IconSide::Left => "row",
            IconSide::Right => "row-reverse",
        };
        let mut html = format!(
            "<div class=\"vx-valuebox\" style=\"background:{};flex-direction:{direction};\">",
            metric.color.as_deref().unwrap_or(&self.theme.primary)
        );
        if let Some(icon) = &metric.icon {
            html.push_str(&format!("<div class=\"vx-valuebox-icon\">{icon}</div>"));
        }
        html.push_str(&format!(
            "<div><div class=\"vx-valuebox-value\">{}</div><div class=\"vx-valuebox-label\">{}</div>",
            metric.value, metric.label
        ));
        if let Some(delta) = &metric.delta {
            html.push_str(&format!("<div class=\"vx-valuebox-delta\">{delta}</div>"));
        }
        html.push_str("</div></div>");
        html
    }

    fn row(&mut self, row: &RowSpec) -> Result<String> {
        let mut html = String::from("<div class=\"vx-row\">\n");
        for (width, child) in row.columns() {
            html.push_str(&format!(
                "<div class=\"vx-col\" style=\"flex:{width} 1 0;\">\n{}\n</div>\n",
                self.lower(child)?
            ));
        }
        html.push_str("</div>");
        Ok(html)
    }

    fn tabs(&mut self, tabs: &TabsSpec) -> Result<String> {
        self.tab_groups += 1;
        let group = format!("vx-tabs-{}", self.tab_groups);

        let mut html = format!(
            "<div class=\"vx-tabs\" id=\"{group}\">\n<div class=\"vx-tab-bar\" role=\"tablist\">\n"
        );
        for (index, tab) in tabs.tabs().iter().enumerate() {
            let active = if index == 0 { " active" } else { "" };
            html.push_str(&format!(
                "<button type=\"button\" class=\"vx-tab-button{active}\" data-tab-group=\"{group}\" data-tab-index=\"{index}\">{}</button>\n",
                tab.label
            ));
        }
        html.push_str("</div>\n");
        for (index, tab) in tabs.tabs().iter().enumerate() {
            let hidden = if index == 0 { "" } else { " hidden" };
            html.push_str(&format!(
                "<div class=\"vx-tab-panel\" data-tab-index=\"{index}\"{hidden}>\n{}\n</div>\n",
                self.lower_all(&tab.children)?
            ));
        }
        html.push_str("</div>");
        Ok(html)
    }

    fn expander(&mut self, expander: &ExpanderSpec) -> Result<String> {
        let open = if expander.expanded { " open" } else { "" };
        Ok(format!(
            "<details class=\"vx-expander\"{open}>\n<summary>{}</summary>\n{}\n</details>",
            expander.label,
            self.lower_all(&expander.children)?
        ))
    }
}
