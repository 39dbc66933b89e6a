// SPDX-License-Identifier: Apache-2.0
//! Chart rendering seam.
//!
//! Both builders hand charts to a [`ChartRenderer`]: the grid report asks for
//! embeddable markup, the dashboard for statements that build the figure at
//! runtime. [`PlotlyRenderer`] targets plotly.js for markup and
//! plotly-express for generated source.

use serde_json::{Map, Value, json};

use crate::codegen::{Stmt, py_opt_str, py_str};
use crate::component::{ChartKind, ChartSpec};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::theme::Theme;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub trait ChartRenderer {
    /// Tags the document head needs once any chart is present.
    fn head_markup(&self) -> String;

    /// Self-contained fragment drawing `chart` into an element with
    /// `element_id`.
    fn render_markup(
        &self,
        data: &Dataset,
        chart: &ChartSpec,
        element_id: &str,
        theme: &Theme,
    ) -> Result<String>;

    /// Statements drawing `chart` from the frame bound to `data` in the
    /// generated program.
    fn render_source(&self, chart: &ChartSpec, theme: &Theme) -> Vec<Stmt>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlotlyRenderer;

impl PlotlyRenderer {
    fn trace(data: &Dataset, chart: &ChartSpec, color: &str) -> Result<Value> {
        let mut trace = Map::new();
        let column = |field: &Option<String>| -> Result<Option<Value>> {
            field
                .as_deref()
                .map(|name| data.column(name).map(Value::Array))
                .transpose()
        };
        let x = column(&chart.x)?;
        let y = column(&chart.y)?;
        let z = column(&chart.z)?;

        let (kind, mode) = match chart.kind {
            ChartKind::Scatter => ("scatter", Some("markers")),
            ChartKind::Line => ("scatter", Some("lines")),
            ChartKind::Histogram => ("histogram", None),
            ChartKind::Bar => ("bar", None),
            ChartKind::Box => ("box", None),
            ChartKind::Pie => ("pie", None),
            ChartKind::Scatter3d => ("scatter3d", Some("markers")),
        };
        trace.insert("type".into(), json!(kind));
        if let Some(mode) = mode {
            trace.insert("mode".into(), json!(mode));
        }

        if chart.kind == ChartKind::Pie {
            if let Some(labels) = x {
                trace.insert("labels".into(), labels);
            }
            if let Some(values) = y {
                trace.insert("values".into(), values);
            }
            return Ok(Value::Object(trace));
        }

        for (key, values) in [("x", x), ("y", y), ("z", z)] {
            if let Some(values) = values {
                trace.insert(key.into(), values);
            }
        }
        if chart.kind == ChartKind::Line {
            trace.insert("line".into(), json!({ "color": color }));
        } else {
            trace.insert("marker".into(), json!({ "color": color }));
        }
        Ok(Value::Object(trace))
    }

    fn layout(chart: &ChartSpec, theme: &Theme) -> Value {
        json!({
            "title": { "text": chart.title.as_deref().unwrap_or("") },
            "autosize": true,
            "margin": { "t": 48, "r": 16, "b": 40, "l": 48 },
            "paper_bgcolor": theme.card,
            "plot_bgcolor": theme.card,
            "font": { "color": theme.text },
            "xaxis": { "title": { "text": chart.x.as_deref().unwrap_or("") } },
            "yaxis": { "title": { "text": chart.y.as_deref().unwrap_or("") } },
        })
    }
}

/// JSON safe to inline inside a `<script>` element.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

impl ChartRenderer for PlotlyRenderer {
    fn head_markup(&self) -> String {
        format!("<script src=\"{PLOTLY_CDN}\" charset=\"utf-8\"></script>")
    }

    fn render_markup(
        &self,
        data: &Dataset,
        chart: &ChartSpec,
        element_id: &str,
        theme: &Theme,
    ) -> Result<String> {
        let color = chart.color.as_deref().unwrap_or(&theme.primary);
        let traces = json!([Self::trace(data, chart, color)?]);
        let layout = Self::layout(chart, theme);
        Ok(format!(
            "<div id=\"{element_id}\" class=\"vx-chart\"></div>\n<script>Plotly.newPlot({}, {}, {}, {{\"responsive\": true}});</script>",
            script_json(&json!(element_id)),
            script_json(&traces),
            script_json(&layout),
        ))
    }

    fn render_source(&self, chart: &ChartSpec, theme: &Theme) -> Vec<Stmt> {
        let x = py_opt_str(chart.x.as_deref());
        let y = py_opt_str(chart.y.as_deref());
        let color = py_str(chart.color.as_deref().unwrap_or(&theme.primary));

        let mut stmts = match chart.kind {
            ChartKind::Scatter => vec![
                Stmt::line(format!("fig = px.scatter(data, x={x}, y={y})")),
                Stmt::line(format!("fig.update_traces(marker=dict(color={color}))")),
            ],
            ChartKind::Line => vec![
                Stmt::line(format!("fig = px.line(data, x={x}, y={y})")),
                Stmt::line(format!("fig.update_traces(line=dict(color={color}))")),
            ],
            ChartKind::Histogram => vec![
                Stmt::line(format!("fig = px.histogram(data, x={x})")),
                Stmt::line(format!("fig.update_traces(marker=dict(color={color}))")),
            ],
            ChartKind::Bar => vec![
                Stmt::line(format!("fig = px.bar(data, x={x}, y={y})")),
                Stmt::line(format!("fig.update_traces(marker=dict(color={color}))")),
            ],
            ChartKind::Box => vec![
                Stmt::line(format!("fig = px.box(data, x={x}, y={y})")),
                Stmt::line(format!("fig.update_traces(marker=dict(color={color}))")),
            ],
            ChartKind::Pie => vec![Stmt::line(format!(
                "fig = px.pie(data, names={x}, values={y})"
            ))],
            ChartKind::Scatter3d => vec![
                Stmt::line(format!(
                    "fig = px.scatter_3d(data, x={x}, y={y}, z={})",
                    py_opt_str(chart.z.as_deref())
                )),
                Stmt::line(format!("fig.update_traces(marker=dict(color={color}))")),
            ],
        };
        if let Some(title) = &chart.title {
            stmts.push(Stmt::line(format!("fig.update_layout(title={})", py_str(title))));
        }
        stmts.push(Stmt::line("st.plotly_chart(fig, width=\"stretch\")"));
        stmts
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::codegen::format_program;
    use crate::component::{ChartKind, ChartSpec};
    use crate::dataset::Dataset;
    use crate::theme::Theme;

    use super::{ChartRenderer, PlotlyRenderer};

    fn data() -> Dataset {
        Dataset::new(
            vec!["species".into(), "count".into()],
            vec![
                vec![json!("setosa"), json!(50)],
                vec![json!("</script>"), json!(1)],
            ],
        )
        .expect("dataset")
    }

    #[test]
    fn markup_embeds_columns_and_theme_color() {
        let chart = ChartSpec::new(ChartKind::Bar).x("species").y("count");
        let html = PlotlyRenderer
            .render_markup(&data(), &chart, "vx-chart-1", &Theme::light())
            .expect("markup");
        assert!(html.starts_with("<div id=\"vx-chart-1\" class=\"vx-chart\"></div>"));
        assert!(html.contains("\"type\":\"bar\""));
        assert!(html.contains("\"color\":\"#4C6EF5\""));
        assert!(html.contains("[50,1]"));
        assert!(!html.contains("</script>\""), "data must not close the script element");
    }

    #[test]
    fn pie_uses_labels_and_values() {
        let chart = ChartSpec::new(ChartKind::Pie).x("species").y("count");
        let html = PlotlyRenderer
            .render_markup(&data(), &chart, "p", &Theme::light())
            .expect("markup");
        assert!(html.contains("\"labels\":[\"setosa\""));
        assert!(html.contains("\"values\":[50,1]"));
    }

    #[test]
    fn missing_field_is_an_error() {
        let chart = ChartSpec::new(ChartKind::Scatter).x("nope");
        assert!(
            PlotlyRenderer
                .render_markup(&data(), &chart, "c", &Theme::light())
                .is_err()
        );
    }

    #[test]
    fn source_encodes_fields_and_color() {
        let chart = ChartSpec::new(ChartKind::Line)
            .x("day")
            .y("sales \"usd\"")
            .title("Trend");
        let source = format_program(&PlotlyRenderer.render_source(&chart, &Theme::dark()));
        assert_eq!(
            source,
            "fig = px.line(data, x=\"day\", y=\"sales \\\"usd\\\"\")\n\
             fig.update_traces(line=dict(color=\"#00E0A8\"))\n\
             fig.update_layout(title=\"Trend\")\n\
             st.plotly_chart(fig, width=\"stretch\")\n"
        );
    }

    #[test]
    fn histogram_source_omits_y() {
        let chart = ChartSpec::new(ChartKind::Histogram).x("len").color("#123456");
        let source = format_program(&PlotlyRenderer.render_source(&chart, &Theme::dark()));
        assert!(source.starts_with("fig = px.histogram(data, x=\"len\")\n"));
        assert!(source.contains("color=\"#123456\""));
    }
}
