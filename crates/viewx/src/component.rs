// SPDX-License-Identifier: Apache-2.0
//! Component model: closed, kind-tagged descriptions of visual elements.
//!
//! Components are plain values. Factories validate kind-specific constraints
//! and fail with [`ConstructionError`]; nothing is deferred to lowering.
//! Containers ([`Component::Row`], [`Component::Tabs`],
//! [`Component::Expander`]) hold further components, so a layout is a tree of
//! arbitrary depth.
//!
//! [`Component::Placeholder`] carries a kind the model does not know (for
//! example a newer layout document). Lowering renders it as a visible marker
//! instead of failing.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::{Dataset, cell_text};
use crate::error::{ConstructionError, Result, ViewxError};

// ── Styling enums ──────────────────────────────────────────────────────

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Value for `justify-content` in a flex wrapper.
    #[must_use]
    pub fn as_flex(self) -> &'static str {
        match self {
            Self::Left => "flex-start",
            Self::Center => "center",
            Self::Right => "flex-end",
        }
    }
}

/// Which side of a value box the icon sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconSide {
    #[default]
    Left,
    Right,
}

// ── Chart kinds ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Scatter,
    Line,
    Histogram,
    Bar,
    Box,
    Pie,
    Scatter3d,
}

impl ChartKind {
    /// Kinds every builder can lower.
    pub const BASIC: [Self; 4] = [Self::Scatter, Self::Line, Self::Histogram, Self::Bar];

    /// Kinds the static grid report can lower.
    pub const ALL: [Self; 7] = [
        Self::Scatter,
        Self::Line,
        Self::Histogram,
        Self::Bar,
        Self::Box,
        Self::Pie,
        Self::Scatter3d,
    ];

    /// Parse a case-insensitive kind name.
    pub fn parse(raw: &str) -> Result<Self> {
        let kind = match raw.trim().to_ascii_lowercase().as_str() {
            "scatter" => Self::Scatter,
            "line" => Self::Line,
            "hist" | "histogram" => Self::Histogram,
            "bar" => Self::Bar,
            "box" => Self::Box,
            "pie" => Self::Pie,
            "scatter_3d" | "scatter3d" => Self::Scatter3d,
            _ => {
                return Err(ConstructionError::UnsupportedChartKind {
                    kind: raw.to_string(),
                }
                .into());
            }
        };
        Ok(kind)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scatter => "scatter",
            Self::Line => "line",
            Self::Histogram => "hist",
            Self::Bar => "bar",
            Self::Box => "box",
            Self::Pie => "pie",
            Self::Scatter3d => "scatter_3d",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Leaf specs ─────────────────────────────────────────────────────────

/// Title or paragraph text. Unset color and size fall back to the theme and
/// the lowering defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub text: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub align: Align,
}

impl TextBlock {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            size: None,
            align: Align::Left,
        }
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

impl From<&str> for TextBlock {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextBlock {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Table of the bound dataset; `None` shows every column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSpec {
    pub columns: Option<Vec<String>>,
}

/// A metric. The grid report draws it as a value box using `icon`, `color`
/// and `icon_side`; the dashboard ignores those fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub label: String,
    pub value: String,
    pub delta: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub icon_side: IconSide,
}

impl MetricSpec {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
            delta: None,
            icon: None,
            color: None,
            icon_side: IconSide::Left,
        }
    }

    #[must_use]
    pub fn delta(mut self, delta: impl ToString) -> Self {
        self.delta = Some(delta.to_string());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn icon_side(mut self, side: IconSide) -> Self {
        self.icon_side = side;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
    pub z: Option<String>,
    pub title: Option<String>,
    pub color: Option<String>,
}

impl ChartSpec {
    #[must_use]
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            x: None,
            y: None,
            z: None,
            title: None,
            color: None,
        }
    }

    #[must_use]
    pub fn x(mut self, field: impl Into<String>) -> Self {
        self.x = Some(field.into());
        self
    }

    #[must_use]
    pub fn y(mut self, field: impl Into<String>) -> Self {
        self.y = Some(field.into());
        self
    }

    #[must_use]
    pub fn z(mut self, field: impl Into<String>) -> Self {
        self.z = Some(field.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Field names referenced by the chart, in x, y, z order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        [&self.x, &self.y, &self.z]
            .into_iter()
            .filter_map(|field| field.as_deref())
    }

    /// Check the kind against `allowed` and every field against `data`.
    pub fn validate(&self, data: Option<&Dataset>, allowed: &[ChartKind]) -> Result<()> {
        if !allowed.contains(&self.kind) {
            return Err(ConstructionError::UnsupportedChartKind {
                kind: self.kind.as_str().to_string(),
            }
            .into());
        }
        let data = data.ok_or(ConstructionError::NoData)?;
        for field in self.fields() {
            data.require_column(field)?;
        }
        Ok(())
    }
}

// ── Container specs ────────────────────────────────────────────────────

/// Side-by-side columns. Child `i` is drawn with relative width `widths[i]`;
/// the factory guarantees both lists have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpec {
    widths: Vec<u32>,
    children: Vec<Component>,
}

impl RowSpec {
    #[must_use]
    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    #[must_use]
    pub fn children(&self) -> &[Component] {
        &self.children
    }

    /// `(width, child)` pairs in stored order.
    pub fn columns(&self) -> impl Iterator<Item = (u32, &Component)> {
        self.widths.iter().copied().zip(self.children.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub label: String,
    pub children: Vec<Component>,
}

/// Tabs in insertion order; labels are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabsSpec {
    tabs: Vec<Tab>,
}

impl TabsSpec {
    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tabs.iter().map(|tab| tab.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpanderSpec {
    pub label: String,
    pub expanded: bool,
    pub children: Vec<Component>,
}

// ── Component ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Title(TextBlock),
    Text(TextBlock),
    Table(TableSpec),
    Metric(MetricSpec),
    Chart(ChartSpec),
    Spacer { height: u32 },
    Row(RowSpec),
    Tabs(TabsSpec),
    Expander(ExpanderSpec),
    Placeholder { kind: String },
}

/// Kind tags accepted in layout documents.
const KNOWN_KINDS: &[&str] = &[
    "title", "text", "table", "metric", "chart", "plot", "spacer", "row", "tabs", "expander",
];

const DEFAULT_SPACER_HEIGHT: u32 = 20;

impl Component {
    #[must_use]
    pub fn title(text: impl Into<String>) -> Self {
        Self::Title(TextBlock::new(text))
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextBlock::new(text))
    }

    #[must_use]
    pub fn table(columns: Option<Vec<String>>) -> Self {
        Self::Table(TableSpec { columns })
    }

    #[must_use]
    pub fn metric(label: impl Into<String>, value: impl ToString) -> Self {
        Self::Metric(MetricSpec::new(label, value))
    }

    /// Chart of any kind the grid report supports; field existence is checked
    /// when a builder accepts the component.
    pub fn chart(kind: &str, x: Option<&str>, y: Option<&str>) -> Result<Self> {
        let mut spec = ChartSpec::new(ChartKind::parse(kind)?);
        spec.x = x.map(str::to_string);
        spec.y = y.map(str::to_string);
        Ok(Self::Chart(spec))
    }

    #[must_use]
    pub fn spacer(height: u32) -> Self {
        Self::Spacer { height }
    }

    /// Columns with relative widths. Rejects a length mismatch, an empty row
    /// and zero ratios.
    pub fn row(widths: Vec<u32>, children: Vec<Self>) -> Result<Self> {
        if widths.len() != children.len() {
            return Err(ConstructionError::RowArity {
                widths: widths.len(),
                children: children.len(),
            }
            .into());
        }
        if widths.is_empty() {
            return Err(ConstructionError::EmptyContainer { kind: "row" }.into());
        }
        if let Some(index) = widths.iter().position(|&width| width == 0) {
            return Err(ConstructionError::ZeroWidth { index }.into());
        }
        Ok(Self::Row(RowSpec { widths, children }))
    }

    /// Tabs in the order given. Rejects repeated labels and an empty set.
    pub fn tabs<I, L>(tabs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, Vec<Self>)>,
        L: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let mut collected = Vec::new();
        for (label, children) in tabs {
            let label = label.into();
            if !seen.insert(label.clone()) {
                return Err(ConstructionError::DuplicateTab { label }.into());
            }
            collected.push(Tab { label, children });
        }
        if collected.is_empty() {
            return Err(ConstructionError::EmptyContainer { kind: "tabs" }.into());
        }
        Ok(Self::Tabs(TabsSpec { tabs: collected }))
    }

    #[must_use]
    pub fn expander(label: impl Into<String>, expanded: bool, children: Vec<Self>) -> Self {
        Self::Expander(ExpanderSpec {
            label: label.into(),
            expanded,
            children,
        })
    }

    #[must_use]
    pub fn placeholder(kind: impl Into<String>) -> Self {
        Self::Placeholder { kind: kind.into() }
    }

    /// The kind tag as written in layout documents.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Title(_) => "title",
            Self::Text(_) => "text",
            Self::Table(_) => "table",
            Self::Metric(_) => "metric",
            Self::Chart(_) => "chart",
            Self::Spacer { .. } => "spacer",
            Self::Row(_) => "row",
            Self::Tabs(_) => "tabs",
            Self::Expander(_) => "expander",
            Self::Placeholder { kind } => kind,
        }
    }

    /// Direct children in stored order; empty for leaves.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Row(row) => row.children.iter().collect(),
            Self::Tabs(tabs) => tabs
                .tabs
                .iter()
                .flat_map(|tab| tab.children.iter())
                .collect(),
            Self::Expander(expander) => expander.children.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// True when this component or any descendant satisfies `predicate`.
    pub fn any(&self, predicate: &dyn Fn(&Self) -> bool) -> bool {
        predicate(self) || self.children().into_iter().any(|child| child.any(predicate))
    }

    /// Validate charts and table projections in this subtree against the
    /// bound dataset.
    pub fn check(&self, data: Option<&Dataset>, chart_kinds: &[ChartKind]) -> Result<()> {
        match self {
            Self::Chart(chart) => chart.validate(data, chart_kinds),
            Self::Table(table) => {
                let data = data.ok_or(ConstructionError::NoData)?;
                for column in table.columns.iter().flatten() {
                    data.require_column(column)?;
                }
                Ok(())
            }
            _ => self
                .children()
                .into_iter()
                .try_for_each(|child| child.check(data, chart_kinds)),
        }
    }

    /// Read a component from a layout document. Unknown `type` tags become
    /// placeholders; malformed known kinds are errors.
    pub fn from_json(value: &Value) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ViewxError::invalid("component is missing a string \"type\" field"))?;
        if !KNOWN_KINDS.contains(&kind) {
            tracing::debug!(kind, "unknown component kind kept as placeholder");
            return Ok(Self::placeholder(kind));
        }
        let doc = ComponentDoc::deserialize(value)?;
        doc.into_component()
    }
}

// ── Layout document form ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ComponentDoc {
    Title {
        text: String,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        align: Align,
    },
    Text {
        text: String,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        align: Align,
    },
    Table {
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    Metric {
        label: String,
        value: Value,
        #[serde(default)]
        delta: Option<Value>,
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        icon_side: IconSide,
    },
    #[serde(alias = "plot")]
    Chart {
        kind: String,
        #[serde(default)]
        x: Option<String>,
        #[serde(default)]
        y: Option<String>,
        #[serde(default)]
        z: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
    Spacer {
        #[serde(default = "default_spacer_height")]
        height: u32,
    },
    Row {
        widths: Vec<u32>,
        components: Vec<Value>,
    },
    Tabs {
        tabs: Vec<TabDoc>,
    },
    Expander {
        label: String,
        #[serde(default)]
        expanded: bool,
        components: Vec<Value>,
    },
}

#[derive(Debug, Deserialize)]
struct TabDoc {
    label: String,
    components: Vec<Value>,
}

fn default_spacer_height() -> u32 {
    DEFAULT_SPACER_HEIGHT
}

fn children_from_json(values: &[Value]) -> Result<Vec<Component>> {
    values.iter().map(Component::from_json).collect()
}

fn text_block(text: String, color: Option<String>, size: Option<String>, align: Align) -> TextBlock {
    TextBlock {
        text,
        color,
        size,
        align,
    }
}

impl ComponentDoc {
    fn into_component(self) -> Result<Component> {
        let component = match self {
            Self::Title {
                text,
                color,
                size,
                align,
            } => Component::Title(text_block(text, color, size, align)),
            Self::Text {
                text,
                color,
                size,
                align,
            } => Component::Text(text_block(text, color, size, align)),
            Self::Table { columns } => Component::table(columns),
            Self::Metric {
                label,
                value,
                delta,
                icon,
                color,
                icon_side,
            } => Component::Metric(MetricSpec {
                label,
                value: cell_text(&value),
                delta: delta.as_ref().map(cell_text),
                icon,
                color,
                icon_side,
            }),
            Self::Chart {
                kind,
                x,
                y,
                z,
                title,
                color,
            } => Component::Chart(ChartSpec {
                kind: ChartKind::parse(&kind)?,
                x,
                y,
                z,
                title,
                color,
            }),
            Self::Spacer { height } => Component::spacer(height),
            Self::Row { widths, components } => {
                Component::row(widths, children_from_json(&components)?)?
            }
            Self::Tabs { tabs } => Component::tabs(
                tabs.into_iter()
                    .map(|tab| Ok((tab.label, children_from_json(&tab.components)?)))
                    .collect::<Result<Vec<_>>>()?,
            )?,
            Self::Expander {
                label,
                expanded,
                components,
            } => Component::expander(label, expanded, children_from_json(&components)?),
        };
        Ok(component)
    }
}
