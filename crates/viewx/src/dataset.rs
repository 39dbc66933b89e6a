//! In-memory tabular data bound to the builders.

use std::io::Read;
use std::path::Path;

use serde_json::{Number, Value, json};

use crate::error::{ConstructionError, Result};

/// Ordered columns and rows of scalar JSON cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ConstructionError::RaggedRow {
                    row: index,
                    expected: columns.len(),
                    found: row.len(),
                }
                .into());
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Read CSV with a header row. Integers and finite floats become numbers,
    /// empty cells become null, everything else stays a string.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns = csv_reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(infer_cell).collect());
        }

        Self::new(columns, rows)
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn require_column(&self, name: &str) -> Result<()> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(ConstructionError::UnknownColumn {
                column: name.to_string(),
            }
            .into())
        }
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<Value>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    /// Keep only `names`, in the order given.
    pub fn project(&self, names: &[String]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&index| row[index].clone()).collect())
            .collect();
        Ok(Self {
            columns: names.to_vec(),
            rows,
        })
    }

    /// Row-oriented JSON: `{"columns": [...], "data": [[...], ...]}`.
    #[must_use]
    pub fn to_split_json(&self) -> String {
        json!({
            "columns": self.columns,
            "data": self.rows,
        })
        .to_string()
    }

    /// Render as an HTML table with a leading positional index column.
    /// Cells are data, so they are escaped.
    #[must_use]
    pub fn to_html_table(&self) -> String {
        let mut html = String::from("<table class=\"dataframe\">\n<thead>\n<tr>\n<th></th>\n");
        for column in &self.columns {
            html.push_str(&format!("<th>{}</th>\n", escape(column)));
        }
        html.push_str("</tr>\n</thead>\n<tbody>\n");
        for (index, row) in self.rows.iter().enumerate() {
            html.push_str(&format!("<tr>\n<th>{index}</th>\n"));
            for cell in row {
                html.push_str(&format!("<td>{}</td>\n", escape(&cell_text(cell))));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>");
        html
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| {
                ConstructionError::UnknownColumn {
                    column: name.to_string(),
                }
                .into()
            })
    }
}

fn escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

/// Display form of a cell: strings unquoted, null as empty.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn infer_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(integer) = raw.parse::<i64>() {
        return Value::Number(integer.into());
    }
    if let Ok(float) = raw.parse::<f64>()
        && let Some(number) = Number::from_f64(float)
    {
        return Value::Number(number);
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::error::{ConstructionError, ViewxError};

    use super::Dataset;

    const IRIS: &str = "sepal_length,sepal_width,species\n5.1,3.5,setosa\n7.0,3.2,versicolor\n6.3,,virginica\n";

    fn iris() -> Dataset {
        Dataset::from_csv_reader(IRIS.as_bytes()).expect("iris csv")
    }

    #[test]
    fn csv_cells_are_inferred() {
        let data = iris();
        assert_eq!(data.shape(), (3, 3));
        assert_eq!(data.rows()[0][0], json!(5.1));
        assert_eq!(data.rows()[0][2], json!("setosa"));
        assert_eq!(data.rows()[2][1], Value::Null);
    }

    #[test]
    fn projection_keeps_requested_order() {
        let projected = iris()
            .project(&["species".to_string(), "sepal_length".to_string()])
            .expect("projection");
        assert_eq!(projected.columns(), ["species", "sepal_length"]);
        assert_eq!(projected.rows()[1], vec![json!("versicolor"), json!(7.0)]);
    }

    #[test]
    fn unknown_columns_are_construction_errors() {
        let error = iris()
            .project(&["petal_width".to_string()])
            .expect_err("missing column");
        assert!(matches!(
            error,
            ViewxError::Construction(ConstructionError::UnknownColumn { column }) if column == "petal_width"
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = Dataset::new(vec!["a".into(), "b".into()], vec![vec![json!(1)]])
            .expect_err("ragged row");
        assert!(matches!(
            error,
            ViewxError::Construction(ConstructionError::RaggedRow { row: 0, expected: 2, found: 1 })
        ));
    }

    #[test]
    fn split_json_is_row_oriented() {
        let data = Dataset::new(
            vec!["x".into(), "label".into()],
            vec![vec![json!(1), json!("a")], vec![json!(2), json!("b")]],
        )
        .expect("dataset");
        let parsed: Value = serde_json::from_str(&data.to_split_json()).expect("json");
        assert_eq!(parsed["columns"], json!(["x", "label"]));
        assert_eq!(parsed["data"][1], json!([2, "b"]));
    }

    #[test]
    fn html_table_escapes_cells() {
        let data = Dataset::new(vec!["name".into()], vec![vec![json!("<b>x</b>")]])
            .expect("dataset");
        let html = data.to_html_table();
        assert!(html.contains("&lt;b&gt;x&lt;&#x2f;b&gt;") || html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("<th>0</th>"));
    }
}
