// SPDX-License-Identifier: Apache-2.0
//! Statement IR for generated dashboard programs.
//!
//! Lowering produces an indentation-free [`Stmt`] tree; [`format_program`]
//! is the only place that decides how the tree becomes text. Literal helpers
//! encode every user-provided string with a JSON string encoder, whose output
//! is also a valid Python string literal, so labels, colors or embedded HTML
//! cannot break the generated statement.

use serde_json::Value;

/// Indentation unit of the generated source.
pub const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// One statement line.
    Line(String),
    /// A `# ...` comment line.
    Comment(String),
    /// An empty line.
    Blank,
    /// `header:` followed by an indented body.
    Block { header: String, body: Vec<Stmt> },
}

impl Stmt {
    #[must_use]
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }

    #[must_use]
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    #[must_use]
    pub fn block(header: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self::Block {
            header: header.into(),
            body,
        }
    }

    /// Every `Line` in this subtree, depth first, without indentation.
    #[must_use]
    pub fn flatten_lines(&self) -> Vec<&str> {
        match self {
            Self::Line(text) => vec![text.as_str()],
            Self::Block { header, body } => {
                let mut lines = vec![header.as_str()];
                lines.extend(body.iter().flat_map(Stmt::flatten_lines));
                lines
            }
            Self::Comment(_) | Self::Blank => Vec::new(),
        }
    }
}

/// Render `stmts` as source text with one trailing newline. Empty block
/// bodies get a `pass` so the output always parses.
#[must_use]
pub fn format_program(stmts: &[Stmt]) -> String {
    let mut out = String::new();
    for stmt in stmts {
        write_stmt(&mut out, stmt, 0);
    }
    out
}

fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    let indent = INDENT.repeat(depth);
    match stmt {
        Stmt::Line(text) => {
            out.push_str(&indent);
            out.push_str(text);
            out.push('\n');
        }
        Stmt::Comment(text) => {
            out.push_str(&indent);
            out.push_str("# ");
            push_comment_text(out, text);
            out.push('\n');
        }
        Stmt::Blank => out.push('\n'),
        Stmt::Block { header, body } => {
            out.push_str(&indent);
            out.push_str(header);
            out.push_str(":\n");
            for inner in body {
                write_stmt(out, inner, depth + 1);
            }
            if body.iter().all(|inner| matches!(inner, Stmt::Comment(_) | Stmt::Blank)) {
                out.push_str(&INDENT.repeat(depth + 1));
                out.push_str("pass\n");
            }
        }
    }
}

/// Comment text stays on one physical line and carries no raw control
/// characters; a NUL anywhere makes the whole file unparseable.
fn push_comment_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\n' | '\r' => out.push(' '),
            '\u{2028}' | '\u{2029}' => out.extend(ch.escape_unicode()),
            ch if ch.is_control() => out.extend(ch.escape_unicode()),
            ch => out.push(ch),
        }
    }
}

// ── Literal encoding ───────────────────────────────────────────────────

/// Quoted, escaped string literal.
#[must_use]
pub fn py_str(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

#[must_use]
pub fn py_opt_str(value: Option<&str>) -> String {
    value.map_or_else(|| "None".to_string(), py_str)
}

#[must_use]
pub fn py_str_list<S: AsRef<str>>(values: &[S]) -> String {
    let items = values
        .iter()
        .map(|value| py_str(value.as_ref()))
        .collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

#[must_use]
pub fn py_int_list(values: &[u32]) -> String {
    let items = values.iter().map(u32::to_string).collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

#[must_use]
pub fn py_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

#[cfg(test)]
mod tests {
    use super::{Stmt, format_program, py_bool, py_int_list, py_opt_str, py_str, py_str_list};

    #[test]
    fn blocks_indent_by_four_spaces() {
        let program = vec![
            Stmt::line("import streamlit as st"),
            Stmt::block(
                "with st.sidebar",
                vec![
                    Stmt::line("st.write(1)"),
                    Stmt::block("with st.expander(\"x\")", vec![Stmt::line("st.write(2)")]),
                ],
            ),
            Stmt::line("st.write(3)"),
        ];
        assert_eq!(
            format_program(&program),
            "import streamlit as st\nwith st.sidebar:\n    st.write(1)\n    with st.expander(\"x\"):\n        st.write(2)\nst.write(3)\n"
        );
    }

    #[test]
    fn empty_blocks_get_pass() {
        let program = vec![Stmt::block(
            "with tabs_1[0]",
            vec![Stmt::comment("nothing here")],
        )];
        assert_eq!(
            format_program(&program),
            "with tabs_1[0]:\n    # nothing here\n    pass\n"
        );
    }

    #[test]
    fn comments_cannot_smuggle_code() {
        let program = vec![Stmt::comment("a\nimport os")];
        assert_eq!(format_program(&program), "# a import os\n");
    }

    #[test]
    fn comment_control_characters_are_escaped() {
        let program = vec![Stmt::comment("a\u{0}b\u{c}c\u{85}d\u{2028}e\tf")];
        let text = format_program(&program);
        assert_eq!(
            text,
            "# a\\u{0}b\\u{c}c\\u{85}d\\u{2028}e\\u{9}f\n"
        );
        assert!(!text.contains('\u{0}'));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn literals_escape_quotes_and_newlines() {
        assert_eq!(py_str("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(py_str("a\\b"), "\"a\\\\b\"");
        assert_eq!(py_str("\"\"\")\nimport os"), "\"\\\"\\\"\\\")\\nimport os\"");
        assert_eq!(py_opt_str(None), "None");
        assert_eq!(py_str_list(&["B", "A"]), "[\"B\", \"A\"]");
        assert_eq!(py_int_list(&[2, 1]), "[2, 1]");
        assert_eq!(py_bool(true), "True");
    }

    #[test]
    fn flatten_lines_walks_blocks_in_order() {
        let stmt = Stmt::block(
            "with a",
            vec![Stmt::line("one"), Stmt::Blank, Stmt::line("two")],
        );
        assert_eq!(stmt.flatten_lines(), vec!["with a", "one", "two"]);
    }
}
