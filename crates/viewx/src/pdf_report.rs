// SPDX-License-Identifier: Apache-2.0
//! LaTeX report builder compiled with `pdflatex`.
//!
//! The body is accumulated as LaTeX fragments. All caller text goes through
//! [`escape_latex`] except code listings, which are verbatim by nature.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use wait_timeout::ChildExt;

use crate::error::{ConstructionError, Result, ViewxError};
use crate::util::{ensure_dir, resolve_command, write_string};

pub const DEFAULT_IMAGE_WIDTH: &str = "0.6\\textwidth";
pub const DEFAULT_BOX_COLOR: &str = "blue!15";

const PACKAGES: &[&str] = &[
    "lmodern",
    "geometry",
    "float",
    "caption",
    "xcolor",
    "graphicx",
    "multicol",
    "listings",
    "tikz",
    "pgfplots",
    "tcolorbox",
];

const LISTING_STYLE: &str = r"\lstset{
    basicstyle=\ttfamily\small,
    frame=single,
    breaklines=true,
    numbers=left,
    numberstyle=\tiny,
    keywordstyle=\color{blue},
    commentstyle=\color{green!50!black},
}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub title: String,
    pub author: String,
    pub out_dir: PathBuf,
    /// Image directory, relative to `out_dir`.
    pub images_dir: String,
    pub two_column: bool,
    /// Extra directory searched for images missing from the image directory.
    pub image_search_dir: Option<PathBuf>,
    /// Compiler executable name or path.
    pub compiler: String,
    pub timeout_seconds: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            title: "Report".to_string(),
            author: "Author".to_string(),
            out_dir: PathBuf::from("output"),
            images_dir: "images".to_string(),
            two_column: false,
            image_search_dir: None,
            compiler: "pdflatex".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Figure options for [`PdfReport::add_image`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub caption: Option<String>,
    pub width: String,
    pub placement: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            caption: None,
            width: DEFAULT_IMAGE_WIDTH.to_string(),
            placement: "H".to_string(),
        }
    }
}

/// Files produced by a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutput {
    pub tex_path: PathBuf,
    pub pdf_path: PathBuf,
    pub log_path: PathBuf,
}

/// Escape LaTeX special characters in plain text.
#[must_use]
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\^{}"),
            '\\' => out.push_str(r"\textbackslash{}"),
            '[' => out.push_str("{[}"),
            ']' => out.push_str("{]}"),
            other => out.push(other),
        }
    }
    out
}

fn coordinates(x: &[f64], y: &[f64]) -> Result<String> {
    if x.len() != y.len() {
        return Err(ConstructionError::CoordinateMismatch {
            x: x.len(),
            y: y.len(),
        }
        .into());
    }
    Ok(x.iter()
        .zip(y)
        .map(|(xi, yi)| format!("({xi},{yi})"))
        .collect::<Vec<_>>()
        .join(" "))
}

/// First `! ...` error line of a TeX log.
#[must_use]
pub fn first_diagnostic(log: &str) -> Option<String> {
    let pattern = Regex::new(r"(?m)^! .*$").ok()?;
    pattern.find(log).map(|found| found.as_str().trim_end().to_string())
}

#[derive(Debug, Clone)]
pub struct PdfReport {
    config: PdfConfig,
    body: Vec<String>,
    open_multicols: usize,
}

impl PdfReport {
    /// Create the output and image directories.
    pub fn new(config: PdfConfig) -> Result<Self> {
        ensure_dir(&config.out_dir)?;
        ensure_dir(&config.out_dir.join(&config.images_dir))?;
        Ok(Self {
            config,
            body: Vec::new(),
            open_multicols: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PdfConfig {
        &self.config
    }

    #[must_use]
    pub fn images_path(&self) -> PathBuf {
        self.config.out_dir.join(&self.config.images_dir)
    }

    pub fn add_text(&mut self, text: &str, bold: bool) -> &mut Self {
        let escaped = escape_latex(text);
        if bold {
            self.body.push(format!("\\textbf{{{escaped}}}\n"));
        } else {
            self.body.push(format!("{escaped}\n"));
        }
        self
    }

    pub fn add_section(&mut self, title: &str) -> &mut Self {
        self.body.push(format!("\\section{{{}}}", escape_latex(title)));
        self
    }

    pub fn add_subsection(&mut self, title: &str) -> &mut Self {
        self.body
            .push(format!("\\subsection{{{}}}", escape_latex(title)));
        self
    }

    /// Insert a figure. An image missing from the image directory is copied
    /// in from `image_search_dir` or the working directory.
    pub fn add_image(&mut self, filename: &str, options: &ImageOptions) -> Result<&mut Self> {
        let target = self.images_path().join(filename);
        if !target.exists() {
            let mut candidates = Vec::new();
            if let Some(dir) = &self.config.image_search_dir {
                candidates.push(dir.join(filename));
            }
            candidates.push(std::env::current_dir()?.join(filename));

            let found = candidates
                .iter()
                .find(|candidate| candidate.is_file())
                .cloned();
            let Some(source) = found else {
                let mut searched = vec![target];
                searched.extend(candidates);
                return Err(ViewxError::MissingResource {
                    name: filename.to_string(),
                    searched,
                });
            };
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(&source, &target)?;
            tracing::info!(
                from = %source.display(),
                to = %target.display(),
                "image copied into report images"
            );
        }

        let mut figure = format!(
            "\\begin{{figure}}[{}]\n\\centering\n\\includegraphics[width={}]{{{}}}\n",
            options.placement, options.width, filename
        );
        if let Some(caption) = &options.caption {
            figure.push_str(&format!("\\caption{{{}}}\n", escape_latex(caption)));
        }
        figure.push_str("\\end{figure}");
        self.body.push(figure);
        Ok(self)
    }

    /// Ruled table; every row must have one cell per header.
    pub fn add_table<H, C>(&mut self, headers: &[H], rows: &[Vec<C>], caption: &str) -> Result<&mut Self>
    where
        H: AsRef<str>,
        C: ToString,
    {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(ConstructionError::RaggedRow {
                row: index,
                expected: headers.len(),
                found: row.len(),
            }
            .into());
        }

        let spec = vec!["l"; headers.len()].join(" | ");
        let mut table = String::from("\\begin{table}[H]\\centering\n");
        table.push_str(&format!("\\caption{{{}}}\n", escape_latex(caption)));
        table.push_str(&format!("\\begin{{tabular}}{{{spec}}}\\hline\n"));
        let header_cells = headers
            .iter()
            .map(|header| escape_latex(header.as_ref()))
            .collect::<Vec<_>>();
        table.push_str(&format!("{}\\\\ \\hline\n", header_cells.join(" & ")));
        for row in rows {
            let cells = row
                .iter()
                .map(|cell| escape_latex(&cell.to_string()))
                .collect::<Vec<_>>();
            table.push_str(&format!("{}\\\\ \\hline\n", cells.join(" & ")));
        }
        table.push_str("\\end{tabular}\\end{table}");
        self.body.push(table);
        Ok(self)
    }

    pub fn add_itemize<S: AsRef<str>>(&mut self, items: &[S]) -> &mut Self {
        self.push_list("itemize", items)
    }

    pub fn add_enumerate<S: AsRef<str>>(&mut self, items: &[S]) -> &mut Self {
        self.push_list("enumerate", items)
    }

    fn push_list<S: AsRef<str>>(&mut self, environment: &str, items: &[S]) -> &mut Self {
        let mut list = format!("\\begin{{{environment}}}\n");
        for item in items {
            list.push_str(&format!("\\item {}\n", escape_latex(item.as_ref())));
        }
        list.push_str(&format!("\\end{{{environment}}}"));
        self.body.push(list);
        self
    }

    /// Verbatim code listing.
    pub fn add_code(&mut self, code: &str, language: &str) -> &mut Self {
        self.body.push(format!(
            "\\begin{{lstlisting}}[language={language}]\n{}\n\\end{{lstlisting}}",
            code.trim_matches('\n')
        ));
        self
    }

    pub fn begin_multicols(&mut self, columns: u32) -> &mut Self {
        self.open_multicols += 1;
        self.body.push(format!("\\begin{{multicols}}{{{columns}}}"));
        self
    }

    pub fn end_multicols(&mut self) -> Result<&mut Self> {
        if self.open_multicols == 0 {
            return Err(ConstructionError::UnbalancedMulticols { open: 0 }.into());
        }
        self.open_multicols -= 1;
        self.body.push("\\end{multicols}".to_string());
        Ok(self)
    }

    pub fn add_box(&mut self, title: &str, content: &str, color: Option<&str>) -> &mut Self {
        self.body.push(format!(
            "\\begin{{tcolorbox}}[colback={}, colframe=black, title={{{}}}]\n{}\n\\end{{tcolorbox}}",
            color.unwrap_or(DEFAULT_BOX_COLOR),
            escape_latex(title),
            escape_latex(content)
        ));
        self
    }

    pub fn add_plot(&mut self, x: &[f64], y: &[f64], caption: &str) -> Result<&mut Self> {
        let coords = coordinates(x, y)?;
        self.push_axis(
            "width=0.85\\linewidth, height=6cm, grid=major",
            &[format!("\\addplot coordinates {{{coords}}};")],
            caption,
        );
        Ok(self)
    }

    /// Several `(x, y)` series on one axis.
    pub fn add_multiplot(&mut self, series: &[(Vec<f64>, Vec<f64>)], caption: &str) -> Result<&mut Self> {
        let plots = series
            .iter()
            .map(|(x, y)| Ok(format!("\\addplot coordinates {{{}}};", coordinates(x, y)?)))
            .collect::<Result<Vec<_>>>()?;
        self.push_axis("width=0.9\\linewidth, height=6cm, grid=both", &plots, caption);
        Ok(self)
    }

    fn push_axis(&mut self, options: &str, plots: &[String], caption: &str) {
        self.body.push(format!(
            "\\begin{{figure}}[H]\n\\centering\n\\begin{{tikzpicture}}\n\\begin{{axis}}[{options}]\n{}\n\\end{{axis}}\n\\end{{tikzpicture}}\n\\caption{{{}}}\n\\end{{figure}}",
            plots.join("\n"),
            escape_latex(caption)
        ));
    }

    pub fn new_page(&mut self) -> &mut Self {
        self.body.push("\\newpage".to_string());
        self
    }

    fn preamble(&self) -> String {
        let mut tex = String::new();
        if self.config.two_column {
            tex.push_str("\\documentclass[10pt,twocolumn]{article}\n");
        } else {
            tex.push_str("\\documentclass{article}\n");
        }
        tex.push_str("\\usepackage[utf8]{inputenc}\n\\usepackage[T1]{fontenc}\n");
        for package in PACKAGES {
            tex.push_str(&format!("\\usepackage{{{package}}}\n"));
        }
        tex.push_str("\\pgfplotsset{compat=1.18}\n");
        tex.push_str(LISTING_STYLE);
        tex.push('\n');
        tex.push_str(&format!(
            "\\graphicspath{{{{{}/}}}}\n",
            self.config.images_dir.trim_end_matches('/')
        ));
        tex.push_str(&format!("\\title{{{}}}\n", escape_latex(&self.config.title)));
        tex.push_str(&format!("\\author{{{}}}\n", escape_latex(&self.config.author)));
        tex.push_str("\\date{\\today}\n");
        tex
    }

    /// The complete document. Fails while a multicols block is open.
    pub fn to_latex(&self) -> Result<String> {
        if self.open_multicols > 0 {
            return Err(ConstructionError::UnbalancedMulticols {
                open: self.open_multicols,
            }
            .into());
        }
        let mut tex = self.preamble();
        tex.push_str("\\begin{document}\n\\maketitle\n");
        for fragment in &self.body {
            tex.push_str(fragment);
            tex.push('\n');
        }
        tex.push_str("\\end{document}\n");
        Ok(tex)
    }

    /// Write `<out_dir>/<name>.tex`.
    pub fn write_tex(&self, name: &str) -> Result<PathBuf> {
        let tex_path = self.config.out_dir.join(format!("{name}.tex"));
        write_string(&tex_path, &self.to_latex()?)?;
        tracing::debug!(path = %tex_path.display(), "latex source written");
        Ok(tex_path)
    }

    /// Write the source and compile it. A failing compiler is reported with
    /// its log path and first diagnostic line.
    pub fn build(&self, name: &str) -> Result<BuildOutput> {
        let tex_path = self.write_tex(name)?;
        let compiler = resolve_command(&[self.config.compiler.as_str()])?;
        let out_dir = self.config.out_dir.canonicalize()?;
        let log_path = out_dir.join(format!("{name}.log"));

        let mut command = Command::new(&compiler);
        command
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg("-output-directory")
            .arg(&out_dir)
            .arg(format!("{name}.tex"))
            .current_dir(&out_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let label = format!("{} {name}.tex", compiler.display());
        tracing::info!(command = %label, "compiling report");

        let mut child = command.spawn()?;
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let status = match child.wait_timeout(timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ViewxError::ExternalCommandTimedOut {
                    command: label,
                    seconds: self.config.timeout_seconds,
                });
            }
        };

        if !status.success() {
            let exit_code = status.code().unwrap_or(1);
            let diagnostic = fs::read(&log_path)
                .ok()
                .and_then(|bytes| first_diagnostic(&String::from_utf8_lossy(&bytes)));
            tracing::error!(
                command = %label,
                exit_code,
                log = %log_path.display(),
                diagnostic = diagnostic.as_deref().unwrap_or("<none>"),
                "pdflatex failed"
            );
            return Err(ViewxError::RenderFailure {
                command: label,
                exit_code,
                log_path,
                diagnostic,
            });
        }

        let output = BuildOutput {
            tex_path,
            pdf_path: out_dir.join(format!("{name}.pdf")),
            log_path,
        };
        tracing::info!(pdf = %output.pdf_path.display(), "report compiled");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::error::{ConstructionError, ViewxError};

    use super::{ImageOptions, PdfConfig, PdfReport, escape_latex, first_diagnostic};

    fn report_in(dir: &std::path::Path) -> PdfReport {
        PdfReport::new(PdfConfig {
            title: "Q3 & Q4".to_string(),
            out_dir: dir.join("output"),
            ..PdfConfig::default()
        })
        .expect("report")
    }

    #[test]
    fn escape_covers_specials() {
        assert_eq!(escape_latex("50% of $x_1"), r"50\% of \$x\_1");
        assert_eq!(escape_latex(r"a\b"), r"a\textbackslash{}b");
        assert_eq!(escape_latex("{~^}"), r"\{\textasciitilde{}\^{}\}");
        assert_eq!(escape_latex("[x]"), "{[}x{]}");
    }

    #[test]
    fn new_creates_output_and_images() {
        let dir = tempdir().expect("tempdir");
        let report = report_in(dir.path());
        assert!(report.images_path().is_dir());
    }

    #[test]
    fn document_has_preamble_and_escaped_title() {
        let dir = tempdir().expect("tempdir");
        let mut report = report_in(dir.path());
        report.add_section("Intro").add_text("bold #1", true).new_page();
        let tex = report.to_latex().expect("latex");
        assert!(tex.starts_with("\\documentclass{article}\n"));
        assert!(tex.contains("\\usepackage{pgfplots}"));
        assert!(tex.contains("\\graphicspath{{images/}}"));
        assert!(tex.contains("\\title{Q3 \\& Q4}"));
        assert!(tex.contains("\\section{Intro}\n\\textbf{bold \\#1}"));
        assert!(tex.trim_end().ends_with("\\newpage\n\\end{document}"));
    }

    #[test]
    fn two_column_class_options() {
        let dir = tempdir().expect("tempdir");
        let report = PdfReport::new(PdfConfig {
            two_column: true,
            out_dir: dir.path().to_path_buf(),
            ..PdfConfig::default()
        })
        .expect("report");
        assert!(
            report
                .to_latex()
                .expect("latex")
                .starts_with("\\documentclass[10pt,twocolumn]{article}")
        );
    }

    #[test]
    fn table_rows_must_match_headers() {
        let dir = tempdir().expect("tempdir");
        let mut report = report_in(dir.path());
        report
            .add_table(&["Model", "F1"], &[vec!["tree".to_string(), "0.88".to_string()]], "Scores")
            .expect("table");
        let err = report
            .add_table(&["Model", "F1"], &[vec!["tree"]], "Scores")
            .err()
            .expect("ragged");
        assert!(matches!(
            err,
            ViewxError::Construction(ConstructionError::RaggedRow { expected: 2, found: 1, .. })
        ));
        let tex = report.to_latex().expect("latex");
        assert!(tex.contains("\\begin{tabular}{l | l}\\hline\nModel & F1\\\\ \\hline\ntree & 0.88\\\\ \\hline\n"));
    }

    #[test]
    fn plot_coordinates_must_pair() {
        let dir = tempdir().expect("tempdir");
        let mut report = report_in(dir.path());
        report
            .add_plot(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0], "squares")
            .expect("plot");
        assert!(report.to_latex().expect("latex").contains("\\addplot coordinates {(0,0) (1,1) (2,4)};"));
        assert!(matches!(
            report.add_plot(&[0.0], &[], "bad").err().expect("mismatch"),
            ViewxError::Construction(ConstructionError::CoordinateMismatch { x: 1, y: 0 })
        ));
    }

    #[test]
    fn multicols_must_balance() {
        let dir = tempdir().expect("tempdir");
        let mut report = report_in(dir.path());
        report.begin_multicols(2).add_itemize(&["a", "b"]);
        assert!(matches!(
            report.to_latex().expect_err("open block"),
            ViewxError::Construction(ConstructionError::UnbalancedMulticols { open: 1 })
        ));
        report.end_multicols().expect("close");
        assert!(report.to_latex().is_ok());
        assert!(report.end_multicols().is_err());
    }

    #[test]
    fn missing_image_lists_searched_locations() {
        let dir = tempdir().expect("tempdir");
        let mut report = report_in(dir.path());
        let err = report
            .add_image("viewx-missing-image.png", &ImageOptions::default())
            .err()
            .expect("missing");
        match err {
            ViewxError::MissingResource { name, searched } => {
                assert_eq!(name, "viewx-missing-image.png");
                assert!(searched.len() >= 2);
                assert!(searched[0].starts_with(report.images_path()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn image_is_copied_from_search_dir() {
        let dir = tempdir().expect("tempdir");
        let assets = dir.path().join("assets");
        fs::create_dir_all(&assets).expect("assets");
        fs::write(assets.join("logo.png"), b"png").expect("write image");

        let mut report = PdfReport::new(PdfConfig {
            out_dir: dir.path().join("output"),
            image_search_dir: Some(assets),
            ..PdfConfig::default()
        })
        .expect("report");
        report
            .add_image(
                "logo.png",
                &ImageOptions {
                    caption: Some("Logo_1".to_string()),
                    ..ImageOptions::default()
                },
            )
            .expect("image");
        assert!(report.images_path().join("logo.png").is_file());
        let tex = report.to_latex().expect("latex");
        assert!(tex.contains("\\includegraphics[width=0.6\\textwidth]{logo.png}"));
        assert!(tex.contains("\\caption{Logo\\_1}"));
    }

    #[test]
    fn diagnostic_is_first_bang_line() {
        let log = "This is pdfTeX\n(./report.tex\n! Undefined control sequence.\nl.7 \\foo\n! Emergency stop.\n";
        assert_eq!(
            first_diagnostic(log).as_deref(),
            Some("! Undefined control sequence.")
        );
        assert_eq!(first_diagnostic("all good"), None);
    }

    #[cfg(unix)]
    #[tracing_test::traced_test]
    #[test]
    fn failed_compile_is_logged_and_returned() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        let compiler = dir.path().join("fake-pdflatex");
        fs::write(
            &compiler,
            "#!/bin/sh\nfor last; do :; done\nname=$(basename \"$last\" .tex)\nprintf '%s\\n' 'This is pdfTeX' '! Undefined control sequence.' > \"$name.log\"\nexit 1\n",
        )
        .expect("script");
        fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).expect("chmod");

        let report = PdfReport::new(PdfConfig {
            out_dir: dir.path().join("output"),
            compiler: compiler.display().to_string(),
            ..PdfConfig::default()
        })
        .expect("report");
        let err = report.build("broken").expect_err("compile fails");
        match err {
            ViewxError::RenderFailure {
                exit_code,
                log_path,
                diagnostic,
                ..
            } => {
                assert_eq!(exit_code, 1);
                assert!(log_path.ends_with("broken.log"));
                assert_eq!(diagnostic.as_deref(), Some("! Undefined control sequence."));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(logs_contain("pdflatex failed"));
        assert!(logs_contain("broken.log"));
    }
}
