//! N-best list output for tuning pipelines and diagnostics.
//!
//! `NBestWriter` emits one line per derivation in the usual
//! `id ||| output ||| features ||| total` layout. `report` captures the same
//! information as a serializable structure for JSON output, and
//! `format_text` renders it for humans.

use std::io::{self, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::forest::ScoreBreakdown;
use crate::kbest::KBestList;
use crate::settings::settings;

/// Writes k-best lists as delimited text lines.
pub struct NBestWriter<W: Write> {
    out: W,
    separator: String,
    include_breakdown: bool,
    precision: usize,
}

impl<W: Write> NBestWriter<W> {
    /// Writer configured from the global output settings.
    pub fn new(out: W) -> Self {
        let s = &settings().output;
        Self {
            out,
            separator: s.separator.clone(),
            include_breakdown: s.include_breakdown,
            precision: s.score_precision,
        }
    }

    pub fn include_breakdown(mut self, include: bool) -> Self {
        self.include_breakdown = include;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Write every entry of `list`, tagged with sentence id `id`.
    pub fn write_list(&mut self, id: usize, list: &KBestList<'_>) -> io::Result<()> {
        for entry in list.iter() {
            self.write_line(id, &entry.output(), entry.breakdown(), entry.score())?;
        }
        Ok(())
    }

    fn write_line(
        &mut self,
        id: usize,
        output: &str,
        breakdown: &ScoreBreakdown,
        score: f32,
    ) -> io::Result<()> {
        let sep = &self.separator;
        let p = self.precision;
        write!(self.out, "{id}{sep}{output}{sep}")?;
        if self.include_breakdown {
            write!(self.out, "{breakdown:.p$}{sep}")?;
        }
        writeln!(self.out, "{score:.p$}")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Serializable view of a k-best list.
#[derive(Debug, Serialize)]
pub struct NBestReport {
    pub source: Option<String>,
    pub forest_nodes: usize,
    pub vertices_searched: usize,
    pub entries: Vec<NBestEntry>,
}

#[derive(Debug, Serialize)]
pub struct NBestEntry {
    pub rank: usize,
    pub output: String,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
    /// Ranks selected in each child, in tail order.
    pub back_pointers: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,
}

/// Capture `list` as a report. Trees are rendered only when asked for.
pub fn report(list: &KBestList<'_>, include_tree: bool) -> NBestReport {
    let entries = list
        .iter()
        .enumerate()
        .map(|(rank, e)| NBestEntry {
            rank,
            output: e.output(),
            score: e.score(),
            breakdown: e.breakdown().clone(),
            back_pointers: e.derivation().back_pointers().to_vec(),
            tree: include_tree.then(|| e.tree()),
        })
        .collect();
    NBestReport {
        source: list.forest().source.clone(),
        forest_nodes: list.forest().len(),
        vertices_searched: list.vertex_count(),
        entries,
    }
}

/// Format a report as human-readable text with aligned columns.
pub fn format_text(report: &NBestReport) -> String {
    let mut out = String::new();

    match &report.source {
        Some(source) => out.push_str(&format!("=== k-best for \"{source}\" ===\n")),
        None => out.push_str("=== k-best ===\n"),
    }
    out.push_str(&format!(
        "  forest nodes={}  searched={}\n",
        report.forest_nodes, report.vertices_searched
    ));

    if report.entries.is_empty() {
        out.push_str("\nNo derivations found.\n");
        return out;
    }

    let pad_width = report
        .entries
        .iter()
        .map(|e| UnicodeWidthStr::width(e.output.as_str()))
        .max()
        .unwrap_or(0)
        .min(48);

    out.push('\n');
    for e in &report.entries {
        let display_width = UnicodeWidthStr::width(e.output.as_str());
        let padded = if display_width < pad_width {
            format!("{}{}", e.output, " ".repeat(pad_width - display_width))
        } else {
            e.output.clone()
        };
        out.push_str(&format!(
            "  #{:<3} {}  score={:<10.4} bp={:?}\n",
            e.rank + 1,
            padded,
            e.score,
            e.back_pointers,
        ));
        if !e.breakdown.is_empty() {
            out.push_str(&format!("        {:.4}\n", e.breakdown));
        }
        if let Some(tree) = &e.tree {
            out.push_str(&format!("        {tree}\n"));
        }
    }

    out
}
