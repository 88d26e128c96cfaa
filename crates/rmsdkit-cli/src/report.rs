use crate::error::Result;
use rmsdkit::workflows::compare::{BatchReport, ComparisonRecord, Status};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

const HEADERS: [&str; 5] = [
    "Structure_ID",
    "Candidate",
    "RMSD_Angstroms",
    "Status",
    "Rank",
];

#[derive(Debug, Serialize)]
struct ReportRow {
    #[serde(rename = "Structure_ID")]
    structure_id: usize,
    #[serde(rename = "Candidate")]
    candidate: String,
    #[serde(rename = "RMSD_Angstroms")]
    rmsd: Option<String>,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Rank")]
    rank: usize,
}

impl From<&ComparisonRecord> for ReportRow {
    fn from(record: &ComparisonRecord) -> Self {
        let status = match (record.status, record.failure_reason()) {
            (Status::Failed, Some(reason)) => format!("Error: {reason}"),
            (status, _) => status.label().to_string(),
        };
        Self {
            structure_id: record.structure_id,
            candidate: record.candidate.clone(),
            rmsd: record.deviation().map(|d| format!("{d:.3}")),
            status,
            rank: record.rank,
        }
    }
}

impl ReportRow {
    fn cells(&self) -> [String; 5] {
        [
            self.structure_id.to_string(),
            self.candidate.clone(),
            self.rmsd.clone().unwrap_or_default(),
            self.status.clone(),
            self.rank.to_string(),
        ]
    }
}

pub fn write_csv<W: Write>(report: &BatchReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in &report.records {
        csv_writer.serialize(ReportRow::from(record))?;
    }
    if report.records.is_empty() {
        csv_writer.write_record(HEADERS)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the CSV report to `path`, creating its parent directory if needed.
pub fn write_csv_file(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(report, file)
}

/// Renders the ranked records as a left-aligned plain-text table.
pub fn render_table(report: &BatchReport) -> String {
    let rows: Vec<[String; 5]> = report
        .records
        .iter()
        .map(|r| ReportRow::from(r).cells())
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = HEADERS.map(str::to_string);
    for row in std::iter::once(&header).chain(&rows) {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

pub fn render_summary(report: &BatchReport) -> String {
    let summary = report.summary();
    let mut out = String::new();
    let _ = writeln!(out, "Total structures compared: {}", summary.total);

    match (
        summary.mean_deviation,
        summary.min_deviation,
        summary.max_deviation,
    ) {
        (Some(mean), Some(min), Some(max)) => {
            let _ = writeln!(
                out,
                "Structures with RMSD < {:?} Angstroms: {}",
                report.threshold, summary.acceptable
            );
            let _ = writeln!(out, "Average RMSD: {mean:.3} Angstroms");
            let _ = writeln!(out, "Min RMSD: {min:.3} Angstroms");
            let _ = writeln!(out, "Max RMSD: {max:.3} Angstroms");
        }
        _ => {
            let _ = writeln!(out, "No valid RMSD calculations completed");
        }
    }
    if summary.failed > 0 {
        let _ = writeln!(out, "Failed comparisons: {}", summary.failed);
    }
    if summary.fallbacks > 0 {
        let _ = writeln!(
            out,
            "Comparisons that fell back to Kabsch: {}",
            summary.fallbacks
        );
    }
    out
}
