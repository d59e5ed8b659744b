// Spreadsheet export of an analysis.
//
// One header row (result field names, then "Observaciones") and one data row.
// Output is a function of the inputs only: same results in, same bytes out.

pub mod csv;
pub mod xlsx;

use std::path::Path;

use serde::Deserialize;
use tesisview_protocol::{AnalysisResult, ObservationList, OBSERVATIONS_COLUMN};

/// File stem used when no export name is configured.
pub const DEFAULT_FILE_STEM: &str = "resultados_tesis";

/// Name of the single worksheet in XLSX output.
pub const SHEET_NAME: &str = "Resultados";

/// Spreadsheet format. Spelled "xlsx" / "csv" in settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    /// `resultados_tesis.xlsx` / `resultados_tesis.csv`
    pub fn default_file_name(&self) -> String {
        format!("{}.{}", DEFAULT_FILE_STEM, self.extension())
    }

    /// Parse "xlsx" / "csv" (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    /// Guess from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::parse)
    }
}

/// The header and the single data row, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub row: Vec<String>,
}

impl ExportTable {
    pub fn build(results: &AnalysisResult, observations: &ObservationList) -> Self {
        let mut header: Vec<String> = results.keys().map(str::to_string).collect();
        let mut row: Vec<String> = results.iter().map(|(_, v)| v.to_string()).collect();
        header.push(OBSERVATIONS_COLUMN.to_string());
        row.push(observations.joined());
        Self { header, row }
    }
}

/// Render to bytes in the given format.
pub fn export(
    results: &AnalysisResult,
    observations: &ObservationList,
    format: ExportFormat,
) -> Result<Vec<u8>, String> {
    let table = ExportTable::build(results, observations);
    match format {
        ExportFormat::Xlsx => xlsx::export(&table),
        ExportFormat::Csv => csv::export(&table),
    }
}

/// Render and write to `path`, replacing any existing file.
pub fn write_export(
    results: &AnalysisResult,
    observations: &ObservationList,
    format: ExportFormat,
    path: &Path,
) -> Result<(), String> {
    let bytes = export(results, observations, format)?;
    std::fs::write(path, bytes)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}
