use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{PipelineOutcome, StageVerdict};
use crate::stats::NoiseSummary;
use crate::table::Table;
use crate::types::{Result, Value};

/// JSON report written alongside an anonymized table
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: String,
    pub technique: String,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    pub input_records: usize,
    pub output_records: usize,
    pub all_satisfied: bool,
    pub verdicts: Vec<StageVerdict>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub noise: Vec<NoiseSummary>,
}

impl RunReport {
    pub fn new(outcome: &PipelineOutcome, input_records: usize, input_file: Option<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            technique: outcome.technique.clone(),
            generated_at: Utc::now().to_rfc3339(),
            input_file,
            input_records,
            output_records: outcome.table.len(),
            all_satisfied: outcome.all_satisfied(),
            verdicts: outcome.verdicts.clone(),
            noise: outcome.noise.clone(),
        }
    }
}

/// Write report to JSON file
pub fn write_json_file(report: &RunReport, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Write report to JSON string
pub fn to_json_string(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write report to stdout
pub fn write_json_stdout(report: &RunReport) -> Result<()> {
    let json = to_json_string(report)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json)?;
    Ok(())
}

fn field(value: &Value) -> String {
    match value {
        Value::Missing => String::new(),
        other => other.to_string(),
    }
}

/// Write a table as CSV; missing values become empty fields
pub fn write_table<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.column_names())?;
    for record in table.records() {
        csv_writer.write_record(record.values().iter().map(field))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a table to a CSV file
pub fn write_table_file(table: &Table, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_table(table, std::io::BufWriter::new(file))
}

/// Write a table to stdout as CSV
pub fn write_table_stdout(table: &Table) -> Result<()> {
    let stdout = std::io::stdout();
    write_table(table, stdout.lock())
}
