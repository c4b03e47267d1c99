pub mod csv;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::table::Table;
use crate::types::Result;

/// Common trait for tabular input readers
pub trait DataReader {
    /// Read the whole source into a typed table
    fn read(&mut self) -> Result<Table>;
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Tsv,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" | "tab" => Some(FileFormat::Tsv),
            _ => None,
        }
    }
}

/// Create a reader for the given file path
pub fn create_reader(path: &Path) -> Result<Box<dyn DataReader>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let format = FileFormat::from_extension(ext)
        .ok_or_else(|| Error::InvalidInput(format!("Unsupported file extension: .{}", ext)))?;

    match format {
        FileFormat::Csv => Ok(Box::new(csv::CsvReader::new(path)?)),
        FileFormat::Tsv => Ok(Box::new(csv::CsvReader::new_tsv(path)?)),
    }
}

/// Read a table from a CSV or TSV file chosen by extension
pub fn read_table(path: &Path) -> Result<Table> {
    create_reader(path)?.read()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_extension("CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("tsv"), Some(FileFormat::Tsv));
        assert_eq!(FileFormat::from_extension("xlsx"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = create_reader(Path::new("patients.xlsx"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
