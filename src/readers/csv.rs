use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder};

use crate::error::Error;
use crate::inference::{parse_value, TypeInferencer};
use crate::table::{Column, Table};
use crate::types::{Result, Value};

use super::DataReader;

/// CSV/TSV file reader
pub struct CsvReader {
    path: PathBuf,
    delimiter: u8,
}

impl CsvReader {
    /// Create a new CSV reader
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            delimiter: b',',
        })
    }

    /// Create a new TSV reader
    pub fn new_tsv(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            delimiter: b'\t',
        })
    }

    fn create_reader(&self) -> Result<Reader<BufReader<File>>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let csv_reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Ok(csv_reader)
    }
}

impl DataReader for CsvReader {
    fn read(&mut self) -> Result<Table> {
        let mut reader = self.create_reader()?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let num_cols = headers.len();

        let mut type_inferencers: Vec<TypeInferencer> =
            (0..num_cols).map(|_| TypeInferencer::new()).collect();

        // First pass: buffer raw fields and infer column types
        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() > num_cols {
                return Err(Error::InvalidInput(format!(
                    "row {} has {} fields but the header has {}",
                    row_idx + 1,
                    record.len(),
                    num_cols
                )));
            }

            let mut fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            // Short rows are padded as missing
            fields.resize(num_cols, String::new());

            for (col_idx, field) in fields.iter().enumerate() {
                type_inferencers[col_idx].observe(field);
            }
            raw_rows.push(fields);
        }

        // Second pass: convert to typed values
        let columns: Vec<Column> = headers
            .iter()
            .zip(&type_inferencers)
            .map(|(name, inf)| Column::new(name, inf.inferred_type()))
            .collect();

        let rows: Vec<Vec<Value>> = raw_rows
            .iter()
            .map(|fields| {
                fields
                    .iter()
                    .zip(&columns)
                    .map(|(field, column)| parse_value(field, column.column_type))
                    .collect()
            })
            .collect();

        tracing::debug!(
            path = %self.path.display(),
            columns = num_cols,
            records = rows.len(),
            "read table"
        );

        Table::from_rows(columns, rows)
    }
}
