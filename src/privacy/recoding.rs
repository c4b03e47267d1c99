use std::collections::{BTreeMap, HashMap};

use crate::table::{Column, Table};
use crate::types::{ColumnType, Result, Value};

/// Recoder replacing identifying values with anonymous labels
#[derive(Debug, Clone, Default)]
pub struct ValueRecoder {
    /// Maps original values to recoded values
    mappings: HashMap<Value, String>,
    /// Counter for generating labels
    counter: usize,
    /// Prefix for recoded values (e.g., "Patient" -> "Patient_A", "Patient_B")
    prefix: String,
}

impl ValueRecoder {
    pub fn new(prefix: &str) -> Self {
        Self {
            mappings: HashMap::new(),
            counter: 0,
            prefix: prefix.to_string(),
        }
    }

    /// Recode a value, returning the anonymized version.
    /// Same input always produces same output within one recoder.
    pub fn recode(&mut self, original: &Value) -> String {
        if let Some(recoded) = self.mappings.get(original) {
            return recoded.clone();
        }

        let label = self.generate_label();
        self.mappings.insert(original.clone(), label.clone());
        label
    }

    /// Generate the next label (A, B, C, ... Z, AA, AB, ...)
    fn generate_label(&mut self) -> String {
        let label = index_to_label(self.counter);
        self.counter += 1;
        format!("{}_{}", self.prefix, label)
    }

    /// Reverse mapping (recoded -> original) for the sidekick file
    pub fn reverse_mappings(&self) -> BTreeMap<String, String> {
        self.mappings
            .iter()
            .map(|(k, v)| (v.clone(), k.to_string()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.mappings.len()
    }
}

/// Convert a 0-based index to a letter label (0=A, 1=B, ..., 25=Z, 26=AA, ...)
fn index_to_label(index: usize) -> String {
    let mut result = String::new();
    let mut n = index;

    loop {
        let remainder = n % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }

    result
}

/// Replace every value of `attribute` with a consistent pseudonym.
///
/// Labels are handed out in first-appearance order, so the same table always
/// yields the same labels. The recoder is returned so callers can keep the
/// mapping.
pub fn pseudonymize(table: &Table, attribute: &str, prefix: &str) -> Result<(Table, ValueRecoder)> {
    let index = table.column_index(attribute)?;
    let mut recoder = ValueRecoder::new(prefix);

    let values = table
        .records()
        .iter()
        .map(|record| Value::Text(recoder.recode(&record.values()[index])))
        .collect();

    tracing::debug!(attribute, distinct = recoder.count(), "pseudonymized attribute");

    let column =
        Column::new(attribute, ColumnType::Categorical).with_role(table.columns()[index].role);
    let table = table.with_column_replaced(index, column, values)?;
    Ok((table, recoder))
}

/// Collection of recoders for multiple columns
#[derive(Debug, Clone, Default)]
pub struct RecodeRegistry {
    /// Recoders in the order their stages ran, keyed by column name
    recoders: Vec<(String, ValueRecoder)>,
}

impl RecodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, column_name: &str, recoder: ValueRecoder) {
        self.recoders.push((column_name.to_string(), recoder));
    }

    /// Check if any recoding was done
    pub fn has_recodings(&self) -> bool {
        self.recoders.iter().any(|(_, r)| r.count() > 0)
    }

    /// Generate the sidekick file content
    pub fn generate_sidekick_content(&self) -> String {
        let mut lines = Vec::new();
        lines.push("# Pseudonym Recode Mapping".to_string());
        lines.push("# CONFIDENTIAL - Keep this file separate from the released table".to_string());
        lines.push(format!(
            "# Generated: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(String::new());

        for (col_name, recoder) in &self.recoders {
            lines.push(format!("## Column: {}", col_name));
            lines.push(String::new());

            for (recoded, original) in recoder.reverse_mappings() {
                lines.push(format!("{} = {}", recoded, original));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
