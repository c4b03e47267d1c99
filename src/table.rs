use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::Error;
use crate::types::{AttributeRole, ColumnType, Result, Value};

/// Schema entry for one attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub role: AttributeRole,
}

impl Column {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            role: AttributeRole::Other,
        }
    }

    pub fn with_role(mut self, role: AttributeRole) -> Self {
        self.role = role;
        self
    }
}

/// One row, values aligned with the owning table's columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    fn with_value(&self, index: usize, value: Value) -> Self {
        let mut values = self.values.clone();
        values[index] = value;
        Self { values }
    }

    fn with_appended(&self, value: Value) -> Self {
        let mut values = self.values.clone();
        values.push(value);
        Self { values }
    }
}

/// An immutable, ordered set of records sharing a fixed schema.
///
/// Every transform produces a new `Table`; nothing mutates a table after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    records: Vec<Record>,
}

impl Table {
    /// Build a table, checking that names are unique and every record has
    /// exactly one value per column.
    pub fn new(columns: Vec<Column>, records: Vec<Record>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::schema(&column.name, "duplicate column name"));
            }
        }

        for (row, record) in records.iter().enumerate() {
            if record.values.len() != columns.len() {
                return Err(Error::schema(
                    "*",
                    format!(
                        "record {} has {} values, schema has {} columns",
                        row,
                        record.values.len(),
                        columns.len()
                    ),
                ));
            }
        }

        Ok(Self { columns, records })
    }

    /// Convenience constructor from raw value rows
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        Self::new(columns, rows.into_iter().map(Record::new).collect())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Position of a column, or a schema error naming it
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::missing_attribute(name))
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        let index = self.column_index(name)?;
        Ok(&self.columns[index])
    }

    /// All values of one column in record order
    pub fn column_values(&self, name: &str) -> Result<Vec<&Value>> {
        let index = self.column_index(name)?;
        Ok(self.records.iter().map(|r| &r.values[index]).collect())
    }

    /// Names of the columns tagged with `role`, in schema order
    pub fn columns_with_role(&self, role: AttributeRole) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.role == role)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Apply externally configured roles. Unlisted columns keep their role.
    pub fn with_roles(&self, roles: &BTreeMap<String, AttributeRole>) -> Result<Self> {
        let mut columns = self.columns.clone();
        for (name, role) in roles {
            let index = self.column_index(name)?;
            columns[index].role = *role;
        }
        Ok(Self {
            columns,
            records: self.records.clone(),
        })
    }

    /// New table with the column at `index` replaced by `column`/`values`
    pub(crate) fn with_column_replaced(
        &self,
        index: usize,
        column: Column,
        values: Vec<Value>,
    ) -> Result<Self> {
        self.check_column_len(&column.name, values.len())?;
        if self
            .columns
            .iter()
            .enumerate()
            .any(|(i, c)| i != index && c.name == column.name)
        {
            return Err(Error::schema(&column.name, "column name already in use"));
        }

        let mut columns = self.columns.clone();
        columns[index] = column;
        let records = self
            .records
            .iter()
            .zip(values)
            .map(|(record, value)| record.with_value(index, value))
            .collect();
        Ok(Self { columns, records })
    }

    /// New table with `column`/`values` appended at the end of the schema
    pub(crate) fn with_column_appended(&self, column: Column, values: Vec<Value>) -> Result<Self> {
        self.check_column_len(&column.name, values.len())?;
        if self.has_column(&column.name) {
            return Err(Error::schema(&column.name, "column name already in use"));
        }

        let mut columns = self.columns.clone();
        columns.push(column);
        let records = self
            .records
            .iter()
            .zip(values)
            .map(|(record, value)| record.with_appended(value))
            .collect();
        Ok(Self { columns, records })
    }

    /// New table keeping only the records at `indices` (in the given order)
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            records: indices
                .iter()
                .filter_map(|&i| self.records.get(i).cloned())
                .collect(),
        }
    }

    fn check_column_len(&self, name: &str, len: usize) -> Result<()> {
        if len != self.records.len() {
            return Err(Error::InternalConsistency(format!(
                "column '{}' has {} values for {} records",
                name,
                len,
                self.records.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const AGES: [i64; 10] = [34, 29, 45, 50, 38, 42, 31, 46, 55, 37];
    pub const GENDERS: [&str; 10] = ["M", "F", "F", "M", "M", "F", "F", "M", "F", "M"];
    pub const DIAGNOSES: [&str; 10] = [
        "Flu", "Cold", "Flu", "Diabetes", "Cold", "Flu", "Asthma", "Cold", "Diabetes", "Flu",
    ];

    /// Ten-patient table used across module tests
    pub fn patients() -> Table {
        let columns = vec![
            Column::new("PatientID", ColumnType::Integer).with_role(AttributeRole::Identifier),
            Column::new("PatientAge", ColumnType::Integer)
                .with_role(AttributeRole::QuasiIdentifier),
            Column::new("Gender", ColumnType::Categorical)
                .with_role(AttributeRole::QuasiIdentifier),
            Column::new("Diagnosis", ColumnType::Categorical).with_role(AttributeRole::Sensitive),
        ];
        let rows = (0..10)
            .map(|i| {
                vec![
                    Value::Integer(1001 + i as i64),
                    Value::Integer(AGES[i]),
                    Value::text(GENDERS[i]),
                    Value::text(DIAGNOSES[i]),
                ]
            })
            .collect();
        Table::from_rows(columns, rows).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged_records() {
        let columns = vec![
            Column::new("a", ColumnType::Integer),
            Column::new("b", ColumnType::Integer),
        ];
        let result = Table::from_rows(columns, vec![vec![Value::Integer(1)]]);
        assert!(matches!(result, Err(Error::Schema { .. })));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let columns = vec![
            Column::new("a", ColumnType::Integer),
            Column::new("a", ColumnType::Categorical),
        ];
        let result = Table::from_rows(columns, vec![]);
        assert!(matches!(result, Err(Error::Schema { attribute, .. }) if attribute == "a"));
    }

    #[test]
    fn test_column_lookup() {
        let table = fixtures::patients();
        assert_eq!(table.len(), 10);
        assert_eq!(table.column_index("Gender").unwrap(), 2);
        assert!(matches!(
            table.column_index("Zip"),
            Err(Error::Schema { attribute, .. }) if attribute == "Zip"
        ));
        let ages = table.column_values("PatientAge").unwrap();
        assert_eq!(ages[0], &Value::Integer(34));
    }

    #[test]
    fn test_columns_with_role() {
        let table = fixtures::patients();
        assert_eq!(
            table.columns_with_role(AttributeRole::QuasiIdentifier),
            vec!["PatientAge".to_string(), "Gender".to_string()]
        );
        assert_eq!(
            table.columns_with_role(AttributeRole::Sensitive),
            vec!["Diagnosis".to_string()]
        );
    }

    #[test]
    fn test_with_roles_does_not_touch_original() {
        let table = fixtures::patients();
        let mut roles = BTreeMap::new();
        roles.insert("Gender".to_string(), AttributeRole::Other);
        let retagged = table.with_roles(&roles).unwrap();

        assert_eq!(retagged.column("Gender").unwrap().role, AttributeRole::Other);
        assert_eq!(
            table.column("Gender").unwrap().role,
            AttributeRole::QuasiIdentifier
        );
    }

    #[test]
    fn test_with_roles_unknown_attribute() {
        let table = fixtures::patients();
        let mut roles = BTreeMap::new();
        roles.insert("Zip".to_string(), AttributeRole::QuasiIdentifier);
        assert!(matches!(table.with_roles(&roles), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_select_keeps_order() {
        let table = fixtures::patients();
        let selected = table.select(&[3, 0]);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.records()[0].get(1), Some(&Value::Integer(50)));
        assert_eq!(selected.records()[1].get(1), Some(&Value::Integer(34)));
    }

    #[test]
    fn test_append_rejects_name_collision() {
        let table = fixtures::patients();
        let values = vec![Value::Missing; table.len()];
        let result =
            table.with_column_appended(Column::new("Gender", ColumnType::Categorical), values);
        assert!(matches!(result, Err(Error::Schema { .. })));
    }
}
