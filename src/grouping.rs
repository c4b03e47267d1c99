use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::table::Table;
use crate::types::{AttributeRole, Result, Value};

/// Records indistinguishable on the grouping attributes.
///
/// `rows` index into the table the class was derived from and are never
/// empty when produced by [`group`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquivalenceClass {
    pub key: Vec<Value>,
    pub rows: Vec<usize>,
}

impl EquivalenceClass {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Human readable key, e.g. `(<40, F)`
    pub fn label(&self) -> String {
        ClassKey(&self.key).to_string()
    }
}

/// Display adapter for a grouping key
pub struct ClassKey<'a>(pub &'a [Value]);

impl fmt::Display for ClassKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

/// Partition `table` by its current values on `quasi_identifiers`.
///
/// Classes come out in first-appearance order of their key and list their
/// rows in ascending order, so repeated calls give identical output. No
/// generalization happens here.
pub fn group(table: &Table, quasi_identifiers: &[String]) -> Result<Vec<EquivalenceClass>> {
    let indices = quasi_identifiers
        .iter()
        .map(|name| table.column_index(name))
        .collect::<Result<Vec<_>>>()?;

    let mut positions: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut classes: Vec<EquivalenceClass> = Vec::new();

    for (row, record) in table.records().iter().enumerate() {
        let key: Vec<Value> = indices.iter().map(|&i| record.values()[i].clone()).collect();
        match positions.get(&key) {
            Some(&pos) => classes[pos].rows.push(row),
            None => {
                positions.insert(key.clone(), classes.len());
                classes.push(EquivalenceClass {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    tracing::debug!(
        records = table.len(),
        classes = classes.len(),
        "grouped records into equivalence classes"
    );

    Ok(classes)
}

/// Quasi-identifiers as tagged in the table's schema
pub fn quasi_identifiers_of(table: &Table) -> Vec<String> {
    table.columns_with_role(AttributeRole::QuasiIdentifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::table::{fixtures, Column};
    use crate::types::ColumnType;
    use proptest::prelude::*;

    fn qi(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_by_gender() {
        let table = fixtures::patients();
        let classes = group(&table, &qi(&["Gender"])).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].key, vec![Value::text("M")]);
        assert_eq!(classes[0].rows, vec![0, 3, 4, 7, 9]);
        assert_eq!(classes[1].key, vec![Value::text("F")]);
        assert_eq!(classes[1].rows, vec![1, 2, 5, 6, 8]);
    }

    #[test]
    fn test_group_is_stable() {
        let table = fixtures::patients();
        let names = qi(&["Gender", "Diagnosis"]);
        assert_eq!(group(&table, &names).unwrap(), group(&table, &names).unwrap());
    }

    #[test]
    fn test_group_empty_table() {
        let table = fixtures::patients().select(&[]);
        assert!(group(&table, &qi(&["Gender"])).unwrap().is_empty());
    }

    #[test]
    fn test_group_without_attributes_is_one_class() {
        let table = fixtures::patients();
        let classes = group(&table, &[]).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].len(), 10);
    }

    #[test]
    fn test_group_unknown_attribute() {
        let table = fixtures::patients();
        assert!(matches!(
            group(&table, &qi(&["Zip"])),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn test_label() {
        let class = EquivalenceClass {
            key: vec![Value::text("<40"), Value::text("F")],
            rows: vec![1],
        };
        assert_eq!(class.label(), "(<40, F)");
    }

    #[test]
    fn test_quasi_identifiers_of() {
        assert_eq!(
            quasi_identifiers_of(&fixtures::patients()),
            qi(&["PatientAge", "Gender"])
        );
    }

    proptest! {
        #[test]
        fn prop_classes_partition_table(rows in prop::collection::vec((0i64..4, 0i64..3, any::<i64>()), 0..60)) {
            let columns = vec![
                Column::new("a", ColumnType::Integer),
                Column::new("b", ColumnType::Integer),
                Column::new("c", ColumnType::Integer),
            ];
            let table = Table::from_rows(
                columns,
                rows.iter()
                    .map(|(a, b, c)| vec![Value::Integer(*a), Value::Integer(*b), Value::Integer(*c)])
                    .collect(),
            ).unwrap();

            let classes = group(&table, &qi(&["a", "b"])).unwrap();

            let mut seen: Vec<usize> = classes.iter().flat_map(|c| c.rows.iter().copied()).collect();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..table.len()).collect::<Vec<_>>());

            for class in &classes {
                prop_assert!(!class.is_empty());
                for &row in &class.rows {
                    let record = &table.records()[row];
                    prop_assert_eq!(&record.values()[0..2], class.key.as_slice());
                }
            }
        }
    }
}
