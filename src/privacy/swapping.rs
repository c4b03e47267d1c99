use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::table::Table;
use crate::types::{Result, Value};

/// Shuffle the values of `attribute` across records with a generator seeded
/// from `seed`. Same table, attribute and seed always give the same output.
pub fn swap(table: &Table, attribute: &str, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    swap_with_rng(table, attribute, &mut rng)
}

/// Shuffle the values of `attribute` using a caller-provided generator.
///
/// The column's multiset of values is preserved; only the pairing between
/// records and values changes. Tables with at most one record come back
/// unchanged.
pub fn swap_with_rng<R: Rng + ?Sized>(table: &Table, attribute: &str, rng: &mut R) -> Result<Table> {
    let index = table.column_index(attribute)?;
    if table.len() <= 1 {
        return Ok(table.clone());
    }

    let mut values: Vec<Value> = table
        .records()
        .iter()
        .map(|r| r.values()[index].clone())
        .collect();
    values.shuffle(rng);

    tracing::debug!(attribute, records = table.len(), "swapped attribute values");

    let column = table.columns()[index].clone();
    table.with_column_replaced(index, column, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::table::{fixtures, Column};
    use crate::types::ColumnType;
    use proptest::prelude::*;

    fn sorted_column(table: &Table, attribute: &str) -> Vec<Value> {
        let mut values: Vec<Value> = table
            .column_values(attribute)
            .unwrap()
            .into_iter()
            .cloned()
            .collect();
        values.sort();
        values
    }

    fn int_table(values: &[i64]) -> Table {
        let columns = vec![
            Column::new("id", ColumnType::Integer),
            Column::new("x", ColumnType::Integer),
        ];
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| vec![Value::Integer(i as i64), Value::Integer(*v)])
            .collect();
        Table::from_rows(columns, rows).unwrap()
    }

    #[test]
    fn test_swap_preserves_other_columns() {
        let table = fixtures::patients();
        let out = swap(&table, "Diagnosis", 42).unwrap();
        assert_eq!(
            out.column_values("PatientID").unwrap(),
            table.column_values("PatientID").unwrap()
        );
        assert_eq!(sorted_column(&out, "Diagnosis"), sorted_column(&table, "Diagnosis"));
    }

    #[test]
    fn test_swap_single_record_is_noop() {
        let table = fixtures::patients().select(&[0]);
        assert_eq!(swap(&table, "Diagnosis", 7).unwrap(), table);
    }

    #[test]
    fn test_swap_empty_table_is_noop() {
        let table = fixtures::patients().select(&[]);
        assert_eq!(swap(&table, "Diagnosis", 7).unwrap(), table);
    }

    #[test]
    fn test_swap_unknown_attribute() {
        let table = fixtures::patients();
        assert!(matches!(swap(&table, "Zip", 1), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_swap_changes_pairing_for_some_seed() {
        let table = int_table(&(0..50).collect::<Vec<_>>());
        let moved = (0..20u64).any(|seed| swap(&table, "x", seed).unwrap() != table);
        assert!(moved);
    }

    proptest! {
        #[test]
        fn prop_swap_preserves_multiset(values in prop::collection::vec(-100i64..100, 0..40), seed in any::<u64>()) {
            let table = int_table(&values);
            let out = swap(&table, "x", seed).unwrap();
            prop_assert_eq!(sorted_column(&out, "x"), sorted_column(&table, "x"));
            prop_assert_eq!(out.len(), table.len());
        }

        #[test]
        fn prop_swap_is_deterministic(values in prop::collection::vec(-100i64..100, 0..40), seed in any::<u64>()) {
            let table = int_table(&values);
            prop_assert_eq!(swap(&table, "x", seed).unwrap(), swap(&table, "x", seed).unwrap());
        }
    }
}
