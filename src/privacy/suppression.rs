use crate::table::{Column, Table};
use crate::types::{ColumnType, Result, Value};

/// Replace every value of `attribute` with the fixed `mask` token.
///
/// Equivalent to generalizing with a constant rule; the only failure is an
/// unknown attribute.
pub fn suppress(table: &Table, attribute: &str, mask: &str) -> Result<Table> {
    let index = table.column_index(attribute)?;
    let source = &table.columns()[index];

    let column = Column::new(attribute, ColumnType::Categorical).with_role(source.role);
    let values = vec![Value::text(mask); table.len()];

    tracing::debug!(attribute, records = table.len(), "suppressed attribute");

    table.with_column_replaced(index, column, values)
}
