// src/sheets/query/sort.rs
// Sort rules -> OrderExpression. Single-column sort: only the first rule is
// applied, followed by the ascending row position tie-break that keeps
// offset pagination stable.

use super::condition::{OrderExpression, OrderKey, OrderSource};
use super::{ColumnCatalog, SortRule};

pub fn compile_sort(sorting: &[SortRule], catalog: &ColumnCatalog) -> OrderExpression {
    let Some(rule) = sorting.first() else {
        return OrderExpression::by_position();
    };
    if sorting.len() > 1 {
        tracing::debug!(
            "Ignoring {} secondary sort rule(s); only '{}' is applied",
            sorting.len() - 1,
            rule.column_id
        );
    }

    match catalog.data_type(&rule.column_id) {
        Some(data_type) => OrderExpression::with_primary(vec![OrderKey {
            source: OrderSource::CellValue {
                column_id: rule.column_id.clone(),
                numeric: data_type.is_numeric(),
            },
            direction: rule.direction,
        }]),
        None => {
            tracing::debug!("Dropping sort on unknown column '{}'", rule.column_id);
            OrderExpression::by_position()
        }
    }
}
