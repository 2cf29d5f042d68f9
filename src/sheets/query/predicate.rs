// src/sheets/query/predicate.rs
// Filter rule -> Condition. A rule that cannot be interpreted is dropped
// (None) rather than failing the page; a rule whose operand cannot be cast
// for a numeric comparison compiles to `Condition::Never`.

use super::condition::{CellTest, Condition};
use super::{ColumnCatalog, FilterOperator, FilterRule};
use crate::sheets::database::functions::{fold_case, parse_number};

pub fn compile_filter(filter: &FilterRule, catalog: &ColumnCatalog) -> Option<Condition> {
    let Some(data_type) = catalog.data_type(&filter.column_id) else {
        tracing::debug!(
            "Dropping filter on unknown column '{}'",
            filter.column_id
        );
        return None;
    };

    let operand = filter.value.as_deref();
    if filter.operator.requires_value() && operand.is_none() {
        tracing::debug!(
            "Dropping {:?} filter on '{}' without a value",
            filter.operator,
            filter.column_id
        );
        return None;
    }
    let operand = operand.unwrap_or_default();

    let numeric_test = |build: fn(f64) -> CellTest| parse_number(operand).map(build);

    let test = match filter.operator {
        FilterOperator::Equals if data_type.is_numeric() => numeric_test(CellTest::EqualsNumber),
        FilterOperator::Equals => Some(CellTest::EqualsText(fold_case(operand))),
        FilterOperator::Contains => Some(CellTest::Contains(fold_case(operand))),
        FilterOperator::NotContains => Some(CellTest::NotContains(fold_case(operand))),
        FilterOperator::GreaterThan => numeric_test(CellTest::GreaterThan),
        FilterOperator::LessThan => numeric_test(CellTest::LessThan),
        FilterOperator::IsEmpty => Some(CellTest::IsEmpty),
        FilterOperator::IsNotEmpty => Some(CellTest::IsNotEmpty),
    };

    match test {
        Some(test) => Some(Condition::CellMatches {
            column_id: filter.column_id.clone(),
            test,
        }),
        None => {
            tracing::debug!(
                "Filter {:?} on '{}' has non-numeric operand '{}', matching nothing",
                filter.operator,
                filter.column_id,
                operand
            );
            Some(Condition::Never)
        }
    }
}

/// Compile every interpretable rule; the result is meant to be AND-ed.
pub fn compile_filters(filters: &[FilterRule], catalog: &ColumnCatalog) -> Vec<Condition> {
    filters
        .iter()
        .filter_map(|f| compile_filter(f, catalog))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::definitions::{ColumnDataType, ColumnDefinition};

    fn catalog() -> ColumnCatalog {
        let col = |id: &str, data_type, position| ColumnDefinition {
            id: id.to_string(),
            table_id: "t".to_string(),
            name: id.to_uppercase(),
            data_type,
            position,
        };
        ColumnCatalog::new(vec![
            col("name", ColumnDataType::Text, 0),
            col("age", ColumnDataType::Number, 1),
        ])
    }

    #[test]
    fn test_unknown_column_is_dropped() {
        let f = FilterRule::new("gone", FilterOperator::Equals, Some("x"));
        assert_eq!(compile_filter(&f, &catalog()), None);
    }

    #[test]
    fn test_missing_required_value_is_dropped() {
        let f = FilterRule::new("name", FilterOperator::Contains, None);
        assert_eq!(compile_filter(&f, &catalog()), None);
        let empty = FilterRule::new("name", FilterOperator::IsEmpty, None);
        assert!(compile_filter(&empty, &catalog()).is_some());
    }

    #[test]
    fn test_equals_uses_declared_type() {
        let text = compile_filter(
            &FilterRule::new("name", FilterOperator::Equals, Some("Bob")),
            &catalog(),
        );
        assert_eq!(
            text,
            Some(Condition::CellMatches {
                column_id: "name".into(),
                test: CellTest::EqualsText("bob".into())
            })
        );
        let number = compile_filter(
            &FilterRule::new("age", FilterOperator::Equals, Some("30")),
            &catalog(),
        );
        assert_eq!(
            number,
            Some(Condition::CellMatches {
                column_id: "age".into(),
                test: CellTest::EqualsNumber(30.0)
            })
        );
    }

    #[test]
    fn test_request_type_does_not_override_catalog() {
        let mut f = FilterRule::new("name", FilterOperator::Equals, Some("30"));
        f.data_type = Some(ColumnDataType::Number);
        assert!(matches!(
            compile_filter(&f, &catalog()),
            Some(Condition::CellMatches { test: CellTest::EqualsText(_), .. })
        ));
    }

    #[test]
    fn test_non_numeric_operand_matches_nothing() {
        let f = FilterRule::new("age", FilterOperator::GreaterThan, Some("abc"));
        assert_eq!(compile_filter(&f, &catalog()), Some(Condition::Never));
    }

    #[test]
    fn test_compile_filters_skips_dropped_rules() {
        let rules = vec![
            FilterRule::new("age", FilterOperator::LessThan, Some("40")),
            FilterRule::new("deleted-col", FilterOperator::IsEmpty, None),
        ];
        assert_eq!(compile_filters(&rules, &catalog()).len(), 1);
    }
}
