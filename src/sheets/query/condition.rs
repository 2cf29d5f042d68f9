// src/sheets/query/condition.rs
//! Small condition/ordering AST shared by the predicate and sort compilers.
//!
//! Nothing here touches a connection. `Condition::render` and
//! `OrderExpression::render` lower the tree to a SQL fragment plus bound
//! parameters, and `CellTest::matches` / `OrderKey::compare` evaluate the same
//! semantics over plain values so callers (and tests) can check results
//! without a store.

use super::SortDirection;
use crate::sheets::database::functions::{fold_case, parse_number};
use crate::sheets::database::schema::CELLS;
use rusqlite::types::Value;
use std::cmp::Ordering;

/// SQL text with positional `?` placeholders and their values, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub fn push_param(&mut self, value: impl Into<Value>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    pub fn append(&mut self, other: SqlFragment) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
        self
    }
}

/// Test applied to the single cell a filter targets. Text operands are
/// stored already case-folded.
#[derive(Debug, Clone, PartialEq)]
pub enum CellTest {
    EqualsText(String),
    EqualsNumber(f64),
    Contains(String),
    NotContains(String),
    GreaterThan(f64),
    LessThan(f64),
    IsEmpty,
    IsNotEmpty,
}

impl CellTest {
    /// Evaluate against a stored value (None = NULL).
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            CellTest::EqualsText(expected) => value.is_some_and(|v| fold_case(v) == *expected),
            CellTest::EqualsNumber(n) => value.and_then(parse_number).is_some_and(|v| v == *n),
            CellTest::Contains(needle) => value.is_some_and(|v| fold_case(v).contains(needle.as_str())),
            CellTest::NotContains(needle) => {
                value.map_or(true, |v| !fold_case(v).contains(needle.as_str()))
            }
            CellTest::GreaterThan(n) => value.and_then(parse_number).is_some_and(|v| v > *n),
            CellTest::LessThan(n) => value.and_then(parse_number).is_some_and(|v| v < *n),
            CellTest::IsEmpty => value.map_or(true, str::is_empty),
            CellTest::IsNotEmpty => value.is_some_and(|v| !v.is_empty()),
        }
    }

    fn render(&self, value_expr: &str, out: &mut SqlFragment) {
        match self {
            CellTest::EqualsText(expected) => {
                out.push_sql(&format!("fold_case({}) = ", value_expr))
                    .push_param(expected.clone());
            }
            CellTest::EqualsNumber(n) => {
                out.push_sql(&format!("try_real({}) = ", value_expr)).push_param(*n);
            }
            CellTest::Contains(needle) => {
                out.push_sql(&format!("instr(fold_case({}), ", value_expr))
                    .push_param(needle.clone())
                    .push_sql(") > 0");
            }
            CellTest::NotContains(needle) => {
                out.push_sql(&format!(
                    "({v} IS NULL OR instr(fold_case({v}), ",
                    v = value_expr
                ))
                .push_param(needle.clone())
                .push_sql(") = 0)");
            }
            CellTest::GreaterThan(n) => {
                out.push_sql(&format!("try_real({}) > ", value_expr)).push_param(*n);
            }
            CellTest::LessThan(n) => {
                out.push_sql(&format!("try_real({}) < ", value_expr)).push_param(*n);
            }
            CellTest::IsEmpty => {
                out.push_sql(&format!("({v} IS NULL OR {v} = '')", v = value_expr));
            }
            CellTest::IsNotEmpty => {
                out.push_sql(&format!("({v} IS NOT NULL AND {v} <> '')", v = value_expr));
            }
        }
    }
}

/// Per-row boolean condition over the cell store.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Always,
    Never,
    /// Row belongs to the given table.
    InTable(String),
    /// A cell exists for this row and column and passes `test`.
    CellMatches { column_id: String, test: CellTest },
    And(Vec<Condition>),
}

impl Condition {
    /// Conjunction with constant folding: `Always` operands vanish, any
    /// `Never` operand collapses the whole conjunction.
    pub fn all(parts: impl IntoIterator<Item = Condition>) -> Condition {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Condition::Always => {}
                Condition::Never => return Condition::Never,
                Condition::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Condition::Always,
            1 => flat.pop().unwrap_or(Condition::Always),
            _ => Condition::And(flat),
        }
    }

    /// Lower to a WHERE-clause fragment. `row_alias` names the row table in
    /// the enclosing query.
    pub fn render(&self, row_alias: &str) -> SqlFragment {
        let mut out = SqlFragment::new();
        self.render_into(row_alias, &mut out);
        out
    }

    fn render_into(&self, row_alias: &str, out: &mut SqlFragment) {
        match self {
            Condition::Always => {
                out.push_sql("1 = 1");
            }
            Condition::Never => {
                out.push_sql("0 = 1");
            }
            Condition::InTable(table_id) => {
                out.push_sql(&format!("{}.table_id = ", row_alias))
                    .push_param(table_id.clone());
            }
            Condition::CellMatches { column_id, test } => {
                out.push_sql(&format!(
                    "EXISTS (SELECT 1 FROM {} fc WHERE fc.row_id = {}.id AND fc.column_id = ",
                    CELLS, row_alias
                ))
                .push_param(column_id.clone())
                .push_sql(" AND ");
                test.render("fc.value", out);
                out.push_sql(")");
            }
            Condition::And(parts) => {
                if parts.is_empty() {
                    out.push_sql("1 = 1");
                    return;
                }
                for (idx, part) in parts.iter().enumerate() {
                    if idx > 0 {
                        out.push_sql(" AND ");
                    }
                    out.push_sql("(");
                    part.render_into(row_alias, out);
                    out.push_sql(")");
                }
            }
        }
    }

    /// Number of per-cell predicates in this condition.
    pub fn cell_predicate_count(&self) -> usize {
        match self {
            Condition::CellMatches { .. } => 1,
            Condition::And(parts) => parts.iter().map(Condition::cell_predicate_count).sum(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderSource {
    /// Value of the row's cell in this column; `numeric` compares through
    /// `try_real`, otherwise case-folded text.
    CellValue { column_id: String, numeric: bool },
    Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub source: OrderSource,
    pub direction: SortDirection,
}

impl OrderKey {
    /// Compare two stored values the way the rendered ORDER BY does: empty
    /// values and (for numeric keys) unparsable values go last in both
    /// directions.
    pub fn compare(&self, a: Option<&str>, b: Option<&str>) -> Ordering {
        let numeric = matches!(self.source, OrderSource::CellValue { numeric: true, .. });
        if numeric {
            let (a, b) = (a.and_then(parse_number), b.and_then(parse_number));
            match (a, b) {
                (Some(x), Some(y)) => self.directed(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        } else {
            let (a, b) = (a.filter(|v| !v.is_empty()), b.filter(|v| !v.is_empty()));
            match (a, b) {
                (Some(x), Some(y)) => self.directed(fold_case(x).cmp(&fold_case(y))),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Ordered list of sort keys. Always ends with ascending row position.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpression {
    keys: Vec<OrderKey>,
}

impl Default for OrderExpression {
    fn default() -> Self {
        Self::by_position()
    }
}

impl OrderExpression {
    pub fn by_position() -> Self {
        Self {
            keys: vec![OrderKey {
                source: OrderSource::Position,
                direction: SortDirection::Asc,
            }],
        }
    }

    /// Primary keys followed by the position tie-break.
    pub fn with_primary(primary: impl IntoIterator<Item = OrderKey>) -> Self {
        let mut keys: Vec<OrderKey> = primary
            .into_iter()
            .filter(|k| k.source != OrderSource::Position)
            .collect();
        keys.push(OrderKey {
            source: OrderSource::Position,
            direction: SortDirection::Asc,
        });
        Self { keys }
    }

    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    pub fn is_position_only(&self) -> bool {
        self.keys.len() == 1
    }

    /// Lower to `(joins, order_by)`: LEFT JOINs that expose each sorted cell
    /// and the ORDER BY list that uses them.
    pub fn render(&self, row_alias: &str) -> (SqlFragment, String) {
        let mut joins = SqlFragment::new();
        let mut terms = Vec::new();

        for (idx, key) in self.keys.iter().enumerate() {
            match &key.source {
                OrderSource::Position => {
                    terms.push(format!("{}.position {}", row_alias, key.direction.as_sql()));
                }
                OrderSource::CellValue { column_id, numeric } => {
                    let alias = format!("sc{}", idx);
                    joins
                        .push_sql(&format!(
                            " LEFT JOIN {cells} {a} ON {a}.row_id = {r}.id AND {a}.column_id = ",
                            cells = CELLS,
                            a = alias,
                            r = row_alias
                        ))
                        .push_param(column_id.clone());
                    let expr = if *numeric {
                        format!("try_real({}.value)", alias)
                    } else {
                        format!("fold_case(NULLIF({}.value, ''))", alias)
                    };
                    // `x IS NULL` sorts 0 before 1 whatever the key direction.
                    terms.push(format!("{} IS NULL", expr));
                    terms.push(format!("{} {}", expr, key.direction.as_sql()));
                }
            }
        }

        (joins, terms.join(", "))
    }
}
