// src/sheets/query/search.rs
// Free-text search over column names and the cells of one fetched page.

use super::{PageItem, SearchMatch};
use crate::sheets::database::functions::fold_case;
use crate::sheets::definitions::ColumnDefinition;

/// Case-insensitive substring scan. Column matches come first in display
/// order, then cell matches in page order. Only the given page is searched;
/// `cursor` turns page-local indices into absolute result indices.
pub fn find_matches(
    term: &str,
    columns: &[ColumnDefinition],
    items: &[PageItem],
    cursor: u64,
) -> Vec<SearchMatch> {
    let needle = fold_case(term.trim());
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<SearchMatch> = columns
        .iter()
        .filter(|c| fold_case(&c.name).contains(&needle))
        .map(|c| SearchMatch::Column {
            column_id: c.id.clone(),
        })
        .collect();

    for (idx, item) in items.iter().enumerate() {
        for cell in &item.cells {
            let hit = cell
                .value
                .as_deref()
                .is_some_and(|v| fold_case(v).contains(&needle));
            if hit {
                matches.push(SearchMatch::Cell {
                    cell_id: cell.cell_id,
                    column_id: cell.column_id.clone(),
                    row_index: cursor + idx as u64,
                });
            }
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::definitions::ColumnDataType;
    use crate::sheets::query::PageCell;

    fn column(id: &str, name: &str, position: i64) -> ColumnDefinition {
        ColumnDefinition {
            id: id.to_string(),
            table_id: "t".to_string(),
            name: name.to_string(),
            data_type: ColumnDataType::Text,
            position,
        }
    }

    fn item(row_id: i64, values: &[(i64, &str, Option<&str>)]) -> PageItem {
        PageItem {
            row_id,
            position: row_id,
            cells: values
                .iter()
                .map(|(cell_id, column_id, value)| PageCell {
                    cell_id: *cell_id,
                    column_id: column_id.to_string(),
                    value: value.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn test_matches_columns_and_cells_case_insensitively() {
        let columns = vec![column("c1", "Name", 0), column("c2", "Nickname", 1)];
        let items = vec![
            item(1, &[(10, "c1", Some("Bob")), (11, "c2", Some("bobby"))]),
            item(2, &[(20, "c1", Some("Alice")), (21, "c2", None)]),
        ];

        let matches = find_matches("BOB", &columns, &items, 40);
        assert_eq!(
            matches,
            vec![
                SearchMatch::Cell {
                    cell_id: 10,
                    column_id: "c1".to_string(),
                    row_index: 40
                },
                SearchMatch::Cell {
                    cell_id: 11,
                    column_id: "c2".to_string(),
                    row_index: 40
                },
            ]
        );

        let matches = find_matches(" name ", &columns, &items, 0);
        assert_eq!(matches.len(), 2);
        assert!(matches
            .iter()
            .all(|m| matches!(m, SearchMatch::Column { .. })));
    }

    #[test]
    fn test_row_index_is_absolute() {
        let columns = vec![column("c1", "Name", 0)];
        let items = vec![
            item(1, &[(10, "c1", Some("x"))]),
            item(2, &[(20, "c1", Some("xyz"))]),
        ];
        let matches = find_matches("xy", &columns, &items, 100);
        assert_eq!(
            matches,
            vec![SearchMatch::Cell {
                cell_id: 20,
                column_id: "c1".to_string(),
                row_index: 101
            }]
        );
    }

    #[test]
    fn test_blank_term_matches_nothing() {
        let columns = vec![column("c1", "Name", 0)];
        assert!(find_matches("   ", &columns, &[], 0).is_empty());
    }
}
