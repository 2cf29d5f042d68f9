// src/sheets/database/writer/mod.rs
// Main writer module - orchestrates all database write operations

pub mod helpers;
pub mod insertions;
mod deletions;
mod updates;
mod views;
pub(crate) mod test_helpers;

use super::error::DbResult;
use crate::sheets::definitions::{
    CellRecord, ColumnDataType, ColumnDefinition, RowRecord, TableInfo, TableSeed, ViewDefinition,
};
use crate::sheets::query::{FilterRule, SortRule};
use rusqlite::Connection;

pub use insertions::NewCell;

/// Database writer - provides all write operations
///
/// This struct delegates to specialized modules:
/// - `insertions`: Tables, columns, rows and their cell fan-out
/// - `updates`: Cell values, names and column order
/// - `deletions`: Row, column, table and view removal
/// - `views`: Saved view persistence
pub struct DbWriter;

impl DbWriter {
    // ============================================================================
    // INSERTIONS - See insertions.rs
    // ============================================================================

    /// Create a table seeded with columns, rows and the full cell cross product
    pub fn create_table(
        conn: &Connection,
        owner: &str,
        name: &str,
        seed: &TableSeed,
    ) -> DbResult<TableInfo> {
        insertions::create_table(conn, owner, name, seed)
    }

    /// Append a column (position = max + 1) with a NULL cell for every row
    pub fn add_column(
        conn: &Connection,
        table_id: &str,
        name: &str,
        data_type: ColumnDataType,
    ) -> DbResult<ColumnDefinition> {
        insertions::add_column(conn, table_id, name, data_type)
    }

    /// Append a row with a cell for every column
    pub fn add_row(
        conn: &Connection,
        table_id: &str,
        values: &[(String, Option<String>)],
    ) -> DbResult<RowRecord> {
        insertions::add_row(conn, table_id, values)
    }

    /// Insert `count` bare rows (no cells); caller owns the transaction
    pub fn insert_rows(conn: &Connection, table_id: &str, count: usize) -> DbResult<Vec<RowRecord>> {
        insertions::insert_rows(conn, table_id, count)
    }

    /// Multi-row cell insert; caller owns the transaction
    pub fn insert_cells(conn: &Connection, cells: &[NewCell<'_>]) -> DbResult<usize> {
        insertions::insert_cells(conn, cells)
    }

    // ============================================================================
    // UPDATES - See updates.rs
    // ============================================================================

    /// Update a single cell (None stores NULL)
    pub fn update_cell(
        conn: &Connection,
        row_id: i64,
        column_id: &str,
        value: Option<&str>,
    ) -> DbResult<CellRecord> {
        updates::update_cell(conn, row_id, column_id, value)
    }

    pub fn rename_column(conn: &Connection, column_id: &str, new_name: &str) -> DbResult<()> {
        updates::rename_column(conn, column_id, new_name)
    }

    pub fn rename_table(conn: &Connection, table_id: &str, new_name: &str) -> DbResult<()> {
        updates::rename_table(conn, table_id, new_name)
    }

    /// Update column ordering
    pub fn update_column_positions(
        conn: &Connection,
        table_id: &str,
        ordered_ids: &[String],
    ) -> DbResult<()> {
        updates::update_column_positions(conn, table_id, ordered_ids)
    }

    // ============================================================================
    // DELETIONS - See deletions.rs
    // ============================================================================

    pub fn delete_row(conn: &Connection, row_id: i64) -> DbResult<()> {
        deletions::delete_row(conn, row_id)
    }

    /// Delete a column and re-densify the remaining positions
    pub fn delete_column(conn: &Connection, column_id: &str) -> DbResult<()> {
        deletions::delete_column(conn, column_id)
    }

    pub fn delete_table(conn: &Connection, table_id: &str) -> DbResult<()> {
        deletions::delete_table(conn, table_id)
    }

    pub fn delete_view(conn: &Connection, table_id: &str, name: &str) -> DbResult<()> {
        deletions::delete_view(conn, table_id, name)
    }

    // ============================================================================
    // VIEWS - See views.rs
    // ============================================================================

    pub fn save_view(
        conn: &Connection,
        table_id: &str,
        name: &str,
        filters: &[FilterRule],
        sorting: &[SortRule],
        hidden_columns: &[String],
    ) -> DbResult<ViewDefinition> {
        views::save_view(conn, table_id, name, filters, sorting, hidden_columns)
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::{setup_people_table, setup_store_conn, TEST_OWNER};
    use super::*;
    use crate::sheets::database::validation::validate_cell_fanout;
    use crate::sheets::database::{DbError, DbReader};
    use crate::sheets::query::{FilterOperator, SortDirection};

    fn cell_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM sheet_cells", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_create_table_seeds_full_cross_product() {
        let conn = setup_store_conn();
        let table = DbWriter::create_table(&conn, TEST_OWNER, "Main", &TableSeed::default()).unwrap();

        let columns = DbReader::read_columns(&conn, &table.id).unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Age"]);
        assert_eq!(columns[1].data_type, ColumnDataType::Number);
        assert_eq!(columns.iter().map(|c| c.position).collect::<Vec<_>>(), vec![0, 1]);

        let rows = DbReader::read_rows(&conn, &table.id).unwrap();
        assert_eq!(rows.iter().map(|r| r.position).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(cell_count(&conn), 6);
    }

    #[test]
    fn test_create_table_rejects_blank_name() {
        let conn = setup_store_conn();
        let err = DbWriter::create_table(&conn, TEST_OWNER, "  ", &TableSeed::default()).unwrap_err();
        assert!(err.is_validation());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sheet_tables", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_add_column_appends_and_fans_out() {
        let conn = setup_store_conn();
        let (table, _) = setup_people_table(&conn, &[(Some("Bob"), Some("30")), (None, None)]);
        let before = cell_count(&conn);

        let col = DbWriter::add_column(&conn, &table.id, "Email", ColumnDataType::Text).unwrap();
        assert_eq!(col.position, 2);
        assert_eq!(cell_count(&conn), before + 2);

        for row in DbReader::read_rows(&conn, &table.id).unwrap() {
            let cell = DbReader::read_cell(&conn, row.id, &col.id).unwrap().unwrap();
            assert_eq!(cell.value, None);
        }
    }

    #[test]
    fn test_add_column_to_missing_table_fails() {
        let conn = setup_store_conn();
        let err = DbWriter::add_column(&conn, "nope", "X", ColumnDataType::Text).unwrap_err();
        assert!(matches!(err, DbError::TableNotFound(_)));
    }

    #[test]
    fn test_add_row_sets_values_and_rejects_unknown_columns() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[]);
        let row = DbWriter::add_row(
            &conn,
            &table.id,
            &[(cols[0].id.clone(), Some("Ann".to_string()))],
        )
        .unwrap();
        assert_eq!(row.position, 0);
        let name = DbReader::read_cell(&conn, row.id, &cols[0].id).unwrap().unwrap();
        assert_eq!(name.value.as_deref(), Some("Ann"));
        let age = DbReader::read_cell(&conn, row.id, &cols[1].id).unwrap().unwrap();
        assert_eq!(age.value, None);

        let err = DbWriter::add_row(&conn, &table.id, &[("bogus".to_string(), None)]).unwrap_err();
        assert!(matches!(err, DbError::ColumnNotFound(_)));
        assert_eq!(DbReader::count_rows(&conn, &table.id).unwrap(), 1);
    }

    #[test]
    fn test_row_positions_are_never_reused() {
        let conn = setup_store_conn();
        let (table, _) = setup_people_table(&conn, &[(None, None), (None, None)]);
        let rows = DbReader::read_rows(&conn, &table.id).unwrap();
        DbWriter::delete_row(&conn, rows[1].id).unwrap();
        let next = DbWriter::add_row(&conn, &table.id, &[]).unwrap();
        assert_eq!(next.position, 2);
    }

    #[test]
    fn test_update_cell_last_write_wins() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[(Some("Bob"), None)]);
        let row = DbReader::read_rows(&conn, &table.id).unwrap()[0];

        DbWriter::update_cell(&conn, row.id, &cols[1].id, Some("41")).unwrap();
        let updated = DbWriter::update_cell(&conn, row.id, &cols[1].id, Some("42")).unwrap();
        assert_eq!(updated.value.as_deref(), Some("42"));
        let stored = DbReader::read_cell(&conn, row.id, &cols[1].id).unwrap().unwrap();
        assert_eq!(stored.id, updated.id);
        assert_eq!(stored.value.as_deref(), Some("42"));

        DbWriter::update_cell(&conn, row.id, &cols[0].id, None).unwrap();
        let cleared = DbReader::read_cell(&conn, row.id, &cols[0].id).unwrap().unwrap();
        assert_eq!(cleared.value, None);
    }

    #[test]
    fn test_update_cell_reports_missing_targets() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[(None, None)]);
        let row = DbReader::read_rows(&conn, &table.id).unwrap()[0];
        assert!(matches!(
            DbWriter::update_cell(&conn, 999, &cols[0].id, Some("x")),
            Err(DbError::RowNotFound(999))
        ));
        assert!(matches!(
            DbWriter::update_cell(&conn, row.id, "nope", Some("x")),
            Err(DbError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_delete_column_cascades_and_compacts_positions() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[(Some("A"), Some("1"))]);
        let third = DbWriter::add_column(&conn, &table.id, "City", ColumnDataType::Text).unwrap();
        DbWriter::delete_column(&conn, &cols[0].id).unwrap();

        let remaining = DbReader::read_columns(&conn, &table.id).unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].id, cols[1].id);
        assert_eq!(remaining[0].position, 0);
        assert_eq!(remaining[1].id, third.id);
        assert_eq!(remaining[1].position, 1);
        assert_eq!(cell_count(&conn), 2);

        let again = DbWriter::add_column(&conn, &table.id, "Zip", ColumnDataType::Number).unwrap();
        assert_eq!(again.position, 2);
    }

    #[test]
    fn test_delete_table_cascades_everything() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[(Some("A"), Some("1"))]);
        DbWriter::save_view(&conn, &table.id, "All", &[], &[], &[]).unwrap();
        DbWriter::delete_table(&conn, &table.id).unwrap();

        assert!(!DbReader::table_exists(&conn, &table.id).unwrap());
        assert!(DbReader::get_column(&conn, &cols[0].id).unwrap().is_none());
        assert_eq!(cell_count(&conn), 0);
        assert!(DbReader::list_views(&conn, &table.id).unwrap().is_empty());
        assert!(matches!(
            DbWriter::delete_table(&conn, &table.id),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_update_column_positions_reorders_without_collision() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[]);
        let city = DbWriter::add_column(&conn, &table.id, "City", ColumnDataType::Text).unwrap();

        DbWriter::update_column_positions(&conn, &table.id, &[city.id.clone(), cols[0].id.clone()])
            .unwrap();
        let names: Vec<String> = DbReader::read_columns(&conn, &table.id)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["City", "Name", "Age"]);
    }

    #[test]
    fn test_update_column_positions_ignores_repeated_ids() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[(Some("Ann"), Some("30"))]);
        let name_id = cols[0].id.clone();

        let ordered = [cols[1].id.clone(), name_id.clone(), name_id];
        DbWriter::update_column_positions(&conn, &table.id, &ordered).unwrap();
        let positions: Vec<(String, i64)> = DbReader::read_columns(&conn, &table.id)
            .unwrap()
            .into_iter()
            .map(|c| (c.name, c.position))
            .collect();
        assert_eq!(positions, vec![("Age".to_string(), 0), ("Name".to_string(), 1)]);

        let report = validate_cell_fanout(&conn, &table.id).unwrap();
        assert!(report.is_valid(), "{}", report.summary());

        let city = DbWriter::add_column(&conn, &table.id, "City", ColumnDataType::Text).unwrap();
        assert_eq!(city.position, 2);
    }

    #[test]
    fn test_rename_table_and_column() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[]);

        DbWriter::rename_table(&conn, &table.id, "  Staff ").unwrap();
        DbWriter::rename_column(&conn, &cols[1].id, "Years").unwrap();

        let renamed = DbReader::get_table(&conn, &table.id).unwrap().unwrap();
        assert_eq!(renamed.name, "Staff");
        let column = DbReader::get_column(&conn, &cols[1].id).unwrap().unwrap();
        assert_eq!(column.name, "Years");

        assert!(matches!(
            DbWriter::rename_column(&conn, &cols[0].id, "   "),
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            DbWriter::rename_table(&conn, "missing", "X"),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_save_view_upserts_by_name() {
        let conn = setup_store_conn();
        let (table, cols) = setup_people_table(&conn, &[]);
        let first = DbWriter::save_view(
            &conn,
            &table.id,
            "Adults",
            &[FilterRule::new(cols[1].id.clone(), FilterOperator::GreaterThan, Some("17"))],
            &[],
            &[],
        )
        .unwrap();
        let second = DbWriter::save_view(
            &conn,
            &table.id,
            "Adults",
            &[],
            &[SortRule::new(cols[0].id.clone(), SortDirection::Desc)],
            &[cols[1].id.clone()],
        )
        .unwrap();
        assert_eq!(first.id, second.id);

        let views = DbReader::list_views(&conn, &table.id).unwrap();
        assert_eq!(views.len(), 1);
        assert!(views[0].filters.is_empty());
        assert_eq!(views[0].sorting[0].direction, SortDirection::Desc);
        assert_eq!(views[0].hidden_columns, vec![cols[1].id.clone()]);

        DbWriter::delete_view(&conn, &table.id, "Adults").unwrap();
        assert!(matches!(
            DbReader::get_view(&conn, &table.id, "Adults"),
            Err(DbError::ViewNotFound(_))
        ));
    }

    #[test]
    fn test_table_access_checks_owner() {
        let conn = setup_store_conn();
        let (table, _) = setup_people_table(&conn, &[]);
        let owner = crate::sheets::definitions::UserContext::new(TEST_OWNER);
        let other = crate::sheets::definitions::UserContext::new("mallory");
        assert!(DbReader::require_table_access(&conn, &table.id, &owner).is_ok());
        assert!(matches!(
            DbReader::require_table_access(&conn, &table.id, &other),
            Err(DbError::AccessDenied { .. })
        ));
        assert!(matches!(
            DbReader::require_table_access(&conn, "missing", &owner),
            Err(DbError::TableNotFound(_))
        ));
    }
}
