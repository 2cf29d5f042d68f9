// tests/bulk_insert.rs
// Bulk insert pipeline against an on-disk store.

mod common;

use common::people;
use gridstore::sheets::database::validation::validate_cell_fanout;
use gridstore::sheets::query::{FilterOperator, FilterRule, PageLimits};
use gridstore::sheets::{
    BulkInsertConfig, BulkInserter, Cancellation, DbReader, PageRequest, QueryEngine,
};

fn config() -> BulkInsertConfig {
    BulkInsertConfig {
        max_rows: 500,
        row_batch_size: 40,
        cell_flush_size: 25,
    }
}

#[tokio::test]
async fn test_zero_count_reports_zeros() {
    let fixture = people(&[]);
    let report = BulkInserter::new(fixture.store.clone(), config())
        .bulk_insert(&fixture.table.id, 0, &Cancellation::new())
        .await
        .unwrap();
    assert_eq!((report.inserted, report.requested, report.failed), (0, 0, false));
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_full_insert_is_queryable_and_typed() {
    let fixture = people(&[(Some("existing"), Some("1"))]);
    let report = BulkInserter::new(fixture.store.clone(), config())
        .with_seed(11)
        .bulk_insert(&fixture.table.id, 130, &Cancellation::new())
        .await
        .unwrap();
    assert_eq!(report.inserted, 130);
    assert_eq!(report.requested, 130);
    assert!(!report.failed);
    assert_eq!(report.batches_committed, 4);

    let conn = fixture.store.connect().unwrap();
    assert_eq!(DbReader::count_rows(&conn, &fixture.table.id).unwrap(), 131);
    let validation = validate_cell_fanout(&conn, &fixture.table.id).unwrap();
    assert!(validation.is_valid(), "{}", validation.summary());

    // Generated ages are all numeric, so a wide range filter keeps them all.
    let engine = QueryEngine::new(fixture.store.clone(), PageLimits::default());
    let page = engine
        .fetch_page(
            &PageRequest::for_table(&fixture.table.id).filter(FilterRule::new(
                fixture.age_col.id.clone(),
                FilterOperator::GreaterThan,
                Some("-1"),
            )),
            &Cancellation::new(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_filtered_count, Some(131));
}

#[tokio::test]
async fn test_failed_batch_stops_pipeline_and_keeps_earlier_batches() {
    let fixture = people(&[]);
    let conn = fixture.store.connect().unwrap();
    // Abort any insert of the row at position 100 (third batch of 40).
    conn.execute_batch(
        "CREATE TRIGGER fail_row_100 BEFORE INSERT ON sheet_rows
         WHEN NEW.position = 100
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .unwrap();

    let report = BulkInserter::new(fixture.store.clone(), config())
        .bulk_insert(&fixture.table.id, 200, &Cancellation::new())
        .await
        .unwrap();
    assert!(report.failed);
    assert_eq!(report.inserted, 80);
    assert_eq!(report.requested, 200);
    assert_eq!(report.batches_committed, 2);
    assert!(report.error.as_deref().unwrap_or_default().contains("injected failure"));

    assert_eq!(DbReader::count_rows(&conn, &fixture.table.id).unwrap(), 80);
    let validation = validate_cell_fanout(&conn, &fixture.table.id).unwrap();
    assert!(validation.is_valid(), "{}", validation.summary());

    // The rolled-back batch did not consume row positions.
    let rows = DbReader::read_rows(&conn, &fixture.table.id).unwrap();
    assert_eq!(rows.last().map(|r| r.position), Some(79));
}

#[tokio::test]
async fn test_count_over_cap_is_rejected_before_store_access() {
    let fixture = people(&[]);
    let err = BulkInserter::new(fixture.store.clone(), config())
        .bulk_insert("not-even-a-table", 501, &Cancellation::new())
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_expired_deadline_is_reported_as_cancelled() {
    let fixture = people(&[]);
    let cancel = Cancellation::with_timeout(std::time::Duration::ZERO);
    let err = BulkInserter::new(fixture.store.clone(), config())
        .bulk_insert(&fixture.table.id, 10, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, gridstore::sheets::DbError::Cancelled));
}
