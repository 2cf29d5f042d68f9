// src/sheets/database/writer/helpers.rs
// Helper functions for SQL generation, ids and timestamps

/// Build a string of SQL placeholders (?, ?, ?, ...).
///
/// # Example
/// ```
/// use gridstore::sheets::database::writer::helpers::build_placeholders;
/// assert_eq!(build_placeholders(3), "?, ?, ?");
/// ```
pub fn build_placeholders(count: usize) -> String {
    (0..count).map(|_| "?").collect::<Vec<_>>().join(", ")
}

/// Build `count` parenthesised tuples of `width` placeholders for a
/// multi-row VALUES list.
///
/// # Example
/// ```
/// use gridstore::sheets::database::writer::helpers::build_values_tuples;
/// assert_eq!(build_values_tuples(2, 3), "(?, ?, ?), (?, ?, ?)");
/// ```
pub fn build_values_tuples(count: usize, width: usize) -> String {
    let tuple = format!("({})", build_placeholders(width));
    vec![tuple; count].join(", ")
}

/// Build a DELETE SQL statement.
pub fn build_delete_sql(table_name: &str, where_clause: &str) -> String {
    format!("DELETE FROM {} WHERE {}", table_name, where_clause)
}

/// Fresh identifier for tables, columns and views
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// RFC 3339 timestamp used for created_at columns
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_placeholders() {
        assert_eq!(build_placeholders(0), "");
        assert_eq!(build_placeholders(1), "?");
        assert_eq!(build_placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_build_values_tuples() {
        assert_eq!(build_values_tuples(1, 3), "(?, ?, ?)");
        assert_eq!(build_values_tuples(2, 2), "(?, ?), (?, ?)");
        assert_eq!(build_values_tuples(0, 3), "");
    }

    #[test]
    fn test_build_delete_sql() {
        let sql = build_delete_sql("sheet_rows", "id = ?");
        assert_eq!(sql, "DELETE FROM sheet_rows WHERE id = ?");
    }

    #[test]
    fn test_new_id_is_unique_uuid() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_timestamps_sort_chronologically() {
        let a = now_timestamp();
        let b = now_timestamp();
        assert!(a <= b);
        assert!(chrono::DateTime::parse_from_rfc3339(&a).is_ok());
    }
}
