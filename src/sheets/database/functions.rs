// src/sheets/database/functions.rs
// Scalar SQL functions registered on every connection.
//
// try_real(value)  -> REAL, or NULL when the value is not a finite number
// fold_case(value) -> lower-cased text (Unicode aware, unlike SQLite's lower())

use super::error::DbResult;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// Parse a stored cell value as a number. Surrounding whitespace is ignored;
/// empty, non-numeric and non-finite values yield `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn fold_case(raw: &str) -> String {
    raw.to_lowercase()
}

pub fn register_functions(conn: &Connection) -> DbResult<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("try_real", 1, flags, |ctx| {
        let parsed = match ctx.get_raw(0) {
            ValueRef::Null | ValueRef::Blob(_) => None,
            ValueRef::Integer(i) => Some(i as f64),
            ValueRef::Real(f) => Some(f).filter(|v| v.is_finite()),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(parse_number),
        };
        Ok(parsed)
    })?;

    conn.create_scalar_function("fold_case", 1, flags, |ctx| {
        let folded = match ctx.get_raw(0) {
            ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().map(fold_case),
            _ => None,
        };
        Ok(folded)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("30.5"), Some(30.5));
        assert_eq!(parse_number("  42 "), Some(42.0));
        assert_eq!(parse_number("-1e3"), Some(-1000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_try_real_in_sql() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();
        let v: Option<f64> = conn
            .query_row("SELECT try_real(' 12.25 ')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(v, Some(12.25));
        let bad: Option<f64> = conn
            .query_row("SELECT try_real('abc')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(bad, None);
        let null: Option<f64> = conn
            .query_row("SELECT try_real(NULL)", [], |r| r.get(0))
            .unwrap();
        assert_eq!(null, None);
    }

    #[test]
    fn test_fold_case_handles_non_ascii() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();
        let v: String = conn
            .query_row("SELECT fold_case('ÄBC')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(v, "äbc");
    }
}
