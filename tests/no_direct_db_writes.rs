// tests/no_direct_db_writes.rs
// Fails if SQLite write calls appear outside the store's write side.
// Allowed: the writer, schema setup, connection pragmas, WAL maintenance,
// and anything after a file's `#[cfg(test)]` marker.

use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = fs::read_dir(dir) {
        for e in entries.flatten() {
            let p = e.path();
            if p.is_dir() {
                collect_rs_files(&p, files);
            } else if p.extension().map(|s| s == "rs").unwrap_or(false) {
                files.push(p);
            }
        }
    }
}

fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn is_whitelisted(path: &Path) -> bool {
    let p = normalized(path);
    p.contains("/database/writer/")
        || p.contains("/database/schema")
        || p.ends_with("/database/connection.rs")
        || p.ends_with("/database/checkpoint.rs")
}

/// Source text before the first test module.
fn runtime_part(content: &str) -> &str {
    match content.find("#[cfg(test)]") {
        Some(idx) => &content[..idx],
        None => content,
    }
}

#[test]
fn no_direct_db_writes_in_runtime() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let src_dir = Path::new(manifest_dir).join("src");

    let mut files = Vec::new();
    collect_rs_files(&src_dir, &mut files);
    assert!(!files.is_empty(), "no sources found under {}", src_dir.display());

    let bad_patterns = [
        ".execute(",
        ".execute_batch(",
        "INSERT INTO",
        "INSERT OR",
        "UPDATE sheet_",
        "DELETE FROM",
    ];

    let mut offenders: Vec<(String, String)> = Vec::new();

    for file in files {
        if is_whitelisted(&file) {
            continue;
        }
        let content = match fs::read_to_string(&file) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let runtime = runtime_part(&content);
        for pat in &bad_patterns {
            if runtime.contains(pat) {
                offenders.push((normalized(&file), pat.to_string()));
            }
        }
    }

    if !offenders.is_empty() {
        let mut msg = String::from("Direct DB write calls found outside the writer:\n");
        for (file, pat) in offenders {
            msg.push_str(&format!(
                "  {} contains pattern '{}': route through DbWriter instead\n",
                file, pat
            ));
        }
        panic!("{}", msg);
    }
}

#[test]
fn query_path_is_read_only() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let query_dir = Path::new(manifest_dir).join("src").join("sheets").join("query");

    let mut files = Vec::new();
    collect_rs_files(&query_dir, &mut files);
    assert!(!files.is_empty());

    for file in files {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for pat in ["DbWriter", ".transaction(", "unchecked_transaction"] {
            assert!(
                !content.contains(pat),
                "{} references '{}'",
                normalized(&file),
                pat
            );
        }
    }
}
