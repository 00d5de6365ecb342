//! Crash-safe resumption
//!
//! A resumed crawl scans the prior output at the destination and seeds the
//! dedup store with every URL that already has a record, so completed work
//! is never re-fetched.

use crate::output::PageRecord;
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Scans prior JSONL output and returns the set of recorded URLs.
///
/// A missing file yields an empty set. Unparseable lines are skipped with a
/// warning rather than failing the scan: the writer only ever appends whole
/// lines, so at most the final line can be torn by a hard crash.
pub fn scan_completed(path: &Path) -> std::io::Result<HashSet<String>> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e),
    };

    let reader = BufReader::new(file);
    let mut completed = HashSet::new();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<PageRecord>(&line) {
            Ok(record) => {
                completed.insert(record.url);
            }
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(
            "Resume scan of {} skipped {} unparseable line(s)",
            path.display(),
            skipped
        );
    }
    tracing::info!(
        "Resume scan found {} completed URL(s) in {}",
        completed.len(),
        path.display()
    );

    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordStatus;
    use chrono::Utc;
    use std::io::Write;

    fn line_for(url: &str) -> String {
        let record = PageRecord {
            url: url.to_string(),
            depth: 1,
            status: RecordStatus::Succeeded { http_status: 200 },
            content: None,
            links: Vec::new(),
            fetched_at: Utc::now(),
        };
        serde_json::to_string(&record).unwrap()
    }

    #[test]
    fn test_scan_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let completed = scan_completed(&dir.path().join("absent.jsonl")).unwrap();
        assert!(completed.is_empty());
    }

    #[test]
    fn test_scan_collects_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", line_for("https://example.com/a")).unwrap();
        writeln!(file, "{}", line_for("https://example.com/b")).unwrap();

        let completed = scan_completed(&path).unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed.contains("https://example.com/a"));
        assert!(completed.contains("https://example.com/b"));
    }

    #[test]
    fn test_scan_tolerates_torn_final_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", line_for("https://example.com/whole")).unwrap();
        write!(file, "{{\"url\":\"https://example.com/torn\",\"dep").unwrap();

        let completed = scan_completed(&path).unwrap();
        assert_eq!(completed.len(), 1);
        assert!(completed.contains("https://example.com/whole"));
    }

    #[test]
    fn test_scan_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", line_for("https://example.com/only")).unwrap();
        writeln!(file).unwrap();

        let completed = scan_completed(&path).unwrap();
        assert_eq!(completed.len(), 1);
    }
}
