//! Durable record writing
//!
//! Exactly one logical writer exists per crawl: a dedicated task owns the
//! destination file and drains an mpsc channel of completed records.
//! Workers never touch the file. Each record is serialized to one buffer
//! and written with a single write call followed by a flush, so a crash or
//! cancellation mid-append never leaves a partially visible record.

use crate::output::PageRecord;
use crate::CrawlError;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Name used when the destination is a directory
pub const RECORDS_FILE_NAME: &str = "records.jsonl";

/// Worker-side handle to the single writer task
#[derive(Clone)]
pub struct RecordWriter {
    tx: mpsc::Sender<PageRecord>,
}

impl RecordWriter {
    /// Hands one completed record to the writer task.
    ///
    /// Ordering between workers is whatever the channel serializes; within
    /// the file every record is whole.
    pub async fn append(&self, record: PageRecord) -> Result<(), CrawlError> {
        self.tx
            .send(record)
            .await
            .map_err(|_| CrawlError::WriterClosed)
    }
}

/// Resolves the user-supplied destination to a concrete records file.
///
/// A directory (existing, or a path with no extension that can be created)
/// receives `records.jsonl` inside it; anything else is treated as the file
/// itself. The parent directory is created as needed.
pub fn resolve_destination(dest: &Path) -> Result<PathBuf, CrawlError> {
    let as_dir = dest.is_dir() || (!dest.exists() && dest.extension().is_none());

    let file_path = if as_dir {
        std::fs::create_dir_all(dest).map_err(|e| CrawlError::Destination {
            path: dest.to_path_buf(),
            source: e,
        })?;
        dest.join(RECORDS_FILE_NAME)
    } else {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CrawlError::Destination {
                    path: dest.to_path_buf(),
                    source: e,
                })?;
            }
        }
        dest.to_path_buf()
    };

    Ok(file_path)
}

/// Opens the records file and spawns the writer task.
///
/// Returns the worker-side handle and the join handle; awaiting the join
/// handle after all `RecordWriter` clones are dropped drains the channel,
/// flushes, and yields the number of records written.
pub async fn spawn_writer(
    file_path: PathBuf,
) -> Result<(RecordWriter, JoinHandle<std::io::Result<u64>>), CrawlError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&file_path)
        .await
        .map_err(|e| CrawlError::Destination {
            path: file_path.clone(),
            source: e,
        })?;

    let (tx, mut rx) = mpsc::channel::<PageRecord>(64);

    let handle = tokio::spawn(async move {
        let mut written: u64 = 0;
        while let Some(record) = rx.recv().await {
            let mut line = match serde_json::to_vec(&record) {
                Ok(line) => line,
                Err(e) => {
                    // A record that cannot serialize is a bug, not a reason
                    // to corrupt the file
                    tracing::error!("Dropping unserializable record for {}: {}", record.url, e);
                    continue;
                }
            };
            line.push(b'\n');

            file.write_all(&line).await?;
            file.flush().await?;
            written += 1;
            tracing::trace!("Wrote record {} for {}", written, record.url);
        }
        file.sync_data().await?;
        Ok(written)
    });

    Ok((RecordWriter { tx }, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordStatus;
    use chrono::Utc;

    fn record(url: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            depth: 0,
            status: RecordStatus::Succeeded { http_status: 200 },
            content: None,
            links: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_destination_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_destination(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(RECORDS_FILE_NAME));
    }

    #[test]
    fn test_resolve_destination_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.jsonl");
        let path = resolve_destination(&file).unwrap();
        assert_eq!(path, file);
    }

    #[test]
    fn test_resolve_destination_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let path = resolve_destination(&nested).unwrap();
        assert_eq!(path, nested.join(RECORDS_FILE_NAME));
        assert!(nested.is_dir());
    }

    #[test]
    fn test_resolve_destination_unwritable() {
        let result = resolve_destination(Path::new("/proc/no-such/deep/dir"));
        assert!(matches!(result, Err(CrawlError::Destination { .. })));
    }

    #[tokio::test]
    async fn test_writer_appends_complete_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let (writer, handle) = spawn_writer(path.clone()).await.unwrap();
        writer.append(record("https://example.com/a")).await.unwrap();
        writer.append(record("https://example.com/b")).await.unwrap();
        drop(writer);

        let written = handle.await.unwrap().unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: PageRecord = serde_json::from_str(line).unwrap();
            assert!(parsed.url.starts_with("https://example.com/"));
        }
        assert!(content.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_writer_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let (writer, handle) = spawn_writer(path.clone()).await.unwrap();
        writer.append(record("https://example.com/first")).await.unwrap();
        drop(writer);
        handle.await.unwrap().unwrap();

        let (writer, handle) = spawn_writer(path.clone()).await.unwrap();
        writer.append(record("https://example.com/second")).await.unwrap();
        drop(writer);
        handle.await.unwrap().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_append_after_writer_exit_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let (writer, handle) = spawn_writer(path).await.unwrap();
        handle.abort();
        let _ = handle.await;

        let result = writer.append(record("https://example.com/late")).await;
        assert!(matches!(result, Err(CrawlError::WriterClosed)));
    }
}
