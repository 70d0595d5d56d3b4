//! CSV store: one file per query, keyed by `post_link`.
//!
//! Saving reads the whole existing file, merges new records in front of it,
//! drops repeated links (first occurrence wins, so freshly fetched values
//! replace stored ones), and rewrites the file through a temp file + rename.
//!
//! Existing files are parsed leniently row by row. A header missing one of
//! the store columns is an error; the file is left as it is.
//!
//! There is no locking. Two runs against the same path race and the last
//! writer wins.

use std::collections::HashSet;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HarvestError, Result};
use crate::events::{EventSink, HarvestEvent};
use crate::types::{PostRecord, STORE_COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingToSave,
    Saved {
        path: PathBuf,
        written: usize,
        new: usize,
        existing: usize,
    },
}

/// Read every parseable record from the store at `path`.
/// A missing or empty file is an empty store.
pub fn load_store(path: &Path, events: &dyn EventSink) -> Result<Vec<PostRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let missing: Vec<&str> = STORE_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(HarvestError::StoreHeader {
            path: path.to_path_buf(),
            missing: missing.join(", "),
        });
    }

    let mut records = Vec::new();
    for row in reader.deserialize::<PostRecord>() {
        match row {
            Ok(record) => records.push(record),
            Err(err) => events.emit(HarvestEvent::StoreRowSkipped {
                line: err.position().map(|p| p.line()),
                error: err.to_string(),
            }),
        }
    }
    debug!(path = %path.display(), count = records.len(), "Loaded existing store");
    Ok(records)
}

/// Keep the first record seen for each `post_link`, preserving order.
pub fn dedup_by_link(records: impl IntoIterator<Item = PostRecord>) -> Vec<PostRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.post_link.clone()))
        .collect()
}

/// Merge `new_records` into the store at `path` and rewrite it.
///
/// An empty batch touches nothing on disk.
pub fn persist(
    new_records: Vec<PostRecord>,
    path: &Path,
    events: &dyn EventSink,
) -> Result<SaveOutcome> {
    if new_records.is_empty() {
        events.emit(HarvestEvent::NothingToSave);
        return Ok(SaveOutcome::NothingToSave);
    }

    let existing = load_store(path, events)?;
    let new = new_records.len();
    let existing_count = existing.len();
    let merged = dedup_by_link(new_records.into_iter().chain(existing));

    write_store(path, &merged)?;

    events.emit(HarvestEvent::Saved {
        path: path.to_path_buf(),
        written: merged.len(),
        new,
        existing: existing_count,
    });
    Ok(SaveOutcome::Saved {
        path: path.to_path_buf(),
        written: merged.len(),
        new,
        existing: existing_count,
    })
}

fn write_store(path: &Path, records: &[PostRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    // Temp files default to 0600; a new store gets the usual umask-filtered
    // mode and an existing one keeps its own.
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir)?;
    match std::fs::metadata(path) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    {
        let mut writer = csv::Writer::from_writer(&mut tmp);
        writer.write_record(STORE_COLUMNS)?;
        for record in records {
            writer.write_record([
                record.author.as_str(),
                record.content.as_str(),
                record.created_at.as_str(),
                record.post_link.as_str(),
            ])?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|err| HarvestError::Io(err.error))?;
    Ok(())
}

/// Store file for `query` under `output_dir`: `{output_dir}/{query}.csv`,
/// with path separators and other awkward characters replaced.
pub fn store_path(output_dir: &Path, query: &str) -> PathBuf {
    let name: String = query
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let name = if name.is_empty() || name.chars().all(|c| c == '.') {
        "query".to_string()
    } else {
        name
    };
    output_dir.join(format!("{name}.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, RecordingSink};

    #[test]
    fn dedup_keeps_first_occurrence() {
        let records = vec![
            record("user1", "post1", "link1"),
            record("user2", "post2", "link2"),
            record("user1", "edited", "link1"),
        ];
        let unique = dedup_by_link(records);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].content, "post1");
        assert_eq!(unique[1].post_link, "link2");
    }

    #[test]
    fn dedup_ignores_other_fields() {
        let records = vec![
            record("user1", "post1", "link1"),
            record("user2", "post2", "link2"),
            record("user1", "post1", "link3"),
        ];
        assert_eq!(dedup_by_link(records).len(), 3);
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::new();
        let records = load_store(&dir.path().join("nope.csv"), &sink).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn reads_store_with_quoted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        std::fs::write(
            &path,
            "author,content,created_at,post_link\n\
             user1,\"post1\",2023-01-01,link1\n\
             user2,\"hello, \"\"world\"\"\",2023-01-02,link2\n\
             user3,\"multi\nline\",2023-01-03,link3",
        )
        .unwrap();

        let records = load_store(&path, &RecordingSink::new()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], record_at("user1", "post1", "2023-01-01", "link1"));
        assert_eq!(records[1].content, "hello, \"world\"");
        assert_eq!(records[2].content, "multi\nline");
    }

    #[test]
    fn skips_short_rows_and_reports_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        std::fs::write(
            &path,
            "author,content,created_at,post_link\nuser1,post1,2023-01-01,link1\nbroken\n",
        )
        .unwrap();
        let sink = RecordingSink::new();

        let records = load_store(&path, &sink).unwrap();

        assert_eq!(records.len(), 1);
        assert!(matches!(
            sink.events().as_slice(),
            [HarvestEvent::StoreRowSkipped { .. }]
        ));
    }

    #[test]
    fn foreign_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        std::fs::write(&path, "name,text\nuser1,post1\n").unwrap();

        let err = load_store(&path, &RecordingSink::new()).unwrap_err();
        assert!(matches!(err, HarvestError::StoreHeader { .. }));
    }

    #[test]
    fn persist_creates_store_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rust.csv");
        let sink = RecordingSink::new();

        let outcome = persist(vec![record("user1", "post1", "link1")], &path, &sink).unwrap();

        assert!(matches!(outcome, SaveOutcome::Saved { written: 1, new: 1, existing: 0, .. }));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "author,content,created_at,post_link\nuser1,post1,2024-01-01T00:00:00Z,link1\n"
        );
    }

    #[test]
    fn persist_merges_new_records_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        let sink = RecordingSink::new();
        persist(
            vec![record("user1", "old", "link1"), record("user2", "post2", "link2")],
            &path,
            &sink,
        )
        .unwrap();

        persist(
            vec![record("user1", "new", "link1"), record("user3", "post3", "link3")],
            &path,
            &sink,
        )
        .unwrap();

        let stored = load_store(&path, &sink).unwrap();
        let links: Vec<&str> = stored.iter().map(|r| r.post_link.as_str()).collect();
        assert_eq!(links, vec!["link1", "link3", "link2"]);
        assert_eq!(stored[0].content, "new");
    }

    #[test]
    fn empty_batch_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        let sink = RecordingSink::new();
        persist(vec![record("user1", "post1", "link1")], &path, &sink).unwrap();
        let before = std::fs::read(&path).unwrap();
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        let outcome = persist(Vec::new(), &path, &sink).unwrap();

        assert_eq!(outcome, SaveOutcome::NothingToSave);
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
        assert_eq!(sink.events().last(), Some(&HarvestEvent::NothingToSave));
    }

    #[test]
    fn empty_batch_without_store_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        persist(Vec::new(), &path, &RecordingSink::new()).unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        let sink = RecordingSink::new();
        persist(vec![record("user1", "post1", "link1")], &path, &sink).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        persist(vec![record("user2", "post2", "link2")], &path, &sink).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn new_store_is_not_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        persist(vec![record("user1", "post1", "link1")], &path, &RecordingSink::new()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_ne!(mode, 0o600);
    }

    #[test]
    fn store_path_sanitizes_query() {
        let dir = Path::new("out");
        assert_eq!(store_path(dir, "Olympics 2024"), dir.join("Olympics 2024.csv"));
        assert_eq!(store_path(dir, "a/b:c"), dir.join("a_b_c.csv"));
        assert_eq!(store_path(dir, ".."), dir.join("query.csv"));
    }

    fn record_at(author: &str, content: &str, created_at: &str, link: &str) -> PostRecord {
        PostRecord {
            author: author.into(),
            content: content.into(),
            created_at: created_at.into(),
            post_link: link.into(),
        }
    }
}
