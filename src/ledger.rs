//! Recipient ledger: the pending and sent phone number lists.
//!
//! Both lists are flat files, one number per line. A number moves from
//! pending to sent only after a confirmed send, and never back. The move
//! appends to the sent file first (synced), then replaces the pending file
//! through a temp file and rename. A crash between the two steps leaves the
//! number in both files; [`RecipientLedger::open`] drops such numbers from
//! pending, so nothing is lost and nothing is sent twice.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Read trimmed, non-blank lines from a file. A missing file reads as empty.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(Error::storage(path, e)),
    }
}

#[derive(Debug)]
pub struct RecipientLedger {
    pending_path: PathBuf,
    sent_path: PathBuf,
    pending: Vec<String>,
    sent: Vec<String>,
}

impl RecipientLedger {
    /// Load both lists and reconcile them.
    pub fn open(pending_path: impl Into<PathBuf>, sent_path: impl Into<PathBuf>) -> Result<Self> {
        let pending_path = pending_path.into();
        let sent_path = sent_path.into();

        if !pending_path.exists() {
            warn!("Pending numbers file {} not found", pending_path.display());
        }

        let raw_pending = read_lines(&pending_path)?;
        let sent = read_lines(&sent_path)?;

        let sent_set: HashSet<&str> = sent.iter().map(String::as_str).collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending = Vec::with_capacity(raw_pending.len());
        for number in &raw_pending {
            if sent_set.contains(number.as_str()) || !seen.insert(number.as_str()) {
                continue;
            }
            pending.push(number.clone());
        }

        let mut ledger = Self {
            pending_path,
            sent_path,
            pending,
            sent,
        };

        if ledger.pending.len() != raw_pending.len() {
            warn!(
                "Dropped {} duplicate or already-sent numbers from {}",
                raw_pending.len() - ledger.pending.len(),
                ledger.pending_path.display()
            );
            ledger.write_pending()?;
        }

        info!(
            "Loaded {} pending numbers from {} ({} already sent)",
            ledger.pending.len(),
            ledger.pending_path.display(),
            ledger.sent.len()
        );

        Ok(ledger)
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Move `number` from pending to sent after a successful send.
    ///
    /// Returns `false` without touching storage if the number is not pending.
    pub fn mark_sent(&mut self, number: &str) -> Result<bool> {
        let Some(index) = self.pending.iter().position(|n| n == number) else {
            return Ok(false);
        };

        self.append_sent(number)?;
        self.sent.push(number.to_string());

        self.pending.remove(index);
        self.write_pending()?;

        Ok(true)
    }

    fn append_sent(&self, number: &str) -> Result<()> {
        let path = &self.sent_path;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::storage(path, e))?;

        // A hand-edited file may lack its final newline
        let len = file.metadata().map_err(|e| Error::storage(path, e))?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))
                .and_then(|_| file.read_exact(&mut last))
                .map_err(|e| Error::storage(path, e))?;
            if last[0] != b'\n' {
                writeln!(file).map_err(|e| Error::storage(path, e))?;
            }
        }

        writeln!(file, "{}", number).map_err(|e| Error::storage(path, e))?;
        file.sync_all().map_err(|e| Error::storage(path, e))
    }

    fn write_pending(&self) -> Result<()> {
        let path = &self.pending_path;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::storage(path, e))?;
        for number in &self.pending {
            writeln!(tmp, "{}", number).map_err(|e| Error::storage(path, e))?;
        }
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| Error::storage(path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::storage(path, e))?;
        tmp.persist(path).map_err(|e| Error::storage(path, e.error))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(pending: &str, sent: Option<&str>) -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let pending_path = dir.path().join("number.txt");
        let sent_path = dir.path().join("sent.txt");
        fs::write(&pending_path, pending).expect("write pending");
        if let Some(sent) = sent {
            fs::write(&sent_path, sent).expect("write sent");
        }
        (dir, pending_path, sent_path)
    }

    #[test]
    fn test_read_lines_trims_and_skips_blanks() {
        let (_dir, pending_path, _) = setup("  9999999999 \n\n\t\n8888888888\r\n", None);
        let lines = read_lines(&pending_path).expect("read");
        assert_eq!(lines, vec!["9999999999", "8888888888"]);
    }

    #[test]
    fn test_read_lines_missing_file_is_empty() {
        let dir = TempDir::new().expect("temp dir");
        let lines = read_lines(&dir.path().join("missing.txt")).expect("read");
        assert!(lines.is_empty());
    }

    #[test]
    fn test_open_preserves_order() {
        let (_dir, pending_path, sent_path) = setup("3333333333\n1111111111\n2222222222\n", None);
        let ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");
        assert_eq!(ledger.pending(), ["3333333333", "1111111111", "2222222222"]);
        assert!(ledger.sent().is_empty());
    }

    #[test]
    fn test_mark_sent_moves_number_exactly_once() {
        let (_dir, pending_path, sent_path) = setup("1111111111\n2222222222\n", None);
        let mut ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");

        assert!(ledger.mark_sent("1111111111").expect("mark"));
        assert!(!ledger.mark_sent("1111111111").expect("mark again"));

        assert_eq!(ledger.pending(), ["2222222222"]);
        assert_eq!(ledger.sent(), ["1111111111"]);
        assert_eq!(fs::read_to_string(&pending_path).expect("read"), "2222222222\n");
        assert_eq!(fs::read_to_string(&sent_path).expect("read"), "1111111111\n");
    }

    #[test]
    fn test_mark_sent_appends_to_existing_sent_file() {
        let (_dir, pending_path, sent_path) = setup("2222222222\n", Some("1111111111\n"));
        let mut ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");

        ledger.mark_sent("2222222222").expect("mark");

        assert_eq!(
            read_lines(&sent_path).expect("read"),
            vec!["1111111111", "2222222222"]
        );
        assert!(read_lines(&pending_path).expect("read").is_empty());
    }

    #[test]
    fn test_mark_sent_after_sent_file_without_trailing_newline() {
        let (_dir, pending_path, sent_path) = setup("2222222222\n", Some("1111111111"));
        let mut ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");

        ledger.mark_sent("2222222222").expect("mark");

        assert_eq!(
            read_lines(&sent_path).expect("read"),
            vec!["1111111111", "2222222222"]
        );
        assert_eq!(
            fs::read_to_string(&sent_path).expect("read"),
            "1111111111\n2222222222\n"
        );

        // Reopening sees both numbers as sent
        let reopened = RecipientLedger::open(&pending_path, &sent_path).expect("reopen");
        assert_eq!(reopened.sent(), ["1111111111", "2222222222"]);
        assert!(reopened.pending().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_pending_rewrite_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, pending_path, sent_path) = setup("1111111111\n2222222222\n", None);
        fs::set_permissions(&pending_path, fs::Permissions::from_mode(0o644)).expect("chmod");

        let mut ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");
        ledger.mark_sent("1111111111").expect("mark");

        let mode = fs::metadata(&pending_path).expect("stat").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_unknown_number_leaves_files_untouched() {
        let (_dir, pending_path, sent_path) = setup("1111111111\n", None);
        let mut ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");

        assert!(!ledger.mark_sent("5555555555").expect("mark"));
        assert!(!sent_path.exists());
        assert_eq!(ledger.pending(), ["1111111111"]);
    }

    #[test]
    fn test_open_reconciles_numbers_in_both_lists() {
        let (_dir, pending_path, sent_path) =
            setup("1111111111\n2222222222\n", Some("1111111111\n"));
        let ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");

        assert_eq!(ledger.pending(), ["2222222222"]);
        assert_eq!(
            read_lines(&pending_path).expect("read"),
            vec!["2222222222"]
        );
    }

    #[test]
    fn test_open_collapses_duplicate_pending_numbers() {
        let (_dir, pending_path, sent_path) = setup("1111111111\n2222222222\n1111111111\n", None);
        let ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");

        assert_eq!(ledger.pending(), ["1111111111", "2222222222"]);
        assert_eq!(
            fs::read_to_string(&pending_path).expect("read"),
            "1111111111\n2222222222\n"
        );
    }

    #[test]
    fn test_union_is_conserved() {
        let (_dir, pending_path, sent_path) =
            setup("1111111111\n2222222222\n3333333333\n", Some("0000000000\n"));
        let mut ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");

        ledger.mark_sent("2222222222").expect("mark");
        ledger.mark_sent("3333333333").expect("mark");

        let reopened = RecipientLedger::open(&pending_path, &sent_path).expect("reopen");
        let mut all: Vec<String> = reopened
            .pending()
            .iter()
            .chain(reopened.sent())
            .cloned()
            .collect();
        all.sort();
        assert_eq!(all, vec!["0000000000", "1111111111", "2222222222", "3333333333"]);
        assert_eq!(reopened.pending(), ["1111111111"]);
    }

    #[test]
    fn test_missing_pending_file_opens_empty() {
        let dir = TempDir::new().expect("temp dir");
        let ledger = RecipientLedger::open(
            dir.path().join("number.txt"),
            dir.path().join("sent.txt"),
        )
        .expect("open");
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_unwritable_sent_file_is_storage_error() {
        let (_dir, pending_path, sent_path) = setup("1111111111\n", None);
        let mut ledger = RecipientLedger::open(&pending_path, &sent_path).expect("open");

        // A directory cannot be opened for appending
        fs::create_dir(&sent_path).expect("mkdir");

        let err = ledger.mark_sent("1111111111").expect_err("should fail");

        assert!(matches!(err, Error::Storage { .. }));
        // Nothing was removed from pending
        assert_eq!(ledger.pending(), ["1111111111"]);
        assert_eq!(read_lines(&pending_path).expect("read"), vec!["1111111111"]);
    }
}
