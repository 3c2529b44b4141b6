//! JSONL ledger backend - append-only file, one fact per line
//!
//! The file is the source of truth; an in-memory index is rebuilt from it on
//! open. Every append is flushed and synced before it becomes visible to
//! readers, so a fact is either durable and readable or absent.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use transmitter_core::ScopeKey;

use crate::error::{LedgerError, LedgerResult};
use crate::fact::LedgerFact;
use crate::memory::FactIndex;
use crate::store::LedgerStore;

/// Durable append-only ledger backed by a JSONL file
#[derive(Debug)]
pub struct JsonlLedger {
    path: PathBuf,
    /// Serializes appenders; held across write + sync + index insert
    file: Mutex<File>,
    index: RwLock<FactIndex>,
}

impl JsonlLedger {
    /// Open (or create) a ledger file and load its facts
    ///
    /// A final line without its trailing newline is a write torn by a crash.
    /// If it does not parse it is cut off; any other malformed line is
    /// reported as [`LedgerError::Corrupt`].
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let (index, valid_len) = load_index(&content)?;

        if valid_len < content.len() {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = content.len() - valid_len,
                "Truncating torn final ledger line"
            );
            file.set_len(valid_len as u64)?;
        } else if !content.is_empty() && !content.ends_with(b"\n") {
            writeln!(file)?;
        }

        tracing::info!(path = %path.display(), facts = index.len(), "Ledger opened");

        Ok(Self {
            path,
            file: Mutex::new(file),
            index: RwLock::new(index),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of facts
    pub fn len(&self) -> usize {
        self.index.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse file content into an index; returns the byte length of valid content
///
/// Lines are split on raw bytes so a tail torn inside a multibyte character
/// is treated like any other torn tail.
fn load_index(content: &[u8]) -> LedgerResult<(FactIndex, usize)> {
    let mut index = FactIndex::default();
    let mut offset = 0;
    let mut line_no = 0;

    for line in content.split_inclusive(|b| *b == b'\n') {
        line_no += 1;
        let complete = line.ends_with(b"\n");

        let parsed = std::str::from_utf8(line)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                serde_json::from_str::<LedgerFact>(trimmed)
                    .map(Some)
                    .map_err(|e| e.to_string())
            });

        match parsed {
            Ok(Some(fact)) => {
                index.insert(fact);
                offset += line.len();
            }
            Ok(None) => offset += line.len(),
            Err(_) if !complete => return Ok((index, offset)),
            Err(reason) => {
                return Err(LedgerError::Corrupt {
                    line: line_no,
                    reason,
                })
            }
        }
    }

    Ok((index, offset))
}

/// Run a write against the file; on failure cut the file back to its
/// length before the write so no fragment is left ahead of the next append
fn write_or_rollback<F>(file: &mut File, write: F) -> LedgerResult<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let prev_len = file.metadata()?.len();

    if let Err(e) = write(file) {
        match file.set_len(prev_len) {
            Ok(()) => tracing::warn!(error = %e, len = prev_len, "Ledger append rolled back"),
            Err(rollback) => tracing::error!(
                error = %e,
                rollback_error = %rollback,
                "Could not roll back failed ledger append"
            ),
        }
        return Err(e.into());
    }
    Ok(())
}

impl LedgerStore for JsonlLedger {
    fn append_at(
        &self,
        scope: &ScopeKey,
        attribute: &str,
        value: &str,
        recorded_at: DateTime<Utc>,
    ) -> LedgerResult<LedgerFact> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);

        let sequence = self
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .next_sequence();
        let fact = LedgerFact::new(sequence, scope.clone(), attribute, value, recorded_at);

        let line = format!("{}\n", serde_json::to_string(&fact)?);
        write_or_rollback(&mut file, |f| {
            f.write_all(line.as_bytes())?;
            f.flush()?;
            f.sync_data()
        })?;

        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fact.clone());

        tracing::debug!(
            scope = %scope,
            attribute,
            value,
            sequence,
            "Fact appended"
        );
        Ok(fact)
    }

    fn history(&self, scope: &ScopeKey, attribute: &str) -> LedgerResult<Vec<LedgerFact>> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Ok(index.history(scope, attribute))
    }

    fn facts(&self, scope: &ScopeKey) -> LedgerResult<Vec<LedgerFact>> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Ok(index.facts(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scope(record: &str) -> ScopeKey {
        ScopeKey::new("prod", "2525", record).unwrap()
    }

    #[test]
    fn test_facts_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let ledger = JsonlLedger::open(&path).unwrap();
            ledger.put(&scope("1"), "has-enrolled", "yes").unwrap();
            ledger.put(&scope("1"), "has-withdrawn", "yes").unwrap();
        }

        let ledger = JsonlLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(
            ledger.latest(&scope("1"), "has-enrolled").unwrap().as_deref(),
            Some("yes")
        );

        // Sequence continues after reopen
        let fact = ledger.put(&scope("2"), "has-enrolled", "yes").unwrap();
        assert_eq!(fact.sequence, 3);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("ledger.jsonl");

        let ledger = JsonlLedger::open(&path).unwrap();
        assert!(ledger.is_empty());
        assert!(path.exists());
        assert_eq!(ledger.path(), path.as_path());
    }

    #[test]
    fn test_one_line_per_fact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let ledger = JsonlLedger::open(&path).unwrap();
        ledger.put(&scope("1"), "a", "yes").unwrap();
        ledger.put(&scope("1"), "a", "no").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let ledger = JsonlLedger::open(&path).unwrap();
            ledger.put(&scope("1"), "has-enrolled", "yes").unwrap();
        }
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "{{\"id\":\"partial").unwrap();
        drop(file);

        let ledger = JsonlLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 1);
        ledger.put(&scope("1"), "has-withdrawn", "yes").unwrap();

        let reopened = JsonlLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_torn_multibyte_tail_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let ledger = JsonlLedger::open(&path).unwrap();
            ledger.put(&scope("1"), "has-enrolled", "yes").unwrap();
        }
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\":\"x\",\"value\":\"Jos\xC3").unwrap();
        drop(file);

        let ledger = JsonlLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 1);
        ledger.put(&scope("1"), "has-withdrawn", "yes").unwrap();

        let reopened = JsonlLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_invalid_utf8_complete_line_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        fs::write(&path, b"{\"id\":\"\xC3\"}\n").unwrap();

        let err = JsonlLedger::open(&path).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn test_failed_append_leaves_no_fragment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = JsonlLedger::open(&path).unwrap();
        ledger.put(&scope("1"), "has-enrolled", "yes").unwrap();

        {
            let mut file = ledger.file.lock().unwrap();
            let result = write_or_rollback(&mut file, |f| {
                f.write_all(b"{\"id\":\"part")?;
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            });
            assert!(matches!(result, Err(LedgerError::Io(_))));
        }
        assert_eq!(ledger.len(), 1);

        ledger.put(&scope("1"), "has-withdrawn", "yes").unwrap();

        let reopened = JsonlLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_corrupt_middle_line_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        fs::write(&path, "not json\n").unwrap();

        let err = JsonlLedger::open(&path).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { line: 1, .. }));
    }
}
