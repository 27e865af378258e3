//! # Chain Journal
//!
//! JSON Lines persistence: one serialized [`Block`] per line, ordered by
//! index, no header. Appends write and flush a single line. A full rewrite
//! goes to a temporary file in the same directory and is renamed over the
//! journal once synced. Loading parses every line and then runs the full
//! chain check, so a journal edited on disk is rejected rather than
//! silently trusted.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::block::Block;
use crate::error::LedgerError;
use crate::ledger::Ledger;

/// An append-only journal file.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one block as a single line, creating the file if needed.
    pub fn append(&self, block: &Block) -> Result<(), LedgerError> {
        let line = self.encode(block)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Replace the journal with the given chain.
    ///
    /// On any failure the previous journal is left as it was.
    pub fn write_all(&self, blocks: &[Block]) -> Result<(), LedgerError> {
        self.replace_with(blocks.iter().map(|block| self.encode(block)))?;
        tracing::info!(path = %self.path.display(), blocks = blocks.len(), "journal written");
        Ok(())
    }

    fn replace_with<I>(&self, lines: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = Result<String, LedgerError>>,
    {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            for line in lines {
                writer.write_all(line?.as_bytes())?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Parse a journal and rebuild the ledger it records.
    ///
    /// Blank lines are skipped. Any parse failure or chain fault is
    /// reported as [`LedgerError::Journal`] with its 1-based line number.
    pub fn load(path: impl AsRef<Path>, difficulty: u32) -> Result<Ledger, LedgerError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let reader = BufReader::new(File::open(path)?);

        let mut blocks = Vec::new();
        let mut lines = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let block: Block = serde_json::from_str(&line).map_err(|e| LedgerError::Journal {
                path: shown.clone(),
                line: n + 1,
                reason: e.to_string(),
            })?;
            blocks.push(block);
            lines.push(n + 1);
        }

        if blocks.is_empty() {
            return Err(LedgerError::Journal {
                path: shown,
                line: 0,
                reason: "journal holds no blocks".to_string(),
            });
        }

        let ledger = Ledger::from_blocks(blocks, difficulty)?;
        if let Err(fault) = ledger.check_chain() {
            let line = fault
                .index()
                .and_then(|i| lines.get(i as usize).copied())
                .unwrap_or(0);
            tracing::warn!(path = %shown, line, %fault, "journal rejected");
            return Err(LedgerError::Journal {
                path: shown,
                line,
                reason: fault.to_string(),
            });
        }

        tracing::info!(path = %shown, blocks = ledger.len(), "journal loaded");
        Ok(ledger)
    }

    fn encode(&self, block: &Block) -> Result<String, LedgerError> {
        let mut line = serde_json::to_string(block).map_err(|e| LedgerError::Journal {
            path: self.path.display().to_string(),
            line: block.index as usize + 1,
            reason: e.to_string(),
        })?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPayload;
    use edl_core::{Certificate, CertificateBody, CertificateId, IdentityId, IssueDate};

    fn issued(n: u64) -> BlockPayload {
        BlockPayload::CertificateIssued {
            certificate: Certificate::new(CertificateBody {
                id: CertificateId::from_sequence(n),
                subject: IdentityId::new("alice").unwrap(),
                issuer: IdentityId::new("inst1").unwrap(),
                course: "Cryptography".into(),
                grade: "B".into(),
                issue_date: IssueDate::from_ymd(2026, 6, 1).unwrap(),
                artifact: None,
            }),
            issuer_address: "0123456789abcdef0123".into(),
        }
    }

    fn ledger(len: u64) -> Ledger {
        let mut ledger = Ledger::new(1).unwrap();
        for n in 1..=len {
            ledger.append(issued(n)).unwrap();
        }
        ledger
    }

    #[test]
    fn write_then_load_preserves_chain() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("chain.jsonl"));
        let original = ledger(3);
        journal.write_all(original.blocks()).unwrap();

        let loaded = Journal::load(journal.path(), 1).unwrap();
        assert_eq!(loaded.blocks(), original.blocks());
        assert!(loaded.validate_chain());
    }

    #[test]
    fn failed_rewrite_keeps_previous_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("chain.jsonl"));
        let original = ledger(2);
        journal.write_all(original.blocks()).unwrap();
        let before = std::fs::read(journal.path()).unwrap();

        let longer = ledger(3);
        let lines = longer.blocks().iter().map(|block| {
            if block.index == 2 {
                Err(LedgerError::Journal {
                    path: journal.path().display().to_string(),
                    line: 3,
                    reason: "no space left on device".to_string(),
                })
            } else {
                journal.encode(block)
            }
        });
        assert!(journal.replace_with(lines).is_err());

        assert_eq!(std::fs::read(journal.path()).unwrap(), before);
        let loaded = Journal::load(journal.path(), 1).unwrap();
        assert_eq!(loaded.blocks(), original.blocks());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn rewrite_replaces_longer_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("chain.jsonl"));
        journal.write_all(ledger(3).blocks()).unwrap();
        let shorter = ledger(1);
        journal.write_all(shorter.blocks()).unwrap();

        let loaded = Journal::load(journal.path(), 1).unwrap();
        assert_eq!(loaded.blocks(), shorter.blocks());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn load_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jsonl");
        std::fs::write(&path, "{not json\n").unwrap();
        match Journal::load(&path, 1) {
            Err(LedgerError::Journal { path: shown, line, .. }) => {
                assert_eq!(line, 1);
                assert!(shown.ends_with("broken.jsonl"));
            }
            other => panic!("expected journal error, got {other:?}"),
        }
    }

    #[test]
    fn incremental_appends_match_write_all() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("chain.jsonl"));
        let original = ledger(2);
        for block in original.blocks() {
            journal.append(block).unwrap();
        }
        let text = std::fs::read_to_string(journal.path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        let loaded = Journal::load(journal.path(), 1).unwrap();
        assert_eq!(loaded.tip(), original.tip());
    }

    #[test]
    fn tampered_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.jsonl");
        Journal::new(&path).write_all(ledger(2).blocks()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let tampered = text.replacen("\"grade\":\"B\"", "\"grade\":\"A\"", 1);
        assert_ne!(text, tampered);
        std::fs::write(&path, tampered).unwrap();

        match Journal::load(&path, 1) {
            Err(LedgerError::Journal { line, reason, .. }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("hash"));
            }
            other => panic!("expected journal error, got {other:?}"),
        }
    }

    #[test]
    fn garbage_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.jsonl");
        Journal::new(&path).write_all(ledger(1).blocks()).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();

        assert!(matches!(
            Journal::load(&path, 1),
            Err(LedgerError::Journal { line: 3, .. })
        ));
    }

    #[test]
    fn empty_and_missing_journals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jsonl");
        std::fs::write(&path, "\n\n").unwrap();
        assert!(matches!(
            Journal::load(&path, 1),
            Err(LedgerError::Journal { line: 0, .. })
        ));
        assert!(matches!(
            Journal::load(dir.path().join("missing.jsonl"), 1),
            Err(LedgerError::Io(_))
        ));
    }

    #[test]
    fn dropped_line_breaks_linkage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.jsonl");
        Journal::new(&path).write_all(ledger(3).blocks()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let kept: Vec<&str> = text
            .lines()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, l)| l)
            .collect();
        std::fs::write(&path, kept.join("\n")).unwrap();
        assert!(matches!(
            Journal::load(&path, 1),
            Err(LedgerError::Journal { .. })
        ));
    }
}
