//! The durable log store backing a replica.
//!
//! All persistent Raft state (`current_term`, `voted_for` and the log
//! entries) lives in a single file with a fixed header followed by
//! fixed-size entry records:
//!
//! ```text
//! off  0: u32 magic          (0x52414654, "RAFT")
//! off  4: u32 current_term
//! off  8: [u8; 32] voted_for (NUL-padded, last byte always 0)
//! off 40: entry 1, entry 2, ...  each exactly `entry_size` bytes
//! ```
//!
//! Each entry is a little-endian `u32` term followed by the fixed-size
//! payload. Every public mutation is flushed with `sync_all` before it
//! returns: an acknowledged state change survives a crash. `last_log_index`
//! is not stored, it is derived from the file length on recovery.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str;

use bytes::Bytes;
use log::{debug, info};

use crate::error::{Error, Result};
use crate::message::{LogEntry, LogIndex, ReplicaId, Term};

/// Marks a file as a replica log.
pub(crate) const MAGIC: u32 = 0x5241_4654;

/// Size of the on-disk `voted_for` field, including the mandatory NUL.
pub(crate) const VOTED_FOR_SIZE: usize = 32;

/// Size of the serialized term prefixing each entry record.
pub(crate) const TERM_SIZE: usize = 4;

const MAGIC_OFS: u64 = 0;
const CURRENT_TERM_OFS: u64 = 4;
const VOTED_FOR_OFS: u64 = 8;
const ENTRIES_OFS: u64 = 40;

/// The append-only entry log plus voting-state header, owned exclusively
/// by one replica for its lifetime.
#[derive(Debug)]
pub struct LogStore {
    file: File,
    path: PathBuf,
    entry_size: usize,
    current_term: Term,
    voted_for: ReplicaId,
    last_log_index: LogIndex,
    last_log_term: Term,
}

impl LogStore {
    /// Opens the log at `path`, creating and formatting it on first boot,
    /// validating and recovering it otherwise.
    ///
    /// Recovery rejects a wrong magic number, an entry region whose size is
    /// not a multiple of `entry_size`, a `voted_for` field without a NUL
    /// byte, and a non-empty `voted_for` naming neither `local_id` nor a
    /// configured peer.
    pub fn open(
        path: &Path,
        entry_size: usize,
        local_id: &str,
        peers: &BTreeSet<ReplicaId>,
    ) -> Result<Self> {
        if entry_size <= TERM_SIZE {
            return Err(Error::Config(format!(
                "log entry size {} is too short",
                entry_size
            )));
        }
        let first_boot = !path.exists();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let mut store = Self {
            file,
            path: path.to_owned(),
            entry_size,
            current_term: 0,
            voted_for: ReplicaId::new(),
            last_log_index: 0,
            last_log_term: 0,
        };
        if first_boot {
            store.format()?;
            info!("log {} initialized on first boot", path.display());
        } else {
            store.recover(local_id, peers)?;
            info!(
                "log {} recovered: term {}, voted_for {:?}, {} entries",
                path.display(),
                store.current_term,
                store.voted_for,
                store.last_log_index
            );
        }
        Ok(store)
    }

    /// The recovered or last written `current_term`.
    pub fn current_term(&self) -> Term {
        self.current_term
    }

    /// The vote cast in `current_term`, or the empty string if none.
    pub fn voted_for(&self) -> &str {
        &self.voted_for
    }

    /// Index of the last entry, `0` when the log is empty.
    pub fn last_log_index(&self) -> LogIndex {
        self.last_log_index
    }

    /// Term of the entry at `last_log_index`, `0` when the log is empty.
    pub fn last_log_term(&self) -> Term {
        self.last_log_term
    }

    /// Durably updates `current_term`.
    pub fn set_current_term(&mut self, term: Term) -> Result<()> {
        self.write_u32(CURRENT_TERM_OFS, term)?;
        self.flush()?;
        self.current_term = term;
        Ok(())
    }

    /// Durably updates `voted_for`. Pass the empty string to reset the
    /// voting state.
    pub fn set_voted_for(&mut self, id: &str) -> Result<()> {
        if self.voted_for == id {
            return Ok(());
        }
        if id.len() >= VOTED_FOR_SIZE {
            return Err(Error::Storage(format!(
                "replica id {:?} does not fit the voted_for field",
                id
            )));
        }
        let mut buf = [0u8; VOTED_FOR_SIZE];
        buf[..id.len()].copy_from_slice(id.as_bytes());
        self.write_at(VOTED_FOR_OFS, &buf)?;
        self.flush()?;
        self.voted_for = id.to_owned();
        Ok(())
    }

    /// Durably writes `entries` at positions `start..start + entries.len()`.
    ///
    /// Incoming entries whose index and term already match the local log
    /// are skipped. From the first disagreeing index onwards any existing
    /// tail is truncated before the remaining entries are written, so an
    /// agreeing prefix never shortens a longer local log.
    pub fn append(&mut self, start: LogIndex, entries: &[LogEntry]) -> Result<()> {
        if start == 0 || start > self.last_log_index + 1 {
            return Err(Error::Storage(format!(
                "append at index {} would leave a gap after {}",
                start, self.last_log_index
            )));
        }
        // Skip the prefix that is already present with matching terms.
        let mut first = start;
        for entry in entries {
            if first > self.last_log_index || self.entry_term_at(first)? != entry.term {
                break;
            }
            first += 1;
        }
        let skip = (first - start) as usize;
        if skip == entries.len() {
            return Ok(());
        }
        for entry in &entries[skip..] {
            if entry.payload.len() != self.entry_size - TERM_SIZE {
                return Err(Error::Storage(format!(
                    "entry payload is {} bytes, records hold {}",
                    entry.payload.len(),
                    self.entry_size - TERM_SIZE
                )));
            }
        }
        if first <= self.last_log_index {
            debug!(
                "truncating {} conflicting entries from index {}",
                self.last_log_index - first + 1,
                first
            );
            self.file.set_len(self.entry_offset(first))?;
            self.last_log_index = first - 1;
        }
        let mut record = vec![0u8; self.entry_size];
        for (i, entry) in entries[skip..].iter().enumerate() {
            record[..TERM_SIZE].copy_from_slice(&entry.term.to_le_bytes());
            record[TERM_SIZE..].copy_from_slice(&entry.payload);
            self.write_at(self.entry_offset(first + i as u64), &record)?;
        }
        self.flush()?;
        self.last_log_index = start + entries.len() as u64 - 1;
        if let Some(last) = entries.last() {
            self.last_log_term = last.term;
        }
        Ok(())
    }

    /// Reads the entry at `index`, which must be in `1..=last_log_index`.
    pub fn read_entry(&mut self, index: LogIndex) -> Result<LogEntry> {
        self.check_bounds(index)?;
        let mut record = vec![0u8; self.entry_size];
        let offset = self.entry_offset(index);
        self.read_at(offset, &mut record)?;
        let term = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        Ok(LogEntry {
            term,
            payload: Bytes::copy_from_slice(&record[TERM_SIZE..]),
        })
    }

    /// Reads only the term of the entry at `index`.
    pub fn read_entry_term(&mut self, index: LogIndex) -> Result<Term> {
        self.check_bounds(index)?;
        self.entry_term_at(index)
    }

    /// Deletes the log file. Destructive: meant for tests tearing a
    /// replica down, never for production hosts.
    pub fn remove(self) -> Result<()> {
        let path = self.path.clone();
        drop(self);
        fs::remove_file(&path)?;
        Ok(())
    }

    fn format(&mut self) -> Result<()> {
        self.write_u32(MAGIC_OFS, MAGIC)?;
        self.write_u32(CURRENT_TERM_OFS, 0)?;
        self.write_at(VOTED_FOR_OFS, &[0u8; VOTED_FOR_SIZE])?;
        self.file.set_len(ENTRIES_OFS)?;
        self.flush()
    }

    fn recover(&mut self, local_id: &str, peers: &BTreeSet<ReplicaId>) -> Result<()> {
        let len = self.file.metadata()?.len();
        if len < ENTRIES_OFS || (len - ENTRIES_OFS) % self.entry_size as u64 != 0 {
            return Err(Error::Storage(format!("log size {} is invalid", len)));
        }
        if self.read_u32(MAGIC_OFS)? != MAGIC {
            return Err(Error::Storage("log magic number mismatch".to_owned()));
        }
        self.current_term = self.read_u32(CURRENT_TERM_OFS)?;
        let mut buf = [0u8; VOTED_FOR_SIZE];
        self.read_at(VOTED_FOR_OFS, &mut buf)?;
        let nul = buf
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| Error::Storage("voted_for field is not NUL terminated".to_owned()))?;
        let voted_for = str::from_utf8(&buf[..nul])
            .map_err(|_| Error::Storage("voted_for field is not valid UTF-8".to_owned()))?
            .to_owned();
        if !voted_for.is_empty() && voted_for != local_id && !peers.contains(&voted_for) {
            return Err(Error::Storage(format!(
                "voted_for {:?} does not match any replica",
                voted_for
            )));
        }
        self.voted_for = voted_for;
        self.last_log_index = (len - ENTRIES_OFS) / self.entry_size as u64;
        self.last_log_term = if self.last_log_index > 0 {
            self.entry_term_at(self.last_log_index)?
        } else {
            0
        };
        Ok(())
    }

    fn entry_offset(&self, index: LogIndex) -> u64 {
        ENTRIES_OFS + (index - 1) * self.entry_size as u64
    }

    fn entry_term_at(&mut self, index: LogIndex) -> Result<Term> {
        self.read_u32(self.entry_offset(index))
    }

    fn check_bounds(&self, index: LogIndex) -> Result<()> {
        if index == 0 || index > self.last_log_index {
            return Err(Error::Storage(format!(
                "entry index {} out of range 1..={}",
                index, self.last_log_index
            )));
        }
        Ok(())
    }

    fn write_u32(&mut self, pos: u64, val: u32) -> Result<()> {
        self.write_at(pos, &val.to_le_bytes())
    }

    fn read_u32(&mut self, pos: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_at(pos, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn write_at(&mut self, pos: u64, buf: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
