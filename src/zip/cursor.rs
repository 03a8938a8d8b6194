//! Sequential archive cursor.
//!
//! The cursor walks an archive strictly forward:
//!
//! ```text
//! NoEntry -> HeaderFound -> DataConsumed -> HeaderFound -> ... -> Exhausted
//!            (advance)      (extract/skip)   (advance)
//! ```
//!
//! `advance` on an entry whose data was never consumed first skips it, so the
//! next search starts after its payload rather than inside it.

use log::{debug, warn};
use std::io::Write;
use std::path::Path;

use super::consumer::{consume_entry, Consumed};
use super::parser::decode_local_header;
use super::scanner::{find_next_signature, ScanResult};
use super::structures::EntryMetadata;
use crate::error::{Result, ZipError};
use crate::io::{read_full, LocalFileReader, ReadAt};

/// Position of the cursor relative to the current entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Nothing has been located yet.
    NoEntry,
    /// A header was decoded; its data has not been consumed.
    HeaderFound,
    /// The current entry's data was extracted, skipped, or failed.
    DataConsumed,
    /// No more entries. Sticky.
    Exhausted,
}

/// Forward-only iterator over the entries of an archive.
///
/// The cursor exclusively owns its source and is not meant to be shared
/// between threads while in use.
pub struct ZipCursor<R: ReadAt> {
    source: R,
    scan_cursor: u64,
    current: Option<EntryMetadata>,
    state: EntryState,
}

impl ZipCursor<LocalFileReader> {
    /// Open an archive on the local filesystem.
    pub fn open_path(path: &Path) -> Result<Self> {
        let reader = LocalFileReader::open(path).map_err(ZipError::NotAnArchive)?;
        Self::open(reader)
    }
}

impl<R: ReadAt> ZipCursor<R> {
    /// Wrap a byte source. The source must be readable at offset 0;
    /// an empty source is a valid archive without entries.
    pub fn open(mut source: R) -> Result<Self> {
        let mut probe = [0u8; 4];
        read_full(&mut source, 0, &mut probe).map_err(ZipError::NotAnArchive)?;

        Ok(Self {
            source,
            scan_cursor: 0,
            current: None,
            state: EntryState::NoEntry,
        })
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Offset from which the next signature search starts.
    pub fn scan_offset(&self) -> u64 {
        self.scan_cursor
    }

    /// Metadata of the most recently located entry.
    pub fn entry(&self) -> Option<&EntryMetadata> {
        self.current.as_ref()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|e| e.name.as_str())
    }

    /// Move to the next entry. Returns `false` once the archive is exhausted.
    ///
    /// # Errors
    ///
    /// Only archive-level failures are returned (the source became
    /// unreadable); the cursor is then exhausted. A pending entry that fails
    /// to skip is logged and the search resumes at its data offset.
    pub fn advance(&mut self) -> Result<bool> {
        match self.state {
            EntryState::Exhausted => return Ok(false),
            EntryState::HeaderFound => {
                if let Err(e) = self.consume(None) {
                    warn!(
                        "could not skip {:?}, rescanning from {:#x}: {}",
                        self.current_name().unwrap_or_default(),
                        self.scan_cursor,
                        e
                    );
                }
            }
            EntryState::NoEntry | EntryState::DataConsumed => {}
        }

        self.current = None;

        loop {
            let offset = match find_next_signature(&mut self.source, self.scan_cursor) {
                Ok(ScanResult::EntryFound(offset)) => offset,
                Ok(ScanResult::NoMoreEntries) => {
                    debug!("no more entries after {:#x}", self.scan_cursor);
                    self.state = EntryState::Exhausted;
                    return Ok(false);
                }
                Err(e) => return Err(self.fail(e)),
            };

            match decode_local_header(&mut self.source, offset) {
                Ok(entry) => {
                    self.scan_cursor = entry.data_offset;
                    self.current = Some(entry);
                    self.state = EntryState::HeaderFound;
                    return Ok(true);
                }
                Err(e @ (ZipError::Corrupt { .. } | ZipError::Truncated { .. })) => {
                    warn!("ignoring signature at {:#x}: {}", offset, e);
                    self.scan_cursor = offset + 1;
                }
                Err(e) => return Err(self.fail(e)),
            }
        }
    }

    /// Advance and hand out an owned copy of the new entry's metadata.
    pub fn next_entry(&mut self) -> Result<Option<EntryMetadata>> {
        Ok(if self.advance()? { self.current.clone() } else { None })
    }

    /// Write the current entry's decoded data to `sink`.
    pub fn extract(&mut self, sink: &mut dyn Write) -> Result<Consumed> {
        self.consume(Some(sink))
    }

    /// Like [`extract`](Self::extract) into a fresh `Vec`.
    pub fn read_to_vec(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.extract(&mut out)?;
        Ok(out)
    }

    /// Discard the current entry's data.
    pub fn skip(&mut self) -> Result<Consumed> {
        self.consume(None)
    }

    /// Release the underlying source.
    pub fn close(self) -> R {
        self.source
    }

    fn consume(&mut self, sink: Option<&mut dyn Write>) -> Result<Consumed> {
        if self.state != EntryState::HeaderFound {
            return Err(ZipError::InvalidState(
                "entry data can only be consumed once, after a successful advance",
            ));
        }
        let entry = self
            .current
            .as_ref()
            .ok_or(ZipError::InvalidState("no current entry"))?;

        let result = consume_entry(&mut self.source, entry, sink);
        match &result {
            Ok(consumed) => self.scan_cursor = entry.data_offset + consumed.compressed,
            // The payload is intact, only the destination failed: skip it so
            // headers embedded in the data are not mistaken for entries.
            Err(ZipError::Sink(_)) => match consume_entry(&mut self.source, entry, None) {
                Ok(consumed) => self.scan_cursor = entry.data_offset + consumed.compressed,
                Err(e) => debug!("skip after write failure on {:?} failed: {}", entry.name, e),
            },
            // scan_cursor stays at data_offset; the next advance rescans the payload.
            Err(_) => {}
        }
        self.state = EntryState::DataConsumed;
        result
    }

    fn fail(&mut self, e: ZipError) -> ZipError {
        self.state = EntryState::Exhausted;
        self.current = None;
        e
    }
}
