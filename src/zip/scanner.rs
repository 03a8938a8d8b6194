//! Forward signature scanning.
//!
//! Entries are located by searching the raw bytes for the local file header
//! signature instead of consulting the central directory. This costs a
//! linear scan but still works when the central directory is missing,
//! truncated or simply wrong.

use log::trace;

use super::structures::{LOCAL_HEADER_SIGNATURE, TERMINATOR_SIGNATURES};
use crate::error::Result;
use crate::io::{read_full, ReadAt};

/// Bytes read per scan step.
pub const CHUNK_SIZE: usize = 4096;

/// Bytes re-read across chunk boundaries so a split signature is still seen.
pub const SIGNATURE_OVERLAP: usize = 3;

/// Outcome of a signature search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanResult {
    /// A local file header starts at this absolute offset.
    EntryFound(u64),
    /// The entry region has ended (central directory reached or end of stream).
    NoMoreEntries,
}

/// Search forward from `start` for the next structural signature.
///
/// Every byte offset is checked, not just aligned ones. Read errors are
/// returned as [`ZipError::Io`](crate::ZipError::Io).
pub fn find_next_signature<R: ReadAt + ?Sized>(source: &mut R, start: u64) -> Result<ScanResult> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut chunk_start = start;

    loop {
        let filled = read_full(source, chunk_start, &mut buffer)?;
        trace!("scanning {} bytes at {:#x}", filled, chunk_start);

        if filled < 4 {
            return Ok(ScanResult::NoMoreEntries);
        }

        for (i, window) in buffer[..filled].windows(4).enumerate() {
            let signature = u32::from_le_bytes([window[0], window[1], window[2], window[3]]);

            if signature == LOCAL_HEADER_SIGNATURE {
                return Ok(ScanResult::EntryFound(chunk_start + i as u64));
            }
            if TERMINATOR_SIGNATURES.contains(&signature) {
                trace!("terminator {:#010x} at {:#x}", signature, chunk_start + i as u64);
                return Ok(ScanResult::NoMoreEntries);
            }
        }

        if filled < buffer.len() {
            return Ok(ScanResult::NoMoreEntries);
        }

        chunk_start += (filled - SIGNATURE_OVERLAP) as u64;
    }
}
