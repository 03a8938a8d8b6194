//! ZIP archive scanning and extraction.
//!
//! Entries are found by walking the archive front to back and searching for
//! local file header signatures. The central directory is never read; it only
//! serves as the point where the walk stops. This keeps extraction working
//! for archives that are truncated, streamed, or have a damaged directory.
//!
//! ## Architecture
//!
//! - [`scanner`]: finds the next local header (or the end of the entry region)
//! - [`parser`]: decodes a local header into [`EntryMetadata`]
//! - [`consumer`]: streams an entry's payload and measures how many archive
//!   bytes it occupied
//! - [`cursor`]: the advance / extract / skip state machine built on the above
//! - [`extractor`]: high-level extraction to disk or a writer
//!
//! ## Supported Features
//!
//! - STORED (no compression) method
//! - DEFLATE compression method, including entries with a trailing data
//!   descriptor and zero sizes in the local header
//!
//! ## Limitations
//!
//! - No CRC-32 verification
//! - No ZIP64, encryption, or multi-disk support
//! - No BZIP2, LZMA, or other compression methods

pub mod consumer;
pub mod cursor;
pub mod extractor;
pub mod parser;
pub mod scanner;
mod structures;

#[cfg(test)]
mod testutil;

pub use consumer::{consume_entry, Consumed};
pub use cursor::{EntryState, ZipCursor};
pub use extractor::{
    enclosed_path, ExtractOptions, ExtractSummary, ListedEntry, OverwriteMode, ZipExtractor,
};
pub use parser::decode_local_header;
pub use scanner::{find_next_signature, ScanResult, CHUNK_SIZE};
pub use structures::*;
