//! Error types for archive scanning and extraction.

use std::io;

use thiserror::Error;

/// Errors that can occur while walking an archive.
///
/// The variants split into two groups. Per-entry failures ([`Truncated`],
/// [`CorruptStream`], [`UnsupportedMethod`], [`Sink`]) only affect the entry
/// being consumed; the cursor resynchronizes and enumeration continues.
/// Everything else ends the walk.
///
/// [`Truncated`]: ZipError::Truncated
/// [`CorruptStream`]: ZipError::CorruptStream
/// [`UnsupportedMethod`]: ZipError::UnsupportedMethod
/// [`Sink`]: ZipError::Sink
#[derive(Debug, Error)]
pub enum ZipError {
    /// The source could not be opened or read at all.
    #[error("not an archive: {0}")]
    NotAnArchive(#[source] io::Error),

    /// A local file header signature was expected but not found.
    #[error("corrupt local file header at {offset:#x}: found signature {found:#010x}")]
    Corrupt { offset: u64, found: u32 },

    /// Declared or inferred data extends past the available bytes.
    #[error("archive truncated at offset {offset:#x}")]
    Truncated { offset: u64 },

    /// The inflate engine rejected the DEFLATE bitstream.
    #[error("corrupt deflate stream: {0}")]
    CorruptStream(String),

    /// Compression method other than store or deflate.
    #[error("unsupported compression method: {0}")]
    UnsupportedMethod(u16),

    /// The destination rejected decoded bytes.
    #[error("failed to write entry data: {0}")]
    Sink(#[source] io::Error),

    /// The byte source failed while scanning or decoding a header.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An operation was called in a cursor state that does not allow it.
    #[error("invalid cursor state: {0}")]
    InvalidState(&'static str),
}

impl ZipError {
    /// Whether this failure is confined to a single entry.
    pub fn is_entry_local(&self) -> bool {
        matches!(
            self,
            ZipError::Truncated { .. }
                | ZipError::CorruptStream(_)
                | ZipError::UnsupportedMethod(_)
                | ZipError::Sink(_)
        )
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ZipError>;
