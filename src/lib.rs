//! # scanzip
//!
//! A recovery-oriented unzip library and CLI.
//!
//! Instead of trusting the central directory at the end of an archive, scanzip
//! walks the archive from the start and locates each entry by its local file
//! header signature. Each entry's payload is decoded to find out exactly where
//! it ends, and the search for the next entry resumes from there. This lets
//! entries be recovered from archives that are truncated, were written as a
//! stream, or carry a missing or bogus central directory.
//!
//! ## Features
//!
//! - Extract ZIP files from local filesystem or HTTP/HTTPS URLs (Range requests)
//! - STORED and DEFLATE entries, including data-descriptor entries with unknown sizes
//! - A bad entry does not stop the walk; the cursor resynchronizes and continues
//! - Selective file extraction with glob pattern matching
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use scanzip::ZipCursor;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut cursor = ZipCursor::open_path(Path::new("broken.zip"))?;
//!
//!     while cursor.advance()? {
//!         let name = cursor.current_name().unwrap_or_default().to_string();
//!         if name.ends_with('/') {
//!             continue;
//!         }
//!         match cursor.read_to_vec() {
//!             Ok(data) => println!("{}: {} bytes", name, data.len()),
//!             Err(e) => eprintln!("{}: {}", name, e),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::{Result, ZipError};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt, SeekReader};
pub use zip::{EntryMetadata, ZipCursor, ZipExtractor};
