//! Entry payload consumption.
//!
//! The consumer is the only component that knows where an entry's data ends.
//! For stored entries that is the declared size; for deflate entries it is
//! however many input bytes the inflate engine actually took before reporting
//! end of stream. The header's compressed size is never trusted for deflate,
//! since entries written with a data descriptor declare zero there.

use flate2::{Decompress, FlushDecompress, Status};
use log::debug;
use std::io::{ErrorKind, Write};

use super::scanner::CHUNK_SIZE;
use super::structures::{CompressionMethod, EntryMetadata};
use crate::error::{Result, ZipError};
use crate::io::ReadAt;

/// Extent of a consumed entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Consumed {
    /// Archive bytes occupied by the payload, starting at `data_offset`.
    pub compressed: u64,
    /// Bytes produced, whether written or discarded.
    pub uncompressed: u64,
}

/// Stream the payload of `entry` into `sink`, or discard it when `sink` is `None`.
///
/// On success the next entry can be searched for at
/// `entry.data_offset + consumed.compressed`.
pub fn consume_entry<R: ReadAt + ?Sized>(
    source: &mut R,
    entry: &EntryMetadata,
    sink: Option<&mut dyn Write>,
) -> Result<Consumed> {
    let consumed = match entry.compression_method {
        // Stored data has no end marker, so deferred sizes cannot be resolved.
        CompressionMethod::Stored if entry.sizes_deferred() => {
            return Err(ZipError::UnsupportedMethod(0));
        }
        CompressionMethod::Stored => copy_stored(source, entry, sink)?,
        CompressionMethod::Deflate => inflate(source, entry, sink)?,
        CompressionMethod::Unsupported(method) => {
            return Err(ZipError::UnsupportedMethod(method));
        }
    };

    debug!(
        "consumed {:?}: {} bytes in, {} bytes out",
        entry.name, consumed.compressed, consumed.uncompressed
    );
    Ok(consumed)
}

/// One positional read of payload bytes. End of data or a read failure
/// both mean the entry is cut short.
fn read_payload<R: ReadAt + ?Sized>(source: &mut R, offset: u64, buf: &mut [u8]) -> Result<usize> {
    loop {
        match source.read_at(offset, buf) {
            Ok(0) => {
                debug!("payload ends at {:#x}", offset);
                return Err(ZipError::Truncated { offset });
            }
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("payload read at {:#x} failed: {}", offset, e);
                return Err(ZipError::Truncated { offset });
            }
        }
    }
}

fn copy_stored<R: ReadAt + ?Sized>(
    source: &mut R,
    entry: &EntryMetadata,
    mut sink: Option<&mut dyn Write>,
) -> Result<Consumed> {
    let total = entry.declared_compressed_size;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut copied = 0u64;

    while copied < total {
        let want = (total - copied).min(CHUNK_SIZE as u64) as usize;
        let offset = entry.data_offset + copied;
        let n = read_payload(source, offset, &mut buf[..want])?;

        if let Some(out) = sink.as_deref_mut() {
            out.write_all(&buf[..n]).map_err(ZipError::Sink)?;
        }
        copied += n as u64;
    }

    if let Some(out) = sink {
        out.flush().map_err(ZipError::Sink)?;
    }

    Ok(Consumed {
        compressed: total,
        uncompressed: total,
    })
}

fn inflate<R: ReadAt + ?Sized>(
    source: &mut R,
    entry: &EntryMetadata,
    mut sink: Option<&mut dyn Write>,
) -> Result<Consumed> {
    // Raw deflate: ZIP entries carry no zlib header. State is per entry.
    let mut de = Decompress::new(false);
    let mut input = vec![0u8; CHUNK_SIZE];
    let mut output = vec![0u8; CHUNK_SIZE];

    loop {
        // Unconsumed input is re-read rather than carried, so the read
        // position is always data_offset + total_in.
        let offset = entry.data_offset + de.total_in();
        let filled = read_payload(source, offset, &mut input)?;

        let chunk_in = de.total_in();
        let mut in_pos = 0usize;

        loop {
            let before_in = de.total_in();
            let before_out = de.total_out();

            let status = de
                .decompress(&input[in_pos..filled], &mut output, FlushDecompress::None)
                .map_err(|e| ZipError::CorruptStream(e.to_string()))?;

            let consumed = (de.total_in() - before_in) as usize;
            let produced = (de.total_out() - before_out) as usize;
            in_pos += consumed;

            if produced != 0 {
                if let Some(out) = sink.as_deref_mut() {
                    out.write_all(&output[..produced]).map_err(ZipError::Sink)?;
                }
            }

            match status {
                Status::StreamEnd => {
                    if let Some(out) = sink.as_deref_mut() {
                        out.flush().map_err(ZipError::Sink)?;
                    }
                    return Ok(Consumed {
                        compressed: de.total_in(),
                        uncompressed: de.total_out(),
                    });
                }
                Status::Ok | Status::BufError => {
                    // A full output buffer may hide more pending output.
                    if produced == output.len() {
                        continue;
                    }
                    if in_pos >= filled || (consumed == 0 && produced == 0) {
                        break;
                    }
                }
            }
        }

        if de.total_in() == chunk_in {
            // A whole chunk went in without being consumed.
            return Err(ZipError::CorruptStream(format!(
                "inflate stalled at offset {:#x}",
                offset
            )));
        }
    }
}
