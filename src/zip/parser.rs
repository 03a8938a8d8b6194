//! Local file header decoding.
//!
//! Only the local header is consulted: declared sizes are taken at face
//! value, the extra field is skipped without interpretation and no central
//! directory record is ever read.

use log::debug;

use super::structures::*;
use crate::error::{Result, ZipError};
use crate::io::{read_full, ReadAt};

/// Decode the local file header starting at `offset`.
///
/// # Errors
///
/// - [`ZipError::Corrupt`] if the signature at `offset` is not a local header
/// - [`ZipError::Truncated`] if the stream ends inside the header or name
/// - [`ZipError::Io`] if the source cannot be read
pub fn decode_local_header<R: ReadAt + ?Sized>(source: &mut R, offset: u64) -> Result<EntryMetadata> {
    let mut lfh_buf = [0u8; LFH_SIZE];
    if read_full(source, offset, &mut lfh_buf)? < LFH_SIZE {
        return Err(ZipError::Truncated { offset });
    }

    let header = LocalFileHeader::from_bytes(&lfh_buf)?;
    if header.signature != LOCAL_HEADER_SIGNATURE {
        return Err(ZipError::Corrupt {
            offset,
            found: header.signature,
        });
    }

    // The name is exactly file_name_length bytes; no terminator is expected.
    let name_offset = offset + LFH_SIZE as u64;
    let mut raw_name = vec![0u8; header.file_name_length as usize];
    if read_full(source, name_offset, &mut raw_name)? < raw_name.len() {
        return Err(ZipError::Truncated {
            offset: name_offset,
        });
    }
    // Use lossy conversion to handle non-UTF8 filenames gracefully
    let name = String::from_utf8_lossy(&raw_name).into_owned();

    let data_offset = name_offset + header.file_name_length as u64 + header.extra_field_length as u64;

    let (declared_compressed_size, declared_uncompressed_size) =
        if header.has_data_descriptor() && header.compressed_size == 0 {
            (0, 0)
        } else {
            (header.compressed_size as u64, header.uncompressed_size as u64)
        };

    let entry = EntryMetadata {
        name,
        raw_name,
        compression_method: CompressionMethod::from_u16(header.compression_method),
        flags: header.flags,
        declared_compressed_size,
        declared_uncompressed_size,
        crc32: header.crc32,
        last_mod_time: header.last_mod_time,
        last_mod_date: header.last_mod_date,
        header_offset: offset,
        data_offset,
    };

    debug!(
        "local header at {:#x}: {:?} method={} flags={:#06x} data at {:#x}",
        offset,
        entry.name,
        header.compression_method,
        header.flags,
        data_offset
    );

    Ok(entry)
}
