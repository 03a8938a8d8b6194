//! In-memory archive builder for unit tests.

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};

use super::structures::*;
use crate::io::SeekReader;

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A single final stored deflate block; `data` appears verbatim in the output.
pub fn deflate_stored_block(data: &[u8]) -> Vec<u8> {
    let len = data.len() as u16;
    let mut out = vec![0x01];
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&(!len).to_le_bytes());
    out.extend_from_slice(data);
    out
}

pub fn local_header(
    name: &str,
    method: u16,
    flags: u16,
    compressed_size: u32,
    uncompressed_size: u32,
    extra: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(LFH_SIZE + name.len() + extra.len());
    out.extend_from_slice(&LOCAL_HEADER_SIGNATURE.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&method.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0x21u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&compressed_size.to_le_bytes());
    out.extend_from_slice(&uncompressed_size.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(extra);
    out
}

#[derive(Default)]
pub struct ArchiveBuilder {
    pub bytes: Vec<u8>,
    /// Offset of every local header written so far
    pub headers: Vec<u64>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(self, name: &str) -> Self {
        self.entry(name, 0, 0, b"", 0)
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, 0, 0, data, data.len() as u32)
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        let compressed = deflate(data);
        self.entry(name, 8, 0, &compressed, data.len() as u32)
    }

    /// Deflate entry with sizes zeroed in the header and a trailing data descriptor.
    pub fn deflated_streamed(mut self, name: &str, data: &[u8]) -> Self {
        let compressed = deflate(data);
        self.headers.push(self.bytes.len() as u64);
        self.bytes
            .extend(local_header(name, 8, FLAG_DATA_DESCRIPTOR, 0, 0, &[]));
        self.bytes.extend_from_slice(&compressed);
        self.bytes.extend_from_slice(&0x08074b50u32.to_le_bytes());
        self.bytes.extend_from_slice(&0u32.to_le_bytes());
        self.bytes
            .extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        self
    }

    /// Entry with an explicit method and payload.
    pub fn entry(
        mut self,
        name: &str,
        method: u16,
        flags: u16,
        payload: &[u8],
        uncompressed_size: u32,
    ) -> Self {
        self.headers.push(self.bytes.len() as u64);
        self.bytes.extend(local_header(
            name,
            method,
            flags,
            payload.len() as u32,
            uncompressed_size,
            &[],
        ));
        self.bytes.extend_from_slice(payload);
        self
    }

    pub fn raw(mut self, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(data);
        self
    }

    /// Append a minimal central directory marker and EOCD record.
    pub fn central_directory(mut self) -> Self {
        self.bytes
            .extend_from_slice(&CENTRAL_HEADER_SIGNATURE.to_le_bytes());
        self.bytes.extend_from_slice(&[0u8; 42]);
        self.bytes.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        self.bytes.extend_from_slice(&[0u8; 18]);
        self
    }

    pub fn source(&self) -> SeekReader<Cursor<Vec<u8>>> {
        SeekReader::new(Cursor::new(self.bytes.clone())).unwrap()
    }
}
