//! End-to-end behaviour of the forward-scanning cursor against archives
//! produced by the `zip` crate, plus hand-built streamed and damaged ones.

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fs;
use std::io::{Cursor, Read, Write};

use scanzip::zip::{ExtractOptions, OverwriteMode};
use scanzip::{LocalFileReader, SeekReader, ZipCursor, ZipError, ZipExtractor};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

fn thousand_bytes() -> Vec<u8> {
    (0..1000u32).map(|i| b"scanzip!"[(i % 8) as usize] ^ (i / 50) as u8).collect()
}

/// Directory marker, a 10-byte stored file and a deflated file of 1000 bytes.
fn reference_archive() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.add_directory("assets/", stored).unwrap();
    writer.start_file("assets/ten.txt", stored).unwrap();
    writer.write_all(b"0123456789").unwrap();
    writer.start_file("assets/big.bin", deflated).unwrap();
    writer.write_all(&thousand_bytes()).unwrap();

    writer.finish().unwrap().into_inner()
}

fn cursor_over(bytes: Vec<u8>) -> ZipCursor<SeekReader<Cursor<Vec<u8>>>> {
    ZipCursor::open(SeekReader::new(Cursor::new(bytes)).unwrap()).unwrap()
}

fn raw_deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn local_header(name: &str, method: u16, flags: u16, compressed: u32, uncompressed: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"PK\x03\x04");
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&method.to_le_bytes());
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&compressed.to_le_bytes());
    out.extend_from_slice(&uncompressed.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out
}

#[test]
fn three_entry_archive_walk() {
    let mut cursor = cursor_over(reference_archive());

    assert!(cursor.advance().unwrap());
    let dir = cursor.entry().unwrap().clone();
    assert_eq!(dir.name, "assets/");
    assert!(dir.name.ends_with('/'));
    assert!(dir.is_directory());

    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.current_name(), Some("assets/ten.txt"));
    let stored = cursor.read_to_vec().unwrap();
    assert_eq!(stored.len(), 10);
    assert_eq!(stored, b"0123456789");

    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.current_name(), Some("assets/big.bin"));
    let deflated = cursor.read_to_vec().unwrap();
    assert_eq!(deflated.len(), 1000);
    assert_eq!(deflated, thousand_bytes());

    assert!(!cursor.advance().unwrap());
    assert!(!cursor.advance().unwrap());
}

#[test]
fn deflate_output_matches_reference_reader() {
    let bytes = reference_archive();
    let mut reference = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
    let mut cursor = cursor_over(bytes);

    while cursor.advance().unwrap() {
        let name = cursor.current_name().unwrap().to_string();
        let mut expected = Vec::new();
        reference
            .by_name(&name)
            .unwrap()
            .read_to_end(&mut expected)
            .unwrap();

        assert_eq!(cursor.read_to_vec().unwrap(), expected, "{}", name);
    }
}

#[test]
fn skip_lands_on_reference_header_offsets() {
    let bytes = reference_archive();
    let mut reference = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
    let expected: Vec<u64> = (0..reference.len())
        .map(|i| reference.by_index(i).unwrap().header_start())
        .collect();

    let mut cursor = cursor_over(bytes);
    let mut found = Vec::new();
    while cursor.advance().unwrap() {
        found.push(cursor.entry().unwrap().header_offset);
        cursor.skip().unwrap();
    }

    assert_eq!(found, expected);
}

#[test]
fn recovers_entries_without_central_directory() {
    let bytes = reference_archive();
    let mut reference = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
    let last = reference.by_name("assets/big.bin").unwrap();
    let cd_start = (last.data_start() + last.compressed_size()) as usize;
    drop(last);

    let mut cursor = cursor_over(bytes[..cd_start].to_vec());
    let mut names = Vec::new();
    while let Some(entry) = cursor.next_entry().unwrap() {
        cursor.skip().unwrap();
        names.push(entry.name);
    }

    assert_eq!(names, ["assets/", "assets/ten.txt", "assets/big.bin"]);
}

#[test]
fn truncated_last_entry_fails_alone() {
    let bytes = reference_archive();
    let mut reference = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
    let last = reference.by_name("assets/big.bin").unwrap();
    let cut = (last.data_start() + last.compressed_size() / 2) as usize;
    drop(last);

    let mut cursor = cursor_over(bytes[..cut].to_vec());
    assert!(cursor.advance().unwrap());
    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.read_to_vec().unwrap(), b"0123456789");

    assert!(cursor.advance().unwrap());
    let err = cursor.read_to_vec().unwrap_err();
    assert!(matches!(err, ZipError::Truncated { .. }));
    assert!(err.is_entry_local());

    assert!(!cursor.advance().unwrap());
}

#[test]
fn data_descriptor_entry_measures_true_compressed_length() {
    let data = thousand_bytes().repeat(5);
    let compressed = raw_deflate(&data);

    let mut bytes = local_header("streamed.bin", 8, 0x08, 0, 0);
    let second_header = {
        bytes.extend_from_slice(&compressed);
        bytes.extend_from_slice(b"PK\x07\x08");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.len() as u64
    };
    bytes.extend(local_header("after.txt", 0, 0, 5, 5));
    bytes.extend_from_slice(b"after");

    let mut cursor = cursor_over(bytes);
    assert!(cursor.advance().unwrap());
    let entry = cursor.entry().unwrap().clone();
    assert_eq!(entry.declared_compressed_size, 0);

    let mut out = Vec::new();
    let consumed = cursor.extract(&mut out).unwrap();
    assert_eq!(consumed.compressed, compressed.len() as u64);
    assert_eq!(out, data);

    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.entry().unwrap().header_offset, second_header);
    assert_eq!(cursor.read_to_vec().unwrap(), b"after");
}

#[test]
fn signature_inside_deflate_payload_is_not_an_entry() {
    // A stored deflate block copies its bytes verbatim, signature included.
    let payload = b"xxPK\x03\x04yy".repeat(3);
    let mut compressed = vec![0x01];
    compressed.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    compressed.extend_from_slice(&(!(payload.len() as u16)).to_le_bytes());
    compressed.extend_from_slice(&payload);

    let mut bytes = local_header("one.bin", 8, 0, compressed.len() as u32, payload.len() as u32);
    bytes.extend_from_slice(&compressed);
    bytes.extend_from_slice(b"PK\x05\x06");
    bytes.extend_from_slice(&[0u8; 18]);

    let mut cursor = cursor_over(bytes);
    let mut count = 0;
    while cursor.advance().unwrap() {
        count += 1;
    }
    assert_eq!(count, 1);
}

#[test]
fn extract_from_local_file() {
    let tmp = tempfile::tempdir().unwrap();
    let archive_path = tmp.path().join("input.zip");
    fs::write(&archive_path, reference_archive()).unwrap();
    let out_dir = tmp.path().join("out");

    let reader = LocalFileReader::open(&archive_path).unwrap();
    let mut extractor = ZipExtractor::new(reader).unwrap();
    let options = ExtractOptions {
        dest_dir: out_dir.clone(),
        junk_paths: false,
        overwrite: OverwriteMode::Always,
        quiet: true,
    };
    let summary = extractor.extract_all(&options, |_| true).unwrap();

    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.directories, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(fs::read(out_dir.join("assets/ten.txt")).unwrap(), b"0123456789");
    assert_eq!(fs::read(out_dir.join("assets/big.bin")).unwrap(), thousand_bytes());
}
