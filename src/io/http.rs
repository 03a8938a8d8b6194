use log::warn;
use reqwest::blocking::Client;
use std::io;
use std::thread;
use std::time::Duration;

use super::ReadAt;
use anyhow::{anyhow, bail, Result};

const DEFAULT_BLOCK_SIZE: u64 = 256 * 1024;

/// HTTP Range reader for remote ZIP files
///
/// The scanner walks the archive front to back in small reads, so responses
/// are fetched a block at a time and the most recent block is kept.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    block_size: u64,
    block: Block,
    transferred_bytes: u64,
    max_retry: u32,
}

impl HttpRangeReader {
    /// Create a new HTTP Range reader
    ///
    /// This will send a HEAD request to verify Range support and get file size
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        // Send HEAD request to check capabilities
        let resp = client.head(&url).send()?;

        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        // Check if server supports Range requests
        let accept_ranges = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");

        if !accept_ranges.contains("bytes") {
            bail!("Remote server does not support Range requests");
        }

        // Get file size from Content-Length
        let size = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;

        Ok(Self {
            client,
            url,
            size,
            block_size: DEFAULT_BLOCK_SIZE,
            block: Block::default(),
            transferred_bytes: 0,
            max_retry: 10,
        })
    }

    /// Override how many bytes each Range request fetches
    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    fn fetch_block(&mut self, offset: u64) -> io::Result<()> {
        let end = block_end(offset, self.block_size, self.size);
        let expected_size = (end - offset + 1) as usize;

        let mut block = Vec::with_capacity(expected_size);
        let mut retry_count = 0;

        while block.len() < expected_size {
            let current_start = offset + block.len() as u64;
            let range = format!("bytes={}-{}", current_start, end);

            let result = self.client.get(&self.url).header("Range", &range).send();

            match result {
                Ok(resp) => {
                    if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                        return Err(io::Error::other(format!(
                            "HTTP request failed with status: {}",
                            resp.status()
                        )));
                    }

                    let bytes = resp.bytes().map_err(io::Error::other)?;
                    if bytes.is_empty() {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "server returned an empty range",
                        ));
                    }
                    let chunk_len = bytes.len().min(expected_size - block.len());
                    block.extend_from_slice(&bytes[..chunk_len]);
                    self.transferred_bytes += chunk_len as u64;
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        return Err(io::Error::new(io::ErrorKind::TimedOut, "max retries exceeded"));
                    }
                    warn!("connection error, retry {}/{}: {}", retry_count, self.max_retry, e);
                    thread::sleep(Duration::from_millis(500 * retry_count as u64));
                }
                Err(e) => return Err(io::Error::other(e)),
            }
        }

        self.block = Block {
            start: offset,
            data: block,
        };
        Ok(())
    }
}

/// Inclusive last byte of the block starting at `offset`
fn block_end(offset: u64, block_size: u64, size: u64) -> u64 {
    (offset + block_size).min(size) - 1
}

/// The most recently fetched range of the remote file
#[derive(Debug, Default)]
struct Block {
    start: u64,
    data: Vec<u8>,
}

impl Block {
    /// Copy cached bytes at `offset` into `buf`. `None` on a cache miss.
    /// Reads never extend past the end of the block.
    fn copy_to(&self, offset: u64, buf: &mut [u8]) -> Option<usize> {
        if offset < self.start || offset - self.start >= self.data.len() as u64 {
            return None;
        }
        let start = (offset - self.start) as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Some(n)
    }
}

impl ReadAt for HttpRangeReader {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        if let Some(n) = self.block.copy_to(offset, buf) {
            return Ok(n);
        }
        self.fetch_block(offset)?;
        Ok(self.block.copy_to(offset, buf).unwrap_or(0))
    }

    fn size(&self) -> Option<u64> {
        Some(self.size)
    }
}
