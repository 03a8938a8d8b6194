mod http;
mod local;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;

use std::io::{self, Read, Seek, SeekFrom};

/// Trait for positional reading from a data source
pub trait ReadAt {
    /// Read data at the specified offset into the buffer.
    ///
    /// May return fewer bytes than requested; `Ok(0)` means end of stream.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Total size of the data source, if known
    fn size(&self) -> Option<u64>;
}

impl<T: ReadAt + ?Sized> ReadAt for &mut T {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn size(&self) -> Option<u64> {
        (**self).size()
    }
}

/// Fill `buf` from `offset`, stopping early only at end of stream.
///
/// Returns the number of bytes placed in `buf`.
pub fn read_full<R: ReadAt + ?Sized>(source: &mut R, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read_at(offset + filled as u64, &mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Adapts any seekable stream to [`ReadAt`].
pub struct SeekReader<R> {
    inner: R,
    size: u64,
}

impl<R: Read + Seek> SeekReader<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, size })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ReadAt for SeekReader<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.size || buf.is_empty() {
            return Ok(0);
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read(buf)
    }

    fn size(&self) -> Option<u64> {
        Some(self.size)
    }
}
