//! Upload size enforcement while streaming.

use std::io::{self, Read};

/// Passes bytes through until more than `limit` have been read, then fails
/// with `InvalidData`.
pub struct SizeLimited<R> {
    inner: R,
    limit: u64,
    read: u64,
}

impl<R: Read> SizeLimited<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            limit,
            read: 0,
        }
    }
}

impl<R: Read> Read for SizeLimited<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        if self.read > self.limit {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file exceeds the {} byte limit", self.limit),
            ));
        }
        Ok(n)
    }
}
