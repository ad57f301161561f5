use crate::constants;
use bytes::{Buf, BytesMut};
use memchr::memmem;

/// The parser's rolling input buffer.
///
/// Holds only bytes that haven't been consumed yet: a partial delimiter
/// tail, or an in-progress header block.
#[derive(Debug)]
pub(crate) struct StreamBuffer {
    pub(crate) buf: BytesMut,
    pub(crate) whole_stream_size_limit: u64,
    pub(crate) stream_size_counter: u64,
    header_scan_pos: usize,
}

impl StreamBuffer {
    pub fn new(whole_stream_size_limit: u64) -> Self {
        // A virtual CRLF lets the first `--boundary` line match the same
        // `CRLF--boundary` delimiter as every later one.
        let mut buf = BytesMut::with_capacity(constants::CRLF.len());
        buf.extend_from_slice(constants::CRLF.as_bytes());

        StreamBuffer {
            buf,
            whole_stream_size_limit,
            stream_size_counter: 0,
            header_scan_pos: 0,
        }
    }

    pub fn push(&mut self, data: &[u8]) -> crate::Result<()> {
        self.stream_size_counter += data.len() as u64;

        if self.stream_size_counter > self.whole_stream_size_limit {
            return Err(crate::Error::StreamSizeExceeded {
                limit: self.whole_stream_size_limit,
            });
        }

        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Drops the first `n` bytes.
    pub fn advance(&mut self, n: usize) {
        self.buf.advance(n);
        self.header_scan_pos = 0;
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.header_scan_pos = 0;
    }

    /// Returns the length of the header block at the front of the buffer,
    /// blank line included, once it is complete.
    ///
    /// Bytes already scanned are not scanned again on the next call.
    pub fn header_block_len(&mut self) -> Option<usize> {
        if self.buf.starts_with(constants::CRLF.as_bytes()) {
            return Some(constants::CRLF.len());
        }

        let pattern = constants::CRLF_CRLF.as_bytes();
        match memmem::find(&self.buf[self.header_scan_pos..], pattern) {
            Some(idx) => Some(self.header_scan_pos + idx + pattern.len()),
            None => {
                self.header_scan_pos = self.buf.len().saturating_sub(pattern.len() - 1);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_virtual_crlf() {
        let buffer = StreamBuffer::new(u64::MAX);
        assert_eq!(buffer.as_slice(), b"\r\n");
        assert_eq!(buffer.stream_size_counter, 0);
    }

    #[test]
    fn test_push_enforces_whole_stream_limit() {
        let mut buffer = StreamBuffer::new(5);
        assert!(buffer.push(b"abc").is_ok());
        assert!(buffer.push(b"de").is_ok());
        assert_eq!(buffer.push(b"f"), Err(crate::Error::StreamSizeExceeded { limit: 5 }));
    }

    #[test]
    fn test_header_block_len_incremental() {
        let mut buffer = StreamBuffer::new(u64::MAX);
        buffer.clear();

        buffer.push(b"Content-Disposition: form-data; name=\"a\"\r").unwrap();
        assert_eq!(buffer.header_block_len(), None);
        buffer.push(b"\n\r").unwrap();
        assert_eq!(buffer.header_block_len(), None);
        buffer.push(b"\nbody").unwrap();
        assert_eq!(buffer.header_block_len(), Some(buffer.len() - 4));
    }

    #[test]
    fn test_header_block_len_empty_block() {
        let mut buffer = StreamBuffer::new(u64::MAX);
        buffer.push(b"body").unwrap();
        assert_eq!(buffer.header_block_len(), Some(2));
    }

    #[test]
    fn test_advance_resets_scan() {
        let mut buffer = StreamBuffer::new(u64::MAX);
        buffer.clear();
        buffer.push(b"abcdefgh").unwrap();
        assert_eq!(buffer.header_block_len(), None);
        buffer.advance(8);
        buffer.push(b"X: y\r\n\r\n").unwrap();
        assert_eq!(buffer.header_block_len(), Some(8));
    }
}
