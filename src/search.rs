use crate::constants;
use memchr::memmem::Finder;

/// Outcome of scanning a buffer for the boundary delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Match {
    /// The delimiter starts at this offset.
    Found(usize),
    /// The last `n` bytes are a proper prefix of the delimiter and must be
    /// kept until more data arrives.
    PartialTail(usize),
    NotFound,
}

/// The `CRLF -- boundary` sequence that precedes every part and the closing
/// `--`.
#[derive(Debug, Clone)]
pub(crate) struct Delimiter {
    finder: Finder<'static>,
}

impl Delimiter {
    pub(crate) fn new(boundary: &str) -> Delimiter {
        let needle = format!("{}{}{}", constants::CRLF, constants::BOUNDARY_EXT, boundary);
        Delimiter {
            finder: Finder::new(needle.as_bytes()).into_owned(),
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.finder.needle()
    }

    pub(crate) fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Finds the earliest delimiter in `haystack`, or else the longest
    /// suffix of `haystack` the delimiter could still begin with.
    pub(crate) fn find(&self, haystack: &[u8]) -> Match {
        if let Some(idx) = self.finder.find(haystack) {
            return Match::Found(idx);
        }

        match self.partial_tail_len(haystack) {
            0 => Match::NotFound,
            n => Match::PartialTail(n),
        }
    }

    fn partial_tail_len(&self, haystack: &[u8]) -> usize {
        let needle = self.as_bytes();
        // No full match, so a candidate suffix is at most `needle.len() - 1`.
        let window_start = haystack.len().saturating_sub(needle.len() - 1);
        let window = &haystack[window_start..];

        memchr::memchr_iter(needle[0], window)
            .map(|pos| &window[pos..])
            .find(|tail| needle.starts_with(tail))
            .map_or(0, |tail| tail.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found() {
        let d = Delimiter::new("X-BOUNDARY");
        assert_eq!(d.as_bytes(), b"\r\n--X-BOUNDARY");
        assert_eq!(d.find(b"abc\r\n--X-BOUNDARY\r\n"), Match::Found(3));
        assert_eq!(d.find(b"\r\n--X-BOUNDARY"), Match::Found(0));
        assert_eq!(d.find(b"\r\n--X-B\r\n--X-BOUNDARY--"), Match::Found(7));
    }

    #[test]
    fn test_partial_tail() {
        let d = Delimiter::new("X-BOUNDARY");
        assert_eq!(d.find(b"hello\r"), Match::PartialTail(1));
        assert_eq!(d.find(b"hello\r\n"), Match::PartialTail(2));
        assert_eq!(d.find(b"hello\r\n--X-BOUNDAR"), Match::PartialTail(13));
        assert_eq!(d.find(b"\r\n--X"), Match::PartialTail(5));
        // The earliest candidate wins, which is the longest tail.
        assert_eq!(d.find(b"ab\r\n--\r"), Match::PartialTail(1));
        assert_eq!(d.find(b"\r\r\n-"), Match::PartialTail(3));
    }

    #[test]
    fn test_not_found() {
        let d = Delimiter::new("X-BOUNDARY");
        assert_eq!(d.find(b""), Match::NotFound);
        assert_eq!(d.find(b"hello world"), Match::NotFound);
        assert_eq!(d.find(b"\r\n--X-BOUNDARZ"), Match::NotFound);
        assert_eq!(d.find(b"--X-BOUNDARY"), Match::NotFound);
    }

    #[test]
    fn test_partial_tail_is_bounded_by_delimiter_len() {
        let d = Delimiter::new("ab");
        let mut haystack = vec![b'x'; 1000];
        haystack.extend_from_slice(b"\r\n-");
        assert_eq!(d.find(&haystack), Match::PartialTail(3));
    }
}
