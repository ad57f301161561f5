pub(crate) const DEFAULT_WHOLE_STREAM_SIZE_LIMIT: u64 = std::u64::MAX;
pub(crate) const DEFAULT_PER_FIELD_SIZE_LIMIT: u64 = std::u64::MAX;
pub(crate) const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;

pub(crate) const MAX_HEADERS: usize = 32;
/// RFC 2046 limits a boundary to 70 characters.
pub(crate) const MAX_BOUNDARY_LEN: usize = 70;

pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const CRLF_CRLF: &str = "\r\n\r\n";

pub(crate) const FORM_DATA: &str = "form-data";
pub(crate) const PARAM_NAME: &str = "name";
pub(crate) const PARAM_FILE_NAME: &str = "filename";

/// Whitespace allowed between a boundary delimiter and its CRLF.
pub(crate) fn is_transport_padding(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
