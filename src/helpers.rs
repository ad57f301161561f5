use crate::constants;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use httparse::Header;
use std::convert::TryFrom;

/// Parses a complete part header block, blank line included.
pub(crate) fn parse_header_block(block: &[u8]) -> crate::Result<HeaderMap> {
    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    match httparse::parse_headers(block, &mut headers) {
        Ok(httparse::Status::Complete((_, raw_headers))) => convert_raw_headers_to_header_map(raw_headers),
        Ok(httparse::Status::Partial) => Err(crate::Error::IncompleteHeaders),
        Err(err) => Err(crate::Error::ReadHeaderFailed(err)),
    }
}

pub(crate) fn convert_raw_headers_to_header_map(raw_headers: &[Header<'_>]) -> crate::Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).map_err(|err| crate::Error::DecodeHeaderName {
            name: raw_header.name.to_owned(),
            cause: err.into(),
        })?;

        let value = HeaderValue::try_from(raw_header.value).map_err(|err| crate::Error::DecodeHeaderValue {
            value: raw_header.value.to_owned(),
            cause: err.into(),
        })?;

        headers.append(name, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    #[test]
    fn test_parse_header_block() {
        let block = b"content-disposition: form-data; name=\"a\"\r\nContent-Type: text/plain\r\n\r\n";
        let headers = parse_header_block(block).unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[header::CONTENT_DISPOSITION], "form-data; name=\"a\"");
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_parse_empty_header_block() {
        assert!(parse_header_block(b"\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_header_block_errors() {
        assert!(matches!(
            parse_header_block(b"Bad Header Name: x\r\n\r\n"),
            Err(crate::Error::ReadHeaderFailed(_))
        ));

        let mut block = Vec::new();
        for i in 0..=constants::MAX_HEADERS {
            block.extend_from_slice(format!("X-{}: v\r\n", i).as_bytes());
        }
        block.extend_from_slice(b"\r\n");
        assert!(matches!(
            parse_header_block(&block),
            Err(crate::Error::ReadHeaderFailed(httparse::Error::TooManyHeaders))
        ));
    }
}
