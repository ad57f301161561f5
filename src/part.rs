use crate::content_disposition::ContentDisposition;
use http::header::{self, HeaderMap};

/// Metadata of one part of a `multipart/form-data` body, handed to
/// [`Target::on_start`](crate::Target::on_start) once the part's headers are
/// parsed.
#[derive(Debug, Clone)]
pub struct Part {
    headers: HeaderMap,
    meta: PartMeta,
}

#[derive(Debug, Clone)]
struct PartMeta {
    name: String,
    file_name: Option<String>,
    content_type: Option<mime::Mime>,
    idx: usize,
}

impl Part {
    pub(crate) fn from_headers(headers: HeaderMap, idx: usize) -> crate::Result<Self> {
        let cd = ContentDisposition::parse(&headers)?;
        let content_type = Self::parse_content_type(&headers);

        Ok(Part {
            headers,
            meta: PartMeta {
                name: cd.field_name,
                file_name: cd.file_name,
                content_type,
                idx,
            },
        })
    }

    fn parse_content_type(headers: &HeaderMap) -> Option<mime::Mime> {
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<mime::Mime>().ok())
    }

    /// The field name found in the `Content-Disposition` header.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// The file name found in the `Content-Disposition` header, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.meta.file_name.as_deref()
    }

    /// Get the content type of the part, if the `Content-Type` header is
    /// present and parses as a mime type.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.meta.content_type.as_ref()
    }

    /// Get a map of headers as [`HeaderMap`].
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the index of this part in order they appeared in the body.
    pub fn index(&self) -> usize {
        self.meta.idx
    }
}
