use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;

/// A boxed error, as returned by [`Target`](crate::Target) callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while setting up a parser, feeding it a
/// `multipart/form-data` body, or delivering part data to targets.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// An unregistered field is detected while the parser runs in
    /// [`strict`](crate::Constraints::strict) mode.
    #[display(fmt = "unknown field received: {}", field_name)]
    UnknownField { field_name: String },

    /// The stream ended in the middle of a field's data.
    #[display(
        fmt = "field '{}' received with incomplete data",
        "field_name.as_deref().unwrap_or(\"<unknown>\")"
    )]
    IncompleteFieldData { field_name: Option<String> },

    /// Couldn't read the field headers completely.
    #[display(fmt = "failed to read field complete headers")]
    IncompleteHeaders,

    /// Failed to read headers.
    #[display(fmt = "failed to read headers: {}", _0)]
    ReadHeaderFailed(httparse::Error),

    /// Failed to decode the field's raw header name to
    /// [`HeaderName`](http::header::HeaderName) type.
    #[display(fmt = "failed to decode field's raw header name: {:?} {}", name, cause)]
    DecodeHeaderName { name: String, cause: BoxError },

    /// Failed to decode the field's raw header value to
    /// [`HeaderValue`](http::header::HeaderValue) type.
    #[display(fmt = "failed to decode field's raw header value: {}", cause)]
    DecodeHeaderValue { value: Vec<u8>, cause: BoxError },

    /// The part headers violate the `multipart/form-data` grammar, e.g. a
    /// missing `Content-Disposition` header or `name` parameter.
    #[display(fmt = "malformed part headers: {}", reason)]
    MalformedHeader { reason: String },

    /// The header block of a part exceeded the configured maximum size.
    #[display(fmt = "part header block exceeded the maximum size limit: {} bytes", limit)]
    HeaderTooLarge { limit: usize },

    /// A boundary delimiter was followed by something other than `--`,
    /// transport padding or CRLF.
    #[display(fmt = "malformed boundary delimiter line")]
    MalformedDelimiter,

    /// Multipart stream is incomplete.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,

    /// The incoming field size exceeded the maximum limit.
    #[display(fmt = "field '{}' exceeded the maximum size limit: {} bytes", field_name, limit)]
    FieldSizeExceeded { limit: u64, field_name: String },

    /// The incoming stream size exceeded the maximum limit.
    #[display(fmt = "stream size exceeded the maximum limit: {} bytes", limit)]
    StreamSizeExceeded { limit: u64 },

    /// The parser previously failed and can't accept more data.
    #[display(fmt = "parser already failed, no more data is accepted")]
    AlreadyFailed,

    /// A target returned an error from one of its callbacks.
    #[display(fmt = "target for field '{}' failed: {}", field_name, cause)]
    TargetFailed { field_name: String, cause: BoxError },

    /// Stream read failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(BoxError),

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// The boundary token is too long or contains line breaks.
    #[display(fmt = "invalid multipart boundary: {:?}", _0)]
    InvalidBoundary(String),

    /// Failed to decode the value data as `JSON` in
    /// [`ValueTarget::json`](crate::ValueTarget::json) method.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    #[display(fmt = "failed to decode field data as JSON: {}", _0)]
    DecodeJson(serde_json::Error),
}

impl Error {
    /// Returns `true` if the error is a violation of the multipart framing
    /// detected by the parser, after which the parser is unusable.
    pub fn is_parse_error(&self) -> bool {
        !matches!(
            self,
            Error::TargetFailed { .. }
                | Error::StreamReadFailed(_)
                | Error::AlreadyFailed
                | Error::NoMultipart
                | Error::DecodeContentType(_)
                | Error::NoBoundary
                | Error::InvalidBoundary(_)
        )
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
