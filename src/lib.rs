//! A push-style streaming parser for `multipart/form-data` request bodies.
//!
//! The body is fed to a [`StreamingParser`] chunk by chunk, in whatever
//! pieces it arrives from the network. Each part is dispatched to the
//! [`Target`]s registered for its field name as soon as its bytes are
//! available, so a body is never buffered as a whole: the parser only keeps a
//! tail no longer than the boundary delimiter, or one header block.
//!
//! # Examples
//!
//! ```
//! use streaming_form_data::{StreamingParser, TargetRegistry, ValueTarget};
//!
//! # fn run() -> streaming_form_data::Result<()> {
//! let first = ValueTarget::new();
//! let second = ValueTarget::new();
//!
//! let mut registry = TargetRegistry::new();
//! registry.register("first", first.clone());
//! registry.register("second", second.clone());
//!
//! let mut parser = StreamingParser::from_content_type("multipart/form-data; boundary=X-BOUNDARY", registry)?;
//!
//! parser.data_received(b"--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"first\"\r\n\r\nfoo\r\n--X-BOU")?;
//! parser.data_received(b"NDARY\r\nContent-Disposition: form-data; name=\"second\"\r\n\r\nbar\r\n--X-BOUNDARY--\r\n")?;
//!
//! assert_eq!(first.value(), "foo");
//! assert_eq!(second.value(), "bar");
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! # Optional features
//!
//! | Feature    | Description |
//! | ---------- | ----------- |
//! | `all`      | Enables all features. |
//! | `json`     | Enables the [`ValueTarget::json`] method. |
//! | `tokio-io` | Enables [`StreamingParser::feed_reader`] for [`tokio::io::AsyncRead`] sources. |
//! | `log`      | Emits parser events through the `log` crate. |

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(nightly, feature(doc_cfg))]

pub use bytes;

pub use constraints::Constraints;
pub use error::{BoxError, Error};
pub use parser::StreamingParser;
pub use part::Part;
pub use registry::TargetRegistry;
pub use size_limit::SizeLimit;
pub use state::State;
pub use target::{
    CallbackTarget, FileTarget, ListTarget, NullTarget, SpooledData, SpooledPart, SpooledTarget, Target, ValueTarget,
};

macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        log::trace!($($arg)+);
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        log::debug!($($arg)+);
    }};
}

mod buffer;
mod constants;
mod constraints;
mod content_disposition;
mod error;
mod helpers;
mod parser;
mod part;
mod registry;
mod search;
mod size_limit;
mod state;
mod stream;
mod target;

/// A Result type often returned from methods that can have `streaming-form-data` errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// # Examples
///
/// ```
/// # fn run() {
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(streaming_form_data::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// # }
/// # run();
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(Error::NoBoundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boundary() {
        let content_type = "multipart/form-data; boundary=ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("ABCDEFG".to_owned()));

        let content_type = "multipart/form-data; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("------ABCDEFG".to_owned()));

        let content_type = "Multipart/Form-Data; charset=utf-8; boundary=ABC";
        assert_eq!(parse_boundary(content_type), Ok("ABC".to_owned()));

        let content_type = "boundary=------ABCDEFG";
        assert!(parse_boundary(content_type).is_err());

        let content_type = "text/plain";
        assert_eq!(parse_boundary(content_type), Err(Error::NoMultipart));

        let content_type = "text/plain; boundary=------ABCDEFG";
        assert!(parse_boundary(content_type).is_err());

        let content_type = "multipart/mixed; boundary=ABCDEFG";
        assert_eq!(parse_boundary(content_type), Err(Error::NoMultipart));

        let content_type = "multipart/form-data";
        assert_eq!(parse_boundary(content_type), Err(Error::NoBoundary));
    }
}
