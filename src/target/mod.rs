//! Output sinks receiving part data from the parser.

use crate::error::BoxError;
use crate::Part;
use std::fmt::{self, Debug, Formatter};

pub use file::{FileTarget, SpooledData, SpooledPart, SpooledTarget};
pub use value::{ListTarget, ValueTarget};

mod file;
mod value;

/// A consumer of part body bytes.
///
/// For every part whose name resolves to this target the parser calls
/// [`on_start`](Target::on_start) once, [`on_data`](Target::on_data) zero or
/// more times with the body bytes in order, and [`on_finish`](Target::on_finish)
/// once. The slices passed to `on_data` are only valid for the duration of the
/// call and are never empty.
///
/// An error returned from any callback is reported to the caller of
/// [`data_received`](crate::StreamingParser::data_received) as
/// [`Error::TargetFailed`](crate::Error::TargetFailed). The parser itself is
/// left as it was before the failing call.
pub trait Target: Send {
    /// Called when the headers of a part for this target were parsed.
    fn on_start(&mut self, part: &Part) -> Result<(), BoxError> {
        let _ = part;
        Ok(())
    }

    /// Called with the next chunk of the part's body.
    fn on_data(&mut self, chunk: &[u8]) -> Result<(), BoxError>;

    /// Called after the last byte of the part's body.
    fn on_finish(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T: Target + ?Sized> Target for Box<T> {
    fn on_start(&mut self, part: &Part) -> Result<(), BoxError> {
        (**self).on_start(part)
    }

    fn on_data(&mut self, chunk: &[u8]) -> Result<(), BoxError> {
        (**self).on_data(chunk)
    }

    fn on_finish(&mut self) -> Result<(), BoxError> {
        (**self).on_finish()
    }
}

/// Discards part data, only counting the bytes.
#[derive(Debug, Default, Clone)]
pub struct NullTarget {
    received: u64,
}

impl NullTarget {
    /// Creates a new `NullTarget`.
    pub fn new() -> NullTarget {
        NullTarget::default()
    }

    /// Total number of bytes discarded so far.
    pub fn bytes_received(&self) -> u64 {
        self.received
    }
}

impl Target for NullTarget {
    fn on_data(&mut self, chunk: &[u8]) -> Result<(), BoxError> {
        self.received += chunk.len() as u64;
        Ok(())
    }
}

/// Forwards every chunk of part data to a closure.
///
/// # Examples
///
/// ```
/// use streaming_form_data::{CallbackTarget, StreamingParser, TargetRegistry};
///
/// # fn run() -> streaming_form_data::Result<()> {
/// let mut registry = TargetRegistry::new();
/// registry.register(
///     "upload",
///     CallbackTarget::new(|chunk: &[u8]| {
///         println!("received {} bytes", chunk.len());
///         Ok(())
///     }),
/// );
///
/// let mut parser = StreamingParser::new("X-BOUNDARY", registry)?;
/// parser.data_received(b"--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"upload\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n")?;
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct CallbackTarget<F> {
    callback: F,
}

impl<F> CallbackTarget<F>
where
    F: FnMut(&[u8]) -> Result<(), BoxError> + Send,
{
    /// Creates a target calling `callback` with each chunk.
    pub fn new(callback: F) -> CallbackTarget<F> {
        CallbackTarget { callback }
    }
}

impl<F> Debug for CallbackTarget<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTarget").finish()
    }
}

impl<F> Target for CallbackTarget<F>
where
    F: FnMut(&[u8]) -> Result<(), BoxError> + Send,
{
    fn on_data(&mut self, chunk: &[u8]) -> Result<(), BoxError> {
        (self.callback)(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_target_counts() {
        let mut target = NullTarget::new();
        target.on_data(b"abc").unwrap();
        target.on_data(b"de").unwrap();
        assert_eq!(target.bytes_received(), 5);
    }

    #[test]
    fn test_callback_target() {
        let mut seen = Vec::new();
        {
            let mut target = CallbackTarget::new(|chunk: &[u8]| {
                seen.extend_from_slice(chunk);
                Ok(())
            });
            target.on_data(b"hello ").unwrap();
            target.on_data(b"world").unwrap();
            target.on_finish().unwrap();
        }
        assert_eq!(seen, b"hello world");
    }

    #[test]
    fn test_callback_target_error() {
        let mut target = CallbackTarget::new(|_: &[u8]| Err("boom".into()));
        assert_eq!(target.on_data(b"x").unwrap_err().to_string(), "boom");
    }
}
