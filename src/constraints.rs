use crate::constants;
use crate::size_limit::SizeLimit;

/// Represents constraints applied while parsing a `multipart/form-data` body.
///
/// # Examples
///
/// ```
/// use streaming_form_data::{Constraints, SizeLimit, StreamingParser, TargetRegistry};
///
/// # fn run() -> streaming_form_data::Result<()> {
/// let constraints = Constraints::new()
///     .max_header_size(1024)
///     .strict(true)
///     .size_limit(SizeLimit::new().whole_stream(15 * 1024 * 1024).for_field("bio", 4 * 1024));
///
/// let parser = StreamingParser::new("X-BOUNDARY", TargetRegistry::new())?.with_constraints(constraints);
/// # drop(parser);
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
    pub(crate) max_header_size: usize,
    pub(crate) strict: bool,
}

impl Constraints {
    /// Creates a set of rules with default behaviour: 8 KiB header blocks,
    /// unregistered parts silently discarded, no size limits.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies size limits on the stream and its fields.
    pub fn size_limit(mut self, size_limit: SizeLimit) -> Constraints {
        self.size_limit = size_limit;
        self
    }

    /// Sets the maximum size of one part's header block, blank line included.
    pub fn max_header_size(mut self, limit: usize) -> Constraints {
        self.max_header_size = limit;
        self
    }

    /// When enabled, a part whose name has no registered target fails the
    /// parse with [`Error::UnknownField`](crate::Error::UnknownField) instead
    /// of being discarded.
    pub fn strict(mut self, strict: bool) -> Constraints {
        self.strict = strict;
        self
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            size_limit: SizeLimit::default(),
            max_header_size: constants::DEFAULT_MAX_HEADER_SIZE,
            strict: false,
        }
    }
}
