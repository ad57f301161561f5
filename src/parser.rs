use crate::buffer::StreamBuffer;
use crate::constants;
use crate::constraints::Constraints;
use crate::error::BoxError;
use crate::helpers;
use crate::registry::TargetRegistry;
use crate::search::{Delimiter, Match};
use crate::state::{CurrentField, ParserState, State, StreamingStage};
use crate::{Part, Target};
use http::header::{self, HeaderMap};

/// A push parser for `multipart/form-data` bodies.
///
/// Feed the body with [`data_received`](StreamingParser::data_received) in
/// chunks of any size. Each part's headers are parsed as soon as they are
/// complete and its body is forwarded to the [`Target`]s registered for the
/// part's name while it streams in. Only an undecided tail of at most one
/// boundary length, or one in-progress header block, is kept in memory.
///
/// The sequence of target calls doesn't depend on how the body is split
/// into chunks, apart from how body bytes are grouped into
/// [`on_data`](Target::on_data) calls.
///
/// # Examples
///
/// ```
/// use streaming_form_data::{StreamingParser, TargetRegistry, ValueTarget};
///
/// # fn run() -> streaming_form_data::Result<()> {
/// let text = ValueTarget::new();
/// let file = ValueTarget::new();
///
/// let registry = TargetRegistry::new()
///     .with("My Field", text.clone())
///     .with("File Field", file.clone());
///
/// let mut parser = StreamingParser::from_content_type("multipart/form-data; boundary=X-BOUNDARY", registry)?;
///
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";
/// for chunk in data.as_bytes().chunks(7) {
///     parser.data_received(chunk)?;
/// }
///
/// assert!(parser.is_terminated());
/// assert_eq!(text.value(), "abcd");
/// assert_eq!(file.file_name().as_deref(), Some("a-text-file.txt"));
/// assert_eq!(file.text(), "Hello world\nHello\r\nWorld\rAgain");
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug)]
pub struct StreamingParser {
    state: ParserState,
    registry: TargetRegistry,
    constraints: Constraints,
}

impl StreamingParser {
    /// Creates a parser for bodies delimited by the raw `boundary` token.
    ///
    /// Fails with [`Error::NoBoundary`](crate::Error::NoBoundary) for an empty
    /// token and [`Error::InvalidBoundary`](crate::Error::InvalidBoundary) for
    /// one longer than 70 bytes or containing a line break.
    pub fn new<B: Into<String>>(boundary: B, registry: TargetRegistry) -> crate::Result<StreamingParser> {
        let boundary = boundary.into();
        validate_boundary(&boundary)?;

        let constraints = Constraints::default();

        let state = ParserState {
            buffer: StreamBuffer::new(constraints.size_limit.whole_stream),
            delimiter: Delimiter::new(&boundary),
            stage: StreamingStage::FindingFirstBoundary,
            next_field_idx: 0,
            curr_field: None,
        };

        Ok(StreamingParser {
            state,
            registry,
            constraints,
        })
    }

    /// Creates a parser from a `Content-Type` header value such as
    /// `multipart/form-data; boundary=X-BOUNDARY`.
    pub fn from_content_type<T>(content_type: T, registry: TargetRegistry) -> crate::Result<StreamingParser>
    where
        T: AsRef<str>,
    {
        let boundary = crate::parse_boundary(content_type)?;
        StreamingParser::new(boundary, registry)
    }

    /// Creates a parser from the `Content-Type` header of a request.
    pub fn from_headers(headers: &HeaderMap, registry: TargetRegistry) -> crate::Result<StreamingParser> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .ok_or(crate::Error::NoMultipart)?;

        StreamingParser::from_content_type(content_type, registry)
    }

    /// Applies `constraints` to the rest of the body.
    pub fn with_constraints(mut self, constraints: Constraints) -> StreamingParser {
        self.state.buffer.whole_stream_size_limit = constraints.size_limit.whole_stream;
        self.constraints = constraints;
        self
    }

    /// Registers another target for the parts named `name`.
    ///
    /// A target registered while a part with that name is being read only
    /// receives the following parts.
    pub fn register<N, T>(&mut self, name: N, target: T) -> &mut Self
    where
        N: Into<String>,
        T: Target + 'static,
    {
        self.registry.register(name, target);
        self
    }

    /// The registered targets.
    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// Consumes the parser, giving back its targets.
    pub fn into_registry(self) -> TargetRegistry {
        self.registry
    }

    /// The parser's current phase.
    pub fn state(&self) -> State {
        self.state.stage.into()
    }

    /// Whether the close delimiter has been seen.
    pub fn is_terminated(&self) -> bool {
        self.state.stage == StreamingStage::Eof
    }

    /// Number of parts whose headers have been parsed so far.
    pub fn parts_seen(&self) -> usize {
        self.state.next_field_idx
    }

    /// Feeds the next chunk of the body.
    ///
    /// Chunks may have any length, including zero. Framing errors fail the
    /// parser: the error is returned once and every later call returns
    /// [`Error::AlreadyFailed`](crate::Error::AlreadyFailed). Input after the
    /// close delimiter is the epilogue and is ignored.
    ///
    /// An error from a target is returned as
    /// [`Error::TargetFailed`](crate::Error::TargetFailed) and leaves the parser
    /// as it was before the failing callback. The chunk stays buffered, so the
    /// caller may retry with an empty chunk or give up.
    pub fn data_received(&mut self, chunk: &[u8]) -> crate::Result<()> {
        match self.state.stage {
            StreamingStage::Failed => return Err(crate::Error::AlreadyFailed),
            StreamingStage::Eof => {
                trace!("ignoring {} epilogue bytes", chunk.len());
                return Ok(());
            }
            _ => {}
        }

        if let Err(err) = self.state.buffer.push(chunk) {
            return Err(self.fail(err));
        }

        self.process()
    }

    /// Declares that the body has no more data.
    ///
    /// Succeeds if the close delimiter was seen. Otherwise the parser fails
    /// with an error describing where the body was cut off.
    pub fn end_of_stream(&mut self) -> crate::Result<()> {
        let err = match self.state.stage {
            StreamingStage::Eof => return Ok(()),
            StreamingStage::Failed => return Err(crate::Error::AlreadyFailed),
            StreamingStage::ReadingFieldHeaders => crate::Error::IncompleteHeaders,
            StreamingStage::ReadingFieldData => crate::Error::IncompleteFieldData {
                field_name: self.state.curr_field.as_ref().map(|field| field.name.clone()),
            },
            _ => crate::Error::IncompleteStream,
        };

        Err(self.fail(err))
    }

    fn process(&mut self) -> crate::Result<()> {
        loop {
            let progressed = match self.state.stage {
                StreamingStage::FindingFirstBoundary => self.find_first_boundary(),
                StreamingStage::DeterminingBoundaryType => self.determine_boundary_type(),
                StreamingStage::ReadingTransportPadding => self.read_transport_padding(),
                StreamingStage::ReadingFieldHeaders => self.read_field_headers(),
                StreamingStage::ReadingFieldData => self.read_field_data(),
                StreamingStage::Eof | StreamingStage::Failed => return Ok(()),
            };

            match progressed {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(err) if err.is_parse_error() => return Err(self.fail(err)),
                Err(err) => return Err(err),
            }
        }
    }

    fn fail(&mut self, err: crate::Error) -> crate::Error {
        debug!("multipart parsing failed after {} parts: {}", self.state.next_field_idx, err);

        self.state.stage = StreamingStage::Failed;
        self.state.curr_field = None;
        self.state.buffer.clear();
        err
    }

    // Everything before the first delimiter is preamble.
    fn find_first_boundary(&mut self) -> crate::Result<bool> {
        let buffer = &mut self.state.buffer;

        match self.state.delimiter.find(buffer.as_slice()) {
            Match::Found(idx) => {
                buffer.advance(idx + self.state.delimiter.len());
                self.state.stage = StreamingStage::DeterminingBoundaryType;
                Ok(true)
            }
            Match::PartialTail(n) => {
                let preamble = buffer.len() - n;
                buffer.advance(preamble);
                Ok(false)
            }
            Match::NotFound => {
                buffer.clear();
                Ok(false)
            }
        }
    }

    fn determine_boundary_type(&mut self) -> crate::Result<bool> {
        match self.state.buffer.as_slice() {
            [] | [b'-'] => Ok(false),
            [b'-', b'-', ..] => {
                debug!("reached the close delimiter after {} parts", self.state.next_field_idx);

                self.state.buffer.clear();
                self.state.stage = StreamingStage::Eof;
                Ok(true)
            }
            [b'-', ..] => Err(crate::Error::MalformedDelimiter),
            _ => {
                self.state.stage = StreamingStage::ReadingTransportPadding;
                Ok(true)
            }
        }
    }

    fn read_transport_padding(&mut self) -> crate::Result<bool> {
        let buffer = &mut self.state.buffer;

        let padding = buffer
            .as_slice()
            .iter()
            .take_while(|&&b| constants::is_transport_padding(b))
            .count();
        if padding > 0 {
            buffer.advance(padding);
        }

        match buffer.as_slice() {
            [] | [b'\r'] => Ok(false),
            [b'\r', b'\n', ..] => {
                buffer.advance(constants::CRLF.len());
                self.state.stage = StreamingStage::ReadingFieldHeaders;
                Ok(true)
            }
            _ => Err(crate::Error::MalformedDelimiter),
        }
    }

    fn read_field_headers(&mut self) -> crate::Result<bool> {
        let limit = self.constraints.max_header_size;

        let block_len = match self.state.buffer.header_block_len() {
            Some(len) if len > limit => return Err(crate::Error::HeaderTooLarge { limit }),
            Some(len) => len,
            None if self.state.buffer.len() > limit => return Err(crate::Error::HeaderTooLarge { limit }),
            None => return Ok(false),
        };

        let headers = helpers::parse_header_block(&self.state.buffer.as_slice()[..block_len])?;
        let part = Part::from_headers(headers, self.state.next_field_idx)?;

        let targets = self.registry.lookup(part.name());
        if targets.is_none() && self.constraints.strict {
            return Err(crate::Error::UnknownField {
                field_name: part.name().to_owned(),
            });
        }

        trace!(
            "part {} started: name={:?} file_name={:?} targets={}",
            part.index(),
            part.name(),
            part.file_name(),
            targets.is_some()
        );

        if let Some(resolved) = targets {
            for target in self.registry.targets_mut(resolved) {
                target.on_start(&part).map_err(|cause| target_failed(part.name(), cause))?;
            }
        }

        self.state.buffer.advance(block_len);
        self.state.next_field_idx += 1;
        self.state.curr_field = Some(CurrentField {
            size_limit: self.constraints.size_limit.extract_size_limit_for(part.name()),
            size_counter: 0,
            name: part.name().to_owned(),
            targets,
        });
        self.state.stage = StreamingStage::ReadingFieldData;

        Ok(true)
    }

    fn read_field_data(&mut self) -> crate::Result<bool> {
        let (data_len, done) = match self.state.delimiter.find(self.state.buffer.as_slice()) {
            Match::Found(idx) => (idx, true),
            Match::PartialTail(n) => (self.state.buffer.len() - n, false),
            Match::NotFound => (self.state.buffer.len(), false),
        };

        if data_len > 0 {
            self.deliver(data_len)?;
        }

        if !done {
            return Ok(false);
        }

        if let Some(field) = &self.state.curr_field {
            if let Some(resolved) = field.targets {
                for target in self.registry.targets_mut(resolved) {
                    target.on_finish().map_err(|cause| target_failed(&field.name, cause))?;
                }
            }
            trace!("part {:?} finished after {} bytes", field.name, field.size_counter);
        }

        self.state.buffer.advance(self.state.delimiter.len());
        self.state.curr_field = None;
        self.state.stage = StreamingStage::DeterminingBoundaryType;

        Ok(true)
    }

    /// Hands the first `n` buffered bytes to the current part's targets.
    fn deliver(&mut self, n: usize) -> crate::Result<()> {
        let ParserState { buffer, curr_field, .. } = &mut self.state;
        let data = &buffer.as_slice()[..n];

        if let Some(field) = curr_field {
            let size = field.size_counter.saturating_add(n as u64);
            if size > field.size_limit {
                return Err(crate::Error::FieldSizeExceeded {
                    limit: field.size_limit,
                    field_name: field.name.clone(),
                });
            }

            if let Some(resolved) = field.targets {
                for target in self.registry.targets_mut(resolved) {
                    target.on_data(data).map_err(|cause| target_failed(&field.name, cause))?;
                }
            }

            field.size_counter = size;
        }

        buffer.advance(n);
        Ok(())
    }
}

fn target_failed(field_name: &str, cause: BoxError) -> crate::Error {
    crate::Error::TargetFailed {
        field_name: field_name.to_owned(),
        cause,
    }
}

fn validate_boundary(boundary: &str) -> crate::Result<()> {
    if boundary.is_empty() {
        return Err(crate::Error::NoBoundary);
    }

    if boundary.len() > constants::MAX_BOUNDARY_LEN || boundary.contains(|c: char| c == '\r' || c == '\n') {
        return Err(crate::Error::InvalidBoundary(boundary.to_owned()));
    }

    Ok(())
}
