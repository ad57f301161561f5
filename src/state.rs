use crate::buffer::StreamBuffer;
use crate::registry::Resolved;
use crate::search::Delimiter;

#[derive(Debug)]
pub(crate) struct ParserState {
    pub(crate) buffer: StreamBuffer,
    pub(crate) delimiter: Delimiter,
    pub(crate) stage: StreamingStage,
    pub(crate) next_field_idx: usize,
    pub(crate) curr_field: Option<CurrentField>,
}

/// The part whose body is being read.
#[derive(Debug)]
pub(crate) struct CurrentField {
    pub(crate) name: String,
    pub(crate) targets: Option<Resolved>,
    pub(crate) size_limit: u64,
    pub(crate) size_counter: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamingStage {
    FindingFirstBoundary,
    DeterminingBoundaryType,
    ReadingTransportPadding,
    ReadingFieldHeaders,
    ReadingFieldData,
    Eof,
    Failed,
}

/// The phase of a [`StreamingParser`](crate::StreamingParser) within the
/// `multipart/form-data` grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Skipping bytes before the first boundary.
    ExpectingPreamble,
    /// A boundary was matched; waiting for the `--` of the close delimiter or
    /// the CRLF ending the boundary line.
    ExpectingBoundary,
    /// Accumulating a part's header block.
    ReadingHeaders,
    /// Delivering a part's body to its targets.
    ReadingBody,
    /// The close delimiter was seen; further input is ignored.
    Terminated,
    /// A parse error occurred; further input is rejected.
    Failed,
}

impl From<StreamingStage> for State {
    fn from(stage: StreamingStage) -> State {
        match stage {
            StreamingStage::FindingFirstBoundary => State::ExpectingPreamble,
            StreamingStage::DeterminingBoundaryType | StreamingStage::ReadingTransportPadding => {
                State::ExpectingBoundary
            }
            StreamingStage::ReadingFieldHeaders => State::ReadingHeaders,
            StreamingStage::ReadingFieldData => State::ReadingBody,
            StreamingStage::Eof => State::Terminated,
            StreamingStage::Failed => State::Failed,
        }
    }
}
