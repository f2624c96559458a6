//! Folds classified lines into finished boxes.
//!
//! The aggregator owns the box currently being assembled. A header closes the
//! previous box (handing it back to the caller) and opens the next one; the
//! end of input closes the last one. A malformed header throws the current
//! box away, because none of its lines can be trusted any more.

use boxer_core::{BoxId, FormatError};

use crate::box_record::BoxRecord;
use crate::parser::{BoxHeader, ContentLine, ParsedLine, parse_line};

/// Where the aggregator stands between two lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AggregatorState {
    #[default]
    NoCurrentBox,
    AccumulatingBox(BoxRecord),
}

/// Why a line contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// A content line arrived before any header.
    OrphanContent,
    /// The line had a marker but could not be used (bad shape or quantity).
    Invalid(FormatError),
}

/// Outcome of feeding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Line is not part of the format; nothing changed.
    Skipped,
    /// A header opened the first box.
    Started(BoxId),
    /// A header closed this box and opened the next one.
    Emitted(BoxRecord),
    /// A content line was added to the current box.
    Appended,
    /// A content line was dropped; the current box is untouched.
    Dropped(DropReason),
}

/// A recoverable fault: the current box was thrown away.
///
/// The aggregator is already back in [`AggregatorState::NoCurrentBox`] when
/// this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{cause}; box in progress discarded")]
pub struct Discard {
    pub cause: FormatError,
    /// The box that was in progress, kept only for diagnostics.
    pub discarded: Option<BoxRecord>,
}

/// Per-file box assembly state machine.
#[derive(Debug, Default)]
pub struct BoxAggregator {
    state: AggregatorState,
}

impl BoxAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AggregatorState {
        &self.state
    }

    /// Identifier of the box in progress, if any.
    pub fn current_box_id(&self) -> Option<&BoxId> {
        match &self.state {
            AggregatorState::AccumulatingBox(record) => Some(record.id_typed()),
            AggregatorState::NoCurrentBox => None,
        }
    }

    /// Classify and feed one raw text line.
    pub fn accept_line(&mut self, line: &str) -> Result<Step, Discard> {
        self.accept(parse_line(line))
    }

    /// Feed one classified line.
    pub fn accept(&mut self, line: ParsedLine) -> Result<Step, Discard> {
        match line {
            ParsedLine::BoxHeader(header) => Ok(self.open(header)),
            ParsedLine::ContentLine(content) => Ok(self.append(content)),
            ParsedLine::Unrecognized => Ok(Step::Skipped),
            ParsedLine::Malformed(cause) if cause.discards_box() => Err(Discard {
                cause,
                discarded: self.reset(),
            }),
            ParsedLine::Malformed(cause) => Ok(Step::Dropped(DropReason::Invalid(cause))),
        }
    }

    /// Drop the box in progress (if any) and return it.
    pub fn reset(&mut self) -> Option<BoxRecord> {
        match std::mem::take(&mut self.state) {
            AggregatorState::AccumulatingBox(record) => Some(record),
            AggregatorState::NoCurrentBox => None,
        }
    }

    /// End of input: hand back the last box, if one is open.
    pub fn finish(mut self) -> Option<BoxRecord> {
        self.reset()
    }

    fn open(&mut self, header: BoxHeader) -> Step {
        let next = BoxRecord::open(header.id.clone(), header.supplier_id);
        match std::mem::replace(&mut self.state, AggregatorState::AccumulatingBox(next)) {
            AggregatorState::AccumulatingBox(closed) => Step::Emitted(closed),
            AggregatorState::NoCurrentBox => Step::Started(header.id),
        }
    }

    fn append(&mut self, line: ContentLine) -> Step {
        let AggregatorState::AccumulatingBox(record) = &mut self.state else {
            return Step::Dropped(DropReason::OrphanContent);
        };

        match line.into_content() {
            Ok(content) => {
                record.push(content);
                Step::Appended
            }
            Err(err) => Step::Dropped(DropReason::Invalid(err)),
        }
    }
}
