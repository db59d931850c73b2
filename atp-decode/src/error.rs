//! Structured errors produced by the decoder. Errors are first-class
//! values yielded alongside records, never exceptions: see
//! [`crate::dispatch::DecodeEvent`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A calendar field that failed range validation while parsing a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CalendarField {
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl std::fmt::Display for CalendarField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CalendarField::Month => "month",
            CalendarField::Day => "day",
            CalendarField::Hour => "hour",
            CalendarField::Minute => "minute",
            CalendarField::Second => "second",
        };
        f.write_str(name)
    }
}

/// All error kinds the decoder can report. See the error taxonomy table
/// in the specification for scope and recovery semantics per kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DecodeError {
    /// Fewer bytes remained than the read required.
    #[error("truncated at offset {offset}: need {need} more byte(s)")]
    Truncated { offset: usize, need: usize },

    /// A calendar field in a header was out of range.
    #[error("invalid calendar field {which}: {value}")]
    InvalidCalendarField { which: CalendarField, value: u8 },

    /// A packet's body was shorter than its decoder requires.
    #[error("body too short: expected at least {expected} byte(s), got {got}")]
    BodyTooShort { expected: usize, got: usize },

    /// A BTM fragment's self-reported index did not match the index
    /// implied by its packet type.
    #[error("fragment index mismatch: expected {expected}, got {actual}")]
    FragmentIndexMismatch { expected: u8, actual: u8 },

    /// A partially-assembled telegram was evicted to make room for a
    /// new sequence because all reassembler slots were occupied.
    #[error("partial telegram for sequence {sequence} evicted with {fragments_present} fragment(s) present")]
    PartialTelegramEvicted {
        sequence: u16,
        fragments_present: u8,
    },

    /// A packet type the dispatcher does not recognise.
    #[error("unknown packet type {packet_type} at offset {offset}")]
    UnknownPacketType { packet_type: u8, offset: usize },

    /// The dispatcher's resync budget was exhausted; the stream aborts.
    #[error("resync budget exceeded after skipping {skipped} byte(s)")]
    ResyncBudgetExceeded { skipped: usize },
}
