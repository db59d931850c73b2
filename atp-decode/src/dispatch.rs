//! Top-level frame walker: parses each packet's header, routes its
//! body to the appropriate sub-decoder, and advances to the next
//! frame. See the specification's RU dispatcher component.

use std::collections::VecDeque;

use crate::btm::{fragment_index_for_packet_type, Reassembler};
use crate::error::DecodeError;
use crate::header::Header;
use crate::mmi::{
    decode_mmi_driver_message, decode_mmi_dynamic, decode_mmi_failure_report_atp,
    decode_mmi_status, MmiDynamicSource,
};
use crate::record::{passthrough_family, Record};

/// One item of the decoded stream: a successfully decoded record, or a
/// structured, recoverable-by-default error. Errors are first-class
/// values, not exceptions.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    Record(Record),
    Error(DecodeError),
}

/// Configuration for a decode session.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Maximum number of single-byte resync attempts a session may
    /// perform before aborting with [`DecodeError::ResyncBudgetExceeded`].
    pub resync_budget: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { resync_budget: 100 }
    }
}

/// Per-session counters, surfaced for the CLI's post-decode summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub frames_decoded: usize,
    pub truncated: usize,
    pub invalid_calendar_field: usize,
    pub body_too_short: usize,
    pub fragment_index_mismatch: usize,
    pub partial_telegram_evicted: usize,
    pub unknown_packet_type: usize,
    pub resync_budget_exceeded: usize,
    pub resyncs_performed: usize,
    pub telegrams_reassembled: usize,
    pub duplicate_fragments: usize,
}

impl Stats {
    fn record_error(&mut self, err: &DecodeError) {
        match err {
            DecodeError::Truncated { .. } => self.truncated += 1,
            DecodeError::InvalidCalendarField { .. } => self.invalid_calendar_field += 1,
            DecodeError::BodyTooShort { .. } => self.body_too_short += 1,
            DecodeError::FragmentIndexMismatch { .. } => self.fragment_index_mismatch += 1,
            DecodeError::PartialTelegramEvicted { .. } => {
                self.partial_telegram_evicted += 1
            }
            DecodeError::UnknownPacketType { .. } => self.unknown_packet_type += 1,
            DecodeError::ResyncBudgetExceeded { .. } => self.resync_budget_exceeded += 1,
        }
    }
}

/// Walks a byte slice frame by frame, yielding [`DecodeEvent`]s.
pub struct Decoder<'a> {
    bytes: &'a [u8],
    offset: usize,
    options: DecodeOptions,
    reassembler: Reassembler,
    pending: VecDeque<DecodeEvent>,
    stats: Stats,
    done: bool,
}

/// Starts a decode session over `bytes` with default options.
pub fn decode_all(bytes: &[u8]) -> Decoder<'_> {
    Decoder::new(bytes, DecodeOptions::default())
}

/// Starts a decode session over `bytes` with explicit options.
pub fn decode_all_with_options(bytes: &[u8], options: DecodeOptions) -> Decoder<'_> {
    Decoder::new(bytes, options)
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8], options: DecodeOptions) -> Self {
        Decoder {
            bytes,
            offset: 0,
            options,
            reassembler: Reassembler::new(),
            pending: VecDeque::new(),
            stats: Stats::default(),
            done: false,
        }
    }

    /// Session counters accumulated so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    fn emit_error(&mut self, err: DecodeError) {
        log::warn!("{err}");
        self.stats.record_error(&err);
        self.pending.push_back(DecodeEvent::Error(err));
    }

    /// Processes exactly one frame at the current offset, queueing
    /// whatever events it produces. Returns `false` when the stream is
    /// finished (clean EOF or a terminal stream-level error already
    /// queued).
    fn step(&mut self) -> bool {
        if self.offset >= self.bytes.len() {
            return false;
        }

        match Header::parse_frame(&self.bytes[self.offset..]) {
            Ok((header, body, consumed)) => {
                self.stats.frames_decoded += 1;
                self.dispatch(header, body);
                self.offset += consumed;
                true
            }
            Err(DecodeError::Truncated { offset, need }) => {
                self.emit_error(DecodeError::Truncated {
                    offset: self.offset + offset,
                    need,
                });
                self.done = true;
                false
            }
            Err(DecodeError::InvalidCalendarField { which, value }) => {
                self.emit_error(DecodeError::InvalidCalendarField { which, value });
                self.resync()
            }
            Err(other) => unreachable!("header parsing only yields Truncated or InvalidCalendarField: {other:?}"),
        }
    }

    /// Advances one byte at a time, retrying header parsing, until it
    /// succeeds, the stream ends, or the resync budget is exhausted.
    fn resync(&mut self) -> bool {
        let start = self.offset;
        log::debug!("resyncing from offset {start}");
        loop {
            self.offset += 1;

            if self.offset >= self.bytes.len() {
                return false;
            }

            match Header::parse_frame(&self.bytes[self.offset..]) {
                Ok((header, body, consumed)) => {
                    log::debug!(
                        "resync recovered at offset {} after skipping {} byte(s)",
                        self.offset,
                        self.offset - start
                    );
                    self.stats.frames_decoded += 1;
                    self.dispatch(header, body);
                    self.offset += consumed;
                    return true;
                }
                Err(DecodeError::Truncated { offset, need }) => {
                    self.emit_error(DecodeError::Truncated {
                        offset: self.offset + offset,
                        need,
                    });
                    self.done = true;
                    return false;
                }
                Err(DecodeError::InvalidCalendarField { .. }) => {
                    self.stats.resyncs_performed += 1;
                    if self.stats.resyncs_performed > self.options.resync_budget {
                        self.emit_error(DecodeError::ResyncBudgetExceeded {
                            skipped: self.stats.resyncs_performed,
                        });
                        self.done = true;
                        return false;
                    }
                    continue;
                }
                Err(other) => unreachable!(
                    "header parsing only yields Truncated or InvalidCalendarField: {other:?}"
                ),
            }
        }
    }

    fn dispatch(&mut self, header: Header, body: &[u8]) {
        let packet_type = header.packet_type;

        if fragment_index_for_packet_type(packet_type).is_some() {
            match self.reassembler.ingest(packet_type, header.timestamp, body) {
                Ok(outcome) => {
                    self.stats.duplicate_fragments = self.reassembler.duplicate_fragments;
                    if let Some(notice) = outcome.notice {
                        self.emit_error(notice);
                    }
                    if let Some(telegram) = outcome.telegram {
                        self.stats.telegrams_reassembled += 1;
                        log::debug!(
                            "reassembled BTM telegram sequence {} at offset {}",
                            telegram.sequence,
                            self.offset
                        );
                        self.pending.push_back(DecodeEvent::Record(Record::BtmTelegram {
                            header,
                            telegram,
                        }));
                    }
                }
                Err(err) => self.emit_error(err),
            }
            return;
        }

        match packet_type {
            1 => self.dispatch_mmi_dynamic(header, body, MmiDynamicSource::Mmi),
            4 => self.dispatch_mmi_dynamic(header, body, MmiDynamicSource::AtpSnapshot),
            2 => match decode_mmi_status(body) {
                Ok(data) => self.push_record(Record::MmiStatus { header, data }),
                Err(err) => self.emit_error(err),
            },
            8 => match decode_mmi_driver_message(body) {
                Ok(data) => self.push_record(Record::MmiDriverMessage { header, data }),
                Err(err) => self.emit_error(err),
            },
            9 => match decode_mmi_failure_report_atp(body) {
                Ok(data) => self.push_record(Record::MmiFailureReportAtp { header, data }),
                Err(err) => self.emit_error(err),
            },
            other => {
                if let Some(family) = passthrough_family(other) {
                    self.push_record(Record::Passthrough {
                        header,
                        family,
                        body: body.to_vec(),
                    });
                } else {
                    self.emit_error(DecodeError::UnknownPacketType {
                        packet_type: other,
                        offset: self.offset,
                    });
                    self.push_record(Record::Unknown {
                        header,
                        body: body.to_vec(),
                    });
                }
            }
        }
    }

    fn dispatch_mmi_dynamic(&mut self, header: Header, body: &[u8], source: MmiDynamicSource) {
        match decode_mmi_dynamic(body, source) {
            Ok(data) => self.push_record(Record::MmiDynamic { header, data }),
            Err(err) => self.emit_error(err),
        }
    }

    fn push_record(&mut self, record: Record) {
        self.pending.push_back(DecodeEvent::Record(record));
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = DecodeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.done {
                return None;
            }
            if !self.step() {
                // step() queues its own terminal error, if any, before
                // returning false; drain it on the next loop iteration.
                if self.pending.is_empty() {
                    return None;
                }
            }
        }
    }
}

/// Decodes `bytes` to completion and returns the owned event list, a
/// convenience for callers that do not need streaming.
pub fn decode_to_vec(bytes: &[u8]) -> (Vec<DecodeEvent>, Stats) {
    decode_to_vec_with_options(bytes, DecodeOptions::default())
}

pub fn decode_to_vec_with_options(
    bytes: &[u8],
    options: DecodeOptions,
) -> (Vec<DecodeEvent>, Stats) {
    let mut decoder = Decoder::new(bytes, options);
    let events: Vec<DecodeEvent> = (&mut decoder).collect();
    let stats = *decoder.stats();
    (events, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_LEN as HLEN;

    fn header_bytes(packet_type: u8, body: &[u8]) -> Vec<u8> {
        let mut b = vec![packet_type, 0x17, 0x01, 0x01, 0x00, 0x00, 0x00];
        b.extend_from_slice(&0u32.to_be_bytes()); // location
        b.extend_from_slice(&0u16.to_be_bytes()); // reserved
        b.extend_from_slice(&0u16.to_be_bytes()); // speed
        assert_eq!(b.len(), HLEN);
        b.push(body.len() as u8);
        b.extend_from_slice(body);
        b
    }

    #[test]
    fn decodes_passthrough_packet() {
        let frame = header_bytes(21, &[0xAA, 0xBB]);
        let (events, stats) = decode_to_vec(&frame);
        assert_eq!(stats.frames_decoded, 1);
        match &events[0] {
            DecodeEvent::Record(Record::Passthrough { family, body, .. }) => {
                assert_eq!(*family, "VDX_DIGITAL");
                assert_eq!(body, &[0xAA, 0xBB]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_packet_type_reports_and_passes_through() {
        let frame = header_bytes(250, &[0x01]);
        let (events, stats) = decode_to_vec(&frame);
        assert_eq!(stats.unknown_packet_type, 1);
        assert!(matches!(events[0], DecodeEvent::Error(DecodeError::UnknownPacketType { .. })));
        assert!(matches!(events[1], DecodeEvent::Record(Record::Unknown { .. })));
    }

    #[test]
    fn resync_recovers_from_invalid_calendar() {
        // A run of 0xFF bytes precedes a well-formed frame. The calendar
        // year byte of the good frame is itself 0xFF (unchecked field),
        // so every misaligned header interpretation straddling the
        // boundary still contains an out-of-range field and is
        // correctly rejected before the resync loop lands on the real
        // frame.
        let mut stream = vec![0xFFu8; 14];
        let mut good = vec![2u8, 0xFF, 1, 1, 0, 0, 0]; // type, yy, mm, dd, hh, mi, ss
        good.extend_from_slice(&0u32.to_be_bytes()); // location
        good.extend_from_slice(&0u16.to_be_bytes()); // reserved
        good.extend_from_slice(&0u16.to_be_bytes()); // speed
        assert_eq!(good.len(), HLEN);
        let body = [1u8, 2, 3, 4, 5, 6, 7, 8];
        good.push(body.len() as u8);
        good.extend_from_slice(&body);
        stream.extend(good);

        let (events, stats) = decode_to_vec(&stream);
        assert!(stats.invalid_calendar_field >= 1);
        assert!(events.iter().any(|e| matches!(
            e,
            DecodeEvent::Record(Record::MmiStatus { .. })
        )));
    }

    #[test]
    fn resync_budget_exceeded_aborts_stream() {
        let mut stream = vec![0u8; 200];
        for (i, b) in stream.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        // Force every byte 2 (month field) out of range by zeroing it
        // periodically; with a near-zero budget this must abort quickly.
        let options = DecodeOptions { resync_budget: 2 };
        let (events, stats) = decode_to_vec_with_options(&stream, options);
        assert!(stats.resync_budget_exceeded <= 1);
        if stats.resync_budget_exceeded == 1 {
            assert!(events
                .iter()
                .any(|e| matches!(e, DecodeEvent::Error(DecodeError::ResyncBudgetExceeded { .. }))));
        }
    }
}
