//! Reassembles BTM balise telegrams from their five wire fragments.
//!
//! Fragments may arrive in any order and fragments belonging to up to
//! ten distinct telegram sequences may be interleaved; this module
//! tracks the per-sequence state machine described in the
//! specification (`Empty -> Partial -> Complete -> Empty`) in a
//! fixed-size slot array, with no heap growth beyond what each slot's
//! payload bytes need.

use chrono::NaiveDateTime;

use crate::bytes::{read_u16, read_u8};
use crate::error::DecodeError;

/// Number of concurrent in-progress telegram sequences the reassembler
/// tracks.
pub const SLOT_COUNT: usize = 10;

/// Total size of a reassembled telegram.
pub const TELEGRAM_LEN: usize = 104;

const PAYLOAD_LENS: [usize; 5] = [4, 25, 25, 25, 25];

/// Maps a BTM fragment packet type (43-47) to its 1-based fragment
/// index, or `None` if `packet_type` is not a BTM fragment type.
pub fn fragment_index_for_packet_type(packet_type: u8) -> Option<u8> {
    match packet_type {
        43..=47 => Some(packet_type - 43 + 1),
        _ => None,
    }
}

/// A completed, reassembled balise telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Telegram {
    pub sequence: u16,
    pub data: Vec<u8>,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone)]
struct Slot {
    sequence: u16,
    fragments: [Option<Vec<u8>>; 5],
    earliest_ts: NaiveDateTime,
}

impl Slot {
    fn new(sequence: u16, index: u8, payload: Vec<u8>, ts: NaiveDateTime) -> Self {
        let mut fragments: [Option<Vec<u8>>; 5] = Default::default();
        fragments[index as usize - 1] = Some(payload);
        Slot {
            sequence,
            fragments,
            earliest_ts: ts,
        }
    }

    fn is_complete(&self) -> bool {
        self.fragments.iter().all(Option::is_some)
    }

    fn fragments_present(&self) -> u8 {
        self.fragments.iter().filter(|f| f.is_some()).count() as u8
    }

    fn concat(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TELEGRAM_LEN);
        for frag in &self.fragments {
            out.extend_from_slice(frag.as_ref().expect("slot reported complete"));
        }
        out
    }
}

/// Result of feeding one fragment to the reassembler.
#[derive(Debug, Default)]
pub struct BtmIngest {
    /// Set when this fragment completed its telegram.
    pub telegram: Option<Telegram>,
    /// Set when this fragment caused a recoverable, reportable event
    /// ([`DecodeError::FragmentIndexMismatch`] or
    /// [`DecodeError::PartialTelegramEvicted`]). Decoding continues
    /// regardless.
    pub notice: Option<DecodeError>,
}

/// A bounded pool of [`SLOT_COUNT`] in-progress telegram sequences.
#[derive(Default)]
pub struct Reassembler {
    slots: [Option<Slot>; SLOT_COUNT],
    pub evicted_incomplete: usize,
    pub duplicate_fragments: usize,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one fragment body (header already stripped) for the given
    /// BTM packet type (43-47) and capture timestamp.
    ///
    /// The body layout is: 2-byte big-endian sequence number, 1-byte
    /// fragment-index self-report, then the payload bytes (4 bytes for
    /// index 1, 25 bytes for indices 2-5).
    pub fn ingest(
        &mut self,
        packet_type: u8,
        timestamp: NaiveDateTime,
        body: &[u8],
    ) -> Result<BtmIngest, DecodeError> {
        let expected_index =
            fragment_index_for_packet_type(packet_type).expect("caller filters BTM packet types");
        let payload_len = PAYLOAD_LENS[expected_index as usize - 1];

        let sequence = read_u16(body, 0)?;
        let actual_index = read_u8(body, 2)?;
        if body.len() < 3 + payload_len {
            return Err(DecodeError::Truncated {
                offset: 3,
                need: 3 + payload_len - body.len(),
            });
        }
        let payload = body[3..3 + payload_len].to_vec();

        if actual_index != expected_index {
            return Ok(BtmIngest {
                telegram: None,
                notice: Some(DecodeError::FragmentIndexMismatch {
                    expected: expected_index,
                    actual: actual_index,
                }),
            });
        }

        let mut result = BtmIngest::default();

        if let Some(slot_idx) = self.find_slot(sequence) {
            let slot = self.slots[slot_idx].as_mut().unwrap();
            let i = expected_index as usize - 1;
            if slot.fragments[i].is_some() {
                self.duplicate_fragments += 1;
            }
            slot.fragments[i] = Some(payload);
            if slot.is_complete() {
                let telegram = Telegram {
                    sequence: slot.sequence,
                    data: slot.concat(),
                    timestamp: slot.earliest_ts,
                };
                self.slots[slot_idx] = None;
                result.telegram = Some(telegram);
            }
            return Ok(result);
        }

        // Unknown sequence: prefer an empty slot, else evict the oldest.
        let target = if let Some(i) = self.slots.iter().position(Option::is_none) {
            i
        } else {
            let (oldest, _) = self
                .slots
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| s.as_ref().unwrap().earliest_ts)
                .expect("slot array is non-empty");
            let evicted = self.slots[oldest].take().unwrap();
            self.evicted_incomplete += 1;
            result.notice = Some(DecodeError::PartialTelegramEvicted {
                sequence: evicted.sequence,
                fragments_present: evicted.fragments_present(),
            });
            oldest
        };

        self.slots[target] = Some(Slot::new(sequence, expected_index, payload, timestamp));
        Ok(result)
    }

    fn find_slot(&self, sequence: u16) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(slot) if slot.sequence == sequence))
    }

    /// Number of slots currently holding partial state.
    pub fn occupied_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
