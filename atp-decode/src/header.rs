//! The 15-byte header shared by every RU and MMI packet, plus the
//! 1-byte body-length prefix that follows it.

use chrono::NaiveDateTime;

use crate::bytes::{read_u16, read_u32, read_u8, unwrap_position};
use crate::error::{CalendarField, DecodeError};

/// Number of bytes consumed by the header proper (excludes the body
/// length prefix).
pub const HEADER_LEN: usize = 15;

/// The header common to every packet: packet type, calendar timestamp,
/// position, and speed. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Header {
    /// Packet type discriminator (0-255).
    pub packet_type: u8,
    /// Same byte as `packet_type`, retained separately for display.
    pub packet_number: u8,
    /// Calendar date/time at second resolution. Year is `2000 + YY`.
    pub timestamp: NaiveDateTime,
    /// Position in meters, wrap-corrected.
    pub location: u32,
    /// Reserved bytes 11-12. Parsed but not interpreted.
    pub reserved: u16,
    /// Speed in units of 0.1 km/h.
    pub speed: u16,
}

impl Header {
    /// Parses exactly [`HEADER_LEN`] bytes into a `Header`.
    pub fn parse(bytes: &[u8]) -> Result<Header, DecodeError> {
        if bytes.len() < HEADER_LEN {
            return Err(DecodeError::Truncated {
                offset: 0,
                need: HEADER_LEN - bytes.len(),
            });
        }

        let packet_type = read_u8(bytes, 0)?;
        let yy = read_u8(bytes, 1)?;
        let mm = read_u8(bytes, 2)?;
        let dd = read_u8(bytes, 3)?;
        let hh = read_u8(bytes, 4)?;
        let mi = read_u8(bytes, 5)?;
        let ss = read_u8(bytes, 6)?;
        let raw_location = read_u32(bytes, 7)?;
        let reserved = read_u16(bytes, 11)?;
        let speed = read_u16(bytes, 13)?;

        if !(1..=12).contains(&mm) {
            return Err(DecodeError::InvalidCalendarField {
                which: CalendarField::Month,
                value: mm,
            });
        }
        if !(1..=31).contains(&dd) {
            return Err(DecodeError::InvalidCalendarField {
                which: CalendarField::Day,
                value: dd,
            });
        }
        if hh > 23 {
            return Err(DecodeError::InvalidCalendarField {
                which: CalendarField::Hour,
                value: hh,
            });
        }
        if mi > 59 {
            return Err(DecodeError::InvalidCalendarField {
                which: CalendarField::Minute,
                value: mi,
            });
        }
        if ss > 59 {
            return Err(DecodeError::InvalidCalendarField {
                which: CalendarField::Second,
                value: ss,
            });
        }

        let year = 2000 + yy as i32;
        let timestamp = chrono::NaiveDate::from_ymd_opt(year, mm as u32, dd as u32)
            .and_then(|d| d.and_hms_opt(hh as u32, mi as u32, ss as u32))
            .ok_or(DecodeError::InvalidCalendarField {
                which: CalendarField::Day,
                value: dd,
            })?;

        Ok(Header {
            packet_type,
            packet_number: packet_type,
            timestamp,
            location: unwrap_position(raw_location),
            reserved,
            speed,
        })
    }

    /// Parses a header, then the 1-byte body-length prefix that follows
    /// it, and returns the body slice along with total bytes consumed
    /// (`15 + 1 + body_length` on success).
    pub fn parse_frame(bytes: &[u8]) -> Result<(Header, &[u8], usize), DecodeError> {
        let header = Header::parse(bytes)?;
        let body_len = read_u8(bytes, HEADER_LEN)? as usize;
        let body_start = HEADER_LEN + 1;
        if bytes.len() < body_start + body_len {
            return Err(DecodeError::Truncated {
                offset: body_start,
                need: body_start + body_len - bytes.len(),
            });
        }
        let body = &bytes[body_start..body_start + body_len];
        Ok((header, body, body_start + body_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header_bytes() -> Vec<u8> {
        // type=1, 2023-10-15 14:30:45, location=1000, reserved=0, speed=120
        vec![
            0x01, 0x17, 0x0A, 0x0F, 0x0E, 0x1E, 0x2D, 0x00, 0x00, 0x03, 0xE8, 0x00, 0x00, 0x00,
            0x78,
        ]
    }

    #[test]
    fn parses_fields() {
        let bytes = sample_header_bytes();
        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.packet_type, 1);
        assert_eq!(
            header.timestamp,
            chrono::NaiveDate::from_ymd_opt(2023, 10, 15)
                .unwrap()
                .and_hms_opt(14, 30, 45)
                .unwrap()
        );
        assert_eq!(header.location, 1000);
        assert_eq!(header.speed, 120);
    }

    #[test]
    fn position_wrap() {
        let mut bytes = sample_header_bytes();
        // raw location bytes 3B 9A CA 10 = 1,000,000,016
        bytes[7..11].copy_from_slice(&[0x3B, 0x9A, 0xCA, 0x10]);
        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.location, 16);
    }

    #[test]
    fn invalid_month_is_reported() {
        let mut bytes = sample_header_bytes();
        bytes[2] = 13;
        let err = Header::parse(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidCalendarField {
                which: CalendarField::Month,
                value: 13
            }
        );
    }

    #[test]
    fn parse_frame_reports_consumed() {
        let mut bytes = sample_header_bytes();
        bytes.push(3); // body length
        bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        let (_, body, consumed) = Header::parse_frame(&bytes).unwrap();
        assert_eq!(body, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(consumed, HEADER_LEN + 1 + 3);
    }

    #[test]
    fn truncated_frame_reports_offset() {
        let mut bytes = sample_header_bytes();
        bytes.push(5); // claims 5 body bytes, supplies none
        let err = Header::parse_frame(&bytes).unwrap_err();
        match err {
            DecodeError::Truncated { offset, .. } => assert_eq!(offset, HEADER_LEN + 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
