//! Decoders for the MMI packet family: MMI_DYNAMIC (types 1 and 4),
//! MMI_STATUS (2), MMI_DRIVER_MESSAGE (8), MMI_FAILURE_REPORT_ATP (9).

use crate::bytes::{read_i16, read_u16, read_u32, read_u8, unwrap_position};
use crate::error::DecodeError;

/// Where an [`MmiDynamic`] record originated: packet type 1 is the
/// direct MMI snapshot, type 4 shares the same layout but is tagged as
/// an ATP-reported snapshot. See the open question in the specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MmiDynamicSource {
    Mmi,
    AtpSnapshot,
}

/// Train kinematics snapshot (MMI_DYNAMIC, packet types 1 and 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MmiDynamic {
    pub source: MmiDynamicSource,
    pub v_train: u16,
    pub a_train: i16,
    pub o_train: u32,
    pub o_brake_target: u32,
    pub v_target: u16,
    pub t_interven_war: u16,
    pub v_permitted: u16,
    pub v_release: u16,
    pub v_intervention: u16,
    pub m_warning: u8,
    pub m_slip: bool,
    pub m_slide: bool,
    pub o_bcsp: u32,
}

/// Minimum body length required to decode an [`MmiDynamic`] record.
pub const MMI_DYNAMIC_LEN: usize = 27;

/// Decodes the body of an MMI_DYNAMIC (or ATP-reported snapshot)
/// packet. `body` must already have the 15-byte header and
/// body-length prefix stripped.
pub fn decode_mmi_dynamic(
    body: &[u8],
    source: MmiDynamicSource,
) -> Result<MmiDynamic, DecodeError> {
    if body.len() < MMI_DYNAMIC_LEN {
        return Err(DecodeError::BodyTooShort {
            expected: MMI_DYNAMIC_LEN,
            got: body.len(),
        });
    }

    let v_train = read_u16(body, 0)?;
    let a_train = read_i16(body, 2)?;
    let o_train = unwrap_position(read_u32(body, 4)?);
    let o_brake_target = unwrap_position(read_u32(body, 8)?);
    let v_target = read_u16(body, 12)?;
    let t_interven_war = read_u16(body, 14)?;
    let v_permitted = read_u16(body, 16)?;
    let v_release = read_u16(body, 18)?;
    let v_intervention = read_u16(body, 20)?;
    let status = read_u8(body, 22)?;
    let o_bcsp = unwrap_position(read_u32(body, 23)?);

    Ok(MmiDynamic {
        source,
        v_train,
        a_train,
        o_train,
        o_brake_target,
        v_target,
        t_interven_war,
        v_permitted,
        v_release,
        v_intervention,
        m_warning: status & 0x0F,
        m_slip: (status >> 4) & 1 == 1,
        m_slide: (status >> 5) & 1 == 1,
        o_bcsp,
    })
}

/// Coarse train/brake status bytes (MMI_STATUS, packet type 2). No bit
/// unpacking; each field is one opaque byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MmiStatus {
    pub m_adhesion: u8,
    pub m_mode: u8,
    pub m_level: u8,
    pub m_emer_brake: u8,
    pub m_service_brake: u8,
    pub m_override_eoa: u8,
    pub m_trip: u8,
    pub m_active_cabin: u8,
}

pub const MMI_STATUS_LEN: usize = 8;

pub fn decode_mmi_status(body: &[u8]) -> Result<MmiStatus, DecodeError> {
    if body.len() < MMI_STATUS_LEN {
        return Err(DecodeError::BodyTooShort {
            expected: MMI_STATUS_LEN,
            got: body.len(),
        });
    }
    Ok(MmiStatus {
        m_adhesion: body[0],
        m_mode: body[1],
        m_level: body[2],
        m_emer_brake: body[3],
        m_service_brake: body[4],
        m_override_eoa: body[5],
        m_trip: body[6],
        m_active_cabin: body[7],
    })
}

/// A driver-facing message (MMI_DRIVER_MESSAGE, packet type 8).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MmiDriverMessage {
    pub message_id: u16,
    pub payload: Vec<u8>,
}

pub fn decode_mmi_driver_message(body: &[u8]) -> Result<MmiDriverMessage, DecodeError> {
    if body.len() < 2 {
        return Err(DecodeError::BodyTooShort {
            expected: 2,
            got: body.len(),
        });
    }
    Ok(MmiDriverMessage {
        message_id: read_u16(body, 0)?,
        payload: body[2..].to_vec(),
    })
}

/// An ATP failure report (MMI_FAILURE_REPORT_ATP, packet type 9).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MmiFailureReportAtp {
    pub failure_number: u16,
    pub payload: Vec<u8>,
}

pub fn decode_mmi_failure_report_atp(body: &[u8]) -> Result<MmiFailureReportAtp, DecodeError> {
    if body.len() < 2 {
        return Err(DecodeError::BodyTooShort {
            expected: 2,
            got: body.len(),
        });
    }
    Ok(MmiFailureReportAtp {
        failure_number: read_u16(body, 0)?,
        payload: body[2..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_body() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&120u16.to_be_bytes()); // v_train
        b.extend_from_slice(&10i16.to_be_bytes()); // a_train
        b.extend_from_slice(&1000u32.to_be_bytes()); // o_train
        b.extend_from_slice(&2000u32.to_be_bytes()); // o_brake_target
        b.extend_from_slice(&100u16.to_be_bytes()); // v_target
        b.extend_from_slice(&30u16.to_be_bytes()); // t_interven_war
        b.extend_from_slice(&130u16.to_be_bytes()); // v_permitted
        b.extend_from_slice(&110u16.to_be_bytes()); // v_release
        b.extend_from_slice(&140u16.to_be_bytes()); // v_intervention
        b.push(0b0001_0000); // m_warning=0, m_slip=1, m_slide=0
        b.extend_from_slice(&3000u32.to_be_bytes()); // o_bcsp
        b
    }

    #[test]
    fn decodes_mmi_dynamic() {
        let body = dynamic_body();
        let rec = decode_mmi_dynamic(&body, MmiDynamicSource::Mmi).unwrap();
        assert_eq!(rec.v_train, 120);
        assert_eq!(rec.a_train, 10);
        assert_eq!(rec.o_train, 1000);
        assert_eq!(rec.o_brake_target, 2000);
        assert_eq!(rec.v_target, 100);
        assert_eq!(rec.t_interven_war, 30);
        assert_eq!(rec.v_permitted, 130);
        assert_eq!(rec.v_release, 110);
        assert_eq!(rec.v_intervention, 140);
        assert_eq!(rec.m_warning, 0);
        assert!(rec.m_slip);
        assert!(!rec.m_slide);
        assert_eq!(rec.o_bcsp, 3000);
    }

    #[test]
    fn status_byte_extraction_is_exhaustive() {
        for b in 0u8..=255 {
            let body = {
                let mut body = dynamic_body();
                body[22] = b;
                body
            };
            let rec = decode_mmi_dynamic(&body, MmiDynamicSource::Mmi).unwrap();
            assert_eq!(rec.m_warning, b & 0x0F);
            assert_eq!(rec.m_slip, (b >> 4) & 1 == 1);
            assert_eq!(rec.m_slide, (b >> 5) & 1 == 1);
        }
    }

    #[test]
    fn body_too_short_is_reported() {
        let err = decode_mmi_dynamic(&[0; 5], MmiDynamicSource::Mmi).unwrap_err();
        assert_eq!(
            err,
            DecodeError::BodyTooShort {
                expected: MMI_DYNAMIC_LEN,
                got: 5
            }
        );
    }

    #[test]
    fn decodes_mmi_status() {
        let body = [1, 2, 3, 4, 5, 6, 7, 8];
        let rec = decode_mmi_status(&body).unwrap();
        assert_eq!(rec.m_adhesion, 1);
        assert_eq!(rec.m_active_cabin, 8);
    }

    #[test]
    fn decodes_driver_message_with_payload() {
        let body = [0x00, 0x2A, 0xDE, 0xAD, 0xBE, 0xEF];
        let rec = decode_mmi_driver_message(&body).unwrap();
        assert_eq!(rec.message_id, 0x2A);
        assert_eq!(rec.payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn decodes_failure_report() {
        let body = [0x00, 0x07];
        let rec = decode_mmi_failure_report_atp(&body).unwrap();
        assert_eq!(rec.failure_number, 7);
        assert!(rec.payload.is_empty());
    }
}
