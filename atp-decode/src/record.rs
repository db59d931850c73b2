//! The tagged union of everything the dispatcher can emit for one
//! frame of input, and the opaque "packet family" naming used for
//! passthrough/unknown packet types.

use crate::btm::Telegram;
use crate::header::Header;
use crate::mmi::{MmiDriverMessage, MmiFailureReportAtp, MmiStatus, MmiDynamic};

/// Packet types that are recognised but carry no decoder-relevant
/// payload; the dispatcher records only the header and opaque body
/// bytes under a human-readable family tag.
pub fn passthrough_family(packet_type: u8) -> Option<&'static str> {
    match packet_type {
        21..=24 => Some("VDX_DIGITAL"),
        31..=33 => Some("VDX_ANALOG"),
        41 => Some("BTM_COMMAND"),
        42 => Some("BTM_STATUS"),
        51..=52 => Some("DX_STATUS"),
        61..=64 => Some("DX_EVENT"),
        71..=72 => Some("DX_DIAG"),
        91 => Some("RU_DIAGNOSTIC"),
        201 | 211 | 216 => Some("RU_SYSTEM"),
        221..=228 => Some("RU_EXTENDED"),
        _ => None,
    }
}

/// One decoded packet from the input stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Record {
    MmiDynamic { header: Header, data: MmiDynamic },
    MmiStatus { header: Header, data: MmiStatus },
    MmiDriverMessage { header: Header, data: MmiDriverMessage },
    MmiFailureReportAtp { header: Header, data: MmiFailureReportAtp },
    /// A BTM telegram completed by this frame's fragment. Per the
    /// ordering guarantee, this is emitted at the frame whose fragment
    /// completed the telegram, not at the frame the telegram began.
    BtmTelegram { header: Header, telegram: Telegram },
    /// A recognised packet type that carries no decoder-relevant
    /// payload; the body is preserved opaquely.
    Passthrough {
        header: Header,
        family: &'static str,
        body: Vec<u8>,
    },
    /// A packet type the dispatcher does not recognise. The header and
    /// body are still preserved for diagnostics.
    Unknown { header: Header, body: Vec<u8> },
}

impl Record {
    pub fn header(&self) -> &Header {
        match self {
            Record::MmiDynamic { header, .. }
            | Record::MmiStatus { header, .. }
            | Record::MmiDriverMessage { header, .. }
            | Record::MmiFailureReportAtp { header, .. }
            | Record::BtmTelegram { header, .. }
            | Record::Passthrough { header, .. }
            | Record::Unknown { header, .. } => header,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Record::MmiDynamic { .. } => "MMI_DYNAMIC".to_string(),
            Record::MmiStatus { .. } => "MMI_STATUS".to_string(),
            Record::MmiDriverMessage { .. } => "MMI_DRIVER_MESSAGE".to_string(),
            Record::MmiFailureReportAtp { .. } => "MMI_FAILURE_REPORT_ATP".to_string(),
            Record::BtmTelegram { .. } => "BTM_TELEGRAM".to_string(),
            Record::Passthrough { family, .. } => family.to_string(),
            Record::Unknown { header, .. } => format!("UNKNOWN_{}", header.packet_type),
        }
    }
}
