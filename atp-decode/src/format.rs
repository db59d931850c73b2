//! Renders decoded [`Record`]s as text or (with the `json` feature)
//! JSON, for the command-line tool's `-f text|json` output modes.

use crate::record::Record;

/// Renders one record as a single human-readable line.
pub fn format_text(record: &Record) -> String {
    let header = record.header();
    format!(
        "packet_type={} description={} packet_number={} timestamp={} location={} speed={} | {}",
        header.packet_type,
        record.description(),
        header.packet_number,
        header.timestamp,
        header.location,
        header.speed,
        format_data_text(record),
    )
}

fn format_data_text(record: &Record) -> String {
    match record {
        Record::MmiDynamic { data, .. } => format!(
            "v_train={} a_train={} o_train={} o_brake_target={} v_target={} t_interven_war={} \
             v_permitted={} v_release={} v_intervention={} m_warning={} m_slip={} m_slide={} o_bcsp={}",
            data.v_train,
            data.a_train,
            data.o_train,
            data.o_brake_target,
            data.v_target,
            data.t_interven_war,
            data.v_permitted,
            data.v_release,
            data.v_intervention,
            data.m_warning,
            data.m_slip,
            data.m_slide,
            data.o_bcsp,
        ),
        Record::MmiStatus { data, .. } => format!(
            "m_adhesion={} m_mode={} m_level={} m_emer_brake={} m_service_brake={} \
             m_override_eoa={} m_trip={} m_active_cabin={}",
            data.m_adhesion,
            data.m_mode,
            data.m_level,
            data.m_emer_brake,
            data.m_service_brake,
            data.m_override_eoa,
            data.m_trip,
            data.m_active_cabin,
        ),
        Record::MmiDriverMessage { data, .. } => {
            format!("message_id={} payload={}", data.message_id, hex_bytes(&data.payload))
        }
        Record::MmiFailureReportAtp { data, .. } => format!(
            "failure_number={} payload={}",
            data.failure_number,
            hex_bytes(&data.payload)
        ),
        Record::BtmTelegram { telegram, .. } => {
            format!("sequence={} data={}", telegram.sequence, hex_bytes(&telegram.data))
        }
        Record::Passthrough { body, .. } => format!("body={}", hex_bytes(body)),
        Record::Unknown { body, .. } => format!("body={}", hex_bytes(body)),
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Renders one record as a JSON object with stable field names:
/// `packet_type`, `description`, `header` (`packet_number`, `timestamp`,
/// `location`, `speed`), and a variant-specific `data` object.
#[cfg(feature = "json")]
pub fn format_json(record: &Record) -> Result<String, serde_json::Error> {
    let header = record.header();
    let value = serde_json::json!({
        "packet_type": header.packet_type,
        "description": record.description(),
        "header": {
            "packet_number": header.packet_number,
            "timestamp": header.timestamp,
            "location": header.location,
            "speed": header.speed,
        },
        "data": data_json(record),
    });
    serde_json::to_string(&value)
}

#[cfg(feature = "json")]
fn data_json(record: &Record) -> serde_json::Value {
    use serde_json::json;
    match record {
        Record::MmiDynamic { data, .. } => json!(data),
        Record::MmiStatus { data, .. } => json!(data),
        Record::MmiDriverMessage { data, .. } => json!(data),
        Record::MmiFailureReportAtp { data, .. } => json!(data),
        Record::BtmTelegram { telegram, .. } => json!(telegram),
        Record::Passthrough { family, body, .. } => {
            json!({ "family": family, "body": hex_bytes(body) })
        }
        Record::Unknown { body, .. } => json!({ "body": hex_bytes(body) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::mmi::{MmiStatus};
    use chrono::NaiveDate;

    fn header() -> Header {
        Header {
            packet_type: 2,
            packet_number: 2,
            timestamp: NaiveDate::from_ymd_opt(2023, 10, 15)
                .unwrap()
                .and_hms_opt(14, 30, 45)
                .unwrap(),
            location: 1000,
            reserved: 0,
            speed: 120,
        }
    }

    fn sample_record() -> Record {
        Record::MmiStatus {
            header: header(),
            data: MmiStatus {
                m_adhesion: 1,
                m_mode: 2,
                m_level: 3,
                m_emer_brake: 4,
                m_service_brake: 5,
                m_override_eoa: 6,
                m_trip: 7,
                m_active_cabin: 8,
            },
        }
    }

    #[test]
    fn text_includes_header_and_data_fields() {
        let text = format_text(&sample_record());
        assert!(text.contains("packet_type=2"));
        assert!(text.contains("description=MMI_STATUS"));
        assert!(text.contains("m_active_cabin=8"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_has_stable_field_names() {
        let json = format_json(&sample_record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["packet_type"], 2);
        assert_eq!(value["description"], "MMI_STATUS");
        assert_eq!(value["header"]["location"], 1000);
        assert_eq!(value["data"]["m_active_cabin"], 8);
    }
}
