use crate::frame::header::TLS_MAJOR;
use crate::frame::types::{AlertDescription, AlertLevel, ContentType, TlsVersion};

/// An alert record is always 7 bytes: record header + level + description.
pub const ALERT_RECORD_LEN: usize = 7;

const ALERT: u8 = 21;
const FATAL: u8 = 2;

// protocol_version(70) alerts, one per version. SSLv3 has no protocol_version
// alert, so it answers with handshake_failure(40).
const PROTOCOL_VERSION_TLS13: [u8; ALERT_RECORD_LEN] = [ALERT, 3, 4, 0, 2, FATAL, 70];
const PROTOCOL_VERSION_TLS12: [u8; ALERT_RECORD_LEN] = [ALERT, 3, 3, 0, 2, FATAL, 70];
const PROTOCOL_VERSION_TLS11: [u8; ALERT_RECORD_LEN] = [ALERT, 3, 2, 0, 2, FATAL, 70];
const PROTOCOL_VERSION_TLS10: [u8; ALERT_RECORD_LEN] = [ALERT, 3, 1, 0, 2, FATAL, 70];
const PROTOCOL_VERSION_SSL3: [u8; ALERT_RECORD_LEN] = [ALERT, 3, 0, 0, 2, FATAL, 40];

/// Parse an alert record, returning its level and description.
///
/// `None` if fewer than 7 bytes are present or the record is not an alert.
pub fn try_parse_alert(frame: &[u8]) -> Option<(AlertLevel, AlertDescription)> {
    let &[content_type, _, _, _, _, level, description] =
        frame.first_chunk::<ALERT_RECORD_LEN>()?;
    if ContentType::from(content_type) != ContentType::Alert {
        return None;
    }
    Some((level.into(), description.into()))
}

/// Build a fatal alert record to send to a peer.
///
/// `protocol_version` alerts come from fixed per-version templates. Any other
/// reason is only produced for versions above TLS 1.0; for TLS 1.0 and SSLv3
/// the result is empty.
pub fn build_alert(version: TlsVersion, reason: AlertDescription) -> Vec<u8> {
    if reason == AlertDescription::ProtocolVersion {
        let template = match version {
            TlsVersion::Tls13 => PROTOCOL_VERSION_TLS13,
            TlsVersion::Tls12 => PROTOCOL_VERSION_TLS12,
            TlsVersion::Tls11 => PROTOCOL_VERSION_TLS11,
            TlsVersion::Tls10 => PROTOCOL_VERSION_TLS10,
            TlsVersion::Ssl3 => PROTOCOL_VERSION_SSL3,
        };
        return template.to_vec();
    }

    if version <= TlsVersion::Tls10 {
        return Vec::new();
    }

    vec![ALERT, TLS_MAJOR, version.minor(), 0, 2, FATAL, reason.into()]
}
