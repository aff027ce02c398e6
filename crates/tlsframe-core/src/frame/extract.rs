use tracing::{debug, trace};

use crate::error::ParseError;
use crate::frame::alert::{try_parse_alert, ALERT_RECORD_LEN};
use crate::frame::header::{try_read_header, RECORD_HEADER_LEN};
use crate::frame::hello::parse_hello;
use crate::frame::types::{ContentType, FrameInfo, HandshakeType, ProcessingOptions};
use crate::frame::walker::ExtensionObserver;

/// Extract routing metadata from the TLS record at the start of `frame`.
///
/// `info` is reset and then filled in place. Call again with the same
/// accumulator as more bytes of the frame arrive; every call reparses from
/// the first byte.
///
/// - `Ok(())`: the record is fully present and parsed.
/// - `Err(e)` with `e.is_incomplete()`: wait for more bytes. Fields decoded
///   before the truncation point are kept.
/// - any other `Err`: the bytes are not a valid TLS record.
///
/// `options` selects the structured decoders (SNI, ALPN, supported_versions,
/// cipher suites). `observer`, when given, sees every Hello extension.
pub fn extract_frame_info(
    frame: &[u8],
    info: &mut FrameInfo,
    options: ProcessingOptions,
    observer: Option<&mut dyn ExtensionObserver>,
) -> Result<(), ParseError> {
    info.reset();
    let result = extract(frame, info, options, observer);
    if let Err(e) = &result {
        if e.is_malformed() {
            debug!("Malformed TLS frame: {}", e);
        }
    }
    result
}

fn extract(
    frame: &[u8],
    info: &mut FrameInfo,
    options: ProcessingOptions,
    observer: Option<&mut dyn ExtensionObserver>,
) -> Result<(), ParseError> {
    let header = try_read_header(frame).ok_or(ParseError::Incomplete {
        needed: RECORD_HEADER_LEN,
        available: frame.len(),
    })?;
    info.header = header;

    let Some(declared) = header.declared_length else {
        return Err(ParseError::NotTls {
            major: frame.get(1).copied().unwrap_or_default(),
        });
    };
    if let Some(version) = header.version {
        info.supported_versions = version.into();
    }
    let record_len = usize::from(declared) + RECORD_HEADER_LEN;

    match header.content_type {
        ContentType::Alert => {
            let (_, description) = try_parse_alert(frame).ok_or(ParseError::Incomplete {
                needed: ALERT_RECORD_LEN,
                available: frame.len(),
            })?;
            info.alert_description = Some(description);
            Ok(())
        }
        ContentType::Handshake => {
            let body = frame.get(RECORD_HEADER_LEN..).unwrap_or_default();
            let Some(&handshake_type) = body.first() else {
                return Err(ParseError::Incomplete {
                    needed: RECORD_HEADER_LEN + 1,
                    available: frame.len(),
                });
            };
            let handshake_type = HandshakeType::from(handshake_type);
            info.handshake_type = Some(handshake_type);

            if matches!(
                handshake_type,
                HandshakeType::ClientHello | HandshakeType::ServerHello
            ) {
                parse_hello(body, info, options, observer)?;
            }
            ensure_record_present(frame, record_len)
        }
        other => {
            trace!("Record {} carries no routing metadata", other);
            ensure_record_present(frame, record_len)
        }
    }
}

fn ensure_record_present(frame: &[u8], record_len: usize) -> Result<(), ParseError> {
    if frame.len() < record_len {
        return Err(ParseError::Incomplete {
            needed: record_len,
            available: frame.len(),
        });
    }
    Ok(())
}

/// Return the SNI host name of a ClientHello record, decoding nothing else
/// that can be skipped.
///
/// A name decoded before the frame turned out truncated is still returned;
/// `None` if there is no name or the frame is malformed.
pub fn get_server_name(frame: &[u8]) -> Option<String> {
    let mut info = FrameInfo::default();
    match extract_frame_info(frame, &mut info, ProcessingOptions::SERVER_NAME, None) {
        Err(e) if e.is_malformed() => None,
        _ => info.target_name,
    }
}
