use crate::frame::types::{ContentType, FrameHeader, TlsVersion};

/// Size of the TLS record header: content type, version (2), length (2).
pub const RECORD_HEADER_LEN: usize = 5;

pub(crate) const TLS_MAJOR: u8 = 3;

// Record header (5) + handshake header (4) puts the Hello's own
// {major, minor} version pair at offsets 9 and 10.
const HELLO_VERSION_MAJOR_OFFSET: usize = 9;
const HELLO_VERSION_MINOR_OFFSET: usize = 10;

/// Parse the 5-byte TLS record header at the start of `frame`.
///
/// Returns `None` when fewer than 5 bytes are available. When the major
/// version byte is not 3, the header is returned with no version and no
/// declared length.
///
/// `version` is a best-effort probe: when at least 11 bytes are present and
/// byte 9 is 3, it is taken from byte 10, the minor version of a Hello
/// message embedded right after the record header. Many stacks freeze the
/// record-layer version at TLS 1.0, so this is the more useful signal for a
/// first handshake record; for any other record it may be stale or
/// meaningless. Shorter buffers fall back to the record layer's own minor
/// byte.
pub fn try_read_header(frame: &[u8]) -> Option<FrameHeader> {
    let &[content_type, major, record_minor, len_hi, len_lo] =
        frame.first_chunk::<RECORD_HEADER_LEN>()?;
    let content_type = ContentType::from(content_type);

    if major != TLS_MAJOR {
        return Some(FrameHeader {
            content_type,
            version: None,
            declared_length: None,
        });
    }

    Some(FrameHeader {
        content_type,
        version: probe_version(frame).or_else(|| TlsVersion::from_minor(record_minor)),
        declared_length: Some(u16::from_be_bytes([len_hi, len_lo])),
    })
}

fn probe_version(frame: &[u8]) -> Option<TlsVersion> {
    match (
        frame.get(HELLO_VERSION_MAJOR_OFFSET),
        frame.get(HELLO_VERSION_MINOR_OFFSET),
    ) {
        (Some(&TLS_MAJOR), Some(&minor)) => TlsVersion::from_minor(minor),
        _ => None,
    }
}

/// Total size (header + body) of the record starting at `frame`, or `None`
/// when fewer than 5 bytes are present or the major version is below 3.
pub fn frame_size(frame: &[u8]) -> Option<usize> {
    let &[_, major, _, len_hi, len_lo] = frame.first_chunk::<RECORD_HEADER_LEN>()?;
    if major < TLS_MAJOR {
        return None;
    }
    Some(usize::from(u16::from_be_bytes([len_hi, len_lo])) + RECORD_HEADER_LEN)
}
