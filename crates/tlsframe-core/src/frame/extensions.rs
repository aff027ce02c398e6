//! Decoders for the Hello extensions that carry routing metadata.
//!
//! Each decoder receives the extension's `extension_data` (or, for cipher
//! suites, the cipher_suites vector body) and fails with a malformed
//! [`ParseError`] when the inner length fields disagree with it.

use tracing::trace;

use crate::error::ParseError;
use crate::frame::grease::is_grease;
use crate::frame::header::TLS_MAJOR;
use crate::frame::reader::{exact_opaque16, exact_opaque8, u16_entries, SpanReader};
use crate::frame::types::{ApplicationProtocols, ProtocolVersions, TlsVersion};

pub const EXT_SERVER_NAME: u16 = 0x0000;
pub const EXT_SUPPORTED_GROUPS: u16 = 0x000a;
pub const EXT_EC_POINT_FORMATS: u16 = 0x000b;
pub const EXT_ALPN: u16 = 0x0010;
pub const EXT_SUPPORTED_VERSIONS: u16 = 0x002b;

const NAME_TYPE_HOST_NAME: u8 = 0;

const ALPN_H2: &[u8] = b"h2";
const ALPN_HTTP11: &[u8] = b"http/1.1";

// ec_point_formats above this are reserved or unassigned.
const MAX_POINT_FORMAT: u8 = 2;

/// Which Hello an extension block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloKind {
    Client,
    Server,
}

/// server_name (RFC 6066 §3).
///
/// Returns `Ok(None)` for empty extension data in a ServerHello, which is how
/// a server acknowledges the client's SNI. A ClientHello must carry a list.
pub fn decode_server_name(
    data: &[u8],
    hello: HelloKind,
) -> Result<Option<String>, ParseError> {
    if data.is_empty() && hello == HelloKind::Server {
        return Ok(None);
    }
    let list = exact_opaque16(data, "server_name_list")?;

    let mut reader = SpanReader::new(list);
    let name_type = reader.read_u8("server_name type")?;
    if name_type != NAME_TYPE_HOST_NAME {
        return Err(ParseError::UnsupportedNameType(name_type));
    }
    let host_name = exact_opaque16(reader.rest(), "host_name")?;
    decode_host_name(host_name).map(Some)
}

/// Decode SNI bytes as strict UTF-8, then map IDNA A-labels to Unicode.
///
/// Per RFC 3490 §4, servers must tolerate unassigned code points in
/// queries, so an IDNA rejection is not an error: the decoded string is
/// returned as-is.
fn decode_host_name(bytes: &[u8]) -> Result<String, ParseError> {
    let name = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    let (unicode, result) = idna::domain_to_unicode(name);
    match result {
        Ok(()) => Ok(unicode),
        Err(_) => {
            trace!("SNI {:?} is not valid IDNA, keeping it verbatim", name);
            Ok(name.to_owned())
        }
    }
}

/// application_layer_protocol_negotiation (RFC 7301 §3.1).
///
/// Every advertised name is classified and folded into the result.
pub fn decode_alpn(data: &[u8]) -> Result<ApplicationProtocols, ParseError> {
    let list = exact_opaque16(data, "protocol_name_list")?;
    let mut reader = SpanReader::new(list);
    let mut protocols = ApplicationProtocols::empty();

    while !reader.is_empty() {
        let name = reader.read_opaque8("protocol_name")?;
        protocols |= match name {
            ALPN_H2 => ApplicationProtocols::HTTP2,
            ALPN_HTTP11 => ApplicationProtocols::HTTP11,
            _ => ApplicationProtocols::OTHER,
        };
    }
    Ok(protocols)
}

/// supported_versions (RFC 8446 §4.2.1).
///
/// A ClientHello carries a 1-byte-prefixed list; a ServerHello carries the
/// single selected version. Entries whose major byte is not 3 (GREASE,
/// DTLS, drafts) are ignored.
pub fn decode_supported_versions(
    data: &[u8],
    hello: HelloKind,
) -> Result<ProtocolVersions, ParseError> {
    let list = match hello {
        HelloKind::Client => exact_opaque8(data, "supported_versions")?,
        HelloKind::Server if data.len() == 2 => data,
        HelloKind::Server => {
            return Err(ParseError::LengthMismatch {
                field: "selected_version",
                declared: 2,
                actual: data.len(),
            })
        }
    };

    let mut versions = ProtocolVersions::empty();
    for code in u16_entries(list, "supported_versions")? {
        let [major, minor] = code.to_be_bytes();
        if major != TLS_MAJOR {
            continue;
        }
        if let Some(version) = TlsVersion::from_minor(minor) {
            versions |= version.into();
        }
    }
    Ok(versions)
}

/// supported_groups, formerly elliptic_curves (RFC 8422 §5.1.1).
///
/// Only groups whose high byte is zero are kept, mirroring the single-byte
/// curve ids of the elliptic_curves era. FFDHE groups (0x01xx) and GREASE
/// are dropped.
pub fn decode_supported_groups(data: &[u8], out: &mut Vec<u16>) -> Result<(), ParseError> {
    let list = exact_opaque16(data, "named_group_list")?;
    out.extend(u16_entries(list, "named_group_list")?.filter(|group| group >> 8 == 0));
    Ok(())
}

/// ec_point_formats (RFC 8422 §5.1.2). Reserved codes above 2 are skipped.
pub fn decode_ec_point_formats(data: &[u8], out: &mut Vec<u8>) -> Result<(), ParseError> {
    let list = exact_opaque8(data, "ec_point_format_list")?;
    out.extend(list.iter().copied().filter(|&format| format <= MAX_POINT_FORMAT));
    Ok(())
}

/// The ClientHello cipher_suites vector body.
///
/// Every slot is kept in order. GREASE codes are overwritten with 0 in place
/// instead of being removed, so positions line up with the wire.
pub fn decode_cipher_suites(list: &[u8], out: &mut Vec<u16>) -> Result<(), ParseError> {
    out.extend(
        u16_entries(list, "cipher_suites")?
            .map(|suite| if is_grease(suite) { 0 } else { suite }),
    );
    Ok(())
}
