use tracing::trace;

use crate::error::ParseError;
use crate::frame::extensions::{decode_cipher_suites, HelloKind};
use crate::frame::header::TLS_MAJOR;
use crate::frame::reader::SpanReader;
use crate::frame::types::{FrameInfo, HandshakeType, ProcessingOptions, TlsVersion};
use crate::frame::walker::{walk_extensions, ExtensionObserver};

/// type (1) + length (3)
pub(crate) const HANDSHAKE_HEADER_LEN: usize = 4;

const RANDOM_LEN: usize = 32;
// ServerHello: cipher_suite (2) + compression_method (1)
const SERVER_SUITE_AND_COMPRESSION_LEN: usize = 3;

/// Parse a ClientHello or ServerHello handshake message.
///
/// `handshake` starts at the handshake header and may run past the end of
/// the message. If the message length exceeds the bytes present the result
/// is [`ParseError::Incomplete`] and nothing is decoded.
pub(crate) fn parse_hello(
    handshake: &[u8],
    info: &mut FrameInfo,
    options: ProcessingOptions,
    observer: Option<&mut dyn ExtensionObserver>,
) -> Result<(), ParseError> {
    if handshake.len() < HANDSHAKE_HEADER_LEN {
        return Err(ParseError::Incomplete {
            needed: HANDSHAKE_HEADER_LEN,
            available: handshake.len(),
        });
    }

    let mut reader = SpanReader::new(handshake);
    let kind = match HandshakeType::from(reader.read_u8("handshake type")?) {
        HandshakeType::ClientHello => HelloKind::Client,
        HandshakeType::ServerHello => HelloKind::Server,
        _ => return Ok(()),
    };
    let declared = reader.read_u24("handshake length")? as usize;
    if reader.remaining() < declared {
        trace!("Hello incomplete: {}/{} bytes", reader.remaining(), declared);
        return Err(ParseError::Incomplete {
            needed: HANDSHAKE_HEADER_LEN + declared,
            available: handshake.len(),
        });
    }
    let body = reader.take(declared, "hello body")?;

    parse_hello_body(body, kind, info, options, observer)
}

fn parse_hello_body(
    body: &[u8],
    kind: HelloKind,
    info: &mut FrameInfo,
    options: ProcessingOptions,
    observer: Option<&mut dyn ExtensionObserver>,
) -> Result<(), ParseError> {
    let mut reader = SpanReader::new(body);

    // legacy_version may differ from the record header's version.
    let major = reader.read_u8("hello version")?;
    let minor = reader.read_u8("hello version")?;
    if major == TLS_MAJOR {
        if let Some(version) = TlsVersion::from_minor(minor) {
            info.supported_versions |= version.into();
        }
    }

    reader.skip(RANDOM_LEN, "random")?;
    reader.skip_opaque8("session id")?;

    match kind {
        HelloKind::Client => {
            let suites = reader.read_opaque16("cipher suites")?;
            if options.contains(ProcessingOptions::CIPHER_SUITES) {
                decode_cipher_suites(suites, &mut info.cipher_suites)?;
            }
            reader.skip_opaque8("compression methods")?;
        }
        HelloKind::Server => {
            reader.skip(SERVER_SUITE_AND_COMPRESSION_LEN, "cipher suite")?;
        }
    }

    // Extensions are optional in TLS 1.2 and earlier.
    if reader.is_empty() {
        return Ok(());
    }

    let declared = usize::from(reader.read_u16("extensions length")?);
    if declared != reader.remaining() {
        return Err(ParseError::LengthMismatch {
            field: "extensions",
            declared,
            actual: reader.remaining(),
        });
    }

    walk_extensions(reader.rest(), kind, info, options, observer)
}
