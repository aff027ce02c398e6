use tracing::trace;

use crate::error::ParseError;
use crate::frame::extensions::{
    decode_alpn, decode_ec_point_formats, decode_server_name, decode_supported_groups,
    decode_supported_versions, HelloKind, EXT_ALPN, EXT_EC_POINT_FORMATS, EXT_SERVER_NAME,
    EXT_SUPPORTED_GROUPS, EXT_SUPPORTED_VERSIONS,
};
use crate::frame::grease::is_grease;
use crate::frame::reader::SpanReader;
use crate::frame::types::{FrameInfo, ProcessingOptions};

/// type (2) + length (2)
const EXTENSION_HEADER_LEN: usize = 4;

/// Receives every extension of a Hello message as it is walked.
///
/// Called once per extension, including GREASE and unknown types, whatever
/// the [`ProcessingOptions`]. The observer sees the accumulator as filled so
/// far but cannot change it or stop the walk.
pub trait ExtensionObserver {
    fn on_extension(&mut self, info: &FrameInfo, extension_type: u16, data: &[u8]);
}

impl<F> ExtensionObserver for F
where
    F: FnMut(&FrameInfo, u16, &[u8]),
{
    fn on_extension(&mut self, info: &FrameInfo, extension_type: u16, data: &[u8]) {
        self(info, extension_type, data)
    }
}

/// Walk the TLV extension list of a Hello.
///
/// `list` is the whole extension block, already bounded by the Hello's own
/// length fields, so an entry running past its end can never be completed by
/// more data: it fails with [`ParseError::LengthMismatch`]. The extensions
/// before it stay recorded in `info`. A decoder failure is returned as-is and
/// ends the parse of the whole frame.
pub(crate) fn walk_extensions(
    list: &[u8],
    hello: HelloKind,
    info: &mut FrameInfo,
    options: ProcessingOptions,
    mut observer: Option<&mut dyn ExtensionObserver>,
) -> Result<(), ParseError> {
    let mut reader = SpanReader::new(list);

    while !reader.is_empty() {
        if reader.remaining() < EXTENSION_HEADER_LEN {
            return Err(ParseError::LengthMismatch {
                field: "extension header",
                declared: EXTENSION_HEADER_LEN,
                actual: reader.remaining(),
            });
        }
        let extension_type = reader.read_u16("extension type")?;
        let declared = usize::from(reader.read_u16("extension length")?);
        if reader.remaining() < declared {
            trace!(
                "Extension 0x{:04x} overruns the extension block: {}/{} bytes",
                extension_type,
                reader.remaining(),
                declared
            );
            return Err(ParseError::LengthMismatch {
                field: "extension data",
                declared,
                actual: reader.remaining(),
            });
        }
        let data = reader.take(declared, "extension data")?;

        decode_extension(extension_type, data, hello, info, options)?;

        if !is_grease(extension_type) {
            info.extensions.push(extension_type);
        }
        if let Some(observer) = observer.as_deref_mut() {
            observer.on_extension(info, extension_type, data);
        }
    }
    Ok(())
}

fn decode_extension(
    extension_type: u16,
    data: &[u8],
    hello: HelloKind,
    info: &mut FrameInfo,
    options: ProcessingOptions,
) -> Result<(), ParseError> {
    match extension_type {
        EXT_SERVER_NAME if options.contains(ProcessingOptions::SERVER_NAME) => {
            if let Some(name) = decode_server_name(data, hello)? {
                trace!("SNI: {}", name);
                info.target_name = Some(name);
            }
        }
        EXT_ALPN if options.contains(ProcessingOptions::APPLICATION_PROTOCOL) => {
            info.application_protocols |= decode_alpn(data)?;
        }
        EXT_SUPPORTED_VERSIONS if options.contains(ProcessingOptions::VERSIONS) => {
            info.supported_versions |= decode_supported_versions(data, hello)?;
        }
        EXT_SUPPORTED_GROUPS => decode_supported_groups(data, &mut info.supported_groups)?,
        EXT_EC_POINT_FORMATS => decode_ec_point_formats(data, &mut info.ec_point_formats)?,
        _ => {}
    }
    Ok(())
}
