//! Incremental parsing of TLS records, Hello messages and their extensions.

pub mod alert;
pub mod extensions;
pub mod extract;
pub mod grease;
pub mod header;
mod hello;
pub mod reader;
pub mod types;
pub mod walker;

pub use alert::{build_alert, try_parse_alert};
pub use extract::{extract_frame_info, get_server_name};
pub use grease::is_grease;
pub use header::{frame_size, try_read_header, RECORD_HEADER_LEN};
pub use types::{
    AlertDescription, AlertLevel, ApplicationProtocols, ContentType, FrameHeader, FrameInfo,
    HandshakeType, ProcessingOptions, ProtocolVersions, TlsVersion,
};
pub use walker::ExtensionObserver;
