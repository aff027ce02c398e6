//! Routing metadata from the first bytes of a TLS connection.
//!
//! `tlsframe-core` inspects raw bytes captured before any handshake completes,
//! without keys, and extracts what an SNI-aware proxy or a passive inspector
//! needs to make a decision: record type, offered and negotiated versions,
//! handshake type, server name, ALPN classification, cipher suites, groups,
//! point formats and alert codes. It also derives a JA3 fingerprint.
//!
//! Parsing tolerates partial data. [`extract_frame_info`] reports one of three
//! outcomes: complete, incomplete (call again once more bytes arrive), or
//! malformed (give up on the connection). There is no I/O and no shared
//! state; any number of threads may parse independent buffers concurrently.
//!
//! ```
//! use tlsframe_core::{extract_frame_info, FrameInfo, FrameStatus, ProcessingOptions};
//!
//! let peeked: &[u8] = &[0x16, 0x03, 0x01, 0x02, 0x00, 0x01];
//! let mut info = FrameInfo::default();
//! let result = extract_frame_info(peeked, &mut info, ProcessingOptions::ALL, None);
//! assert_eq!(FrameStatus::of(&result), FrameStatus::Incomplete);
//! ```

pub mod error;
pub mod fingerprint;
pub mod frame;

#[cfg(test)]
mod testutil;

pub use error::{FrameStatus, ParseError};
pub use fingerprint::{compute_ja3, Ja3Result};
pub use frame::{
    build_alert, extract_frame_info, frame_size, get_server_name, is_grease, try_parse_alert,
    try_read_header, AlertDescription, AlertLevel, ApplicationProtocols, ContentType,
    ExtensionObserver, FrameHeader, FrameInfo, HandshakeType, ProcessingOptions,
    ProtocolVersions, TlsVersion, RECORD_HEADER_LEN,
};
