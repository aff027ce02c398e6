use std::fmt;

use bitflags::bitflags;

/// Declare a one-byte protocol enum that keeps unassigned values.
macro_rules! byte_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            /// A value with no assigned meaning in this vocabulary.
            Unknown(u8),
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                match value {
                    $($name::$variant => $value,)+
                    $name::Unknown(other) => other,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(stringify!($variant)),)+
                    Self::Unknown(other) => write!(f, "Unknown({})", other),
                }
            }
        }
    };
}

byte_enum! {
    /// TLS record content type (RFC 8446 §5.1).
    pub enum ContentType {
        ChangeCipherSpec = 20,
        Alert = 21,
        Handshake = 22,
        ApplicationData = 23,
        Heartbeat = 24,
    }
}

byte_enum! {
    /// Handshake message type (RFC 8446 §4).
    pub enum HandshakeType {
        HelloRequest = 0,
        ClientHello = 1,
        ServerHello = 2,
        NewSessionTicket = 4,
        EndOfEarlyData = 5,
        EncryptedExtensions = 8,
        Certificate = 11,
        ServerKeyExchange = 12,
        CertificateRequest = 13,
        ServerHelloDone = 14,
        CertificateVerify = 15,
        ClientKeyExchange = 16,
        Finished = 20,
        KeyUpdate = 24,
        MessageHash = 254,
    }
}

byte_enum! {
    pub enum AlertLevel {
        Warning = 1,
        Fatal = 2,
    }
}

byte_enum! {
    /// Alert description codes (RFC 5246 §7.2, RFC 8446 §6).
    pub enum AlertDescription {
        CloseNotify = 0,
        UnexpectedMessage = 10,
        BadRecordMac = 20,
        DecryptionFailed = 21,
        RecordOverflow = 22,
        DecompressionFailure = 30,
        HandshakeFailure = 40,
        NoCertificate = 41,
        BadCertificate = 42,
        UnsupportedCertificate = 43,
        CertificateRevoked = 44,
        CertificateExpired = 45,
        CertificateUnknown = 46,
        IllegalParameter = 47,
        UnknownCa = 48,
        AccessDenied = 49,
        DecodeError = 50,
        DecryptError = 51,
        ExportRestriction = 60,
        ProtocolVersion = 70,
        InsufficientSecurity = 71,
        InternalError = 80,
        InappropriateFallback = 86,
        UserCanceled = 90,
        NoRenegotiation = 100,
        MissingExtension = 109,
        UnsupportedExtension = 110,
        CertificateUnobtainable = 111,
        UnrecognizedName = 112,
        BadCertificateStatusResponse = 113,
        BadCertificateHashValue = 114,
        UnknownPskIdentity = 115,
        CertificateRequired = 116,
        NoApplicationProtocol = 120,
    }
}

/// SSL/TLS protocol version on the `major == 3` record layer.
///
/// Ordered oldest to newest, so `version > TlsVersion::Tls10` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    Ssl3,
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl TlsVersion {
    pub const ALL: [TlsVersion; 5] = [
        TlsVersion::Ssl3,
        TlsVersion::Tls10,
        TlsVersion::Tls11,
        TlsVersion::Tls12,
        TlsVersion::Tls13,
    ];

    /// Map the minor byte of a `{3, minor}` version pair.
    pub fn from_minor(minor: u8) -> Option<Self> {
        match minor {
            0 => Some(Self::Ssl3),
            1 => Some(Self::Tls10),
            2 => Some(Self::Tls11),
            3 => Some(Self::Tls12),
            4 => Some(Self::Tls13),
            _ => None,
        }
    }

    pub fn minor(self) -> u8 {
        match self {
            Self::Ssl3 => 0,
            Self::Tls10 => 1,
            Self::Tls11 => 2,
            Self::Tls12 => 3,
            Self::Tls13 => 4,
        }
    }

    /// Two-byte wire code, e.g. `0x0303` (771) for TLS 1.2.
    pub fn wire_code(self) -> u16 {
        u16::from_be_bytes([3, self.minor()])
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ssl3 => "SSLv3",
            Self::Tls10 => "TLSv1.0",
            Self::Tls11 => "TLSv1.1",
            Self::Tls12 => "TLSv1.2",
            Self::Tls13 => "TLSv1.3",
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of protocol versions offered or negotiated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProtocolVersions: u8 {
        const SSL3 = 1 << 0;
        const TLS10 = 1 << 1;
        const TLS11 = 1 << 2;
        const TLS12 = 1 << 3;
        const TLS13 = 1 << 4;
    }
}

impl ProtocolVersions {
    pub fn highest(self) -> Option<TlsVersion> {
        TlsVersion::ALL
            .iter()
            .rev()
            .copied()
            .find(|v| self.contains((*v).into()))
    }
}

impl From<TlsVersion> for ProtocolVersions {
    fn from(version: TlsVersion) -> Self {
        match version {
            TlsVersion::Ssl3 => Self::SSL3,
            TlsVersion::Tls10 => Self::TLS10,
            TlsVersion::Tls11 => Self::TLS11,
            TlsVersion::Tls12 => Self::TLS12,
            TlsVersion::Tls13 => Self::TLS13,
        }
    }
}

bitflags! {
    /// Classification of advertised ALPN protocol names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ApplicationProtocols: u8 {
        const HTTP11 = 1 << 0;
        const HTTP2 = 1 << 1;
        const OTHER = 1 << 2;
    }
}

bitflags! {
    /// Which structured extensions `extract_frame_info` decodes.
    ///
    /// Extension-list recording, GREASE filtering, supported_groups,
    /// ec_point_formats and the observer callback run regardless.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProcessingOptions: u8 {
        const SERVER_NAME = 1 << 0;
        const APPLICATION_PROTOCOL = 1 << 1;
        const VERSIONS = 1 << 2;
        const CIPHER_SUITES = 1 << 3;
        const ALL = Self::SERVER_NAME.bits()
            | Self::APPLICATION_PROTOCOL.bits()
            | Self::VERSIONS.bits()
            | Self::CIPHER_SUITES.bits();
    }
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self::ALL
    }
}

/// Write the names of the set flags as `A|B`, or `-` when empty.
fn write_flag_names<'a>(
    f: &mut fmt::Formatter<'_>,
    names: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    let mut any = false;
    for name in names {
        if any {
            f.write_str("|")?;
        }
        f.write_str(name)?;
        any = true;
    }
    if !any {
        f.write_str("-")?;
    }
    Ok(())
}

impl fmt::Display for ProtocolVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_flag_names(f, self.iter_names().map(|(name, _)| name))
    }
}

impl fmt::Display for ApplicationProtocols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_flag_names(f, self.iter_names().map(|(name, _)| name))
    }
}

impl fmt::Display for ProcessingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_flag_names(f, self.iter_names().map(|(name, _)| name))
    }
}

/// The 5-byte TLS record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    pub content_type: ContentType,
    /// Best-effort version probe. See [`try_read_header`](crate::frame::try_read_header):
    /// for Hello records this is the version carried inside the handshake
    /// body, not the record layer's own (often frozen) version field.
    pub version: Option<TlsVersion>,
    /// Record-layer length field; `None` if the major version byte is not 3.
    pub declared_length: Option<u16>,
}

impl FrameHeader {
    /// Header plus body size, if the length field was readable.
    pub fn frame_size(&self) -> Option<usize> {
        self.declared_length
            .map(|len| usize::from(len) + crate::frame::RECORD_HEADER_LEN)
    }
}

impl Default for FrameHeader {
    fn default() -> Self {
        Self {
            content_type: ContentType::Unknown(0),
            version: None,
            declared_length: None,
        }
    }
}

impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content_type)?;
        match self.version {
            Some(v) => write!(f, " {}", v)?,
            None => f.write_str(" unknown-version")?,
        }
        match self.declared_length {
            Some(len) => write!(f, " len={}", len),
            None => f.write_str(" len=?"),
        }
    }
}

/// Everything extracted from one TLS record.
///
/// Owned by the caller and filled in place by
/// [`extract_frame_info`](crate::frame::extract_frame_info), which resets it
/// first, so one value can be reused while a frame's bytes trickle in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameInfo {
    pub header: FrameHeader,
    /// Set only for handshake records.
    pub handshake_type: Option<HandshakeType>,
    /// Header version plus any version signalled by the Hello body or a
    /// supported_versions extension.
    pub supported_versions: ProtocolVersions,
    /// Decoded SNI host name.
    pub target_name: Option<String>,
    pub application_protocols: ApplicationProtocols,
    /// Set only for alert records.
    pub alert_description: Option<AlertDescription>,
    /// Offered cipher suites in wire order; GREASE slots are zeroed in place.
    pub cipher_suites: Vec<u16>,
    /// Extension types in wire order, GREASE omitted.
    pub extensions: Vec<u16>,
    /// Named groups whose high byte is zero, in wire order.
    pub supported_groups: Vec<u16>,
    /// Point formats 0..=2 in wire order.
    pub ec_point_formats: Vec<u8>,
}

impl FrameInfo {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;
        if let Some(t) = self.handshake_type {
            write!(f, " {}", t)?;
        }
        write!(f, " versions={}", self.supported_versions)?;
        if let Some(name) = &self.target_name {
            write!(f, " sni={}", name)?;
        }
        if !self.application_protocols.is_empty() {
            write!(f, " alpn={}", self.application_protocols)?;
        }
        if let Some(alert) = self.alert_description {
            write!(f, " alert={}", alert)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_enums_round_trip_unknown_values() {
        assert_eq!(ContentType::from(22), ContentType::Handshake);
        assert_eq!(ContentType::from(0x47), ContentType::Unknown(0x47));
        assert_eq!(u8::from(ContentType::Unknown(0x47)), 0x47);
        assert_eq!(u8::from(AlertDescription::ProtocolVersion), 70);
        assert_eq!(AlertDescription::from(200), AlertDescription::Unknown(200));
        assert_eq!(HandshakeType::from(2).to_string(), "ServerHello");
    }

    #[test]
    fn version_ordering_and_codes() {
        assert!(TlsVersion::Tls11 > TlsVersion::Tls10);
        assert!(TlsVersion::Ssl3 < TlsVersion::Tls13);
        assert_eq!(TlsVersion::Tls12.wire_code(), 771);
        assert_eq!(TlsVersion::from_minor(4), Some(TlsVersion::Tls13));
        assert_eq!(TlsVersion::from_minor(5), None);
    }

    #[test]
    fn highest_version_in_set() {
        let set = ProtocolVersions::TLS12 | ProtocolVersions::TLS13;
        assert_eq!(set.highest(), Some(TlsVersion::Tls13));
        assert_eq!(ProtocolVersions::empty().highest(), None);
        assert_eq!(set.to_string(), "TLS12|TLS13");
        assert_eq!(ProtocolVersions::empty().to_string(), "-");
    }

    #[test]
    fn default_options_decode_everything() {
        assert_eq!(ProcessingOptions::default(), ProcessingOptions::ALL);
        assert!(ProcessingOptions::ALL.contains(ProcessingOptions::CIPHER_SUITES));
        assert_eq!(
            ProcessingOptions::ALL.to_string(),
            "SERVER_NAME|APPLICATION_PROTOCOL|VERSIONS|CIPHER_SUITES"
        );
        assert_eq!(
            (ProcessingOptions::SERVER_NAME | ProcessingOptions::VERSIONS).to_string(),
            "SERVER_NAME|VERSIONS"
        );
        assert_eq!(ProcessingOptions::empty().to_string(), "-");
    }

    #[test]
    fn frame_info_display() {
        let info = FrameInfo {
            header: FrameHeader {
                content_type: ContentType::Handshake,
                version: Some(TlsVersion::Tls12),
                declared_length: Some(512),
            },
            handshake_type: Some(HandshakeType::ClientHello),
            supported_versions: ProtocolVersions::TLS12 | ProtocolVersions::TLS13,
            target_name: Some("example.com".to_string()),
            application_protocols: ApplicationProtocols::HTTP2,
            ..Default::default()
        };
        assert_eq!(
            info.to_string(),
            "Handshake TLSv1.2 len=512 ClientHello versions=TLS12|TLS13 sni=example.com alpn=HTTP2"
        );
    }
}
