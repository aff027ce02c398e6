use std::fmt::Display;

use md5::{Digest, Md5};

use crate::fingerprint::names::{cipher_suite_name, extension_name, group_name, point_format_name};
use crate::frame::types::FrameInfo;

/// Result of a JA3 fingerprint computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ja3Result {
    /// 32-character MD5 hex hash of `raw_string`
    pub hash: String,
    /// The raw string before hashing
    pub raw_string: String,
    /// The same parameters with IANA names instead of codes
    pub names: String,
}

/// Compute the JA3 fingerprint of a parsed Hello.
///
/// JA3 format: MD5(SSLVersion,Ciphers,Extensions,EllipticCurves,EcPointFormats)
///
/// - Fields separated by commas, values within a field by dashes
/// - All values in decimal, in wire order; order is part of the identity
/// - GREASE is already gone from extensions and groups; the zeroed GREASE
///   slots of the cipher list are skipped here
/// - A missing category leaves its field empty
///
/// The hash is an identifier, not a security primitive.
pub fn compute_ja3(info: &FrameInfo) -> Ja3Result {
    let version = info.header.version.map_or(0, |v| v.wire_code());

    let ciphers = join(offered_ciphers(info), "-");
    let extensions = join(info.extensions.iter(), "-");
    let curves = join(info.supported_groups.iter(), "-");
    let point_formats = join(info.ec_point_formats.iter(), "-");

    let raw_string = format!(
        "{},{},{},{},{}",
        version, ciphers, extensions, curves, point_formats
    );

    let mut hasher = Md5::new();
    hasher.update(raw_string.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Ja3Result {
        hash,
        raw_string,
        names: symbolic_names(info),
    }
}

fn offered_ciphers(info: &FrameInfo) -> impl Iterator<Item = &u16> {
    info.cipher_suites.iter().filter(|&&c| c != 0)
}

fn join<T: Display>(values: impl Iterator<Item = T>, sep: &str) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(sep)
}

/// `ciphers|extensions|groups|point_formats|version`, names joined by `,`.
fn symbolic_names(info: &FrameInfo) -> String {
    let ciphers = join(
        offered_ciphers(info).map(|&c| name_or_code(cipher_suite_name(c), c)),
        ",",
    );
    let extensions = join(
        info.extensions
            .iter()
            .map(|&e| name_or_code(extension_name(e), e)),
        ",",
    );
    let groups = join(
        info.supported_groups
            .iter()
            .map(|&g| name_or_code(group_name(g), g)),
        ",",
    );
    let point_formats = join(
        info.ec_point_formats
            .iter()
            .map(|&f| name_or_code(point_format_name(f), u16::from(f))),
        ",",
    );
    let version = info.header.version.map_or("Unknown", |v| v.name());

    format!(
        "{}|{}|{}|{}|{}",
        ciphers, extensions, groups, point_formats, version
    )
}

fn name_or_code(name: Option<&'static str>, code: u16) -> String {
    match name {
        Some(name) => name.to_string(),
        None => format!("0x{:04x}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::types::{FrameHeader, TlsVersion};
    use crate::frame::{extract_frame_info, ProcessingOptions};
    use crate::testutil::HelloBuilder;

    fn sample_info() -> FrameInfo {
        FrameInfo {
            header: FrameHeader {
                version: Some(TlsVersion::Tls12), // 771 decimal
                ..Default::default()
            },
            cipher_suites: vec![0x1301, 0x1302, 0x1303, 0xC02B, 0xC02F],
            extensions: vec![0x0000, 0x0017, 0x000a, 0x000b, 0x000d],
            supported_groups: vec![0x001d, 0x0017, 0x0018],
            ec_point_formats: vec![0x00],
            ..Default::default()
        }
    }

    #[test]
    fn test_ja3_basic() {
        let result = compute_ja3(&sample_info());

        assert_eq!(
            result.raw_string,
            "771,4865-4866-4867-49195-49199,0-23-10-11-13,29-23-24,0"
        );
        assert_eq!(result.hash, "5531206193b0e0ab105506c172199a3e");
    }

    #[test]
    fn test_ja3_zeroed_grease_slots_skipped() {
        let mut info = sample_info();
        info.cipher_suites = vec![0, 0x1301, 0, 0x1302];
        let result = compute_ja3(&info);
        assert!(result.raw_string.starts_with("771,4865-4866,"));
    }

    #[test]
    fn test_ja3_empty_fields() {
        let result = compute_ja3(&FrameInfo::default());
        assert_eq!(result.raw_string, "0,,,,");
        assert_eq!(result.hash, "2432bebf06532faf89aae784a9aae4ef");
        assert_eq!(result.names, "||||Unknown");
    }

    #[test]
    fn test_ja3_names() {
        let mut info = sample_info();
        info.cipher_suites = vec![0x1301, 0xC02F];
        info.extensions = vec![0x0000, 0xBEEF];
        info.supported_groups = vec![0x001d];
        let result = compute_ja3(&info);
        assert_eq!(
            result.names,
            "TLS_AES_128_GCM_SHA256,TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256\
             |server_name,0xbeef|x25519|uncompressed|TLSv1.2"
        );
    }

    #[test]
    fn test_ja3_from_wire() {
        let frame = HelloBuilder::client()
            .cipher_suites(&[0x0A0A, 0x1301, 0x1302, 0x1303, 0xC02B, 0xC02F])
            .sni("example.com")
            .extension(0x0017, vec![])
            .extension(0xff01, vec![0x00])
            .supported_groups(&[0x2A2A, 0x001d, 0x0017, 0x0018])
            .ec_point_formats(&[0])
            .alpn(&["h2"])
            .supported_versions(&[0x0304, 0x0303])
            .extension(0xFAFA, vec![])
            .build();
        let mut info = FrameInfo::default();
        extract_frame_info(&frame, &mut info, ProcessingOptions::ALL, None).unwrap();

        let result = compute_ja3(&info);
        assert_eq!(
            result.raw_string,
            "771,4865-4866-4867-49195-49199,0-23-65281-10-11-16-43,29-23-24,0"
        );
        assert_eq!(result.hash, "47956370b3cf3fcdc8acc3c750927897");
    }

    #[test]
    fn test_ja3_order_sensitive() {
        let a = HelloBuilder::client()
            .cipher_suites(&[0x1301, 0x1302])
            .sni("example.com")
            .build();
        let b = HelloBuilder::client()
            .cipher_suites(&[0x1302, 0x1301])
            .sni("example.com")
            .build();

        let mut info_a = FrameInfo::default();
        let mut info_b = FrameInfo::default();
        extract_frame_info(&a, &mut info_a, ProcessingOptions::ALL, None).unwrap();
        extract_frame_info(&b, &mut info_b, ProcessingOptions::ALL, None).unwrap();

        assert_ne!(compute_ja3(&info_a).hash, compute_ja3(&info_b).hash);
    }
}
