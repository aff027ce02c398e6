use serde::Serialize;

use tlsframe_core::{FrameInfo, TlsVersion};

use crate::packet::InspectionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid output format '{}'. Expected 'text' or 'json'.", s),
        }
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    src_ip: String,
    src_port: u16,
    dst_ip: String,
    dst_port: u16,
    handshake: String,
    sni: Option<&'a str>,
    tls_version: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    supported_versions: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alpn: Option<String>,
    cipher_suites: usize,
    extensions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    ja3_hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ja3_raw: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ja3_names: Option<&'a str>,
}

pub fn print_inspection(result: &InspectionResult, format: OutputFormat, verbose: bool) {
    match format {
        OutputFormat::Text => print_text(result, verbose),
        OutputFormat::Json => print_json(result, verbose),
    }
}

fn version_names(info: &FrameInfo) -> Vec<&'static str> {
    TlsVersion::ALL
        .iter()
        .filter(|&&v| info.supported_versions.contains(v.into()))
        .map(|v| v.name())
        .collect()
}

fn handshake_name(info: &FrameInfo) -> String {
    info.handshake_type
        .map_or_else(|| "-".to_string(), |t| t.to_string())
}

fn print_text(result: &InspectionResult, verbose: bool) {
    let info = &result.info;
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Message:    {}", handshake_name(info));
    println!("  Source:     {}:{}", result.src_ip, result.src_port);
    println!("  Dest:       {}:{}", result.dst_ip, result.dst_port);
    println!(
        "  SNI:        {}",
        info.target_name.as_deref().unwrap_or("(none)")
    );
    println!(
        "  TLS ver:    {}",
        info.header.version.map_or("unknown", |v| v.name())
    );
    let versions = version_names(info);
    if !versions.is_empty() {
        println!("  Versions:   {}", versions.join(", "));
    }
    if !info.cipher_suites.is_empty() {
        println!("  Ciphers:    {} suites", info.cipher_suites.len());
    }
    println!("  Extensions: {} types", info.extensions.len());
    if !info.application_protocols.is_empty() {
        println!("  ALPN:       {}", info.application_protocols);
    }
    if let Some(ja3) = &result.ja3 {
        println!("  ──────────────────────────────────────────────────");
        println!("  JA3:        {}", ja3.hash);
        if verbose {
            println!("  JA3 raw:    {}", ja3.raw_string);
            println!("  JA3 names:  {}", ja3.names);
        }
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn json_record(result: &InspectionResult, verbose: bool) -> JsonRecord<'_> {
    let info = &result.info;
    let ja3 = result.ja3.as_ref();
    JsonRecord {
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        src_ip: result.src_ip.to_string(),
        src_port: result.src_port,
        dst_ip: result.dst_ip.to_string(),
        dst_port: result.dst_port,
        handshake: handshake_name(info),
        sni: info.target_name.as_deref(),
        tls_version: info.header.version.map(|v| v.name()),
        supported_versions: version_names(info),
        alpn: (!info.application_protocols.is_empty())
            .then(|| info.application_protocols.to_string()),
        cipher_suites: info.cipher_suites.len(),
        extensions: info.extensions.len(),
        ja3_hash: ja3.map(|j| j.hash.as_str()),
        ja3_raw: ja3.filter(|_| verbose).map(|j| j.raw_string.as_str()),
        ja3_names: ja3.filter(|_| verbose).map(|j| j.names.as_str()),
    }
}

fn print_json(result: &InspectionResult, verbose: bool) {
    match serde_json::to_string(&json_record(result, verbose)) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::warn!("Failed to serialize record: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tlsframe_core::{
        compute_ja3, ApplicationProtocols, FrameHeader, HandshakeType, ProtocolVersions,
    };

    fn sample() -> InspectionResult {
        let info = FrameInfo {
            header: FrameHeader {
                version: Some(TlsVersion::Tls12),
                ..Default::default()
            },
            handshake_type: Some(HandshakeType::ClientHello),
            supported_versions: ProtocolVersions::TLS12 | ProtocolVersions::TLS13,
            target_name: Some("example.com".to_string()),
            application_protocols: ApplicationProtocols::HTTP2,
            cipher_suites: vec![0x1301],
            extensions: vec![0x0000],
            ..Default::default()
        };
        let ja3 = Some(compute_ja3(&info));
        InspectionResult {
            src_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            src_port: 40000,
            dst_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            dst_port: 443,
            info,
            ja3,
        }
    }

    #[test]
    fn parse_output_format() {
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("xml").is_err());
    }

    #[test]
    fn json_record_fields() {
        let result = sample();
        let value = serde_json::to_value(json_record(&result, false)).unwrap();

        assert_eq!(value["handshake"], "ClientHello");
        assert_eq!(value["sni"], "example.com");
        assert_eq!(value["tls_version"], "TLSv1.2");
        assert_eq!(value["supported_versions"][1], "TLSv1.3");
        assert_eq!(value["alpn"], "HTTP2");
        assert_eq!(value["ja3_hash"].as_str().unwrap().len(), 32);
        assert!(value.get("ja3_raw").is_none());
    }

    #[test]
    fn verbose_json_includes_raw_strings() {
        let result = sample();
        let value = serde_json::to_value(json_record(&result, true)).unwrap();
        assert_eq!(value["ja3_raw"], "771,4865,0,,");
    }
}
