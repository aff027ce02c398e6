use std::net::IpAddr;

use anyhow::{bail, Result};
use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use tracing::{debug, warn};

use tlsframe_core::{
    compute_ja3, extract_frame_info, FrameInfo, FrameStatus, HandshakeType, Ja3Result,
    ProcessingOptions,
};

use crate::reassembly::FlowKey;

/// Extracted packet-level information before TLS parsing.
pub struct PacketInfo {
    pub flow: FlowKey,
    pub tcp_payload: Vec<u8>,
}

/// Everything extracted from one Hello record.
pub struct InspectionResult {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
    pub info: FrameInfo,
    /// Only computed for ClientHellos.
    pub ja3: Option<Ja3Result>,
}

/// Parse a raw captured packet (from Ethernet header) and extract the flow
/// key and TCP payload. No TLS-level inspection.
///
/// Returns:
/// - `Ok(Some(info))` if the packet contains a TCP segment with payload
/// - `Ok(None)` if the packet has no TCP payload (SYN, ACK, FIN, etc.)
/// - `Err` if packet parsing fails (not TCP, no IP header, etc.)
pub fn parse_packet(raw: &[u8]) -> Result<Option<PacketInfo>> {
    let sliced = SlicedPacket::from_ethernet(raw)?;

    let (src_ip, dst_ip) = match &sliced.net {
        Some(NetSlice::Ipv4(ipv4)) => {
            let hdr = ipv4.header();
            (
                IpAddr::V4(hdr.source_addr()),
                IpAddr::V4(hdr.destination_addr()),
            )
        }
        Some(NetSlice::Ipv6(ipv6)) => {
            let hdr = ipv6.header();
            (
                IpAddr::V6(hdr.source_addr()),
                IpAddr::V6(hdr.destination_addr()),
            )
        }
        _ => bail!("No IP header found"),
    };

    let (src_port, dst_port, tcp_payload) = match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => (tcp.source_port(), tcp.destination_port(), tcp.payload()),
        _ => bail!("Not a TCP packet"),
    };

    if tcp_payload.is_empty() {
        return Ok(None);
    }

    Ok(Some(PacketInfo {
        flow: FlowKey {
            src_ip,
            src_port,
            dst_ip,
            dst_port,
        },
        tcp_payload: tcp_payload.to_vec(),
    }))
}

/// Given a complete TLS record (from reassembly or single segment),
/// extract its metadata and, for a ClientHello, its JA3 fingerprint.
pub fn inspect_tls_record(flow: &FlowKey, tls_data: &[u8]) -> Option<InspectionResult> {
    let mut info = FrameInfo::default();
    let result = extract_frame_info(tls_data, &mut info, ProcessingOptions::ALL, None);

    match FrameStatus::of(&result) {
        FrameStatus::Complete => {}
        FrameStatus::Incomplete => {
            debug!("Hello record still incomplete after reassembly ({})", flow);
            return None;
        }
        FrameStatus::Malformed => {
            if let Err(e) = result {
                warn!("Hello parse error: {} ({})", e, flow);
            }
            return None;
        }
    }

    let ja3 = match info.handshake_type {
        Some(HandshakeType::ClientHello) => Some(compute_ja3(&info)),
        Some(HandshakeType::ServerHello) => None,
        _ => return None,
    };

    Some(InspectionResult {
        src_ip: flow.src_ip,
        src_port: flow.src_port,
        dst_ip: flow.dst_ip,
        dst_port: flow.dst_port,
        info,
        ja3,
    })
}
