use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use tlsframe_core::{
    build_alert, compute_ja3, extract_frame_info, frame_size, AlertDescription, ContentType,
    FrameInfo, HandshakeType, ProcessingOptions, TlsVersion,
};

const READ_CHUNK: usize = 4096;

pub struct SessionConfig {
    pub min_version: TlsVersion,
    pub max_frame: usize,
    pub options: ProcessingOptions,
    /// Longest wait for the next chunk of the first frame.
    pub read_timeout: Duration,
}

/// What to do with a connection once its first frame is parsed.
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Send this alert record, then close.
    Reject(Vec<u8>),
}

/// Reject ClientHellos whose best offered version is below `min_version`.
///
/// A Hello that signals no version at all is let through. The alert is the
/// protocol_version template for the client's best version, which exists for
/// every version, so a rejection always has bytes to send.
pub fn verdict(info: &FrameInfo, min_version: TlsVersion) -> Verdict {
    if info.handshake_type != Some(HandshakeType::ClientHello) {
        return Verdict::Accept;
    }
    match info.supported_versions.highest() {
        Some(highest) if highest < min_version => {
            Verdict::Reject(build_alert(highest, AlertDescription::ProtocolVersion))
        }
        _ => Verdict::Accept,
    }
}

/// Read the first TLS record of a connection, log it and apply the version floor.
pub async fn handle<S>(mut stream: S, peer: SocketAddr, config: &SessionConfig) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];
    let mut info = FrameInfo::default();

    loop {
        let n = timeout(config.read_timeout, stream.read(&mut chunk))
            .await
            .with_context(|| {
                format!(
                    "No data from client within {:?} ({} bytes buffered)",
                    config.read_timeout,
                    buf.len()
                )
            })?
            .context("Failed to read from client")?;
        if n == 0 {
            bail!("Connection closed after {} bytes, before a full frame", buf.len());
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(size) = frame_size(&buf) {
            if size > config.max_frame {
                bail!("First frame is {} bytes (max {})", size, config.max_frame);
            }
        }

        let mut observer = |_: &FrameInfo, extension_type: u16, data: &[u8]| {
            trace!(
                "[{}] extension 0x{:04x} ({} bytes)",
                peer,
                extension_type,
                data.len()
            );
        };
        match extract_frame_info(&buf, &mut info, config.options, Some(&mut observer)) {
            Ok(()) => break,
            Err(e) if e.is_incomplete() => {
                if buf.len() >= config.max_frame {
                    bail!("No complete frame within {} bytes", config.max_frame);
                }
                debug!("[{}] {}, waiting for more data", peer, e);
            }
            Err(e) => return Err(e).context("Malformed first frame"),
        }
    }

    report(peer, &info);

    match verdict(&info, config.min_version) {
        Verdict::Accept => Ok(()),
        Verdict::Reject(alert) => {
            warn!(
                "[{}] offered versions {} below {}, sending protocol_version alert",
                peer, info.supported_versions, config.min_version
            );
            stream
                .write_all(&alert)
                .await
                .context("Failed to send alert")?;
            stream.shutdown().await.ok();
            Ok(())
        }
    }
}

fn report(peer: SocketAddr, info: &FrameInfo) {
    info!("[{}] {}", peer, info);

    if info.header.content_type == ContentType::Alert {
        return;
    }
    if info.handshake_type == Some(HandshakeType::ClientHello) {
        let ja3 = compute_ja3(info);
        info!("[{}] JA3 {} ({})", peer, ja3.hash, ja3.raw_string);
        debug!("[{}] JA3 names {}", peer, ja3.names);
    }
}
