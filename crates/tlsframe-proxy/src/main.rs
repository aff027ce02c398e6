use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tlsframe_core::{ProcessingOptions, TlsVersion};

mod session;

use session::SessionConfig;

#[derive(Parser)]
#[command(name = "tlsframe-proxy")]
#[command(about = "Peek at the first TLS record of each connection and log its routing metadata")]
struct Cli {
    /// Address to accept connections on
    #[arg(short, long, default_value = "0.0.0.0:8443")]
    listen: SocketAddr,

    /// Lowest protocol version a client must offer; older clients get a
    /// protocol_version alert
    #[arg(long, value_enum, default_value = "tls1.0")]
    min_version: VersionArg,

    /// Largest first frame to buffer before giving up on a connection
    #[arg(long, default_value_t = 16384 + 5)]
    max_frame: usize,

    /// Seconds to wait for each chunk of the first frame before dropping the client
    #[arg(long, default_value_t = 10)]
    read_timeout: u64,

    /// Structured decoders to run (repeatable)
    #[arg(long = "options", value_enum, default_value = "all")]
    options: Vec<OptionArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VersionArg {
    #[value(name = "ssl3")]
    Ssl3,
    #[value(name = "tls1.0")]
    Tls10,
    #[value(name = "tls1.1")]
    Tls11,
    #[value(name = "tls1.2")]
    Tls12,
    #[value(name = "tls1.3")]
    Tls13,
}

impl From<VersionArg> for TlsVersion {
    fn from(arg: VersionArg) -> Self {
        match arg {
            VersionArg::Ssl3 => TlsVersion::Ssl3,
            VersionArg::Tls10 => TlsVersion::Tls10,
            VersionArg::Tls11 => TlsVersion::Tls11,
            VersionArg::Tls12 => TlsVersion::Tls12,
            VersionArg::Tls13 => TlsVersion::Tls13,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OptionArg {
    All,
    Sni,
    Alpn,
    Versions,
    Ciphers,
}

impl From<OptionArg> for ProcessingOptions {
    fn from(arg: OptionArg) -> Self {
        match arg {
            OptionArg::All => ProcessingOptions::ALL,
            OptionArg::Sni => ProcessingOptions::SERVER_NAME,
            OptionArg::Alpn => ProcessingOptions::APPLICATION_PROTOCOL,
            OptionArg::Versions => ProcessingOptions::VERSIONS,
            OptionArg::Ciphers => ProcessingOptions::CIPHER_SUITES,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(SessionConfig {
        min_version: cli.min_version.into(),
        max_frame: cli.max_frame,
        read_timeout: Duration::from_secs(cli.read_timeout),
        options: cli
            .options
            .iter()
            .fold(ProcessingOptions::empty(), |acc, &o| {
                acc | ProcessingOptions::from(o)
            }),
    });

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;

    info!("tlsframe-proxy listening on {}", cli.listen);
    info!(
        "Minimum version: {}, decoders: {}, read timeout: {:?}",
        config.min_version, config.options, config.read_timeout
    );
    info!("Test with: curl -k https://localhost:{}", cli.listen.port());

    loop {
        let (stream, peer) = listener.accept().await?;
        let config = Arc::clone(&config);

        tokio::spawn(async move {
            if let Err(e) = session::handle(stream, peer, &config).await {
                warn!("[{}] {:#}", peer, e);
            }
            // Connection drops here; the client sees a reset, that's expected
        });
    }
}
