use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod capture;
mod output;
mod packet;
mod reassembly;

#[derive(Parser)]
#[command(name = "tlsframe-sniff")]
#[command(about = "Passive TLS inspector: reports SNI, ALPN, versions and JA3 of captured Hellos")]
struct Cli {
    /// Network interface to capture on (e.g., eth0, wlan0).
    /// If omitted, lists available interfaces and exits.
    #[arg(short, long)]
    interface: Option<String>,

    /// BPF filter expression
    #[arg(short, long, default_value = "tcp port 443")]
    filter: String,

    /// Enable promiscuous mode (capture all traffic on the segment)
    #[arg(short, long, default_value_t = false)]
    promisc: bool,

    /// Snap length: max bytes captured per packet
    #[arg(short, long, default_value_t = 1600)]
    snaplen: i32,

    /// Print verbose output (raw and symbolic JA3 strings)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Output format: "text" (human-readable) or "json" (NDJSON, one object per line)
    #[arg(short, long, default_value = "text")]
    output: String,

    /// Also report ServerHello records
    #[arg(long, default_value_t = false)]
    server_hello: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let iface = match cli.interface {
        Some(name) => name,
        None => {
            capture::list_interfaces()?;
            return Ok(());
        }
    };

    let format = output::OutputFormat::parse(&cli.output)?;

    info!("Capturing on interface: {}", iface);
    info!("BPF filter: {}", cli.filter);
    if cli.server_hello {
        info!("Reporting ServerHello records too");
    }
    info!("Press Ctrl+C to stop\n");

    capture::run_capture(
        &iface,
        &cli.filter,
        cli.promisc,
        cli.snaplen,
        cli.verbose,
        format,
        cli.server_hello,
    )
}
