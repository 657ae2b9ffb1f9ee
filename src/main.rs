use anyhow::{Context, Result};
use appa_lib::config::SerialSettings;
use appa_lib::constants::DEFAULT_SERIALCOMM;
use appa_lib::{AppaDmm, SerialTransport};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use serialport::SerialPortType;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Find APPA multimeters on the serial ports of this machine.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Probe only this port instead of every port found.
    #[arg(short, long)]
    port: Option<String>,
    /// Line settings as <baud>/<bits><parity><stop>.
    #[arg(short, long, default_value = DEFAULT_SERIALCOMM)]
    serialcomm: String,
    /// Only list ports, do not talk to them.
    #[arg(short, long)]
    list: bool,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn setup_logging(verbosity: &Verbosity<InfoLevel>) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry().with(filter).with(console_layer).init();
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => format!(
            "USB {:04x}:{:04x} {}",
            usb.vid,
            usb.pid,
            usb.product.as_deref().unwrap_or("")
        ),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

fn identify_port(path: &str, settings: &SerialSettings) -> Result<()> {
    let transport = SerialTransport::open(path, settings).with_context(|| format!("Failed to open {}", path))?;
    let mut dmm = AppaDmm::new(transport);
    let identity = dmm.identify().context("No APPA meter answered")?;
    println!("{}: {}", path, identity);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.verbose);

    let settings: SerialSettings = cli.serialcomm.parse()?;

    let ports: Vec<String> = match cli.port {
        Some(port) => vec![port],
        None => {
            let ports = serialport::available_ports().context("Failed to list serial ports")?;
            for port in &ports {
                info!("{} ({})", port.port_name, describe(&port.port_type));
            }
            ports.into_iter().map(|p| p.port_name).collect()
        }
    };

    if ports.is_empty() {
        info!("No serial ports found.");
        return Ok(());
    }
    if cli.list {
        for port in &ports {
            println!("{}", port);
        }
        return Ok(());
    }

    let mut found = 0;
    for port in &ports {
        debug!("Probing {} at {}", port, settings);
        match identify_port(port, &settings) {
            Ok(()) => found += 1,
            Err(e) => warn!("{}: {:#}", port, e),
        }
    }
    info!("Found {} meter(s) on {} port(s)", found, ports.len());
    Ok(())
}
