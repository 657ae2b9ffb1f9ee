use anyhow::{Context, Result, bail};
use appa_lib::config::{ConnectionKind, DataSource, DriverConfig};
use appa_lib::constants::DEFAULT_SERIALCOMM;
use appa_lib::limits::SoftwareLimits;
use appa_lib::measurement::Measurement;
use appa_lib::model::ChannelRole;
use appa_lib::sink::{ChannelSample, SessionSink, SinkEvent};
use appa_lib::{AppaDmm, PollStatus, SerialTransport, Session};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::time::Duration;
use tokio::{signal, time};
use tracing::{error, info};

/// Stream readings from an APPA multimeter.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial port of the meter, e.g. /dev/ttyUSB0.
    conn: String,
    /// Line settings as <baud>/<bits><parity><stop>.
    #[arg(short, long, default_value = DEFAULT_SERIALCOMM)]
    serialcomm: String,
    /// Live, MEM or LOG.
    #[arg(short, long, default_value = "Live")]
    data_source: String,
    /// Stop after this many samples.
    #[arg(long, default_value_t = 0)]
    samples: u64,
    /// Stop after this many frames.
    #[arg(long, default_value_t = 0)]
    frames: u64,
    /// Stop after this many milliseconds.
    #[arg(long, default_value_t = 0)]
    time_ms: u64,
    /// Emit one JSON object per sample.
    #[arg(long)]
    json: bool,
    /// Polling interval in milliseconds.
    #[arg(short, long, default_value_t = 20)]
    interval_ms: u64,
}

#[derive(Serialize)]
struct SampleRecord<'a> {
    timestamp: DateTime<Utc>,
    frame: u64,
    channel: &'a str,
    #[serde(flatten)]
    measurement: &'a Measurement,
    flags_text: String,
}

/// Prints samples as they arrive.
struct PrintSink {
    json: bool,
    frame: u64,
}

impl PrintSink {
    fn print(&self, sample: &ChannelSample) {
        let channel = match sample.channel {
            ChannelRole::Primary => "P1",
            ChannelRole::Secondary => "P2",
            ChannelRole::SampleIndex => "Index",
        };
        if self.json {
            let record = SampleRecord {
                timestamp: Utc::now(),
                frame: self.frame,
                channel,
                measurement: &sample.measurement,
                flags_text: sample.measurement.flags.to_string(),
            };
            match serde_json::to_string(&record) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to encode sample: {}", e),
            }
        } else {
            println!(
                "{} #{:<6} {:<5} {}",
                Utc::now().format("%H:%M:%S%.3f"),
                self.frame,
                channel,
                sample.measurement
            );
        }
    }
}

impl SessionSink for PrintSink {
    fn send(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::FrameBegin => self.frame += 1,
            SinkEvent::Sample(sample) => self.print(&sample),
            SinkEvent::FrameEnd => {}
        }
    }
}

fn build_config(cli: &Cli) -> Result<DriverConfig> {
    let mut config = DriverConfig::new(cli.conn.clone());
    config.set("serialcomm", &cli.serialcomm)?;
    config.set("data_source", &cli.data_source)?;
    config.set("limit_samples", &cli.samples.to_string())?;
    config.set("limit_frames", &cli.frames.to_string())?;
    config.set("limit_msec", &cli.time_ms.to_string())?;
    Ok(config)
}

fn open_session(config: &DriverConfig) -> Result<Session<SerialTransport, SoftwareLimits>> {
    if config.connection == ConnectionKind::Ble {
        bail!("Bluetooth connections are not supported by this tool: {}", config.conn);
    }
    let transport = SerialTransport::open(&config.conn, &config.serial)
        .with_context(|| format!("Failed to open {}", config.conn))?;
    let mut dmm = AppaDmm::new(transport);
    let identity = dmm.identify().context("Device identification failed")?;
    info!("Connected to {} {} ({})", identity.vendor, identity.model, identity.serial_number);

    let session = Session::new(dmm, config.data_source, config.limits())
        .with_context(|| format!("Cannot read from {}", config.data_source))?;
    Ok(session)
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    let mut session = open_session(&config)?;
    let mut sink = PrintSink {
        json: cli.json,
        frame: 0,
    };

    if config.data_source != DataSource::Live {
        if let Some(storage) = session.context().storage {
            info!("Replaying {} stored entries", storage.stored_entries());
        }
    }

    let mut interval = time::interval(Duration::from_millis(cli.interval_ms.max(1)));
    session.start();
    loop {
        interval.tick().await;
        if session.poll(&mut sink)? == PollStatus::Stop {
            break;
        }
    }
    match session.limits().reached() {
        Some(kind) => info!("Acquisition stopped by the {} limit after {} frames", kind, sink.frame),
        None => info!("Acquisition finished after {} frames", sink.frame),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    tokio::select! {
        res = run(cli) => {
            if let Err(e) = res {
                error!("Acquisition failed: {:#}", e);
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down gracefully.");
        }
    }
    Ok(())
}
