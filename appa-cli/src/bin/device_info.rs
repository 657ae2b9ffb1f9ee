use anyhow::{Context, Result};
use appa_lib::config::SerialSettings;
use appa_lib::constants::DEFAULT_SERIALCOMM;
use appa_lib::display::FunctionCode;
use appa_lib::measurement::{Reading, interpret};
use appa_lib::model::{ChannelRole, StorageFamily};
use appa_lib::storage::{StorageInfo, storage_info_request};
use appa_lib::{AppaDmm, AppaError, SerialTransport};
use clap::Parser;
use tracing::warn;

/// Print identification, protocol version and storage state of a meter.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial port of the meter.
    port: String,
    #[arg(short, long, default_value = DEFAULT_SERIALCOMM)]
    serialcomm: String,
    /// Dump the storage metadata block in hex and decode the first MEM entry.
    #[arg(long)]
    raw: bool,
}

fn print_store(name: &str, info: &StorageInfo) {
    println!(
        "{:<4} {:>5} of {:>5} entries, {} B/entry, device {}..{}, offset 0x{:04x}, rate {} s",
        name,
        info.amount,
        info.capacity(),
        info.entry_size,
        info.mem_start,
        info.mem_start as u32 + info.mem_count as u32,
        info.mem_offset,
        info.rate
    );
}

fn print_reading(label: &str, reading: &Reading) {
    match reading {
        Reading::Value(m) => println!("{:<10} {}", label, m),
        Reading::Status(s) => println!("{:<10} {}", label, s.text),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings: SerialSettings = cli.serialcomm.parse()?;
    let transport = SerialTransport::open(&cli.port, &settings).with_context(|| format!("Failed to open {}", cli.port))?;
    let mut dmm = AppaDmm::new(transport);

    let identity = dmm.identify().context("Identification failed")?;
    let model = identity.model_id;
    println!("============================================================");
    println!("Vendor:        {}", identity.vendor);
    println!("Model:         {}", identity.model);
    println!("Model ID:      {} (0x{:04x})", model, model.id());
    println!("Firmware:      {}", identity.version);
    println!("Serial number: {}", identity.serial_number);
    println!("Sub display:   {}", if model.has_secondary_display() { "yes" } else { "no" });

    match dmm.protocol_version() {
        Ok(version) => println!("Protocol:      {}", version),
        Err(e) => warn!("Protocol version unavailable: {}", e),
    }
    println!("============================================================");

    let display = dmm.read_display().context("Read Display failed")?;
    println!("Function:  {} (range {}{})", display.function_code, display.range_code, if display.auto_range { ", auto" } else { "" });
    print_reading(
        "Primary",
        &interpret(&display.primary, display.function_code, display.auto_range, ChannelRole::Primary),
    );
    if model.has_secondary_display() {
        print_reading(
            "Secondary",
            &interpret(&display.secondary, display.function_code, display.auto_range, ChannelRole::Secondary),
        );
    }

    if model.storage_family() == StorageFamily::None {
        println!("No MEM/LOG storage on this model");
        return Ok(());
    }
    match dmm.storage_info() {
        Ok(stores) => {
            print_store("MEM", &stores.mem);
            print_store("LOG", &stores.log);
            if cli.raw {
                let block = dmm.read_memory(storage_info_request())?;
                println!("Metadata:  {}", hex::encode(&block));
                if stores.mem.amount > 0 {
                    let entries = dmm.read_storage(&stores.mem, 0, 1)?;
                    if let Some(first) = entries.first() {
                        print_reading("MEM #1", &interpret(first, FunctionCode::None, false, ChannelRole::Primary));
                    }
                }
            }
        }
        Err(AppaError::UnsupportedModel(name, what)) => println!("{} does not support {}", name, what),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
