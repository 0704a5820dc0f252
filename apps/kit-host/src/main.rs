// Licensed under the Apache-2.0 license

//! Kit Protocol Host Binary
//!
//! Boots an emulated HSM behind the mailbox backend and runs Kit Protocol
//! commands from a script file or stdin, one per line. Blank lines and lines
//! starting with `#` are skipped.

use anyhow::{Context, Result};
use clap::Parser;
use emulator_hsm::EmulatedHsm;
use kit_host::config::parse_log_level;
use kit_host::{boot_hsm, HostConfig, KitHost};
use kit_protocol::{HalRegistry, HsmMailboxHal};
use log::{error, info};
use simple_logger::SimpleLogger;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kit-host")]
#[command(about = "Runs Kit Protocol commands against an emulated HSM mailbox")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File with one Kit Protocol command per line (default: stdin)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Override the configured log level
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HostConfig::from_file(path)?,
        None => HostConfig::default(),
    };

    let level = match &args.log_level {
        Some(level) => parse_log_level(level)?,
        None => config.log_level()?,
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to initialize logger")?;

    let kit_config = config.kit_config()?;
    let delimiter = kit_config.message_delimiter;

    let mut hal = Box::new(HsmMailboxHal::new(
        EmulatedHsm::new(config.emulator.clone()),
        kit_config,
    ));
    let polls = boot_hsm(&mut hal, config.boot.max_boot_polls)?;
    info!("HSM ready after {} boot polls", polls);

    let mut registry = HalRegistry::new();
    registry
        .register(&mut *hal)
        .map_err(|status| anyhow::anyhow!("Registering HSM mailbox failed: {}", status))?;
    let mut host = KitHost::new(registry, delimiter)?;

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path)
                .with_context(|| format!("Failed to open script: {:?}", path))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    for line in input.lines() {
        let line = line.context("Failed to read command line")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match host.process_line(line) {
            Ok(output) => println!("{}", output),
            Err(err) => error!("{:#}", err),
        }
    }

    Ok(())
}
