// SPDX-License-Identifier: GPL-3.0-only

//! CLI wrapper around the mount option policy for testing and manual checks

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use storage_mount_options::{DeviceRecord, FixedConfigDir, MountOptionsEngine};
use storage_sys::UdevRecord;

/// Resolve and validate mount options the way the storage daemon does
#[derive(Parser)]
#[command(name = "storage-mount-options-cli")]
#[command(about = "CLI tool for mount option policy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DeviceArgs {
    /// Device node or symlink
    #[arg(long)]
    device: PathBuf,
    /// Additional symlink aliases of the device
    #[arg(long = "symlink")]
    symlinks: Vec<String>,
    /// Device properties as KEY=VALUE
    #[arg(long = "property", value_parser = parse_property)]
    properties: Vec<(String, String)>,
    /// Read symlinks and properties from the udev database
    #[arg(long)]
    udev: bool,
    /// Filesystem type
    #[arg(long)]
    fstype: Option<String>,
    /// Directory holding mount_options.conf [default: /etc/udisks2]
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective option set as JSON
    Effective {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Print the validated mount option string
    Calculate {
        #[command(flatten)]
        device: DeviceArgs,
        /// UID of the requesting user
        #[arg(long)]
        uid: u32,
        /// Options requested by the caller
        #[arg(long)]
        options: Option<String>,
    },
}

fn parse_property(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn build_engine(args: &DeviceArgs) -> Result<MountOptionsEngine> {
    let engine = match &args.config_dir {
        Some(dir) => MountOptionsEngine::with_config_dir(FixedConfigDir::new(dir)),
        None => MountOptionsEngine::system(),
    };
    engine.context("built-in mount options are unusable")
}

fn load_device(args: &DeviceArgs) -> Result<DeviceRecord> {
    let mut device = if args.udev {
        let record = UdevRecord::for_device(&args.device)
            .with_context(|| format!("reading udev record of {}", args.device.display()))?;
        DeviceRecord::from(record)
    } else {
        DeviceRecord::new(args.device.to_string_lossy())
    };

    for symlink in &args.symlinks {
        device = device.with_symlink(symlink.as_str());
    }
    for (key, value) in &args.properties {
        device = device.with_property(key.as_str(), value.as_str());
    }
    Ok(device)
}

fn main() -> Result<()> {
    // Initialize tracing to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Effective { device } => {
            let engine = build_engine(&device)?;
            let record = load_device(&device)?;
            let effective =
                engine.compute_effective_mount_options(&record, device.fstype.as_deref());
            println!("{}", serde_json::to_string(&effective)?);
        }
        Commands::Calculate {
            device,
            uid,
            options,
        } => {
            let engine = build_engine(&device)?;
            let record = load_device(&device)?;
            let assembled = engine.calculate_mount_options(
                &record,
                uid,
                device.fstype.as_deref(),
                options.as_deref(),
            )?;
            println!("{}", assembled);
        }
    }

    Ok(())
}
