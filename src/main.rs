// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use std::path::PathBuf;

use clap::{Parser, ValueHint};

#[derive(Parser)]
#[clap(author = "Copyright (C) 2024 Laixer Equipment B.V.")]
#[clap(version)]
#[clap(about = "Autonomous courier robot daemon", long_about = None)]
struct Args {
    /// Workspace directory.
    #[clap(short = 'D', long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    workspace: Option<PathBuf>,

    /// Test configuration and devices, then exit.
    #[clap(short, long)]
    test: bool,

    /// Disable autonomous mission start.
    #[clap(short, long)]
    no_auto: bool,

    /// Disable machine motion (frozen mode).
    #[clap(long)]
    no_motion: bool,

    /// Slow down machine motion.
    #[clap(long)]
    slow_motion: bool,

    /// Run as systemd service.
    #[clap(long)]
    systemd: bool,

    /// Number of runtime workers.
    #[clap(long)]
    workers: Option<usize>,

    /// Level of verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let local_config = std::env::current_dir()?.join("courierd.toml");

    // Try read configuration from global system location first, then from
    // local directory.
    let mut config = courier::Config::try_from_file(vec![
        PathBuf::from("/etc/courier/courierd.toml"),
        local_config,
    ])?;

    config.bin_name = env!("CARGO_BIN_NAME").to_string();
    config.daemon = args.systemd;
    config.enable_test = args.test;
    config.enable_autopilot = !args.no_auto;

    if args.no_motion {
        config.enable_motion = false;
    }
    if args.slow_motion {
        config.slow_motion = true;
    }
    if let Some(workers) = args.workers {
        config.runtime_workers = workers;
    }
    if let Some(workspace) = args.workspace {
        config.workspace = workspace;
    }

    let mut log_config = simplelog::ConfigBuilder::new();
    if args.systemd {
        log_config.set_time_level(log::LevelFilter::Off);
        log_config.set_thread_level(log::LevelFilter::Off);
    } else {
        let _ = log_config.set_time_offset_to_local();
    }

    log_config.set_target_level(log::LevelFilter::Off);
    log_config.set_location_level(log::LevelFilter::Off);
    log_config.add_filter_ignore_str("mio");

    let log_level = if args.systemd {
        log::LevelFilter::Info
    } else {
        match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    let color_choice = if args.systemd {
        simplelog::ColorChoice::Never
    } else {
        simplelog::ColorChoice::Auto
    };

    simplelog::TermLogger::init(
        log_level,
        log_config.build(),
        simplelog::TerminalMode::Mixed,
        color_choice,
    )?;

    log::trace!("{}", config);

    courier::start_robot(&config)?;

    Ok(())
}
