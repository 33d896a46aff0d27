// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

//! The `courier` library provides the runtime environment for the courier
//! robot system.
//!
//! The daemon drives a small differential-drive robot through a fixed
//! delivery mission. Motion decisions are taken from periodic object
//! detection snapshots produced by a slow, external inference backend;
//! the robot moves in short bounded bursts between snapshots.
//!
//! The `runtime` module contains the task lifecycle engine and the mission
//! orchestration service. The `kernel` module contains the mission programs
//! themselves. Hardware access lives in `device`, detection plumbing in
//! `vision`, and plain domain types in `core`.

pub mod core;
pub mod device;
pub mod kernel;
pub mod vision;

#[macro_use]
extern crate log;

mod config;

pub use self::config::*;

pub mod runtime;
pub use self::runtime::Error;

pub(crate) mod workspace;

/// Courier runtime module containing various constants.
pub mod consts {
    use std::time::Duration;

    /// Courier runtime version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Default queue size for motion commands.
    pub const QUEUE_SIZE_COMMAND: usize = 16;

    /// Default queue size for operator commands.
    pub const QUEUE_SIZE_OPERATOR: usize = 16;

    /// Default queue size for inference availability signals.
    pub const QUEUE_SIZE_SIGNAL: usize = 16;

    /// Interval between task poll passes.
    ///
    /// The task engine sleeps on this interval between passes instead of
    /// spinning on its flags.
    pub const TASK_POLL_INTERVAL: Duration = Duration::from_millis(20);

    /// Delay before a failed capture or inference cycle is retried.
    pub const CYCLE_RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Number of fruitless inference cycles between search warnings.
    pub const SCAN_WARN_CYCLES: u32 = 32;
}

/// Start the robot daemon.
///
/// This function constructs the asynchronous runtime and blocks until the
/// robot is shut down. Any hardware probe failure is fatal and returned to
/// the caller before services are spawned.
pub fn start_robot(config: &Config) -> runtime::Result {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.runtime_workers)
        .enable_all()
        .build()
        .map_err(runtime::Error::Io)?;

    runtime.block_on(runtime::builder::launch(config))
}
