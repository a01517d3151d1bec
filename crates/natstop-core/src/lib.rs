//! natstop-core: sampling core of the natstop broker monitor.
//!
//! Provides:
//! - `fmt`: size and rate formatting (`psize`, `nsize`)
//! - `config`: target configuration and `/connz` query options
//! - `model`: `/varz` and `/connz` report types
//! - `client`: HTTP client for the monitoring endpoints
//! - `rates`: per-second rates from consecutive samples
//! - `sampler`: the polling loop producing `Snapshot`s
//! - `mock`: scripted report source for running without a broker

pub mod client;
pub mod config;
pub mod error;
pub mod fmt;
pub mod mock;
pub mod model;
pub mod rates;
pub mod sampler;
pub mod source;

#[cfg(test)]
mod testing;

pub use client::{MonitorClient, Report, ReportKind};
pub use config::{ConnzOptions, SortOpt, TargetConfig};
pub use error::{ClientError, ErrorKind, MonitorError};
pub use fmt::psize;
pub use rates::RateSet;
pub use sampler::{Sampler, SamplerHandle, Snapshot, monitor_stats};
pub use source::StatsSource;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
