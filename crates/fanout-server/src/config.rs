//! Command-line and environment configuration.

use clap::Parser;
use fanout_dispatch::FailurePolicy;
use fanout_downstream::DEFAULT_BASE_URL;
use std::net::SocketAddr;
use std::time::Duration;

/// Fan out delayed calls to an httpbin-compatible service.
#[derive(Debug, Clone, Parser)]
#[command(name = "fanout-server", version, about)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "FANOUT_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Base URL of the delay-echo dependency.
    #[arg(long, env = "HTTPBIN_URL", default_value = DEFAULT_BASE_URL)]
    pub httpbin_url: String,

    /// Total timeout per downstream call, in seconds.
    #[arg(long, env = "FANOUT_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Connect timeout per downstream call, in seconds.
    #[arg(long, env = "FANOUT_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// What a failed call does to the rest of its dispatch:
    /// abandon, cancel or collect-all.
    #[arg(long, env = "FANOUT_FAILURE_POLICY", default_value_t = FailurePolicy::FailFastAbandon)]
    pub failure_policy: FailurePolicy,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, env = "FANOUT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
