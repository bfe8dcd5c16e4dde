//! Command-line configuration for the readiness gate
//!
//! Flag letters and defaults are kept compatible with earlier releases:
//! `-n default -p 10100 -w 3 -t 10s`.

use clap::Parser;
use std::time::Duration;

/// How pod state is acquired from the control plane.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireMode {
    /// Re-list every pod in scope once per poll interval
    Poll,
    /// Subscribe to incremental pod lifecycle events
    Watch,
}

/// How a single pod is judged ready.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    /// Probe the pod's discovery port over HTTP
    Http,
    /// Check whether any of the pod's init containers is running
    Init,
}

/// Gate configuration
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Wait for a quorum of sibling pods to become ready")]
pub struct Config {
    /// Kubernetes namespace the target pods live in
    #[arg(short = 'n', long, default_value = "default")]
    pub namespace: String,

    /// Discovery server port, also the port sibling pods are probed on
    #[arg(short = 'p', long, default_value_t = 10100)]
    pub port: u16,

    /// Label selector filtering the target pods (e.g. "app=db")
    #[arg(short = 'l', long)]
    pub selector: Option<String>,

    /// Wait for this many pods to be ready
    #[arg(short = 'w', long = "wait-for", default_value_t = 3)]
    pub wait_for: usize,

    /// Max time to wait for the quorum (e.g. "10s", "5m")
    #[arg(short = 't', long, default_value = "10s", value_parser = duration_flag)]
    pub timeout: Duration,

    /// Pod state acquisition mode
    #[arg(long, value_enum, default_value_t = AcquireMode::Poll)]
    pub mode: AcquireMode,

    /// Readiness strategy
    #[arg(long, value_enum, default_value_t = StrategyKind::Http)]
    pub strategy: StrategyKind,

    /// Re-list period in poll mode
    #[arg(long, default_value = "1s", value_parser = duration_flag)]
    pub poll_interval: Duration,

    /// Per-pod HTTP probe timeout
    #[arg(long, default_value = "1s", value_parser = duration_flag)]
    pub probe_timeout: Duration,

    /// How long to keep answering discovery requests after the gate opens,
    /// so sibling gates mid-probe still see this pod as up
    #[arg(long, default_value = "5s", value_parser = duration_flag)]
    pub linger: Duration,
}

impl Config {
    /// Validate constraints clap cannot express
    ///
    /// # Returns
    /// * `Ok(())` - Configuration is usable
    /// * `Err(String)` - Human-readable rejection reason
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.trim().is_empty() {
            return Err("namespace cannot be empty".to_string());
        }

        if let Some(selector) = &self.selector {
            if selector.trim().is_empty() {
                return Err("label selector cannot be empty when provided".to_string());
            }
        }

        if self.port == 0 {
            return Err("port 0 cannot be probed on sibling pods".to_string());
        }

        Ok(())
    }
}

/// clap adapter around [`parse_duration`]
fn duration_flag(value: &str) -> Result<Duration, String> {
    parse_duration(value)
        .ok_or_else(|| format!("invalid duration '{}': expected forms like 30s, 5m, 2h", value))
}

/// Parse a duration string like "5m", "30s", "1h" into std::time::Duration
///
/// Accepted units and limits:
/// - Seconds limited to 24h (86400s)
/// - Minutes limited to 24h (1440m) - use hours for longer durations
/// - Hours limited to 1 week (168h) - prevents typos like "999999h"
///
/// Zero durations are rejected: a gate that cannot wait is a misconfiguration.
pub fn parse_duration(duration_str: &str) -> Option<Duration> {
    let duration_str = duration_str.trim();

    if duration_str.is_empty() {
        return None;
    }

    // Get the last character (unit)
    let unit = duration_str.chars().last()?;

    // Get the numeric part
    let number_str = &duration_str[..duration_str.len() - 1];
    let number: u64 = number_str.parse().ok()?;

    if number == 0 {
        return None;
    }

    match unit {
        's' => {
            if number <= 86400 {
                Some(Duration::from_secs(number))
            } else {
                None // Reject: use hours for durations > 24h
            }
        }
        'm' => {
            if number <= 1440 {
                number.checked_mul(60).map(Duration::from_secs)
            } else {
                None // Reject: use hours for durations > 24h
            }
        }
        'h' => {
            if number <= 168 {
                number.checked_mul(3600).map(Duration::from_secs)
            } else {
                None // Reject: likely a typo (e.g., "8760h" = 1 year)
            }
        }
        _ => None,
    }
}
