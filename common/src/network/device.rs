use std::net::Ipv4Addr;
use std::time::Duration;

/// Hostname of a device whose reverse lookup failed or was skipped.
pub const UNKNOWN_HOSTNAME: &str = "unknown";

/// Outcome of one `ping` call against one target.
#[derive(Debug, Clone, PartialEq)]
pub struct PingResult {
    pub target_ip: Ipv4Addr,
    pub success: bool,
    /// Measured elapsed time between sending the probe and receiving its reply.
    ///
    /// Zero when the probe failed.
    pub response_time_ms: f64,
    pub error_message: Option<String>,
}

impl PingResult {
    pub fn succeeded(target_ip: Ipv4Addr, elapsed: Duration) -> Self {
        Self {
            target_ip,
            success: true,
            response_time_ms: elapsed.as_secs_f64() * 1_000.0,
            error_message: None,
        }
    }

    pub fn failed(target_ip: Ipv4Addr, message: impl Into<String>) -> Self {
        Self {
            target_ip,
            success: false,
            response_time_ms: 0.0,
            error_message: Some(message.into()),
        }
    }
}

/// A host that answered during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub ip_address: Ipv4Addr,
    pub hostname: String,
    pub is_active: bool,
    pub response_time_ms: f64,
}

impl DeviceInfo {
    /// Builds a device from a successful probe; `None` for a failed one.
    pub fn from_ping(result: &PingResult) -> Option<Self> {
        result.success.then(|| Self {
            ip_address: result.target_ip,
            hostname: UNKNOWN_HOSTNAME.to_string(),
            is_active: true,
            response_time_ms: result.response_time_ms,
        })
    }

    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string());
        self
    }
}
