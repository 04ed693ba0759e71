use std::time::Duration;

use tracing::warn;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1_000);
pub const DEFAULT_MAX_CONCURRENT: usize = 50;
pub const DEFAULT_RETRY_COUNT: usize = 1;
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(2);

/// Presentation settings of the command line front end.
#[derive(Debug, Clone)]
pub struct Config {
    /// Skips the banner printed at startup.
    pub no_banner: bool,
    /// Disables reverse DNS lookups for responding hosts.
    ///
    /// Devices keep the hostname `"unknown"`.
    pub no_dns: bool,
    /// Upper bound of a single reverse lookup.
    pub dns_timeout: Duration,
    /// 0 prints everything, 1 drops decorations, 2 prints only the summary.
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_banner: false,
            no_dns: false,
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            quiet: 0,
        }
    }
}

/// Parameters of a single subnet scan.
///
/// `max_concurrent` and `retry_count` are never zero: the setters clamp a zero
/// up to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    timeout: Duration,
    max_concurrent: usize,
    retry_count: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }
}

impl ScanConfig {
    pub fn new(timeout: Duration, max_concurrent: usize, retry_count: usize) -> Self {
        Self::default()
            .with_timeout(timeout)
            .with_max_concurrent(max_concurrent)
            .with_retry_count(retry_count)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn retry_count(&self) -> usize {
        self.retry_count
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_max_concurrent(&mut self, max_concurrent: usize) {
        self.max_concurrent = at_least_one("max_concurrent", max_concurrent);
    }

    pub fn set_retry_count(&mut self, retry_count: usize) {
        self.retry_count = at_least_one("retry_count", retry_count);
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.set_timeout(timeout);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.set_max_concurrent(max_concurrent);
        self
    }

    pub fn with_retry_count(mut self, retry_count: usize) -> Self {
        self.set_retry_count(retry_count);
        self
    }
}

/// Clamps a count that must never be zero, warning when it was.
pub fn at_least_one(name: &str, value: usize) -> usize {
    if value == 0 {
        warn!("{name} must be at least 1, using 1");
        return 1;
    }
    value
}
