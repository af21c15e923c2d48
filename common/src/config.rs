use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("port must be between 1 and 65535")]
    InvalidPort,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("at least one sender is required")]
    NoSenders,
    #[error("banner size must be greater than zero when banner reading is enabled")]
    ZeroBannerSize,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Destination TCP port for every probe.
    pub port: u16,
    /// Applies to the dial and to each read or write separately.
    pub timeout: Duration,
    /// Upper bound on connection attempts in flight at once.
    pub senders: usize,
    /// Bytes written right after the connection is established.
    pub payload: Option<Vec<u8>>,
    /// Wait for the peer to send something after connecting (and writing).
    pub read_banner: bool,
    pub max_banner: usize,
    /// 0 prints everything, 1 drops per-address lines, 2 also drops warnings.
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 80,
            timeout: Duration::from_secs(10),
            senders: 1000,
            payload: None,
            read_banner: false,
            max_banner: 1024,
            quiet: 0,
        }
    }
}

impl Config {
    /// Checks the options before any target is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.senders == 0 {
            return Err(ConfigError::NoSenders);
        }
        if self.read_banner && self.max_banner == 0 {
            return Err(ConfigError::ZeroBannerSize);
        }
        Ok(())
    }
}
