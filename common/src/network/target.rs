//! # Scan Target Model
//!
//! Turns a raw target specification into a [`TargetSpec`].
//!
//! The grammar is decided by the first `,` and the first `/` in the input:
//! * `<ip>` - a single host.
//! * `<hostname>` - a single host, looked up by name (first address only).
//! * `<ip>/<prefix>` - a CIDR block.
//! * `<ip>,<hostname>` - an explicit address/name pair.
//!
//! A CIDR block paired with a hostname is rejected as ambiguous.

use std::fmt;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::time::Duration;

use pnet::ipnetwork::{IpNetwork, IpNetworkError};
use thiserror::Error;
use tracing::debug;

use crate::network::range::{Address, Addresses};

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("empty target specification")]
    Empty,
    #[error("malformed input '{0}': expected '<ip>,<hostname>'")]
    Malformed(String),
    #[error("failed to look up '{host}': {source}")]
    Lookup {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("lookup of '{host}' timed out after {timeout:?}")]
    LookupTimedOut { host: String, timeout: Duration },
    #[error("lookup of '{0}' returned no addresses")]
    NoAddresses(String),
    #[error("invalid IP address '{0}'")]
    InvalidAddress(String),
    #[error("invalid CIDR block '{input}': {source}")]
    Cidr {
        input: String,
        #[source]
        source: IpNetworkError,
    },
    #[error("ambiguous target '{0}': a CIDR block cannot be paired with a hostname")]
    Ambiguous(String),
}

/// Resolves hostnames to addresses.
///
/// Implementations may block; callers running on an async runtime should
/// move the call onto a blocking thread.
pub trait NameLookup {
    fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Name lookup backed by the system resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

impl NameLookup for SystemLookup {
    fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = (host, 0).to_socket_addrs()?;
        Ok(addrs.map(|sock_addr| sock_addr.ip()).collect())
    }
}

/// An address plus an optional prefix length.
///
/// A missing prefix length means "this single host".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkPrefix {
    pub addr: IpAddr,
    pub prefix_len: Option<u8>,
}

impl NetworkPrefix {
    pub fn single(addr: IpAddr) -> Self {
        Self {
            addr,
            prefix_len: None,
        }
    }

    /// Builds a prefix from a parsed network, keeping only the network address.
    pub fn from_network(network: IpNetwork) -> Self {
        Self {
            addr: network.network(),
            prefix_len: Some(network.prefix()),
        }
    }

    /// Address width in bits (32 or 128).
    pub fn width(&self) -> u8 {
        match self.addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }

    /// Number of addresses covered, saturating at `u128::MAX` for `::/0`.
    pub fn size(&self) -> u128 {
        let Some(prefix_len) = self.prefix_len else {
            return 1;
        };
        let host_bits: u32 = u32::from(self.width().saturating_sub(prefix_len));
        1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
    }

    /// Enumerates every address covered, starting from the base address.
    pub fn addresses(&self) -> Addresses {
        Addresses::new(Address::from(self.addr), self.size())
    }
}

impl fmt::Display for NetworkPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len {
            Some(prefix_len) => write!(f, "{}/{}", self.addr, prefix_len),
            None => write!(f, "{}", self.addr),
        }
    }
}

/// A parsed target: a network prefix, a hostname, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    prefix: Option<NetworkPrefix>,
    hostname: Option<String>,
}

impl TargetSpec {
    pub fn host(addr: IpAddr) -> Self {
        Self {
            prefix: Some(NetworkPrefix::single(addr)),
            hostname: None,
        }
    }

    pub fn network(network: IpNetwork) -> Self {
        Self {
            prefix: Some(NetworkPrefix::from_network(network)),
            hostname: None,
        }
    }

    pub fn named(addr: IpAddr, hostname: impl Into<String>) -> Self {
        Self {
            prefix: Some(NetworkPrefix::single(addr)),
            hostname: Some(hostname.into()),
        }
    }

    /// A hostname with no address; the caller is responsible for looking it up.
    pub fn hostname_only(hostname: impl Into<String>) -> Self {
        Self {
            prefix: None,
            hostname: Some(hostname.into()),
        }
    }

    pub fn prefix(&self) -> Option<&NetworkPrefix> {
        self.prefix.as_ref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Addresses covered by the prefix. Empty for hostname-only targets.
    pub fn addresses(&self) -> Addresses {
        match &self.prefix {
            Some(prefix) => prefix.addresses(),
            None => Addresses::empty(),
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, &self.hostname) {
            (Some(prefix), Some(hostname)) => write!(f, "{prefix} ({hostname})"),
            (Some(prefix), None) => write!(f, "{prefix}"),
            (None, Some(hostname)) => write!(f, "{hostname}"),
            (None, None) => write!(f, "<empty>"),
        }
    }
}

/// Resolves a target specification using the system resolver.
pub fn resolve(input: &str) -> Result<TargetSpec, TargetError> {
    resolve_with(input, &SystemLookup)
}

/// Resolves a target specification using the given name lookup.
///
/// Resolution is attempted exactly once; retrying is left to the caller.
pub fn resolve_with<L>(input: &str, lookup: &L) -> Result<TargetSpec, TargetError>
where
    L: NameLookup + ?Sized,
{
    if input.is_empty() {
        return Err(TargetError::Empty);
    }

    let spec: TargetSpec = match (input.find(','), input.find('/')) {
        (None, None) => parse_literal(input, lookup)?,
        (None, Some(_)) => parse_cidr(input)?,
        (Some(_), None) => parse_pair(input)?,
        (Some(_), Some(_)) => return Err(TargetError::Ambiguous(input.to_string())),
    };

    debug!("resolved '{input}' to {spec}");
    Ok(spec)
}

/// Looks up `host` and keeps only the first address returned.
pub fn lookup_first<L>(host: &str, lookup: &L) -> Result<IpAddr, TargetError>
where
    L: NameLookup + ?Sized,
{
    let addrs: Vec<IpAddr> = lookup.lookup(host).map_err(|source| TargetError::Lookup {
        host: host.to_string(),
        source,
    })?;

    addrs
        .into_iter()
        .next()
        .ok_or_else(|| TargetError::NoAddresses(host.to_string()))
}

fn parse_literal<L>(s: &str, lookup: &L) -> Result<TargetSpec, TargetError>
where
    L: NameLookup + ?Sized,
{
    if let Ok(addr) = s.parse::<IpAddr>() {
        return Ok(TargetSpec::host(addr));
    }
    // The system resolver would read these as inet_aton shorthand ("010.0.0.1" is 8.0.0.1).
    if looks_numeric(s) {
        return Err(TargetError::InvalidAddress(s.to_string()));
    }
    let addr: IpAddr = lookup_first(s, lookup)?;
    Ok(TargetSpec::named(addr, s))
}

fn looks_numeric(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn parse_cidr(s: &str) -> Result<TargetSpec, TargetError> {
    let network = s.parse::<IpNetwork>().map_err(|source| TargetError::Cidr {
        input: s.to_string(),
        source,
    })?;
    Ok(TargetSpec::network(network))
}

fn parse_pair(s: &str) -> Result<TargetSpec, TargetError> {
    let parts: Vec<&str> = s.split(',').collect();
    let [addr_str, hostname] = parts.as_slice() else {
        return Err(TargetError::Malformed(s.to_string()));
    };

    let hostname: &str = hostname.trim();
    let addr: Option<IpAddr> = addr_str.parse::<IpAddr>().ok();

    match (addr, hostname.is_empty()) {
        (Some(addr), false) => Ok(TargetSpec::named(addr, hostname)),
        (Some(addr), true) => Ok(TargetSpec::host(addr)),
        (None, false) => Ok(TargetSpec::hostname_only(hostname)),
        (None, true) => Err(TargetError::Malformed(s.to_string())),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
