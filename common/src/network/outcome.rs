//! Classification of connection attempts into a fixed set of outcomes.
//!
//! Transport failures are tagged with the socket operation that failed
//! ([`NetOp`]); [`classify`] only looks at that tag. Anything it does not
//! recognise becomes [`Outcome::UnknownError`].

use std::fmt;
use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Terminal status of one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Outcome {
    Success,
    ConnectionTimeout,
    IoTimeout,
    UnknownError,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Success,
        Outcome::ConnectionTimeout,
        Outcome::IoTimeout,
        Outcome::UnknownError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::ConnectionTimeout => "connection-timeout",
            Outcome::IoTimeout => "io-timeout",
            Outcome::UnknownError => "unknown-error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn of<T>(result: &Result<T, ScanError>) -> Outcome {
        classify(result.as_ref().err())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The socket operation a network failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NetOp {
    Dial,
    Read,
    Write,
    Close,
}

impl fmt::Display for NetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb: &str = match self {
            NetOp::Dial => "dial",
            NetOp::Read => "read",
            NetOp::Write => "write",
            NetOp::Close => "close",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Error)]
#[error("{op} {addr}: {source}")]
pub struct NetOpError {
    pub op: NetOp,
    pub addr: SocketAddr,
    #[source]
    pub source: io::Error,
}

impl NetOpError {
    pub fn new(op: NetOp, addr: SocketAddr, source: io::Error) -> Self {
        Self { op, addr, source }
    }

    /// A timeout in `op`, reported as [`io::ErrorKind::TimedOut`].
    pub fn timed_out(op: NetOp, addr: SocketAddr) -> Self {
        let source = io::Error::new(io::ErrorKind::TimedOut, format!("{op} timed out"));
        Self::new(op, addr, source)
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Network(#[from] NetOpError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Maps a failure (or its absence) onto an [`Outcome`]. Never fails.
///
/// A failed dial is always reported as a connection timeout, and a failed
/// read or write as an I/O timeout; refusals and resets are not told apart.
pub fn classify(err: Option<&ScanError>) -> Outcome {
    match err {
        None => Outcome::Success,
        Some(ScanError::Network(net_err)) => match net_err.op {
            NetOp::Dial => Outcome::ConnectionTimeout,
            NetOp::Read | NetOp::Write => Outcome::IoTimeout,
            _ => Outcome::UnknownError,
        },
        Some(ScanError::Other(_)) => Outcome::UnknownError,
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
