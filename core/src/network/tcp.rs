use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use sonde_common::config::Config;
use sonde_common::network::outcome::{NetOp, NetOpError, ScanError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::scanner::Prober;

/// Plain TCP connect probe with an optional payload and banner read.
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
    payload: Option<Vec<u8>>,
    max_banner: Option<usize>,
}

impl TcpProber {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            timeout: cfg.timeout,
            payload: cfg.payload.clone(),
            max_banner: cfg.read_banner.then_some(cfg.max_banner),
        }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, addr: SocketAddr) -> Result<Option<Vec<u8>>, ScanError> {
        let mut stream: TcpStream = dial(addr, self.timeout).await?;

        if let Some(payload) = &self.payload {
            write_payload(&mut stream, addr, payload, self.timeout).await?;
        }

        match self.max_banner {
            Some(max_banner) => {
                let banner = read_banner(&mut stream, addr, max_banner, self.timeout).await?;
                Ok(Some(banner))
            }
            None => Ok(None),
        }
    }
}

async fn dial(addr: SocketAddr, limit: Duration) -> Result<TcpStream, NetOpError> {
    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(NetOpError::new(NetOp::Dial, addr, e)),
        Err(_elapsed) => Err(NetOpError::timed_out(NetOp::Dial, addr)),
    }
}

async fn write_payload(
    stream: &mut TcpStream,
    addr: SocketAddr,
    payload: &[u8],
    limit: Duration,
) -> Result<(), NetOpError> {
    match timeout(limit, stream.write_all(payload)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(NetOpError::new(NetOp::Write, addr, e)),
        Err(_elapsed) => Err(NetOpError::timed_out(NetOp::Write, addr)),
    }
}

/// Reads whatever the peer sends first, up to `max_banner` bytes.
async fn read_banner(
    stream: &mut TcpStream,
    addr: SocketAddr,
    max_banner: usize,
    limit: Duration,
) -> Result<Vec<u8>, NetOpError> {
    let mut buf: Vec<u8> = vec![0; max_banner];
    match timeout(limit, stream.read(&mut buf)).await {
        Ok(Ok(n)) => {
            buf.truncate(n);
            Ok(buf)
        }
        Ok(Err(e)) => Err(NetOpError::new(NetOp::Read, addr, e)),
        Err(_elapsed) => Err(NetOpError::timed_out(NetOp::Read, addr)),
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
