#![cfg(test)]
use sonde_common::config::Config;
use sonde_common::network::outcome::Outcome;
use sonde_common::network::target::{self, NameLookup, SystemLookup};
use sonde_core::network::tcp::TcpProber;
use sonde_core::scanner::{self, ScanRecord, ScanResult, Summary};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Resolves every name to 127.0.0.1 so the tests never touch DNS.
struct LoopbackLookup;

impl NameLookup for LoopbackLookup {
    fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        Ok(vec![LOCALHOST])
    }
}

/// Accepts connections forever and greets each one.
async fn greeting_server(greeting: &'static [u8]) -> u16 {
    let listener: TcpListener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port: u16 = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut conn, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = conn.write_all(greeting).await;
            });
        }
    });
    port
}

fn config(port: u16) -> Config {
    Config {
        port,
        timeout: Duration::from_millis(500),
        senders: 8,
        read_banner: true,
        max_banner: 64,
        ..Config::default()
    }
}

fn results(records: &[ScanRecord]) -> Vec<&ScanResult> {
    records
        .iter()
        .filter_map(|record| match record {
            ScanRecord::Probed(result) => Some(result),
            ScanRecord::Skipped { .. } => None,
        })
        .collect()
}

#[tokio::test]
async fn scan_loopback_targets_in_every_form() {
    let port: u16 = greeting_server(b"220 ready\r\n").await;
    let cfg: Config = config(port);
    let inputs: Vec<String> = ["127.0.0.1", "127.0.0.1/32", "127.0.0.1, loopback.test", "box.test"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let prober = Arc::new(TcpProber::from_config(&cfg));
    let records = scanner::scan(inputs, prober, Arc::new(LoopbackLookup), &cfg)
        .await
        .unwrap();

    let found: Vec<&ScanResult> = results(&records);
    assert_eq!(found.len(), 4, "records: {records:?}");
    let expected_addr: SocketAddr = SocketAddr::new(LOCALHOST, port);
    for result in &found {
        assert_eq!(result.addr, expected_addr);
        assert_eq!(result.outcome, Outcome::Success, "{result:?}");
        assert_eq!(result.banner.as_deref(), Some(&b"220 ready\r\n"[..]));
    }

    let mut hostnames: Vec<Option<&str>> = found.iter().map(|r| r.hostname.as_deref()).collect();
    hostnames.sort();
    assert_eq!(hostnames, [None, None, Some("box.test"), Some("loopback.test")]);
}

#[tokio::test]
async fn closed_port_and_bad_targets_are_reported_per_target() {
    let listener: TcpListener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port: u16 = listener.local_addr().unwrap().port();
    drop(listener);

    let cfg: Config = Config {
        read_banner: false,
        ..config(port)
    };
    let inputs: Vec<String> = vec!["a,b,c".into(), "127.0.0.1".into(), "127.0.0.1/40".into()];

    let prober = Arc::new(TcpProber::from_config(&cfg));
    let records = scanner::scan(inputs, prober, Arc::new(LoopbackLookup), &cfg)
        .await
        .unwrap();
    let summary: Summary = Summary::from_records(&records);

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.attempts(), 1);
    assert_eq!(summary.count(Outcome::ConnectionTimeout), 1);
}

#[tokio::test]
async fn silent_server_times_out_on_read() {
    let listener: TcpListener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port: u16 = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((conn, _)) = listener.accept().await {
            held.push(conn);
        }
    });

    let cfg: Config = Config {
        timeout: Duration::from_millis(200),
        ..config(port)
    };
    let prober = Arc::new(TcpProber::from_config(&cfg));
    let records = scanner::scan(vec!["127.0.0.1".into()], prober, Arc::new(LoopbackLookup), &cfg)
        .await
        .unwrap();

    let found: Vec<&ScanResult> = results(&records);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].outcome, Outcome::IoTimeout);
    assert!(found[0].error.as_deref().unwrap().starts_with("read "));
}

#[test]
fn system_lookup_resolves_localhost() {
    let spec = target::resolve_with("localhost", &SystemLookup).unwrap();
    let addr: IpAddr = spec.prefix().unwrap().addr;

    assert!(addr.is_loopback(), "{addr}");
    assert_eq!(spec.hostname(), Some("localhost"));
    assert_eq!(spec.addresses().count(), 1);
}
