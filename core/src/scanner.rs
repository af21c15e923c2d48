//! The per-target scan loop.
//!
//! Every input line is resolved on its own. A target that fails to resolve
//! is recorded as [`ScanRecord::Skipped`] and the run carries on with the
//! rest; every address a target expands to is probed once and the attempt
//! is recorded with its classified [`Outcome`].

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sonde_common::config::Config;
use sonde_common::network::outcome::{Outcome, ScanError};
use sonde_common::network::target::{self, NameLookup, TargetError, TargetSpec};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Contacts a single address.
///
/// On success returns whatever the peer sent, if the prober reads at all.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, addr: SocketAddr) -> Result<Option<Vec<u8>>, ScanError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// The target line this attempt came from.
    pub input: String,
    pub addr: SocketAddr,
    pub hostname: Option<String>,
    pub outcome: Outcome,
    pub banner: Option<Vec<u8>>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum ScanRecord {
    Probed(ScanResult),
    Skipped { input: String, error: TargetError },
}

impl ScanRecord {
    pub fn input(&self) -> &str {
        match self {
            ScanRecord::Probed(result) => &result.input,
            ScanRecord::Skipped { input, .. } => input,
        }
    }
}

/// Counts of each outcome plus the number of targets that never resolved.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub outcomes: BTreeMap<Outcome, usize>,
    pub skipped: usize,
}

impl Summary {
    pub fn from_records(records: &[ScanRecord]) -> Self {
        let mut summary = Summary::default();
        for record in records {
            match record {
                ScanRecord::Probed(result) => {
                    *summary.outcomes.entry(result.outcome).or_insert(0) += 1;
                }
                ScanRecord::Skipped { .. } => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    pub fn attempts(&self) -> usize {
        self.outcomes.values().sum()
    }
}

/// Scans every target in `inputs` and returns one record per attempt or
/// skipped target, in completion order.
///
/// Targets are resolved concurrently; a lookup that does not finish within
/// `cfg.timeout` skips its target without holding up the others.
pub async fn scan<P, L>(
    inputs: Vec<String>,
    prober: Arc<P>,
    lookup: Arc<L>,
    cfg: &Config,
) -> anyhow::Result<Vec<ScanRecord>>
where
    P: Prober + 'static,
    L: NameLookup + Send + Sync + 'static,
{
    let probe_slots: Arc<Semaphore> = Arc::new(Semaphore::new(cfg.senders));
    let lookup_slots: Arc<Semaphore> = Arc::new(Semaphore::new(cfg.senders));
    let mut lookups: JoinSet<(String, anyhow::Result<Result<TargetSpec, TargetError>>)> =
        JoinSet::new();
    let mut tasks: JoinSet<ScanRecord> = JoinSet::new();
    let mut records: Vec<ScanRecord> = Vec::new();

    for line in inputs {
        let input: String = line.trim().to_string();
        if input.is_empty() {
            continue;
        }

        let lookup: Arc<L> = lookup.clone();
        let slots: Arc<Semaphore> = lookup_slots.clone();
        let limit: Duration = cfg.timeout;
        lookups.spawn(async move {
            let _slot = slots.acquire_owned().await;
            let resolved = resolve_on_blocking_pool(&input, lookup, limit).await;
            (input, resolved)
        });
    }

    while let Some(resolved) = lookups.join_next().await {
        let (input, resolved) = resolved?;
        let spec: TargetSpec = match resolved? {
            Ok(spec) => spec,
            Err(error) => {
                warn!("Skipping target '{input}': {error}");
                records.push(ScanRecord::Skipped { input, error });
                continue;
            }
        };
        debug!("Target '{input}' resolved to {spec}");

        for address in spec.addresses() {
            let permit = probe_slots.clone().acquire_owned().await?;
            let addr: SocketAddr = SocketAddr::new(IpAddr::from(&address), cfg.port);
            let prober: Arc<P> = prober.clone();
            let input: String = input.clone();
            let hostname: Option<String> = spec.hostname().map(str::to_string);

            tasks.spawn(async move {
                let record: ScanRecord = attempt(prober.as_ref(), input, addr, hostname).await;
                drop(permit);
                record
            });

            while let Some(finished) = tasks.try_join_next() {
                records.push(finished?);
            }
        }
    }

    while let Some(finished) = tasks.join_next().await {
        records.push(finished?);
    }

    Ok(records)
}

/// Runs the blocking resolution off the runtime, giving up after `limit`.
///
/// A lookup that times out keeps its blocking thread until the resolver
/// returns; only its result is discarded.
async fn resolve_on_blocking_pool<L>(
    input: &str,
    lookup: Arc<L>,
    limit: Duration,
) -> anyhow::Result<Result<TargetSpec, TargetError>>
where
    L: NameLookup + Send + Sync + 'static,
{
    let query: String = input.to_string();
    let task = tokio::task::spawn_blocking(move || resolve_target(&query, lookup.as_ref()));

    match timeout(limit, task).await {
        Ok(joined) => Ok(joined?),
        Err(_elapsed) => Ok(Err(TargetError::LookupTimedOut {
            host: input.to_string(),
            timeout: limit,
        })),
    }
}

/// Resolves a target, looking up hostname-only pairs as well.
///
/// Only the first address of a lookup is kept.
fn resolve_target<L>(input: &str, lookup: &L) -> Result<TargetSpec, TargetError>
where
    L: NameLookup + ?Sized,
{
    let spec: TargetSpec = target::resolve_with(input, lookup)?;
    if spec.prefix().is_some() {
        return Ok(spec);
    }

    match spec.hostname() {
        Some(hostname) => {
            let addr: IpAddr = target::lookup_first(hostname, lookup)?;
            Ok(TargetSpec::named(addr, hostname))
        }
        None => Ok(spec),
    }
}

async fn attempt<P>(
    prober: &P,
    input: String,
    addr: SocketAddr,
    hostname: Option<String>,
) -> ScanRecord
where
    P: Prober + ?Sized,
{
    let result = prober.probe(addr).await;
    let outcome: Outcome = Outcome::of(&result);
    debug!("{addr}: {outcome}");

    let (banner, error) = match result {
        Ok(banner) => (banner, None),
        Err(e) => (None, Some(e.to_string())),
    };

    ScanRecord::Probed(ScanResult {
        input,
        addr,
        hostname,
        outcome,
        banner,
        error,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
