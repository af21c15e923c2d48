use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use sonde_common::config::Config;
use sonde_common::network::outcome::Outcome;
use sonde_common::network::target::SystemLookup;
use sonde_core::network::tcp::TcpProber;
use sonde_core::scanner::{self, ScanRecord, ScanResult, Summary};
use tracing::info;

use crate::commands::ScanArgs;
use crate::sprint;
use crate::terminal::{colors, print};

const BANNER_PREVIEW: usize = 48;

pub async fn scan(args: ScanArgs, cfg: &Config) -> anyhow::Result<()> {
    let inputs: Vec<String> = collect_targets(&args.targets, args.input_file.as_deref())?;
    if inputs.is_empty() {
        anyhow::bail!("no targets given; pass them as arguments or with --input-file");
    }
    info!("Scanning {} target(s) on port {}", inputs.len(), cfg.port);

    let prober: Arc<TcpProber> = Arc::new(TcpProber::from_config(cfg));
    let start_time: Instant = Instant::now();
    let mut records: Vec<ScanRecord> = scanner::scan(inputs, prober, Arc::new(SystemLookup), cfg).await?;

    scan_ends(&mut records, start_time.elapsed(), cfg);
    Ok(())
}

/// Targets from the command line first, then from the input file.
fn collect_targets(args: &[String], input_file: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let mut targets: Vec<String> = args.to_vec();

    let Some(path) = input_file else {
        return Ok(targets);
    };

    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Box::new(BufReader::new(file))
    };

    for line in reader.lines() {
        let line: String = line.with_context(|| format!("reading {}", path.display()))?;
        if !line.trim().is_empty() {
            targets.push(line);
        }
    }
    Ok(targets)
}

fn scan_ends(records: &mut [ScanRecord], total_time: Duration, cfg: &Config) {
    records.sort_by_key(|record| match record {
        ScanRecord::Probed(result) => Some(result.addr),
        ScanRecord::Skipped { .. } => None,
    });

    if cfg.quiet == 0 {
        print::header("Results", cfg.quiet);
        let probed = records.iter().filter_map(|record| match record {
            ScanRecord::Probed(result) => Some(result),
            ScanRecord::Skipped { .. } => None,
        });
        for (idx, result) in probed.enumerate() {
            print_result(idx, result);
        }
    }

    print_summary(&Summary::from_records(records), total_time, cfg);
}

fn print_result(idx: usize, result: &ScanResult) {
    let addr: ColoredString = match result.addr.ip() {
        IpAddr::V4(_) => result.addr.to_string().color(colors::IPV4_ADDR),
        IpAddr::V6(_) => result.addr.to_string().color(colors::IPV6_ADDR),
    };
    let name: String = match &result.hostname {
        Some(hostname) => format!("{} ({})", addr, hostname.color(colors::HOSTNAME)),
        None => addr.to_string(),
    };
    print::tree_head(idx, &name);

    let mut line: String = format!("{}", outcome_colored(result.outcome));
    if let Some(error) = &result.error {
        line = format!("{line} {}", error.color(colors::SEPARATOR));
    }
    if let Some(banner) = &result.banner {
        line = format!("{line} {}", banner_preview(banner));
    }
    print::print_status(line);
}

fn print_summary(summary: &Summary, total_time: Duration, cfg: &Config) {
    if cfg.quiet == 0 {
        sprint!();
    }
    print::fat_separator();

    let key_width: usize = Outcome::ALL
        .iter()
        .map(|outcome| outcome.as_str().len())
        .max()
        .unwrap_or(0);
    for outcome in Outcome::ALL {
        print::aligned_line(outcome.as_str(), summary.count(outcome), key_width);
    }
    print::aligned_line("skipped", summary.skipped, key_width);

    let attempts: ColoredString = format!("{} attempts", summary.attempts()).bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString =
        format!("Scan Complete: {attempts} in {total_time}").color(colors::TEXT_DEFAULT);
    print::centerln(&output.to_string());
}

fn outcome_colored(outcome: Outcome) -> ColoredString {
    let color: Color = match outcome {
        Outcome::ConnectionTimeout | Outcome::IoTimeout => colors::OUTCOME_TIMEOUT,
        _ if outcome.is_success() => colors::OUTCOME_SUCCESS,
        _ => colors::OUTCOME_ERROR,
    };
    outcome.as_str().color(color).bold()
}

fn banner_preview(banner: &[u8]) -> String {
    let text: String = String::from_utf8_lossy(banner).escape_debug().collect();
    match text.char_indices().nth(BANNER_PREVIEW) {
        Some((cut, _)) => format!("\"{}…\"", &text[..cut]),
        None => format!("\"{text}\""),
    }
}
