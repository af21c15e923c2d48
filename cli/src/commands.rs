pub mod resolve;
pub mod scan;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use sonde_common::config::Config;

#[derive(Parser)]
#[command(name = "sonde")]
#[command(about = "Resolve scan targets and classify TCP connection outcomes.")]
pub struct CommandLine {
    /// Less output: -q hides per-address lines, -qq also hides skipped-target warnings
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every address the given targets expand to
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Show how a target specification is interpreted
    #[command(alias = "r")]
    Resolve {
        target: String,
        /// How many expanded addresses to list
        #[arg(short, long, default_value_t = 16)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// <ip>, <hostname>, <ip>/<prefix> or "<ip>,<hostname>"
    pub targets: Vec<String>,

    /// Read one target per line from a file ("-" for stdin)
    #[arg(short = 'f', long)]
    pub input_file: Option<PathBuf>,

    #[arg(short, long, default_value_t = 80)]
    pub port: u16,

    /// Per-operation timeout in milliseconds
    #[arg(short, long = "timeout", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Maximum concurrent connection attempts
    #[arg(short, long, default_value_t = 1000)]
    pub senders: usize,

    /// Data to send after connecting; understands \r, \n, \t and \\
    #[arg(long)]
    pub send: Option<String>,

    /// Read the first bytes the peer sends
    #[arg(short, long)]
    pub banner: bool,

    #[arg(long, default_value_t = 1024)]
    pub max_banner: usize,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl ScanArgs {
    pub fn to_config(&self, quiet: u8) -> Config {
        Config {
            port: self.port,
            timeout: Duration::from_millis(self.timeout_ms),
            senders: self.senders,
            payload: self.send.as_deref().map(unescape),
            read_banner: self.banner,
            max_banner: self.max_banner,
            quiet,
        }
    }
}

fn unescape(s: &str) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        let c: char = match c {
            '\\' => match chars.next() {
                Some('r') => '\r',
                Some('n') => '\n',
                Some('t') => '\t',
                Some('\\') | None => '\\',
                Some(other) => {
                    out.push(b'\\');
                    other
                }
            },
            c => c,
        };
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    out
}
