use sonde_common::network::target::{self, TargetSpec};

use crate::terminal::print;

const KEY_WIDTH: usize = 9;

pub async fn resolve(input: String, limit: usize) -> anyhow::Result<()> {
    let spec: TargetSpec = tokio::task::spawn_blocking(move || target::resolve(&input)).await??;

    match spec.prefix() {
        Some(prefix) => {
            print::aligned_line("Prefix", prefix, KEY_WIDTH);
            print::aligned_line("Addresses", prefix.size(), KEY_WIDTH);
        }
        None => print::aligned_line("Prefix", "none (looked up at scan time)", KEY_WIDTH),
    }
    print::aligned_line("Hostname", spec.hostname().unwrap_or("none"), KEY_WIDTH);

    for (idx, address) in spec.addresses().take(limit).enumerate() {
        print::tree_head(idx, &address.to_ip().to_string());
    }

    Ok(())
}
