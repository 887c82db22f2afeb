use crate::{
    api,
    gate::{DispatchConfig, Dispatcher, GateClient, GatePool},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub gate_list: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the HTTP client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let pool = GatePool::from_spec(args.gate_list.as_deref());

    log_startup_args(&args, &pool);

    let client = GateClient::new()?;
    let dispatcher = Dispatcher::new(pool, Arc::new(client), DispatchConfig::default());

    api::new(args.port, dispatcher).await
}

fn log_startup_args(args: &Args, pool: &GatePool) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("gates", pool.len().to_string()),
        ("gate_list_set", args.gate_list.is_some().to_string()),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", varco_banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn varco_banner() -> String {
    let short_hash = short_commit(crate::GIT_COMMIT_HASH);
    VARCO_BANNER.replace(
        "{VERSION}",
        &format!(" - {} - {}", env!("CARGO_PKG_VERSION"), short_hash),
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

const VARCO_BANNER: &str = r"
 +--+--+--+--+
 |  |  |  |  |
 |  |  |  |  |  V A R C O {VERSION}
 +--+--+--+--+";
