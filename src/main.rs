use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use trade_journal::config::Config;
use trade_journal::journal::{JournalReport, JsonFileStore, TradeQuery, TradeStore};
use trade_journal::JournalError;

#[tokio::main]
async fn main() -> Result<()> {
    let mut cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    // trade-journal [trades.json] [--json]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let as_json = args.iter().any(|a| a == "--json");
    if let Some(path) = args.iter().find(|a| !a.starts_with("--")) {
        cfg.trades_file = path.clone();
    }

    cfg.validate().context("Scoring configuration is inconsistent")?;

    info!(
        "Journal: {} | currency {} | bucket {} | tz {}",
        cfg.trades_file,
        cfg.currency.map(|c| c.as_str()).unwrap_or("all"),
        cfg.pnl_bucket,
        cfg.timezone
    );

    let store = JsonFileStore::new(&cfg.trades_file);
    let query = TradeQuery {
        currency: cfg.currency,
        timezone: cfg.timezone,
        ..Default::default()
    };
    let trades = match store.load_trades(&query).await {
        Ok(t) => t,
        Err(e) => {
            if let Some(id) = e.downcast_ref::<JournalError>().and_then(|j| j.record_id()) {
                error!("Rejected trade {} while loading", id);
            }
            return Err(e);
        }
    };

    let report = match JournalReport::build(&trades, &cfg) {
        Ok(r) => r,
        Err(e) => {
            if let Some(id) = e.record_id() {
                error!("Rejected trade {}: {}", id, e);
            }
            return Err(e).context("Failed to compute journal analytics");
        }
    };

    if as_json {
        println!("{}", report.to_json()?);
    } else {
        report.print_summary();
    }

    Ok(())
}
