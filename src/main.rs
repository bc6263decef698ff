//! Connectivity smoke check for the store adapter.
//!
//! Drives insert, read, scan, update, and delete against a live server and
//! reports each step. Workload generation and measurement stay with the
//! external benchmark harness; this binary only proves the adapter's wiring.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::info;

use redis_bench_adapter::{AdapterConfig, AdapterError, FieldMap, StoreAdapter};

#[derive(Parser, Debug)]
#[command(name = "redis-bench-adapter")]
#[command(about = "Smoke-check the benchmark store adapter against a live server")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 6379)]
    port: u16,

    #[arg(long)]
    password: Option<String>,

    #[arg(long, default_value_t = false, help = "use the cluster-aware connection")]
    cluster: bool,

    #[arg(long, help = "connect/response timeout in milliseconds")]
    timeout: Option<u64>,

    #[arg(long, help = "base path for the binary operation log")]
    logfile: Option<PathBuf>,

    #[arg(long, default_value_t = 5, help = "number of records to exercise")]
    records: usize,

    #[arg(long, default_value_t = 100, help = "size of generated field values in bytes")]
    value_size: usize,
}

fn random_record(value_size: usize) -> FieldMap {
    let mut rng = rand::thread_rng();
    (0..3)
        .map(|i| {
            let value: Vec<u8> = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(value_size)
                .collect();
            (format!("field{i}"), value)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = AdapterConfig {
        host: args.host,
        port: args.port,
        password: args.password,
        cluster: args.cluster,
        timeout_ms: args.timeout,
        datalog_path: args.logfile,
    };
    let adapter = StoreAdapter::connect(&config)
        .await
        .context("startup aborted")?;
    info!(
        host = %config.host,
        port = config.port,
        cluster = config.cluster,
        "connected"
    );

    const TABLE: &str = "usertable";
    let records: HashMap<String, FieldMap> = (0..args.records)
        .map(|i| (format!("smoke{i}"), random_record(args.value_size)))
        .collect();

    for (key, fields) in &records {
        adapter.insert(TABLE, key, fields).await?;
    }
    info!(count = records.len(), "insert ok");

    for (key, fields) in &records {
        let read_back = adapter.read(TABLE, key, None).await?;
        if &read_back != fields {
            bail!("read of {key} does not match inserted fields");
        }
    }
    info!(count = records.len(), "read ok");

    let scanned = adapter.scan(TABLE, "smoke0", args.records, None).await?;
    info!(resolved = scanned.len(), "scan ok");

    let (first_key, _) = records.iter().next().context("no records generated")?;
    let updated = random_record(args.value_size);
    adapter.update(TABLE, first_key, &updated).await?;
    let read_back = adapter.read(TABLE, first_key, None).await?;
    if read_back != updated {
        bail!("read of {first_key} does not reflect the update");
    }
    info!(key = %first_key, "update ok");

    for key in records.keys() {
        adapter.delete(TABLE, key).await?;
    }
    match adapter.delete(TABLE, first_key).await {
        Err(AdapterError::DeleteMiss { .. }) => {}
        Ok(()) => bail!("second delete of {first_key} unexpectedly succeeded"),
        Err(e) => return Err(e.into()),
    }
    info!(count = records.len(), "delete ok");

    adapter.close()?;
    info!("smoke check passed");
    Ok(())
}
