//! splitsync-sw - drive the offline worker against a live origin
//!
//! ```text
//! splitsync-sw [--config worker.json] <origin> [path | nav:path]...
//! ```
//!
//! Installs and activates a worker with an in-memory cache, then replays
//! each path through it. `nav:` paths are sent as page navigations.

use std::sync::Arc;

use anyhow::{Context, bail};
use splitsync_cache::CacheStorage;
use splitsync_net::{Request, ResourceLoader};
use splitsync_sw::{FetchEvent, Registration, ServiceWorker, WorkerConfig, telemetry};

fn main() -> anyhow::Result<()> {
    telemetry::init("info");

    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    let mut origin = None;
    let mut paths = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = Some(args.next().context("--config needs a path")?),
            _ if origin.is_none() => origin = Some(arg),
            _ => paths.push(arg),
        }
    }

    let mut config = match config_path {
        Some(path) => WorkerConfig::from_file(&path).with_context(|| format!("loading {path}"))?,
        None => WorkerConfig::default(),
    };
    if let Some(origin) = origin {
        config.origin = origin;
    }
    if paths.is_empty() {
        bail!("usage: splitsync-sw [--config worker.json] <origin> [path | nav:path]...");
    }

    let store = Arc::new(CacheStorage::new());
    let fetcher = Arc::new(ResourceLoader::new()?);
    let scope = config.origin_url()?.to_string();
    let worker = ServiceWorker::new(config, store.clone(), fetcher)?;

    smol::block_on(async {
        let mut registration = Registration::new(&scope);
        let update = registration.register(worker).await?;
        println!(
            "installed: {} cached, {} failed",
            update.install.cached.len(),
            update.install.failed.len()
        );
        for failure in &update.install.failed {
            println!("  {} ({})", failure.url, failure.reason);
        }

        let Some(active) = registration.active().cloned() else {
            bail!("worker did not activate");
        };

        for path in &paths {
            let (navigate, path) = match path.strip_prefix("nav:") {
                Some(rest) => (true, rest),
                None => (false, path.as_str()),
            };
            let url = active.config().resolve(path)?;
            let request = if navigate { Request::navigate(url) } else { Request::get(url) };
            let class = active.classify(&request);

            match registration.fetch(FetchEvent::new(request)) {
                None => println!("{path:<32} {class:<13} passthrough"),
                Some(pending) => match pending.await {
                    Ok(served) => println!(
                        "{path:<32} {class:<13} {:?} {}",
                        served.source, served.response.status
                    ),
                    Err(err) => println!("{path:<32} {class:<13} error: {err}"),
                },
            }
        }

        let stats = store.stats();
        println!(
            "cache: {} buckets, {} entries, {} bytes",
            stats.buckets, stats.entries, stats.size_bytes
        );
        Ok(())
    })
}
