mod cli;
mod demo;

use std::collections::HashSet;
use std::sync::Arc;

use clap::Parser;
use dispatch_core::{DispatchStore, MatchingEngine, PassOutcome};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, StoreKind};

/// Running totals over the lifetime of the loop.
#[derive(Debug, Default)]
struct LoopStats {
    passes: u64,
    assigned: u64,
    idle: u64,
    failed: u64,
    timed_out: u64,
}

impl LoopStats {
    fn record(&mut self, outcome: &PassOutcome) {
        self.passes += 1;
        match outcome {
            PassOutcome::Assigned(report) => self.assigned += report.pairings.len() as u64,
            PassOutcome::NoContent(_) => self.idle += 1,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut demo_store = None;
    let store: Arc<dyn DispatchStore> = match cli.store {
        StoreKind::Mysql => connect_mysql(&cli).await?,
        StoreKind::Memory => {
            let store = demo::seeded_store(cli.demo_rides, cli.demo_chairs, cli.demo_seed);
            info!(
                rides = cli.demo_rides,
                chairs = cli.demo_chairs,
                seed = cli.demo_seed,
                "seeded in-memory store"
            );
            demo_store = Some(store.clone());
            Arc::new(store)
        }
    };

    let engine = MatchingEngine::from_config(store, cli.dispatch_config());
    let interval = cli.interval();
    let deadline = cli.deadline();
    info!(
        strategy = engine.strategy_name(),
        batch_size = engine.config().batch_size,
        interval_ms = interval.as_millis() as u64,
        deadline_ms = deadline.as_millis() as u64,
        "dispatch loop started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut stats = LoopStats::default();
    let mut finished = HashSet::new();
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            _ = ticker.tick() => {}
        }

        // A pass that outlives its deadline is dropped, which rolls its transaction back.
        match tokio::time::timeout(deadline, engine.run_pass(None)).await {
            Ok(Ok(outcome)) => stats.record(&outcome),
            Ok(Err(err)) => {
                stats.passes += 1;
                stats.failed += 1;
                error!(error = %err, "matching pass failed");
            }
            Err(_) => {
                stats.passes += 1;
                stats.timed_out += 1;
                warn!(deadline_ms = deadline.as_millis() as u64, "matching pass abandoned at deadline");
            }
        }

        if let Some(store) = &demo_store {
            demo::finish_assigned_rides(store, &mut finished);
        }
        if cli.passes.is_some_and(|limit| stats.passes >= limit) {
            break;
        }
    }

    info!(
        passes = stats.passes,
        assigned = stats.assigned,
        idle = stats.idle,
        failed = stats.failed,
        timed_out = stats.timed_out,
        "dispatch loop stopped"
    );
    Ok(())
}

#[cfg(feature = "mysql")]
async fn connect_mysql(cli: &Cli) -> anyhow::Result<Arc<dyn DispatchStore>> {
    use anyhow::Context;

    let store = dispatch_core::store::MySqlStore::connect(&cli.database_url, cli.max_connections)
        .await
        .context("failed to connect to dispatch database")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mysql"))]
async fn connect_mysql(_cli: &Cli) -> anyhow::Result<Arc<dyn DispatchStore>> {
    anyhow::bail!("built without the `mysql` feature; run with --store memory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::DispatchConfig;

    #[tokio::test]
    async fn demo_store_drains_through_repeated_passes() {
        let store = demo::seeded_store(10, 4, 7);
        let engine = MatchingEngine::from_config(Arc::new(store.clone()), DispatchConfig::default());
        let mut finished = HashSet::new();
        let mut stats = LoopStats::default();

        for _ in 0..20 {
            let outcome = engine.run_pass(None).await.expect("pass");
            stats.record(&outcome);
            demo::finish_assigned_rides(&store, &mut finished);
        }

        assert_eq!(stats.passes, 20);
        assert_eq!(stats.failed, 0);
        assert!(stats.assigned <= 10);
        assert_eq!(finished.len() as u64, stats.assigned);
        let assigned_in_store = store.rides().iter().filter(|r| r.chair_id.is_some()).count();
        assert_eq!(assigned_in_store as u64, stats.assigned);
    }
}
