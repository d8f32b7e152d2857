//! Built-in controller runtime.
//!
//! # Responsibilities
//! - Refresh API discovery every `discovery_interval`
//! - Issue a relist generation every `cache_flush_interval`
//! - Run `workers` sync workers that pick up relist generations
//! - Throttle warnings per object through the event correlator
//!
//! # Design Decisions
//! - All tasks share one cancellation token; stop cancels then joins every task
//! - Every request a refresh issues draws from the client's shared limiter
//! - Relist generations travel over a `watch` channel so slow workers only
//!   ever see the latest one

use std::sync::Arc;
use std::time::Duration;

use kube::discovery::Discovery;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::controller::catalog::ResourceCatalog;
use crate::controller::events::EventCorrelator;
use crate::controller::{Controller, ControllerOptions, StopError, StopHandle, SubsystemStartError};
use crate::observability::metrics;

/// Controller that keeps discovery and cache generations fresh.
#[derive(Debug, Clone, Default)]
pub struct ControllerRuntime {
    catalog: Arc<ResourceCatalog>,
}

impl ControllerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource kinds from the most recent discovery refresh.
    pub fn catalog(&self) -> Arc<ResourceCatalog> {
        self.catalog.clone()
    }
}

impl Controller for ControllerRuntime {
    async fn start(&self, options: ControllerOptions) -> Result<StopHandle, SubsystemStartError> {
        let client = options.client.connect()?;

        let cancel = CancellationToken::new();
        let correlator = Arc::new(EventCorrelator::new(options.events));
        let (relist_tx, relist_rx) = watch::channel(0u64);
        let mut tasks = JoinSet::new();

        tasks.spawn(discovery_loop(
            client,
            self.catalog.clone(),
            correlator,
            options.discovery_interval,
            cancel.clone(),
        ));
        tasks.spawn(cache_flush_loop(
            relist_tx,
            options.cache_flush_interval,
            cancel.clone(),
        ));
        for id in 0..options.workers {
            tasks.spawn(sync_worker(
                id,
                relist_rx.clone(),
                self.catalog.clone(),
                cancel.clone(),
            ));
        }

        tracing::info!(
            workers = options.workers,
            discovery_interval = ?options.discovery_interval,
            cache_flush_interval = ?options.cache_flush_interval,
            "Controller runtime started"
        );

        Ok(StopHandle::new(move || async move {
            cancel.cancel();
            let mut panicked = 0usize;
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    if e.is_panic() {
                        tracing::error!(error = %e, "Controller task panicked");
                        panicked += 1;
                    }
                }
            }
            tracing::info!("Controller runtime stopped");

            if panicked > 0 {
                return Err(StopError(format!("{panicked} controller task(s) panicked").into()));
            }
            Ok(())
        }))
    }
}

async fn discovery_loop(
    client: kube::Client,
    catalog: Arc<ResourceCatalog>,
    correlator: Arc<EventCorrelator>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = Discovery::new(client.clone()).run() => result,
        };

        match result {
            Ok(discovery) => {
                let count = catalog.update_from(&discovery);
                metrics::record_discovery(true, Some(count));
                tracing::debug!(resources = count, "Discovery cache refreshed");
            }
            Err(e) => {
                metrics::record_discovery(false, None);
                if correlator.allow("discovery") {
                    tracing::warn!(error = %e, "Failed to refresh discovery cache");
                }
            }
        }
    }

    tracing::debug!("Discovery loop exiting");
}

async fn cache_flush_loop(
    relist: watch::Sender<u64>,
    period: Duration,
    cancel: CancellationToken,
) {
    // The first generation is the initial list; flushes start one period later.
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                relist.send_modify(|generation| *generation += 1);
                metrics::record_cache_flush();
                tracing::info!(generation = *relist.borrow(), "Flushing object caches for relist");
            }
        }
    }

    tracing::debug!("Cache flush loop exiting");
}

async fn sync_worker(
    id: usize,
    mut relist: watch::Receiver<u64>,
    catalog: Arc<ResourceCatalog>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = relist.changed() => {
                if changed.is_err() {
                    break;
                }
                let generation = *relist.borrow_and_update();
                tracing::debug!(
                    worker = id,
                    generation,
                    resources = catalog.len(),
                    "Worker picked up relist generation"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientHandle;
    use crate::config::{CredentialsSource, RateLimit};

    fn options(workers: usize) -> ControllerOptions {
        // Nothing listens here; discovery fails and is retried next period.
        let config = kube::Config::new("http://127.0.0.1:9".parse().unwrap());
        ControllerOptions {
            client: ClientHandle::new(config, CredentialsSource::Ambient, RateLimit::new(100.0, 10)),
            discovery_interval: Duration::from_millis(20),
            cache_flush_interval: Duration::from_millis(20),
            workers,
            events: RateLimit::new(1.0, 1),
        }
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let runtime = ControllerRuntime::new();
        let stop = runtime.start(options(3)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        let stopped = tokio::time::timeout(Duration::from_secs(5), stop.stop()).await;
        assert!(matches!(stopped, Ok(Ok(()))));
        assert!(runtime.catalog().is_empty());
    }

    #[tokio::test]
    async fn test_worker_exits_on_cancel() {
        let (tx, rx) = watch::channel(0u64);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(sync_worker(
            0,
            rx.clone(),
            Arc::new(ResourceCatalog::default()),
            cancel.clone(),
        ));

        tx.send_modify(|g| *g += 1);
        tx.send_modify(|g| *g += 1);
        assert_eq!(*tx.borrow(), 2);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_cache_flush_bumps_generation() {
        let (tx, mut rx) = watch::channel(0u64);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(cache_flush_loop(tx, Duration::from_millis(10), cancel.clone()));

        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(*rx.borrow() >= 1);

        cancel.cancel();
        task.await.unwrap();
    }
}
