//! Fixed-interval polling of the portfolio and risk endpoints.

use crate::api_client::SnapshotSource;
use crate::model::DatasetKind;
use crate::sync::{Inbound, SyncHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Datasets refreshed on every tick; exposure is fetched on demand only
pub const POLLED_DATASETS: [DatasetKind; 2] = [DatasetKind::Portfolio, DatasetKind::Risk];

/// Spawn a single fetch of `kind`; the result is delivered to `sync`.
///
/// Failures are logged and dropped. There is no retry: the next scheduled
/// tick or navigation is the next attempt.
pub fn spawn_fetch(source: Arc<dyn SnapshotSource>, kind: DatasetKind, sync: SyncHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        match source.fetch(kind).await {
            Ok(snapshot) => {
                debug!(%kind, "Fetch completed");
                sync.send(Inbound::Pulled(snapshot));
            }
            Err(e) => warn!(%kind, error = %e, "Fetch failed"),
        }
    })
}

/// Issues portfolio and risk fetches immediately, then once per interval
pub struct PollScheduler {
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    sync: SyncHandle,
}

impl PollScheduler {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(30_000);

    pub fn new(source: Arc<dyn SnapshotSource>, interval: Duration, sync: SyncHandle) -> Self {
        Self {
            source,
            // tokio::time::interval rejects a zero period
            interval: interval.max(Duration::from_millis(1)),
            sync,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            debug!(interval_ms = self.interval.as_millis() as u64, "Poll tick");
            // Each dataset gets its own task so a slow endpoint never delays the other
            for kind in POLLED_DATASETS {
                spawn_fetch(Arc::clone(&self.source), kind, self.sync.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MonitorError, Result};
    use crate::model::{PortfolioSnapshot, RiskSnapshot, Snapshot};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct RecordingSource {
        calls: Mutex<HashMap<DatasetKind, Vec<Instant>>>,
        portfolio_latency: Duration,
        fail_risk: bool,
    }

    impl RecordingSource {
        fn calls(&self, kind: DatasetKind) -> Vec<Instant> {
            self.calls.lock().unwrap().get(&kind).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl SnapshotSource for RecordingSource {
        async fn fetch(&self, kind: DatasetKind) -> Result<Snapshot> {
            self.calls.lock().unwrap().entry(kind).or_default().push(Instant::now());
            match kind {
                DatasetKind::Portfolio => {
                    tokio::time::sleep(self.portfolio_latency).await;
                    Ok(Snapshot::Portfolio(PortfolioSnapshot {
                        total_pv: 0.0,
                        trade_count: 0,
                        trades: vec![],
                    }))
                }
                DatasetKind::Risk if self.fail_risk => Err(MonitorError::network("risk offline")),
                DatasetKind::Risk => Ok(Snapshot::Risk(RiskSnapshot::default())),
                DatasetKind::Exposure => Err(MonitorError::network("not polled")),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_fetch_then_every_interval() {
        let source = Arc::new(RecordingSource::default());
        let (sync, mut inbound) = SyncHandle::channel();
        let start = Instant::now();
        let task = PollScheduler::new(source.clone(), PollScheduler::DEFAULT_INTERVAL, sync).spawn();

        tokio::time::sleep(Duration::from_secs(61)).await;
        task.abort();

        let offsets: Vec<_> = source
            .calls(DatasetKind::Portfolio)
            .iter()
            .map(|t| t.duration_since(start))
            .collect();
        assert_eq!(
            offsets,
            vec![Duration::ZERO, Duration::from_secs(30), Duration::from_secs(60)]
        );
        assert_eq!(source.calls(DatasetKind::Risk).len(), 3);
        assert!(source.calls(DatasetKind::Exposure).is_empty());

        let mut delivered = 0;
        while inbound.try_recv().is_ok() {
            delivered += 1;
        }
        assert_eq!(delivered, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_portfolio_does_not_delay_risk() {
        let source = Arc::new(RecordingSource {
            portfolio_latency: Duration::from_secs(100),
            ..RecordingSource::default()
        });
        let (sync, mut inbound) = SyncHandle::channel();
        let task = PollScheduler::new(source.clone(), Duration::from_secs(30), sync).spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        match inbound.try_recv() {
            Ok(Inbound::Pulled(snapshot)) => assert_eq!(snapshot.kind(), DatasetKind::Risk),
            other => panic!("expected risk snapshot first, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_secs(60)).await;
        task.abort();
        assert_eq!(source.calls(DatasetKind::Risk).len(), 3);
        assert_eq!(source.calls(DatasetKind::Portfolio).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_dropped_without_retry() {
        let source = Arc::new(RecordingSource {
            fail_risk: true,
            ..RecordingSource::default()
        });
        let (sync, mut inbound) = SyncHandle::channel();
        let task = PollScheduler::new(source.clone(), Duration::from_secs(30), sync).spawn();

        tokio::time::sleep(Duration::from_secs(29)).await;
        task.abort();

        assert_eq!(source.calls(DatasetKind::Risk).len(), 1);
        let mut kinds = Vec::new();
        while let Ok(Inbound::Pulled(snapshot)) = inbound.try_recv() {
            kinds.push(snapshot.kind());
        }
        assert_eq!(kinds, vec![DatasetKind::Portfolio]);
    }
}
