// src/scheduler.rs
//! Refresh scheduler: a fetch task on a fixed interval and an enrichment task,
//! connected by a watch channel that carries the latest successfully fetched
//! entry set. A second watch channel carries cancellation.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engagement::Enricher;
use crate::feed::types::TrendEntry;
use crate::feed::FeedFetcher;
use crate::state::DashboardState;

#[derive(Clone, Copy, Debug)]
pub struct RefreshSchedulerCfg {
    pub interval: Duration,
}

impl Default for RefreshSchedulerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

type EntrySet = Option<Arc<Vec<TrendEntry>>>;

/// Owns both tasks. Dropping the handle counts as cancellation.
pub struct SchedulerHandle {
    cancel_tx: watch::Sender<bool>,
    fetch_task: JoinHandle<()>,
    enrich_task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops the fetch timer; no further enrichment pass starts. A pass already
    /// running finishes but its result is dropped. Safe to call repeatedly.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Wait for both tasks to exit (call `cancel` first).
    pub async fn join(self) {
        let SchedulerHandle {
            cancel_tx,
            fetch_task,
            enrich_task,
        } = self;
        if let Err(e) = fetch_task.await {
            tracing::warn!(target: "scheduler", error = %e, "fetch task ended abnormally");
        }
        if let Err(e) = enrich_task.await {
            tracing::warn!(target: "scheduler", error = %e, "enrich task ended abnormally");
        }
        drop(cancel_tx);
    }
}

/// Fetch immediately, then every `cfg.interval`; every successful fetch
/// triggers one enrichment pass over the new set. If several fetches land
/// while a pass is running, only the newest set is enriched next.
pub fn spawn_refresh_scheduler(
    cfg: RefreshSchedulerCfg,
    fetcher: FeedFetcher,
    enricher: Enricher,
    state: DashboardState,
) -> SchedulerHandle {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (entries_tx, entries_rx) = watch::channel::<EntrySet>(None);

    let fetch_task = tokio::spawn(run_fetch_loop(
        cfg,
        fetcher,
        state.clone(),
        entries_tx,
        cancel_rx.clone(),
    ));
    let enrich_task = tokio::spawn(run_enrich_loop(enricher, state, entries_rx, cancel_rx));

    SchedulerHandle {
        cancel_tx,
        fetch_task,
        enrich_task,
    }
}

async fn run_fetch_loop(
    cfg: RefreshSchedulerCfg,
    fetcher: FeedFetcher,
    state: DashboardState,
    entries_tx: watch::Sender<EntrySet>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(cfg.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *cancel.borrow() {
            break;
        }
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            _ = ticker.tick() => {}
        }

        // Dropping an unfinished refresh leaves the state untouched.
        let fetched = tokio::select! {
            biased;
            _ = cancel.changed() => break,
            fetched = fetcher.refresh(&state) => fetched,
        };

        if let Some(entries) = fetched {
            if entries_tx.send(Some(entries)).is_err() {
                break;
            }
        }
    }
    tracing::info!(target: "scheduler", "fetch loop stopped");
}

async fn run_enrich_loop(
    enricher: Enricher,
    state: DashboardState,
    mut entries_rx: watch::Receiver<EntrySet>,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        if *cancel.borrow() {
            break;
        }
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            changed = entries_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        if *cancel.borrow() {
            break;
        }

        let Some(entries) = entries_rx.borrow_and_update().clone() else {
            continue;
        };
        if entries.is_empty() {
            continue;
        }

        let map = enricher.enrich(&entries).await;

        if *cancel.borrow() {
            counter!("enrich_pass_discarded_total").increment(1);
            tracing::info!(target: "scheduler", "enrichment pass finished after cancel; result discarded");
            break;
        }
        tracing::info!(target: "scheduler", titles = map.len(), "enrichment pass published");
        state.replace_engagement(map);
    }
    tracing::info!(target: "scheduler", "enrich loop stopped");
}
