// src/state.rs
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engagement::{EngagementMap, EngagementStats};
use crate::error::Result;
use crate::feed::types::TrendEntry;
use crate::summary::SummaryBoard;

struct Inner {
    entries: Arc<Vec<TrendEntry>>,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
    loading: bool,
    generation: u64,
    engagement: Arc<EngagementMap>,
    summaries: SummaryBoard,
}

/// Shared dashboard data. Entry list and engagement map are only ever swapped
/// wholesale; summaries change one position at a time.
#[derive(Clone)]
pub struct DashboardState {
    inner: Arc<RwLock<Inner>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                entries: Arc::new(Vec::new()),
                last_updated: None,
                last_error: None,
                loading: true,
                generation: 0,
                engagement: Arc::new(EngagementMap::new()),
                summaries: SummaryBoard::default(),
            })),
        }
    }

    // A panic while holding the lock cannot leave a half-written snapshot
    // (every write is a field swap), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Install a freshly fetched entry set. Returns the new fetch generation.
    pub fn publish_entries(&self, entries: Arc<Vec<TrendEntry>>, now: DateTime<Utc>) -> u64 {
        let mut g = self.write();
        g.generation += 1;
        g.entries = entries;
        g.last_updated = Some(now);
        g.last_error = None;
        g.loading = false;
        let generation = g.generation;
        g.summaries.reset(generation);
        generation
    }

    pub fn record_fetch_error(&self, message: String) {
        self.write().last_error = Some(message);
    }

    pub fn replace_engagement(&self, map: EngagementMap) {
        self.write().engagement = Arc::new(map);
    }

    pub fn entries(&self) -> Arc<Vec<TrendEntry>> {
        self.read().entries.clone()
    }

    pub fn entry_at(&self, position: usize) -> Option<(TrendEntry, u64)> {
        let g = self.read();
        g.entries.get(position).map(|e| (e.clone(), g.generation))
    }

    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.read().last_updated
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn engagement(&self) -> Arc<EngagementMap> {
        self.read().engagement.clone()
    }

    pub fn summary(&self, position: usize) -> Option<String> {
        self.read().summaries.get(position).map(|s| s.text.clone())
    }

    pub fn begin_summary(&self, position: usize, generation: u64) -> Result<()> {
        self.write().summaries.begin(position, generation)
    }

    pub fn finish_summary(&self, position: usize, generation: u64, result: &Result<String>) {
        self.write().summaries.finish(position, generation, result);
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let g = self.read();
        let entries = g
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| EntryView {
                position,
                entry: entry.clone(),
                engagement: g.engagement.get(&entry.title).cloned().unwrap_or_default(),
                summary: g.summaries.get(position).map(|s| s.text.clone()),
                generating_summary: g.summaries.is_generating(position),
            })
            .collect();
        DashboardSnapshot {
            loading: g.loading,
            last_updated: g.last_updated,
            last_error: g.last_error.clone(),
            generation: g.generation,
            entries,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub position: usize,
    #[serde(flatten)]
    pub entry: TrendEntry,
    pub engagement: EngagementStats,
    pub summary: Option<String>,
    pub generating_summary: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// True until the first successful fetch.
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub generation: u64,
    pub entries: Vec<EntryView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> TrendEntry {
        TrendEntry {
            title: title.into(),
            published_at: None,
            approx_traffic: None,
            related_headlines: vec![],
        }
    }

    #[test]
    fn failed_fetch_keeps_previous_snapshot() {
        let st = DashboardState::new();
        assert!(st.is_loading());

        let now = Utc::now();
        st.publish_entries(Arc::new(vec![entry("A")]), now);
        st.record_fetch_error("proxy down".into());

        let snap = st.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.last_updated, Some(now));
        assert_eq!(snap.entries.len(), 1);
        assert_eq!(snap.last_error.as_deref(), Some("proxy down"));
    }

    #[test]
    fn snapshot_joins_engagement_by_title() {
        let st = DashboardState::new();
        st.publish_entries(Arc::new(vec![entry("A"), entry("B")]), Utc::now());
        let mut map = EngagementMap::new();
        map.insert(
            "B".into(),
            EngagementStats {
                likes: 4,
                ..Default::default()
            },
        );
        st.replace_engagement(map);

        let snap = st.snapshot();
        assert_eq!(snap.entries[0].engagement, EngagementStats::default());
        assert_eq!(snap.entries[1].engagement.likes, 4);
    }

    #[test]
    fn new_fetch_clears_summaries() {
        let st = DashboardState::new();
        let gen1 = st.publish_entries(Arc::new(vec![entry("A")]), Utc::now());
        st.begin_summary(0, gen1).unwrap();
        st.finish_summary(0, gen1, &Ok("text".into()));
        assert_eq!(st.summary(0).as_deref(), Some("text"));

        let gen2 = st.publish_entries(Arc::new(vec![entry("B")]), Utc::now());
        assert_eq!(gen2, gen1 + 1);
        assert!(st.summary(0).is_none());
    }
}
