// src/summary/mod.rs
//! Summary posts: prompt building, the text-generation provider seam and the
//! per-entry in-progress bookkeeping.

pub mod openai;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::state::DashboardState;

pub use openai::OpenAiGenerator;

/// Low-level provider doing the remote call.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn TextGenerator>;

/// Fixed-output provider for tests/local runs. Counts calls.
#[derive(Default)]
pub struct MockGenerator {
    pub fixed: String,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for MockGenerator {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedSummary {
    /// Meant to fit in 280 characters; not enforced.
    pub text: String,
}

pub fn build_prompt(headlines: &[String]) -> String {
    format!(
        "Generate a concise and engaging social media post using the following news article titles:\n\
         {}.\n\
         The post should summarize the theme in a compelling way and fit within 280 characters.",
        headlines.join(", ")
    )
}

/// One prompt, one upstream call, no retry.
#[derive(Clone)]
pub struct SummaryGenerator {
    generator: DynGenerator,
}

impl SummaryGenerator {
    pub fn new(generator: DynGenerator) -> Self {
        Self { generator }
    }

    pub fn provider_name(&self) -> &'static str {
        self.generator.name()
    }

    pub async fn generate_summary(&self, headlines: &[String]) -> Result<String> {
        let headlines: Vec<String> = headlines
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if headlines.is_empty() {
            return Err(DashboardError::Validation(
                "at least one headline is required".into(),
            ));
        }

        counter!("summary_requests_total").increment(1);
        let prompt = build_prompt(&headlines);
        let text = self
            .generator
            .generate(&prompt)
            .await
            .inspect_err(|_| counter!("summary_errors_total").increment(1))?;
        let text = text.trim().to_string();
        if text.is_empty() {
            counter!("summary_errors_total").increment(1);
            return Err(DashboardError::Generation("empty completion".into()));
        }
        Ok(text)
    }
}

/// Position-keyed summaries for the current fetch generation.
#[derive(Debug, Default)]
pub struct SummaryBoard {
    generation: u64,
    texts: HashMap<usize, GeneratedSummary>,
    in_progress: HashSet<usize>,
}

impl SummaryBoard {
    /// New entry list: positions now mean different entries.
    pub fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.texts.clear();
        self.in_progress.clear();
    }

    pub fn begin(&mut self, position: usize, generation: u64) -> Result<()> {
        if generation != self.generation {
            return Err(DashboardError::NotFound(format!(
                "entry {position} belongs to a replaced feed"
            )));
        }
        if !self.in_progress.insert(position) {
            return Err(DashboardError::InFlight(position));
        }
        Ok(())
    }

    /// Stores text on success, keeps the previous text on failure. Results for a
    /// replaced generation are dropped.
    pub fn finish(&mut self, position: usize, generation: u64, result: &Result<String>) {
        if generation != self.generation {
            return;
        }
        self.in_progress.remove(&position);
        if let Ok(text) = result {
            self.texts.insert(position, GeneratedSummary { text: text.clone() });
        }
    }

    pub fn get(&self, position: usize) -> Option<&GeneratedSummary> {
        self.texts.get(&position)
    }

    pub fn is_generating(&self, position: usize) -> bool {
        self.in_progress.contains(&position)
    }
}

/// Clears the in-progress flag even when the request future is dropped
/// before the provider answers.
struct InFlight<'a> {
    state: &'a DashboardState,
    position: usize,
    generation: u64,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, result: &Result<String>) {
        self.finished = true;
        self.state.finish_summary(self.position, self.generation, result);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!(target: "summary", position = self.position, "summary request abandoned");
            let abandoned = Err(DashboardError::Generation("request abandoned".into()));
            self.state.finish_summary(self.position, self.generation, &abandoned);
        }
    }
}

/// Generate the summary for the entry at `position` of the current snapshot.
/// A second request for the same position while one is running fails with
/// `InFlight`; other positions are unaffected.
pub async fn generate_for_entry(
    state: &DashboardState,
    generator: &SummaryGenerator,
    position: usize,
) -> Result<GeneratedSummary> {
    let (entry, generation) = state
        .entry_at(position)
        .ok_or_else(|| DashboardError::NotFound(format!("no entry at position {position}")))?;

    let mut headlines = entry.headline_titles();
    if headlines.is_empty() {
        headlines.push(entry.title.clone());
    }

    state.begin_summary(position, generation)?;
    let guard = InFlight {
        state,
        position,
        generation,
        finished: false,
    };
    let result = generator.generate_summary(&headlines).await;
    guard.finish(&result);

    match &result {
        Ok(_) => tracing::info!(target: "summary", position, provider = generator.provider_name(), "summary generated"),
        Err(e) => tracing::warn!(target: "summary", position, error = %e, "summary generation failed"),
    }
    result.map(|text| GeneratedSummary { text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_joins_headlines() {
        let p = build_prompt(&["One".into(), "Two".into()]);
        assert!(p.contains("One, Two."));
        assert!(p.contains("280 characters"));
    }

    #[tokio::test]
    async fn empty_headlines_never_reach_provider() {
        let mock = Arc::new(MockGenerator::new("x"));
        let gen = SummaryGenerator::new(mock.clone());
        let err = gen.generate_summary(&[]).await.unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
        let err = gen.generate_summary(&["  ".into()]).await.unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn output_is_trimmed() {
        let gen = SummaryGenerator::new(Arc::new(MockGenerator::new("  hello world \n")));
        let out = gen.generate_summary(&["A".into()]).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn board_blocks_same_position_only() {
        let mut board = SummaryBoard::default();
        board.reset(1);
        board.begin(0, 1).unwrap();
        assert!(matches!(board.begin(0, 1), Err(DashboardError::InFlight(0))));
        board.begin(1, 1).unwrap();

        board.finish(0, 1, &Ok("first".into()));
        assert!(!board.is_generating(0));
        assert_eq!(board.get(0).unwrap().text, "first");

        // failure keeps previous text
        board.begin(0, 1).unwrap();
        board.finish(0, 1, &Err(DashboardError::Generation("boom".into())));
        assert_eq!(board.get(0).unwrap().text, "first");
        assert!(!board.is_generating(0));
        assert!(board.is_generating(1));
    }

    #[test]
    fn board_drops_results_from_replaced_generation() {
        let mut board = SummaryBoard::default();
        board.reset(1);
        board.begin(0, 1).unwrap();
        board.reset(2);
        board.finish(0, 1, &Ok("stale".into()));
        assert!(board.get(0).is_none());
        assert!(matches!(board.begin(0, 1), Err(DashboardError::NotFound(_))));
    }

    /// Never answers; stands in for a provider stuck on a slow upstream.
    struct StalledGenerator;

    impl TextGenerator for StalledGenerator {
        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
            Box::pin(std::future::pending())
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn dropped_request_releases_position() {
        let state = DashboardState::new();
        let entry = crate::feed::types::TrendEntry {
            title: "A".into(),
            published_at: None,
            approx_traffic: None,
            related_headlines: vec![],
        };
        let generation = state.publish_entries(Arc::new(vec![entry]), chrono::Utc::now());
        let generator = SummaryGenerator::new(Arc::new(StalledGenerator));

        let task = {
            let state = state.clone();
            tokio::spawn(async move { generate_for_entry(&state, &generator, 0).await })
        };
        for _ in 0..100 {
            if state.snapshot().entries[0].generating_summary {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(state.snapshot().entries[0].generating_summary);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(!state.snapshot().entries[0].generating_summary);
        assert!(state.summary(0).is_none());
        state.begin_summary(0, generation).unwrap();
    }
}
