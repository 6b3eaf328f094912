//! Coalescing, memoizing validation of image candidates
//!
//! Every URL is physically probed at most once per cache lifetime. Callers
//! asking about a URL whose probe is still running wait on the same outcome
//! instead of starting another load.

use crate::catalog::item::CatalogItem;
use crate::imagery::candidates::{FieldPriorityTable, ImageCandidate, extract_candidates};
use crate::imagery::filter::ReferenceFilter;
use crate::imagery::loader::ImageLoader;
use crate::io::configuration::{
    DEFAULT_MAX_CANDIDATES, DEFAULT_MIN_DIMENSION, DEFAULT_PROBE_TIMEOUT_MS, STATS_URL_PREFIX_LEN,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Probe limits applied to every load attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Time allowed for one load before it counts as failed
    pub timeout_ms: u64,
    /// Smallest accepted width and height in pixels
    pub min_dimension: u32,
    /// Candidates tried per item
    pub max_candidates: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            min_dimension: DEFAULT_MIN_DIMENSION,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// One cached validation result as shown in diagnostics
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheEntrySummary {
    /// URL truncated for display
    pub url: String,
    /// Whether the image loaded with acceptable dimensions
    pub valid: bool,
}

/// Snapshot of the resolver's cache state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    /// Number of memoized URLs
    pub cache_size: usize,
    /// Number of probes still in flight
    pub pending_probes: usize,
    /// Probe calls answered from the cache
    pub hits: usize,
    /// Probe calls that started a load
    pub misses: usize,
    /// Probe calls that joined a load already in flight
    pub coalesced: usize,
    /// Cached entries sorted by URL
    pub entries: Vec<CacheEntrySummary>,
}

/// Image chosen for one catalog item
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedImage {
    /// Item identifier, if it has one
    pub id: Option<String>,
    /// First loadable candidate, `None` when the caller should use its fallback
    pub image: Option<ImageCandidate>,
}

type Outcome = watch::Receiver<Option<bool>>;

#[derive(Default)]
struct ProbeTable {
    results: HashMap<String, bool>,
    pending: HashMap<String, Outcome>,
    // Bumped by clear() so probes started earlier cannot write into the new cache
    generation: u64,
    hits: usize,
    misses: usize,
    coalesced: usize,
}

fn lock(table: &Mutex<ProbeTable>) -> MutexGuard<'_, ProbeTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

enum ProbeSlot {
    Cached(bool),
    Waiting(Outcome),
}

/// Settles a probe exactly once, whichever way its task ends
///
/// Dropping the guard removes the pending entry and wakes every waiter. Only
/// a probe that ran to completion writes its outcome into the result cache;
/// a task that is aborted or panics answers its waiters with `false` but
/// leaves the URL unprobed so the next caller loads it again.
struct SettleGuard {
    table: Arc<Mutex<ProbeTable>>,
    url: String,
    generation: u64,
    sender: watch::Sender<Option<bool>>,
    outcome: Option<bool>,
}

impl SettleGuard {
    fn finish(mut self, valid: bool) {
        self.outcome = Some(valid);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        {
            let mut table = lock(&self.table);
            if table.generation == self.generation {
                table.pending.remove(&self.url);
                if let Some(valid) = self.outcome {
                    table.results.insert(self.url.clone(), valid);
                }
            }
        }
        self.sender.send_replace(Some(self.outcome.unwrap_or(false)));
    }
}

/// Finds the first loadable image of a catalog item
///
/// Owns the result cache and the pending-probe table for its whole lifetime.
/// Construct one per scope that should share results; tests create isolated
/// instances and call [`ImageCandidateResolver::clear`] between cases.
///
/// Probes run on spawned tokio tasks, so every method that probes must be
/// awaited inside a tokio runtime.
pub struct ImageCandidateResolver {
    loader: Arc<dyn ImageLoader>,
    filter: ReferenceFilter,
    config: ProbeConfig,
    table: Arc<Mutex<ProbeTable>>,
}

impl ImageCandidateResolver {
    /// Resolver with the default filter and probe limits
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        Self::with_config(loader, ReferenceFilter::default(), ProbeConfig::default())
    }

    /// Resolver with explicit filter and probe limits
    pub fn with_config(
        loader: Arc<dyn ImageLoader>,
        filter: ReferenceFilter,
        config: ProbeConfig,
    ) -> Self {
        Self {
            loader,
            filter,
            config,
            table: Arc::new(Mutex::new(ProbeTable::default())),
        }
    }

    /// Active probe limits
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Reference pre-filter used during extraction
    pub const fn filter(&self) -> &ReferenceFilter {
        &self.filter
    }

    /// Candidates of `item` in probe order, using this resolver's filter
    pub fn extract_candidates(
        &self,
        item: &CatalogItem,
        table: &FieldPriorityTable,
    ) -> Vec<ImageCandidate> {
        extract_candidates(item, table, &self.filter)
    }

    /// Whether `url` loads as an image of acceptable size
    ///
    /// Answers from the cache when possible and otherwise joins or starts the
    /// single in-flight probe for `url`. Load errors, undersized images and
    /// timeouts all yield `false`; this never fails.
    pub async fn probe(&self, url: &str) -> bool {
        match self.claim(url) {
            ProbeSlot::Cached(valid) => valid,
            ProbeSlot::Waiting(mut outcome) => match outcome.wait_for(Option::is_some).await {
                Ok(settled) => {
                    let settled = *settled;
                    settled.unwrap_or(false)
                }
                Err(_closed) => false,
            },
        }
    }

    fn claim(&self, url: &str) -> ProbeSlot {
        let mut table = lock(&self.table);

        let cached = table.results.get(url).copied();
        if let Some(valid) = cached {
            table.hits += 1;
            debug!(url, valid, "probe answered from cache");
            return ProbeSlot::Cached(valid);
        }

        let in_flight = table.pending.get(url).cloned();
        if let Some(outcome) = in_flight {
            table.coalesced += 1;
            debug!(url, "joining in-flight probe");
            return ProbeSlot::Waiting(outcome);
        }

        table.misses += 1;
        let (sender, outcome) = watch::channel(None);
        table.pending.insert(url.to_owned(), outcome.clone());

        let settle = SettleGuard {
            table: Arc::clone(&self.table),
            url: url.to_owned(),
            generation: table.generation,
            sender,
            outcome: None,
        };
        drop(table);

        // Detached so the probe completes even if every caller stops waiting
        drop(tokio::spawn(run_probe(
            Arc::clone(&self.loader),
            self.config,
            settle,
        )));

        ProbeSlot::Waiting(outcome)
    }

    /// First candidate of `item` that probes valid
    ///
    /// At most `max_candidates` candidates are tried, strictly one after the
    /// other in priority order, so lower-priority references are never loaded
    /// once a hit is found.
    pub async fn resolve_first_valid(
        &self,
        item: &CatalogItem,
        table: &FieldPriorityTable,
        max_candidates: usize,
    ) -> Option<ImageCandidate> {
        let item_id = item.id().unwrap_or_default();
        let candidates = self.extract_candidates(item, table);

        for candidate in candidates.into_iter().take(max_candidates) {
            if self.probe(&candidate.url).await {
                info!(
                    item = %item_id,
                    url = %candidate.url,
                    source = %candidate.source,
                    "resolved image"
                );
                return Some(candidate);
            }
        }

        info!(item = %item_id, "no valid image");
        None
    }

    /// Resolve every item in order using the configured candidate limit
    ///
    /// Items sharing a URL reuse the cached result instead of probing again.
    pub async fn resolve_catalog(
        &self,
        items: &[CatalogItem],
        table: &FieldPriorityTable,
    ) -> Vec<ResolvedImage> {
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            let image = self
                .resolve_first_valid(item, table, self.config.max_candidates)
                .await;
            resolved.push(ResolvedImage {
                id: item.id(),
                image,
            });
        }
        resolved
    }

    /// Cached result for `url`, if it has been probed
    pub fn cached(&self, url: &str) -> Option<bool> {
        lock(&self.table).results.get(url).copied()
    }

    /// Forget all results and in-flight probes
    ///
    /// Probes still running finish normally for their current waiters but no
    /// longer write into the cache.
    pub fn clear(&self) {
        let mut table = lock(&self.table);
        table.results.clear();
        table.pending.clear();
        table.generation += 1;
        table.hits = 0;
        table.misses = 0;
        table.coalesced = 0;
    }

    /// Cache sizes, counters and a truncated view of cached entries
    pub fn stats(&self) -> ResolverStats {
        let table = lock(&self.table);

        let mut entries: Vec<CacheEntrySummary> = table
            .results
            .iter()
            .map(|(url, &valid)| CacheEntrySummary {
                url: url_prefix(url),
                valid,
            })
            .collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));

        ResolverStats {
            cache_size: table.results.len(),
            pending_probes: table.pending.len(),
            hits: table.hits,
            misses: table.misses,
            coalesced: table.coalesced,
            entries,
        }
    }
}

async fn run_probe(loader: Arc<dyn ImageLoader>, config: ProbeConfig, settle: SettleGuard) {
    let timeout = Duration::from_millis(config.timeout_ms);
    let url = settle.url.clone();

    let valid = match tokio::time::timeout(timeout, loader.load(&url)).await {
        Ok(Ok(dimensions)) => {
            let valid = dimensions.is_at_least(config.min_dimension);
            if !valid {
                debug!(
                    url = %url,
                    width = dimensions.width,
                    height = dimensions.height,
                    "image rejected as placeholder"
                );
            }
            valid
        }
        Ok(Err(err)) => {
            warn!(url = %url, error = %err, "image probe failed");
            false
        }
        Err(_elapsed) => {
            warn!(
                url = %url,
                timeout_ms = config.timeout_ms,
                "image probe timed out"
            );
            false
        }
    };

    settle.finish(valid);
}

fn url_prefix(url: &str) -> String {
    let mut chars = url.chars();
    let prefix: String = chars.by_ref().take(STATS_URL_PREFIX_LEN).collect();
    if chars.next().is_some() {
        format!("{prefix}...")
    } else {
        prefix
    }
}
