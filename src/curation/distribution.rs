use crate::catalog::item::{Categorized, category_of};
use crate::curation::shuffle::shuffle;
use crate::io::configuration::{DEFAULT_MAX_CONSECUTIVE, DEFAULT_SWITCH_PROBABILITY};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Parameters controlling how eagerly the feed changes category
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Maximum number of same-category items placed back to back
    pub max_consecutive: usize,
    /// Probability of switching away from the current category before the limit
    pub switch_probability: f64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            max_consecutive: DEFAULT_MAX_CONSECUTIVE,
            switch_probability: DEFAULT_SWITCH_PROBABILITY,
        }
    }
}

impl DistributionConfig {
    /// Limit clamped to at least one
    pub fn effective_max_consecutive(&self) -> usize {
        self.max_consecutive.max(1)
    }

    /// Switch probability clamped into `[0, 1]`, with NaN treated as zero
    pub fn effective_switch_probability(&self) -> f64 {
        if self.switch_probability.is_nan() {
            0.0
        } else {
            self.switch_probability.clamp(0.0, 1.0)
        }
    }
}

/// Order `items` so no category runs longer than `max_consecutive`
///
/// Uses the default switch probability. See [`distribute_with_config`].
pub fn distribute_with_category_limit<T: Categorized, R: Rng + ?Sized>(
    items: Vec<T>,
    max_consecutive: usize,
    rng: &mut R,
) -> Vec<T> {
    let config = DistributionConfig {
        max_consecutive,
        ..DistributionConfig::default()
    };
    distribute_with_config(items, &config, rng)
}

/// Order `items` so no category runs longer than the configured limit
///
/// Items are grouped by category and each group is shuffled, then slots are
/// filled one at a time by picking uniformly among categories that still have
/// items. The current category is dropped from the pick set once its run hits
/// the limit, and with `switch_probability` before that. When the current
/// category is the only one left the limit is relaxed so that every item is
/// still placed.
///
/// Total: never drops or duplicates an item and never fails.
pub fn distribute_with_config<T: Categorized, R: Rng + ?Sized>(
    mut items: Vec<T>,
    config: &DistributionConfig,
    rng: &mut R,
) -> Vec<T> {
    let max_consecutive = config.effective_max_consecutive();
    let switch_probability = config.effective_switch_probability();

    if items.len() <= max_consecutive {
        shuffle(&mut items, rng);
        return items;
    }

    let total = items.len();

    // BTreeMap keeps key order stable so a seeded rng reproduces the same feed
    let mut groups: BTreeMap<String, VecDeque<T>> = BTreeMap::new();
    for item in items {
        let key = category_of(&item).to_owned();
        groups.entry(key).or_default().push_back(item);
    }

    let mut queues: Vec<(String, VecDeque<T>)> = Vec::with_capacity(groups.len());
    for (category, mut queue) in groups {
        shuffle(queue.make_contiguous(), rng);
        queues.push((category, queue));
    }
    shuffle(&mut queues, rng);

    let mut result = Vec::with_capacity(total);
    let mut available: Vec<usize> = Vec::with_capacity(queues.len());
    let mut last: Option<usize> = None;
    let mut consecutive = 0_usize;
    let mut relaxations = 0_usize;

    while result.len() < total {
        available.clear();
        available.extend(non_empty_queues(&queues));

        if let Some(last_index) = last {
            let must_switch = consecutive >= max_consecutive;
            let last_has_items = available.contains(&last_index);
            let prefer_switch =
                !must_switch && last_has_items && rng.random_bool(switch_probability);

            if must_switch || prefer_switch {
                available.retain(|&index| index != last_index);
            }
        }

        if available.is_empty() {
            relaxations += 1;
            available.extend(non_empty_queues(&queues));
        }

        if available.is_empty() {
            break;
        }

        let choice = rng.random_range(0..available.len());
        let Some(&picked) = available.get(choice) else {
            break;
        };
        let Some(item) = queues.get_mut(picked).and_then(|(_, queue)| queue.pop_front()) else {
            break;
        };
        result.push(item);

        if last == Some(picked) {
            consecutive += 1;
        } else {
            last = Some(picked);
            consecutive = 1;
        }
    }

    if relaxations > 0 {
        debug!(
            relaxations,
            max_consecutive, "category limit relaxed, one category left"
        );
    }

    result
}

fn non_empty_queues<T>(queues: &[(String, VecDeque<T>)]) -> impl Iterator<Item = usize> + '_ {
    queues
        .iter()
        .enumerate()
        .filter(|(_, (_, queue))| !queue.is_empty())
        .map(|(index, _)| index)
}

/// Length of the longest run of same-category items
pub fn longest_category_run<T: Categorized>(items: &[T]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<&str> = None;

    for item in items {
        let category = category_of(item);
        if previous == Some(category) {
            current += 1;
        } else {
            previous = Some(category);
            current = 1;
        }
        longest = longest.max(current);
    }

    longest
}

/// Stateful feed orderer owning its configuration and random source
///
/// Seed it for reproducible layouts in tests and previews; use
/// [`FeedDistributor::new`] for a fresh ordering on every run.
pub struct FeedDistributor {
    config: DistributionConfig,
    rng: StdRng,
}

impl Default for FeedDistributor {
    fn default() -> Self {
        Self::new(DistributionConfig::default())
    }
}

impl FeedDistributor {
    /// Distributor seeded from operating system entropy
    pub fn new(config: DistributionConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Distributor with a fixed seed for reproducible output
    pub fn seeded(config: DistributionConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Active configuration
    pub const fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Uniformly permute `items` without any category constraint
    pub fn shuffle<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        shuffle(&mut items, &mut self.rng);
        items
    }

    /// Category-limited ordering of `items`
    pub fn distribute<T: Categorized>(&mut self, items: Vec<T>) -> Vec<T> {
        distribute_with_config(items, &self.config, &mut self.rng)
    }
}
