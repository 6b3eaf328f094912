//! Progress display while resolving images for a catalog

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Items: [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Tracks how many catalog items have been resolved and how many found an image
pub struct ResolveProgress {
    bar: ProgressBar,
    found: usize,
    missing: usize,
}

impl ResolveProgress {
    /// Visible progress bar for `item_count` items
    pub fn new(item_count: usize) -> Self {
        let bar = ProgressBar::new(item_count as u64);
        bar.set_style(PROGRESS_STYLE.clone());
        Self {
            bar,
            found: 0,
            missing: 0,
        }
    }

    /// Progress tracker that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            found: 0,
            missing: 0,
        }
    }

    /// Record one resolved item
    pub fn record(&mut self, found_image: bool) {
        if found_image {
            self.found += 1;
        } else {
            self.missing += 1;
        }
        self.bar.inc(1);
        self.bar
            .set_message(format!("{} found, {} missing", self.found, self.missing));
    }

    /// Items with a valid image so far
    pub const fn found(&self) -> usize {
        self.found
    }

    /// Items that fell back to the placeholder so far
    pub const fn missing(&self) -> usize {
        self.missing
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
