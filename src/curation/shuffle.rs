use rand::Rng;

/// Permute `items` in place with the Fisher-Yates algorithm
///
/// Walks from the last index down to 1 and swaps each slot with a uniformly
/// chosen slot at or below it, so every permutation is equally likely given
/// a uniform random source.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Owned variant of [`shuffle`] for call sites holding a `Vec`
#[must_use]
pub fn shuffled<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    shuffle(&mut items, rng);
    items
}
