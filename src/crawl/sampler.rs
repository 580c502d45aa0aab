// src/crawl/sampler.rs
// =============================================================================
// Bounds how many links are probed per page.
//
// Large pages (footers, mega-menus) can carry hundreds of links. Checking all
// of them makes a QA run slow, so when a page has more than `max` candidates
// we probe a uniformly random subset of `max`. The RNG is injected so tests
// and reruns can pin the selection with a seed.
// =============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct Sampler<R = StdRng> {
    rng: R,
}

impl Sampler<StdRng> {
    /// Seeded when `seed` is given, otherwise seeded from OS entropy
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl<R: Rng> Sampler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Returns `items` untouched when there are at most `max` of them (or
    /// `max` is 0, meaning unlimited). Otherwise picks `max` distinct items,
    /// kept in their original relative order.
    pub fn sample<T>(&mut self, items: Vec<T>, max: usize) -> Vec<T> {
        if max == 0 || items.len() <= max {
            return items;
        }

        let mut picked = rand::seq::index::sample(&mut self.rng, items.len(), max).into_vec();
        picked.sort_unstable();

        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        picked
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn urls(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("https://example.com/{}", i)).collect()
    }

    #[test]
    fn test_small_input_is_returned_unchanged() {
        let input = urls(10);
        let output = Sampler::new(Some(1)).sample(input.clone(), 30);
        assert_eq!(output, input);
    }

    #[test]
    fn test_large_input_is_cut_to_max_unique_items() {
        let input = urls(50);
        let output = Sampler::new(Some(7)).sample(input.clone(), 30);

        assert_eq!(output.len(), 30);
        let unique: HashSet<_> = output.iter().collect();
        assert_eq!(unique.len(), 30);
        assert!(output.iter().all(|url| input.contains(url)));
    }

    #[test]
    fn test_same_seed_same_selection() {
        let first = Sampler::new(Some(42)).sample(urls(50), 30);
        let second = Sampler::new(Some(42)).sample(urls(50), 30);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_means_unlimited() {
        let output = Sampler::new(None).sample(urls(50), 0);
        assert_eq!(output.len(), 50);
    }

    #[test]
    fn test_injected_rng() {
        let mut sampler = Sampler::with_rng(StdRng::seed_from_u64(3));
        let output = sampler.sample(urls(5), 2);
        assert_eq!(output.len(), 2);
        // Original order is preserved among the picked items
        let positions: Vec<usize> = output
            .iter()
            .map(|url| urls(5).iter().position(|u| u == url).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
