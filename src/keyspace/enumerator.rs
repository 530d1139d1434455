//! Candidate enumerator with a no-repeat, bounded-termination guarantee

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::permutation::KeyedPermutation;
use super::Keyspace;
use crate::error::{Result, SniperError};

/// Consecutive rejected draws tolerated before the random order falls back
/// to walking forward to the nearest unissued index.
pub const DEFAULT_MAX_REJECTIONS: u32 = 64;

/// Order in which the keyspace is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumerationOrder {
    /// Mixed-radix counter, `aaaa`, `aaab`, ...
    #[default]
    Sequential,
    /// Seeded permutation of the index space
    Shuffled,
    /// Uniform draws rejected against the issued set
    Random,
}

impl std::fmt::Display for EnumerationOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumerationOrder::Sequential => write!(f, "sequential"),
            EnumerationOrder::Shuffled => write!(f, "shuffled"),
            EnumerationOrder::Random => write!(f, "random"),
        }
    }
}

impl std::str::FromStr for EnumerationOrder {
    type Err = SniperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" | "seq" => Ok(EnumerationOrder::Sequential),
            "shuffled" | "shuffle" => Ok(EnumerationOrder::Shuffled),
            "random" => Ok(EnumerationOrder::Random),
            other => Err(SniperError::config(format!(
                "Unknown enumeration order '{}' (expected sequential, shuffled or random)",
                other
            ))),
        }
    }
}

/// Unified strategy wrapper
enum Strategy {
    Sequential {
        cursor: u64,
    },
    Shuffled(KeyedPermutation),
    Random {
        rng: StdRng,
        issued_set: HashSet<u64>,
        draws: u64,
        max_rejections: u32,
    },
}

/// Issues every candidate of a keyspace exactly once.
///
/// `next()` never returns a candidate twice and returns `None` after exactly
/// `total_size` issuances, whatever the order.
pub struct Enumerator {
    keyspace: Keyspace,
    order: EnumerationOrder,
    strategy: Strategy,
    issued: u64,
}

impl Enumerator {
    /// Sequential enumerator
    pub fn new(keyspace: Keyspace) -> Self {
        Self {
            keyspace,
            order: EnumerationOrder::Sequential,
            strategy: Strategy::Sequential { cursor: 0 },
            issued: 0,
        }
    }

    /// Enumerator for the given order; `seed` only matters for the shuffled
    /// and random orders and is drawn from the thread RNG when absent.
    pub fn with_order(keyspace: Keyspace, order: EnumerationOrder, seed: Option<u64>) -> Result<Self> {
        let seed = seed.unwrap_or_else(rand::random);

        let strategy = match order {
            EnumerationOrder::Sequential => Strategy::Sequential { cursor: 0 },
            EnumerationOrder::Shuffled => {
                Strategy::Shuffled(KeyedPermutation::new(keyspace.total_size(), seed)?)
            }
            EnumerationOrder::Random => Strategy::Random {
                rng: StdRng::seed_from_u64(seed),
                issued_set: HashSet::new(),
                draws: 0,
                max_rejections: DEFAULT_MAX_REJECTIONS,
            },
        };

        Ok(Self {
            keyspace,
            order,
            strategy,
            issued: 0,
        })
    }

    /// Override the rejection budget of the random order (minimum 1)
    pub fn with_max_rejections(mut self, limit: u32) -> Self {
        if let Strategy::Random { max_rejections, .. } = &mut self.strategy {
            *max_rejections = limit.max(1);
        }
        self
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub fn order(&self) -> EnumerationOrder {
        self.order
    }

    /// Size of the issued set
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn total(&self) -> u64 {
        self.keyspace.total_size()
    }

    pub fn remaining(&self) -> u64 {
        self.total().saturating_sub(self.issued)
    }

    pub fn is_exhausted(&self) -> bool {
        self.issued >= self.total()
    }

    /// Number of index draws made so far; exceeds `issued()` only for the
    /// random order, where it counts rejected draws too.
    pub fn draws(&self) -> u64 {
        match &self.strategy {
            Strategy::Random { draws, .. } => *draws,
            _ => self.issued,
        }
    }

    pub fn progress_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            100.0
        } else {
            (self.issued as f64 / total as f64) * 100.0
        }
    }

    fn next_index(&mut self) -> Option<u64> {
        let total = self.keyspace.total_size();

        match &mut self.strategy {
            Strategy::Sequential { cursor } => {
                let index = *cursor;
                *cursor += 1;
                Some(index)
            }
            Strategy::Shuffled(permutation) => permutation.next(),
            Strategy::Random {
                rng,
                issued_set,
                draws,
                max_rejections,
            } => {
                let mut rejections = 0;
                loop {
                    let index = rng.gen_range(0..total);
                    *draws += 1;
                    if issued_set.insert(index) {
                        return Some(index);
                    }

                    rejections += 1;
                    if rejections >= *max_rejections {
                        // Not exhausted, so an unissued index exists
                        let mut probe = index;
                        loop {
                            probe = (probe + 1) % total;
                            if issued_set.insert(probe) {
                                return Some(probe);
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Iterator for Enumerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.is_exhausted() {
            return None;
        }

        let index = self.next_index()?;
        self.issued += 1;
        self.keyspace.candidate_at(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl std::fmt::Debug for Enumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enumerator")
            .field("order", &self.order)
            .field("issued", &self.issued)
            .field("total", &self.total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyspace::Charset;
    use std::collections::BTreeSet;

    fn ab2() -> Keyspace {
        Keyspace::new("ab", 2, "").unwrap()
    }

    fn expected_ab2() -> BTreeSet<String> {
        ["aa", "ab", "ba", "bb"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sequential_order() {
        let issued: Vec<String> = Enumerator::new(ab2()).collect();
        assert_eq!(issued, vec!["aa", "ab", "ba", "bb"]);
    }

    #[test]
    fn test_every_order_covers_keyspace_once() {
        for order in [
            EnumerationOrder::Sequential,
            EnumerationOrder::Shuffled,
            EnumerationOrder::Random,
        ] {
            let mut enumerator = Enumerator::with_order(ab2(), order, Some(3)).unwrap();
            let issued: Vec<String> = enumerator.by_ref().collect();
            assert_eq!(issued.len(), 4, "order {}", order);

            let unique: BTreeSet<String> = issued.into_iter().collect();
            assert_eq!(unique, expected_ab2(), "order {}", order);
            assert!(enumerator.is_exhausted());
            assert_eq!(enumerator.next(), None);
        }
    }

    #[test]
    fn test_shuffled_full_coverage_with_suffix() {
        let ks = Keyspace::from_charset(Charset::Alphanumeric, 2, "x").unwrap();
        let issued: Vec<String> = Enumerator::with_order(ks, EnumerationOrder::Shuffled, Some(11))
            .unwrap()
            .collect();
        assert_eq!(issued.len(), 36 * 36);

        let unique: BTreeSet<&String> = issued.iter().collect();
        assert_eq!(unique.len(), 36 * 36);
        assert!(issued.iter().all(|c| c.len() == 3 && c.ends_with('x')));
    }

    #[test]
    fn test_random_issued_set_strictly_grows() {
        let ks = Keyspace::new("abc", 1, "").unwrap();
        let mut enumerator = Enumerator::with_order(ks, EnumerationOrder::Random, Some(5)).unwrap();

        let mut last = enumerator.issued();
        while let Some(_) = enumerator.next() {
            assert_eq!(enumerator.issued(), last + 1);
            last = enumerator.issued();
        }
        assert_eq!(enumerator.issued(), 3);
        assert!(enumerator.is_exhausted());
    }

    #[test]
    fn test_random_draws_are_bounded() {
        // Each issuance costs at most max_rejections draws before the forward walk
        let ks = Keyspace::new("abcdefgh", 2, "").unwrap();
        let total = ks.total_size();
        let mut enumerator = Enumerator::with_order(ks, EnumerationOrder::Random, Some(17))
            .unwrap()
            .with_max_rejections(4);

        let issued: BTreeSet<String> = enumerator.by_ref().collect();
        assert_eq!(issued.len() as u64, total);
        assert!(enumerator.draws() >= total);
        assert!(enumerator.draws() <= total * 4);
    }

    #[test]
    fn test_progress() {
        let mut enumerator = Enumerator::new(ab2());
        enumerator.next();
        enumerator.next();
        assert_eq!(enumerator.progress_percent(), 50.0);
        assert_eq!(enumerator.remaining(), 2);
    }

    #[test]
    fn test_order_parsing() {
        assert_eq!("shuffled".parse::<EnumerationOrder>().unwrap(), EnumerationOrder::Shuffled);
        assert_eq!(" Random ".parse::<EnumerationOrder>().unwrap(), EnumerationOrder::Random);
        assert!("zigzag".parse::<EnumerationOrder>().is_err());
    }
}
