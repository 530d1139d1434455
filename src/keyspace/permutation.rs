//! Keyed permutation of an index space.
//!
//! A linear congruential generator modulo `m = 2^k` visits every residue
//! exactly once per period when the increment is odd and the multiplier is
//! `1 mod 4` (Hull-Dobell). Picking `m` as the smallest power of two at or
//! above `total` and skipping residues `>= total` (cycle walking) yields a
//! bijection on `0..total` whose order depends on the key. At most half of
//! the residues are skipped, so each step costs amortized O(1).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SniperError};

/// Lazily walks a seed-dependent permutation of `0..total`
#[derive(Debug, Clone)]
pub struct KeyedPermutation {
    total: u64,
    mask: u64,
    multiplier: u64,
    increment: u64,
    state: u64,
    emitted: u64,
}

impl KeyedPermutation {
    pub fn new(total: u64, seed: u64) -> Result<Self> {
        if total == 0 {
            return Err(SniperError::config("Cannot permute an empty index space"));
        }

        let modulus = total.checked_next_power_of_two().ok_or_else(|| {
            SniperError::config(format!("Index space of {} is too large to permute", total))
        })?;
        let mask = modulus - 1;

        let mut rng = StdRng::seed_from_u64(seed);
        let multiplier = (rng.gen::<u64>() & !3) | 1;
        let increment = rng.gen::<u64>() | 1;
        let state = rng.gen::<u64>() & mask;

        Ok(Self {
            total,
            mask,
            multiplier,
            increment,
            state,
            emitted: 0,
        })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn step(&mut self) -> u64 {
        let current = self.state;
        self.state = self
            .multiplier
            .wrapping_mul(current)
            .wrapping_add(self.increment)
            & self.mask;
        current
    }
}

impl Iterator for KeyedPermutation {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.emitted >= self.total {
            return None;
        }

        loop {
            let index = self.step();
            if index < self.total {
                self.emitted += 1;
                return Some(index);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.emitted) as usize;
        (remaining, Some(remaining))
    }
}
