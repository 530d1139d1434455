//! Keyspace definition and candidate enumeration
//!
//! A keyspace is every string of exactly `length` characters drawn from an
//! alphabet, each with a fixed suffix appended. Candidates are addressed by
//! their mixed-radix index in `0..total_size`, which lets every enumeration
//! order share one decoder.

mod enumerator;
mod permutation;
mod validator;

pub use enumerator::{EnumerationOrder, Enumerator, DEFAULT_MAX_REJECTIONS};
pub use permutation::KeyedPermutation;
pub use validator::KeyspaceValidator;

use crate::error::Result;

/// Character set for candidate generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// Only lowercase letters (a-z)
    Letters,
    /// Letters and digits (a-z, 0-9)
    #[default]
    Alphanumeric,
}

impl Charset {
    pub fn from_digits(include_digits: bool) -> Self {
        if include_digits {
            Charset::Alphanumeric
        } else {
            Charset::Letters
        }
    }

    pub fn chars(&self) -> &'static [char] {
        match self {
            Charset::Letters => &[
                'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
                'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
            ],
            Charset::Alphanumeric => &[
                'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
                'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
                '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
            ],
        }
    }

    pub fn as_alphabet(&self) -> String {
        self.chars().iter().collect()
    }
}

/// Fixed-length candidate space over an alphabet, with an optional suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    alphabet: Vec<char>,
    length: usize,
    suffix: String,
    total: u64,
}

impl Keyspace {
    /// Build a keyspace, rejecting empty or duplicated alphabets, zero length
    /// and sizes that do not fit in `u64`.
    pub fn new(alphabet: &str, length: usize, suffix: &str) -> Result<Self> {
        let validator = KeyspaceValidator::new()?;
        let alphabet = validator.validate_alphabet(alphabet)?;
        validator.validate_suffix(suffix)?;
        let total = validator.total_size(alphabet.len(), length)?;

        Ok(Self {
            alphabet,
            length,
            suffix: suffix.to_string(),
            total,
        })
    }

    pub fn from_charset(charset: Charset, length: usize, suffix: &str) -> Result<Self> {
        Self::new(&charset.as_alphabet(), length, suffix)
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// `|alphabet|^length`, fixed for the lifetime of the keyspace
    pub fn total_size(&self) -> u64 {
        self.total
    }

    /// Decode the candidate at `index`; position 0 is the most significant digit
    pub fn candidate_at(&self, index: u64) -> Option<String> {
        if index >= self.total {
            return None;
        }

        let base = self.alphabet.len() as u64;
        let mut digits = vec![self.alphabet[0]; self.length];
        let mut n = index;

        for slot in digits.iter_mut().rev() {
            *slot = self.alphabet[(n % base) as usize];
            n /= base;
        }

        let mut candidate = String::with_capacity(self.length + self.suffix.len());
        candidate.extend(digits);
        candidate.push_str(&self.suffix);
        Some(candidate)
    }
}
