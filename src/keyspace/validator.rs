//! Keyspace validation utilities

use crate::error::{Result, SniperError};
use regex::Regex;
use std::collections::HashSet;

/// Validates the parameters that define a keyspace
pub struct KeyspaceValidator {
    path_safe: Regex,
}

impl KeyspaceValidator {
    /// Create a new keyspace validator
    pub fn new() -> Result<Self> {
        // Candidates end up in a URL path, so stick to unreserved characters
        let path_safe = Regex::new(r"^[A-Za-z0-9._-]*$")
            .map_err(|e| SniperError::internal(e.to_string()))?;

        Ok(Self { path_safe })
    }

    /// Validate the alphabet and return it as an ordered list of characters
    pub fn validate_alphabet(&self, alphabet: &str) -> Result<Vec<char>> {
        if alphabet.is_empty() {
            return Err(SniperError::config("Alphabet cannot be empty"));
        }

        if !self.path_safe.is_match(alphabet) {
            return Err(SniperError::config(format!(
                "Alphabet '{}' contains characters outside [A-Za-z0-9._-]",
                alphabet
            )));
        }

        let mut seen = HashSet::new();
        let mut chars = Vec::with_capacity(alphabet.len());
        for c in alphabet.chars() {
            if !seen.insert(c) {
                return Err(SniperError::config(format!(
                    "Alphabet contains duplicate character '{}'",
                    c
                )));
            }
            chars.push(c);
        }

        Ok(chars)
    }

    /// Validate the suffix appended to every candidate
    pub fn validate_suffix(&self, suffix: &str) -> Result<()> {
        if !self.path_safe.is_match(suffix) {
            return Err(SniperError::config(format!(
                "Suffix '{}' contains characters outside [A-Za-z0-9._-]",
                suffix
            )));
        }

        Ok(())
    }

    /// Compute `radix^length`, failing when it does not fit in `u64`
    pub fn total_size(&self, radix: usize, length: usize) -> Result<u64> {
        if length == 0 {
            return Err(SniperError::config("Candidate length must be a positive integer"));
        }

        u32::try_from(length)
            .ok()
            .and_then(|exp| (radix as u64).checked_pow(exp))
            .ok_or_else(|| {
                SniperError::config(format!(
                    "Keyspace of {} characters at length {} is too large to enumerate",
                    radix, length
                ))
            })
    }
}
