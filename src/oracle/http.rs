//! HTTP existence oracle: a HEAD request against a profile URL

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::timeout;

use super::targets::resolve_target;
use super::ExistenceOracle;
use crate::error::{Result, SniperError};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Probes `{base_url}{candidate}` and reports the response status
pub struct HttpOracle {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpOracle {
    /// Create an oracle for a base URL; the candidate is appended verbatim
    pub fn new(base_url: impl Into<String>, timeout: Duration, pool_size: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(pool_size.max(1))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SniperError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Create an oracle for a named target (`github`, ...) or a literal URL
    pub fn for_target(target: &str, timeout: Duration, pool_size: usize) -> Result<Self> {
        let base_url = resolve_target(target).ok_or_else(|| {
            SniperError::config(format!(
                "Unknown target '{}' (use one of {:?} or an http(s) URL)",
                target,
                super::targets::target_names()
            ))
        })?;
        Self::new(base_url, timeout, pool_size)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, candidate: &str) -> String {
        format!("{}{}", self.base_url, candidate)
    }
}

#[async_trait]
impl ExistenceOracle for HttpOracle {
    async fn probe(&self, candidate: &str) -> Result<u16> {
        let url = self.url_for(candidate);
        let timeout_ms = self.timeout.as_millis() as u64;

        let response = timeout(self.timeout, self.client.head(&url).send())
            .await
            .map_err(|_| SniperError::timeout("HEAD probe", timeout_ms))?
            .map_err(|e| {
                if e.is_timeout() {
                    SniperError::timeout("HEAD probe", timeout_ms)
                } else {
                    SniperError::transport(e.to_string(), Some(url.clone()))
                }
            })?;

        let status = response.status().as_u16();
        tracing::debug!(candidate = %candidate, url = %url, status = status, "HEAD probe answered");
        Ok(status)
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_appends_candidate() {
        let oracle = HttpOracle::new("https://github.com/", Duration::from_secs(1), 1).unwrap();
        assert_eq!(oracle.url_for("ab12"), "https://github.com/ab12");
    }

    #[test]
    fn test_unknown_target_is_configuration_error() {
        let err = HttpOracle::for_target("myspace", Duration::from_secs(1), 1)
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }
}
