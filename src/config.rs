//! Run configuration: defaults, `SNIPER_*` environment variables and
//! command-line flags, in increasing order of precedence.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config_error;
use crate::error::{Result, SniperError};
use crate::keyspace::{Charset, EnumerationOrder, Enumerator, Keyspace};
use crate::scheduler::SchedulerConfig;
use crate::sink::SinkFormat;
use crate::throttle::{FixedDelay, RandomDelay, Throttle, TokenBucket};

/// Everything a run needs, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub length: usize,
    pub include_digits: bool,
    /// Explicit alphabet; overrides `include_digits` when set
    pub alphabet: Option<String>,
    pub suffix: String,
    pub concurrency: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Global probes per second; replaces the random delay when set
    pub rate_per_sec: Option<f64>,
    pub probe_timeout_ms: u64,
    pub order: EnumerationOrder,
    pub seed: Option<u64>,
    pub target: String,
    pub output: PathBuf,
    pub format: SinkFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            length: 4,
            include_digits: true,
            alphabet: None,
            suffix: String::new(),
            concurrency: 1,
            min_delay_ms: 500,
            max_delay_ms: 1500,
            rate_per_sec: None,
            probe_timeout_ms: 10_000,
            order: EnumerationOrder::Sequential,
            seed: None,
            target: "github".to_string(),
            output: PathBuf::from("results.txt"),
            format: SinkFormat::Text,
        }
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| config_error!("Invalid value '{}' for {}", raw, name))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(config_error!("Invalid boolean '{}' for {}", raw, name)),
    }
}

impl RunConfig {
    /// Defaults overlaid with `SNIPER_*` variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with variables from an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("SNIPER_LENGTH") {
            config.length = parse_value("SNIPER_LENGTH", &v)?;
        }
        if let Some(v) = lookup("SNIPER_DIGITS") {
            config.include_digits = parse_bool("SNIPER_DIGITS", &v)?;
        }
        if let Some(v) = lookup("SNIPER_ALPHABET") {
            config.alphabet = Some(v);
        }
        if let Some(v) = lookup("SNIPER_SUFFIX") {
            config.suffix = v;
        }
        if let Some(v) = lookup("SNIPER_CONCURRENCY") {
            config.concurrency = parse_value("SNIPER_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("SNIPER_MIN_DELAY_MS") {
            config.min_delay_ms = parse_value("SNIPER_MIN_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("SNIPER_MAX_DELAY_MS") {
            config.max_delay_ms = parse_value("SNIPER_MAX_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("SNIPER_RATE") {
            config.rate_per_sec = Some(parse_value("SNIPER_RATE", &v)?);
        }
        if let Some(v) = lookup("SNIPER_TIMEOUT_MS") {
            config.probe_timeout_ms = parse_value("SNIPER_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("SNIPER_ORDER") {
            config.order = v.parse()?;
        }
        if let Some(v) = lookup("SNIPER_SEED") {
            config.seed = Some(parse_value("SNIPER_SEED", &v)?);
        }
        if let Some(v) = lookup("SNIPER_TARGET") {
            config.target = v;
        }
        if let Some(v) = lookup("SNIPER_OUTPUT") {
            config.output = PathBuf::from(v);
        }
        if let Some(v) = lookup("SNIPER_FORMAT") {
            config.format = v.parse()?;
        }

        Ok(config)
    }

    /// Overlay command-line flags (`--flag value` or `--flag=value`)
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
                _ => (arg.as_str(), None),
            };

            let mut value = |name: &str| -> Result<String> {
                match &inline {
                    Some(v) => Ok(v.clone()),
                    None => iter
                        .next()
                        .cloned()
                        .ok_or_else(|| SniperError::cli(format!("Missing value for {}", name))),
                }
            };

            match flag {
                "--length" | "-l" => self.length = parse_value(flag, &value(flag)?)?,
                "--digits" => self.include_digits = true,
                "--letters-only" => self.include_digits = false,
                "--alphabet" => self.alphabet = Some(value(flag)?),
                "--suffix" => self.suffix = value(flag)?,
                "--concurrency" | "-c" => self.concurrency = parse_value(flag, &value(flag)?)?,
                "--min-delay" => self.min_delay_ms = parse_value(flag, &value(flag)?)?,
                "--max-delay" => self.max_delay_ms = parse_value(flag, &value(flag)?)?,
                "--rate" => self.rate_per_sec = Some(parse_value(flag, &value(flag)?)?),
                "--timeout" => self.probe_timeout_ms = parse_value(flag, &value(flag)?)?,
                "--order" => self.order = value(flag)?.parse()?,
                "--seed" => self.seed = Some(parse_value(flag, &value(flag)?)?),
                "--target" | "-t" => self.target = value(flag)?,
                "--output" | "-o" => self.output = PathBuf::from(value(flag)?),
                "--format" => self.format = value(flag)?.parse()?,
                other => return Err(SniperError::cli(format!("Unknown argument '{}'", other))),
            }
        }

        Ok(())
    }

    /// Check every setting and build the keyspace
    pub fn validate(&self) -> Result<Keyspace> {
        if self.concurrency == 0 {
            return Err(SniperError::config("Concurrency must be at least 1"));
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(config_error!(
                "Minimum delay {}ms exceeds maximum delay {}ms",
                self.min_delay_ms,
                self.max_delay_ms
            ));
        }
        if self.probe_timeout_ms == 0 {
            return Err(SniperError::config("Probe timeout must be greater than zero"));
        }
        if let Some(rate) = self.rate_per_sec {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(config_error!(
                    "Rate must be a positive number of probes per second, got {}",
                    rate
                ));
            }
        }

        self.keyspace()
    }

    pub fn keyspace(&self) -> Result<Keyspace> {
        match &self.alphabet {
            Some(alphabet) => Keyspace::new(alphabet, self.length, &self.suffix),
            None => Keyspace::from_charset(
                Charset::from_digits(self.include_digits),
                self.length,
                &self.suffix,
            ),
        }
    }

    pub fn enumerator(&self) -> Result<Enumerator> {
        Enumerator::with_order(self.validate()?, self.order, self.seed)
    }

    /// Token bucket when a rate is configured, a fixed delay when the delay
    /// window is a single value, a random delay otherwise
    pub fn throttle(&self) -> Result<Arc<dyn Throttle>> {
        if let Some(rate) = self.rate_per_sec {
            let burst = u32::try_from(self.concurrency).unwrap_or(u32::MAX);
            return Ok(Arc::new(TokenBucket::new(rate, burst)?));
        }

        if self.min_delay_ms == self.max_delay_ms {
            return Ok(Arc::new(FixedDelay(Duration::from_millis(self.min_delay_ms))));
        }

        Ok(Arc::new(RandomDelay::from_millis(
            self.min_delay_ms,
            self.max_delay_ms,
        )?))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            concurrency: self.concurrency,
            probe_timeout: self.probe_timeout(),
        }
    }
}
