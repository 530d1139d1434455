//! Handle Sniper - exhaustive handle availability scanning
//!
//! Enumerates every fixed-length handle over an alphabet, probes each one
//! against a remote existence check at a polite pace, and records whether
//! it is taken or free.

pub mod config;
pub mod error;
pub mod keyspace;
pub mod oracle;
pub mod scheduler;
pub mod sink;
pub mod throttle;
pub mod types;

// Re-export commonly used types
pub use config::RunConfig;
pub use error::{Result, SniperError};
pub use types::{Classification, IndeterminateReason, ProbeOutcome, ProbeRecord, ProgressSnapshot};

// Re-export main functionality
pub use keyspace::{EnumerationOrder, Enumerator, Keyspace};
pub use oracle::{ExistenceOracle, HttpOracle};
pub use scheduler::{ProbeScheduler, RunState, RunSummary, SchedulerConfig, ShutdownHandle};
pub use sink::{FileSink, MemorySink, ResultSink, SinkFormat};
pub use throttle::Throttle;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    Ok(())
}
