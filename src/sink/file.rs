//! Append-on-write results file

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::ResultSink;
use crate::error::{Result, SniperError};
use crate::types::ProbeRecord;

/// Line format of the results file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkFormat {
    /// `{candidate} - {classification} - status {code|reason}`
    #[default]
    Text,
    /// One serialized `ProbeRecord` per line
    JsonLines,
}

impl std::fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkFormat::Text => write!(f, "text"),
            SinkFormat::JsonLines => write!(f, "jsonl"),
        }
    }
}

impl std::str::FromStr for SinkFormat {
    type Err = SniperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(SinkFormat::Text),
            "jsonl" | "json" => Ok(SinkFormat::JsonLines),
            other => Err(SniperError::config(format!(
                "Unknown output format '{}' (expected text or jsonl)",
                other
            ))),
        }
    }
}

impl SinkFormat {
    pub fn render(&self, record: &ProbeRecord) -> Result<String> {
        match self {
            SinkFormat::Text => Ok(format!(
                "{} - {} - status {}\n",
                record.candidate,
                record.classification,
                record.detail()
            )),
            SinkFormat::JsonLines => {
                let mut line = serde_json::to_string(record)?;
                line.push('\n');
                Ok(line)
            }
        }
    }
}

/// Appends every record to a file, one line each, flushing after each write
pub struct FileSink {
    path: PathBuf,
    format: SinkFormat,
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) `path` in append mode, creating parent directories
    pub async fn open(path: impl AsRef<Path>, format: SinkFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let path_str = path.to_string_lossy().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SniperError::persistence(e.to_string(), Some(parent.to_string_lossy().to_string()))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| SniperError::persistence(e.to_string(), Some(path_str)))?;

        Ok(Self {
            path,
            format,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SinkFormat {
        self.format
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn append(&self, record: &ProbeRecord) -> Result<()> {
        let line = self.format.render(record)?;
        let path = || Some(self.path.to_string_lossy().to_string());

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| SniperError::persistence(e.to_string(), path()))?;
        file.flush()
            .await
            .map_err(|e| SniperError::persistence(e.to_string(), path()))
    }
}
