use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::platforms::traits::ToolOutput;

#[derive(Debug, Clone, Serialize)]
pub struct DebugEntry {
    #[serde(rename = "videoURL")]
    pub video_url: String,
    pub output: Vec<ToolOutput>,
}

/// Downloader output collected across concurrent download tasks.
#[derive(Clone, Default)]
pub struct DebugLog {
    entries: Arc<Mutex<Vec<DebugEntry>>>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, video_url: &str, output: Vec<ToolOutput>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(DebugEntry {
                video_url: video_url.to_string(),
                output,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let json = {
            let guard = self
                .entries
                .lock()
                .map_err(|_| anyhow::anyhow!("debug log lock poisoned"))?;
            serde_json::to_string(&*guard)?
        };
        tokio::fs::write(path, json).await?;
        tracing::info!("Log file saved: {}", path.display());
        Ok(())
    }
}
