use async_trait::async_trait;
use serde::Serialize;

/// A page after the site's client script has run.
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    /// `window.__INITIAL_PROPS__`, when the page exposes one.
    pub init_data: Option<serde_json::Value>,
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> anyhow::Result<RenderedPage>;
}

#[async_trait]
pub trait JsonApi: Send + Sync {
    /// GET `path` relative to the API base. `None` on any failure.
    async fn fetch(&self, path: &str, accept_version: &str) -> Option<serde_json::Value>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn run(&self, args: &[String]) -> anyhow::Result<ToolOutput>;
}
