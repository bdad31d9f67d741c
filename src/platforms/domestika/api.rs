use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use domestika_core::models::course::UnitEntry;

use super::auth::Credentials;
use crate::platforms::traits::JsonApi;

const JSON_API: &str = "application/vnd.api+json";
const ACCEPT_VERSION_HEADER: &str = "x-dmstk-accept-version";

pub const FINAL_PROJECT_VERSION: &str = "finalProject.v1";
pub const VIDEO_VERSION: &str = "video.v1";

pub struct DomestikaApi {
    client: reqwest::Client,
    base: String,
}

impl DomestikaApi {
    pub fn new(base: &str, credentials: &Credentials) -> anyhow::Result<Self> {
        Ok(Self::with_client(base, client_builder(credentials)?.build()?))
    }

    fn with_client(base: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

fn client_builder(credentials: &Credentials) -> anyhow::Result<reqwest::ClientBuilder> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", credentials.access_token))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_API));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API));

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(30)))
}

#[async_trait]
impl JsonApi for DomestikaApi {
    async fn fetch(&self, path: &str, accept_version: &str) -> Option<serde_json::Value> {
        let url = self.url(path);
        tracing::debug!("[domestika] GET {} ({})", url, accept_version);

        let resp = match self
            .client
            .get(&url)
            .header(ACCEPT_VERSION_HEADER, accept_version)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("[domestika] request to {} failed: {}", url, e);
                return None;
            }
        };

        if !resp.status().is_success() {
            tracing::warn!(
                "[domestika] error fetching data (HTTP {}), check the credentials are still valid",
                resp.status()
            );
            return None;
        }

        match resp.json::<serde_json::Value>().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("[domestika] invalid JSON from {}: {}", url, e);
                None
            }
        }
    }
}

fn final_project_path(course_id: &str) -> String {
    format!("courses/{}/final-project?with_server_timing=true", course_id)
}

fn video_path(video_id: &str) -> String {
    format!("videos/{}?with_server_timing=true", video_id)
}

fn id_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolves a final-project course id into its synthetic unit. Any failure
/// along the way means "no final project"; the reason is logged.
pub async fn resolve_final_project(api: &dyn JsonApi, course_id: &str) -> Option<UnitEntry> {
    tracing::info!("Fetching final project");

    let Some(project) = api
        .fetch(&final_project_path(course_id), FINAL_PROJECT_VERSION)
        .await
    else {
        tracing::warn!("[domestika] final project of course {} unavailable, skipping", course_id);
        return None;
    };

    let Some(video_id) = project
        .pointer("/data/relationships/video/data/id")
        .and_then(id_string)
    else {
        tracing::warn!("[domestika] final project of course {} has no video, skipping", course_id);
        return None;
    };

    let Some(video) = api.fetch(&video_path(&video_id), VIDEO_VERSION).await else {
        tracing::warn!("[domestika] final project video {} unavailable, skipping", video_id);
        return None;
    };

    let playback_url = video
        .pointer("/data/attributes/playbackUrl")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|u| !u.is_empty());

    match playback_url {
        Some(url) => Some(UnitEntry::final_project(url.to_string())),
        None => {
            tracing::warn!("[domestika] final project video {} has no playback URL, skipping", video_id);
            None
        }
    }
}
