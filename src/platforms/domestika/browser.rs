use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, ErrorReason, ResourceType};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use domestika_core::models::settings::BrowserSettings;

use super::auth::SessionCookie;
use crate::platforms::traits::{PageDriver, RenderedPage};

/// CDP has no "no deadline" setting; a year is long enough to never fire.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

const INIT_DATA_SCRIPT: &str = "JSON.stringify(window.__INITIAL_PROPS__ ?? null)";

pub fn is_blocked_resource(kind: &ResourceType) -> bool {
    matches!(
        kind,
        ResourceType::Stylesheet | ResourceType::Font | ResourceType::Image
    )
}

/// One headless browser with a single authenticated page, reused for every
/// navigation of a run.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    interceptor: JoinHandle<()>,
    nav_lock: Mutex<()>,
}

impl BrowserSession {
    pub async fn launch(settings: &BrowserSettings, cookie: &SessionCookie) -> anyhow::Result<Self> {
        let mut builder = BrowserConfig::builder()
            .enable_request_intercept()
            .request_timeout(NAVIGATION_TIMEOUT);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(exe) = &settings.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("Failed to configure browser: {}", e))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });
        tracing::info!("[domestika] browser started (headless={})", settings.headless);

        let page = browser.new_page("about:blank").await?;

        let mut paused = page.event_listener::<EventRequestPaused>().await?;
        let intercept_page = page.clone();
        let interceptor = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let result = if is_blocked_resource(&event.resource_type) {
                    intercept_page
                        .execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ())
                } else {
                    intercept_page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = result {
                    tracing::debug!("[domestika] intercept {}: {}", event.request.url, e);
                }
            }
        });

        let cookie_param = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone())
            .domain(cookie.domain.clone())
            .path("/")
            .build()
            .map_err(|e| anyhow!("Invalid session cookie: {}", e))?;
        page.set_cookie(cookie_param).await?;
        tracing::info!("[domestika] session cookie set for {}", cookie.domain);

        Ok(Self {
            browser,
            page,
            handler,
            interceptor,
            nav_lock: Mutex::new(()),
        })
    }

    pub async fn close(mut self) -> anyhow::Result<()> {
        self.interceptor.abort();
        if let Err(e) = self.page.close().await {
            tracing::debug!("[domestika] page close: {}", e);
        }
        self.browser.close().await?;
        self.browser.wait().await?;
        self.handler.abort();
        tracing::info!("[domestika] browser closed");
        Ok(())
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn navigate(&self, url: &str) -> anyhow::Result<RenderedPage> {
        let _guard = self.nav_lock.lock().await;

        tracing::debug!("[domestika] navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| anyhow!("Navigation to {} failed: {}", url, e))?;

        let html = self.page.content().await?;

        let raw: String = self
            .page
            .evaluate(INIT_DATA_SCRIPT)
            .await?
            .into_value()
            .map_err(|e| anyhow!("Could not read page init data: {}", e))?;
        let init_data = serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .filter(|v| !v.is_null());

        Ok(RenderedPage { html, init_data })
    }
}
