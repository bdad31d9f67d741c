use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

use domestika_core::models::course::VideoDescriptor;

use crate::core::filename::clean_title;

pub const COURSE_TITLE_SELECTOR: &str = "h1.course-header-new__title";
pub const UNIT_LINK_SELECTOR: &str = "h4.h2.unit-item__title a";
pub const SECTION_SELECTOR: &str = "h2.h3.course-header-new__subtitle";

static FINAL_PROJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"courses/([^/?#]+?)-*/final_project").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLink {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct InitialVideo {
    video: Option<InitialVideoAttrs>,
}

#[derive(Debug, Deserialize)]
struct InitialVideoAttrs {
    #[serde(rename = "playbackURL")]
    playback_url: Option<String>,
    title: Option<String>,
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {:?}: {}", css, e))
}

/// Text of the first element matching `css`, trimmed and sanitized.
pub fn extract_text(html: &str, css: &str) -> anyhow::Result<String> {
    let doc = Html::parse_document(html);
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .map(|el| clean_title(&el.text().collect::<String>()))
        .unwrap_or_default())
}

/// Every element matching `css`, in document order.
pub fn extract_links(html: &str, css: &str) -> anyhow::Result<Vec<UnitLink>> {
    let doc = Html::parse_document(html);
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .map(|el| UnitLink {
            href: el.value().attr("href").unwrap_or("").to_string(),
            text: clean_title(&el.text().collect::<String>()),
        })
        .collect())
}

pub fn is_final_project(href: &str) -> bool {
    FINAL_PROJECT_RE.is_match(href)
}

/// Course id from the first link pointing at a final project: the slug
/// segment up to its first hyphen.
pub fn find_final_project(links: &[UnitLink]) -> Option<String> {
    links.iter().find_map(|link| {
        let slug = FINAL_PROJECT_RE.captures(&link.href)?.get(1)?.as_str();
        let id = slug.split('-').next().unwrap_or(slug);
        (!id.is_empty()).then(|| id.to_string())
    })
}

pub fn without_final_project(links: Vec<UnitLink>) -> Vec<UnitLink> {
    links
        .into_iter()
        .filter(|link| !is_final_project(&link.href))
        .collect()
}

/// Joins a possibly relative unit href onto the course page URL.
pub fn resolve_href(base: &str, href: &str) -> String {
    match url::Url::parse(base).and_then(|b| b.join(href)) {
        Ok(u) => u.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Maps the page's `__INITIAL_PROPS__` video list to descriptors stamped with
/// `section`. Missing, null or unexpected data yields an empty list.
pub fn videos_from_init_data(
    init_data: Option<&serde_json::Value>,
    section: &str,
) -> Vec<VideoDescriptor> {
    let value = match init_data {
        Some(v) if !v.is_null() => v,
        _ => return Vec::new(),
    };

    let entries = match value.get("videos") {
        None => return Vec::new(),
        Some(serde_json::Value::Array(entries)) => entries,
        Some(other) => {
            tracing::warn!("[domestika] unexpected init data shape: videos is {}", other);
            return Vec::new();
        }
    };

    let mut videos = Vec::with_capacity(entries.len());
    for entry in entries {
        let attrs = match InitialVideo::deserialize(entry) {
            Ok(InitialVideo { video: Some(attrs) }) => attrs,
            Ok(InitialVideo { video: None }) => {
                tracing::warn!("[domestika] video entry without video data skipped");
                continue;
            }
            Err(e) => {
                tracing::warn!("[domestika] malformed video entry skipped: {}", e);
                continue;
            }
        };
        let title = attrs.title.unwrap_or_default();
        let playback_url = match attrs.playback_url {
            Some(u) if !u.trim().is_empty() => u,
            _ => {
                tracing::warn!("[domestika] video '{}' has no playback URL, skipped", title);
                continue;
            }
        };

        tracing::info!("Video found: {}", title);
        videos.push(VideoDescriptor {
            playback_url,
            title,
            section: section.to_string(),
        });
    }

    videos
}
