use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://api.domestika.org/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub course_url: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default = "default_downloader")]
    pub downloader: PathBuf,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Value of the site session cookie copied from a logged-in browser.
    #[serde(default)]
    pub session_cookie: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_cookie_domain")]
    pub cookie_domain: String,
    /// Raw (possibly URL-encoded) credentials blob holding the API access token.
    #[serde(default)]
    pub credentials: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    #[serde(default = "default_subtitle_lang")]
    pub subtitle_lang: String,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    #[serde(default = "default_subtitle_format")]
    pub subtitle_format: String,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default)]
    pub executable: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("course_url is not set in the settings file")]
    MissingCourseUrl,
    #[error("course_url {0:?} is not an http(s) URL")]
    InvalidCourseUrl(String),
    #[error("auth.session_cookie is not set in the settings file")]
    MissingSessionCookie,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("domestika_courses")
}

pub fn default_downloader() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from("N_m3u8DL-RE.exe")
    } else {
        PathBuf::from("N_m3u8DL-RE")
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.into()
}

fn default_cookie_name() -> String {
    "_domestika_session".into()
}

fn default_cookie_domain() -> String {
    "www.domestika.org".into()
}

fn default_subtitle_lang() -> String {
    "en".into()
}

fn default_max_height() -> u32 {
    1080
}

fn default_video_codec() -> String {
    "hvc1".into()
}

fn default_subtitle_format() -> String {
    "SRT".into()
}

fn default_max_concurrent() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_cookie: String::new(),
            cookie_name: default_cookie_name(),
            cookie_domain: default_cookie_domain(),
            credentials: String::new(),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            subtitle_lang: default_subtitle_lang(),
            max_height: default_max_height(),
            video_codec: default_video_codec(),
            subtitle_format: default_subtitle_format(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            course_url: String::new(),
            output_dir: default_output_dir(),
            auth: AuthSettings::default(),
            download: DownloadSettings::default(),
            downloader: default_downloader(),
            browser: BrowserSettings::default(),
            api_base: default_api_base(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.course_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingCourseUrl);
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidCourseUrl(url.to_string()));
        }
        if self.auth.session_cookie.trim().is_empty() {
            return Err(ConfigError::MissingSessionCookie);
        }
        Ok(())
    }
}
