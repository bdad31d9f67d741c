use std::sync::LazyLock;

use regex::Regex;

use domestika_core::models::settings::AuthSettings;

static ACCESS_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"accessToken"\s*:\s*"([^"]*)""#).unwrap());

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("credentials blob is empty")]
    Empty,
    #[error("credentials blob is not valid percent-encoding: {0}")]
    Decode(String),
    #[error("malformed credentials: no accessToken found")]
    Malformed,
}

/// API credentials taken from the site's stored-credentials blob.
#[derive(Clone)]
pub struct Credentials {
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &token_preview(&self.access_token))
            .finish()
    }
}

impl Credentials {
    /// Accepts the blob either raw or percent-encoded (as copied from the
    /// browser's cookie storage).
    pub fn from_blob(blob: &str) -> Result<Self, CredentialsError> {
        let blob = blob.trim();
        if blob.is_empty() {
            return Err(CredentialsError::Empty);
        }

        let decoded = urlencoding::decode(blob).map_err(|e| CredentialsError::Decode(e.to_string()))?;

        let access_token = ACCESS_TOKEN_RE
            .captures(&decoded)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(CredentialsError::Malformed)?;

        tracing::debug!("[domestika] access token loaded");
        Ok(Self { access_token })
    }
}

/// Browser cookie that carries the logged-in site session.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

impl SessionCookie {
    pub fn from_settings(auth: &AuthSettings) -> Self {
        Self {
            name: auth.cookie_name.clone(),
            value: auth.session_cookie.trim().to_string(),
            domain: auth.cookie_domain.clone(),
        }
    }
}

fn token_preview(token: &str) -> String {
    let end = token
        .char_indices()
        .nth(12)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    format!("{}...", &token[..end])
}
