use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::error::{LauncherError, LauncherResult};

pub const APP_USER_AGENT: &str = "WildcatLauncher/1.0.0";

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}

/// GET a JSON document from a metadata endpoint.
///
/// Transport or decode failures collapse into `Upstream`; callers in the
/// resolution layer treat these as "source unavailable", not fatal.
pub async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
) -> LauncherResult<T> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| LauncherError::Upstream(format!("{url}: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(LauncherError::Upstream(format!("{url}: HTTP {status}")));
    }

    resp.json::<T>()
        .await
        .map_err(|e| LauncherError::Upstream(format!("{url}: {e}")))
}

/// GET a plain-text document (used for Maven metadata XML).
pub async fn fetch_text(client: &Client, url: &str) -> LauncherResult<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| LauncherError::Upstream(format!("{url}: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(LauncherError::Upstream(format!("{url}: HTTP {status}")));
    }

    resp.text()
        .await
        .map_err(|e| LauncherError::Upstream(format!("{url}: {e}")))
}
