use crate::error::{TranscriptError, TranscriptResult};
use crate::types::TranscriptOptions;
use regex::Regex;
use reqwest::{
    Client,
    cookie::Jar,
    header::{HeaderMap, HeaderValue},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const CONSENT_COOKIE_NAME: &str = "CONSENT";

/// Lifetime of the consent cookie: 30 days
pub const CONSENT_COOKIE_MAX_AGE: Duration = Duration::from_secs(86400 * 30);

/// Fetches watch pages, getting past the consent wall once per request
pub struct PageFetcher {
    client: Client,
    cookies: Arc<Jar>,
    watch_url: Url,
    consent_action: String,
    consent_token_regex: Regex,
}

impl PageFetcher {
    pub fn new(options: &TranscriptOptions) -> TranscriptResult<Self> {
        let mut headers = HeaderMap::new();

        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|_| TranscriptError::Configuration {
                message: "Invalid user agent".to_string(),
            })?,
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&options.accept_language).map_err(|_| {
                TranscriptError::Configuration {
                    message: "Invalid Accept-Language value".to_string(),
                }
            })?,
        );

        let cookies = Arc::new(Jar::default());

        let mut client_builder = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookies))
            .timeout(Duration::from_secs(options.timeout_seconds));

        if let Some(proxy_url) = &options.proxy {
            let proxy =
                reqwest::Proxy::all(proxy_url).map_err(|e| TranscriptError::Configuration {
                    message: format!("Invalid proxy URL: {}", e),
                })?;
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder
            .build()
            .map_err(|e| TranscriptError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let watch_url =
            Url::parse(&options.watch_url).map_err(|e| TranscriptError::Configuration {
                message: format!("Invalid watch URL {}: {}", options.watch_url, e),
            })?;

        let consent_token_regex =
            Regex::new(r#"name="v" value="(.*?)""#).map_err(|e| TranscriptError::Configuration {
                message: format!("Invalid consent token regex: {}", e),
            })?;

        Ok(Self {
            client,
            cookies,
            watch_url,
            consent_action: format!("action=\"{}\"", options.consent_url),
            consent_token_regex,
        })
    }

    /// Watch page URL for a video, with the id as the `v` query parameter
    pub fn page_url(&self, video_id: &str) -> Url {
        let mut url = self.watch_url.clone();
        url.query_pairs_mut().append_pair("v", video_id);
        url
    }

    /// Fetch the watch page HTML, resolving a consent wall with a single retry
    pub async fn fetch_page(&self, video_id: &str) -> TranscriptResult<String> {
        let url = self.page_url(video_id);
        info!("Fetching watch page for video {}", video_id);

        let html = self.get_page(&url, video_id).await?;
        if !self.has_consent_form(&html) {
            return Ok(html);
        }

        warn!("Consent wall detected for video {}, retrying with cookie", video_id);
        self.create_consent_cookie(&html, &url, video_id)?;

        let html = self.get_page(&url, video_id).await?;
        if self.has_consent_form(&html) {
            return Err(TranscriptError::Consent {
                video_id: video_id.to_string(),
            });
        }

        Ok(html)
    }

    async fn get_page(&self, url: &Url, video_id: &str) -> TranscriptResult<String> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(TranscriptError::PageFetch {
                video_id: video_id.to_string(),
                status: response.status().as_u16(),
            });
        }

        let html = response.text().await?;
        debug!("Watch page length: {}", html.len());
        Ok(html)
    }

    pub fn has_consent_form(&self, html: &str) -> bool {
        html.contains(&self.consent_action)
    }

    fn create_consent_cookie(&self, html: &str, url: &Url, video_id: &str) -> TranscriptResult<()> {
        let token = self
            .consent_token_regex
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| TranscriptError::Consent {
                video_id: video_id.to_string(),
            })?;

        let cookie = consent_cookie(token, url);
        debug!("Setting consent cookie: {}", cookie);
        self.cookies.add_cookie_str(&cookie, url);
        Ok(())
    }

    /// Download a timed-text payload
    pub async fn fetch_timed_text(&self, url: &str) -> TranscriptResult<String> {
        info!("Downloading transcript from URL: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(TranscriptError::TranscriptFetch {
                status: response.status().as_u16(),
            });
        }

        let content = response.text().await?;
        debug!("Downloaded transcript content length: {}", content.len());
        Ok(content)
    }
}

/// `Set-Cookie` style string for the consent acknowledgement
pub fn consent_cookie(token: &str, page_url: &Url) -> String {
    let mut cookie = format!(
        "{}=YES+{}; Max-Age={}; Path=/",
        CONSENT_COOKIE_NAME,
        token,
        CONSENT_COOKIE_MAX_AGE.as_secs()
    );
    if let Some(domain) = parent_domain(page_url) {
        cookie.push_str("; Domain=.");
        cookie.push_str(&domain);
    }
    cookie
}

/// Last two labels of the host, e.g. `youtube.com` for `www.youtube.com`.
/// IP hosts get no domain attribute.
fn parent_domain(url: &Url) -> Option<String> {
    let host = url.domain()?;
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    Some(labels[labels.len() - 2..].join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;

    fn fetcher() -> PageFetcher {
        PageFetcher::new(&TranscriptOptions::default()).unwrap()
    }

    #[test]
    fn test_page_url() {
        let url = fetcher().page_url("abc123");
        assert_eq!(url.as_str(), "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_consent_cookie_string() {
        let url = Url::parse("https://www.youtube.com/watch?v=abc123").unwrap();
        assert_eq!(
            consent_cookie("tok", &url),
            "CONSENT=YES+tok; Max-Age=2592000; Path=/; Domain=.youtube.com"
        );

        let local = Url::parse("http://127.0.0.1:1234/watch").unwrap();
        assert_eq!(
            consent_cookie("tok", &local),
            "CONSENT=YES+tok; Max-Age=2592000; Path=/"
        );
    }

    #[test]
    fn test_has_consent_form() {
        let fetcher = fetcher();
        assert!(fetcher.has_consent_form(
            r#"<form action="https://consent.youtube.com/s" method="POST">"#
        ));
        assert!(!fetcher.has_consent_form("<html><body>watch</body></html>"));
    }

    #[test]
    fn test_consent_cookie_attached_to_site() {
        let fetcher = fetcher();
        let url = fetcher.page_url("abc123");
        let html = r#"<form action="https://consent.youtube.com/s"><input type="hidden" name="v" value="cb.20210328-17-p0.de+FX+917"></form>"#;

        fetcher.create_consent_cookie(html, &url, "abc123").unwrap();

        let other_page = Url::parse("https://m.youtube.com/watch?v=other").unwrap();
        let header = fetcher.cookies.cookies(&other_page).unwrap();
        assert_eq!(
            header.to_str().unwrap(),
            "CONSENT=YES+cb.20210328-17-p0.de+FX+917"
        );
    }

    #[test]
    fn test_missing_consent_token() {
        let fetcher = fetcher();
        let url = fetcher.page_url("abc123");
        let result = fetcher.create_consent_cookie(
            r#"<form action="https://consent.youtube.com/s"></form>"#,
            &url,
            "abc123",
        );
        assert!(matches!(result, Err(TranscriptError::Consent { .. })));
    }
}
