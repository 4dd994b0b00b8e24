use crate::error::ImportError;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Downloads recipe pages the way a browser would ask for them.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ImportError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));

        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch the raw HTML at `url`.
    pub async fn fetch(&self, url: &str) -> Result<String, ImportError> {
        info!("Fetching recipe page {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }

    /// Fetch `url` and reduce it to readable text.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ImportError> {
        let html = self.fetch(url).await?;
        Ok(super::html_to_text(&html))
    }
}
