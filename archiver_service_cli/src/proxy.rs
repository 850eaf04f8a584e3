use std::time::Duration;

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

use crate::error::ArchiveError;

/// Raw result of one media fetch through the proxy.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Best-effort retrieval of one remote binary. Injected into the pipeline so
/// tests can stub the network away.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, ArchiveError>;
}

/// Fetches remote resources through a CORS-bypass proxy endpoint.
pub struct ProxyFetcher {
    client: Client,
    endpoint: String,
}

impl ProxyFetcher {
    pub fn new(endpoint: &str) -> Result<Self, ArchiveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ArchiveError::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    fn proxied(&self, url: &str) -> String {
        format!("{}{}", self.endpoint, urlencoding::encode(url))
    }

    /// Downloads the source page. Transient failures are retried with
    /// exponential backoff; the pipeline itself never retries.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ArchiveError> {
        Url::parse(url).map_err(|_| ArchiveError::InvalidUrl(url.to_string()))?;

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..ExponentialBackoff::default()
        };

        retry(backoff, || async {
            let res = self
                .client
                .get(self.proxied(url))
                .send()
                .await
                .map_err(|e| backoff::Error::transient(ArchiveError::Upstream(e.to_string())))?;

            let status = res.status();
            if !status.is_success() {
                let err = ArchiveError::Upstream(format!("Erro HTTP: {}", status));
                // Server-side failures are worth another attempt, client
                // errors are not.
                if status.is_server_error() {
                    return Err(backoff::Error::transient(err));
                }
                return Err(backoff::Error::permanent(err));
            }

            let text = res
                .text()
                .await
                .map_err(|e| backoff::Error::transient(ArchiveError::Upstream(e.to_string())))?;

            if text.trim().len() < 50 {
                return Err(backoff::Error::permanent(ArchiveError::Upstream(
                    "O conteúdo recuperado parece estar vazio ou inválido.".to_string(),
                )));
            }

            Ok(text)
        })
        .await
    }
}

#[async_trait]
impl MediaFetcher for ProxyFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, ArchiveError> {
        let res = self
            .client
            .get(self.proxied(url))
            .send()
            .await
            .map_err(|e| ArchiveError::Upstream(e.to_string()))?;

        if !res.status().is_success() {
            return Err(ArchiveError::Upstream(format!(
                "Erro HTTP: {}",
                res.status()
            )));
        }

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = res
            .bytes()
            .await
            .map_err(|e| ArchiveError::Upstream(e.to_string()))?
            .to_vec();

        Ok(FetchedMedia {
            bytes,
            content_type,
        })
    }
}
