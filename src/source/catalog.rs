//! HTTP client for the remote catalog's scan endpoint.

use super::{Catalog, ScanPage};
use crate::config::CatalogConfig;
use crate::error::{Error, Result, ServerErrorKind};
use async_trait::async_trait;
use url::Url;

/// Catalog reached over HTTP
///
/// Issues `GET <base_url>?limit=<n>[&cursor=<token>]` and expects a JSON
/// [`ScanPage`] body.
#[derive(Clone, Debug)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCatalog {
    /// Build a client from config
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid catalog URL '{}': {}", config.base_url, e),
            key: Some("base_url".to_string()),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self { client, base_url })
    }

    fn scan_url(&self, cursor: Option<&str>, limit: usize) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        url
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn scan(&self, cursor: Option<&str>, limit: usize) -> Result<ScanPage> {
        let url = self.scan_url(cursor, limit);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                Error::server(
                    ServerErrorKind::DataSourceError,
                    format!("catalog scan request failed: {}", e),
                )
            })?;

        response.json::<ScanPage>().await.map_err(|e| {
            Error::server(
                ServerErrorKind::DataSourceError,
                format!("catalog returned an unreadable page: {}", e),
            )
        })
    }
}
