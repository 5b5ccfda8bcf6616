use crate::config::{GeneratorConfig, GeneratorKind};
use crate::error::{Error, Result};
use crate::output::Emitter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub mod api;
pub mod download;
pub mod webpage;

pub use api::ApiFetcher;
pub use download::DownloadFetcher;
pub use webpage::WebpageFetcher;

/// Result of one successful request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub url: String,
    pub bytes: u64,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Average transfer speed, set by strategies that stream the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_per_second: Option<f64>,
    /// Reading stopped at the byte cap before the body ended
    #[serde(default)]
    pub truncated: bool,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    fn kind(&self) -> GeneratorKind;
    async fn fetch(&self, url: &str, emitter: &Emitter) -> Result<FetchOutcome>;
}

pub fn build_fetcher(config: &GeneratorConfig) -> Result<Arc<dyn Fetcher>> {
    let fetcher: Arc<dyn Fetcher> = match config.kind() {
        GeneratorKind::Download => Arc::new(DownloadFetcher::new(
            config.timeout(),
            config.max_bytes(),
            config.chunk_size(),
        )?),
        GeneratorKind::Api => Arc::new(ApiFetcher::new(config.timeout())?),
        GeneratorKind::Webpage => Arc::new(WebpageFetcher::new(config.timeout())?),
    };
    Ok(fetcher)
}

/// Bounds a single network step; elapsed deadlines become `Error::Timeout`.
pub(crate) async fn deadline<F, T>(after: Duration, url: &str, fut: F) -> Result<T>
where
    F: Future<Output = reqwest::Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(res) => Ok(res?),
        Err(_) => Err(Error::Timeout {
            url: url.to_string(),
            after,
        }),
    }
}
