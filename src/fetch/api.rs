use super::{FetchOutcome, Fetcher};
use crate::config::GeneratorKind;
use crate::error::Result;
use crate::output::Emitter;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::time::{Duration, Instant};

const USER_AGENT: &str = "Mozilla/5.0 (Test Crawler)";

pub struct ApiFetcher {
    client: Client,
}

impl ApiFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for ApiFetcher {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Api
    }

    async fn fetch(&self, url: &str, _emitter: &Emitter) -> Result<FetchOutcome> {
        let start = Instant::now();
        let res = self.client.get(url).send().await?.error_for_status()?;
        let body = res.bytes().await?;
        let elapsed = start.elapsed();

        Ok(FetchOutcome {
            url: url.to_string(),
            bytes: body.len() as u64,
            elapsed_ms: elapsed.as_millis() as u64,
            title: None,
            bytes_per_second: None,
            truncated: false,
        })
    }
}
