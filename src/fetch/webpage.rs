use super::{FetchOutcome, Fetcher};
use crate::config::GeneratorKind;
use crate::error::Result;
use crate::output::Emitter;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use select::document::Document;
use select::predicate::Name;
use std::time::{Duration, Instant};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

pub const NO_TITLE: &str = "no title";
pub const TITLE_MAX_CHARS: usize = 50;

pub struct WebpageFetcher {
    client: Client,
}

impl WebpageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

/// First `<title>` of the page, trimmed and cut to 50 characters.
///
/// The body is decoded leniently; bytes that are not UTF-8 are replaced rather
/// than failing the page. Tag matching is case-insensitive because the parser
/// lowercases element names. A title element with no text, or whose text
/// contains `<`, does not count as a title. Whitespace-only text does and
/// yields an empty title.
pub fn extract_title(body: &[u8]) -> String {
    let html = String::from_utf8_lossy(body);
    let document = Document::from(&*html);

    document
        .find(Name("title"))
        .next()
        .map(|node| node.text())
        .filter(|raw| !raw.is_empty() && !raw.contains('<'))
        .map(|raw| raw.trim().chars().take(TITLE_MAX_CHARS).collect())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

#[async_trait]
impl Fetcher for WebpageFetcher {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Webpage
    }

    async fn fetch(&self, url: &str, _emitter: &Emitter) -> Result<FetchOutcome> {
        let start = Instant::now();
        let res = self.client.get(url).send().await?.error_for_status()?;
        let body = res.bytes().await?;
        let elapsed = start.elapsed();

        let title = extract_title(&body);
        log::debug!("{}: {} bytes, title {:?}", url, body.len(), title);

        Ok(FetchOutcome {
            url: url.to_string(),
            bytes: body.len() as u64,
            elapsed_ms: elapsed.as_millis() as u64,
            title: Some(title),
            bytes_per_second: None,
            truncated: false,
        })
    }
}
