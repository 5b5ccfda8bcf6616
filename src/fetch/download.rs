use super::{deadline, FetchOutcome, Fetcher};
use crate::config::presets::PROGRESS_INTERVAL_BYTES;
use crate::config::GeneratorKind;
use crate::error::Result;
use crate::metrics::collector::average_speed;
use crate::output::{Emitter, Event};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

const USER_AGENT: &str = "Mozilla/5.0";

/// Streams a body in fixed-size reads and stops once `max_bytes` is exceeded.
///
/// There is no whole-request timeout: connecting, the response head and every
/// body read are each bounded by `timeout` on their own, so a large file that
/// keeps flowing is never cut off.
pub struct DownloadFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: u64,
    chunk_size: usize,
}

impl DownloadFetcher {
    pub fn new(timeout: Duration, max_bytes: u64, chunk_size: usize) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            timeout,
            max_bytes,
            chunk_size: chunk_size.max(1),
        })
    }
}

/// Regroups network chunks of arbitrary size into reads of exactly `size`
/// bytes; only the last read at end of body may be short.
struct FixedReads {
    size: u64,
    buffered: u64,
}

impl FixedReads {
    fn new(size: usize) -> Self {
        Self { size: size as u64, buffered: 0 }
    }

    fn fill(&mut self, len: usize) {
        self.buffered += len as u64;
    }

    fn take(&mut self, eof: bool) -> Option<u64> {
        if self.buffered >= self.size {
            self.buffered -= self.size;
            Some(self.size)
        } else if eof && self.buffered > 0 {
            Some(std::mem::take(&mut self.buffered))
        } else {
            None
        }
    }
}

/// Full reads keep `total` a multiple of `chunk_size`, so this holds once per interval.
fn on_progress_boundary(total: u64, chunk_size: u64) -> bool {
    total % PROGRESS_INTERVAL_BYTES < chunk_size
}

#[async_trait]
impl Fetcher for DownloadFetcher {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Download
    }

    async fn fetch(&self, url: &str, emitter: &Emitter) -> Result<FetchOutcome> {
        emitter.emit(Event::FetchStarted { url: url.to_string() }).await;

        let start = Instant::now();
        let mut response = deadline(self.timeout, url, self.client.get(url).send())
            .await?
            .error_for_status()?;

        let mut reads = FixedReads::new(self.chunk_size);
        let mut total: u64 = 0;
        let mut truncated = false;
        let mut eof = false;

        'read: loop {
            while let Some(read) = reads.take(eof) {
                total += read;

                if on_progress_boundary(total, self.chunk_size as u64) {
                    emitter
                        .emit(Event::Progress {
                            url: url.to_string(),
                            bytes: total,
                            bytes_per_second: average_speed(total, start.elapsed().as_secs_f64()),
                        })
                        .await;
                }

                if total > self.max_bytes {
                    emitter
                        .emit(Event::LimitReached { url: url.to_string(), bytes: total })
                        .await;
                    truncated = true;
                    break 'read;
                }
            }
            if eof {
                break;
            }
            match deadline(self.timeout, url, response.chunk()).await? {
                Some(chunk) => reads.fill(chunk.len()),
                None => eof = true,
            }
        }
        // Dropping the response here closes the connection on an early stop.
        drop(response);

        let elapsed = start.elapsed();
        log::debug!("{} finished: {} bytes in {:?}", url, total, elapsed);

        Ok(FetchOutcome {
            url: url.to_string(),
            bytes: total,
            elapsed_ms: elapsed.as_millis() as u64,
            title: None,
            bytes_per_second: Some(average_speed(total, elapsed.as_secs_f64())),
            truncated,
        })
    }
}
