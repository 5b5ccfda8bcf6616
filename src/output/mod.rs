use crate::config::GeneratorKind;
use crate::error::{FailureKind, Result};
use crate::fetch::FetchOutcome;
use crate::metrics::MetricsSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod console;
pub mod json;
pub mod memory;

/// Everything a generator reports while it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Started { kind: GeneratorKind, targets: usize },
    FetchStarted { url: String },
    Progress { url: String, bytes: u64, bytes_per_second: f64 },
    LimitReached { url: String, bytes: u64 },
    Fetched(FetchOutcome),
    Failed { url: String, kind: FailureKind, message: String },
    Stats(MetricsSnapshot),
    CycleComplete { wait_ms: u64 },
    Stopped(MetricsSnapshot),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub generator: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn write(&mut self, record: &Record) -> Result<()>;
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Stamps events with the generator name and fans them out to every handler.
#[derive(Clone)]
pub struct Emitter {
    generator: Arc<str>,
    handlers: Arc<Mutex<Vec<Box<dyn OutputHandler>>>>,
}

impl Emitter {
    pub fn new(generator: &str, handlers: Vec<Box<dyn OutputHandler>>) -> Self {
        Self {
            generator: Arc::from(generator),
            handlers: Arc::new(Mutex::new(handlers)),
        }
    }

    pub fn generator(&self) -> &str {
        &self.generator
    }

    pub async fn emit(&self, event: Event) {
        let record = Record {
            generator: self.generator.to_string(),
            timestamp: Utc::now(),
            event,
        };
        let mut handlers = self.handlers.lock().await;
        for handler in handlers.iter_mut() {
            if let Err(e) = handler.write(&record).await {
                log::error!("Error writing output: {}", e);
            }
        }
    }

    pub async fn close(&self) {
        let mut handlers = self.handlers.lock().await;
        for handler in handlers.iter_mut() {
            if let Err(e) = handler.close().await {
                log::error!("Error closing output: {}", e);
            }
        }
    }
}
