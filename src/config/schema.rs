use crate::config::presets;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Large file downloads, read in chunks up to a byte cap
    Download,
    /// JSON API polling
    Api,
    /// HTML page scraping with title extraction
    Webpage,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 3] = [Self::Download, Self::Api, Self::Webpage];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Download => "download",
            GeneratorKind::Api => "api",
            GeneratorKind::Webpage => "webpage",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many targets a single cycle visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// One target per cycle, advancing a rotating index
    Rotate,
    /// Every target, in order, once per cycle
    Sweep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Console,
    Json { path: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub kind: Option<GeneratorKind>,

    #[serde(default)]
    #[validate(custom = "validate_targets")]
    pub targets: Vec<String>,

    #[serde(default)]
    #[validate(range(min = 1, max = 3600))]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub request_delay_ms: Option<u64>,

    #[serde(default)]
    pub cycle_delay_ms: Option<u64>,

    /// Emit a stats line after every Nth request; 0 disables
    #[serde(default)]
    pub stats_every: Option<u64>,

    #[serde(default)]
    pub schedule: Option<Schedule>,

    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_bytes: Option<u64>,

    #[serde(default)]
    #[validate(range(min = 1, max = 16_777_216))]
    pub chunk_size: Option<u64>,

    #[serde(default)]
    pub max_cycles: Option<u64>,

    #[serde(default)]
    pub output: Vec<OutputConfig>,

    /// Optional path to a parent configuration file to inherit from
    #[serde(default)]
    pub extends: Option<String>,
}

impl GeneratorConfig {
    /// Kind of the generator; falls back to `Api` only for configs that were never resolved.
    pub fn kind(&self) -> GeneratorKind {
        self.kind.unwrap_or(GeneratorKind::Api)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .unwrap_or_else(|| presets::timeout_secs(self.kind())),
        )
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(
            self.request_delay_ms
                .unwrap_or_else(|| presets::request_delay_ms(self.kind())),
        )
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(
            self.cycle_delay_ms
                .unwrap_or_else(|| presets::cycle_delay_ms(self.kind())),
        )
    }

    pub fn stats_every(&self) -> u64 {
        self.stats_every
            .unwrap_or_else(|| presets::stats_every(self.kind()))
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
            .unwrap_or_else(|| presets::schedule(self.kind()))
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes.unwrap_or(presets::DOWNLOAD_MAX_BYTES)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
            .map(|c| c as usize)
            .unwrap_or(presets::DOWNLOAD_CHUNK_SIZE)
    }
}

fn validate_targets(targets: &Vec<String>) -> Result<(), ValidationError> {
    if targets.is_empty() {
        return Err(ValidationError::new("targets_empty"));
    }
    for target in targets {
        match url::Url::parse(target) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            _ => {
                let mut err = ValidationError::new("target_url");
                err.add_param("value".into(), target);
                return Err(err);
            }
        }
    }
    Ok(())
}
