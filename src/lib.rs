pub mod config;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod metrics;
pub mod output;

pub use config::{ConfigLoader, GeneratorConfig, GeneratorKind};
pub use error::{Error, FailureKind, Result};
pub use fetch::{FetchOutcome, Fetcher};
pub use generator::{GeneratorState, TrafficGenerator};
pub use metrics::collector::RunAccumulator;
pub use metrics::snapshot::MetricsSnapshot;
pub use output::{Emitter, Event, OutputHandler};
