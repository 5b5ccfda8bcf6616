pub mod collector;
pub mod snapshot;

pub use collector::RunAccumulator;
pub use snapshot::MetricsSnapshot;
