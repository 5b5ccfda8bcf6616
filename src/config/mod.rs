pub mod loader;
pub mod presets;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{GeneratorConfig, GeneratorKind, OutputConfig, Schedule};
