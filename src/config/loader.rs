use crate::config::presets;
use crate::config::schema::{GeneratorConfig, GeneratorKind, OutputConfig};
use crate::error::{Error, Result};
use crate::output::{OutputHandler, console::ConsoleOutput, json::JsonOutput};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads a config file and its `extends` chain, layered over the preset of its kind.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<GeneratorConfig> {
        let layers = Self::collect_layers(path.as_ref())?;
        let kind = layers
            .iter()
            .find_map(|layer| layer.kind)
            .ok_or_else(|| Error::Config("missing generator kind".to_string()))?;

        let config = layers
            .into_iter()
            .rev()
            .fold(presets::preset(kind), Self::merge_configs);
        config.validate()?;
        Ok(config)
    }

    pub fn preset(kind: GeneratorKind) -> Result<GeneratorConfig> {
        Self::resolve(presets::preset(kind))
    }

    /// Fills every unset field from the preset of the config's kind, then validates.
    pub fn resolve(config: GeneratorConfig) -> Result<GeneratorConfig> {
        let kind = config
            .kind
            .ok_or_else(|| Error::Config("missing generator kind".to_string()))?;
        let resolved = Self::merge_configs(presets::preset(kind), config);
        resolved.validate()?;
        Ok(resolved)
    }

    /// Parsed files from `path` up through each `extends`, child first.
    fn collect_layers(path: &Path) -> Result<Vec<GeneratorConfig>> {
        let mut layers = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(path.to_path_buf());

        while let Some(current) = next.take() {
            let file = fs::canonicalize(&current)
                .map_err(|e| Error::Config(format!("{}: {}", current.display(), e)))?;
            if !seen.insert(file.clone()) {
                return Err(Error::Config(format!(
                    "Circular inheritance detected involving {}",
                    file.display()
                )));
            }

            let layer = Self::parse_file(&file)?;
            if let Some(parent) = &layer.extends {
                let dir = file.parent().ok_or_else(|| {
                    Error::Config(format!("{} has no parent directory", file.display()))
                })?;
                next = Some(dir.join(parent));
            }
            layers.push(layer);
        }
        Ok(layers)
    }

    fn parse_file(path: &Path) -> Result<GeneratorConfig> {
        let format = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        if !matches!(format, "json" | "yaml" | "yml" | "toml") {
            return Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: GeneratorConfig = match format {
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        Ok(config)
    }

    fn merge_configs(mut parent: GeneratorConfig, child: GeneratorConfig) -> GeneratorConfig {
        if !child.name.is_empty() {
            parent.name = child.name;
        }
        if !child.targets.is_empty() {
            parent.targets = child.targets;
        }
        if !child.output.is_empty() {
            parent.output = child.output;
        }
        parent.kind = child.kind.or(parent.kind);
        parent.timeout_secs = child.timeout_secs.or(parent.timeout_secs);
        parent.request_delay_ms = child.request_delay_ms.or(parent.request_delay_ms);
        parent.cycle_delay_ms = child.cycle_delay_ms.or(parent.cycle_delay_ms);
        parent.stats_every = child.stats_every.or(parent.stats_every);
        parent.schedule = child.schedule.or(parent.schedule);
        parent.max_bytes = child.max_bytes.or(parent.max_bytes);
        parent.chunk_size = child.chunk_size.or(parent.chunk_size);
        parent.max_cycles = child.max_cycles.or(parent.max_cycles);

        parent.extends = None;
        parent
    }

    pub fn create_outputs(
        config: &GeneratorConfig,
        multi: Option<Arc<indicatif::MultiProgress>>,
    ) -> Result<Vec<Box<dyn OutputHandler>>> {
        let mut handlers: Vec<Box<dyn OutputHandler>> = Vec::new();
        for out_config in &config.output {
            match out_config {
                OutputConfig::Console => handlers.push(Box::new(ConsoleOutput::new(multi.clone()))),
                OutputConfig::Json { path } => {
                    handlers.push(Box::new(JsonOutput::new(PathBuf::from(path))?))
                }
            }
        }
        if handlers.is_empty() {
            handlers.push(Box::new(ConsoleOutput::new(multi)));
        }
        Ok(handlers)
    }
}
