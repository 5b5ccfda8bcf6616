use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use trafficgen::config::{presets, ConfigLoader, GeneratorConfig, GeneratorKind, OutputConfig};
use trafficgen::generator::TrafficGenerator;
use trafficgen::metrics::snapshot::MetricsSnapshot;

#[derive(Parser)]
#[command(name = "trafficgen")]
#[command(version = "0.1.0")]
#[command(about = "HTTP traffic generator: downloads, API polling and page scraping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a generator until interrupted
    Run {
        /// Built-in generator to run (required unless --config sets a kind)
        #[arg(value_enum)]
        kind: Option<GeneratorKind>,

        /// Path to a configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Replace the target list (repeatable)
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,

        /// Also append every event as a JSON line to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Show a live progress spinner (stderr)
        #[arg(short, long)]
        progress: bool,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the built-in generators and their targets
    Presets,
}

fn build_config(
    kind: Option<GeneratorKind>,
    config: Option<PathBuf>,
    targets: Vec<String>,
    cycles: Option<u64>,
    json: Option<PathBuf>,
) -> anyhow::Result<GeneratorConfig> {
    let mut cfg = match (config, kind) {
        (Some(path), kind) => {
            log::info!("Loading config from {:?}", path);
            let cfg = ConfigLoader::load(&path)?;
            if let Some(kind) = kind {
                anyhow::ensure!(
                    cfg.kind() == kind,
                    "config {:?} is a {} generator, not {}",
                    path,
                    cfg.kind(),
                    kind
                );
            }
            cfg
        }
        (None, Some(kind)) => ConfigLoader::preset(kind)?,
        (None, None) => anyhow::bail!("pass a generator kind or --config"),
    };

    if !targets.is_empty() {
        cfg.targets = targets;
    }
    if cycles.is_some() {
        cfg.max_cycles = cycles;
    }
    if let Some(path) = json {
        if cfg.output.is_empty() {
            cfg.output.push(OutputConfig::Console);
        }
        cfg.output.push(OutputConfig::Json {
            path: path.display().to_string(),
        });
    }

    Ok(ConfigLoader::resolve(cfg)?)
}

fn print_config(cfg: &GeneratorConfig) {
    println!("   Name: {}", cfg.name);
    println!("   Kind: {}", cfg.kind());
    println!("   Targets: {:?}", cfg.targets);
    println!("   Timeout: {:?}", cfg.timeout());
    println!("   Request delay: {:?}", cfg.request_delay());
    println!("   Cycle delay: {:?}", cfg.cycle_delay());
    match cfg.stats_every() {
        0 => println!("   Stats: off"),
        n => println!("   Stats: every {} requests", n),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let multi = Arc::new(indicatif::MultiProgress::new());

    match cli.command {
        Commands::Run { kind, config, targets, cycles, json, progress } => {
            let max_level = logger.filter();
            if progress {
                indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger).try_init()?;
            } else {
                log::set_boxed_logger(Box::new(logger))?;
            }
            log::set_max_level(max_level);

            let cfg = build_config(kind, config, targets, cycles, json)?;
            let spinner_multi = if progress { Some(multi.clone()) } else { None };
            let outputs = ConfigLoader::create_outputs(&cfg, spinner_multi)?;
            let generator = TrafficGenerator::from_config(cfg, outputs)?;

            let mut progress_bar: Option<ProgressBar> = None;
            let mut _progress_task = None;
            if progress {
                let pb = multi.add(ProgressBar::new_spinner());
                pb.set_style(ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")?);
                pb.enable_steady_tick(Duration::from_millis(120));

                let mut metrics_rx = generator.watch_metrics();
                let pb_clone = pb.clone();
                progress_bar = Some(pb);
                _progress_task = Some(tokio::spawn(async move {
                    while metrics_rx.changed().await.is_ok() {
                        let snapshot: MetricsSnapshot = metrics_rx.borrow().clone();
                        pb_clone.set_message(format!(
                            "Requests: {} | Total: {:.2} KB | Avg: {:.2} KB/s | Success: {:.1}%",
                            snapshot.requests_total,
                            snapshot.total_kb(),
                            snapshot.kb_per_second(),
                            snapshot.success_rate
                        ));
                    }
                }));
            }

            generator.run().await;

            if let Some(task) = _progress_task {
                task.abort();
            }
            if let Some(pb) = progress_bar {
                pb.finish_and_clear();
            }

            let final_metrics = generator.get_metrics();
            println!("\n✅ Generator stopped:");
            println!("   Requests: {}", final_metrics.requests_total);
            println!("   Failed: {}", final_metrics.requests_failed);
            println!("   Total Transferred: {:.2} KB", final_metrics.total_kb());
            println!("   Average Speed: {:.2} KB/s", final_metrics.kb_per_second());
            println!("   Average Duration: {}ms", final_metrics.avg_response_time_ms);
            println!("   Total Time: {:.1}s", final_metrics.elapsed_seconds);
        }
        Commands::Check { config } => {
            match ConfigLoader::load(&config) {
                Ok(cfg) => {
                    println!("✅ Config is valid:");
                    print_config(&cfg);
                }
                Err(e) => {
                    eprintln!("❌ Config error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Presets => {
            for kind in GeneratorKind::ALL {
                println!("{}:", kind);
                for target in presets::targets(kind) {
                    println!("   {}", target);
                }
            }
        }
    }

    Ok(())
}
