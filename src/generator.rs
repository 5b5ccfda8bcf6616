use crate::config::{GeneratorConfig, Schedule};
use crate::error::Result;
use crate::fetch::{build_fetcher, Fetcher};
use crate::metrics::collector::RunAccumulator;
use crate::metrics::snapshot::MetricsSnapshot;
use crate::output::{Emitter, Event, OutputHandler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Idle,
    Running,
    Stopped,
}

/// Drives one fetch strategy over its target list until stopped.
pub struct TrafficGenerator {
    config: GeneratorConfig,
    fetcher: Arc<dyn Fetcher>,
    emitter: Emitter,
    metrics: Arc<RunAccumulator>,
    cursor: AtomicUsize,
    state: watch::Sender<GeneratorState>,
    shutdown: watch::Sender<bool>,
}

impl TrafficGenerator {
    pub fn new(config: GeneratorConfig, fetcher: Arc<dyn Fetcher>, emitter: Emitter) -> Self {
        let (state_tx, _) = watch::channel(GeneratorState::Idle);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            fetcher,
            emitter,
            metrics: Arc::new(RunAccumulator::new()),
            cursor: AtomicUsize::new(0),
            state: state_tx,
            shutdown: shutdown_tx,
        }
    }

    /// Builds the fetcher from `config` and wires the given outputs.
    pub fn from_config(
        config: GeneratorConfig,
        outputs: Vec<Box<dyn OutputHandler>>,
    ) -> Result<Self> {
        let fetcher = build_fetcher(&config)?;
        let emitter = Emitter::new(&config.name, outputs);
        Ok(Self::new(config, fetcher, emitter))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Runs until `stop()`, Ctrl-C, or `max_cycles` is reached.
    pub async fn run(&self) {
        self.state.send_replace(GeneratorState::Running);

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down...");
                self.stop();
            }
            _ = self.drive() => {
                log::debug!("Generator loop finished.");
            }
        }

        self.emitter.emit(Event::Stopped(self.metrics.snapshot())).await;
        self.emitter.close().await;
        self.state.send_replace(GeneratorState::Stopped);
    }

    async fn drive(&self) {
        log::info!(
            "Starting {} generator '{}' over {} targets",
            self.fetcher.kind(),
            self.config.name,
            self.config.targets.len()
        );
        self.emitter
            .emit(Event::Started {
                kind: self.config.kind(),
                targets: self.config.targets.len(),
            })
            .await;

        let mut cycles: u64 = 0;
        while !self.is_stopping() {
            self.run_cycle().await;
            cycles += 1;

            if self.config.max_cycles.is_some_and(|max| cycles >= max) || self.is_stopping() {
                break;
            }

            let wait = self.config.cycle_delay();
            self.emitter
                .emit(Event::CycleComplete { wait_ms: wait.as_millis() as u64 })
                .await;
            self.pause(wait).await;
        }
    }

    /// One pass over the targets this cycle covers, with the inter-request pause after each.
    pub async fn run_cycle(&self) {
        for url in self.cycle_targets() {
            if self.is_stopping() {
                break;
            }
            self.visit(&url).await;
            self.pause(self.config.request_delay()).await;
        }
    }

    fn cycle_targets(&self) -> Vec<String> {
        let targets = &self.config.targets;
        if targets.is_empty() {
            return Vec::new();
        }
        match self.config.schedule() {
            Schedule::Sweep => targets.clone(),
            Schedule::Rotate => {
                let index = self.cursor.fetch_add(1, Ordering::SeqCst);
                vec![targets[index % targets.len()].clone()]
            }
        }
    }

    async fn visit(&self, url: &str) {
        let start_time = Instant::now();
        let result = self.fetcher.fetch(url, &self.emitter).await;
        let duration = start_time.elapsed();

        let requests = match result {
            Ok(outcome) => {
                let count = self.metrics.record_success(outcome.bytes, duration);
                self.emitter.emit(Event::Fetched(outcome)).await;
                count
            }
            Err(e) => {
                let kind = e.kind();
                log::debug!("Fetch of {} failed ({}): {:?}", url, kind, e);
                let count = self.metrics.record_failure(duration);
                self.emitter
                    .emit(Event::Failed {
                        url: url.to_string(),
                        kind,
                        message: e.to_string(),
                    })
                    .await;
                count
            }
        };

        let every = self.config.stats_every();
        if every > 0 && requests % every == 0 {
            self.emitter.emit(Event::Stats(self.metrics.snapshot())).await;
        }
    }

    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let mut shutdown = self.shutdown.subscribe();
        tokio::select! {
            _ = sleep(duration) => {}
            _ = shutdown.wait_for(|stop| *stop) => {}
        }
    }

    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn state(&self) -> GeneratorState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<GeneratorState> {
        self.state.subscribe()
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn watch_metrics(&self) -> watch::Receiver<MetricsSnapshot> {
        let (tx, rx) = watch::channel(self.metrics.snapshot());
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(500));
            loop {
                interval.tick().await;
                if tx.send(metrics.snapshot()).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorKind;
    use crate::error::Error;
    use crate::fetch::FetchOutcome;
    use crate::output::memory::MemoryOutput;
    use async_trait::async_trait;

    /// Answers from a fixed table: `Some(n)` succeeds with n bytes, `None` times out.
    struct Scripted(Vec<(&'static str, Option<u64>)>);

    #[async_trait]
    impl Fetcher for Scripted {
        fn kind(&self) -> GeneratorKind {
            GeneratorKind::Api
        }

        async fn fetch(&self, url: &str, _emitter: &Emitter) -> Result<FetchOutcome> {
            match self.0.iter().find(|(u, _)| *u == url).and_then(|(_, b)| *b) {
                Some(bytes) => Ok(FetchOutcome {
                    url: url.to_string(),
                    bytes,
                    elapsed_ms: 1,
                    title: None,
                    bytes_per_second: None,
                    truncated: false,
                }),
                None => Err(Error::Timeout {
                    url: url.to_string(),
                    after: Duration::from_secs(15),
                }),
            }
        }
    }

    fn config(schedule: Schedule, stats_every: u64) -> GeneratorConfig {
        GeneratorConfig {
            name: "test".into(),
            kind: Some(GeneratorKind::Api),
            targets: vec!["http://a/".into(), "http://b/".into(), "http://c/".into()],
            request_delay_ms: Some(0),
            cycle_delay_ms: Some(0),
            stats_every: Some(stats_every),
            schedule: Some(schedule),
            ..Default::default()
        }
    }

    fn generator(cfg: GeneratorConfig, memory: &MemoryOutput) -> TrafficGenerator {
        let fetcher = Arc::new(Scripted(vec![
            ("http://a/", Some(100)),
            ("http://b/", None),
            ("http://c/", Some(50)),
        ]));
        TrafficGenerator::new(cfg, fetcher, Emitter::new("test", vec![Box::new(memory.clone())]))
    }

    fn fetched_urls(memory: &MemoryOutput) -> Vec<String> {
        memory
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Fetched(o) => Some(o.url),
                Event::Failed { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn sweep_visits_every_target_and_counts_failures() {
        let memory = MemoryOutput::new();
        let traffic = generator(config(Schedule::Sweep, 0), &memory);

        traffic.run_cycle().await;

        let metrics = traffic.get_metrics();
        assert_eq!(metrics.total_bytes, 150);
        assert_eq!(metrics.requests_total, 3);
        assert_eq!(metrics.requests_failed, 1);
        assert_eq!(fetched_urls(&memory), vec!["http://a/", "http://b/", "http://c/"]);
    }

    #[tokio::test]
    async fn rotate_visits_one_target_per_cycle_and_wraps() {
        let memory = MemoryOutput::new();
        let traffic = generator(config(Schedule::Rotate, 0), &memory);

        for _ in 0..4 {
            traffic.run_cycle().await;
        }

        assert_eq!(
            fetched_urls(&memory),
            vec!["http://a/", "http://b/", "http://c/", "http://a/"]
        );
        assert_eq!(traffic.get_metrics().requests_total, 4);
    }

    #[tokio::test]
    async fn stats_follow_request_cadence_across_cycles() {
        let memory = MemoryOutput::new();
        let traffic = generator(config(Schedule::Sweep, 2), &memory);

        traffic.run_cycle().await;
        traffic.run_cycle().await;

        let stats: Vec<u64> = memory
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Stats(s) => Some(s.requests_total),
                _ => None,
            })
            .collect();
        assert_eq!(stats, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn zero_cadence_never_prints_stats() {
        let memory = MemoryOutput::new();
        let traffic = generator(config(Schedule::Sweep, 0), &memory);
        traffic.run_cycle().await;
        assert!(!memory.events().iter().any(|e| matches!(e, Event::Stats(_))));
    }

    #[tokio::test]
    async fn run_honours_max_cycles() {
        let memory = MemoryOutput::new();
        let mut cfg = config(Schedule::Sweep, 1);
        cfg.max_cycles = Some(2);
        let traffic = generator(cfg, &memory);

        traffic.run().await;

        assert_eq!(traffic.state(), GeneratorState::Stopped);
        assert_eq!(traffic.get_metrics().requests_total, 6);
        let events = memory.events();
        assert!(matches!(events.first(), Some(Event::Started { targets: 3, .. })));
        assert!(matches!(events.last(), Some(Event::Stopped(s)) if s.requests_total == 6));
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::CycleComplete { .. })).count(),
            1
        );
    }

    #[tokio::test]
    async fn stop_interrupts_a_long_pause() {
        let memory = MemoryOutput::new();
        let mut cfg = config(Schedule::Rotate, 0);
        cfg.cycle_delay_ms = Some(60_000);
        let traffic = Arc::new(generator(cfg, &memory));

        let runner = traffic.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        let mut state = traffic.watch_state();
        state.wait_for(|s| *s == GeneratorState::Running).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        traffic.stop();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("generator did not stop")
            .unwrap();
        assert_eq!(traffic.state(), GeneratorState::Stopped);
        assert_eq!(traffic.get_metrics().requests_total, 1);
    }
}
