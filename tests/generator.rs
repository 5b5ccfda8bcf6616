use std::time::Duration;
use trafficgen::config::{ConfigLoader, GeneratorConfig, GeneratorKind, OutputConfig};
use trafficgen::output::memory::MemoryOutput;
use trafficgen::output::Record;
use trafficgen::{Event, FailureKind, GeneratorState, TrafficGenerator};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with_good_and_slow() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 1000]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    server
}

fn fast_config(kind: GeneratorKind, server: &MockServer) -> GeneratorConfig {
    let cfg = GeneratorConfig {
        kind: Some(kind),
        targets: vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())],
        timeout_secs: Some(1),
        request_delay_ms: Some(0),
        cycle_delay_ms: Some(0),
        ..Default::default()
    };
    ConfigLoader::resolve(cfg).unwrap()
}

#[tokio::test]
async fn one_cycle_counts_success_and_timeout() {
    let server = server_with_good_and_slow().await;
    let cfg = fast_config(GeneratorKind::Api, &server);
    let memory = MemoryOutput::new();
    let traffic = TrafficGenerator::from_config(cfg, vec![Box::new(memory.clone())]).unwrap();

    traffic.run_cycle().await;

    let metrics = traffic.get_metrics();
    assert_eq!(metrics.total_bytes, 1000);
    assert_eq!(metrics.requests_total, 2);
    assert_eq!(metrics.requests_failed, 1);

    let events = memory.events();
    let successes: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Fetched(o) => Some(o),
            _ => None,
        })
        .collect();
    assert_eq!(successes.len(), 1);
    assert!(successes[0].url.ends_with("/a"));
    assert_eq!(successes[0].bytes, 1000);

    let failures: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Failed { url, kind, .. } => Some((url.clone(), *kind)),
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.ends_with("/b"));
    assert_eq!(failures[0].1, FailureKind::Timeout);
}

#[tokio::test]
async fn loop_keeps_going_after_failures() {
    let server = server_with_good_and_slow().await;
    let mut cfg = fast_config(GeneratorKind::Webpage, &server);
    cfg.max_cycles = Some(2);
    let memory = MemoryOutput::new();
    let traffic = TrafficGenerator::from_config(cfg, vec![Box::new(memory.clone())]).unwrap();

    traffic.run().await;

    assert_eq!(traffic.state(), GeneratorState::Stopped);
    let metrics = traffic.get_metrics();
    assert_eq!(metrics.requests_total, 4);
    assert_eq!(metrics.total_bytes, 2000);

    // webpage preset prints stats after every request
    let stats: Vec<_> = memory
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Stats(s) => Some((s.requests_total, s.total_bytes)),
            _ => None,
        })
        .collect();
    assert_eq!(stats, vec![(1, 1000), (2, 1000), (3, 2000), (4, 2000)]);
}

#[tokio::test]
async fn download_rotates_and_writes_json_lines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 40 * 1024]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("events.jsonl");
    let cfg = ConfigLoader::resolve(GeneratorConfig {
        kind: Some(GeneratorKind::Download),
        targets: vec![format!("{}/one", server.uri()), format!("{}/two", server.uri())],
        max_bytes: Some(16 * 1024),
        cycle_delay_ms: Some(0),
        max_cycles: Some(3),
        output: vec![OutputConfig::Json {
            path: log_path.display().to_string(),
        }],
        ..Default::default()
    })
    .unwrap();

    let outputs = ConfigLoader::create_outputs(&cfg, None).unwrap();
    let traffic = TrafficGenerator::from_config(cfg, outputs).unwrap();
    traffic.run().await;

    let content = std::fs::read_to_string(&log_path).unwrap();
    let records: Vec<Record> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    let fetched: Vec<_> = records
        .iter()
        .filter_map(|r| match &r.event {
            Event::Fetched(o) => Some(o.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(fetched.len(), 3);
    assert!(fetched[0].url.ends_with("/one"));
    assert!(fetched[1].url.ends_with("/two"));
    assert!(fetched[2].url.ends_with("/one"));
    assert!(fetched.iter().all(|o| o.truncated && o.bytes == 24 * 1024));
    assert!(fetched.iter().all(|o| o.bytes_per_second.is_some()));

    assert!(records.iter().all(|r| r.generator == "download"));
    assert!(!records.iter().any(|r| matches!(r.event, Event::Stats(_))));
    assert!(matches!(records.last().map(|r| &r.event), Some(Event::Stopped(_))));
}
