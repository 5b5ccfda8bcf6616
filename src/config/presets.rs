//! Built-in target lists and pacing for the three generators.

use crate::config::schema::{GeneratorConfig, GeneratorKind, OutputConfig, Schedule};

pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;
pub const DOWNLOAD_MAX_BYTES: u64 = 20 * 1024 * 1024;
pub const PROGRESS_INTERVAL_BYTES: u64 = 1024 * 1024;

pub const DOWNLOAD_TARGETS: &[&str] = &[
    "https://speed.hetzner.de/100MB.bin",
    "https://proof.ovh.net/files/10Mb.dat",
    "http://ipv4.download.thinkbroadband.com/10MB.zip",
    "https://ash-speed.hetzner.com/100MB.bin",
];

pub const API_TARGETS: &[&str] = &[
    "https://httpbin.org/get",
    "https://jsonplaceholder.typicode.com/posts",
    "https://jsonplaceholder.typicode.com/comments",
    "https://api.github.com/repos/nodejs/node",
    "https://httpbin.org/headers",
    "https://jsonplaceholder.typicode.com/users",
];

pub const WEBPAGE_TARGETS: &[&str] = &[
    "https://www.wikipedia.org/",
    "https://news.ycombinator.com/",
    "https://github.com/trending",
    "https://stackoverflow.com/questions",
    "https://www.reddit.com/r/programming/.json",
    "https://httpbin.org/html",
];

pub fn targets(kind: GeneratorKind) -> &'static [&'static str] {
    match kind {
        GeneratorKind::Download => DOWNLOAD_TARGETS,
        GeneratorKind::Api => API_TARGETS,
        GeneratorKind::Webpage => WEBPAGE_TARGETS,
    }
}

pub fn timeout_secs(kind: GeneratorKind) -> u64 {
    match kind {
        GeneratorKind::Download => 30,
        GeneratorKind::Api | GeneratorKind::Webpage => 15,
    }
}

pub fn request_delay_ms(kind: GeneratorKind) -> u64 {
    match kind {
        GeneratorKind::Download => 0,
        GeneratorKind::Api => 500,
        GeneratorKind::Webpage => 1_000,
    }
}

pub fn cycle_delay_ms(kind: GeneratorKind) -> u64 {
    match kind {
        GeneratorKind::Download => 5_000,
        GeneratorKind::Api => 2_000,
        GeneratorKind::Webpage => 3_000,
    }
}

pub fn stats_every(kind: GeneratorKind) -> u64 {
    match kind {
        GeneratorKind::Download => 0,
        GeneratorKind::Api => 10,
        GeneratorKind::Webpage => 1,
    }
}

pub fn schedule(kind: GeneratorKind) -> Schedule {
    match kind {
        GeneratorKind::Download => Schedule::Rotate,
        GeneratorKind::Api | GeneratorKind::Webpage => Schedule::Sweep,
    }
}

/// Fully populated config for `kind`, as the generator runs with no arguments.
pub fn preset(kind: GeneratorKind) -> GeneratorConfig {
    GeneratorConfig {
        name: kind.to_string(),
        kind: Some(kind),
        targets: targets(kind).iter().map(|s| s.to_string()).collect(),
        timeout_secs: Some(timeout_secs(kind)),
        request_delay_ms: Some(request_delay_ms(kind)),
        cycle_delay_ms: Some(cycle_delay_ms(kind)),
        stats_every: Some(stats_every(kind)),
        schedule: Some(schedule(kind)),
        max_bytes: match kind {
            GeneratorKind::Download => Some(DOWNLOAD_MAX_BYTES),
            _ => None,
        },
        chunk_size: match kind {
            GeneratorKind::Download => Some(DOWNLOAD_CHUNK_SIZE as u64),
            _ => None,
        },
        max_cycles: None,
        output: vec![OutputConfig::Console],
        extends: None,
    }
}
