use super::{Event, OutputHandler, Record};
use crate::error::Result;
use async_trait::async_trait;
use indicatif::MultiProgress;
use std::io::Write;
use std::sync::Arc;

const MIB: f64 = 1024.0 * 1024.0;

pub struct ConsoleOutput {
    multi: Option<Arc<MultiProgress>>,
}

impl ConsoleOutput {
    pub fn new(multi: Option<Arc<MultiProgress>>) -> Self {
        Self { multi }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl OutputHandler for ConsoleOutput {
    async fn write(&mut self, record: &Record) -> Result<()> {
        let lines = render(record);

        if let Some(multi) = &self.multi {
            for line in lines {
                multi.println(line).map_err(|e| crate::error::Error::Internal(e.to_string()))?;
            }
        } else {
            let mut stdout = std::io::stdout().lock();
            for line in lines {
                writeln!(stdout, "{}", line)?;
            }
            stdout.flush()?;
        }
        Ok(())
    }
}

fn format_size(bytes: u64) -> String {
    if bytes as f64 >= MIB {
        format!("{:.2} MB", bytes as f64 / MIB)
    } else {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    }
}

/// Human-readable console lines for one record.
pub fn render(record: &Record) -> Vec<String> {
    let tag = &record.generator;
    match &record.event {
        Event::Started { kind, targets } => vec![
            "=".repeat(50),
            format!("{} traffic generator started ({} targets)", kind, targets),
            "=".repeat(50),
        ],
        Event::FetchStarted { url } => vec![format!("[{}] starting: {}", tag, url)],
        Event::Progress { bytes, bytes_per_second, .. } => vec![format!(
            "[{}] downloaded: {:.2} MB, speed: {:.2} KB/s",
            tag,
            *bytes as f64 / MIB,
            bytes_per_second / 1024.0
        )],
        Event::LimitReached { bytes, .. } => vec![format!(
            "[{}] reached limit at {:.2} MB, stopping",
            tag,
            *bytes as f64 / MIB
        )],
        Event::Fetched(outcome) => {
            let mut lines = vec![format!("[{}] {}", tag, outcome.url)];
            if let Some(title) = &outcome.title {
                lines.push(format!("      title: {}", title));
            }
            lines.push(format!(
                "      size: {} ({} bytes), took: {:.2}s",
                format_size(outcome.bytes),
                outcome.bytes,
                outcome.elapsed_ms as f64 / 1000.0
            ));
            if let Some(speed) = outcome.bytes_per_second {
                lines.push(format!(
                    "      done! total: {:.2} MB, avg speed: {:.2} KB/s",
                    outcome.bytes as f64 / MIB,
                    speed / 1024.0
                ));
            }
            lines
        }
        Event::Failed { url, kind, message } => {
            vec![format!("[{}] error {} ({}): {}", tag, url, kind, message)]
        }
        Event::Stats(snapshot) => vec![format!(
            "[stats] requests: {}, total: {:.2} KB, avg speed: {:.2} KB/s",
            snapshot.requests_total,
            snapshot.total_kb(),
            snapshot.kb_per_second()
        )],
        Event::CycleComplete { wait_ms } => vec![format!(
            "[{}] cycle complete, waiting {:.1}s...",
            tag,
            *wait_ms as f64 / 1000.0
        )],
        Event::Stopped(snapshot) => vec![format!(
            "[{}] stopped after {} requests, {} transferred",
            tag,
            snapshot.requests_total,
            format_size(snapshot.total_bytes)
        )],
    }
}
