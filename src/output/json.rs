use super::{OutputHandler, Record};
use crate::error::Result;
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Appends one JSON object per line.
pub struct JsonOutput {
    file: File,
}

impl JsonOutput {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self { file })
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn write(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.file, record)?;
        writeln!(self.file)?;
        self.file.flush()?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
