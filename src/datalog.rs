//! Optional append-only binary log of write traffic.
//!
//! Frame layout: `u32 key_len | u32 payload_len | key bytes | payload bytes`,
//! lengths big-endian. The payload is the bincode encoding of the record's
//! fields in sorted field order; a logged read miss carries an empty payload.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use tracing::warn;

use crate::error::Result;
use crate::ops::FieldMap;

pub struct DataLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl DataLogger {
    /// Create the log file. The process id is appended to the configured
    /// base name so that concurrent adapter processes do not clobber each
    /// other's logs.
    pub fn open(base: &Path) -> Result<Self> {
        let mut name = base.as_os_str().to_os_string();
        name.push(process::id().to_string());
        let path = PathBuf::from(name);
        let file = File::create(&path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// The actual file path, including the process-id suffix.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record frame.
    pub fn append(&self, key: &str, fields: &FieldMap) -> Result<()> {
        let mut pairs: Vec<(&str, &[u8])> = fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_slice()))
            .collect();
        pairs.sort_by_key(|(field, _)| *field);
        let payload = if pairs.is_empty() {
            Vec::new()
        } else {
            bincode::serialize(&pairs)?
        };

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.write_all(&(key.len() as u32).to_be_bytes())?;
        writer.write_all(&(payload.len() as u32).to_be_bytes())?;
        writer.write_all(key.as_bytes())?;
        writer.write_all(&payload)?;
        Ok(())
    }

    /// Flush buffered frames to disk.
    pub fn flush(&self) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.flush()?;
        Ok(())
    }

    /// Flush and close the log.
    pub fn close(self) -> Result<()> {
        self.flush()
    }
}

impl Drop for DataLogger {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writer.flush() {
            warn!(error = %e, "failed to flush operation log on drop");
        }
    }
}
