// src/trace.rs
// =============================================================================
// The trace log: a plain-text file that gets a copy of every user-facing
// log line plus the raw per-request trace output.
//
// TraceSink is opened once in main() and handed by reference to everything
// that logs (sitemap resolver, probe scheduler, pipeline). The file is
// flushed and closed when the sink is dropped, so an early `?` return on a
// fatal error still leaves a complete log behind.
//
// Rust concepts:
// - Drop: code that runs automatically when a value goes out of scope
// - Mutex: lets `&self` methods write to the file
// =============================================================================

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AuditError;

pub struct TraceSink {
    path: Option<PathBuf>,
    file: Option<Mutex<BufWriter<File>>>,
}

impl TraceSink {
    /// Creates (or truncates) the trace log at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| {
            AuditError::io(format!("cannot open trace log file {}", path.display()), e)
        })?;

        Ok(Self {
            path: Some(path),
            file: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    /// A sink that only logs through tracing and writes no file
    pub fn disabled() -> Self {
        Self {
            path: None,
            file: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        tracing::info!("{}", msg);
        self.record(msg);
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        tracing::warn!("{}", msg);
        self.record(&format!("Warning: {}", msg));
    }

    /// Appends a line to the file only (raw trace output goes here and to
    /// the debug log)
    pub fn record(&self, line: &str) {
        let Some(file) = &self.file else {
            return;
        };

        // A poisoned lock only means another writer panicked mid-line;
        // the file handle itself is still usable.
        let mut writer = file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(writer, "{}", line) {
            tracing::debug!("trace log write failed: {}", e);
        }
    }
}

impl Drop for TraceSink {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let mut writer = file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_flushed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");

        {
            let sink = TraceSink::open(&path).unwrap();
            sink.info("Sitemap: https://example.com/sitemap.xml");
            sink.warn("skipping nested sitemap");
            sink.record("<< HTTP/1.1 200 OK");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Sitemap: https://example.com/sitemap.xml",
                "Warning: skipping nested sitemap",
                "<< HTTP/1.1 200 OK",
            ]
        );
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("trace.log");
        assert!(TraceSink::open(&path).is_err());
    }

    #[test]
    fn test_disabled_sink_has_no_path() {
        let sink = TraceSink::disabled();
        sink.info("nothing to write");
        assert!(sink.path().is_none());
    }
}
