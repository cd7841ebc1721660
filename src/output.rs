use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};

use camino::Utf8Path;
use serde::Serialize;
use tracing::info;

use crate::app::{ExportResult, ProgressEvent, ProgressSink};
use crate::error::KeggError;
use crate::table::RectangularTable;

/// Writes the table next to `path` and renames it into place once complete.
pub fn write_table_atomic(path: &Utf8Path, table: &RectangularTable) -> Result<(), KeggError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KeggError::Filesystem(err.to_string()))?;
    // Opened like a regular file so the table gets the umask-derived mode, not 0600.
    let mut temp = tempfile::Builder::new()
        .prefix(".keggpull")
        .suffix(".tsv.tmp")
        .make_in(parent.as_std_path(), |candidate| {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(candidate)
        })
        .map_err(|err| KeggError::Filesystem(err.to_string()))?;
    table
        .write_to(BufWriter::new(temp.as_file_mut()))
        .map_err(|err| KeggError::Filesystem(format!("write {path}: {err}")))?;
    temp.persist(path.as_std_path())
        .map_err(|err| KeggError::Filesystem(format!("persist {path}: {err}")))?;
    Ok(())
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_export(result: &ExportResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the `tracing` subscriber at info level.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "{}",
                event.message
            ),
            None => info!("{}", event.message),
        }
    }
}
