//! NDJSON dataset loader and report writers.
//!
//! Inputs are newline-delimited JSON, one decision per line. Blank lines are
//! skipped; a line that is not valid JSON aborts the load with its line
//! number. Missing or mistyped fields inside a valid object never abort.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON on line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loader bound to one NDJSON file.
pub struct DataLoader {
    path: PathBuf,
}

impl DataLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load every record in the file.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, LoaderError> {
        if !self.path.exists() {
            return Err(LoaderError::FileNotFound(self.path.display().to_string()));
        }
        let file = File::open(&self.path)?;
        let records = read_ndjson(BufReader::new(file))?;
        debug!(path = %self.path.display(), rows = records.len(), "Loaded NDJSON");
        Ok(records)
    }
}

/// Parse NDJSON from any reader.
pub fn read_ndjson<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, LoaderError> {
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| LoaderError::MalformedLine {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write records as NDJSON, one compact object per line.
pub fn write_ndjson<T: Serialize, W: Write>(writer: W, records: &[T]) -> Result<(), LoaderError> {
    let mut writer = BufWriter::new(writer);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_ndjson_file<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<(), LoaderError> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    write_ndjson(File::create(path)?, records)
}

/// Write a single value as pretty-printed JSON.
pub fn write_json_file<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), LoaderError> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<(), LoaderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
