//! JSON Lines corpus sink
//!
//! Every successfully extracted page becomes one line of JSON in the corpus file. Each
//! line is written with a single `write_all`, flushed and synced before `append`
//! returns, so a crash can at worst leave one partial trailing line, which append mode
//! repairs on the next run.

use crate::CorpusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// One extracted page, as consumed by the downstream chunking pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Normalized URL of the page
    pub url: String,

    /// Page title; the URL when the page has none
    pub title: String,

    /// Main-content text
    pub text_content: String,

    /// Extraction time (RFC 3339, UTC)
    pub extracted_at: DateTime<Utc>,

    /// BFS depth at which the page was discovered
    pub depth: u32,

    /// Entry point whose crawl produced the page
    pub source_entry_point: String,
}

/// Durable, append-only destination for page records
///
/// A failed append is fatal to the crawl: callers must stop rather than continue with
/// a corpus that silently misses records.
pub trait CorpusWriter: Send {
    /// Persists one record before returning
    fn append(&mut self, record: &PageRecord) -> Result<(), CorpusError>;

    /// Number of records appended through this writer
    fn records_written(&self) -> u64;
}

/// How an existing corpus file is treated when the writer opens it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Start a fresh corpus, discarding any previous content
    #[default]
    Truncate,

    /// Keep previous records and add new ones after them
    Append,
}

/// Writes records as JSON Lines to a file
#[derive(Debug)]
pub struct JsonlCorpusWriter {
    file: File,
    path: PathBuf,
    written: u64,
}

impl JsonlCorpusWriter {
    /// Opens (or creates) the corpus file
    ///
    /// Missing parent directories are created. In [`OpenMode::Append`] a partial
    /// trailing line left by an interrupted run is removed first.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self, CorpusError> {
        let path = path.as_ref().to_path_buf();
        let persistence = |source: io::Error| CorpusError::Persistence {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(persistence)?;
        }

        let file = match mode {
            OpenMode::Truncate => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)
                .map_err(persistence)?,
            OpenMode::Append => {
                let removed = repair_partial_line(&path).map_err(persistence)?;
                if removed > 0 {
                    tracing::warn!(
                        "Removed {} bytes of a partial record from the end of {}",
                        removed,
                        path.display()
                    );
                }

                OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(&path)
                    .map_err(persistence)?
            }
        };

        tracing::debug!("Opened corpus file {} ({:?})", path.display(), mode);

        Ok(Self {
            file,
            path,
            written: 0,
        })
    }

    /// Path of the corpus file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusWriter for JsonlCorpusWriter {
    fn append(&mut self, record: &PageRecord) -> Result<(), CorpusError> {
        let mut line = serde_json::to_vec(record).map_err(|source| CorpusError::Serialize {
            url: record.url.clone(),
            source,
        })?;
        line.push(b'\n');

        append_line(&mut self.file, &line).map_err(|source| CorpusError::Persistence {
            path: self.path.display().to_string(),
            source,
        })?;

        self.written += 1;
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.written
    }
}

/// A file the corpus can be appended to and rolled back on
trait RecordFile: Write {
    fn end(&mut self) -> io::Result<u64>;
    fn sync(&mut self) -> io::Result<()>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl RecordFile for File {
    fn end(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len)).map(|_| ())
    }
}

/// Writes one complete line, or nothing
///
/// On a failed write, flush or sync the file is cut back to its previous length so no
/// partial record is left behind.
fn append_line<F: RecordFile>(file: &mut F, line: &[u8]) -> io::Result<()> {
    let previous = file.end()?;

    let result = file
        .write_all(line)
        .and_then(|_| file.flush())
        .and_then(|_| file.sync());

    if let Err(e) = result {
        if let Err(rollback) = file.truncate_to(previous).and_then(|_| file.sync()) {
            tracing::error!(
                "Failed to remove partial record after write error: {}",
                rollback
            );
        }
        return Err(e);
    }

    Ok(())
}

/// Truncates the file after its last newline
///
/// Returns the number of bytes removed. A missing file is left alone.
fn repair_partial_line(path: &Path) -> io::Result<u64> {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let len = file.metadata()?.len();
    let mut buf = [0u8; 4096];
    let mut pos = len;

    // Scan backwards for the last newline
    let keep = loop {
        if pos == 0 {
            break 0;
        }

        let chunk = pos.min(buf.len() as u64) as usize;
        pos -= chunk as u64;
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(&mut buf[..chunk])?;

        if let Some(idx) = buf[..chunk].iter().rposition(|&b| b == b'\n') {
            break pos + idx as u64 + 1;
        }
    };

    if keep < len {
        file.set_len(keep)?;
        file.sync_all()?;
    }

    Ok(len - keep)
}

/// Reads every record of a corpus file
///
/// Blank lines are skipped; any other line that does not parse is an error.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<PageRecord>, CorpusError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let persistence = |source: io::Error| CorpusError::Persistence {
        path: display.clone(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(persistence)?);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(persistence)?;
        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line).map_err(|source| CorpusError::CorruptRecord {
            path: display.clone(),
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Counts the records of a corpus file without parsing them
pub fn count_records(path: impl AsRef<Path>) -> Result<u64, CorpusError> {
    let path = path.as_ref();
    let persistence = |source: io::Error| CorpusError::Persistence {
        path: path.display().to_string(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(persistence)?);
    let mut count = 0;

    for line in reader.lines() {
        if !line.map_err(persistence)?.trim().is_empty() {
            count += 1;
        }
    }

    Ok(count)
}
