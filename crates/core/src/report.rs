//! Line-oriented report file writer.

use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the report one line at a time through a single buffered handle.
///
/// The file is truncated on creation. Contents reach disk on [`finish`]
/// or when the writer is dropped.
///
/// [`finish`]: ReportWriter::finish
pub struct ReportWriter {
    path: PathBuf,
    out: BufWriter<File>,
    lines: usize,
}

impl ReportWriter {
    /// Create or truncate the report file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        log::debug!("Report file opened: {}", path.display());
        Ok(Self {
            path,
            out: BufWriter::new(file),
            lines: 0,
        })
    }

    /// Append `line` followed by a newline.
    pub fn line(&mut self, line: impl AsRef<str>) -> Result<()> {
        self.out.write_all(line.as_ref().as_bytes())?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Append an empty line.
    pub fn blank(&mut self) -> Result<()> {
        self.line("")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered output and close the file.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.out.flush()?;
        log::debug!("Report file closed after {} lines", self.lines);
        Ok(self.path)
    }
}
