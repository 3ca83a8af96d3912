//! Report stream shared by the driver and the benchmark executables
//!
//! The driver writes the label fields of a result line and the child
//! process completes it, so both must write to the same stream.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process::Stdio;

/// Where result lines go
#[derive(Debug)]
pub enum ReportSink {
    /// Process standard output
    Stdout(io::Stdout),
    /// File opened in append mode
    File(File),
}

impl ReportSink {
    pub fn stdout() -> Self {
        ReportSink::Stdout(io::stdout())
    }

    /// Open (or create) `path` for appending
    pub fn append_to(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(ReportSink::File(file))
    }

    /// Handle that lets a child process write into this stream
    pub fn child_stdio(&self) -> io::Result<Stdio> {
        match self {
            ReportSink::Stdout(_) => Ok(Stdio::from(io::stdout())),
            ReportSink::File(file) => Ok(Stdio::from(file.try_clone()?)),
        }
    }

    /// Whether results go to a file rather than a terminal or pipe
    pub fn is_file(&self) -> bool {
        matches!(self, ReportSink::File(_))
    }

    /// Independent handle to the same stream, for the launcher
    pub fn try_clone(&self) -> io::Result<Self> {
        match self {
            ReportSink::Stdout(_) => Ok(ReportSink::stdout()),
            ReportSink::File(file) => Ok(ReportSink::File(file.try_clone()?)),
        }
    }
}

impl Write for ReportSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ReportSink::Stdout(out) => out.write(buf),
            ReportSink::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ReportSink::Stdout(out) => out.flush(),
            ReportSink::File(file) => file.flush(),
        }
    }
}
