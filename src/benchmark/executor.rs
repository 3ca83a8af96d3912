//! Out-of-process executor for performance binaries

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ArraySize, ReportSink, Variant};
use crate::error::{DriverError, DriverResult};

/// One invocation of a performance binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub variant: Variant,
    pub array_size: ArraySize,
    /// Passed as the only argument
    pub iterations: u64,
    pub executable: PathBuf,
}

/// How a launched benchmark finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Exited with status 0
    Success,
    /// Exited with a non-zero status
    Failed { exit_code: i32 },
    /// Terminated by a signal
    Signaled { signal: i32 },
}

impl LaunchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LaunchOutcome::Success)
    }
}

/// Runs one invocation to completion
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, invocation: &Invocation) -> DriverResult<LaunchOutcome>;
}

/// Launches the real executables as child processes.
///
/// The child's stdout is the report stream, so whatever it prints lands
/// right after the label fields the driver wrote. The C++ binaries print
/// their timing on stderr, so with a file report stderr joins the stream
/// unless told otherwise. There is no time limit: the driver waits for as
/// long as the benchmark takes.
pub struct ProcessLauncher {
    report: ReportSink,
    merge_stderr: bool,
}

impl ProcessLauncher {
    /// Create a launcher writing into `report`
    pub fn new(report: ReportSink) -> Self {
        let merge_stderr = report.is_file();
        Self {
            report,
            merge_stderr,
        }
    }

    /// Send the child's stderr into the report stream as well
    pub fn merge_stderr(mut self, merge: bool) -> Self {
        self.merge_stderr = merge;
        self
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, invocation: &Invocation) -> DriverResult<LaunchOutcome> {
        if !invocation.executable.is_file() {
            return Err(DriverError::MissingExecutable(invocation.executable.clone()));
        }

        let stderr = if self.merge_stderr {
            self.report.child_stdio()?
        } else {
            Stdio::inherit()
        };

        let launch_error = |source| DriverError::Launch {
            executable: invocation.executable.clone(),
            source,
        };

        // kill_on_drop: an interrupted run must not leave the benchmark behind
        let mut child = Command::new(&invocation.executable)
            .arg(invocation.iterations.to_string())
            .stdin(Stdio::null())
            .stdout(self.report.child_stdio()?)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(launch_error)?;

        let status = child.wait().await.map_err(launch_error)?;

        if status.success() {
            return Ok(LaunchOutcome::Success);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Ok(LaunchOutcome::Signaled { signal });
            }
        }

        Ok(LaunchOutcome::Failed {
            exit_code: status.code().unwrap_or(-1),
        })
    }
}
