//! Handle to a running engine process.

use std::io::{self, PipeReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::process::Child;

/// A spawned engine child with its merged stdout+stderr pipe.
///
/// The child is spawned with `kill_on_drop(true)`: dropping the handle while
/// the engine is still running kills it. The output pipe must be taken and
/// drained by the owner, otherwise a chatty engine blocks on a full pipe.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    output: Option<PipeReader>,
    command_line: Vec<String>,
    working_dir: PathBuf,
    started: Instant,
}

impl EngineProcess {
    pub(crate) fn new(
        child: Child,
        output: PipeReader,
        command_line: Vec<String>,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            child,
            output: Some(output),
            command_line,
            working_dir,
            started: Instant::now(),
        }
    }

    /// OS process id, `None` once the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Program followed by its arguments.
    pub fn command_line(&self) -> &[String] {
        &self.command_line
    }

    /// The command line joined with spaces, for messages.
    pub fn command_text(&self) -> String {
        self.command_line.join(" ")
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Take the read end of the merged output pipe. Returns `None` after the
    /// first call.
    pub fn take_output(&mut self) -> Option<PipeReader> {
        self.output.take()
    }

    /// Wait for exit. A child terminated by a signal reports `-1`.
    pub async fn wait(&mut self) -> io::Result<i32> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Kill the child and reap it.
    pub async fn kill(&mut self) -> io::Result<()> {
        self.child.kill().await
    }
}
