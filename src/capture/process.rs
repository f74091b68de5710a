// SPDX-License-Identifier: GPL-3.0-only

//! Process execution for the capture tools
//!
//! [`ToolRunner`] is the seam between the controller and the operating
//! system: the real [`SystemToolRunner`] spawns processes, tests substitute a
//! recording fake. [`PreviewSession`] owns the preview process and guarantees
//! it is terminated and reaped on every exit path.

use super::commands::ToolInvocation;
use crate::errors::{CaptureError, CaptureResult, ExitInfo, Tool};
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::{debug, error, info, warn};

/// A started external process that can be stopped
pub trait RunningTool {
    /// OS process id, if any
    fn id(&self) -> Option<u32>;

    /// Whether the process has already exited on its own
    fn has_exited(&mut self) -> std::io::Result<bool>;

    /// Send the termination signal and block until the process has exited
    fn terminate(&mut self) -> std::io::Result<()>;
}

/// Executes tool invocations
pub trait ToolRunner {
    /// Run to completion; non-zero exit is an error
    fn run(&self, invocation: &ToolInvocation) -> CaptureResult<()>;

    /// Start a long-running process and hand back its handle
    fn spawn(&self, invocation: &ToolInvocation) -> CaptureResult<Box<dyn RunningTool>>;

    /// Start a process whose completion nobody waits for
    fn spawn_detached(&self, invocation: &ToolInvocation) -> CaptureResult<()>;
}

/// Where a tool's stdout and stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolOutput {
    /// Share the caller's terminal
    #[default]
    Inherit,
    /// Read line by line into `debug!` events, keeping a full-screen UI intact
    Log,
}

/// Runner backed by `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner {
    output: ToolOutput,
}

impl SystemToolRunner {
    pub fn new(output: ToolOutput) -> Self {
        Self { output }
    }

    pub fn output(&self) -> ToolOutput {
        self.output
    }

    fn command(&self, invocation: &ToolInvocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());
        if self.output == ToolOutput::Log {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        cmd
    }

    fn start(&self, invocation: &ToolInvocation) -> CaptureResult<Child> {
        debug!(command = %invocation, "Spawning tool");
        let mut child = self.command(invocation).spawn().map_err(|e| {
            error!(tool = %invocation.tool, program = %invocation.program, error = %e, "Failed to start tool");
            CaptureError::ExternalToolFailure {
                tool: invocation.tool,
                exit: ExitInfo::Spawn(e.to_string()),
            }
        })?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, invocation.tool, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, invocation.tool, "stderr");
        }
        Ok(child)
    }
}

/// Drain a piped stream on its own thread so the child never blocks on a full pipe
fn forward_lines<S: Read + Send + 'static>(stream: S, tool: Tool, name: &'static str) {
    std::thread::spawn(move || {
        for line in BufReader::new(stream).split(b'\n') {
            match line {
                Ok(line) => {
                    let text = String::from_utf8_lossy(&line);
                    let text = text.trim_end();
                    if !text.is_empty() {
                        debug!(%tool, stream = name, "{}", text);
                    }
                }
                Err(_) => break,
            }
        }
    });
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> CaptureResult<()> {
        let mut child = self.start(invocation)?;
        let status = child.wait().map_err(|e| CaptureError::ExternalToolFailure {
            tool: invocation.tool,
            exit: ExitInfo::Wait(e.to_string()),
        })?;

        match exit_failure(status) {
            None => {
                debug!(tool = %invocation.tool, "Tool finished");
                Ok(())
            }
            Some(exit) => {
                error!(tool = %invocation.tool, exit = %exit, "Tool failed");
                Err(CaptureError::ExternalToolFailure {
                    tool: invocation.tool,
                    exit,
                })
            }
        }
    }

    fn spawn(&self, invocation: &ToolInvocation) -> CaptureResult<Box<dyn RunningTool>> {
        let child = self.start(invocation)?;
        info!(tool = %invocation.tool, pid = child.id(), "Started tool");
        Ok(Box::new(ChildProcess { child }))
    }

    fn spawn_detached(&self, invocation: &ToolInvocation) -> CaptureResult<()> {
        let mut child = self.start(invocation)?;
        let tool = invocation.tool;
        let pid = child.id();
        info!(%tool, pid, "Started detached tool");

        // Reap in the background so the process never lingers as a zombie
        std::thread::spawn(move || match child.wait() {
            Ok(status) => match exit_failure(status) {
                None => info!(%tool, pid, "Detached tool finished"),
                Some(exit) => warn!(%tool, pid, exit = %exit, "Detached tool failed"),
            },
            Err(e) => warn!(%tool, pid, error = %e, "Failed to wait for detached tool"),
        });
        Ok(())
    }
}

/// Why a finished process counts as failed, or `None` on success
fn exit_failure(status: ExitStatus) -> Option<ExitInfo> {
    if status.success() {
        return None;
    }
    if let Some(code) = status.code() {
        return Some(ExitInfo::Code(code));
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(ExitInfo::Signal(signal));
        }
    }
    Some(ExitInfo::Wait(format!("unrecognised exit status {:?}", status)))
}

/// Real child process
struct ChildProcess {
    child: Child,
}

impl RunningTool for ChildProcess {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn has_exited(&mut self) -> std::io::Result<bool> {
        Ok(self.child.try_wait()?.is_some())
    }

    fn terminate(&mut self) -> std::io::Result<()> {
        // Already gone: just make sure it is reaped
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }

        #[cfg(unix)]
        {
            // SIGTERM lets the preview window close cleanly, unlike Child::kill
            let pid = self.child.id() as libc::pid_t;
            let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                warn!(pid, error = %err, "SIGTERM failed, killing");
                self.child.kill()?;
            }
        }
        #[cfg(not(unix))]
        {
            self.child.kill()?;
        }

        self.child.wait()?;
        Ok(())
    }
}

/// Exclusive ownership of a running preview.
///
/// Dropping the session terminates the preview and waits for it.
pub struct PreviewSession {
    selector: u8,
    process: Option<Box<dyn RunningTool>>,
}

impl PreviewSession {
    /// Launch the preview through `runner`
    pub fn start<R: ToolRunner + ?Sized>(
        runner: &R,
        invocation: &ToolInvocation,
        selector: u8,
    ) -> CaptureResult<Self> {
        debug_assert_eq!(invocation.tool, Tool::Preview);
        let process = runner.spawn(invocation)?;
        info!(selector, pid = ?process.id(), "Camera preview started");
        Ok(Self {
            selector,
            process: Some(process),
        })
    }

    /// Resolution selector the preview runs at
    pub fn selector(&self) -> u8 {
        self.selector
    }

    /// Whether the preview ended without being stopped, e.g. its window was closed
    pub fn has_exited(&mut self) -> bool {
        match self.process.as_mut().map(|p| p.has_exited()) {
            Some(Ok(exited)) => exited,
            Some(Err(e)) => {
                warn!(error = %e, "Failed to poll camera preview");
                false
            }
            None => true,
        }
    }

    /// Terminate and wait for the preview
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(mut process) = self.process.take() {
            let pid = process.id();
            match process.terminate() {
                Ok(()) => info!(pid = ?pid, "Camera preview stopped"),
                Err(e) => warn!(pid = ?pid, error = %e, "Failed to stop camera preview"),
            }
        }
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSession")
            .field("selector", &self.selector)
            .field("pid", &self.process.as_ref().and_then(|p| p.id()))
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn invocation(tool: Tool, program: &str, args: &[&str]) -> ToolInvocation {
        ToolInvocation {
            tool,
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_run_success() {
        let runner = SystemToolRunner::default();
        assert!(runner.run(&invocation(Tool::Still, "true", &[])).is_ok());
    }

    #[test]
    fn test_logged_output_is_drained() {
        let runner = SystemToolRunner::new(ToolOutput::Log);
        assert_eq!(runner.output(), ToolOutput::Log);
        // Far more than a pipe buffer holds
        let noisy = invocation(
            Tool::Still,
            "sh",
            &["-c", "head -c 1000000 /dev/zero | tr '\\0' 'x'; echo done >&2"],
        );
        assert!(runner.run(&noisy).is_ok());
    }

    #[test]
    fn test_logged_output_keeps_exit_status() {
        let runner = SystemToolRunner::new(ToolOutput::Log);
        let err = runner
            .run(&invocation(Tool::Video, "sh", &["-c", "echo failing >&2; exit 4"]))
            .unwrap_err();
        assert_eq!(
            err,
            CaptureError::ExternalToolFailure {
                tool: Tool::Video,
                exit: ExitInfo::Code(4),
            }
        );
    }

    #[test]
    fn test_run_non_zero_exit() {
        let runner = SystemToolRunner::default();
        let err = runner
            .run(&invocation(Tool::Still, "sh", &["-c", "exit 3"]))
            .unwrap_err();
        assert_eq!(
            err,
            CaptureError::ExternalToolFailure {
                tool: Tool::Still,
                exit: ExitInfo::Code(3),
            }
        );
    }

    #[test]
    fn test_run_missing_program() {
        let runner = SystemToolRunner::default();
        let err = runner
            .run(&invocation(Tool::Video, "/nonexistent/rpicam-vid", &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            CaptureError::ExternalToolFailure {
                tool: Tool::Video,
                exit: ExitInfo::Spawn(_),
            }
        ));
    }

    #[test]
    fn test_preview_session_terminates_process() {
        let runner = SystemToolRunner::default();
        let session =
            PreviewSession::start(&runner, &invocation(Tool::Preview, "sleep", &["30"]), 1)
                .unwrap();
        assert_eq!(session.selector(), 1);
        let started = std::time::Instant::now();
        session.stop();
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_preview_session_notices_exit() {
        let runner = SystemToolRunner::default();
        let mut session =
            PreviewSession::start(&runner, &invocation(Tool::Preview, "true", &[]), 2).unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while !session.has_exited() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(session.has_exited());
    }

    #[test]
    fn test_terminate_after_exit_is_ok() {
        let runner = SystemToolRunner::default();
        let mut process = runner.spawn(&invocation(Tool::Preview, "true", &[])).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(200));
        assert!(process.terminate().is_ok());
    }
}
