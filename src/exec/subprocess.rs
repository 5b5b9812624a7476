//! Subprocess execution

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::error::{hints, ReleaseError};
use crate::utils::terminal::print_command;

/// A fully-specified external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name, resolved on PATH
    pub program: String,
    /// Arguments, passed verbatim (no shell)
    pub args: Vec<String>,
    /// Working directory, inherited when unset
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in a specific directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a subprocess execution
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code (`None` when killed by a signal)
    pub exit_code: Option<i32>,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, duration: Duration) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code(),
            duration,
        }
    }
}

/// Capability to run external processes
///
/// Every build, transfer and publish step goes through this seam, so the
/// orchestration can be exercised with a fake.
pub trait CommandRunner {
    /// Run the command to completion
    fn run(&self, invocation: &Invocation) -> Result<CommandResult>;

    /// Run the command and fail unless it exits with status 0
    fn run_checked(&self, invocation: &Invocation) -> Result<CommandResult> {
        let result = self.run(invocation)?;
        if !result.success {
            return Err(ReleaseError::command_failed(invocation.to_string(), result.exit_code).into());
        }
        Ok(result)
    }
}

/// Runs commands on the host, streaming their output to the console
#[derive(Debug, Default)]
pub struct SystemRunner {
    verbose: bool,
}

impl SystemRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        print_command(&invocation.to_string());

        if !command_exists(&invocation.program) {
            return Err(ReleaseError::missing_tool(
                &invocation.program,
                "release builds",
                tool_hint(&invocation.program),
            )
            .into());
        }

        let result = run_command(invocation)?;
        if self.verbose {
            eprintln!(
                "    {} finished in {:.2}s",
                invocation.program,
                result.duration.as_secs_f64()
            );
        }
        Ok(result)
    }
}

/// Run a command with inherited stdin/stdout/stderr
pub fn run_command(invocation: &Invocation) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args);
    if let Some(dir) = &invocation.cwd {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::inherit());
    cmd.stdout(Stdio::inherit());
    cmd.stderr(Stdio::inherit());

    let status = cmd
        .status()
        .with_context(|| format!("Failed to execute {}", invocation.program))?;

    Ok(CommandResult::from_status(status, start.elapsed()))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

fn tool_hint(program: &str) -> &'static str {
    match program {
        "flutter" => hints::flutter(),
        "rsync" => hints::rsync(),
        _ => "Install it and make sure it is on your PATH.",
    }
}
