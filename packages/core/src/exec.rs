// ABOUTME: External command execution behind a trait so docker and git calls can be scripted in tests
// ABOUTME: Arguments are always passed as a vector, never through a shell

use std::io;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Captured result of one finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Convenience constructor for a successful run
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command} {}' exited with {}: {}", .args.join(" "), exit_label(.code), .stderr.trim())]
    Failed {
        command: String,
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

impl ExecError {
    /// Captured stderr of a failed command, empty for spawn failures
    pub fn stderr(&self) -> &str {
        match self {
            ExecError::Failed { stderr, .. } => stderr,
            ExecError::Spawn { .. } => "",
        }
    }
}

/// Runs external programs. Implemented by [`SystemRunner`] and by scripted fakes in tests.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and capture its output. Only spawn failures are errors.
    fn output(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;

    /// Run and return trimmed stdout, failing on a non-zero exit
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ExecError> {
        let out = self
            .output(program, args)
            .map_err(|source| ExecError::Spawn {
                command: program.to_string(),
                source,
            })?;

        if out.success() {
            Ok(out.stdout.trim().to_string())
        } else {
            Err(ExecError::Failed {
                command: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                code: out.status,
                stderr: out.stderr,
            })
        }
    }

    /// Like [`CommandRunner::run`] but any failure becomes `None`
    fn run_safe(&self, program: &str, args: &[&str]) -> Option<String> {
        self.run(program, args).ok()
    }
}

/// Runs real processes with stdin closed
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        debug!("exec: {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.success() {
            debug!(
                "exec: {} exited with {:?}: {}",
                program,
                result.status,
                result.stderr.trim()
            );
        }

        Ok(result)
    }
}
