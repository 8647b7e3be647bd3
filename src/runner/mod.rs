use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{Error, Result};
use crate::sweep::EnvOverlay;

/// Captured result of one external step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl StepOutput {
    /// Successful step with the given standard output.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed step with the given exit code and standard error.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr, for diagnostics.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !text.ends_with('\n') && !self.stderr.is_empty() {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

/// The external build + benchmark tool.
///
/// Both steps block until the process has exited and its output has been
/// collected. `Err` means the step could not be started at all.
pub trait BenchRunner {
    /// Compiles the benchmark program for the given environment.
    fn build(&mut self, env: &EnvOverlay) -> io::Result<StepOutput>;

    /// Runs the benchmark harness and captures what it prints.
    fn run(&mut self, env: &EnvOverlay) -> io::Result<StepOutput>;
}

/// A program with its arguments, e.g. `cargo bench --quiet`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory, defaults to the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            dir: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(Error::config("command without program"));
        }
        Ok(())
    }

    fn execute(&self, env: &EnvOverlay) -> io::Result<StepOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(env);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output()?;
        Ok(StepOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs real subprocesses.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    build: CommandSpec,
    run: CommandSpec,
}

impl CommandRunner {
    pub fn new(build: CommandSpec, run: CommandSpec) -> Self {
        Self { build, run }
    }
}

impl BenchRunner for CommandRunner {
    fn build(&mut self, env: &EnvOverlay) -> io::Result<StepOutput> {
        self.build.execute(env)
    }

    fn run(&mut self, env: &EnvOverlay) -> io::Result<StepOutput> {
        self.run.execute(env)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvOverlay {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn overlay_reaches_the_process() {
        let mut runner = CommandRunner::new(
            CommandSpec::new("sh", &["-c", "true"]),
            CommandSpec::new("sh", &["-c", "echo \"LEN is $LEN\""]),
        );
        let output = runner.run(&env(&[("LEN", "42")])).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "LEN is 42");
    }

    #[test]
    fn non_zero_exit_is_captured() {
        let mut runner = CommandRunner::new(
            CommandSpec::new("sh", &["-c", "echo broken >&2; exit 3"]),
            CommandSpec::new("sh", &["-c", "true"]),
        );
        let output = runner.build(&EnvOverlay::new()).unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stderr.trim(), "broken");
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let mut runner = CommandRunner::new(
            CommandSpec::new("definitely-not-a-real-program-4711", &[]),
            CommandSpec::new("sh", &["-c", "true"]),
        );
        assert!(runner.build(&EnvOverlay::new()).is_err());
    }

    #[test]
    fn combined_output_keeps_both_streams() {
        let output = StepOutput {
            success: false,
            code: Some(1),
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        assert_eq!(output.combined(), "out\nerr");
        assert_eq!(CommandSpec::new("cargo", &["bench", "--quiet"]).to_string(), "cargo bench --quiet");
    }
}
