//! Subprocess plumbing shared by the execution environments.

use crate::compatibility::domain::{Ecosystem, ProbeCommand, ProbeOutput, ProbePhase};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// Captured result of one subprocess.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    /// Set when the process could not be started at all
    pub spawn_error: Option<String>,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out && self.spawn_error.is_none()
    }
}

/// A program invocation after an environment has wrapped a probe command.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn direct(command: &ProbeCommand) -> Self {
        Self {
            program: command.program.clone(),
            args: command.args.clone(),
            env: command.env.clone(),
        }
    }
}

/// Per-phase time budgets. Unset phases use the ecosystem's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimeouts {
    pub install: Option<Duration>,
    pub test: Option<Duration>,
}

impl PhaseTimeouts {
    pub fn for_phase(&self, ecosystem: Ecosystem, phase: ProbePhase) -> Duration {
        let profile = ecosystem.profile();
        match phase {
            ProbePhase::Install => self.install.unwrap_or(profile.install_timeout),
            ProbePhase::Test => self.test.unwrap_or(profile.test_timeout),
        }
    }
}

pub fn tool_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Runs one program, killing it when `limit` elapses.
pub async fn run_command(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    env: &[(String, String)],
    limit: Duration,
) -> CommandOutcome {
    let mut command = Command::new(program);
    command
        .args(args)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    match timeout(limit, command.output()).await {
        Ok(Ok(output)) => CommandOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            ..Default::default()
        },
        Ok(Err(e)) => CommandOutcome {
            spawn_error: Some(format!("Failed to run {}: {}", program, e)),
            ..Default::default()
        },
        Err(_) => CommandOutcome {
            timed_out: true,
            stderr: format!("{} timed out after {}s", program, limit.as_secs()),
            ..Default::default()
        },
    }
}

/// Runs probe commands in order and stops at the first failing one.
///
/// `launch` turns each command into the invocation actually executed, which
/// lets the container environment wrap commands in `docker run`.
pub async fn run_probe_commands<F>(
    environment: &str,
    ecosystem: Ecosystem,
    commands: &[ProbeCommand],
    timeouts: PhaseTimeouts,
    cwd: Option<&Path>,
    launch: F,
) -> ProbeOutput
where
    F: Fn(&ProbeCommand) -> Invocation,
{
    let started = Instant::now();
    let mut output = ProbeOutput {
        success: true,
        environment: environment.to_string(),
        ..Default::default()
    };

    for command in commands {
        let invocation = launch(command);
        let limit = timeouts.for_phase(ecosystem, command.phase);
        tracing::debug!(
            environment,
            command = %command.display(),
            timeout_secs = limit.as_secs(),
            "running probe command"
        );
        let outcome = run_command(
            &invocation.program,
            &invocation.args,
            cwd,
            &invocation.env,
            limit,
        )
        .await;

        append(&mut output.stdout, &outcome.stdout);
        append(&mut output.stderr, &outcome.stderr);
        output.exit_code = outcome.exit_code;

        let failed = if let Some(error) = outcome.spawn_error {
            output.error = Some(error);
            true
        } else if outcome.timed_out {
            output.timed_out = true;
            true
        } else {
            !outcome
                .exit_code
                .is_some_and(|code| ecosystem.is_success_exit_code(code))
        };

        if failed {
            tracing::debug!(
                environment,
                command = %command.display(),
                exit_code = ?outcome.exit_code,
                "probe command failed"
            );
            output.success = false;
            output.failed_phase = Some(command.phase);
            break;
        }
    }

    output.duration = started.elapsed();
    output
}

fn append(buffer: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !buffer.is_empty() && !buffer.ends_with('\n') {
        buffer.push('\n');
    }
    buffer.push_str(text);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, phase: ProbePhase) -> ProbeCommand {
        ProbeCommand::new("sh", &["-c"], phase).with_arg(script)
    }

    #[tokio::test]
    async fn test_run_command_captures_output() {
        let outcome = run_command(
            "sh",
            &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
            None,
            &[],
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stdout.trim(), "out");
        assert_eq!(outcome.stderr.trim(), "err");
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_run_command_times_out() {
        let outcome = run_command(
            "sh",
            &["-c".to_string(), "sleep 5".to_string()],
            None,
            &[],
            Duration::from_millis(100),
        )
        .await;
        assert!(outcome.timed_out);
        assert!(outcome.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_command_missing_program() {
        let outcome = run_command(
            "definitely-not-a-real-tool-1234",
            &[],
            None,
            &[],
            Duration::from_secs(5),
        )
        .await;
        assert!(outcome.spawn_error.is_some());
        assert_eq!(outcome.exit_code, None);
    }

    #[tokio::test]
    async fn test_probe_stops_at_first_failure() {
        let commands = vec![
            sh("echo installing", ProbePhase::Install),
            sh("echo cannot load >&2; exit 1", ProbePhase::Test),
            sh("echo never", ProbePhase::Test),
        ];
        let output = run_probe_commands(
            "native",
            Ecosystem::NodeJs,
            &commands,
            PhaseTimeouts::default(),
            None,
            Invocation::direct,
        )
        .await;

        assert!(!output.success);
        assert_eq!(output.failed_phase, Some(ProbePhase::Test));
        assert!(output.install_succeeded());
        assert!(!output.stdout.contains("never"));
        assert!(output.stderr.contains("cannot load"));
    }

    #[tokio::test]
    async fn test_probe_honours_ecosystem_exit_codes() {
        let commands = vec![sh("exit 2", ProbePhase::Install)];
        let java = run_probe_commands(
            "native",
            Ecosystem::Java,
            &commands,
            PhaseTimeouts::default(),
            None,
            Invocation::direct,
        )
        .await;
        assert!(java.success);

        let node = run_probe_commands(
            "native",
            Ecosystem::NodeJs,
            &commands,
            PhaseTimeouts::default(),
            None,
            Invocation::direct,
        )
        .await;
        assert!(!node.success);
        assert_eq!(node.exit_code, Some(2));
    }

    #[tokio::test]
    async fn test_probe_passes_command_env() {
        let commands =
            vec![sh("echo $NODE_LOG_LEVEL", ProbePhase::Install).with_env("NODE_LOG_LEVEL", "DEBUG")];
        let output = run_probe_commands(
            "native",
            Ecosystem::NodeJs,
            &commands,
            PhaseTimeouts::default(),
            None,
            Invocation::direct,
        )
        .await;
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "DEBUG");
    }

    #[test]
    fn test_phase_timeouts_fall_back_to_profile() {
        let timeouts = PhaseTimeouts {
            install: Some(Duration::from_secs(30)),
            test: None,
        };
        assert_eq!(
            timeouts.for_phase(Ecosystem::DotNet, ProbePhase::Install),
            Duration::from_secs(30)
        );
        assert_eq!(
            timeouts.for_phase(Ecosystem::DotNet, ProbePhase::Test),
            Duration::from_secs(60)
        );
    }
}
