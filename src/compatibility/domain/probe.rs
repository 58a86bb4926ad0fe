use crate::compatibility::domain::Ecosystem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Failure taxonomy for package-manager probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    NativeBuild,
    Permissions,
    Dependency,
    /// The probe exceeded its phase time budget
    Timeout,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::NativeBuild => "native_build",
            ErrorCategory::Permissions => "permissions",
            ErrorCategory::Dependency => "dependency",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Failures worth retrying with the same inputs.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Timeout)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbePhase {
    Install,
    Test,
}

/// One package-manager invocation inside the probe working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeCommand {
    pub program: String,
    pub args: Vec<String>,
    pub phase: ProbePhase,
    pub env: Vec<(String, String)>,
}

impl ProbeCommand {
    pub fn new(program: &str, args: &[&str], phase: ProbePhase) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            phase,
            env: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Shell-style rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything an execution environment needs to run one probe.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub ecosystem: Ecosystem,
    /// File name the manifest is written under inside the working directory
    pub manifest_file_name: String,
    pub manifest_content: String,
    pub commands: Vec<ProbeCommand>,
    /// Human-readable subject, e.g. "node-sass@4.0.0" or a manifest name
    pub label: String,
}

/// Captured outcome of a probe. Failures are data, never errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub failed_phase: Option<ProbePhase>,
    /// Environment-level failure (tool missing, working directory unusable, ...)
    pub error: Option<String>,
    /// Build descriptors and compiled binaries found in the working directory
    pub native_artifacts: Vec<String>,
    pub environment: String,
    pub duration: Duration,
}

impl ProbeOutput {
    pub fn succeeded(environment: &str, stdout: &str) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.to_string(),
            environment: environment.to_string(),
            ..Default::default()
        }
    }

    pub fn failed(environment: &str, phase: ProbePhase, stderr: &str) -> Self {
        Self {
            success: false,
            exit_code: Some(1),
            stderr: stderr.to_string(),
            failed_phase: Some(phase),
            environment: environment.to_string(),
            ..Default::default()
        }
    }

    pub fn environment_failure(environment: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            failed_phase: Some(ProbePhase::Install),
            environment: environment.to_string(),
            ..Default::default()
        }
    }

    /// stdout, stderr and any environment error joined for keyword scanning.
    pub fn combined_log(&self) -> String {
        let mut parts = Vec::new();
        if !self.stdout.trim().is_empty() {
            parts.push(self.stdout.trim_end());
        }
        if !self.stderr.trim().is_empty() {
            parts.push(self.stderr.trim_end());
        }
        if let Some(error) = self.error.as_deref() {
            parts.push(error);
        }
        parts.join("\n")
    }

    pub fn install_succeeded(&self) -> bool {
        self.success || self.failed_phase == Some(ProbePhase::Test)
    }
}

/// Result of `check_prerequisites`: `(ok, missing_tools)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisites {
    pub ok: bool,
    pub missing_tools: Vec<String>,
}

impl Prerequisites {
    pub fn from_missing(missing_tools: Vec<String>) -> Self {
        Self {
            ok: missing_tools.is_empty(),
            missing_tools,
        }
    }
}
