use super::process::{run_probe_commands, tool_available, Invocation, PhaseTimeouts};
use crate::compatibility::domain::{Ecosystem, Prerequisites, ProbeOutput, ProbeRequest};
use crate::compatibility::services::NativeBuildDetector;
use crate::ports::outbound::ExecutionEnvironment;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

pub const NATIVE_ENVIRONMENT: &str = "native";

/// Runs probes directly on the host inside throwaway temporary directories.
pub struct NativeEnvironment {
    timeouts: PhaseTimeouts,
    keep_temp: bool,
    preserved: Mutex<Vec<PathBuf>>,
}

impl NativeEnvironment {
    pub fn new() -> Self {
        Self {
            timeouts: PhaseTimeouts::default(),
            keep_temp: false,
            preserved: Mutex::new(Vec::new()),
        }
    }

    pub fn with_timeouts(mut self, timeouts: PhaseTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Leaves probe directories on disk instead of deleting them.
    pub fn with_keep_temp(mut self, keep_temp: bool) -> Self {
        self.keep_temp = keep_temp;
        self
    }

    pub fn preserved_directories(&self) -> Vec<PathBuf> {
        self.preserved
            .lock()
            .map(|dirs| dirs.clone())
            .unwrap_or_default()
    }

    fn preserve(&self, dir: tempfile::TempDir) {
        let path = dir.keep();
        tracing::info!(path = %path.display(), "preserving probe directory");
        if let Ok(mut preserved) = self.preserved.lock() {
            preserved.push(path);
        }
    }
}

impl Default for NativeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionEnvironment for NativeEnvironment {
    fn name(&self) -> &str {
        NATIVE_ENVIRONMENT
    }

    async fn check_prerequisites(&self, ecosystem: Ecosystem) -> Prerequisites {
        let missing = ecosystem
            .profile()
            .tools
            .iter()
            .filter(|tool| !tool_available(tool))
            .map(|tool| tool.to_string())
            .collect();
        Prerequisites::from_missing(missing)
    }

    async fn execute(&self, request: &ProbeRequest) -> ProbeOutput {
        let started = Instant::now();
        let work_dir = match tempfile::Builder::new()
            .prefix(&format!("graviton_{}_", request.ecosystem.runtime()))
            .tempdir()
        {
            Ok(dir) => dir,
            Err(e) => {
                return ProbeOutput::environment_failure(
                    NATIVE_ENVIRONMENT,
                    format!("Failed to create probe directory: {}", e),
                )
            }
        };

        let manifest_path = work_dir.path().join(&request.manifest_file_name);
        if let Err(e) = fs::write(&manifest_path, &request.manifest_content) {
            return ProbeOutput::environment_failure(
                NATIVE_ENVIRONMENT,
                format!("Failed to write {}: {}", manifest_path.display(), e),
            );
        }

        tracing::debug!(label = %request.label, dir = %work_dir.path().display(), "native probe");
        let mut output = run_probe_commands(
            NATIVE_ENVIRONMENT,
            request.ecosystem,
            &request.commands,
            self.timeouts,
            Some(work_dir.path()),
            Invocation::direct,
        )
        .await;
        output.native_artifacts = NativeBuildDetector::scan_directory(work_dir.path());
        output.duration = started.elapsed();

        if self.keep_temp {
            self.preserve(work_dir);
        }
        output
    }

    async fn cleanup(&self, skip: bool) {
        let dirs = match self.preserved.lock() {
            Ok(mut preserved) if !skip => std::mem::take(&mut *preserved),
            _ => return,
        };
        for dir in dirs {
            if let Err(e) = fs::remove_dir_all(&dir) {
                tracing::warn!(path = %dir.display(), error = %e, "failed to remove probe directory");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::compatibility::domain::{ProbeCommand, ProbePhase};

    fn request(commands: Vec<ProbeCommand>) -> ProbeRequest {
        ProbeRequest {
            ecosystem: Ecosystem::NodeJs,
            manifest_file_name: "package.json".to_string(),
            manifest_content: "{\"name\": \"probe\"}".to_string(),
            commands,
            label: "probe".to_string(),
        }
    }

    fn sh(script: &str, phase: ProbePhase) -> ProbeCommand {
        ProbeCommand::new("sh", &["-c"], phase).with_arg(script)
    }

    #[tokio::test]
    async fn test_execute_runs_inside_work_dir_with_manifest() {
        let environment = NativeEnvironment::new();
        let output = environment
            .execute(&request(vec![sh("cat package.json; pwd", ProbePhase::Install)]))
            .await;

        assert!(output.success);
        assert!(output.stdout.contains("\"probe\""));
        assert!(output.stdout.contains("graviton_nodejs_"));
        assert_eq!(output.environment, "native");
    }

    #[tokio::test]
    async fn test_execute_scans_native_artifacts() {
        let environment = NativeEnvironment::new();
        let output = environment
            .execute(&request(vec![sh(
                "mkdir -p node_modules/pkg && touch node_modules/pkg/binding.gyp",
                ProbePhase::Install,
            )]))
            .await;
        assert_eq!(output.native_artifacts, vec!["node_modules/pkg/binding.gyp"]);
    }

    #[tokio::test]
    async fn test_work_dir_removed_unless_kept() {
        let environment = NativeEnvironment::new();
        let output = environment.execute(&request(vec![sh("pwd", ProbePhase::Install)])).await;
        let dir = PathBuf::from(output.stdout.trim());
        assert!(!dir.exists());

        let keeping = NativeEnvironment::new().with_keep_temp(true);
        let output = keeping.execute(&request(vec![sh("pwd", ProbePhase::Install)])).await;
        let dir = PathBuf::from(output.stdout.trim());
        assert!(dir.exists());
        assert_eq!(keeping.preserved_directories().len(), 1);

        keeping.cleanup(false).await;
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_missing_tool_is_captured_not_raised() {
        let environment = NativeEnvironment::new();
        let output = environment
            .execute(&request(vec![ProbeCommand::new(
                "definitely-not-a-real-tool-1234",
                &[],
                ProbePhase::Install,
            )]))
            .await;
        assert!(!output.success);
        assert!(output.error.is_some());
        assert_eq!(output.failed_phase, Some(ProbePhase::Install));
    }
}
