use super::dockerfile::{self, CONTAINER_WORKDIR};
use super::process::{run_command, run_probe_commands, tool_available, Invocation, PhaseTimeouts};
use crate::compatibility::domain::{Ecosystem, Prerequisites, ProbeCommand, ProbeOutput, ProbeRequest};
use crate::compatibility::services::NativeBuildDetector;
use crate::ports::outbound::ExecutionEnvironment;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Container tools in preference order
pub const CONTAINER_TOOLS: [&str; 2] = ["docker", "podman"];
const IMAGE_BUILD_TIMEOUT: Duration = Duration::from_secs(900);
const IMAGE_REMOVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs probes inside per-ecosystem images with the work directory mounted
/// at `/workspace`.
pub struct ContainerEnvironment {
    tool: String,
    os_tag: String,
    runtime_versions: BTreeMap<Ecosystem, String>,
    timeouts: PhaseTimeouts,
    /// Images built (or confirmed present) during this run
    images: Mutex<BTreeSet<String>>,
    /// Images this run built itself, removed on cleanup
    built: Mutex<Vec<String>>,
    keep_temp: bool,
    /// Mounted work directories left on disk because of `keep_temp`
    preserved: std::sync::Mutex<Vec<PathBuf>>,
}

impl ContainerEnvironment {
    pub fn new(tool: &str, os_tag: &str) -> Self {
        Self {
            tool: tool.to_string(),
            os_tag: os_tag.to_string(),
            runtime_versions: BTreeMap::new(),
            timeouts: PhaseTimeouts::default(),
            images: Mutex::new(BTreeSet::new()),
            built: Mutex::new(Vec::new()),
            keep_temp: false,
            preserved: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// First available container tool on PATH.
    pub fn detect_tool() -> Option<&'static str> {
        CONTAINER_TOOLS.into_iter().find(|tool| tool_available(tool))
    }

    pub fn with_runtime_versions(mut self, versions: BTreeMap<Ecosystem, String>) -> Self {
        self.runtime_versions = versions;
        self
    }

    pub fn with_timeouts(mut self, timeouts: PhaseTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Leaves mounted work directories on disk instead of deleting them.
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

    /// Drops a finished work directory, or keeps it when `keep_temp` is set.
    fn release_work_dir(&self, dir: tempfile::TempDir) {
        if !self.keep_temp {
            return;
        }
        let path = dir.keep();
        tracing::info!(path = %path.display(), "preserving probe directory");
        if let Ok(mut preserved) = self.preserved.lock() {
            preserved.push(path);
        }
    }

    pub fn runtime_version(&self, ecosystem: Ecosystem) -> &str {
        self.runtime_versions
            .get(&ecosystem)
            .map(String::as_str)
            .unwrap_or(ecosystem.profile().default_runtime_version)
    }

    pub fn image_tag(&self, ecosystem: Ecosystem) -> String {
        dockerfile::image_tag(ecosystem, self.runtime_version(ecosystem), &self.os_tag)
    }

    /// `docker run` wrapping of a probe command.
    pub fn wrap(&self, image: &str, work_dir: &Path, command: &ProbeCommand) -> Invocation {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            format!("{}:{}", work_dir.display(), CONTAINER_WORKDIR),
            "-w".to_string(),
            CONTAINER_WORKDIR.to_string(),
        ];
        for (key, value) in &command.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(image.to_string());
        args.push(command.program.clone());
        args.extend(command.args.iter().cloned());
        Invocation {
            program: self.tool.clone(),
            args,
            env: Vec::new(),
        }
    }

    /// Reuses a local image when present, otherwise builds it.
    async fn ensure_image(&self, ecosystem: Ecosystem) -> Result<String, String> {
        let tag = self.image_tag(ecosystem);
        let mut images = self.images.lock().await;
        if images.contains(&tag) {
            return Ok(tag);
        }

        let inspect = run_command(
            &self.tool,
            &["image".to_string(), "inspect".to_string(), tag.clone()],
            None,
            &[],
            IMAGE_REMOVE_TIMEOUT,
        )
        .await;
        if inspect.is_success() {
            tracing::debug!(image = %tag, "reusing existing image");
            images.insert(tag.clone());
            return Ok(tag);
        }

        let context = tempfile::Builder::new()
            .prefix(&format!("graviton_{}_{}_", self.tool, ecosystem.runtime()))
            .tempdir()
            .map_err(|e| format!("Failed to create image build directory: {}", e))?;
        let content = dockerfile::render(ecosystem, self.runtime_version(ecosystem));
        fs::write(context.path().join("Dockerfile"), content)
            .map_err(|e| format!("Failed to write Dockerfile: {}", e))?;

        tracing::info!(image = %tag, tool = %self.tool, "building probe image");
        let build = run_command(
            &self.tool,
            &[
                "build".to_string(),
                "-t".to_string(),
                tag.clone(),
                ".".to_string(),
            ],
            Some(context.path()),
            &[],
            IMAGE_BUILD_TIMEOUT,
        )
        .await;
        if !build.is_success() {
            let reason = build
                .spawn_error
                .unwrap_or_else(|| format!("{}\n{}", build.stdout, build.stderr));
            return Err(format!("Failed to build image {}: {}", tag, reason.trim()));
        }

        images.insert(tag.clone());
        self.built.lock().await.push(tag.clone());
        Ok(tag)
    }
}

#[async_trait]
impl ExecutionEnvironment for ContainerEnvironment {
    fn name(&self) -> &str {
        &self.tool
    }

    async fn check_prerequisites(&self, _ecosystem: Ecosystem) -> Prerequisites {
        let outcome = run_command(
            &self.tool,
            &["--version".to_string()],
            None,
            &[],
            Duration::from_secs(10),
        )
        .await;
        if outcome.is_success() {
            Prerequisites::from_missing(Vec::new())
        } else {
            Prerequisites::from_missing(vec![self.tool.clone()])
        }
    }

    async fn execute(&self, request: &ProbeRequest) -> ProbeOutput {
        let started = Instant::now();
        let image = match self.ensure_image(request.ecosystem).await {
            Ok(image) => image,
            Err(e) => return ProbeOutput::environment_failure(&self.tool, e),
        };

        let work_dir = match tempfile::Builder::new()
            .prefix(&format!("graviton_{}_", request.ecosystem.runtime()))
            .tempdir()
        {
            Ok(dir) => dir,
            Err(e) => {
                return ProbeOutput::environment_failure(
                    &self.tool,
                    format!("Failed to create probe directory: {}", e),
                )
            }
        };
        let manifest_path = work_dir.path().join(&request.manifest_file_name);
        if let Err(e) = fs::write(&manifest_path, &request.manifest_content) {
            return ProbeOutput::environment_failure(
                &self.tool,
                format!("Failed to write {}: {}", manifest_path.display(), e),
            );
        }

        let mount = work_dir.path().to_path_buf();
        let mut output = run_probe_commands(
            &self.tool,
            request.ecosystem,
            &request.commands,
            self.timeouts,
            None,
            |command| self.wrap(&image, &mount, command),
        )
        .await;
        output.native_artifacts = NativeBuildDetector::scan_directory(work_dir.path());
        output.duration = started.elapsed();
        self.release_work_dir(work_dir);
        output
    }

    async fn cleanup(&self, skip: bool) {
        let built = std::mem::take(&mut *self.built.lock().await);
        if skip {
            for image in &built {
                tracing::info!(image = %image, "preserving probe image");
            }
            return;
        }
        let dirs = self
            .preserved
            .lock()
            .map(|mut preserved| std::mem::take(&mut *preserved))
            .unwrap_or_default();
        for dir in dirs {
            if let Err(e) = fs::remove_dir_all(&dir) {
                tracing::warn!(path = %dir.display(), error = %e, "failed to remove probe directory");
            }
        }
        for image in built {
            let outcome = run_command(
                &self.tool,
                &["rmi".to_string(), "-f".to_string(), image.clone()],
                None,
                &[],
                IMAGE_REMOVE_TIMEOUT,
            )
            .await;
            if !outcome.is_success() {
                tracing::warn!(image = %image, stderr = %outcome.stderr.trim(), "failed to remove image");
            }
        }
        self.images.lock().await.clear();
    }
}
