use crate::adapters::outbound::execution::{ContainerEnvironment, NativeEnvironment, PhaseTimeouts};
use crate::application::dto::ExecutionMode;
use crate::compatibility::domain::Ecosystem;
use crate::ports::outbound::ExecutionEnvironment;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Environment variables set by managed build services, where probes run natively
pub const MANAGED_BUILD_MARKERS: &[&str] = &["CODEBUILD_BUILD_ID"];
const FALLBACK_CONTAINER_TOOL: &str = "docker";

/// Which environment a run uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentChoice {
    Native,
    /// Container tool to drive
    Container(String),
}

/// Inputs for building the execution environment
#[derive(Debug, Clone, Default)]
pub struct ExecutionEnvironmentSettings {
    pub mode: ExecutionMode,
    /// OS tag baked into container image names
    pub os_tag: String,
    pub runtime_versions: BTreeMap<Ecosystem, String>,
    pub timeouts: PhaseTimeouts,
    pub keep_temp: bool,
}

/// Factory for choosing the execution environment once per run
pub struct ExecutionEnvironmentFactory;

impl ExecutionEnvironmentFactory {
    /// Resolves the execution mode against the host.
    ///
    /// `Auto` runs natively inside managed build services, uses a container
    /// tool when one is available, and otherwise runs natively. An explicit
    /// container request without a tool still yields a container choice so
    /// the missing tool surfaces through the prerequisite check.
    pub fn choose(
        mode: ExecutionMode,
        managed_build: bool,
        container_tool: Option<&str>,
    ) -> EnvironmentChoice {
        match mode {
            ExecutionMode::Native => EnvironmentChoice::Native,
            ExecutionMode::Container => EnvironmentChoice::Container(
                container_tool.unwrap_or(FALLBACK_CONTAINER_TOOL).to_string(),
            ),
            ExecutionMode::Auto if managed_build => EnvironmentChoice::Native,
            ExecutionMode::Auto => match container_tool {
                Some(tool) => EnvironmentChoice::Container(tool.to_string()),
                None => EnvironmentChoice::Native,
            },
        }
    }

    pub fn is_managed_build() -> bool {
        MANAGED_BUILD_MARKERS
            .iter()
            .any(|marker| std::env::var_os(marker).is_some())
    }

    pub fn create(settings: &ExecutionEnvironmentSettings) -> Arc<dyn ExecutionEnvironment> {
        let choice = Self::choose(
            settings.mode,
            Self::is_managed_build(),
            ContainerEnvironment::detect_tool(),
        );
        tracing::debug!(mode = %settings.mode, choice = ?choice, "selected execution environment");
        match choice {
            EnvironmentChoice::Native => Arc::new(
                NativeEnvironment::new()
                    .with_timeouts(settings.timeouts)
                    .with_keep_temp(settings.keep_temp),
            ),
            EnvironmentChoice::Container(tool) => Arc::new(
                ContainerEnvironment::new(&tool, &settings.os_tag)
                    .with_runtime_versions(settings.runtime_versions.clone())
                    .with_timeouts(settings.timeouts)
                    .with_keep_temp(settings.keep_temp),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_modes() {
        assert_eq!(
            ExecutionEnvironmentFactory::choose(ExecutionMode::Native, false, Some("docker")),
            EnvironmentChoice::Native
        );
        assert_eq!(
            ExecutionEnvironmentFactory::choose(ExecutionMode::Container, false, Some("podman")),
            EnvironmentChoice::Container("podman".to_string())
        );
        assert_eq!(
            ExecutionEnvironmentFactory::choose(ExecutionMode::Container, false, None),
            EnvironmentChoice::Container("docker".to_string())
        );
    }

    #[test]
    fn test_auto_mode() {
        assert_eq!(
            ExecutionEnvironmentFactory::choose(ExecutionMode::Auto, true, Some("docker")),
            EnvironmentChoice::Native
        );
        assert_eq!(
            ExecutionEnvironmentFactory::choose(ExecutionMode::Auto, false, Some("docker")),
            EnvironmentChoice::Container("docker".to_string())
        );
        assert_eq!(
            ExecutionEnvironmentFactory::choose(ExecutionMode::Auto, false, None),
            EnvironmentChoice::Native
        );
    }

    #[test]
    fn test_create_native_environment() {
        let settings = ExecutionEnvironmentSettings {
            mode: ExecutionMode::Native,
            ..Default::default()
        };
        let environment = ExecutionEnvironmentFactory::create(&settings);
        assert_eq!(environment.name(), "native");
    }
}
