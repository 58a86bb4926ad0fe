/// Execution mode for runtime probes
///
/// Chosen once per run; `Auto` lets the environment factory pick between a
/// native process and a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Native inside managed build services, else container when a runtime is available
    #[default]
    Auto,
    /// Package managers installed on the host, run in temporary directories
    Native,
    /// Docker or Podman with generated per-runtime images
    Container,
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ExecutionMode::Auto),
            "native" | "local" => Ok(ExecutionMode::Native),
            "container" | "docker" | "podman" => Ok(ExecutionMode::Container),
            _ => Err(format!(
                "Invalid execution mode: {}. Please specify 'auto', 'native' or 'container'",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Auto => write!(f, "auto"),
            ExecutionMode::Native => write!(f, "native"),
            ExecutionMode::Container => write!(f, "container"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_execution_mode_from_str() {
        assert_eq!(ExecutionMode::from_str("auto").unwrap(), ExecutionMode::Auto);
        assert_eq!(ExecutionMode::from_str("Native").unwrap(), ExecutionMode::Native);
        assert_eq!(ExecutionMode::from_str("DOCKER").unwrap(), ExecutionMode::Container);
    }

    #[test]
    fn test_execution_mode_from_str_invalid() {
        let error = ExecutionMode::from_str("vm").unwrap_err();
        assert!(error.contains("Invalid execution mode"));
        assert!(error.contains("container"));
    }

    #[test]
    fn test_execution_mode_display_round_trips() {
        for mode in [ExecutionMode::Auto, ExecutionMode::Native, ExecutionMode::Container] {
            assert_eq!(ExecutionMode::from_str(&mode.to_string()).unwrap(), mode);
        }
    }
}
