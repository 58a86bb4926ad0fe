use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Language ecosystems that can be probed with their own package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Java,
    Python,
    #[serde(alias = "node")]
    NodeJs,
    DotNet,
    Ruby,
}

/// How an ecosystem is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// One install (and load test) per dependency
    PerDependency,
    /// One invocation over the whole generated manifest
    WholeManifest,
}

/// Static facts about one ecosystem.
#[derive(Debug)]
pub struct EcosystemProfile {
    pub ecosystem: Ecosystem,
    pub runtime: &'static str,
    pub purl_types: &'static [&'static str],
    pub type_keywords: &'static [&'static str],
    pub file_extensions: &'static [&'static str],
    pub well_known_packages: &'static [&'static str],
    /// Tools that must be on PATH for native probing
    pub tools: &'static [&'static str],
    pub manifest_file_name: &'static str,
    pub strategy: ProbeStrategy,
    pub install_timeout: Duration,
    pub test_timeout: Duration,
    pub success_exit_codes: &'static [i32],
    pub default_runtime_version: &'static str,
    /// `{version}` is substituted with the runtime version
    pub base_image: &'static str,
    pub verbose_env: (&'static str, &'static str),
}

static PROFILES: [EcosystemProfile; 5] = [
    EcosystemProfile {
        ecosystem: Ecosystem::Java,
        runtime: "java",
        purl_types: &["maven", "gradle"],
        type_keywords: &["maven", "gradle", "jar", "java", "java-archive"],
        file_extensions: &[".jar", ".war", ".ear"],
        well_known_packages: &[
            "spring-boot", "spring-core", "hibernate", "jackson", "junit", "mockito", "slf4j",
            "logback", "apache-commons", "guava", "gson",
        ],
        tools: &["mvn", "java"],
        manifest_file_name: "pom.xml",
        strategy: ProbeStrategy::WholeManifest,
        install_timeout: Duration::from_secs(300),
        test_timeout: Duration::from_secs(60),
        success_exit_codes: &[0, 2],
        default_runtime_version: "17",
        base_image: "maven:3-eclipse-temurin-{version}",
        verbose_env: ("DEBUG", "1"),
    },
    EcosystemProfile {
        ecosystem: Ecosystem::Python,
        runtime: "python",
        purl_types: &["pypi"],
        type_keywords: &["python", "pypi", "pip"],
        file_extensions: &[".py", ".whl"],
        well_known_packages: &[
            "pip", "setuptools", "wheel", "virtualenv", "numpy", "pandas", "django", "flask",
            "requests", "pytest", "sphinx", "pillow", "matplotlib",
        ],
        tools: &["python3"],
        manifest_file_name: "requirements.txt",
        strategy: ProbeStrategy::PerDependency,
        install_timeout: Duration::from_secs(300),
        test_timeout: Duration::from_secs(60),
        success_exit_codes: &[0],
        default_runtime_version: "3.11",
        base_image: "python:{version}-slim",
        verbose_env: ("DEBUG", "1"),
    },
    EcosystemProfile {
        ecosystem: Ecosystem::NodeJs,
        runtime: "nodejs",
        purl_types: &["npm"],
        type_keywords: &["npm", "node", "javascript"],
        file_extensions: &[".js", ".mjs", ".ts"],
        well_known_packages: &[
            "npm", "express", "react", "angular", "vue", "lodash", "axios", "webpack", "babel",
            "typescript", "jest", "mocha", "eslint", "prettier",
        ],
        tools: &["npm", "node"],
        manifest_file_name: "package.json",
        strategy: ProbeStrategy::PerDependency,
        install_timeout: Duration::from_secs(300),
        test_timeout: Duration::from_secs(60),
        success_exit_codes: &[0],
        default_runtime_version: "20",
        base_image: "node:{version}-alpine",
        verbose_env: ("NODE_LOG_LEVEL", "DEBUG"),
    },
    EcosystemProfile {
        ecosystem: Ecosystem::DotNet,
        runtime: "dotnet",
        purl_types: &["nuget"],
        type_keywords: &["nuget", "dotnet", "csharp", "vb.net"],
        file_extensions: &[".dll", ".nupkg"],
        well_known_packages: &[
            "microsoft.netcore.app", "microsoft.aspnetcore.app", "newtonsoft.json",
            "system.text.json", "entityframework", "microsoft.entityframeworkcore", "serilog",
            "automapper", "fluentvalidation", "xunit", "nunit",
        ],
        tools: &["dotnet"],
        manifest_file_name: "test.csproj",
        strategy: ProbeStrategy::WholeManifest,
        install_timeout: Duration::from_secs(120),
        test_timeout: Duration::from_secs(60),
        success_exit_codes: &[0],
        default_runtime_version: "8.0",
        base_image: "mcr.microsoft.com/dotnet/sdk:{version}",
        verbose_env: ("DEBUG", "1"),
    },
    EcosystemProfile {
        ecosystem: Ecosystem::Ruby,
        runtime: "ruby",
        purl_types: &["gem", "rubygems"],
        type_keywords: &["gem", "ruby", "rubygems"],
        file_extensions: &[".rb", ".gem"],
        well_known_packages: &[
            "rails", "railties", "activerecord", "actionpack", "activesupport", "nokogiri",
            "puma", "unicorn", "sidekiq", "devise", "rspec", "bundler", "rake", "ffi", "sassc",
            "bootsnap", "capistrano", "factory_bot", "faker",
        ],
        tools: &["gem", "ruby"],
        manifest_file_name: "Gemfile",
        strategy: ProbeStrategy::PerDependency,
        install_timeout: Duration::from_secs(300),
        test_timeout: Duration::from_secs(60),
        success_exit_codes: &[0],
        default_runtime_version: "3.2",
        base_image: "ruby:{version}-alpine",
        verbose_env: ("DEBUG", "1"),
    },
];

impl Ecosystem {
    pub const ALL: [Ecosystem; 5] = [
        Ecosystem::Java,
        Ecosystem::Python,
        Ecosystem::NodeJs,
        Ecosystem::DotNet,
        Ecosystem::Ruby,
    ];

    pub fn profile(&self) -> &'static EcosystemProfile {
        let index = match self {
            Ecosystem::Java => 0,
            Ecosystem::Python => 1,
            Ecosystem::NodeJs => 2,
            Ecosystem::DotNet => 3,
            Ecosystem::Ruby => 4,
        };
        &PROFILES[index]
    }

    pub fn runtime(&self) -> &'static str {
        self.profile().runtime
    }

    pub fn from_purl_type(purl_type: &str) -> Option<Self> {
        let purl_type = purl_type.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.profile().purl_types.contains(&purl_type.as_str()))
    }

    /// Image reference rendered from the profile's base image template.
    pub fn base_image(&self, runtime_version: &str) -> String {
        self.profile().base_image.replace("{version}", runtime_version)
    }

    pub fn is_success_exit_code(&self, code: i32) -> bool {
        self.profile().success_exit_codes.contains(&code)
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.runtime())
    }
}

impl FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "java" | "maven" => Ok(Ecosystem::Java),
            "python" | "pypi" => Ok(Ecosystem::Python),
            "nodejs" | "node" | "npm" => Ok(Ecosystem::NodeJs),
            "dotnet" | ".net" | "nuget" => Ok(Ecosystem::DotNet),
            "ruby" | "gem" | "rubygems" => Ok(Ecosystem::Ruby),
            other => Err(format!(
                "Invalid ecosystem: {}. Valid values are: java, python, nodejs, dotnet, ruby",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_are_indexed_by_ecosystem() {
        for ecosystem in Ecosystem::ALL {
            assert_eq!(ecosystem.profile().ecosystem, ecosystem);
        }
    }

    #[test]
    fn test_from_purl_type() {
        assert_eq!(Ecosystem::from_purl_type("npm"), Some(Ecosystem::NodeJs));
        assert_eq!(Ecosystem::from_purl_type("Gradle"), Some(Ecosystem::Java));
        assert_eq!(Ecosystem::from_purl_type("rubygems"), Some(Ecosystem::Ruby));
        assert_eq!(Ecosystem::from_purl_type("rpm"), None);
    }

    #[test]
    fn test_base_image_substitutes_version() {
        assert_eq!(Ecosystem::NodeJs.base_image("20"), "node:20-alpine");
        assert_eq!(
            Ecosystem::Java.base_image("17"),
            "maven:3-eclipse-temurin-17"
        );
    }

    #[test]
    fn test_java_accepts_exit_code_two() {
        assert!(Ecosystem::Java.is_success_exit_code(2));
        assert!(!Ecosystem::Python.is_success_exit_code(2));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Node".parse::<Ecosystem>().unwrap(), Ecosystem::NodeJs);
        assert_eq!("dotnet".parse::<Ecosystem>().unwrap(), Ecosystem::DotNet);
        assert!("cobol".parse::<Ecosystem>().is_err());
    }

    #[test]
    fn test_serde_uses_runtime_names() {
        let json = serde_json::to_string(&Ecosystem::NodeJs).unwrap();
        assert_eq!(json, "\"nodejs\"");
        let parsed: Ecosystem = serde_json::from_str("\"dotnet\"").unwrap();
        assert_eq!(parsed, Ecosystem::DotNet);
    }
}
