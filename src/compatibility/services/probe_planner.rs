use crate::compatibility::domain::{Dependency, Ecosystem, ProbeCommand, ProbePhase, ProbeRequest};
use crate::compatibility::services::manifest::ManifestGenerator;
use crate::shared::Result;

/// Directory (relative to the probe working directory) pip installs into
const PYTHON_TARGET_DIR: &str = "site";
/// Directory (relative to the probe working directory) gems install into
const GEM_INSTALL_DIR: &str = "gems";

/// Distributions whose import name differs from the package name
const PYTHON_IMPORT_NAMES: &[(&str, &str)] = &[
    ("pyyaml", "yaml"),
    ("pillow", "PIL"),
    ("beautifulsoup4", "bs4"),
    ("scikit-learn", "sklearn"),
    ("python-dateutil", "dateutil"),
    ("opencv-python", "cv2"),
    ("protobuf", "google.protobuf"),
    ("pycryptodome", "Crypto"),
    ("psycopg2-binary", "psycopg2"),
];

/// Turns dependencies into package-manager invocations.
pub struct ProbePlanner;

impl ProbePlanner {
    /// Install-then-load probe for a single dependency pinned to `version`
    /// (`None` installs the latest release).
    pub fn plan_dependency(
        dependency: &Dependency,
        version: Option<&str>,
        verbose: bool,
    ) -> Result<ProbeRequest> {
        let ecosystem = dependency.ecosystem;
        let mut pinned = dependency.clone();
        pinned.version = version.map(str::to_string);

        let commands = match ecosystem {
            Ecosystem::NodeJs => Self::npm_commands(&pinned),
            Ecosystem::Python => Self::pip_commands(&pinned),
            Ecosystem::Ruby => Self::gem_commands(&pinned),
            Ecosystem::Java | Ecosystem::DotNet => {
                let manifest = ecosystem.profile().manifest_file_name;
                Self::manifest_commands(ecosystem, manifest)
            }
        };

        Ok(ProbeRequest {
            ecosystem,
            manifest_file_name: ecosystem.profile().manifest_file_name.to_string(),
            manifest_content: ManifestGenerator::render(ecosystem, std::slice::from_ref(&pinned))?,
            commands: Self::with_verbose_env(ecosystem, commands, verbose),
            label: pinned.label(),
        })
    }

    pub fn plan_manifest(
        ecosystem: Ecosystem,
        dependencies: &[Dependency],
        sbom_name: Option<&str>,
        verbose: bool,
    ) -> Result<ProbeRequest> {
        let manifest_file_name = ManifestGenerator::file_name(ecosystem, sbom_name);
        let commands = Self::manifest_commands(ecosystem, &manifest_file_name);
        Ok(ProbeRequest {
            ecosystem,
            manifest_content: ManifestGenerator::render(ecosystem, dependencies)?,
            commands: Self::with_verbose_env(ecosystem, commands, verbose),
            label: manifest_file_name.clone(),
            manifest_file_name,
        })
    }

    fn npm_commands(dependency: &Dependency) -> Vec<ProbeCommand> {
        let spec = match &dependency.version {
            Some(version) => format!("{}@{}", dependency.name, version),
            None => dependency.name.clone(),
        };
        vec![
            ProbeCommand::new("npm", &["install"], ProbePhase::Install)
                .with_arg(spec)
                .with_arg("--no-save")
                .with_arg("--no-optional")
                .with_arg("--ignore-scripts"),
            // echoes `name@version` so the installed release can be read back
            ProbeCommand::new("node", &["-e"], ProbePhase::Test).with_arg(format!(
                "require('{0}'); try {{ const p = require('{0}/package.json'); \
                 console.log(p.name + '@' + p.version); }} catch (e) {{}}",
                dependency.name
            )),
        ]
    }

    fn pip_commands(dependency: &Dependency) -> Vec<ProbeCommand> {
        let spec = match &dependency.version {
            Some(version) => format!("{}=={}", dependency.name, version),
            None => dependency.name.clone(),
        };
        let module = Self::python_import_name(&dependency.name);
        vec![
            ProbeCommand::new(
                "python3",
                &["-m", "pip", "install", "--no-deps", "--disable-pip-version-check", "--target"],
                ProbePhase::Install,
            )
            .with_arg(PYTHON_TARGET_DIR)
            .with_arg(spec),
            ProbeCommand::new("python3", &["-c"], ProbePhase::Test).with_arg(format!(
                "import sys; sys.path.insert(0, '{}'); import {}",
                PYTHON_TARGET_DIR, module
            )),
        ]
    }

    fn gem_commands(dependency: &Dependency) -> Vec<ProbeCommand> {
        let mut install = ProbeCommand::new("gem", &["install"], ProbePhase::Install)
            .with_arg(dependency.name.clone());
        if let Some(version) = &dependency.version {
            install = install.with_arg("-v").with_arg(version.clone());
        }
        vec![
            install
                .with_arg("--no-document")
                .with_arg("--install-dir")
                .with_arg(GEM_INSTALL_DIR),
            ProbeCommand::new("ruby", &["-e"], ProbePhase::Test)
                .with_arg(format!("require '{}'", dependency.name))
                .with_env("GEM_PATH", GEM_INSTALL_DIR),
        ]
    }

    fn manifest_commands(ecosystem: Ecosystem, manifest_file_name: &str) -> Vec<ProbeCommand> {
        match ecosystem {
            Ecosystem::Java => vec![ProbeCommand::new("mvn", &["-B", "-q", "-f"], ProbePhase::Install)
                .with_arg(manifest_file_name)
                .with_arg("dependency:resolve")],
            Ecosystem::DotNet => vec![ProbeCommand::new("dotnet", &["restore"], ProbePhase::Install)
                .with_arg(manifest_file_name)
                .with_arg("--runtime")
                .with_arg("linux-arm64")],
            Ecosystem::NodeJs => vec![ProbeCommand::new(
                "npm",
                &["install", "--no-save", "--ignore-scripts"],
                ProbePhase::Install,
            )],
            Ecosystem::Python => vec![ProbeCommand::new(
                "python3",
                &["-m", "pip", "install", "--no-deps", "--target"],
                ProbePhase::Install,
            )
            .with_arg(PYTHON_TARGET_DIR)
            .with_arg("-r")
            .with_arg(manifest_file_name)],
            Ecosystem::Ruby => vec![ProbeCommand::new("bundle", &["install"], ProbePhase::Install)
                .with_arg(format!("--gemfile={}", manifest_file_name))],
        }
    }

    fn with_verbose_env(
        ecosystem: Ecosystem,
        commands: Vec<ProbeCommand>,
        verbose: bool,
    ) -> Vec<ProbeCommand> {
        if !verbose {
            return commands;
        }
        let (key, value) = ecosystem.profile().verbose_env;
        commands
            .into_iter()
            .map(|command| command.with_env(key, value))
            .collect()
    }

    /// Module name a distribution is imported under.
    pub fn python_import_name(package: &str) -> String {
        let lowered = package.to_lowercase();
        PYTHON_IMPORT_NAMES
            .iter()
            .find(|(distribution, _)| *distribution == lowered)
            .map(|(_, module)| module.to_string())
            .unwrap_or_else(|| lowered.replace(['-', '.'], "_"))
    }
}
