use crate::compatibility::domain::{Dependency, Ecosystem};
use crate::shared::error::ValidatorError;
use crate::shared::security::ensure_output_directory;
use crate::shared::Result;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const NPM_UNPINNED: &str = "latest";
const MAVEN_UNPINNED: &str = "LATEST";
const NUGET_UNPINNED: &str = "*";

/// Renders and re-reads the throwaway manifests handed to package managers.
pub struct ManifestGenerator;

impl ManifestGenerator {
    /// `{sbom}_{manifest}` when an SBOM name is supplied, else the bare manifest name.
    pub fn file_name(ecosystem: Ecosystem, sbom_name: Option<&str>) -> String {
        let base = ecosystem.profile().manifest_file_name;
        match sbom_name.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sbom) => format!("{}_{}", sbom, base),
            None => base.to_string(),
        }
    }

    pub fn render(ecosystem: Ecosystem, dependencies: &[Dependency]) -> Result<String> {
        Ok(match ecosystem {
            Ecosystem::NodeJs => Self::render_package_json(dependencies)?,
            Ecosystem::Java => Self::render_pom(dependencies),
            Ecosystem::Python => Self::render_requirements(dependencies),
            Ecosystem::DotNet => Self::render_csproj(dependencies),
            Ecosystem::Ruby => Self::render_gemfile(dependencies),
        })
    }

    /// Writes the manifest into `output_dir` and returns its path.
    pub fn write(
        ecosystem: Ecosystem,
        dependencies: &[Dependency],
        output_dir: &Path,
        sbom_name: Option<&str>,
    ) -> Result<PathBuf> {
        let content = Self::render(ecosystem, dependencies)?;
        ensure_output_directory(output_dir)?;
        let path = output_dir.join(Self::file_name(ecosystem, sbom_name));
        fs::write(&path, content).map_err(|e| ValidatorError::FileWriteError {
            path: path.clone(),
            details: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), count = dependencies.len(), "wrote manifest");
        Ok(path)
    }

    /// Dependencies declared in a manifest previously produced by [`render`].
    ///
    /// Unreadable content yields an empty list; unpinned entries come back
    /// with no version.
    ///
    /// [`render`]: ManifestGenerator::render
    pub fn parse(ecosystem: Ecosystem, content: &str) -> Vec<Dependency> {
        match ecosystem {
            Ecosystem::NodeJs => Self::parse_package_json(content),
            Ecosystem::Java => Self::parse_pom(content),
            Ecosystem::Python => Self::parse_requirements(content),
            Ecosystem::DotNet => Self::parse_csproj(content),
            Ecosystem::Ruby => Self::parse_gemfile(content),
        }
    }

    fn render_package_json(dependencies: &[Dependency]) -> Result<String> {
        let mut deps = Map::new();
        for dependency in dependencies {
            let version = dependency.version.as_deref().unwrap_or(NPM_UNPINNED);
            deps.insert(dependency.name.clone(), Value::String(version.to_string()));
        }
        let document = json!({
            "name": "graviton-compatibility-test",
            "version": "1.0.0",
            "description": "Temporary package.json for ARM64 compatibility testing",
            "dependencies": deps,
        });
        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn render_pom(dependencies: &[Dependency]) -> String {
        let mut pom = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n    \
             <modelVersion>4.0.0</modelVersion>\n    \
             <groupId>com.graviton.analysis</groupId>\n    \
             <artifactId>sbom-analysis</artifactId>\n    \
             <version>1.0.0</version>\n    \
             <dependencies>\n",
        );
        for dependency in dependencies {
            let group = dependency.group.as_deref().unwrap_or("unknown");
            let version = dependency.version.as_deref().unwrap_or(MAVEN_UNPINNED);
            pom.push_str(&format!(
                "        <dependency>\n            <groupId>{}</groupId>\n            \
                 <artifactId>{}</artifactId>\n            <version>{}</version>\n        \
                 </dependency>\n",
                escape_xml(group),
                escape_xml(&dependency.name),
                escape_xml(version)
            ));
        }
        pom.push_str("    </dependencies>\n</project>\n");
        pom
    }

    fn render_requirements(dependencies: &[Dependency]) -> String {
        dependencies
            .iter()
            .map(|d| match &d.version {
                Some(version) => format!("{}=={}\n", d.name, version),
                None => format!("{}\n", d.name),
            })
            .collect()
    }

    fn render_csproj(dependencies: &[Dependency]) -> String {
        let mut csproj = String::from(
            "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    \
             <TargetFramework>net6.0</TargetFramework>\n    \
             <RuntimeIdentifier>linux-arm64</RuntimeIdentifier>\n  </PropertyGroup>\n  \
             <ItemGroup>\n",
        );
        for dependency in dependencies {
            let version = dependency.version.as_deref().unwrap_or(NUGET_UNPINNED);
            csproj.push_str(&format!(
                "    <PackageReference Include=\"{}\" Version=\"{}\" />\n",
                escape_xml(&dependency.name),
                escape_xml(version)
            ));
        }
        csproj.push_str("  </ItemGroup>\n</Project>\n");
        csproj
    }

    fn render_gemfile(dependencies: &[Dependency]) -> String {
        let mut gemfile = String::from("source \"https://rubygems.org\"\n\n");
        for dependency in dependencies {
            match &dependency.version {
                Some(version) => gemfile.push_str(&format!(
                    "gem {}, {}\n",
                    ruby_string(&dependency.name),
                    ruby_string(version)
                )),
                None => gemfile.push_str(&format!("gem {}\n", ruby_string(&dependency.name))),
            }
        }
        gemfile
    }

    fn parse_package_json(content: &str) -> Vec<Dependency> {
        let Ok(document) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        document
            .get("dependencies")
            .and_then(Value::as_object)
            .map(|deps| {
                deps.iter()
                    .map(|(name, version)| {
                        let version = version.as_str().filter(|v| *v != NPM_UNPINNED);
                        Dependency::new(Ecosystem::NodeJs, name, version)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parse_pom(content: &str) -> Vec<Dependency> {
        let body = content
            .split_once("<dependencies>")
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        body.split("<dependency>")
            .skip(1)
            .filter_map(|block| {
                let block = block.split("</dependency>").next().unwrap_or_default();
                let artifact = element_text(block, "artifactId")?;
                let group = element_text(block, "groupId").unwrap_or_else(|| "unknown".to_string());
                let version = element_text(block, "version").filter(|v| v != MAVEN_UNPINNED);
                Some(
                    Dependency::new(Ecosystem::Java, &artifact, version.as_deref())
                        .with_group(&group),
                )
            })
            .collect()
    }

    fn parse_requirements(content: &str) -> Vec<Dependency> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| match line.split_once("==") {
                Some((name, version)) => {
                    Dependency::new(Ecosystem::Python, name.trim(), Some(version.trim()))
                }
                None => Dependency::new(Ecosystem::Python, line, None),
            })
            .collect()
    }

    fn parse_csproj(content: &str) -> Vec<Dependency> {
        content
            .split("<PackageReference")
            .skip(1)
            .filter_map(|element| {
                let element = element.split("/>").next().unwrap_or_default();
                let name = attribute_value(element, "Include")?;
                let version = attribute_value(element, "Version").filter(|v| v != NUGET_UNPINNED);
                Some(Dependency::new(Ecosystem::DotNet, &name, version.as_deref()))
            })
            .collect()
    }

    fn parse_gemfile(content: &str) -> Vec<Dependency> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("gem "))
            .filter_map(|line| {
                let quoted = ruby_strings(line);
                let name = quoted.first()?;
                Some(Dependency::new(
                    Ecosystem::Ruby,
                    name,
                    quoted.get(1).map(String::as_str),
                ))
            })
            .collect()
    }
}

fn element_text(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = block.find(&open)? + open.len();
    let end = start + block[start..].find(&close)?;
    let text = unescape_xml(block[start..end].trim());
    (!text.is_empty()).then_some(text)
}

fn attribute_value(element: &str, attribute: &str) -> Option<String> {
    let marker = format!("{}=\"", attribute);
    let start = element.find(&marker)? + marker.len();
    let end = start + element[start..].find('"')?;
    Some(unescape_xml(&element[start..end]))
}

/// Double-quoted Ruby literal; `#` is escaped so nothing interpolates.
fn ruby_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '#') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Contents of the double-quoted literals on a Gemfile line, unescaped.
fn ruby_strings(line: &str) -> Vec<String> {
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        let Some(text) = current.as_mut() else {
            if c == '"' {
                current = Some(String::new());
            }
            continue;
        };
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    text.push(escaped);
                }
            }
            '"' => strings.extend(current.take()),
            other => text.push(other),
        }
    }
    strings
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn npm(name: &str, version: Option<&str>) -> Dependency {
        Dependency::new(Ecosystem::NodeJs, name, version)
    }

    #[test]
    fn test_file_name_prefix() {
        assert_eq!(ManifestGenerator::file_name(Ecosystem::Java, None), "pom.xml");
        assert_eq!(
            ManifestGenerator::file_name(Ecosystem::DotNet, Some("web")),
            "web_test.csproj"
        );
        assert_eq!(
            ManifestGenerator::file_name(Ecosystem::Ruby, Some("  ")),
            "Gemfile"
        );
    }

    #[test]
    fn test_package_json_layout() {
        let content = ManifestGenerator::render(
            Ecosystem::NodeJs,
            &[npm("node-sass", Some("4.0.0")), npm("lodash", None)],
        )
        .unwrap();
        let document: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(document["name"], "graviton-compatibility-test");
        assert_eq!(document["dependencies"]["node-sass"], "4.0.0");
        assert_eq!(document["dependencies"]["lodash"], "latest");

        let parsed = ManifestGenerator::parse(Ecosystem::NodeJs, &content);
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().any(|d| d.name == "lodash" && d.version.is_none()));
    }

    #[test]
    fn test_pom_lists_coordinates() {
        let dependency = Dependency::new(Ecosystem::Java, "log4j-core", Some("2.17.0"))
            .with_group("org.apache.logging.log4j");
        let content = ManifestGenerator::render(Ecosystem::Java, &[dependency]).unwrap();
        assert!(content.contains("<groupId>com.graviton.analysis</groupId>"));
        assert!(content.contains("<artifactId>log4j-core</artifactId>"));

        let parsed = ManifestGenerator::parse(Ecosystem::Java, &content);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].label(), "org.apache.logging.log4j:log4j-core:2.17.0");
    }

    #[test]
    fn test_csproj_targets_linux_arm64() {
        let content = ManifestGenerator::render(
            Ecosystem::DotNet,
            &[Dependency::new(Ecosystem::DotNet, "Newtonsoft.Json", Some("13.0.1"))],
        )
        .unwrap();
        assert!(content.contains("<RuntimeIdentifier>linux-arm64</RuntimeIdentifier>"));
        assert!(content.contains(r#"<PackageReference Include="Newtonsoft.Json" Version="13.0.1" />"#));
        let parsed = ManifestGenerator::parse(Ecosystem::DotNet, &content);
        assert_eq!(parsed[0].version.as_deref(), Some("13.0.1"));
    }

    #[test]
    fn test_requirements_and_gemfile_lines() {
        let requirements = ManifestGenerator::render(
            Ecosystem::Python,
            &[
                Dependency::new(Ecosystem::Python, "numpy", Some("1.24.0")),
                Dependency::new(Ecosystem::Python, "six", None),
            ],
        )
        .unwrap();
        assert_eq!(requirements, "numpy==1.24.0\nsix\n");
        assert_eq!(ManifestGenerator::parse(Ecosystem::Python, &requirements).len(), 2);

        let gemfile = ManifestGenerator::render(
            Ecosystem::Ruby,
            &[Dependency::new(Ecosystem::Ruby, "nokogiri", Some("1.15.0"))],
        )
        .unwrap();
        assert!(gemfile.starts_with("source \"https://rubygems.org\"\n\n"));
        let parsed = ManifestGenerator::parse(Ecosystem::Ruby, &gemfile);
        assert_eq!(parsed[0].name, "nokogiri");
        assert_eq!(parsed[0].version.as_deref(), Some("1.15.0"));
    }

    #[test]
    fn test_gemfile_values_are_escaped() {
        let dependency = Dependency::new(Ecosystem::Ruby, "evil\"gem", Some("1.0#{`id`}"));
        let content = ManifestGenerator::render(Ecosystem::Ruby, &[dependency]).unwrap();
        assert!(content.contains(r#"gem "evil\"gem", "1.0\#{`id`}""#));

        let parsed = ManifestGenerator::parse(Ecosystem::Ruby, &content);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "evil\"gem");
        assert_eq!(parsed[0].version.as_deref(), Some("1.0#{`id`}"));
    }

    #[test]
    fn test_xml_values_are_escaped() {
        let dependency = Dependency::new(Ecosystem::DotNet, "A&B", Some("1.0"));
        let content = ManifestGenerator::render(Ecosystem::DotNet, &[dependency]).unwrap();
        assert!(content.contains("A&amp;B"));
        assert_eq!(ManifestGenerator::parse(Ecosystem::DotNet, &content)[0].name, "A&B");
    }

    #[test]
    fn test_write_creates_directory() {
        let temp = TempDir::new().unwrap();
        let output_dir = temp.path().join("manifests");
        let path = ManifestGenerator::write(
            Ecosystem::Python,
            &[Dependency::new(Ecosystem::Python, "requests", Some("2.31.0"))],
            &output_dir,
            Some("app"),
        )
        .unwrap();
        assert!(path.ends_with("app_requirements.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "requests==2.31.0\n");
    }

    #[test]
    fn test_unreadable_manifest_parses_empty() {
        assert!(ManifestGenerator::parse(Ecosystem::NodeJs, "not json").is_empty());
        assert!(ManifestGenerator::parse(Ecosystem::Java, "").is_empty());
    }
}
