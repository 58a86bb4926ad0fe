use crate::compatibility::domain::Ecosystem;

pub const CONTAINER_WORKDIR: &str = "/workspace";

/// Dockerfile for an ecosystem's probe image.
pub fn render(ecosystem: Ecosystem, runtime_version: &str) -> String {
    let mut lines = vec![format!("FROM {}", ecosystem.base_image(runtime_version))];
    match ecosystem {
        Ecosystem::NodeJs => {
            lines.push("RUN apk add --no-cache bash gcc g++ make musl-dev python3 linux-headers".to_string());
        }
        Ecosystem::Ruby => {
            lines.push(
                "RUN apk add --no-cache bash gcc g++ make musl-dev linux-headers libffi-dev openssl-dev"
                    .to_string(),
            );
            lines.push("RUN gem install bundler".to_string());
        }
        Ecosystem::Python => {
            lines.push(
                "RUN apt-get update && apt-get install -y --no-install-recommends gcc g++ make \
                 && rm -rf /var/lib/apt/lists/*"
                    .to_string(),
            );
        }
        Ecosystem::DotNet => {
            lines.push("ENV DOTNET_CLI_TELEMETRY_OPTOUT=1".to_string());
            lines.push("ENV DOTNET_SKIP_FIRST_TIME_EXPERIENCE=1".to_string());
        }
        Ecosystem::Java => {}
    }
    lines.push(format!("WORKDIR {}", CONTAINER_WORKDIR));
    lines.join("\n") + "\n"
}

/// `graviton-{runtime}-analysis:{version}-{os}`
pub fn image_tag(ecosystem: Ecosystem, runtime_version: &str, os_tag: &str) -> String {
    format!(
        "graviton-{}-analysis:{}-{}",
        ecosystem.runtime(),
        sanitize_tag(runtime_version),
        sanitize_tag(os_tag)
    )
}

// docker tags allow [A-Za-z0-9_.-]
fn sanitize_tag(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "latest".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_uses_profile_base_image() {
        let node = render(Ecosystem::NodeJs, "20");
        assert!(node.starts_with("FROM node:20-alpine\n"));
        assert!(node.contains("make"));
        assert!(node.trim_end().ends_with("WORKDIR /workspace"));

        let java = render(Ecosystem::Java, "17");
        assert!(java.starts_with("FROM maven:3-eclipse-temurin-17\n"));

        let dotnet = render(Ecosystem::DotNet, "8.0");
        assert!(dotnet.starts_with("FROM mcr.microsoft.com/dotnet/sdk:8.0\n"));
        assert!(dotnet.contains("DOTNET_CLI_TELEMETRY_OPTOUT"));
    }

    #[test]
    fn test_image_tag() {
        assert_eq!(
            image_tag(Ecosystem::Python, "3.11", "ubuntu-20.04"),
            "graviton-python-analysis:3.11-ubuntu-20.04"
        );
        assert_eq!(
            image_tag(Ecosystem::NodeJs, "20", "Amazon Linux 2"),
            "graviton-nodejs-analysis:20-amazon-linux-2"
        );
        assert_eq!(
            image_tag(Ecosystem::Ruby, "3.2", ""),
            "graviton-ruby-analysis:3.2-latest"
        );
    }
}
