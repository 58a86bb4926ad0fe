use serde::{Deserialize, Serialize};

/// An OS family and the lowest release that runs on ARM64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsSupport {
    pub family: String,
    #[serde(default)]
    pub minimum_version: Option<String>,
}

impl OsSupport {
    pub fn new(family: &str, minimum_version: Option<&str>) -> Self {
        Self {
            family: family.to_string(),
            minimum_version: minimum_version.map(str::to_string),
        }
    }

    /// Built-in table of ARM64-capable distributions.
    pub fn defaults() -> Vec<OsSupport> {
        vec![
            OsSupport::new("amazon-linux", Some("2")),
            OsSupport::new("ubuntu", Some("18.04")),
            OsSupport::new("debian", Some("10")),
            OsSupport::new("rhel", Some("8")),
            OsSupport::new("rocky", Some("8")),
            OsSupport::new("almalinux", Some("8")),
            OsSupport::new("centos", Some("7")),
            OsSupport::new("sles", Some("15")),
            OsSupport::new("alpine", Some("3.12")),
        ]
    }
}

/// Splits `ubuntu-20.04` into (`ubuntu`, `20.04`) at the last `-` followed by a digit.
pub fn split_os_name(os_name: &str) -> (String, Option<String>) {
    let os_name = os_name.trim().to_lowercase();
    let split_at = os_name
        .char_indices()
        .filter(|(i, c)| {
            *c == '-'
                && os_name[i + 1..]
                    .chars()
                    .next()
                    .map(|n| n.is_ascii_digit())
                    .unwrap_or(false)
        })
        .map(|(i, _)| i)
        .last();

    match split_at {
        Some(i) => (os_name[..i].to_string(), Some(os_name[i + 1..].to_string())),
        None => (os_name, None),
    }
}

/// Maps a PURL `distro=` qualifier onto a table name, e.g. `amzn-2` → `amazon-linux-2`.
pub fn os_name_from_distro(distro: &str) -> String {
    let (family, version) = split_os_name(distro);
    let family = match family.as_str() {
        "amzn" | "amazon" | "amazonlinux" => "amazon-linux",
        "redhat" | "rhel" => "rhel",
        "rocky" | "rockylinux" => "rocky",
        "alma" | "almalinux" => "almalinux",
        "sles" | "suse" | "opensuse" | "opensuse-leap" => "sles",
        other => other,
    };
    match version {
        Some(version) => format!("{}-{}", family, version),
        None => family.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_os_name() {
        assert_eq!(
            split_os_name("amazon-linux-2023"),
            ("amazon-linux".to_string(), Some("2023".to_string()))
        );
        assert_eq!(
            split_os_name("Ubuntu-20.04"),
            ("ubuntu".to_string(), Some("20.04".to_string()))
        );
        assert_eq!(split_os_name("alpine"), ("alpine".to_string(), None));
    }

    #[test]
    fn test_os_name_from_distro() {
        assert_eq!(os_name_from_distro("amzn-2"), "amazon-linux-2");
        assert_eq!(os_name_from_distro("ubuntu-22.04"), "ubuntu-22.04");
        assert_eq!(os_name_from_distro("rhel-8.6"), "rhel-8.6");
    }
}
