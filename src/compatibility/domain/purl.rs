use std::collections::BTreeMap;

/// Parsed Package URL (`pkg:type/namespace/name@version?qualifiers#subpath`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUrl {
    pub purl_type: String,
    pub namespace: Option<String>,
    pub name: String,
    pub version: Option<String>,
    pub qualifiers: BTreeMap<String, String>,
}

impl PackageUrl {
    /// Lenient parse; returns `None` for anything without a `pkg:` scheme, a type and a name.
    pub fn parse(purl: &str) -> Option<Self> {
        let rest = purl.trim().strip_prefix("pkg:")?;
        let rest = rest.split('#').next().unwrap_or_default();

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let (path, version) = match path.rsplit_once('@') {
            Some((path, version)) if !version.is_empty() => (path, Some(decode(version))),
            _ => (path, None),
        };

        let path = path.trim_matches('/');
        let (purl_type, remainder) = path.split_once('/')?;
        if purl_type.is_empty() {
            return None;
        }

        let (namespace, name) = match remainder.rsplit_once('/') {
            Some((namespace, name)) => (Some(decode(namespace)), decode(name)),
            None => (None, decode(remainder)),
        };
        if name.is_empty() {
            return None;
        }

        let qualifiers = query
            .map(|q| {
                q.split('&')
                    .filter_map(|pair| pair.split_once('='))
                    .map(|(k, v)| (k.to_lowercase(), decode(v)))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            purl_type: purl_type.to_lowercase(),
            namespace: namespace.filter(|n| !n.is_empty()),
            name,
            version,
            qualifiers,
        })
    }

    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers.get(key).map(String::as_str)
    }

    /// `namespace:name` for Maven-style coordinates, bare name otherwise.
    pub fn coordinates(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}:{}", namespace, self.name),
            None => self.name.clone(),
        }
    }
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_npm_scoped_package() {
        let purl = PackageUrl::parse("pkg:npm/%40angular/core@16.2.0").unwrap();
        assert_eq!(purl.purl_type, "npm");
        assert_eq!(purl.namespace.as_deref(), Some("@angular"));
        assert_eq!(purl.name, "core");
        assert_eq!(purl.version.as_deref(), Some("16.2.0"));
    }

    #[test]
    fn test_parse_maven_coordinates() {
        let purl =
            PackageUrl::parse("pkg:maven/org.apache.logging.log4j/log4j-core@2.17.0").unwrap();
        assert_eq!(purl.coordinates(), "org.apache.logging.log4j:log4j-core");
    }

    #[test]
    fn test_parse_distro_qualifier() {
        let purl =
            PackageUrl::parse("pkg:rpm/amzn/openssl-libs@1.0.2k-24.amzn2.0.4?arch=x86_64&distro=amzn-2")
                .unwrap();
        assert_eq!(purl.qualifier("distro"), Some("amzn-2"));
        assert_eq!(purl.qualifier("arch"), Some("x86_64"));
        assert_eq!(purl.name, "openssl-libs");
    }

    #[test]
    fn test_parse_rejects_non_purl() {
        assert!(PackageUrl::parse("npm/lodash").is_none());
        assert!(PackageUrl::parse("pkg:npm").is_none());
        assert!(PackageUrl::parse("pkg:/lodash").is_none());
    }

    #[test]
    fn test_parse_without_version() {
        let purl = PackageUrl::parse("pkg:pypi/requests").unwrap();
        assert_eq!(purl.name, "requests");
        assert!(purl.version.is_none());
    }
}
