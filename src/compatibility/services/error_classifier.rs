use crate::compatibility::domain::ErrorCategory;

/// Keyword lists checked in order; the first list with a hit wins.
const CATEGORY_KEYWORDS: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::Network,
        &[
            "enotfound",
            "network",
            "timeout",
            "timed out",
            "404",
            "not found",
            "registry",
            "could not resolve host",
            "connection refused",
            "econnreset",
        ],
    ),
    (
        ErrorCategory::NativeBuild,
        &["gyp", "make", "compile", "gcc", "g++", "clang", "failed building wheel"],
    ),
    (ErrorCategory::Permissions, &["permission", "eacces", "eperm"]),
    (
        ErrorCategory::Dependency,
        &["dependency", "peer dep", "eresolve", "conflict", "deprecated"],
    ),
];

const SNIPPET_WHOLE_LINES: usize = 40;
const SNIPPET_EDGE_LINES: usize = 20;
const SNIPPET_FALLBACK_LINES: usize = 5;
const SNIPPET_MAX_CHARS: usize = 2000;
const RELEVANT_LINE_KEYWORDS: &[&str] = &[
    "error",
    "failed",
    "enoent",
    "permission denied",
    "network",
    "timeout",
    "enotfound",
];

/// Classifies probe failures and condenses their logs.
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Category for a failed probe. A probe that ran out of time is a
    /// timeout regardless of what it printed.
    pub fn classify(log: &str, timed_out: bool) -> ErrorCategory {
        if timed_out {
            return ErrorCategory::Timeout;
        }
        let log = log.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| log.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(ErrorCategory::Unknown)
    }

    /// Short excerpt of a probe log for the result notes.
    ///
    /// Logs of up to 40 lines are kept whole. Longer logs keep the error-ish
    /// lines of the first and last 20 (or the first/last 5 when none look
    /// relevant) joined by `...`, capped at 2000 characters.
    pub fn snippet(log: &str) -> String {
        let log = log.trim();
        if log.is_empty() {
            return "N/A".to_string();
        }
        let lines: Vec<&str> = log.lines().collect();
        if lines.len() <= SNIPPET_WHOLE_LINES {
            return log.to_string();
        }

        let head = &lines[..SNIPPET_EDGE_LINES];
        let tail = &lines[lines.len() - SNIPPET_EDGE_LINES..];
        let mut parts = Self::relevant_or(head, &head[..SNIPPET_FALLBACK_LINES]);
        parts.push("...");
        parts.extend(Self::relevant_or(
            tail,
            &tail[tail.len() - SNIPPET_FALLBACK_LINES..],
        ));

        let joined = parts.join("\n").trim().to_string();
        match joined.char_indices().nth(SNIPPET_MAX_CHARS) {
            Some((cut, _)) => format!("{}\n... (truncated)", &joined[..cut]),
            None => joined,
        }
    }

    fn relevant_or<'a>(lines: &[&'a str], fallback: &[&'a str]) -> Vec<&'a str> {
        let relevant: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|line| {
                let line = line.to_lowercase();
                RELEVANT_LINE_KEYWORDS.iter().any(|k| line.contains(k))
            })
            .collect();
        if relevant.is_empty() {
            fallback.to_vec()
        } else {
            relevant
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(
            ErrorClassifier::classify("npm ERR! code ENOTFOUND registry.npmjs.org", false),
            ErrorCategory::Network
        );
        assert_eq!(
            ErrorClassifier::classify("gyp ERR! build error", false),
            ErrorCategory::NativeBuild
        );
        assert_eq!(
            ErrorClassifier::classify("EACCES: permission denied, mkdir", false),
            ErrorCategory::Permissions
        );
        assert_eq!(
            ErrorClassifier::classify("ERESOLVE unable to resolve dependency tree", false),
            ErrorCategory::Dependency
        );
        assert_eq!(
            ErrorClassifier::classify("something odd happened", false),
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn test_network_wins_over_native_build() {
        let log = "gyp info it worked\nnpm ERR! 404 Not Found - GET https://registry.npmjs.org/x";
        assert_eq!(ErrorClassifier::classify(log, false), ErrorCategory::Network);
    }

    #[test]
    fn test_timeout_decided_before_keywords() {
        assert_eq!(
            ErrorClassifier::classify("gyp ERR! stack", true),
            ErrorCategory::Timeout
        );
    }

    #[test]
    fn test_short_logs_kept_whole() {
        let log = "line one\nline two\n";
        assert_eq!(ErrorClassifier::snippet(log), "line one\nline two");
        assert_eq!(ErrorClassifier::snippet("   "), "N/A");
    }

    #[test]
    fn test_long_logs_keep_relevant_lines() {
        let mut lines: Vec<String> = (0..100).map(|i| format!("progress {}", i)).collect();
        lines[3] = "npm ERR! failed to fetch".to_string();
        lines[97] = "gyp ERR! build error".to_string();
        let snippet = ErrorClassifier::snippet(&lines.join("\n"));
        assert_eq!(snippet, "npm ERR! failed to fetch\n...\ngyp ERR! build error");
    }

    #[test]
    fn test_long_logs_without_errors_keep_edges() {
        let lines: Vec<String> = (0..50).map(|i| format!("line {}", i)).collect();
        let snippet = ErrorClassifier::snippet(&lines.join("\n"));
        assert!(snippet.starts_with("line 0\nline 1"));
        assert!(snippet.contains("line 4\n...\nline 45"));
        assert!(snippet.ends_with("line 49"));
    }

    #[test]
    fn test_snippet_is_capped() {
        let lines: Vec<String> = (0..60).map(|i| format!("error {}", "x".repeat(200 + i))).collect();
        let snippet = ErrorClassifier::snippet(&lines.join("\n"));
        assert!(snippet.ends_with("... (truncated)"));
        assert!(snippet.chars().count() <= SNIPPET_MAX_CHARS + 20);
    }
}
