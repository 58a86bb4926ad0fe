use std::collections::{BTreeMap, HashMap, HashSet};

/// Queries longer than this are not fuzzy matched
pub const MAX_QUERY_LENGTH: usize = 50;

/// Upper bound on the confidence a fuzzy match can carry
pub const MAX_FUZZY_CONFIDENCE: f64 = 0.95;

/// Built-in name variants mapped onto the name knowledge bases usually carry
const COMMON_ALIASES: &[(&str, &str)] = &[
    ("httpd", "apache"),
    ("apache2", "apache"),
    ("apache-httpd", "apache"),
    ("nodejs", "node"),
    ("node.js", "node"),
    ("python3", "python"),
    ("python2", "python"),
    ("py", "python"),
    ("java-jdk", "java"),
    ("openjdk", "java"),
    ("oracle-java", "java"),
    ("mysql-server", "mysql"),
    ("mariadb", "mysql"),
    ("postgresql", "postgres"),
    ("postgres-server", "postgres"),
    ("nginx-server", "nginx"),
    ("redis-server", "redis"),
    ("mongodb", "mongo"),
    ("mongo-db", "mongo"),
];

const STRIPPED_SUFFIXES: &[&str] = &[
    "-dev", "-devel", "-server", "-client", "-common", "-core", "-base",
];

/// Relative weight of each similarity strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyWeights {
    pub levenshtein: f64,
    pub jaro_winkler: f64,
    pub substring: f64,
    pub normalized: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            levenshtein: 0.3,
            jaro_winkler: 0.3,
            substring: 0.2,
            normalized: 0.2,
        }
    }
}

/// Fuzzy matching settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    pub enabled: bool,
    pub min_confidence_threshold: f64,
    pub max_matches: usize,
    /// Levenshtein and Jaro-Winkler
    pub enable_fuzzy_matching: bool,
    pub enable_alias_matching: bool,
    pub enable_substring_matching: bool,
    pub enable_normalized_matching: bool,
    pub weights: StrategyWeights,
    /// Extra `alias -> canonical` pairs, applied over the built-in table
    pub custom_aliases: BTreeMap<String, String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_confidence_threshold: 0.7,
            max_matches: 5,
            enable_fuzzy_matching: true,
            enable_alias_matching: true,
            enable_substring_matching: true,
            enable_normalized_matching: true,
            weights: StrategyWeights::default(),
            custom_aliases: BTreeMap::new(),
        }
    }
}

/// A candidate name and its blended similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub name: String,
    pub score: f64,
}

impl FuzzyMatch {
    /// Confidence attached to a verdict reached through this match.
    pub fn confidence(&self) -> f64 {
        (self.score * MAX_FUZZY_CONFIDENCE).min(MAX_FUZZY_CONFIDENCE)
    }
}

/// Weighted blend of string similarity strategies over candidate names.
///
/// Each name is compared in its lowercased form and, when alias matching is
/// enabled, in its alias-canonical form; the best pairing wins. Results are
/// deterministic for a given query, candidate set and configuration.
#[derive(Debug, Clone)]
pub struct IntelligentMatcher {
    config: MatchingConfig,
    aliases: HashMap<String, String>,
}

impl IntelligentMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        let mut aliases: HashMap<String, String> = COMMON_ALIASES
            .iter()
            .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
            .collect();
        for (alias, canonical) in &config.custom_aliases {
            aliases.insert(alias.to_lowercase(), canonical.to_lowercase());
        }
        Self { config, aliases }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Candidates scoring at least the confidence threshold, best first.
    pub fn find_matches(&self, query: &str, candidates: &[String]) -> Vec<FuzzyMatch> {
        let query = query.trim();
        if !self.config.enabled || query.is_empty() || query.chars().count() > MAX_QUERY_LENGTH {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut matches: Vec<FuzzyMatch> = candidates
            .iter()
            .filter(|c| seen.insert(c.as_str()))
            .map(|candidate| FuzzyMatch {
                name: candidate.clone(),
                score: self.similarity(query, candidate),
            })
            .filter(|m| m.score >= self.config.min_confidence_threshold)
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.name.cmp(&b.name))
        });
        matches.truncate(self.config.max_matches);
        matches
    }

    pub fn best_match(&self, query: &str, candidates: &[String]) -> Option<FuzzyMatch> {
        self.find_matches(query, candidates).into_iter().next()
    }

    /// Blended similarity in [0, 1].
    pub fn similarity(&self, left: &str, right: &str) -> f64 {
        let left_forms = self.forms(left);
        let right_forms = self.forms(right);
        left_forms
            .iter()
            .flat_map(|l| right_forms.iter().map(move |r| (l, r)))
            .map(|(l, r)| self.blend(l, r))
            .fold(0.0, f64::max)
    }

    /// Lowercased name with noise suffixes, the `lib` prefix and separators removed.
    pub fn normalize_name(name: &str) -> String {
        let mut normalized = name.trim().to_lowercase();
        for suffix in STRIPPED_SUFFIXES {
            if let Some(stripped) = normalized.strip_suffix(suffix) {
                normalized = stripped.to_string();
            }
        }
        if let Some(stripped) = normalized.strip_prefix("lib") {
            normalized = stripped.to_string();
        }
        normalized.retain(|c| c != '_' && c != '-');
        normalized
    }

    fn forms(&self, name: &str) -> Vec<String> {
        let lowered = name.trim().to_lowercase();
        let mut forms = vec![lowered.clone()];
        if self.config.enable_alias_matching {
            if let Some(canonical) = self.aliases.get(&lowered) {
                if *canonical != lowered {
                    forms.push(canonical.clone());
                }
            }
        }
        forms
    }

    fn blend(&self, left: &str, right: &str) -> f64 {
        if left == right {
            return 1.0;
        }
        let weights = &self.config.weights;
        let mut weighted = 0.0;
        let mut total = 0.0;

        if self.config.enable_fuzzy_matching {
            weighted += weights.levenshtein * levenshtein_similarity(left, right);
            weighted += weights.jaro_winkler * jaro_winkler(left, right);
            total += weights.levenshtein + weights.jaro_winkler;
        }
        if self.config.enable_substring_matching {
            weighted += weights.substring * containment(left, right);
            total += weights.substring;
        }
        if self.config.enable_normalized_matching {
            let l = Self::normalize_name(left);
            let r = Self::normalize_name(right);
            weighted += weights.normalized * levenshtein_similarity(&l, &r);
            total += weights.normalized;
        }

        if total <= 0.0 {
            0.0
        } else {
            weighted / total
        }
    }
}

fn levenshtein(left: &[char], right: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=right.len()).collect();
    let mut current = vec![0; right.len() + 1];
    for (i, lc) in left.iter().enumerate() {
        current[0] = i + 1;
        for (j, rc) in right.iter().enumerate() {
            let substitution = previous[j] + usize::from(lc != rc);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[right.len()]
}

/// `1 - distance / max_len`.
pub fn levenshtein_similarity(left: &str, right: &str) -> f64 {
    let l: Vec<char> = left.chars().collect();
    let r: Vec<char> = right.chars().collect();
    let longest = l.len().max(r.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&l, &r) as f64 / longest as f64
}

fn jaro(left: &[char], right: &[char]) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let window = (left.len().max(right.len()) / 2).saturating_sub(1);
    let mut left_matched = vec![false; left.len()];
    let mut right_matched = vec![false; right.len()];
    let mut matches = 0usize;

    for (i, lc) in left.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(right.len());
        for j in start..end {
            if !right_matched[j] && right[j] == *lc {
                left_matched[i] = true;
                right_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }

    let left_sequence = left
        .iter()
        .zip(&left_matched)
        .filter(|(_, m)| **m)
        .map(|(c, _)| c);
    let right_sequence = right
        .iter()
        .zip(&right_matched)
        .filter(|(_, m)| **m)
        .map(|(c, _)| c);
    let transpositions = left_sequence
        .zip(right_sequence)
        .filter(|(a, b)| a != b)
        .count()
        / 2;

    let m = matches as f64;
    (m / left.len() as f64 + m / right.len() as f64 + (m - transpositions as f64) / m) / 3.0
}

/// Jaro similarity with a bonus for a shared prefix of up to four characters.
pub fn jaro_winkler(left: &str, right: &str) -> f64 {
    let l: Vec<char> = left.chars().collect();
    let r: Vec<char> = right.chars().collect();
    let similarity = jaro(&l, &r);
    if similarity < 0.7 {
        return similarity;
    }
    let prefix = l
        .iter()
        .zip(&r)
        .take(4)
        .take_while(|(a, b)| a == b)
        .count();
    similarity + prefix as f64 * 0.1 * (1.0 - similarity)
}

/// Shorter/longer length ratio when the shorter name is a substring or an
/// in-order subsequence of the longer one.
pub fn containment(left: &str, right: &str) -> f64 {
    let (shorter, longer) = if left.chars().count() <= right.chars().count() {
        (left, right)
    } else {
        (right, left)
    };
    let shorter_len = shorter.chars().count();
    if shorter_len == 0 {
        return 0.0;
    }
    let contained = longer.contains(shorter) || is_subsequence(shorter, longer);
    if contained {
        shorter_len as f64 / longer.chars().count() as f64
    } else {
        0.0
    }
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut haystack = haystack.chars();
    needle.chars().all(|n| haystack.any(|h| h == n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_levenshtein_similarity() {
        assert_eq!(levenshtein_similarity("pstgres", "postgres"), 0.875);
        assert_eq!(levenshtein_similarity("", ""), 1.0);
        assert_eq!(levenshtein_similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_jaro_winkler_prefix_bonus() {
        let score = jaro_winkler("pstgres", "postgres");
        assert!((score - 0.9625).abs() < 1e-9);
        assert_eq!(jaro_winkler("same", "same"), 1.0);
    }

    #[test]
    fn test_containment() {
        assert_eq!(containment("redis", "redis-server"), 5.0 / 12.0);
        assert_eq!(containment("pstgres", "postgres"), 7.0 / 8.0);
        assert_eq!(containment("zzz", "postgres"), 0.0);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(IntelligentMatcher::normalize_name("libssl-dev"), "ssl");
        assert_eq!(IntelligentMatcher::normalize_name("Redis-Server"), "redis");
        assert_eq!(IntelligentMatcher::normalize_name("python_dateutil"), "pythondateutil");
    }

    #[test]
    fn test_misspelling_matches_through_builtin_alias() {
        let matcher = IntelligentMatcher::new(MatchingConfig::default());
        let matches = matcher.find_matches("pstgres", &candidates(&["postgresql", "mysql", "nginx"]));

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "postgresql");
        assert!((matches[0].score - 0.90125).abs() < 1e-9);
        assert!((matches[0].confidence() - 0.8561875).abs() < 1e-9);
    }

    #[test]
    fn test_results_are_sorted_and_capped() {
        let config = MatchingConfig {
            min_confidence_threshold: 0.0,
            max_matches: 2,
            ..Default::default()
        };
        let matcher = IntelligentMatcher::new(config);
        let matches = matcher.find_matches("nginx", &candidates(&["nginx-plus", "nginy", "zlib"]));
        assert_eq!(matches.len(), 2);
        assert!(matches[0].score >= matches[1].score);
    }

    #[test]
    fn test_ties_are_broken_by_name() {
        let config = MatchingConfig {
            min_confidence_threshold: 0.0,
            ..Default::default()
        };
        let matcher = IntelligentMatcher::new(config);
        let matches = matcher.find_matches("ab", &candidates(&["ax", "aa"]));
        assert_eq!(matches[0].score, matches[1].score);
        assert_eq!(matches[0].name, "aa");
    }

    #[test]
    fn test_long_queries_are_skipped() {
        let matcher = IntelligentMatcher::new(MatchingConfig::default());
        let query = "a".repeat(MAX_QUERY_LENGTH + 1);
        assert!(matcher.find_matches(&query, &candidates(&[&query])).is_empty());
    }

    #[test]
    fn test_disabled_matcher_returns_nothing() {
        let matcher = IntelligentMatcher::new(MatchingConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(matcher.find_matches("nginx", &candidates(&["nginx"])).is_empty());
    }

    #[test]
    fn test_custom_aliases_extend_builtin_table() {
        let mut config = MatchingConfig::default();
        config
            .custom_aliases
            .insert("pg".to_string(), "postgres".to_string());
        let matcher = IntelligentMatcher::new(config);
        assert_eq!(matcher.similarity("pg", "postgresql"), 1.0);
    }

    #[test]
    fn test_matching_is_deterministic() {
        let matcher = IntelligentMatcher::new(MatchingConfig::default());
        let names = candidates(&["redis", "redis-tools", "hiredis", "rediscli"]);
        let first = matcher.find_matches("rediss", &names);
        for _ in 0..5 {
            assert_eq!(matcher.find_matches("rediss", &names), first);
        }
    }
}
