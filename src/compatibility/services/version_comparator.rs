use std::cmp::Ordering;

/// Parsed version: three numeric segments plus an optional pre-release or
/// distribution qualifier.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub qualifier: Option<String>,
    /// Number of numeric segments written in the source string
    precision: usize,
}

impl Version {
    /// Parses a version string, returning `None` for malformed input.
    ///
    /// Accepts a leading `v`, Debian epochs (`1:2.3`), build metadata
    /// (`+build`), 4-part versions (truncated to 3) and distribution
    /// release suffixes: in `1.14-18.amzn2.1` the release number `18`
    /// folds into the patch segment and `amzn2.1` becomes the qualifier.
    pub fn parse(version: &str) -> Option<Self> {
        let mut version = version.trim();
        version = version
            .strip_prefix('v')
            .or_else(|| version.strip_prefix('V'))
            .unwrap_or(version);

        if let Some((epoch, rest)) = version.split_once(':') {
            if !epoch.is_empty() && epoch.chars().all(|c| c.is_ascii_digit()) {
                version = rest;
            }
        }

        let version = version.split('+').next().unwrap_or_default();
        if version.is_empty() {
            return None;
        }

        match version.split_once('-') {
            Some((base, release)) => Self::parse_with_release(base, release),
            None => Self::parse_plain(version),
        }
    }

    fn parse_plain(version: &str) -> Option<Self> {
        let mut parts: Vec<&str> = version.split('.').collect();
        if parts.len() == 4 {
            parts.truncate(3);
        }
        if parts.len() > 3 {
            return None;
        }
        let mut segments = [0u64; 3];
        for (slot, part) in segments.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            *slot = part.parse().ok()?;
        }
        Some(Self {
            major: segments[0],
            minor: segments[1],
            patch: segments[2],
            qualifier: None,
            precision: parts.len(),
        })
    }

    fn parse_with_release(base: &str, release: &str) -> Option<Self> {
        let numeric: Vec<u64> = base
            .split('.')
            .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
            .take(3)
            .map(|p| p.parse::<u64>())
            .collect::<Result<_, _>>()
            .ok()?;
        if numeric.is_empty() {
            return None;
        }

        let mut segments = [0u64; 3];
        segments[..numeric.len()].copy_from_slice(&numeric);

        let release_digits: String = release.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(release_number) = release_digits.parse::<u64>() {
            segments[2] = segments[2].saturating_add(release_number);
        }

        let remainder = release[release_digits.len()..].trim_start_matches('.');
        let qualifier: String = remainder
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
            .collect();

        Some(Self {
            major: segments[0],
            minor: segments[1],
            patch: segments[2],
            qualifier: (!qualifier.is_empty()).then_some(qualifier),
            precision: numeric.len(),
        })
    }

    fn numeric(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric()
            .cmp(&other.numeric())
            .then_with(|| match (&self.qualifier, &other.qualifier) {
                (None, None) => Ordering::Equal,
                // A release sorts after its own pre-release
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_qualifiers(a, b),
            })
    }
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Outcome of testing a version against a range expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMatch {
    Match,
    NoMatch,
    /// The version or the range could not be parsed
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Gte,
    Lte,
    Gt,
    Lt,
    Eq,
    Ne,
    Tilde,
    Caret,
    Compatible,
}

const OPERATORS: &[(&str, Operator)] = &[
    (">=", Operator::Gte),
    ("<=", Operator::Lte),
    ("==", Operator::Eq),
    ("!=", Operator::Ne),
    ("~=", Operator::Compatible),
    (">", Operator::Gt),
    ("<", Operator::Lt),
    ("=", Operator::Eq),
    ("~", Operator::Tilde),
    ("^", Operator::Caret),
];

#[derive(Debug)]
enum Constraint {
    Compare(Operator, Version),
    /// `1.2.x` / `1.2.*`: the given leading segments must match
    Wildcard { negated: bool, prefix: Vec<u64> },
}

/// Version parsing and range evaluation.
///
/// Range grammar: `>=`, `<=`, `>`, `<`, `==`, `=`, `!=`, `~` (`~1.2.3` means
/// `>=1.2.3,<1.3.0`), `^` (`^1.2.3` means `>=1.2.3,<2.0.0`), `~=` (PEP 440
/// compatible release), bare versions (exact match), wildcards (`1.2.x`)
/// and conjunctions separated by commas or whitespace. `*`, `all`, `any` and
/// the empty string match every version.
pub struct VersionComparator;

impl VersionComparator {
    /// Orders two versions, or `None` when either is malformed.
    pub fn compare(left: &str, right: &str) -> Option<Ordering> {
        Some(Version::parse(left)?.cmp(&Version::parse(right)?))
    }

    pub fn is_valid(version: &str) -> bool {
        Version::parse(version).is_some()
    }

    pub fn matches_range(version: &str, range: &str) -> RangeMatch {
        if Self::matches_everything(range) {
            return RangeMatch::Match;
        }
        let Some(version) = Version::parse(version) else {
            return RangeMatch::Indeterminate;
        };
        let Some(constraints) = Self::parse_range(range) else {
            return RangeMatch::Indeterminate;
        };

        if constraints.iter().all(|c| Self::satisfies(&version, c)) {
            RangeMatch::Match
        } else {
            RangeMatch::NoMatch
        }
    }

    /// Lowest version admitted by the range, as written in the range.
    ///
    /// Used to turn a compatible range into a concrete upgrade target.
    pub fn lower_bound(range: &str) -> Option<String> {
        Self::constraint_tokens(range).into_iter().find_map(|token| {
            let (operator, rest) = Self::split_operator(&token);
            match operator {
                Some(Operator::Lt | Operator::Lte | Operator::Ne) => None,
                _ => {
                    let rest = rest.trim();
                    Version::parse(rest).map(|_| rest.trim_start_matches(['v', 'V']).to_string())
                }
            }
        })
    }

    /// Highest parseable version of the list.
    pub fn latest<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
        versions
            .into_iter()
            .filter_map(|v| Version::parse(v).map(|parsed| (parsed, v)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, v)| v)
    }

    fn matches_everything(range: &str) -> bool {
        let range = range.trim();
        range.is_empty()
            || range == "*"
            || range.eq_ignore_ascii_case("all")
            || range.eq_ignore_ascii_case("any")
    }

    /// Splits on commas and whitespace, re-attaching a bare operator to the
    /// token that follows it (`">= 1.0"` → `">=1.0"`).
    fn constraint_tokens(range: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut pending_operator: Option<&str> = None;
        for token in range
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            if token.chars().all(|c| "<>=!~^".contains(c)) {
                pending_operator = Some(token);
                continue;
            }
            match pending_operator.take() {
                Some(operator) => tokens.push(format!("{}{}", operator, token)),
                None => tokens.push(token.to_string()),
            }
        }
        tokens
    }

    fn split_operator(token: &str) -> (Option<Operator>, &str) {
        for (symbol, operator) in OPERATORS {
            if let Some(rest) = token.strip_prefix(symbol) {
                return (Some(*operator), rest);
            }
        }
        (None, token)
    }

    fn parse_range(range: &str) -> Option<Vec<Constraint>> {
        let tokens = Self::constraint_tokens(range);
        if tokens.is_empty() {
            return None;
        }
        tokens.iter().map(|t| Self::parse_constraint(t)).collect()
    }

    fn parse_constraint(token: &str) -> Option<Constraint> {
        let (operator, rest) = Self::split_operator(token.trim());
        let rest = rest.trim();

        if let Some(prefix) = Self::wildcard_prefix(rest) {
            return match operator {
                None | Some(Operator::Eq) => Some(Constraint::Wildcard {
                    negated: false,
                    prefix,
                }),
                Some(Operator::Ne) => Some(Constraint::Wildcard {
                    negated: true,
                    prefix,
                }),
                _ => None,
            };
        }

        let version = Version::parse(rest)?;
        Some(Constraint::Compare(operator.unwrap_or(Operator::Eq), version))
    }

    fn wildcard_prefix(value: &str) -> Option<Vec<u64>> {
        let value = value.trim_start_matches(['v', 'V']);
        let parts: Vec<&str> = value.split('.').collect();
        let last = parts.last()?;
        if !matches!(*last, "x" | "X" | "*") {
            return None;
        }
        parts[..parts.len() - 1]
            .iter()
            .map(|p| p.parse::<u64>().ok())
            .collect()
    }

    fn satisfies(version: &Version, constraint: &Constraint) -> bool {
        match constraint {
            Constraint::Wildcard { negated, prefix } => {
                let segments = [version.major, version.minor, version.patch];
                let matched = prefix.iter().zip(segments.iter()).all(|(p, s)| p == s);
                matched != *negated
            }
            Constraint::Compare(operator, bound) => {
                let ordering = version.cmp(bound);
                match operator {
                    Operator::Gte => ordering != Ordering::Less,
                    Operator::Lte => ordering != Ordering::Greater,
                    Operator::Gt => ordering == Ordering::Greater,
                    Operator::Lt => ordering == Ordering::Less,
                    Operator::Eq => ordering == Ordering::Equal,
                    Operator::Ne => ordering != Ordering::Equal,
                    Operator::Tilde => {
                        ordering != Ordering::Less
                            && version.major == bound.major
                            && (bound.precision < 2 || version.minor == bound.minor)
                    }
                    Operator::Caret => ordering != Ordering::Less && version.major == bound.major,
                    Operator::Compatible => {
                        let fixed = bound.precision.saturating_sub(1).max(1);
                        let segments = [version.major, version.minor, version.patch];
                        let bound_segments = [bound.major, bound.minor, bound.patch];
                        ordering != Ordering::Less && segments[..fixed] == bound_segments[..fixed]
                    }
                }
            }
        }
    }
}
