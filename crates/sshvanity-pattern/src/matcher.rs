//! Pattern matching implementation

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sshvanity_crypto::encoding::{ALGORITHM, BASE64_LEAD_IN, ENCODED_LEN};
use thiserror::Error;

/// Characters that can appear in an encoded public key line
pub const VALID_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/- ";

/// A pattern can never be longer than the line it is matched against
pub const MAX_PATTERN_LEN: usize = ENCODED_LEN;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("No patterns provided")]
    NoPatterns,
    #[error("Pattern is empty")]
    EmptyPattern,
    #[error("Pattern contains invalid character '{0}' (valid: base64 alphabet)")]
    InvalidCharacter(char),
    #[error("Pattern too long (max {0} characters)")]
    PatternTooLong(usize),
    #[error("Prefix pattern can never match: every key starts with '{0}'")]
    UnreachablePrefix(String),
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),
}

/// Type of pattern matching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Match anywhere in the line
    #[default]
    Contains,
    /// Match at start of the line (must include the `ssh-ed25519 AAAA` lead-in)
    Prefix,
    /// Match at end of the line
    Suffix,
    /// Regular expression searched anywhere in the line
    Regex,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternType::Contains => write!(f, "contains"),
            PatternType::Prefix => write!(f, "prefix"),
            PatternType::Suffix => write!(f, "suffix"),
            PatternType::Regex => write!(f, "regex"),
        }
    }
}

/// A pattern to search for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    /// The pattern string to match
    pub value: String,
    /// Type of matching
    pub pattern_type: PatternType,
    /// Case insensitive matching
    pub case_insensitive: bool,
}

impl Pattern {
    /// Create a new contains pattern
    pub fn contains(value: impl Into<String>) -> Self {
        Self::new(value, PatternType::Contains)
    }

    /// Create a new prefix pattern
    pub fn prefix(value: impl Into<String>) -> Self {
        Self::new(value, PatternType::Prefix)
    }

    /// Create a new suffix pattern
    pub fn suffix(value: impl Into<String>) -> Self {
        Self::new(value, PatternType::Suffix)
    }

    /// Create a new regex pattern (without the surrounding slashes)
    pub fn regex(value: impl Into<String>) -> Self {
        Self::new(value, PatternType::Regex)
    }

    /// Parse command-line style input: `/expr/` is a regex, anything else gets
    /// `default_type`
    pub fn parse(input: &str, default_type: PatternType) -> Self {
        match input
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(expr) => Self::regex(expr),
            None => Self::new(input, default_type),
        }
    }

    pub fn new(value: impl Into<String>, pattern_type: PatternType) -> Self {
        Self {
            value: value.into(),
            pattern_type,
            case_insensitive: false,
        }
    }

    /// Make pattern case insensitive
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Validate the pattern against what an encoded key line can contain
    pub fn validate(&self) -> Result<(), PatternError> {
        if self.value.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        if self.pattern_type == PatternType::Regex {
            return self.compile_regex().map(|_| ());
        }

        if self.value.len() > MAX_PATTERN_LEN {
            return Err(PatternError::PatternTooLong(MAX_PATTERN_LEN));
        }

        if let Some(c) = self.value.chars().find(|c| !VALID_CHARS.contains(*c)) {
            return Err(PatternError::InvalidCharacter(c));
        }

        if self.pattern_type == PatternType::Prefix && !self.prefix_reachable() {
            return Err(PatternError::UnreachablePrefix(fixed_lead_in()));
        }

        Ok(())
    }

    fn compile_regex(&self) -> Result<Regex, PatternError> {
        RegexBuilder::new(&self.value)
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|e| PatternError::InvalidRegex(e.to_string()))
    }

    /// Whether a prefix pattern agrees with the lead-in every key shares
    fn prefix_reachable(&self) -> bool {
        let lead_in = fixed_lead_in();
        let overlap = self.value.len().min(lead_in.len());
        let (pat, fixed) = (&self.value[..overlap], &lead_in[..overlap]);

        if self.case_insensitive {
            pat.eq_ignore_ascii_case(fixed)
        } else {
            pat == fixed
        }
    }

    /// Check a full encoded line against this pattern
    ///
    /// An invalid regex matches nothing.
    pub fn matches(&self, line: &str) -> bool {
        match Needle::compile(self) {
            Ok(needle) => needle.is_match(line, None),
            Err(_) => false,
        }
    }

    /// Expected number of attempts to find a match (NaN when it cannot be
    /// estimated, as for regex patterns)
    pub fn difficulty(&self) -> f64 {
        crate::calculate_difficulty(&self.value, self.pattern_type, self.case_insensitive)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.value, self.pattern_type)?;
        if self.case_insensitive {
            write!(f, ", case-insensitive")?;
        }
        write!(f, ")")
    }
}

/// `ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAI`: the part of every line that does not
/// depend on the key
pub(crate) fn fixed_lead_in() -> String {
    format!("{} {}", ALGORITHM, BASE64_LEAD_IN)
}

/// Where a literal pattern has to sit in the line
#[derive(Debug, Clone, Copy)]
enum Anchor {
    Anywhere,
    Start,
    End,
}

/// A validated pattern in the form it is checked in
#[derive(Debug, Clone)]
enum Needle {
    /// Lowered already when case-insensitive
    Literal {
        value: String,
        anchor: Anchor,
        case_insensitive: bool,
    },
    Regex(Regex),
}

impl Needle {
    fn compile(pattern: &Pattern) -> Result<Self, PatternError> {
        let anchor = match pattern.pattern_type {
            PatternType::Contains => Anchor::Anywhere,
            PatternType::Prefix => Anchor::Start,
            PatternType::Suffix => Anchor::End,
            PatternType::Regex => return pattern.compile_regex().map(Needle::Regex),
        };

        let value = if pattern.case_insensitive {
            pattern.value.to_ascii_lowercase()
        } else {
            pattern.value.clone()
        };

        Ok(Needle::Literal {
            value,
            anchor,
            case_insensitive: pattern.case_insensitive,
        })
    }

    /// `lowered` is the line lowered once by the caller, if it has it
    #[inline]
    fn is_match(&self, line: &str, lowered: Option<&str>) -> bool {
        match self {
            Needle::Regex(re) => re.is_match(line),
            Needle::Literal {
                value,
                anchor,
                case_insensitive,
            } => {
                let owned;
                let subject = match (*case_insensitive, lowered) {
                    (false, _) => line,
                    (true, Some(lower)) => lower,
                    (true, None) => {
                        owned = line.to_ascii_lowercase();
                        owned.as_str()
                    }
                };

                match anchor {
                    Anchor::Anywhere => subject.contains(value.as_str()),
                    Anchor::Start => subject.starts_with(value.as_str()),
                    Anchor::End => subject.ends_with(value.as_str()),
                }
            }
        }
    }
}

/// Pattern matcher for checking encoded keys.
///
/// Case-insensitive literals are lowered and regexes compiled once at
/// construction; the candidate line is lowered at most once per check.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<Pattern>,
    needles: Vec<Needle>,
    any_lowered: bool,
}

impl PatternMatcher {
    /// Create a matcher, validating every pattern
    pub fn new(patterns: Vec<Pattern>) -> Result<Self, PatternError> {
        if patterns.is_empty() {
            return Err(PatternError::NoPatterns);
        }
        for pattern in &patterns {
            pattern.validate()?;
        }

        let needles = patterns
            .iter()
            .map(Needle::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let any_lowered = patterns
            .iter()
            .any(|p| p.case_insensitive && p.pattern_type != PatternType::Regex);

        Ok(Self {
            patterns,
            needles,
            any_lowered,
        })
    }

    /// Create a matcher with a single pattern
    pub fn single(pattern: Pattern) -> Result<Self, PatternError> {
        Self::new(vec![pattern])
    }

    /// Check if the line matches any pattern.
    /// Returns the index of the first matching pattern, or None
    pub fn matches(&self, line: &str) -> Option<usize> {
        let lowered = self.any_lowered.then(|| line.to_ascii_lowercase());

        self.needles
            .iter()
            .position(|needle| needle.is_match(line, lowered.as_deref()))
    }

    /// Get all patterns
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}
