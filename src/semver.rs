use std::{cmp::Ordering, fmt::Display, str::FromStr};

use miette::Diagnostic;

/// A semantic version, parsed either strictly or loosely from a tag name.
///
/// Build metadata (everything after a `+`) is accepted and discarded, so it
/// never participates in ordering.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<Prerelease>,
}

impl Version {
    #[must_use]
    pub const fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// Tolerant parsing for version strings found in the wild: surrounding
    /// whitespace, a leading `v`/`V` or `=`, and missing minor/patch
    /// components are all accepted. `v2.1` parses as `2.1.0`.
    pub fn parse_loose(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        let s = s
            .strip_prefix(['v', 'V', '='])
            .map_or(s, |stripped| stripped.trim_start());
        Self::parse_parts(s, true)
    }

    fn parse_parts(s: &str, loose: bool) -> Result<Self, Error> {
        let s = s.split_once('+').map_or(s, |(version, _build)| version);
        let (version, pre) = s
            .split_once('-')
            .map_or((s, None), |(version, pre)| (version, Some(pre)));
        let parts = version
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|err| Error(format!("{s}: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let [major, minor, patch] = match (parts.len(), loose) {
            (3, _) => [parts[0], parts[1], parts[2]],
            (2, true) => [parts[0], parts[1], 0],
            (1, true) => [parts[0], 0, 0],
            _ => {
                return Err(Error(format!("{s}: version must have 3 parts")));
            }
        };
        Ok(Self {
            major,
            minor,
            patch,
            pre: pre.map(Prerelease::from_str).transpose()?,
        })
    }
}

impl FromStr for Version {
    type Err = Error;

    /// Strict parsing: exactly `major.minor.patch`, with optional prerelease
    /// and build metadata.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_parts(s, false)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then({
                match (&self.pre, &other.pre) {
                    (Some(pre), Some(other_pre)) => pre.cmp(other_pre),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

/// The prerelease component of a version: one or more dot-separated
/// identifiers, compared per SemVer 2.0.0 precedence rules.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Prerelease(Vec<Identifier>);

impl FromStr for Prerelease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error("prerelease must not be empty".to_string()));
        }
        s.split('.')
            .map(|identifier| {
                if identifier.is_empty() {
                    Err(Error(format!("{s}: empty prerelease identifier")))
                } else {
                    Ok(Identifier::from(identifier))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Ord for Prerelease {
    fn cmp(&self, other: &Self) -> Ordering {
        for (identifier, other_identifier) in self.0.iter().zip(other.0.iter()) {
            match identifier.cmp(other_identifier) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        // A larger set of identifiers has higher precedence when all
        // preceding identifiers are equal (1.0.0-alpha < 1.0.0-alpha.1).
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for Prerelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Prerelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut identifiers = self.0.iter();
        if let Some(first) = identifiers.next() {
            write!(f, "{first}")?;
        }
        for identifier in identifiers {
            write!(f, ".{identifier}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Identifier {
    Numeric(u64),
    Alpha(String),
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        if s.bytes().all(|byte| byte.is_ascii_digit()) {
            // Identifiers too large for u64 fall back to ASCII comparison.
            s.parse::<u64>()
                .map_or_else(|_| Self::Alpha(s.to_string()), Self::Numeric)
        } else {
            Self::Alpha(s.to_string())
        }
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(num), Self::Numeric(other_num)) => num.cmp(other_num),
            // Numeric identifiers always have lower precedence.
            (Self::Numeric(_), Self::Alpha(_)) => Ordering::Less,
            (Self::Alpha(_), Self::Numeric(_)) => Ordering::Greater,
            (Self::Alpha(alpha), Self::Alpha(other_alpha)) => alpha.cmp(other_alpha),
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(num) => write!(f, "{num}"),
            Self::Alpha(alpha) => write!(f, "{alpha}"),
        }
    }
}

/// Reorder two version strings ascending.
///
/// Both inputs must be strictly valid semantic versions.
///
/// # Errors
///
/// If either string is not a valid semantic version.
pub fn sort_versions<'a>(v1: &'a str, v2: &'a str) -> Result<(&'a str, &'a str), Error> {
    let first = Version::from_str(v1)?;
    let second = Version::from_str(v2)?;
    if first > second {
        Ok((v2, v1))
    } else {
        Ok((v1, v2))
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("Found invalid semantic version {0}")]
#[diagnostic(code(semver), help("The version must be a valid Semantic Version"))]
pub struct Error(String);
