//! Release records and the per-repository release cache, with sorting,
//! grouping, and version-range queries over them.

use std::{cmp::Ordering, future::Future, str::FromStr};

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, warn};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::semver::Version;

pub mod github;

/// A published release as returned by the forge, with its markdown changelog
/// body. The tag name is the identity key within one repository.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Release {
    pub url: String,
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub prerelease: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Not set for draft releases.
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    pub body: Option<String>,
}

impl Release {
    /// The markdown changelog body, empty when the forge returned none.
    #[must_use]
    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// Releases sharing a major version, labelled `Version <major>` or
/// `Version Unknown` for tags that don't parse. Rebuilt on every query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseGroup {
    pub name: String,
    pub releases: Vec<Release>,
}

/// The external collaborator that actually retrieves release metadata.
pub trait ReleaseSource {
    fn fetch(&self, repo: &str)
        -> impl Future<Output = Result<Vec<Release>, github::Error>> + Send;
}

/// Holds a memoized per-repository release cache plus the current selection
/// (repository id and prerelease flag) and answers queries over it.
///
/// Cache entries are populated at most once per repository id and never
/// evicted or refreshed within the repository's lifetime.
pub struct ReleaseRepository<S> {
    source: S,
    cache: IndexMap<String, IndexMap<String, Release>>,
    repo: String,
    include_prereleases: bool,
    current: IndexMap<String, Release>,
    last_error: Option<String>,
}

impl<S: ReleaseSource> ReleaseRepository<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: IndexMap::new(),
            repo: String::new(),
            include_prereleases: false,
            current: IndexMap::new(),
            last_error: None,
        }
    }

    pub fn set_repo(&mut self, repo: impl Into<String>) {
        self.repo = repo.into();
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn set_include_prereleases(&mut self, include: bool) {
        self.include_prereleases = include;
    }

    /// The reason the most recent fetch failed, if it did. Fetch failures
    /// are only ever reported here, never returned to the caller.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch the releases of the active repository, keyed by tag name.
    ///
    /// Repository ids shorter than 3 characters (partial input while the
    /// user is still typing) and cached ids resolve without touching the
    /// source. Otherwise a single first-page fetch populates the cache.
    /// Failures resolve to an empty mapping and set [`Self::last_error`].
    pub async fn fetch_releases(&mut self) -> IndexMap<String, Release> {
        self.last_error = None;
        // The fetch is tagged with the repository id it was issued for so a
        // resolution arriving after the active repository changed can't
        // clobber the current view. The cache write is keyed by the same id
        // either way.
        let repo = self.repo.clone();

        let fetched = if repo.len() < 3 {
            IndexMap::new()
        } else if let Some(cached) = self.cache.get(&repo) {
            debug!("returning cached releases for {repo}");
            cached.clone()
        } else {
            match self.source.fetch(&repo).await {
                Ok(releases) => {
                    let entry = self.cache.entry(repo.clone()).or_default();
                    for release in releases {
                        entry.insert(release.tag_name.clone(), release);
                    }
                    entry.clone()
                }
                Err(err) => {
                    warn!("failed to fetch releases for {repo}: {err}");
                    self.last_error = Some(err.to_string());
                    IndexMap::new()
                }
            }
        };

        if self.repo == repo {
            self.current = fetched.clone();
        }
        fetched
    }

    /// The current release mapping filtered by the prerelease flag, in the
    /// underlying mapping's iteration order. The cache is left untouched.
    #[must_use]
    pub fn get_releases(&self) -> IndexMap<String, Release> {
        self.current
            .iter()
            .filter(|(_, release)| self.include_prereleases || !release.prerelease)
            .map(|(tag_name, release)| (tag_name.clone(), release.clone()))
            .collect()
    }

    /// The current releases bucketed by major version.
    ///
    /// Iteration is version-descending, so groups appear in the order their
    /// major version is first encountered during that walk and each group's
    /// releases stay internally version-descending.
    #[must_use]
    pub fn get_releases_by_group(&self) -> Vec<ReleaseGroup> {
        let mut groups: IndexMap<String, Vec<Release>> = IndexMap::new();
        for release in sort_releases(&self.get_releases()) {
            let name = Version::parse_loose(&release.tag_name).map_or_else(
                |_| "Version Unknown".to_string(),
                |version| format!("Version {}", version.major),
            );
            groups.entry(name).or_default().push(release);
        }
        groups
            .into_iter()
            .map(|(name, releases)| ReleaseGroup { name, releases })
            .collect()
    }
}

/// Sort a release mapping by semantic version, descending.
///
/// Tag names are parsed loosely; tags that still don't parse sort after
/// every parseable version, keeping their relative mapping order.
#[must_use]
pub fn sort_releases(releases: &IndexMap<String, Release>) -> Vec<Release> {
    releases
        .values()
        .map(|release| (Version::parse_loose(&release.tag_name).ok(), release))
        .sorted_by(|(version, _), (other_version, _)| match (version, other_version) {
            (Some(version), Some(other_version)) => other_version.cmp(version),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .map(|(_, release)| release.clone())
        .collect()
}

/// All releases whose version lies in the inclusive range spanned by `v1`
/// and `v2` (in either order), version-descending.
///
/// Both endpoints must be strictly valid semantic versions; if either is
/// not, the result is empty rather than an error. Prerelease versions are
/// included in the range test.
#[must_use]
pub fn releases_between(
    releases: &IndexMap<String, Release>,
    v1: &str,
    v2: &str,
) -> Vec<Release> {
    let (Ok(first), Ok(second)) = (Version::from_str(v1), Version::from_str(v2)) else {
        return Vec::new();
    };
    let (lower, upper) = if first <= second {
        (first, second)
    } else {
        (second, first)
    };

    let selected = releases
        .iter()
        .filter(|(tag_name, _)| {
            Version::parse_loose(tag_name)
                .is_ok_and(|version| lower <= version && version <= upper)
        })
        .map(|(tag_name, release)| (tag_name.clone(), release.clone()))
        .collect();
    sort_releases(&selected)
}
