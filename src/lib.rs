use miette::Diagnostic;
use reqwest::Client;

pub use crate::{
    releases::{
        github::GitHub, releases_between, sort_releases, Release, ReleaseGroup,
        ReleaseRepository, ReleaseSource,
    },
    semver::sort_versions,
};

pub mod changelog;
pub mod cli;
pub mod releases;
pub mod semver;

/// Fetch the selected repository's releases and print the requested view.
///
/// # Errors
///
/// If the fetch failed or a range endpoint is not a valid semantic version.
pub async fn run(cli: cli::Cli) -> Result<(), Error> {
    let mut repository = ReleaseRepository::new(GitHub::new(Client::new()));
    repository.set_include_prereleases(cli.prereleases);
    repository.set_repo(&cli.repo);
    repository.fetch_releases().await;
    if let Some(err) = repository.last_error() {
        return Err(Error::Fetch(err.to_string()));
    }

    if cli.groups {
        for group in repository.get_releases_by_group() {
            println!("{}", group.name);
            for release in &group.releases {
                println!("  {}", release.tag_name);
            }
        }
        return Ok(());
    }

    let releases = repository.get_releases();
    let selected = match (&cli.from, &cli.to) {
        (Some(from), Some(to)) => {
            // Reject malformed endpoints loudly here; the query itself would
            // just come back empty.
            sort_versions(from, to)?;
            releases_between(&releases, from, to)
        }
        _ => sort_releases(&releases),
    };

    println!("{}", changelog::build(selected.iter().map(Release::body)));
    Ok(())
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("Could not fetch releases: {0}")]
    #[diagnostic(
        code(fetch),
        help("Check the repository name and your network connection")
    )]
    Fetch(String),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Semver(#[from] semver::Error),
}
