use std::future::Future;

use log::debug;
use miette::Diagnostic;
use reqwest::{Client, Response};

use super::{Release, ReleaseSource};

/// Fixed page size; pagination past the first page is not supported.
const PAGE_SIZE: u32 = 100;

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("relog/", env!("CARGO_PKG_VERSION"));

/// Fetches release metadata from the GitHub REST API.
pub struct GitHub {
    client: Client,
}

impl GitHub {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn list_releases(&self, repo: &str) -> Result<Vec<Release>, Error> {
        debug!("fetching first {PAGE_SIZE} releases for {repo}");
        self.client
            .get(format!("{GITHUB_API}/repos/{repo}/releases"))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .query(&[("per_page", PAGE_SIZE), ("page", 1)])
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| Error::ApiRequest {
                err: source.to_string(),
                repo: repo.to_string(),
            })?
            .json::<Vec<Release>>()
            .await
            .map_err(|source| Error::ApiResponse {
                source,
                repo: repo.to_string(),
            })
    }
}

impl ReleaseSource for GitHub {
    fn fetch(&self, repo: &str) -> impl Future<Output = Result<Vec<Release>, Error>> + Send {
        self.list_releases(repo)
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("Trouble communicating with GitHub while listing releases for {repo}: {err}")]
    #[diagnostic(
        code(github::api_request_error),
        help(
            "There was a problem communicating with GitHub, this may be a network issue or a rate limit."
        )
    )]
    ApiRequest { err: String, repo: String },
    #[error("Trouble decoding the release list for {repo}: {source}")]
    #[diagnostic(
        code(github::api_response_error),
        help("Failure to decode a response from GitHub is probably a bug. Please report it.")
    )]
    ApiResponse {
        source: reqwest::Error,
        repo: String,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn release_payload_deserializes() {
        let payload = r###"[
            {
                "url": "https://api.github.com/repos/owner/repo/releases/1",
                "id": 1,
                "tag_name": "v1.2.3",
                "name": "v1.2.3",
                "prerelease": false,
                "created_at": "2024-01-10T12:00:00Z",
                "published_at": "2024-01-11T09:30:00Z",
                "body": "## Fixed\n\n- a bug"
            },
            {
                "url": "https://api.github.com/repos/owner/repo/releases/2",
                "id": 2,
                "tag_name": "v1.3.0-rc.1",
                "name": null,
                "prerelease": true,
                "created_at": "2024-02-01T12:00:00Z",
                "published_at": null,
                "body": null
            }
        ]"###;

        let releases: Vec<Release> = serde_json::from_str(payload).expect("valid payload");
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag_name, "v1.2.3");
        assert_eq!(releases[0].body(), "## Fixed\n\n- a bug");
        assert!(releases[1].prerelease);
        assert_eq!(releases[1].name, None);
        assert_eq!(releases[1].published_at, None);
        assert_eq!(releases[1].body(), "");
    }
}
