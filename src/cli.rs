//! Command-line interface definitions.

use clap::Parser;

/// Print the combined release notes of a GitHub repository as a sectioned
/// HTML changelog.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Repository to read releases from, as `owner/name`
    pub repo: String,

    /// Include prereleases
    #[arg(short, long)]
    pub prereleases: bool,

    /// Only include releases from this version on (inclusive)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Only include releases up to this version (inclusive)
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Print the version-group summary instead of the HTML changelog
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub groups: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }
}
