use burrow_catalog::{DEFAULT_TAKE, SearchQuery};
use burrow_package::models::NuGetVersion;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, arg_required_else_help = true)]
pub struct Args {
    /// Increase log verbosity (repeat for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read configuration from this file (toml, yaml or json)
    #[arg(short, long, global = true, env = "BURROW_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Index one or more .nupkg files
    #[command(arg_required_else_help = true)]
    Push {
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
    },

    /// Search listed packages
    Search {
        /// Case-insensitive substring of the package id
        query: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Complete package ids, or the versions of one package with --id
    Autocomplete {
        query: Option<String>,
        /// List the versions of this package instead of matching ids
        #[arg(long, conflicts_with = "query")]
        id: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Every version of a package, unlisted ones included
    Versions { id: String },

    /// Registration index of a package
    Registration { id: String },

    /// Registration leaf of one package version
    Leaf {
        id: String,
        #[arg(value_parser = parse_version)]
        version: NuGetVersion,
    },

    /// Download a package archive, counting the download
    Download {
        #[command(flatten)]
        package: PackageArgs,
        /// Output file (defaults to {id}.{version}.nupkg in the current directory)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },

    /// Print the .nuspec of a package version
    Manifest {
        #[command(flatten)]
        package: PackageArgs,
    },

    /// Print the embedded readme of a package version
    Readme {
        #[command(flatten)]
        package: PackageArgs,
    },

    /// Save the embedded icon of a package version
    Icon {
        #[command(flatten)]
        package: PackageArgs,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },

    /// Hide a package version from search results
    Unlist {
        #[command(flatten)]
        package: PackageArgs,
    },

    /// Make an unlisted package version visible again
    Relist {
        #[command(flatten)]
        package: PackageArgs,
    },

    /// Delete a package version as configured (unlist or hard delete)
    Delete {
        #[command(flatten)]
        package: PackageArgs,
        /// Remove the record and blobs regardless of configuration
        #[arg(long)]
        hard: bool,
    },

    /// Listed packages depending on a package
    Dependents { id: String },

    /// Frameworks whose packages a project targeting this moniker can use
    Frameworks { moniker: String },

    /// Print the service index
    ServiceIndex,

    /// List stored package blobs that have no catalog record
    Orphans,
}

#[derive(ClapArgs)]
pub struct PackageArgs {
    pub id: String,
    #[arg(value_parser = parse_version)]
    pub version: NuGetVersion,
}

#[derive(ClapArgs)]
pub struct FilterArgs {
    /// Include prerelease versions
    #[arg(long)]
    pub prerelease: bool,
    /// Include SemVer 2.0.0 versions
    #[arg(long)]
    pub semver2: bool,
    /// Only packages of this type (e.g. Dependency, DotnetTool)
    #[arg(long = "type")]
    pub package_type: Option<String>,
    /// Only packages usable from this target framework
    #[arg(long)]
    pub framework: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub skip: u32,
    #[arg(long, default_value_t = DEFAULT_TAKE)]
    pub take: u32,
}
impl FilterArgs {
    pub fn query(self, text: Option<String>) -> SearchQuery {
        SearchQuery {
            text,
            include_prerelease: self.prerelease,
            include_semver2: self.semver2,
            package_type: self.package_type,
            framework: self.framework,
            skip: self.skip,
            take: self.take,
        }
    }
}

fn parse_version(input: &str) -> Result<NuGetVersion, String> {
    NuGetVersion::parse(input).map_err(|err| err.to_string())
}
