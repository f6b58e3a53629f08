use anyhow::Result;
use clap::Parser;
use feedstock_index::commands::{DEFAULT_GH_ORG, build_feedstock_index};
use std::path::PathBuf;

/// Match package names in a PR against existing feedstocks.
///
/// Tools to index the package names of every feedstock in a GitHub
/// organization so recipes in a pull request can be matched against them.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// This is useful for avoiding rate limits when scanning large organizations.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", env = "GITHUB_API_URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create json index of feedstocks.
    BuildFeedstockIndex(BuildFeedstockIndexArgs),
}

#[derive(clap::Args, Debug)]
pub struct BuildFeedstockIndexArgs {
    /// Path the JSON index is written to
    #[arg(value_name = "FILENAME")]
    pub filename: PathBuf,

    /// Set Github organization name.
    #[arg(long = "gh-org", value_name = "ORG", default_value = DEFAULT_GH_ORG)]
    pub gh_org: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = feedstock_index::runtime::RealRuntime;

    match cli.command {
        Commands::BuildFeedstockIndex(args) => {
            build_feedstock_index(runtime, &args.filename, &args.gh_org, cli.api_url).await?
        }
    }
    Ok(())
}
