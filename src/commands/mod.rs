use anyhow::Result;
use log::{debug, info};
use std::path::Path;

use crate::{github::FeedstockSource, index, runtime::Runtime, template::Environment};

pub mod config;

use config::Config;

/// Default organization scanned for feedstocks.
pub const DEFAULT_GH_ORG: &str = "conda-forge";

/// Builds the package index for `gh_org` and writes it to `filename`.
#[tracing::instrument(skip(runtime, api_url))]
pub async fn build_feedstock_index<R: Runtime>(
    runtime: R,
    filename: &Path,
    gh_org: &str,
    api_url: Option<String>,
) -> Result<()> {
    let config = Config::new(runtime, api_url)?;
    debug!("Using GitHub API at {}", config.github.api_url());
    run_build_feedstock_index(&config.runtime, &config.github, &config.env, filename, gh_org).await
}

#[tracing::instrument(skip(runtime, source, env))]
pub async fn run_build_feedstock_index<R: Runtime, S: FeedstockSource + ?Sized>(
    runtime: &R,
    source: &S,
    env: &Environment,
    filename: &Path,
    gh_org: &str,
) -> Result<()> {
    let index = index::build_index(source, env, gh_org).await?;
    index.write(runtime, filename)?;

    info!("Wrote {} packages to {:?}", index.len(), filename);
    println!("feedstocks index written to {}", filename.display());
    Ok(())
}
