//! The package index: package name -> feedstock repository.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::github::{FeedstockSource, Repository};
use crate::recipe::{META_YAML_PATH, extract_package_name};
use crate::runtime::Runtime;
use crate::template::Environment;

/// Mapping from lowercase package name to repository full name.
///
/// Backed by a `BTreeMap`, so the serialized form is sorted by key and two
/// builds over the same input produce identical bytes.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct PackageIndex {
    entries: BTreeMap<String, String>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a mapping, lowercasing the name. Returns the repository that
    /// previously held the name, if any; the new value always wins.
    pub fn insert(&mut self, name: &str, repo: &str) -> Option<String> {
        self.entries.insert(name.to_lowercase(), repo.to_string())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Package names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize package index")
    }

    /// Writes the index as JSON. The data goes to `<path>.tmp` first and is
    /// renamed over `path`, so a failed run never leaves a truncated index.
    #[tracing::instrument(skip(self, runtime))]
    pub fn write<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let tmp = temp_path(path);

        debug!("Writing {} entries to {:?}", self.len(), tmp);
        runtime
            .write(&tmp, json.as_bytes())
            .with_context(|| format!("Failed to write package index to {:?}", tmp))?;

        if let Err(e) = runtime.rename(&tmp, path) {
            if runtime.exists(&tmp) {
                let _ = runtime.remove_file(&tmp);
            }
            return Err(e).with_context(|| format!("Failed to move package index to {:?}", path));
        }
        Ok(())
    }

    /// Reads an index previously written by [`PackageIndex::write`].
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let json = runtime.read_to_string(path)?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse package index {:?}", path))
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Guesses a package name from a feedstock URL: the last path segment up to
/// `-feedstock`, lowercased. `.../bob.io.image-feedstock` gives `bob.io.image`.
pub fn fallback_package_name(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or(url);
    let name = last.split("-feedstock").next().unwrap_or(last);
    name.to_lowercase()
}

/// Builds the index for every feedstock in `org`.
///
/// A missing or unparsable `meta.yaml` falls back to [`fallback_package_name`];
/// any other error from `source` aborts the build.
#[tracing::instrument(skip(source, env))]
pub async fn build_index<S: FeedstockSource + ?Sized>(
    source: &S,
    env: &Environment,
    org: &str,
) -> Result<PackageIndex> {
    let repos = source.list_feedstocks(org).await?;
    info!("Indexing {} feedstocks from {}", repos.len(), org);

    let mut index = PackageIndex::new();
    let mut fallbacks = 0;

    for repo in &repos {
        let pkg_name = match package_name(source, env, repo).await? {
            Some(name) => name,
            None => {
                fallbacks += 1;
                println!("Unable to parse meta.yaml for {}", repo.url);
                println!("guessing pkg name from feedstock url");
                fallback_package_name(&repo.url)
            }
        };

        debug!("{} -> {}", pkg_name, repo.full_name);
        if let Some(previous) = index.insert(&pkg_name, &repo.full_name) {
            if previous != repo.full_name {
                warn!(
                    "Package {} is declared by both {} and {}; keeping {}",
                    pkg_name, previous, repo.full_name, repo.full_name
                );
            }
        }
    }

    info!(
        "Indexed {} packages ({} guessed from repository URLs)",
        index.len(),
        fallbacks
    );
    Ok(index)
}

/// Fetches and parses the recipe of one feedstock. `Ok(None)` means the name
/// has to be guessed.
async fn package_name<S: FeedstockSource + ?Sized>(
    source: &S,
    env: &Environment,
    repo: &Repository,
) -> Result<Option<String>> {
    let Some(meta) = source.get_file_contents(repo, META_YAML_PATH).await? else {
        info!("{} has no {}", repo.full_name, META_YAML_PATH);
        return Ok(None);
    };

    match extract_package_name(env, &meta) {
        Ok(name) => Ok(Some(name)),
        Err(e) => {
            warn!("Failed to extract package name from {}: {}", repo.full_name, e);
            Ok(None)
        }
    }
}
