use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::types::Repository;
use crate::http::HttpClient;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

/// Media type asking the contents API for the raw file instead of base64 JSON.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedstockSource: Send + Sync {
    /// Lists the feedstock repositories of `org`, ordered by lowercase name.
    async fn list_feedstocks(&self, org: &str) -> Result<Vec<Repository>>;

    /// Fetches a file from the repository's default branch. `Ok(None)` means
    /// the file does not exist.
    async fn get_file_contents(&self, repo: &Repository, path: &str) -> Result<Option<Vec<u8>>>;
}

pub struct GitHub {
    http_client: HttpClient,
    api_url: String,
}

impl GitHub {
    #[tracing::instrument(skip(client, api_url))]
    pub fn new(client: Client, api_url: Option<String>) -> Self {
        let api_url = api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self {
            http_client: HttpClient::new(client),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Lists every repository of an organization, following pagination until
    /// a short page is returned.
    #[tracing::instrument(skip(self))]
    pub async fn list_org_repos(&self, org: &str) -> Result<Vec<Repository>> {
        let url = format!("{}/orgs/{}/repos", self.api_url, org);
        let per_page = PER_PAGE.to_string();
        let mut repos = Vec::new();
        let mut page = 1;

        loop {
            debug!("Fetching repositories page {} from {}...", page, url);

            let parsed: Vec<Repository> = self
                .http_client
                .get_json_with_query(&url, &[("per_page", &per_page), ("page", &page.to_string())])
                .await
                .with_context(|| format!("Failed to list repositories of {}", org))?;

            let len = parsed.len();
            repos.extend(parsed);

            if len < PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!("Found {} repositories in {}", repos.len(), org);
        Ok(repos)
    }
}

#[async_trait]
impl FeedstockSource for GitHub {
    #[tracing::instrument(skip(self))]
    async fn list_feedstocks(&self, org: &str) -> Result<Vec<Repository>> {
        let mut feedstocks: Vec<Repository> = self
            .list_org_repos(org)
            .await?
            .into_iter()
            .filter(Repository::is_feedstock)
            .collect();
        feedstocks.sort_by_key(|repo| repo.name.to_lowercase());
        Ok(feedstocks)
    }

    #[tracing::instrument(skip(self, repo), fields(repo = %repo.full_name))]
    async fn get_file_contents(&self, repo: &Repository, path: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/repos/{}/contents/{}", self.api_url, repo.full_name, path);
        self.http_client
            .get_bytes_if_found(&url, RAW_MEDIA_TYPE)
            .await
            .with_context(|| format!("Failed to fetch {} from {}", path, repo.full_name))
    }
}
