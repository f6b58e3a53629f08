use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::time::Duration;

use crate::{github::GitHub, recipe::recipe_environment, runtime::Runtime, template::Environment};

/// Upper bound on every HTTP request; a request that exceeds it fails the run.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub github: GitHub,
    pub env: Environment,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, api_url: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GITHUB_TOKEN is not a valid header value")?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication ({} characters)", token.len());
        }

        let client = Client::builder()
            .user_agent(concat!("feedstock-index/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            runtime,
            github: GitHub::new(client, api_url),
            env: recipe_environment(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockito::{Matcher, Server};

    /// Helper function to verify Authorization header behavior
    /// - `token`: Some(token) to test with GITHUB_TOKEN set, None to test without
    async fn verify_authorization_header(token: Option<&str>) {
        // --- Setup MockRuntime ---

        let mut runtime = MockRuntime::new();
        let token_clone = token.map(|t| t.to_string());

        runtime
            .expect_env_var()
            .with(mockall::predicate::eq("GITHUB_TOKEN"))
            .returning(move |_| token_clone.clone().ok_or(std::env::VarError::NotPresent));

        // --- Create Mock Server ---

        let mut server = Server::new_async().await;

        let expected_header = match token {
            Some(t) => Matcher::Exact(format!("Bearer {}", t)),
            None => Matcher::Missing,
        };

        let mock = server
            .mock("GET", "/orgs/test-org/repos")
            .match_query(Matcher::Any)
            .match_header("Authorization", expected_header)
            .with_status(200)
            .with_body("[]")
            .create();

        // --- Execute ---

        let config = Config::new(runtime, Some(server.url())).unwrap();
        let repos = config.github.list_org_repos("test-org").await.unwrap();
        assert!(repos.is_empty());

        // --- Verify ---

        mock.assert();
    }

    #[tokio::test]
    async fn test_config_new_with_github_token() {
        verify_authorization_header(Some("test_token")).await;
    }

    #[tokio::test]
    async fn test_config_new_without_github_token() {
        verify_authorization_header(None).await;
    }

    #[test]
    fn test_config_new_uses_api_url() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));

        let config = Config::new(runtime, Some("https://ghe.example.com/api/v3".into())).unwrap();
        assert_eq!(config.github.api_url(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_config_new_rejects_invalid_token() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Ok("bad\ntoken".to_string()));

        assert!(Config::new(runtime, None).is_err());
    }
}
