mod types;

use async_trait::async_trait;
use log::debug;
use reqwest::Url;

use crate::http::{ApiError, HttpClient};

pub use types::{Repository, sort_by_recency};

#[cfg(test)]
pub(crate) use types::fixtures;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const TOKEN_HINT: &str = "set GITHUB_TOKEN to raise the limit";

/// Largest page the listing endpoint serves. Further pages are never followed.
pub const PER_PAGE: &str = "100";

/// Source of a user's repositories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Lists the public repositories of `username`, most recently updated first.
    async fn list_repos(&self, username: &str) -> Result<Vec<Repository>, ApiError>;
}

pub struct GitHub {
    pub http: HttpClient,
    pub api_url: String,
}

impl GitHub {
    #[tracing::instrument(skip(http, api_url))]
    pub fn new(http: HttpClient, api_url: Option<String>) -> Self {
        let api_url = api_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self { http, api_url }
    }

    /// `{api_url}/users/{username}/repos`, with `username` as one encoded segment.
    fn repos_url(&self, username: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["users", username, "repos"]);
        Ok(url)
    }
}

#[async_trait]
impl RepoSource for GitHub {
    #[tracing::instrument(skip(self))]
    async fn list_repos(&self, username: &str) -> Result<Vec<Repository>, ApiError> {
        let url = self.repos_url(username)?;

        debug!("Fetching repositories for {} from {}...", username, url);

        let repos: Vec<Repository> = self
            .http
            .get_json_with_query(url.as_str(), &[("per_page", PER_PAGE), ("sort", "updated")])
            .await
            .map_err(|e| match e {
                ApiError::RateLimited(message) => {
                    ApiError::RateLimited(format!("{}; {}", message, TOKEN_HINT))
                }
                e => e,
            })?;

        debug!("Fetched {} repositories", repos.len());

        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    fn github(url: &str) -> GitHub {
        GitHub::new(HttpClient::new(Client::new()), Some(url.to_string()))
    }

    #[test]
    fn test_new_defaults_api_url() {
        let gh = GitHub::new(HttpClient::new(Client::new()), None);
        assert_eq!(gh.api_url, "https://api.github.com");

        let gh = GitHub::new(
            HttpClient::new(Client::new()),
            Some("https://ghe.example.com/api/v3/".to_string()),
        );
        assert_eq!(gh.api_url, "https://ghe.example.com/api/v3");
    }

    #[tokio::test]
    async fn test_list_repos() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/users/octocat/repos?per_page=100&sort=updated")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {
                        "id": 1296269,
                        "name": "Hello-World",
                        "description": "My first repository on GitHub!",
                        "html_url": "https://github.com/octocat/Hello-World",
                        "stargazers_count": 2800,
                        "updated_at": "2024-02-01T12:00:00Z",
                        "language": null,
                        "clone_url": "https://github.com/octocat/Hello-World.git",
                        "default_branch": "master"
                    },
                    {
                        "id": 18221276,
                        "name": "git-consortium",
                        "description": null,
                        "html_url": "https://github.com/octocat/git-consortium",
                        "stargazers_count": 25,
                        "updated_at": "2023-11-01T12:00:00Z",
                        "language": "Shell"
                    }
                ]"#,
            )
            .create_async()
            .await;

        let repos = github(&url).list_repos("octocat").await.unwrap();

        mock.assert_async().await;
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "Hello-World");
        assert_eq!(repos[0].stargazers_count, 2800);
        assert_eq!(repos[1].description, None);
        assert_eq!(repos[1].language.as_deref(), Some("Shell"));
    }

    #[tokio::test]
    async fn test_list_repos_empty() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/users/nobody/repos?per_page=100&sort=updated")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let repos = github(&url).list_repos("nobody").await.unwrap();

        mock.assert_async().await;
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn test_list_repos_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/users/ghost-user/repos?per_page=100&sort=updated")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let result = github(&url).list_repos("ghost-user").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_list_repos_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/users/octocat/repos?per_page=100&sort=updated")
            .with_status(403)
            .with_body(r#"{"message": "API rate limit exceeded for 10.0.0.1."}"#)
            .create_async()
            .await;

        let result = github(&url).list_repos("octocat").await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(_)));
        assert!(err.to_string().contains("set GITHUB_TOKEN"));
    }

    #[tokio::test]
    async fn test_list_repos_encodes_username() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/users/octo%3Fx/repos?per_page=100&sort=updated")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let repos = github(&url).list_repos("octo?x").await.unwrap();

        mock.assert_async().await;
        assert!(repos.is_empty());
    }

    #[test]
    fn test_repos_url_keeps_api_path_prefix() {
        let gh = github("https://ghe.example.com/api/v3/");
        assert_eq!(
            gh.repos_url("octocat").unwrap().as_str(),
            "https://ghe.example.com/api/v3/users/octocat/repos"
        );

        let gh = GitHub::new(HttpClient::new(Client::new()), None);
        assert_eq!(
            gh.repos_url("octocat").unwrap().as_str(),
            "https://api.github.com/users/octocat/repos"
        );

        assert!(matches!(
            github("not a url").repos_url("octocat"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_list_repos_invalid_schema() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/users/octocat/repos?per_page=100&sort=updated")
            .with_status(200)
            .with_body(r#"{"message": "not a list"}"#)
            .create_async()
            .await;

        let result = github(&url).list_repos("octocat").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }
}
