use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository as returned by `GET /users/{username}/repos`.
///
/// Only the fields the dashboard uses are kept; unknown fields are ignored and
/// a missing required field fails deserialization.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub stargazers_count: u64,
    pub updated_at: DateTime<Utc>,
    pub language: Option<String>,
    pub clone_url: Option<String>,
    pub default_branch: Option<String>,
}

impl Repository {
    /// Case-insensitive substring match on name or description.
    /// `needle` must already be lower-cased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

/// Sorts newest first, keeping the server order for equal timestamps.
pub fn sort_by_recency(repos: &mut [Repository]) {
    repos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Repository;

    pub fn repo(id: u64, name: &str, description: Option<&str>) -> Repository {
        Repository {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            html_url: format!("https://github.com/user/{}", name),
            stargazers_count: 0,
            updated_at: "2023-08-15T10:30:00Z".parse().unwrap(),
            language: None,
            clone_url: Some(format!("https://github.com/user/{}.git", name)),
            default_branch: Some("main".to_string()),
        }
    }
}
