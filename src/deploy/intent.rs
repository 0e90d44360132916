use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::github::Repository;
use crate::runtime::Runtime;

/// The repository a user asked to deploy, handed from the repository list to
/// the status flow through a session-scoped file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentIntent {
    pub repo_id: u64,
    pub repo_name: String,
    pub repo_url: String,
}

impl From<&Repository> for DeploymentIntent {
    fn from(repo: &Repository) -> Self {
        DeploymentIntent {
            repo_id: repo.id,
            repo_name: repo.name.clone(),
            repo_url: repo.html_url.clone(),
        }
    }
}

impl DeploymentIntent {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Option<Self>> {
        if !runtime.exists(path) {
            debug!("No deployment intent at {:?}", path);
            return Ok(None);
        }
        let content = runtime.read_to_string(path)?;
        let intent = serde_json::from_str(&content)
            .with_context(|| format!("Invalid deployment data in {}", path.display()))?;
        Ok(Some(intent))
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        runtime.write(path, json.as_bytes())?;
        debug!("Saved deployment intent for {} to {:?}", self.repo_name, path);
        Ok(())
    }
}

/// `{temp_dir}/hostit/deployment.json`, or `{override}/deployment.json`.
pub fn intent_path<R: Runtime>(runtime: &R, state_dir: Option<&Path>) -> PathBuf {
    let dir = match state_dir {
        Some(dir) => dir.to_path_buf(),
        None => runtime.temp_dir().join("hostit"),
    };
    dir.join("deployment.json")
}
