//! Deploy action: a single POST to the deploy endpoint per attempt, with the
//! result tracked per repository.
//!
//! The endpoint is an external collaborator with a placeholder contract:
//! `POST {deploy_url}` with `{"repoUrl": "..."}` answering `{"id": "..."}`.

mod intent;
mod link;
mod status;

use async_trait::async_trait;
use futures_util::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::github::Repository;
use crate::http::{ApiError, HttpClient};
use crate::notify::{Notification, Notifier};

pub use intent::{DeploymentIntent, intent_path};
pub use link::{DEFAULT_LINK_DOMAIN, deployment_link, slugify};
pub use status::{Begin, DeploymentStatus, StatusTable, TransitionError};

pub const DEFAULT_DEPLOY_URL: &str = "http://localhost:3000/deploy";
pub const DEFAULT_PREVIEW_HOST: &str = "localhost:3001";

pub const FAILURE_MESSAGE: &str = "Failed to deploy the repository";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DeployRequest<'a> {
    repo_url: &'a str,
}

/// Body returned by the deploy endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DeployResponse {
    pub id: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(&self, repo_url: &str) -> Result<DeployResponse, ApiError>;

    /// Where a deployment with the given id is served.
    fn preview_url(&self, deployment_id: &str) -> String;
}

pub struct HttpDeployer {
    http: HttpClient,
    url: String,
    preview_host: String,
}

impl HttpDeployer {
    pub fn new(http: HttpClient, url: Option<String>, preview_host: Option<String>) -> Self {
        Self {
            http,
            url: url.unwrap_or_else(|| DEFAULT_DEPLOY_URL.to_string()),
            preview_host: preview_host.unwrap_or_else(|| DEFAULT_PREVIEW_HOST.to_string()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Deployer for HttpDeployer {
    #[tracing::instrument(skip(self))]
    async fn deploy(&self, repo_url: &str) -> Result<DeployResponse, ApiError> {
        debug!("Requesting deployment of {} from {}", repo_url, self.url);
        self.http
            .post_json(&self.url, &DeployRequest { repo_url })
            .await
    }

    fn preview_url(&self, deployment_id: &str) -> String {
        format!("http://{}.{}", deployment_id, self.preview_host)
    }
}

/// What to deploy.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployTarget {
    pub repo_id: u64,
    pub repo_name: String,
    pub repo_url: String,
}

impl From<&Repository> for DeployTarget {
    fn from(repo: &Repository) -> Self {
        DeployTarget {
            repo_id: repo.id,
            repo_name: repo.name.clone(),
            repo_url: repo.html_url.clone(),
        }
    }
}

impl From<DeploymentIntent> for DeployTarget {
    fn from(intent: DeploymentIntent) -> Self {
        DeployTarget {
            repo_id: intent.repo_id,
            repo_name: intent.repo_name,
            repo_url: intent.repo_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeployOutcome {
    /// A request for this repository was already in flight.
    Skipped,
    Deployed(Deployment),
    Failed(String),
}

/// Deploys one repository, recording the status transitions in `statuses`.
///
/// Fails only when the repository was already deployed successfully; request
/// failures are reported through the outcome and `notifier`.
#[tracing::instrument(skip(deployer, statuses, notifier))]
pub async fn deploy<D, N>(
    deployer: &D,
    statuses: &mut StatusTable,
    notifier: &N,
    target: &DeployTarget,
) -> Result<DeployOutcome, TransitionError>
where
    D: Deployer + ?Sized,
    N: Notifier + ?Sized,
{
    if statuses.begin(target.repo_id)? == Begin::AlreadyPending {
        debug!("Deployment of {} already in flight", target.repo_name);
        return Ok(DeployOutcome::Skipped);
    }

    info!("Deploying {} ({})", target.repo_name, target.repo_url);
    let result = deployer.deploy(&target.repo_url).await;
    settle(deployer, statuses, notifier, target, result)
}

/// Deploys several repositories concurrently. Each result is applied to its
/// own repository as the requests settle; order between them is unspecified.
#[tracing::instrument(skip_all, fields(count = targets.len()))]
pub async fn deploy_many<D, N>(
    deployer: &D,
    statuses: &mut StatusTable,
    notifier: &N,
    targets: &[DeployTarget],
) -> Vec<(u64, Result<DeployOutcome, TransitionError>)>
where
    D: Deployer + ?Sized,
    N: Notifier + ?Sized,
{
    let mut results = Vec::with_capacity(targets.len());
    let mut started = Vec::new();

    for target in targets {
        match statuses.begin(target.repo_id) {
            Ok(Begin::Started) => started.push(target),
            Ok(Begin::AlreadyPending) => results.push((target.repo_id, Ok(DeployOutcome::Skipped))),
            Err(e) => results.push((target.repo_id, Err(e))),
        }
    }

    let responses = join_all(started.iter().map(|t| deployer.deploy(&t.repo_url))).await;

    for (target, response) in started.into_iter().zip(responses) {
        let outcome = settle(deployer, statuses, notifier, target, response);
        results.push((target.repo_id, outcome));
    }

    results
}

fn settle<D, N>(
    deployer: &D,
    statuses: &mut StatusTable,
    notifier: &N,
    target: &DeployTarget,
    result: Result<DeployResponse, ApiError>,
) -> Result<DeployOutcome, TransitionError>
where
    D: Deployer + ?Sized,
    N: Notifier + ?Sized,
{
    match result {
        Ok(response) => {
            statuses.succeed(target.repo_id)?;
            let deployment = Deployment {
                url: deployer.preview_url(&response.id),
                id: response.id,
            };
            info!("Deployed {} as {}", target.repo_name, deployment.url);
            notifier.notify(&Notification::success(
                "Deployment Successful",
                format!("{} is live at {}", target.repo_name, deployment.url),
            ));
            Ok(DeployOutcome::Deployed(deployment))
        }
        Err(e) => {
            statuses.fail(target.repo_id)?;
            warn!("Deployment of {} failed: {}", target.repo_name, e);
            notifier.notify(&Notification::error(
                "Deployment Failed",
                "There was an error deploying your repository.",
            ));
            Ok(DeployOutcome::Failed(FAILURE_MESSAGE.to_string()))
        }
    }
}
