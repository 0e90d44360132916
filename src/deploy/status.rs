//! Per-repository deployment status tracking.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentStatus {
    #[default]
    None,
    Pending,
    Success,
    Error,
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentStatus::None => write!(f, "none"),
            DeploymentStatus::Pending => write!(f, "pending"),
            DeploymentStatus::Success => write!(f, "success"),
            DeploymentStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Repository {0} is already deployed")]
    AlreadyDeployed(u64),

    #[error("Repository {id} has no deployment in flight (status: {status})")]
    NotPending { id: u64, status: DeploymentStatus },
}

/// Result of asking to start a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// Status moved to `Pending`; the caller must issue the request.
    Started,
    /// A request is already in flight; nothing to do.
    AlreadyPending,
}

/// Deployment status keyed by repository id.
///
/// Ids never seen are `None`. The only legal transitions are
/// `None|Error -> Pending` and `Pending -> Success|Error`; `Success` is final.
#[derive(Debug, Default, Clone)]
pub struct StatusTable {
    statuses: HashMap<u64, DeploymentStatus>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u64) -> DeploymentStatus {
        self.statuses.get(&id).copied().unwrap_or_default()
    }

    pub fn begin(&mut self, id: u64) -> Result<Begin, TransitionError> {
        match self.get(id) {
            DeploymentStatus::None | DeploymentStatus::Error => {
                self.statuses.insert(id, DeploymentStatus::Pending);
                Ok(Begin::Started)
            }
            DeploymentStatus::Pending => Ok(Begin::AlreadyPending),
            DeploymentStatus::Success => Err(TransitionError::AlreadyDeployed(id)),
        }
    }

    pub fn succeed(&mut self, id: u64) -> Result<(), TransitionError> {
        self.settle(id, DeploymentStatus::Success)
    }

    pub fn fail(&mut self, id: u64) -> Result<(), TransitionError> {
        self.settle(id, DeploymentStatus::Error)
    }

    fn settle(&mut self, id: u64, to: DeploymentStatus) -> Result<(), TransitionError> {
        match self.get(id) {
            DeploymentStatus::Pending => {
                self.statuses.insert(id, to);
                Ok(())
            }
            status => Err(TransitionError::NotPending { id, status }),
        }
    }

    /// Deploy is offered until the first success.
    pub fn can_deploy(&self, id: u64) -> bool {
        matches!(
            self.get(id),
            DeploymentStatus::None | DeploymentStatus::Error
        )
    }

    /// GetLink is offered once deployed.
    pub fn can_get_link(&self, id: u64) -> bool {
        self.get(id) == DeploymentStatus::Success
    }
}
