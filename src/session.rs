//! Signed-in identity as seen by the dashboard.
//!
//! The identity provider itself lives outside this crate. Commands only read
//! the session record it leaves behind; `login` and `logout` manage that
//! record for the CLI.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const GITHUB_PROVIDER: &str = "github";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A third-party identity linked to the platform user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExternalAccount {
    pub provider: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub signed_in: bool,
    pub profile: Profile,
    #[serde(default)]
    pub external_accounts: Vec<ExternalAccount>,
}

impl Session {
    /// A signed-in session with a single linked GitHub account.
    pub fn with_github(username: &str, name: Option<String>) -> Self {
        Session {
            signed_in: true,
            profile: Profile {
                id: format!("{}:{}", GITHUB_PROVIDER, username),
                name,
                email: None,
            },
            external_accounts: vec![ExternalAccount {
                provider: GITHUB_PROVIDER.to_string(),
                username: username.to_string(),
            }],
        }
    }

    /// Username of the first linked GitHub account, if signed in.
    pub fn github_username(&self) -> Option<&str> {
        if !self.signed_in {
            return None;
        }
        self.external_accounts
            .iter()
            .find(|a| a.provider.eq_ignore_ascii_case(GITHUB_PROVIDER))
            .map(|a| a.username.as_str())
            .filter(|u| !u.trim().is_empty())
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Option<Self>> {
        if !runtime.exists(path) {
            debug!("No session at {:?}", path);
            return Ok(None);
        }
        let content = runtime.read_to_string(path)?;
        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("Invalid session file {}", path.display()))?;
        Ok(Some(session))
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        runtime.write(path, json.as_bytes())?;
        debug!("Saved session to {:?}", path);
        Ok(())
    }

    /// Removes the session record. Returns whether one existed.
    #[tracing::instrument(skip(runtime))]
    pub fn clear<R: Runtime>(runtime: &R, path: &Path) -> Result<bool> {
        if !runtime.exists(path) {
            return Ok(false);
        }
        runtime.remove_file(path)?;
        Ok(true)
    }
}

/// `{config_dir}/hostit/session.json`, or `{override}/session.json`.
pub fn session_path<R: Runtime>(runtime: &R, config_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => runtime
            .config_dir()
            .context("Could not find configuration directory")?
            .join("hostit"),
    };
    Ok(dir.join("session.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    #[test]
    fn test_github_username() {
        let session = Session::with_github("octocat", None);
        assert_eq!(session.github_username(), Some("octocat"));
    }

    #[test]
    fn test_github_username_requires_signed_in() {
        let mut session = Session::with_github("octocat", None);
        session.signed_in = false;
        assert_eq!(session.github_username(), None);
    }

    #[test]
    fn test_github_username_absent_without_linked_account() {
        let session = Session {
            signed_in: true,
            profile: Profile::default(),
            external_accounts: vec![ExternalAccount {
                provider: "gitlab".to_string(),
                username: "someone".to_string(),
            }],
        };
        assert_eq!(session.github_username(), None);
    }

    #[test]
    fn test_github_username_picks_first_github_account() {
        let session = Session {
            signed_in: true,
            profile: Profile::default(),
            external_accounts: vec![
                ExternalAccount {
                    provider: "gitlab".to_string(),
                    username: "lab".to_string(),
                },
                ExternalAccount {
                    provider: "GitHub".to_string(),
                    username: "hub".to_string(),
                },
                ExternalAccount {
                    provider: "github".to_string(),
                    username: "second".to_string(),
                },
            ],
        };
        assert_eq!(session.github_username(), Some("hub"));
    }

    #[test]
    fn test_load_missing_session() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/home/user/.config/hostit/session.json");
        runtime
            .expect_exists()
            .with(eq(path.clone()))
            .returning(|_| false);

        assert_eq!(Session::load(&runtime, &path).unwrap(), None);
    }

    #[test]
    fn test_load_session() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/home/user/.config/hostit/session.json");
        let json = serde_json::to_string(&Session::with_github("octocat", None)).unwrap();

        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(move |_| Ok(json.clone()));

        let session = Session::load(&runtime, &path).unwrap().unwrap();
        assert_eq!(session.github_username(), Some("octocat"));
    }

    #[test]
    fn test_load_corrupt_session() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/tmp/session.json");

        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{not json".to_string()));

        let err = Session::load(&runtime, &path).unwrap_err();
        assert!(err.to_string().contains("Invalid session file"));
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/home/user/.config/hostit/session.json");

        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/home/user/.config/hostit")))
            .times(1)
            .returning(|_| Ok(()));
        runtime
            .expect_write()
            .withf(|p, contents| {
                p == Path::new("/home/user/.config/hostit/session.json")
                    && String::from_utf8_lossy(contents).contains("\"octocat\"")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        Session::with_github("octocat", Some("The Octocat".to_string()))
            .save(&runtime, &path)
            .unwrap();
    }

    #[test]
    fn test_clear() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/tmp/session.json");

        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_remove_file()
            .times(1)
            .returning(|_| Ok(()));

        assert!(Session::clear(&runtime, &path).unwrap());
    }

    #[test]
    fn test_session_path() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/user/.config")));

        assert_eq!(
            session_path(&runtime, None).unwrap(),
            PathBuf::from("/home/user/.config/hostit/session.json")
        );
        assert_eq!(
            session_path(&runtime, Some(Path::new("/custom"))).unwrap(),
            PathBuf::from("/custom/session.json")
        );
    }

    #[test]
    fn test_session_path_without_config_dir() {
        let mut runtime = MockRuntime::new();
        runtime.expect_config_dir().returning(|| None);

        assert!(session_path(&runtime, None).is_err());
    }
}
