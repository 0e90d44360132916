use anyhow::{Result, bail};
use log::{debug, warn};
use std::path::Path;

use crate::{
    chat::CompletionApi,
    config::{Config, Settings},
    deploy::{
        DeployOutcome, DeployTarget, Deployer, Deployment, DeploymentIntent, StatusTable,
        deploy as deploy_one, deploy_many, deployment_link, intent_path,
    },
    github::{RepoSource, Repository},
    notify::{ConsoleNotifier, Notifier},
    repos::RepoListView,
    runtime::Runtime,
};

use super::load_view;

/// Deploy one or more repositories by id or name
#[tracing::instrument(skip(runtime, settings))]
pub async fn deploy<R: Runtime>(runtime: R, settings: Settings, keys: &[String]) -> Result<()> {
    let config = Config::new(runtime, settings)?;
    run_deploy(&config, &ConsoleNotifier, keys).await
}

#[tracing::instrument(skip(config, notifier))]
pub async fn run_deploy<R, S, D, C, N>(
    config: &Config<R, S, D, C>,
    notifier: &N,
    keys: &[String],
) -> Result<()>
where
    R: Runtime,
    S: RepoSource,
    D: Deployer,
    C: CompletionApi,
    N: Notifier + ?Sized,
{
    let mut view = load_view(config).await?;
    let repos = resolve(&view, keys)?;

    match repos.as_slice() {
        [] => bail!("No repository given"),
        [repo] => {
            let path = intent_path(&config.runtime, config.settings.state_dir.as_deref());
            DeploymentIntent::from(repo).save(&config.runtime, &path)?;
            deploy_from_intent(
                &config.runtime,
                &config.deployer,
                view.statuses_mut(),
                notifier,
                &path,
                &config.settings.link_domain,
            )
            .await
        }
        _ => {
            let targets: Vec<DeployTarget> = repos.iter().map(DeployTarget::from).collect();
            let results =
                deploy_many(&config.deployer, view.statuses_mut(), notifier, &targets).await;

            let mut failures = 0;
            for (id, result) in results {
                let name = targets
                    .iter()
                    .find(|t| t.repo_id == id)
                    .map_or("?", |t| t.repo_name.as_str());
                match result {
                    Ok(DeployOutcome::Deployed(deployment)) => println!(
                        "{}: {}\n    Public link: {}",
                        name,
                        deployment.url,
                        deployment_link(name, &config.settings.link_domain)
                    ),
                    Ok(DeployOutcome::Skipped) => println!("{}: already deploying", name),
                    Ok(DeployOutcome::Failed(message)) => {
                        failures += 1;
                        println!("{}: {}", name, message);
                    }
                    Err(e) => {
                        failures += 1;
                        println!("{}: {}", name, e);
                    }
                }
            }

            if failures > 0 {
                bail!("{} of {} deployments failed", failures, targets.len());
            }
            Ok(())
        }
    }
}

/// Deploy the repository recorded by the last `deploy` and report the result
#[tracing::instrument(skip(runtime, settings))]
pub async fn status<R: Runtime>(runtime: R, settings: Settings) -> Result<()> {
    let config = Config::new(runtime, settings)?;
    run_status(&config, &ConsoleNotifier).await
}

#[tracing::instrument(skip(config, notifier))]
pub async fn run_status<R, S, D, C, N>(config: &Config<R, S, D, C>, notifier: &N) -> Result<()>
where
    R: Runtime,
    S: RepoSource,
    D: Deployer,
    C: CompletionApi,
    N: Notifier + ?Sized,
{
    let path = intent_path(&config.runtime, config.settings.state_dir.as_deref());
    let mut statuses = StatusTable::new();
    deploy_from_intent(
        &config.runtime,
        &config.deployer,
        &mut statuses,
        notifier,
        &path,
        &config.settings.link_domain,
    )
    .await
}

/// Reads the intent record back and runs it through the deploy state machine.
async fn deploy_from_intent<R, D, N>(
    runtime: &R,
    deployer: &D,
    statuses: &mut StatusTable,
    notifier: &N,
    path: &Path,
    link_domain: &str,
) -> Result<()>
where
    R: Runtime,
    D: Deployer,
    N: Notifier + ?Sized,
{
    let Some(intent) = DeploymentIntent::load(runtime, path)? else {
        println!("No deployment data found.");
        return Ok(());
    };

    println!("Deploying {} from {}", intent.repo_name, intent.repo_url);
    let target = DeployTarget::from(intent);

    match deploy_one(deployer, statuses, notifier, &target).await? {
        DeployOutcome::Deployed(deployment) => {
            print!("{}", success_report(&target.repo_name, &deployment, link_domain));
        }
        DeployOutcome::Failed(message) => bail!(message),
        DeployOutcome::Skipped => debug!("Deployment of {} already in flight", target.repo_name),
    }
    Ok(())
}

fn success_report(repo_name: &str, deployment: &Deployment, link_domain: &str) -> String {
    format!(
        "Deployment Successful! Your site is live at: {}\nDeployment ID: {}\nPublic link: {}\n",
        deployment.url,
        deployment.id,
        deployment_link(repo_name, link_domain)
    )
}

/// Looks up each key in the loaded list, dropping repeats.
fn resolve(view: &RepoListView, keys: &[String]) -> Result<Vec<Repository>> {
    let mut repos: Vec<Repository> = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(repo) = view.find(key.trim()) else {
            bail!("Repository not found: {}", key);
        };
        if repos.iter().any(|r| r.id == repo.id) {
            warn!("Ignoring repeated repository {}", key);
            continue;
        }
        repos.push(repo.clone());
    }
    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{DeployResponse, MockDeployer};
    use crate::github::MockRepoSource;
    use crate::github::fixtures::repo;
    use crate::http::ApiError;
    use crate::notify::{Level, MockNotifier};
    use crate::runtime::MockRuntime;
    use crate::session::Session;
    use crate::test_utils::{configure_session, test_config, test_state_dir};
    use mockall::predicate::*;

    fn source() -> MockRepoSource {
        let mut source = MockRepoSource::new();
        source.expect_list_repos().returning(|_| {
            Ok(vec![
                repo(1, "Hello-World", None),
                repo(2, "Spoon-Knife", None),
                repo(3, "demo-app", None),
            ])
        });
        source
    }

    fn intent_json(id: u64, name: &str) -> String {
        serde_json::to_string(&DeploymentIntent {
            repo_id: id,
            repo_name: name.to_string(),
            repo_url: format!("https://github.com/user/{}", name),
        })
        .unwrap()
    }

    /// Expects the intent for `name` to be written and read back.
    fn configure_intent(runtime: &mut MockRuntime, id: u64, name: &str) {
        let path = test_state_dir().join("deployment.json");
        let json = intent_json(id, name);
        let expected = json.clone();

        runtime
            .expect_create_dir_all()
            .with(eq(test_state_dir()))
            .returning(|_| Ok(()));
        runtime
            .expect_write()
            .withf(move |p, contents| {
                p == test_state_dir().join("deployment.json") && contents == expected.as_bytes()
            })
            .times(1)
            .returning(|_, _| Ok(()));
        runtime
            .expect_exists()
            .with(eq(path.clone()))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(path))
            .returning(move |_| Ok(json.clone()));
    }

    fn notifier_expecting(level: Level, times: usize) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |n| n.level == level)
            .times(times)
            .return_const(());
        notifier
    }

    #[tokio::test]
    async fn test_run_deploy_single_by_name() {
        let mut runtime = MockRuntime::new();
        configure_session(&mut runtime, Some(Session::with_github("octocat", None)));
        configure_intent(&mut runtime, 3, "demo-app");

        let mut deployer = MockDeployer::new();
        deployer
            .expect_deploy()
            .with(eq("https://github.com/user/demo-app"))
            .times(1)
            .returning(|_| Ok(DeployResponse { id: "abc".to_string() }));
        deployer
            .expect_preview_url()
            .with(eq("abc"))
            .returning(|id| format!("http://{}.localhost:3001", id));

        let mut config = test_config(runtime, source());
        config.deployer = deployer;

        run_deploy(&config, &notifier_expecting(Level::Success, 1), &["demo-app".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_deploy_single_failure() {
        let mut runtime = MockRuntime::new();
        configure_session(&mut runtime, Some(Session::with_github("octocat", None)));
        configure_intent(&mut runtime, 1, "Hello-World");

        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().times(1).returning(|_| {
            Err(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            })
        });

        let mut config = test_config(runtime, source());
        config.deployer = deployer;

        let err = run_deploy(&config, &notifier_expecting(Level::Error, 1), &["1".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to deploy the repository");
    }

    #[tokio::test]
    async fn test_run_deploy_unknown_repository() {
        let mut runtime = MockRuntime::new();
        configure_session(&mut runtime, Some(Session::with_github("octocat", None)));
        runtime.expect_write().never();

        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().never();

        let mut config = test_config(runtime, source());
        config.deployer = deployer;

        let err = run_deploy(&config, &MockNotifier::new(), &["nope".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Repository not found: nope"));
    }

    #[tokio::test]
    async fn test_run_deploy_many_reports_partial_failure() {
        let mut runtime = MockRuntime::new();
        configure_session(&mut runtime, Some(Session::with_github("octocat", None)));
        runtime.expect_write().never();

        let mut deployer = MockDeployer::new();
        deployer
            .expect_deploy()
            .with(eq("https://github.com/user/Hello-World"))
            .times(1)
            .returning(|_| Ok(DeployResponse { id: "one".to_string() }));
        deployer
            .expect_deploy()
            .with(eq("https://github.com/user/Spoon-Knife"))
            .times(1)
            .returning(|_| Err(ApiError::NotFound("missing".to_string())));
        deployer
            .expect_preview_url()
            .returning(|id| format!("http://{}.localhost:3001", id));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.level == Level::Success)
            .times(1)
            .return_const(());
        notifier
            .expect_notify()
            .withf(|n| n.level == Level::Error)
            .times(1)
            .return_const(());

        let mut config = test_config(runtime, source());
        config.deployer = deployer;

        let keys = vec!["Hello-World".to_string(), "2".to_string(), "hello-world".to_string()];
        let err = run_deploy(&config, &notifier, &keys).await.unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 deployments failed");
    }

    #[tokio::test]
    async fn test_run_status_without_intent() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(test_state_dir().join("deployment.json")))
            .returning(|_| false);

        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().never();

        let mut config = test_config(runtime, MockRepoSource::new());
        config.deployer = deployer;

        run_status(&config, &MockNotifier::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_status_deploys_stored_intent() {
        let path = test_state_dir().join("deployment.json");
        let json = intent_json(42, "demo-app");

        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(path.clone()))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(path))
            .returning(move |_| Ok(json.clone()));

        let mut deployer = MockDeployer::new();
        deployer
            .expect_deploy()
            .with(eq("https://github.com/user/demo-app"))
            .times(1)
            .returning(|_| Ok(DeployResponse { id: "xyz".to_string() }));
        deployer
            .expect_preview_url()
            .returning(|id| format!("http://{}.localhost:3001", id));

        let mut config = test_config(runtime, MockRepoSource::new());
        config.deployer = deployer;

        run_status(&config, &notifier_expecting(Level::Success, 1))
            .await
            .unwrap();
    }

    #[test]
    fn test_success_report_includes_public_link() {
        let deployment = Deployment {
            id: "abc".to_string(),
            url: "http://abc.localhost:3001".to_string(),
        };

        let report = success_report("Hello-World", &deployment, "hostit.app");
        assert_eq!(
            report,
            "Deployment Successful! Your site is live at: http://abc.localhost:3001\n\
             Deployment ID: abc\n\
             Public link: https://hello-world.hostit.app\n"
        );

        let report = success_report("Hello-World", &deployment, "preview.example.com");
        assert!(report.ends_with("Public link: https://hello-world.preview.example.com\n"));
    }

    #[test]
    fn test_resolve_by_id_and_name() {
        let mut view = RepoListView::default();
        view.finish_load(Ok(vec![repo(7, "Alpha", None), repo(8, "beta", None)]));

        let repos = resolve(&view, &["8".to_string(), "alpha".to_string()]).unwrap();
        let ids: Vec<u64> = repos.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![8, 7]);
    }
}
