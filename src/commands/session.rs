use anyhow::{Result, bail};
use log::info;

use crate::{
    config::Settings,
    runtime::Runtime,
    session::{Session, session_path},
};

use super::load_session;

/// Record a signed-in session with a linked GitHub account
#[tracing::instrument(skip(runtime, settings))]
pub fn login<R: Runtime>(
    runtime: R,
    settings: &Settings,
    github_username: &str,
    name: Option<String>,
) -> Result<()> {
    let username = github_username.trim();
    if !is_github_username(username) {
        bail!("Invalid GitHub username: '{}'", github_username);
    }

    let path = session_path(&runtime, settings.config_dir.as_deref())?;
    let session = Session::with_github(username, name.filter(|n| !n.trim().is_empty()));
    session.save(&runtime, &path)?;

    info!("Session saved to {:?}", path);
    println!("Signed in as {} (GitHub: {})", display_name(&session), username);
    Ok(())
}

#[tracing::instrument(skip(runtime, settings))]
pub fn logout<R: Runtime>(runtime: R, settings: &Settings) -> Result<()> {
    let path = session_path(&runtime, settings.config_dir.as_deref())?;
    if Session::clear(&runtime, &path)? {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

#[tracing::instrument(skip(runtime, settings))]
pub fn whoami<R: Runtime>(runtime: R, settings: &Settings) -> Result<()> {
    match load_session(&runtime, settings)? {
        Some(session) if session.signed_in => {
            println!("{}", display_name(&session));
            match session.github_username() {
                Some(username) => println!("GitHub: {}", username),
                None => println!("GitHub: not linked"),
            }
        }
        _ => println!("Not signed in."),
    }
    Ok(())
}

/// At most 39 ASCII alphanumerics or hyphens, not starting or ending with a hyphen.
fn is_github_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 39
        && !username.starts_with('-')
        && !username.ends_with('-')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn display_name(session: &Session) -> &str {
    session
        .profile
        .name
        .as_deref()
        .unwrap_or(&session.profile.id)
}
