use anyhow::{Result, bail};
use log::debug;

use crate::{
    chat::{ChatAssistant, CompletionApi, GREETING, render::render},
    config::{Config, Settings},
    deploy::Deployer,
    github::RepoSource,
    notify::{ConsoleNotifier, Notifier},
    runtime::Runtime,
};

const PROMPT: &str = "you> ";

/// Ask the deployment assistant a question, or start a conversation
#[tracing::instrument(skip(runtime, settings))]
pub async fn chat<R: Runtime>(runtime: R, settings: Settings, message: Option<String>) -> Result<()> {
    let config = Config::new(runtime, settings)?;
    run_chat(&config, &ConsoleNotifier, message.as_deref()).await?;
    Ok(())
}

/// Runs one exchange, or a session reading lines until EOF or `/exit`.
/// Returns the conversation as it stood at the end.
#[tracing::instrument(skip(config, notifier))]
pub async fn run_chat<R, S, D, C, N>(
    config: &Config<R, S, D, C>,
    notifier: &N,
    message: Option<&str>,
) -> Result<ChatAssistant>
where
    R: Runtime,
    S: RepoSource,
    D: Deployer,
    C: CompletionApi,
    N: Notifier + ?Sized,
{
    let mut assistant = ChatAssistant::new();

    if let Some(text) = message {
        let Some(reply) = assistant.send_message(&config.chat, notifier, text).await else {
            bail!("Message must not be empty");
        };
        println!("{}", render(&reply.content));
        return Ok(assistant);
    }

    println!("{}", render(GREETING));
    println!("(/reset starts over, /exit or Ctrl-D quits)\n");

    while let Some(line) = config.runtime.read_line(PROMPT)? {
        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/reset" => {
                assistant.reset();
                println!("{}\n", render(GREETING));
            }
            text => {
                if let Some(reply) = assistant.send_message(&config.chat, notifier, text).await {
                    println!("{}\n", render(&reply.content));
                }
            }
        }
    }

    debug!("Chat ended after {} messages", assistant.messages().len());
    Ok(assistant)
}
