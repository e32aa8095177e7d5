//! Console front end for binfinder: type commands, get waste disposal advice.

mod collaborators;
mod console;
mod settings;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use binfinder_core::{
    Classifier, ConversationRouter, FacilityService, ProviderRegistry, ResponseLocalizer, UserId,
};
use reqwest::Client;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use binfinder_provider_bulky as bulky;
use binfinder_provider_smartbin as smartbin;
use binfinder_provider_yard as yard;

use crate::collaborators::{FileNameClassifier, HttpClassifier, LlmClient};
use crate::console::{Command, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = settings::load()?;

    // HTTP + service setup
    let client = Client::builder()
        .user_agent("binfinder/0.1")
        .timeout(settings.router.provider_timeout())
        .build()?;

    let plugins = vec![
        smartbin::plugin(client.clone(), settings.smart_bin.clone()),
        bulky::plugin(client.clone(), settings.bulky_waste.clone()),
        yard::plugin(client.clone(), settings.collection_yard.clone()),
    ];
    let registry = Arc::new(ProviderRegistry::new(plugins));
    for meta in registry.providers_iter() {
        info!(kind = %meta.kind, name = %meta.name, "provider registered");
    }
    let service = Arc::new(FacilityService::new(
        registry,
        settings.router.provider_timeout(),
    ));

    let classifier: Arc<dyn Classifier> = match &settings.classifier_url {
        Some(url) => Arc::new(HttpClassifier::new(client.clone(), url.clone())),
        None => Arc::new(FileNameClassifier),
    };

    let llm = settings
        .llm
        .clone()
        .map(|llm| Arc::new(LlmClient::new(client.clone(), llm)));
    let localizer = match &llm {
        Some(llm) => ResponseLocalizer::new(llm.clone()),
        None => ResponseLocalizer::passthrough(),
    };

    let sweep_every = settings.router.session_idle().max(Duration::from_secs(1));
    let mut router = ConversationRouter::new(service, classifier, localizer, settings.router);
    if let Some(llm) = llm {
        router = router.with_chat(llm);
    }
    let router = Arc::new(router);

    let sweeper = Arc::clone(&router);
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(sweep_every);
        loop {
            ticks.tick().await;
            let evicted = sweeper.evict_idle_sessions();
            debug!(evicted, "session sweep finished");
        }
    });

    run(&router, settings.language).await
}

async fn run(router: &ConversationRouter, mut language: String) -> Result<()> {
    let mut user = UserId::from("console");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    write(&mut stdout, &format!("{USAGE}\n\n")).await?;

    while let Some(line) = lines.next_line().await? {
        let command = match console::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                write(&mut stdout, &format!("{err}\n")).await?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Empty => continue,
            Command::Language(code) => {
                write(&mut stdout, &format!("Replies will use '{code}'.\n")).await?;
                language = code;
            }
            Command::User(id) => {
                user = UserId::from(id.as_str());
                write(&mut stdout, &format!("Talking as {user}.\n")).await?;
            }
            command => {
                let Some(event) = command.into_event(&user, &language) else {
                    continue;
                };
                let reply = router.handle(event).await;
                write(&mut stdout, &console::render(&reply)).await?;
            }
        }
    }

    Ok(())
}

async fn write(stdout: &mut Stdout, text: &str) -> Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
