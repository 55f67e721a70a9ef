use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use aula_client::{BackendClient, ContentKind, GeneratedContent, HttpBackendClient};
use aula_core::{
    export, render, AulaConfig, AulaError, ChatSession, ContentUpdate, ExportFormat, FileStore,
    FormFields, GenerationRequestBuilder, HostContent, OpenOutcome, PointsNotifier, SessionConfig,
    StateStore,
};

#[derive(Parser, Debug)]
#[clap(name = "aula", version = "0.1.0", about = "Educator content-generation client")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, help = "Configuration file path (default: ~/.config/aula/aula.yaml)")]
    config: Option<PathBuf>,

    #[clap(long, short, help = "Log filter; overrides logging.level from the config")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new artifact from form fields
    Generate {
        #[clap(long, value_enum)]
        kind: KindArg,

        #[clap(long, help = "What the content should be about")]
        topic: String,

        #[clap(long, default_value = "")]
        grade: String,

        #[clap(long, default_value = "")]
        subject: String,

        #[clap(long, help = "Display name for the artifact")]
        name: Option<String>,

        #[clap(long, help = "Share the result publicly")]
        public: bool,
    },
    /// Open the improvement chat for the last generated artifact
    Chat {
        #[clap(long, value_enum)]
        kind: KindArg,
    },
    /// Export the last generated artifact as PDF or Word
    Export {
        #[clap(long, value_enum)]
        kind: KindArg,

        #[clap(long, value_enum, default_value = "pdf")]
        format: FormatArg,

        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Show the subscription status for the configured account
    Status {
        #[clap(long, help = "Poll until the subscription becomes active")]
        wait: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    LessonPlan,
    Quiz,
    Piar,
    Training,
    ParentEmail,
    ClearInstructions,
    Steam,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> ContentKind {
        match kind {
            KindArg::LessonPlan => ContentKind::LessonPlan,
            KindArg::Quiz => ContentKind::Quiz,
            KindArg::Piar => ContentKind::Piar,
            KindArg::Training => ContentKind::Training,
            KindArg::ParentEmail => ContentKind::ParentEmail,
            KindArg::ClearInstructions => ContentKind::ClearInstructions,
            KindArg::Steam => ContentKind::Steam,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Word,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> ExportFormat {
        match format {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Word => ExportFormat::Word,
        }
    }
}

/// Artifact saved per kind so chat and export can pick it up later.
#[derive(Debug, Serialize, Deserialize)]
struct StoredContent {
    name: String,
    content: GeneratedContent,
}

fn content_key(kind: ContentKind) -> String {
    format!("content:{kind}")
}

fn chat_key(kind: ContentKind) -> String {
    format!("chat:{kind}")
}

fn welcome_text(kind: ContentKind) -> String {
    format!(
        "Hi! I'm your teaching assistant. Tell me how you'd like to improve this {kind} \
         and I'll revise it."
    )
}

fn paywall(message: &str) {
    println!("Access denied: {message}");
    println!("Your current plan does not cover this action. See the pricing page to upgrade.");
}

fn help_text() -> String {
    let text = r#"
COMMANDS:
- /clear - Clears this conversation and its saved state.
- /quit (/q) - Leaves the chat. The conversation is saved and restored next time.
- /help (/h) - Provides this help menu.

Anything else is sent to the assistant as an improvement request; accepted
revisions replace the generated content.
        "#;
    text.trim().to_string()
}

/// Flag wins, then the config file's `logging.level`.
fn resolve_log_level(flag: Option<&str>, config: &AulaConfig) -> String {
    match flag {
        Some(level) => level.to_string(),
        None => config.logging.level.clone(),
    }
}

async fn load_config(cli: &Cli) -> Result<AulaConfig> {
    if let Some(path) = &cli.config {
        return Ok(AulaConfig::load(path).await?);
    }
    let default_path = AulaConfig::default_path()?;
    if default_path.exists() {
        return Ok(AulaConfig::load(&default_path).await?);
    }
    match AulaConfig::from_env() {
        Ok(config) => Ok(config),
        Err(_) => bail!(
            "no configuration found at {} and AULA_EMAIL is not set",
            default_path.display()
        ),
    }
}

fn open_store(config: &AulaConfig) -> Result<Arc<dyn StateStore>> {
    let root = match &config.storage.dir {
        Some(dir) => dir.clone(),
        None => FileStore::default_root()?,
    };
    Ok(Arc::new(FileStore::new(root)))
}

fn load_content(store: &dyn StateStore, kind: ContentKind) -> Result<StoredContent> {
    match store.get(&content_key(kind))? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => bail!("no generated {kind} found; run `aula generate --kind {kind}` first"),
    }
}

fn save_content(
    store: &dyn StateStore,
    kind: ContentKind,
    stored: &StoredContent,
) -> Result<(), AulaError> {
    store.set(&content_key(kind), &serde_json::to_string(stored)?)
}

async fn run_generate(
    config: &AulaConfig,
    client: Arc<dyn BackendClient>,
    store: Arc<dyn StateStore>,
    kind: ContentKind,
    fields: FormFields,
) -> Result<()> {
    let builder = GenerationRequestBuilder::new(client.clone(), &config.user.email);

    let (content, update) = match builder.generate_update(kind, &fields).await {
        Ok(result) => result,
        Err(AulaError::AccessDenied(message)) => {
            paywall(&message);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    // Fresh generation event: applying the form-originated update wipes any
    // chat state anchored to the previous artifact.
    let mut host = HostContent::new(String::new(), store.clone(), chat_key(kind));
    host.apply(update)?;

    let stored = StoredContent {
        name: if fields.name.is_empty() {
            format!("aula {kind}")
        } else {
            fields.name.clone()
        },
        content,
    };
    save_content(store.as_ref(), kind, &stored)?;
    log::info!("generated {kind} for {}", config.user.email);

    println!("{}", render::render(kind, &stored.content)?);
    println!();

    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let notifier = PointsNotifier::new(client, notice_tx);
    // The award runs on its own task; joining it here keeps this short-lived
    // process alive long enough for the call to land before exit.
    notifier
        .notify(&config.user.email, 10, &format!("{kind} generated"))
        .await?;
    if let Ok(toast) = notice_rx.try_recv() {
        println!("{toast}");
    }

    Ok(())
}

async fn run_chat(
    config: &AulaConfig,
    client: Arc<dyn BackendClient>,
    store: Arc<dyn StateStore>,
    kind: ContentKind,
) -> Result<()> {
    let mut stored = load_content(store.as_ref(), kind)?;
    let anchor = stored.content.as_anchor();

    let mut session = ChatSession::new(
        client,
        store.clone(),
        SessionConfig::new(&chat_key(kind), &config.user.email, &welcome_text(kind)),
    );

    match session.open(&anchor).await? {
        OpenOutcome::Denied(message) => {
            paywall(&message);
            return Ok(());
        }
        OpenOutcome::Restored => println!("(restored previous conversation)"),
        OpenOutcome::Started | OpenOutcome::AlreadyActive => {}
    }

    for message in session.messages() {
        println!("[{:?}] {}", message.role, message.content);
    }

    let mut host = HostContent::new(anchor, store.clone(), chat_key(kind));
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/q" | "/exit" => {
                session.close();
                break;
            }
            "/clear" => {
                session.clear()?;
                println!("Chat cleared.");
                break;
            }
            "/help" | "/h" => {
                println!("{}", help_text());
                continue;
            }
            _ => {}
        }

        match session.send(input).await {
            Ok(Some(update)) => {
                println!("[Model] {}", update.content);
                match apply_revision(kind, update, &mut host, &mut stored) {
                    Ok(()) => save_content(store.as_ref(), kind, &stored)?,
                    Err(AulaError::Parsing(message)) => {
                        println!("The revision was not valid {kind} content, keeping the previous version ({message}).");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Ok(None) => {}
            Err(AulaError::Transport(message)) => {
                println!("Could not reach the assistant, please try again ({message}).");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Fold an accepted revision into the host state. Structured kinds must
/// parse back into JSON; a malformed revision leaves the content untouched.
fn apply_revision(
    kind: ContentKind,
    update: ContentUpdate,
    host: &mut HostContent,
    stored: &mut StoredContent,
) -> Result<(), AulaError> {
    let content = if kind.is_structured() {
        let value: serde_json::Value = serde_json::from_str(&update.content)
            .map_err(|err| AulaError::Parsing(err.to_string()))?;
        GeneratedContent::Structured(value)
    } else {
        GeneratedContent::Text(update.content.clone())
    };

    host.apply(update)?;
    stored.content = content;
    Ok(())
}

fn run_export(
    store: Arc<dyn StateStore>,
    kind: ContentKind,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let stored = load_content(store.as_ref(), kind)?;
    let bytes = export::export(kind, &stored.content, &stored.name, format)?;

    let path = output.unwrap_or_else(|| PathBuf::from(format!("{kind}.{}", format.extension())));
    std::fs::write(&path, bytes)?;
    println!("Exported {} to {}", stored.name, path.display());
    Ok(())
}

async fn run_status(config: &AulaConfig, client: Arc<dyn BackendClient>, wait: bool) -> Result<()> {
    let status = if wait {
        aula_client::poll_subscription(
            client.as_ref(),
            &config.user.email,
            10,
            Duration::from_secs(3),
        )
        .await?
    } else {
        client.subscription_status(&config.user.email).await?
    };

    if status.active {
        println!("Subscription active ({})", status.plan);
    } else {
        println!("Subscription inactive: {}", status.message);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).await?;

    env_logger::Builder::new()
        .parse_filters(&resolve_log_level(cli.log_level.as_deref(), &config))
        .init();

    let store = open_store(&config)?;
    let client: Arc<dyn BackendClient> = Arc::new(
        HttpBackendClient::new(config.backend.base_url.clone())
            .with_timeout(Duration::from_secs(config.backend.timeout_secs)),
    );

    match cli.command {
        Commands::Generate {
            kind,
            topic,
            grade,
            subject,
            name,
            public,
        } => {
            let fields = FormFields {
                topic,
                grade,
                subject,
                name: name.unwrap_or_default(),
                public,
            };
            run_generate(&config, client, store, kind.into(), fields).await
        }
        Commands::Chat { kind } => run_chat(&config, client, store, kind.into()).await,
        Commands::Export {
            kind,
            format,
            output,
        } => run_export(store, kind.into(), format.into(), output),
        Commands::Status { wait } => run_status(&config, client, wait).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_level(level: &str) -> AulaConfig {
        AulaConfig::from_str(&format!(
            "user:\n  email: \"ana@colegio.edu\"\nlogging:\n  level: \"{level}\"\n"
        ))
        .unwrap()
    }

    #[test]
    fn test_config_level_applies_when_flag_absent() {
        let config = config_with_level("debug");
        assert_eq!(resolve_log_level(None, &config), "debug");
    }

    #[test]
    fn test_flag_overrides_config_level() {
        let config = config_with_level("debug");
        assert_eq!(resolve_log_level(Some("trace"), &config), "trace");
    }
}
