use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use feedback_manager::ai::FeedbackClient;
use feedback_manager::core::config::AppConfig;
use feedback_manager::core::credentials::CredentialStore;
use feedback_manager::core::models::{Credentials, FeedbackStyle, mask_key};
use feedback_manager::core::storage::{FileStore, KeyValueStore};
use feedback_manager::features::FeedbackService;

const APOLOGY: &str = "Sorry, I encountered an error while generating feedback. Please check your API configuration and try again.";

/// Get managerial feedback on your performance notes from an LLM
#[derive(Parser)]
#[command(name = "feedback", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and save API credentials
    Configure {
        /// API key for the chat-completion provider
        #[arg(long, env = "FEEDBACK_API_KEY")]
        api_key: String,

        /// Model name (defaults to FEEDBACK_DEFAULT_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Chat-completion endpoint (guessed from the key when omitted)
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Show whether usable credentials are stored
    Status,
    /// Remove stored credentials
    Clear,
    /// Ask for feedback on performance notes (read from stdin when omitted)
    Ask {
        notes: Vec<String>,

        /// default, concise, detailed, strength, improvement or custom
        #[arg(long, default_value = "default")]
        style: String,

        /// Instruction used verbatim with --style custom
        #[arg(long)]
        custom: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    feedback_manager::setup_logging();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?;
    let store = CredentialStore::new(open_backend(&config).await, config.default_endpoint.clone());

    match cli.command {
        Command::Configure {
            api_key,
            model,
            endpoint,
        } => {
            let endpoint = endpoint.unwrap_or_else(|| store.suggest_endpoint(&api_key));
            let model = model.unwrap_or_else(|| config.default_model.clone());
            let candidate = Credentials::new(api_key, model, endpoint);

            let validation = store.validate(&candidate);
            if !validation.valid {
                for error in &validation.errors {
                    eprintln!("- {error}");
                }
                bail!("credentials were not saved");
            }

            if !store.save(&candidate).await {
                bail!("failed to save credentials");
            }
            println!(
                "Saved credentials for {} at {}",
                candidate.model_name, candidate.api_endpoint
            );
        }
        Command::Status => {
            let service = FeedbackService::new(store, FeedbackClient::new(), config);
            let status = service.check_configuration().await;
            println!("{status}");
            if let Some(creds) = service.credentials().get().await {
                println!("  API key:  {}", mask_key(&creds.api_key));
                println!("  Model:    {}", creds.model_name);
                println!("  Endpoint: {}", creds.api_endpoint);
            }
            if !status.is_ready() {
                bail!("not configured");
            }
        }
        Command::Clear => {
            store.clear().await;
            println!("Credentials cleared");
        }
        Command::Ask {
            notes,
            style,
            custom,
        } => {
            let parsed = style.parse::<FeedbackStyle>().unwrap_or_else(|e| {
                warn!("{}; using the default style", e);
                FeedbackStyle::Default
            });

            let notes = if notes.is_empty() {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("reading notes from stdin")?;
                buf
            } else {
                notes.join(" ")
            };

            let service = FeedbackService::new(store, FeedbackClient::new(), config);
            match service
                .get_feedback(&notes, parsed, custom.as_deref())
                .await
            {
                Ok(feedback) => {
                    info!("Feedback provided");
                    println!("Manager Feedback\n\n{feedback}");
                }
                Err(e) => {
                    eprintln!("{APOLOGY}");
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "ssm")]
async fn open_backend(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    use feedback_manager::core::storage::SsmStore;

    match &config.ssm_prefix {
        Some(prefix) => Arc::new(SsmStore::from_env(prefix).await),
        None => Arc::new(FileStore::new(&config.store_path)),
    }
}

#[cfg(not(feature = "ssm"))]
async fn open_backend(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    if config.ssm_prefix.is_some() {
        warn!("FEEDBACK_SSM_PREFIX is set but this build lacks the `ssm` feature; using the file store");
    }
    Arc::new(FileStore::new(&config.store_path))
}
