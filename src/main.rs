use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use heimdall_core::{HeimdallConfig, Metrics};
use heimdall_github::{GitHubClient, SourceControl};
use heimdall_model::{AnthropicProvider, ModelManager, ModelProvider, OpenAiProvider};
use heimdall_policy::PolicyResolver;
use heimdall_server::{build_router, AppState, Dispatcher, ReviewTracker};

#[derive(Parser)]
#[command(
    name = "heimdall",
    version,
    about = "AI pull-request review bot",
    long_about = "Heimdall watches your repositories: webhook deliveries come in, reviewed\n\
                   pull requests come out. It classifies events, applies each repository's\n\
                   review policy, invokes a configurable LLM backend (with fallback), and\n\
                   posts the result as a PR comment.\n\n\
                   Examples:\n  \
                     heimdall init                 Write a starter heimdall.toml\n  \
                     heimdall doctor               Check configuration and providers\n  \
                     heimdall serve                Run the webhook server\n  \
                     heimdall serve --bind 0.0.0.0:9000"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: heimdall.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook server
    #[command(long_about = "Run the webhook server.\n\n\
        Binds the address from [server].bind_addr (or --bind), accepts signed\n\
        GitHub webhook deliveries on POST /webhook, and serves metrics on\n\
        GET /health. Secrets may come from the environment: \n\
        HEIMDALL_WEBHOOK_SECRET, GITHUB_TOKEN, ANTHROPIC_API_KEY, OPENAI_API_KEY.")]
    Serve {
        /// Bind address override (e.g. 127.0.0.1:8080)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Check configuration, credentials, and provider availability
    Doctor,
    /// Write a starter heimdall.toml in the current directory
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => serve(cli.config, bind).await,
        Command::Doctor => doctor(cli.config),
        Command::Init => init(),
    }
}

/// Load configuration, tolerating a missing default file but not a missing
/// explicitly-passed one. Environment secrets fill unset fields.
fn load_config(path: Option<PathBuf>) -> Result<HeimdallConfig> {
    let mut config = match path {
        Some(path) => HeimdallConfig::from_file(&path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let default = Path::new("heimdall.toml");
            if default.exists() {
                HeimdallConfig::from_file(default)
                    .into_diagnostic()
                    .wrap_err("failed to load heimdall.toml")?
            } else {
                HeimdallConfig::default()
            }
        }
    };
    config.apply_env();
    Ok(config)
}

async fn serve(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config(config_path)?;
    let secret = config.server.webhook_secret.clone().ok_or_else(|| {
        miette::miette!(
            "no webhook secret configured; set [server].webhook_secret or HEIMDALL_WEBHOOK_SECRET"
        )
    })?;

    let metrics = Metrics::new();
    let scm: Arc<dyn SourceControl> =
        Arc::new(GitHubClient::new(&config.github).into_diagnostic()?);

    let mut models = ModelManager::new(Some(config.ai.default_provider.clone()), metrics.clone());
    let anthropic = AnthropicProvider::new(&config.ai.anthropic).into_diagnostic()?;
    register_if_available(&mut models, Arc::new(anthropic));
    let openai = OpenAiProvider::new(&config.ai.openai).into_diagnostic()?;
    register_if_available(&mut models, Arc::new(openai));

    if models.list_available_providers().is_empty() {
        warn!("no model provider has credentials; reviews will fail until one is configured");
    }

    let dispatcher = Dispatcher::new(
        scm.clone(),
        models,
        PolicyResolver::new(scm),
        ReviewTracker::new(),
        metrics.clone(),
    );
    let state = AppState::new(secret.into_bytes(), dispatcher, metrics);
    let app = build_router(state);

    let addr = bind.unwrap_or_else(|| config.server.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(%addr, "heimdall listening");

    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}

fn register_if_available(models: &mut ModelManager, provider: Arc<dyn ModelProvider>) {
    if provider.is_available() {
        info!(provider = provider.name(), "registered model provider");
        models.register_provider(provider);
    } else {
        warn!(
            provider = provider.name(),
            "provider has no credentials, not registering"
        );
    }
}

fn doctor(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;

    println!("Heimdall configuration check");
    println!(
        "  webhook secret:  {}",
        present(config.server.webhook_secret.is_some())
    );
    println!("  github token:    {}", present(config.github.token.is_some()));
    println!(
        "  anthropic:       {}",
        ready(config.ai.anthropic.api_key.as_deref())
    );
    println!(
        "  openai:          {}",
        ready(config.ai.openai.api_key.as_deref())
    );
    println!("  default provider: {}", config.ai.default_provider);

    Ok(())
}

fn present(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "NOT SET"
    }
}

fn ready(api_key: Option<&str>) -> &'static str {
    match api_key {
        Some(key) if !key.is_empty() => "ready",
        _ => "missing API key",
    }
}

const STARTER_CONFIG: &str = r#"# Heimdall configuration.
# Secrets can be left out of this file and provided via the environment:
# HEIMDALL_WEBHOOK_SECRET, GITHUB_TOKEN, ANTHROPIC_API_KEY, OPENAI_API_KEY.

[server]
bind_addr = "0.0.0.0:8080"
# webhook_secret = "change-me"

[github]
# token = "ghp_..."
api_base = "https://api.github.com"

[ai]
default_provider = "anthropic"

[ai.anthropic]
# api_key = "sk-ant-..."
# model = "claude-sonnet-4-20250514"

[ai.openai]
# api_key = "sk-..."
# model = "gpt-4o"
"#;

fn init() -> Result<()> {
    let path = Path::new("heimdall.toml");
    if path.exists() {
        return Err(miette::miette!(
            "heimdall.toml already exists, refusing to overwrite"
        ));
    }
    std::fs::write(path, STARTER_CONFIG).into_diagnostic()?;
    println!("Wrote heimdall.toml — fill in your secrets and run `heimdall doctor`.");
    Ok(())
}
