use anyhow::Result;
use rasad::api::{ApiClient, ReqwestTransport};
use rasad::auth::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
use rasad::{app, cli, Config};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("RASAD_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
}

/// The TUI owns the terminal, so logs go to a file (or nowhere).
fn init_file_logging(path: Option<&Path>) {
    let file = path.and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::sink)
            .init(),
    }
}

fn init_stderr_logging() {
    fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn token_store(config: &Config) -> Arc<dyn TokenStore> {
    match config.token_path() {
        Some(path) if config.session.remember_token => Arc::new(FileTokenStore::new(path)),
        _ => Arc::new(MemoryTokenStore::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
        config.validate()?;
    }

    if cli.command.is_some() {
        init_stderr_logging();
    } else {
        init_file_logging(config.log_path().as_deref());
    }

    tracing::debug!("Using backend at {}", config.api.base_url);
    let transport = Arc::new(ReqwestTransport::new(config.timeout()));
    let client = ApiClient::new(config.api.base_url.clone(), transport);
    let session = Session::new(client, token_store(&config));

    match cli.command {
        Some(command) => cli::run(command, &session, cli.config).await,
        None => app::run(config, session).await,
    }
}
