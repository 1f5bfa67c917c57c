use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use profitwavy_session::auth::validation::{password_strength, referral_from_query};
use profitwavy_session::config::ConfigError;
use profitwavy_session::session::{Navigator, PageDecision};
use profitwavy_session::store::{FileStorage, StorageError};
use profitwavy_session::{
    ApiError, AuthClient, CredentialStore, Dispatcher, PageKind, ReqwestTransport, SessionConfig, SessionController, User,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("http client init failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "profitwavy", about = "ProfitWavy account session CLI")]
struct Cli {
    /// Backend base URL, e.g. `https://api.example.com/api`.
    #[arg(long)]
    api_base: Option<String>,

    /// Session file. Defaults to `~/.profitwavy/session.json`.
    #[arg(long)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and save the session.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long, env = "PROFITWAVY_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, conflicts_with = "referral_link")]
        referral: Option<String>,
        /// Registration link carrying `?ref=` or `?referral=`.
        #[arg(long)]
        referral_link: Option<String>,
    },
    /// Log in and save the session.
    Login {
        #[arg(long)]
        phone: String,
        #[arg(long, env = "PROFITWAVY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Fetch the current profile.
    Me,
    /// End the session locally and on the server.
    Logout,
    /// Show the saved session without calling the backend.
    Status,
    /// Score a candidate password locally.
    Strength { password: String },
}

impl Command {
    fn page(&self) -> PageKind {
        match self {
            Self::Register { .. } => PageKind::Register,
            Self::Login { .. } => PageKind::Login,
            _ => PageKind::Protected,
        }
    }
}

/// Redirects become a note on stderr.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, target: &str) {
        eprintln!("redirect -> {target}");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Command::Strength { password } = &cli.command {
        return print_strength(password);
    }

    let mut config = SessionConfig::from_env()?;
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    let storage_path = cli
        .storage
        .or_else(|| config.storage_path.clone())
        .unwrap_or_else(default_storage_path);

    let storage = FileStorage::open(storage_path)?;
    let store = CredentialStore::with_ttl(Arc::new(storage), config.session_ttl);
    let session = SessionController::new(cli.command.page(), Arc::new(TerminalNavigator))
        .with_routes(config.login_path.clone(), config.dashboard_path.clone());
    let transport = ReqwestTransport::new(config.timeouts)?;
    let dispatcher = Dispatcher::new(&config.api_base, Arc::new(transport), store.clone(), session.clone());
    let auth = AuthClient::new(dispatcher);

    match cli.command {
        Command::Register { name, phone, password, referral, referral_link } => {
            let referral = referral.or_else(|| referral_link.as_deref().and_then(link_query).and_then(referral_from_query));
            let response = auth.register(&name, &phone, &password, referral.as_deref()).await?;
            print_json(&json!({ "user": response.user, "authenticated": store.is_authenticated() }))
        }
        Command::Login { phone, password } => {
            let response = auth.login(&phone, &password).await?;
            print_json(&json!({ "user": response.user, "authenticated": store.is_authenticated() }))
        }
        Command::Me => {
            session.check(&store);
            let user = auth.get_me().await?;
            print_json(&serde_json::to_value(user)?)
        }
        Command::Logout => {
            auth.logout().await;
            println!("logged out");
            Ok(())
        }
        Command::Status => {
            let redirect = match session.guard(&store) {
                PageDecision::Redirect(target) => Some(target),
                PageDecision::Stay => None,
            };
            let user = store.load_user();
            print_json(&json!({
                "state": format!("{:?}", session.state()),
                "name": user.as_ref().and_then(User::display_name),
                "redirect": redirect,
            }))
        }
        Command::Strength { .. } => Ok(()),
    }
}

fn print_strength(password: &str) -> Result<(), CliError> {
    let strength = password_strength(password);
    print_json(&json!({
        "score": strength.score,
        "label": strength.label.map(|l| format!("{l:?}")),
        "feedback": strength.feedback,
    }))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn link_query(link: &str) -> Option<&str> {
    link.split_once('?').map(|(_, query)| query)
}

fn default_storage_path() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".profitwavy-session.json"),
        |home| PathBuf::from(home).join(".profitwavy").join("session.json"),
    )
}
