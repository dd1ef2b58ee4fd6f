use std::path::PathBuf;
use std::sync::Arc;

use chamafrete::{ApiClient, ApiError, ClientConfig, FileStore, Navigator, SessionState, StorageError, create_client};
use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "chamafrete-cli", about = "Chama Frete API client with a persisted session")]
struct Cli {
    /// Overrides `API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, env = "CHAMAFRETE_SESSION_FILE", default_value = ".chamafrete-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate and persist the returned token and user profile.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CHAMAFRETE_PASSWORD")]
        password: String,
    },
    /// Drop the persisted session.
    Logout,
    /// Show whether a session is stored.
    Status,
    Get(PathArgs),
    Delete(PathArgs),
    Post(BodyArgs),
    Put(BodyArgs),
    Patch(BodyArgs),
}

#[derive(Args, Debug)]
struct PathArgs {
    path: String,
}

#[derive(Args, Debug)]
struct BodyArgs {
    path: String,
    #[arg(long, default_value = "{}")]
    data: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    user: Value,
}

/// A terminal has no page to reload; a forced logout becomes a notice.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> Option<String> {
        None
    }

    fn redirect(&self, path: &str) {
        eprintln!("session expired ({path}); run `chamafrete-cli login` to sign in again");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring .env: {e}");
        }
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let api = build_client(&cli)?;

    match cli.command {
        Command::Login { email, password } => run_login(&api, &email, &password).await,
        Command::Logout => {
            api.logout()?;
            println!("logged out");
            Ok(())
        }
        Command::Status => run_status(&api),
        Command::Get(args) => run_request(&api, Method::GET, &args.path, None).await,
        Command::Delete(args) => run_request(&api, Method::DELETE, &args.path, None).await,
        Command::Post(args) => run_request(&api, Method::POST, &args.path, Some(&args.data)).await,
        Command::Put(args) => run_request(&api, Method::PUT, &args.path, Some(&args.data)).await,
        Command::Patch(args) => run_request(&api, Method::PATCH, &args.path, Some(&args.data)).await,
    }
}

fn client_config(base_url: Option<&str>) -> ClientConfig {
    let config = ClientConfig::from_env();
    match base_url {
        Some(url) => config.with_base_url(url),
        None => config,
    }
}

fn build_client(cli: &Cli) -> Result<ApiClient, CliError> {
    let store = Arc::new(FileStore::new(cli.session_file.clone()));
    let api = create_client(client_config(cli.base_url.as_deref()), store, Arc::new(TerminalNavigator))?;
    Ok(api)
}

async fn run_login(api: &ApiClient, email: &str, password: &str) -> Result<(), CliError> {
    let payload = serde_json::json!({ "email": email, "password": password });
    let response: LoginResponse = api.post("/login", &payload).await?;
    api.session().establish(&response.token, &response.user)?;
    println!("logged in as {email}");
    Ok(())
}

fn run_status(api: &ApiClient) -> Result<(), CliError> {
    match api.session_state() {
        SessionState::Authenticated => {
            println!("authenticated");
            if let Some(profile) = api.session().profile()? {
                print_json(&profile)?;
            }
        }
        SessionState::Unauthenticated => println!("not logged in"),
    }
    Ok(())
}

async fn run_request(api: &ApiClient, method: Method, path: &str, data: Option<&str>) -> Result<(), CliError> {
    let mut request = api.request(method, path);
    if let Some(raw) = data {
        request = request.json(&parse_payload(raw)?);
    }
    let response = request.send().await?;
    let text = response.text().await.map_err(ApiError::from)?;
    if text.trim().is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => print_json(&json),
        Err(_) => {
            println!("{text}");
            Ok(())
        }
    }
}

fn parse_payload(raw: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str::<Value>(raw.trim())?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
