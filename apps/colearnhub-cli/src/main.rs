use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;

use accounts::config::AccountsConfig;
use accounts::infra::backend::HostedBackend;
use accounts::model::{SignupField, SignupState};
use accounts::{AccountsModule, AccountsPorts, SignupSession};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use runtime::{AppConfig, AppConfigProvider, CliArgs};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

/// CoLearnHub accounts - register and sign in against the hosted backend
#[derive(Parser)]
#[command(name = "colearnhub")]
#[command(about = "CoLearnHub accounts - register and sign in against the hosted backend")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long, global = true)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use in-process stores instead of the hosted backend
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration
    Check,
    /// Register a new account
    Signup(SignupArgs),
    /// Sign in with an existing account
    SignIn(SignInArgs),
}

#[derive(Args)]
struct SignupArgs {
    /// Full name
    #[arg(long)]
    name: String,
    /// Email address
    #[arg(long)]
    email: String,
    /// Birth date as YYYY-MM-DD
    #[arg(long)]
    birth_date: String,
    /// Country code (1 = Portugal, 2 = United States) or name
    #[arg(long, default_value = "1")]
    country: String,
    /// Unique username
    #[arg(long)]
    username: String,
    /// Account password; read from stdin when neither this nor the env var is set
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args)]
struct SignInArgs {
    #[arg(long)]
    email: String,
    /// Account password; read from stdin when neither this nor the env var is set
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,
}

const PASSWORD_ENV: &str = "COLEARNHUB_PASSWORD";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.app.home_dir));
    tracing::debug!("CoLearnHub CLI starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => check_config(&config),
        Commands::Signup(signup) => run_signup(&config, &args, signup).await,
        Commands::SignIn(sign_in) => run_sign_in(&config, &args, sign_in).await,
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let accounts: AccountsConfig = AppConfigProvider::new(config.clone()).module_config("accounts")?;
    if let Some(backend) = &config.backend {
        backend.base_url()?;
    } else {
        tracing::warn!("No backend configured; only --mock runs are possible");
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Accounts: {accounts:?}");
    println!("{}", config.to_yaml()?);
    Ok(())
}

/// Wire the accounts module against the hosted backend or, with `--mock`,
/// against fresh in-memory stores.
fn build_module(config: &AppConfig, args: &CliArgs) -> Result<AccountsModule> {
    let accounts: AccountsConfig = AppConfigProvider::new(config.clone()).module_config("accounts")?;

    let ports = if args.mock {
        tracing::info!("Using in-memory account stores");
        AccountsPorts::in_memory()
    } else {
        let backend_cfg = config.backend.as_ref().ok_or_else(|| {
            anyhow!("No backend configured: add a `backend` section to the config file or pass --mock")
        })?;
        let timeout = (backend_cfg.timeout_sec > 0).then(|| Duration::from_secs(backend_cfg.timeout_sec));
        let backend = HostedBackend::new(backend_cfg.base_url()?, backend_cfg.api_key.clone(), timeout)
            .context("Failed to build HTTP client for the backend")?;
        tracing::info!(url = %backend.base_url(), "Using hosted backend");
        AccountsPorts::hosted(&backend)
    };

    Ok(AccountsModule::init(ports, &accounts))
}

async fn run_signup(config: &AppConfig, args: &CliArgs, signup: SignupArgs) -> Result<()> {
    let password = resolve_password(signup.password)?;
    let module = build_module(config, args)?;
    let mut session = module.api().start_signup();

    session.update_field(SignupField::Name, &signup.name);
    session.update_field(SignupField::Email, &signup.email);
    session.update_field(SignupField::BirthDate, &signup.birth_date);
    session.update_field(SignupField::Country, &signup.country);
    step(&mut session).await?;

    session.update_field(SignupField::Username, &signup.username);
    session.update_field(SignupField::Password, password.expose_secret());
    step(&mut session).await?;

    let outcome = session.submit().await;
    report_warnings(&session);
    match outcome {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(e) => {
            if let Some(id) = e.orphaned_identity() {
                eprintln!(
                    "Account {id} exists without a profile; contact support before signing up again"
                );
            }
            Err(e).context("Signup failed")
        }
    }
}

async fn step(session: &mut SignupSession) -> Result<SignupState> {
    let state = session.advance().await;
    report_warnings(session);
    let state = state.context("Signup step incomplete")?;
    tracing::debug!(state = %state, "Signup step complete");
    Ok(state)
}

/// Password from `--password` or the env var, else the first line of stdin.
/// Keeps it out of argv so it does not show up in `ps` or shell history.
fn resolve_password(given: Option<String>) -> Result<SecretString> {
    if let Some(password) = given {
        return Ok(SecretString::from(password));
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("No password given: set {PASSWORD_ENV} or pipe it on stdin");
    }
    Ok(SecretString::from(password.to_string()))
}

fn report_warnings(session: &SignupSession) {
    for warning in session.warnings() {
        eprintln!("warning: {warning}");
    }
}

async fn run_sign_in(config: &AppConfig, args: &CliArgs, sign_in: SignInArgs) -> Result<()> {
    let password = resolve_password(sign_in.password)?;
    let module = build_module(config, args)?;
    let api = module.api();

    let session = api
        .sign_in(&sign_in.email, &password)
        .await
        .context("Sign-in failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "identity_id": session.identity_id,
            "expires_at": session.expires_at,
        }))?
    );

    api.sign_out().await.context("Sign-out failed")?;
    Ok(())
}
