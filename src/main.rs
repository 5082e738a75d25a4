use std::sync::Arc;

use algomaster::services::identity::RegistrationData;
use algomaster::services::system_theme::ManualThemeSignal;
use algomaster::state::session::SessionStore;
use algomaster::state::theme::{Appearance, DocumentRoot, ThemePreference};
use algomaster::{AppConfig, AppContext, ErrorCode};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] algomaster::config::ConfigError),
    #[error(transparent)]
    Startup(#[from] algomaster::context::StartupError),
    #[error(transparent)]
    Session(#[from] algomaster::state::session::SessionError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Startup(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::Json(_) => "E_JSON",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "algomaster", about = "AlgoMaster session and theme state")]
struct Cli {
    /// OS appearance reported to the theme store.
    #[arg(long, env = "ALGOMASTER_SYSTEM_THEME", default_value = "light")]
    system_theme: Appearance,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current session and theme state.
    Status,
    /// Sign in with an email and password.
    Login { email: String, password: String },
    /// Sign in with the built-in demo account.
    DemoLogin,
    /// Create an account and sign it in.
    Register(RegisterArgs),
    /// Sign out.
    Logout,
    /// Renew the held token.
    Refresh,
    /// Set the theme preference (light, dark, system).
    Theme { choice: ThemePreference },
    /// Switch to the opposite of the rendered theme.
    ToggleTheme,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    email: String,
    password: String,
    #[arg(long)]
    username: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(code = e.code(), error = %e, "command failed");
        eprintln!("error [{}]: {e}", e.code());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::from_env()?;
    let ctx = AppContext::from_config(&config, Arc::new(DocumentRoot::new()))?;

    let signal = ManualThemeSignal::new(cli.system_theme);
    let sync = ctx.start_theme_sync(&signal).await;

    {
        let mut session = ctx.session.lock().await;
        match cli.command {
            Command::Status => {}
            Command::Login { email, password } => {
                session.login(&email, &password).await?;
            }
            Command::DemoLogin => {
                session.demo_login().await?;
            }
            Command::Register(args) => {
                let registration = RegistrationData {
                    email: args.email,
                    password: args.password,
                    username: args.username,
                    first_name: args.first_name,
                    last_name: args.last_name,
                };
                session.register(&registration).await?;
            }
            Command::Logout => session.logout(),
            Command::Refresh => session.refresh_token().await?,
            Command::Theme { choice } => ctx.theme.lock().await.set_theme(choice),
            Command::ToggleTheme => ctx.theme.lock().await.toggle_theme(),
        }
        print_status(&session, &ctx).await?;
    }

    sync.unsubscribe().await;
    Ok(())
}

async fn print_status(session: &SessionStore, ctx: &AppContext) -> Result<(), CliError> {
    let theme = ctx.theme.lock().await.state();
    let status = serde_json::json!({
        "session": session.snapshot(),
        "tokenExpired": session.is_authenticated() && session.token_expired(),
        "theme": theme,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
