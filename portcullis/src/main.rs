use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use portcullis::{JsonRepositoryProvider, Portcullis, PortcullisBuilder, PortcullisConfig};
use tracing_subscriber::EnvFilter;

/// Operator tooling for a portcullis deployment
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// User mapping file
    #[arg(long, env = "PORTCULLIS_USERS_FILE")]
    users_file: Option<PathBuf>,

    /// Failure ledger file
    #[arg(long, env = "PORTCULLIS_LEDGER_FILE")]
    ledger_file: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Create an empty failure ledger if none exists
    Init,
    /// Show the lockout state of a client identifier
    Status {
        /// Client identifier, normally an IP address
        identifier: String,
    },
    /// Clear all recorded failures for a client identifier
    Unlock {
        /// Client identifier, normally an IP address
        identifier: String,
    },
    /// Verify that both files can be read
    Check,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = PortcullisConfig::from_env();
    if let Some(users_file) = cli.users_file {
        config.users_file = users_file;
    }
    if let Some(ledger_file) = cli.ledger_file {
        config.ledger_file = ledger_file;
    }

    execute(cli.command, &config, &mut std::io::stdout()).await
}

async fn execute(
    command: Commands,
    config: &PortcullisConfig,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Commands::Version => {
            writeln!(out, "Portcullis v{}", env!("CARGO_PKG_VERSION"))?;
        }
        Commands::Init => {
            open(config)
                .await?
                .initialize()
                .await
                .with_context(|| format!("failed to initialise {}", config.ledger_file.display()))?;
            writeln!(out, "Ledger ready at {}", config.ledger_file.display())?;
        }
        Commands::Status { identifier } => {
            let status = open(config).await?.lockout_status(&identifier).await;
            writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
        }
        Commands::Unlock { identifier } => {
            if open(config).await?.unlock(&identifier).await {
                writeln!(out, "{identifier} unlocked")?;
            } else {
                writeln!(out, "{identifier} was not locked")?;
            }
        }
        Commands::Check => {
            let portcullis = open(config).await?;
            portcullis
                .health_check()
                .await
                .context("storage health check failed")?;
            writeln!(
                out,
                "ok: {} user(s) in {}, ledger at {}",
                portcullis.user_count().await,
                config.users_file.display(),
                config.ledger_file.display()
            )?;
        }
    }

    Ok(())
}

async fn open(config: &PortcullisConfig) -> anyhow::Result<Portcullis<JsonRepositoryProvider>> {
    PortcullisBuilder::from_config(config)
        .build()
        .await
        .context("failed to configure portcullis")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> PortcullisConfig {
        PortcullisConfig {
            users_file: dir.path().join("users.json"),
            ledger_file: dir.path().join("login-failures.json"),
            ..PortcullisConfig::default()
        }
    }

    async fn run(command: Commands, config: &PortcullisConfig) -> String {
        let mut out = Vec::new();
        execute(command, config, &mut out)
            .await
            .expect("command failed");
        String::from_utf8(out).unwrap()
    }

    async fn lock_out(config: &PortcullisConfig, identifier: &str) {
        let portcullis = open(config).await.unwrap();
        for _ in 0..3 {
            portcullis.login(identifier, "admin", "wrong").await;
        }
    }

    #[tokio::test]
    async fn test_init_creates_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);

        let output = run(Commands::Init, &config).await;

        assert!(output.starts_with("Ledger ready at"));
        assert_eq!(
            tokio::fs::read_to_string(&config.ledger_file).await.unwrap(),
            "{}"
        );
    }

    #[tokio::test]
    async fn test_status_reports_lock() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        lock_out(&config, "10.0.0.9").await;

        let output = run(
            Commands::Status {
                identifier: "10.0.0.9".to_string(),
            },
            &config,
        )
        .await;
        let status: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(status["failed_attempts"], 3);
        assert_eq!(status["is_locked"], true);
    }

    #[tokio::test]
    async fn test_unlock_clears_ledger_entry() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        lock_out(&config, "10.0.0.9").await;

        let unlock = || Commands::Unlock {
            identifier: "10.0.0.9".to_string(),
        };
        assert_eq!(run(unlock(), &config).await, "10.0.0.9 unlocked\n");
        assert_eq!(run(unlock(), &config).await, "10.0.0.9 was not locked\n");

        let ledger = tokio::fs::read_to_string(&config.ledger_file).await.unwrap();
        assert_eq!(ledger.trim(), "{}");
    }

    #[tokio::test]
    async fn test_check_counts_users() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let users = serde_json::json!({ "olduser": password_auth::generate_hash("admin123") });
        tokio::fs::write(&config.users_file, users.to_string())
            .await
            .unwrap();
        run(Commands::Init, &config).await;

        let output = run(Commands::Check, &config).await;

        assert!(output.starts_with("ok: 1 user(s) in"));
    }
}
