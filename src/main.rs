#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use game_store_server::{config, logging, server};

/// Central server for a multi-tenant game-distribution and match-hosting platform.
#[derive(Parser, Debug)]
#[command(name = "game-store-server")]
#[command(about = "Game catalog, presence, and room-hosting server")]
#[command(version)]
struct Cli {
    /// Port the credential store is listening on.
    credential_port: u16,

    /// Override the configured data directory.
    #[arg(long)]
    data_dir: Option<String>,

    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load();
    if let Some(data_dir) = cli.data_dir {
        cfg.data_dir = data_dir;
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let validation_result = config::validate(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Data dir: {}", cfg.data_dir);
                println!("  Credential max attempts: {}", cfg.credential.max_attempts);
                println!("  Player read deadline: {}s", cfg.player_read_deadline_secs);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }
    validation_result?;

    logging::init_with_config(&cfg.logging);

    tracing::info!(credential_port = cli.credential_port, data_dir = %cfg.data_dir, "starting game-store-server");

    let (handles, accept_loop) = server::bootstrap(&cfg, cli.credential_port).await?;
    tracing::info!(dev_port = handles.dev_port, lobby_port = handles.lobby_port, "listening");

    tokio::select! {
        () = accept_loop => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn test_cli_requires_credential_port() {
        let result = Cli::try_parse_from(["game-store-server"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_default_no_flags() {
        let cli = Cli::try_parse_from(["game-store-server", "9000"]).unwrap();
        assert_eq!(cli.credential_port, 9000);
        assert!(!cli.validate_config);
        assert!(!cli.print_config);
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn test_cli_validate_config_short() {
        let cli = Cli::try_parse_from(["game-store-server", "9000", "-c"]).unwrap();
        assert!(cli.validate_config);
    }

    #[test]
    fn test_cli_validate_and_print_config_conflict() {
        let result = Cli::try_parse_from(["game-store-server", "9000", "--validate-config", "--print-config"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_data_dir_override() {
        let cli = Cli::try_parse_from(["game-store-server", "9000", "--data-dir", "/tmp/store"]).unwrap();
        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/store"));
    }
}
