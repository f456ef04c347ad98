//! Binance futures trading bot.
//!
//! ```bash
//! # interactive shell against the testnet
//! futures-bot --api-key "$KEY" --api-secret "$SECRET"
//!
//! # connection check only
//! futures-bot --api-key "$KEY" --api-secret "$SECRET" check
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use futures_trading_client::{
    diagnostics::run_diagnostics, logging, BasicBot, BinanceClient, Config, Profile, Shell,
};

#[derive(Parser)]
#[command(name = "futures-bot")]
#[command(about = "Binance USDT-M futures trading bot", long_about = None)]
#[command(version)]
struct Cli {
    /// Binance API key
    #[arg(long, env = "BINANCE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Binance API secret
    #[arg(long, env = "BINANCE_API_SECRET", hide_env_values = true)]
    api_secret: String,

    /// Use the futures testnet (`--testnet false` for the live exchange)
    #[arg(long, env = "BINANCE_TESTNET", default_value_t = true, action = clap::ArgAction::Set)]
    testnet: bool,

    /// Command set offered by the shell
    #[arg(long, value_enum, default_value_t = Profile::Advanced)]
    profile: Profile,

    /// Override the REST endpoint
    #[arg(long, env = "BINANCE_FUTURES_URL")]
    base_url: Option<String>,

    /// recvWindow for signed requests (ms)
    #[arg(long, default_value_t = 5000)]
    recv_window: u64,

    /// Per-request timeout (seconds)
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Directory for futures_trading_bot.log
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Also print info-level logs to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Interactive shell (default)
    Shell,
    /// Test connectivity and credentials, then exit
    Check,
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _guard =
        logging::init_tracing(&cli.log_dir, cli.verbose).context("failed to set up logging")?;

    // one request at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli));
    // a pending stdin read must not hold the process open
    runtime.shutdown_background();

    if let Err(e) = &result {
        error!("Fatal error: {:#}", e);
    }
    result
}

fn config(cli: &Cli) -> anyhow::Result<Config> {
    let mut builder = Config::builder()
        .api_key(&cli.api_key)
        .api_secret(&cli.api_secret)
        .testnet(cli.testnet)
        .recv_window(cli.recv_window)
        .timeout_secs(cli.timeout_secs);
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url);
    }
    Ok(builder.build()?)
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = config(&cli)?;
    info!("Starting with {:?}", config);

    let client = BinanceClient::new(&config)?;
    let mut stdout = io::stdout();

    if let Some(Mode::Check) = cli.command {
        let authenticated =
            run_diagnostics(&client, &config.api_key, &config.api_secret, &mut stdout).await?;
        return Ok(if authenticated {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let bot = BasicBot::new(client, config.testnet);
    if let Err(e) = bot.validate_connection().await {
        error!("Failed to connect to Binance Futures API. Exiting.");
        eprintln!("\nConnection failed: {e}");
        eprintln!("Please check:");
        eprintln!("1. Your API key and secret are correct");
        eprintln!("2. API key has futures trading permissions enabled");
        eprintln!("3. You're using the correct testnet environment");
        eprintln!("4. Your IP is not restricted");
        return Ok(ExitCode::FAILURE);
    }

    let shell = Shell::new(bot, cli.profile);
    writeln!(stdout, "\n{}\n", shell.banner())?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    shell.run(stdin, &mut stdout).await?;
    info!("Shell closed");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_trading_client::datastructures::config::{LIVE_BASE_URL, TESTNET_BASE_URL};

    fn parse(extra: &[&str]) -> Cli {
        let args = ["futures-bot", "--api-key", "key", "--api-secret", "secret"]
            .iter()
            .chain(extra)
            .copied();
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_to_testnet_shell_with_advanced_profile() {
        let cli = parse(&[]);
        assert!(cli.testnet);
        assert_eq!(cli.profile, Profile::Advanced);
        assert_eq!(cli.command, None);
        assert_eq!(
            config(&cli).unwrap().base_url.as_str().trim_end_matches('/'),
            TESTNET_BASE_URL
        );
    }

    #[test]
    fn testnet_false_selects_live_exchange() {
        let cli = parse(&["--testnet", "false"]);
        assert!(!cli.testnet);

        let config = config(&cli).unwrap();
        assert!(!config.testnet);
        assert_eq!(config.base_url.as_str().trim_end_matches('/'), LIVE_BASE_URL);
    }

    #[test]
    fn testnet_flag_requires_a_value() {
        let args = ["futures-bot", "--api-key", "k", "--api-secret", "s", "--testnet", "maybe"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn profile_and_mode_are_selectable() {
        let cli = parse(&["--profile", "basic", "check"]);
        assert_eq!(cli.profile, Profile::Basic);
        assert_eq!(cli.command, Some(Mode::Check));

        assert_eq!(parse(&["shell"]).command, Some(Mode::Shell));
    }
}
