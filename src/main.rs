//! Command-line wallet.
//!
//! ```text
//! magic-sol-client [--config wallet.toml] [--rpc-url URL] [--cluster NAME]   interactive shell
//! magic-sol-client balance <address>                                 one-shot balance
//! magic-sol-client airdrop <address>                                 one-shot airdrop
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use magic_sol_client::blockchain::{NetworkRpc, SolanaRpcClient};
use magic_sol_client::config::loader::{CLUSTER_ENV_VAR, RPC_URL_ENV_VAR};
use magic_sol_client::config::{resolve_config_with, ClientConfig};
use magic_sol_client::identity::{IdentityProvider, LogoutOutcome, RelayIdentityProvider};
use magic_sol_client::observability::logging::init_logging;
use magic_sol_client::wallet::{format_sol, parse_account, AirdropRequester, BalanceService};
use magic_sol_client::WalletApp;

#[derive(Parser)]
#[command(name = "magic-sol-client")]
#[command(about = "Passwordless-email Solana wallet", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    /// Cluster the endpoint belongs to (devnet, testnet, mainnet-beta, localnet)
    #[arg(long)]
    cluster: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive wallet shell (default)
    Shell,
    /// Print the balance of any account
    Balance { address: String },
    /// Request test-network funds for any account
    Airdrop { address: String },
}

const HELP: &str = "\
commands:
  login <email>              passwordless login
  logout                     end the session
  balance                    refresh the balance
  airdrop                    request test funds
  send <address> <lamports>  transfer lamports
  status                     show the current view
  help                       this text
  quit                       exit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Flags win over the environment; both are validated with the file.
    let config = resolve_config_with(cli.config.as_deref(), |name| {
        let flag = match name {
            RPC_URL_ENV_VAR => cli.rpc_url.clone(),
            CLUSTER_ENV_VAR => cli.cluster.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(name).ok())
    })?;
    init_logging(&config.observability);

    tracing::info!(
        rpc_url = %config.network.rpc_url,
        cluster = config.network.cluster.as_str(),
        "magic-sol-client v0.1.0 starting"
    );

    let rpc: Arc<dyn NetworkRpc> = Arc::new(SolanaRpcClient::new(config.network.clone())?);

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Balance { address } => {
            let lamports = BalanceService::new(rpc).get_balance_str(&address).await?;
            println!("{}", format_sol(lamports));
        }
        Commands::Airdrop { address } => {
            let account = parse_account(&address)?;
            let balance = BalanceService::new(rpc.clone());
            let airdrop = AirdropRequester::new(rpc, balance, config.airdrop.amount_lamports);
            let lamports = airdrop.fund_and_refresh(&account).await?;
            println!("Funded. Balance: {}", format_sol(lamports));
        }
        Commands::Shell => {
            let identity: Arc<dyn IdentityProvider> =
                Arc::new(RelayIdentityProvider::new(&config.identity)?);
            run_shell(WalletApp::new(identity, rpc, &config), &config).await?;
        }
    }

    Ok(())
}

async fn run_shell(app: WalletApp, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    match app.on_startup().await {
        Ok(Some(identity)) => println!("Welcome back, {}", identity.email),
        Ok(None) => println!("Not logged in. Type `login <email>`."),
        Err(e) => eprintln!("Session check failed: {}", e),
    }
    println!("Cluster: {} ({})", config.network.cluster.as_str(), config.network.rpc_url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        match (command, args.as_slice()) {
            ("login", [email]) => {
                println!("Check your inbox for a login link...");
                match app.on_login(email).await {
                    Ok(identity) => {
                        println!("Logged in as {} ({})", identity.email, identity.account_address)
                    }
                    Err(e) => eprintln!("Login failed: {}", e),
                }
            }
            ("logout", []) => match app.on_logout().await {
                LogoutOutcome::Clean => println!("Logged out"),
                LogoutOutcome::LocalOnly(e) => println!("Logged out locally (provider: {})", e),
            },
            ("balance", []) => match app.on_refresh_balance().await {
                Ok(lamports) => println!("{}", format_sol(lamports)),
                Err(e) => eprintln!("Balance failed: {}", e),
            },
            ("airdrop", []) => {
                println!("Requesting airdrop...");
                match app.on_request_funds().await {
                    Ok(lamports) => println!("Funded. Balance: {}", format_sol(lamports)),
                    Err(e) => eprintln!("Airdrop failed: {}", e),
                }
            }
            ("send", [destination, amount]) => {
                match app.on_send_transaction(destination, amount).await {
                    Ok(id) => {
                        println!("Submitted: {}", app.explorer_link(&id));
                        if let Some(warning) = app.view().warning {
                            println!("Warning: {}", warning);
                        }
                    }
                    Err(e) if e.requires_full_retry() => {
                        eprintln!("Transfer expired before submission; run `send` again")
                    }
                    Err(e) => eprintln!("Transfer failed: {}", e),
                }
            }
            ("status", []) => print_status(&app),
            ("help", []) => println!("{}", HELP),
            ("quit", []) | ("exit", []) => break,
            _ => println!("Unrecognized command. Type `help`."),
        }
    }

    Ok(())
}

fn print_status(app: &WalletApp) {
    let view = app.view();
    match (&view.email, &view.address) {
        (Some(email), Some(address)) => println!("{} ({})", email, address),
        _ => println!("Not logged in"),
    }
    if let Some(balance) = view.balance_display() {
        println!("Balance: {}", balance);
    }
    if let Some(id) = &view.last_transfer {
        println!("Last transfer: {}", app.explorer_link(id));
    }
    if let Some(warning) = &view.warning {
        println!("Warning: {}", warning);
    }
    if let Some(error) = &view.last_error {
        println!("Last error: {}", error);
    }
}
