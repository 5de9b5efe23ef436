//! Reentry CLI - runs the reentrancy attack against a configurable ledger

use anyhow::Context;
use clap::Parser;
use tracing::info;

use reentry_attack::AttackAgent;
use reentry_ledger::{tokens, AccountId, Ledger, LedgerConfig, TransferOrdering, ONE_TOKEN};

#[derive(Parser)]
#[command(name = "reentry")]
#[command(about = "Reentry - token ledger reentrancy lab")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args)]
struct LedgerArgs {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<String>,

    /// Transfer ordering
    #[arg(long, value_enum)]
    ordering: Option<Ordering>,

    /// Disable the reentrancy guard
    #[arg(long)]
    no_guard: bool,

    /// Call-depth ceiling (1 to 256)
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Ordering {
    EffectsFirst,
    InteractionsFirst,
}

impl From<Ordering> for TransferOrdering {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::EffectsFirst => TransferOrdering::EffectsFirst,
            Ordering::InteractionsFirst => TransferOrdering::InteractionsFirst,
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Deploy a ledger and run the attack against it
    Attack {
        /// Initial supply in whole tokens
        #[arg(long, default_value_t = 20)]
        supply: u128,

        /// Amount the attacker asks for, in whole tokens
        #[arg(long, default_value_t = 1_000_000)]
        amount: u128,

        #[command(flatten)]
        ledger: LedgerArgs,
    },
    /// Print the effective ledger configuration as JSON
    Config {
        #[command(flatten)]
        ledger: LedgerArgs,
    },
}

fn resolve_config(args: &LedgerArgs) -> anyhow::Result<LedgerConfig> {
    let mut config = match &args.config {
        Some(path) => LedgerConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => LedgerConfig::default(),
    };

    if let Some(ordering) = args.ordering {
        config.ordering = ordering.into();
    }
    if args.no_guard {
        config.reentrancy_guard = false;
    }
    if let Some(depth) = args.max_depth {
        config.max_call_depth = depth;
    }

    config.validate()?;
    Ok(config)
}

fn whole(amount: u128) -> String {
    format!("{}.{:018}", amount / ONE_TOKEN, amount % ONE_TOKEN)
}

fn run_attack(supply: u128, amount: u128, config: LedgerConfig) -> anyhow::Result<()> {
    let deployer = AccountId::new("owner");
    let attacker = AccountId::new("attacker");

    let supply = tokens(supply).context("supply too large")?;
    let amount = tokens(amount).context("amount too large")?;

    let mut ledger = Ledger::with_config(supply, deployer.clone(), config)?;
    let mut agent = AttackAgent::new(attacker.clone(), "token_attack", deployer.clone());

    println!(
        "Ledger: supply {}, ordering {:?}, guard {}, max depth {}",
        whole(supply),
        ledger.config().ordering,
        ledger.config().reentrancy_guard,
        ledger.max_call_depth()
    );

    match agent.attack(&attacker, &mut ledger, amount) {
        Ok(report) => {
            println!(
                "Attack succeeded: stole {} in {} re-entries (depth {})",
                whole(report.stolen),
                report.reentries,
                report.max_depth_reached
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Err(err) => println!("Attack rejected: {}", err),
    }

    for (account, balance) in ledger.holders() {
        println!("  {:<14} {}", account, whole(balance));
    }

    match ledger.check_invariant() {
        Ok(()) => println!("Supply invariant: OK"),
        Err(err) => println!("Supply invariant: VIOLATED ({})", err),
    }

    info!("Scenario complete");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    match cli.command {
        Some(Commands::Attack {
            supply,
            amount,
            ledger,
        }) => {
            let config = resolve_config(&ledger)?;
            run_attack(supply, amount, config)?;
        }
        Some(Commands::Config { ledger }) => {
            let config = resolve_config(&ledger)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        None => {
            println!("Reentry v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}
