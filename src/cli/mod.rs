use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cosign::host::SystemClock;
use cosign::transaction::Checksum256;
use cosign::{Name, PermissionLevel};

pub mod actions;
pub mod build_tx;
pub mod config;
pub mod inspect;
pub mod logging;
pub mod state_file;
pub mod version;

use actions::Operation;
use config::CosignConfig;

#[derive(Parser)]
#[command(name = "cosign")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Propose, approve and execute multi-signature transactions", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.local/share/cosign/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init {
        /// State file location to record in the config
        #[arg(long)]
        state_path: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Build a packed transaction file
    BuildTx {
        /// Output file
        #[arg(long, short)]
        output: PathBuf,

        /// Lifetime from now, e.g. "1h" or "3days"
        #[arg(long, default_value = "1h")]
        expires_in: String,

        /// Delay applied when the transaction is scheduled
        #[arg(long, default_value_t = 0)]
        delay_sec: u32,

        /// account:name:actor@perm,actor@perm[:hexdata] (repeatable)
        #[arg(long = "action", required = true)]
        actions: Vec<String>,
    },

    /// Store a transaction and the authorities asked to approve it
    Propose {
        #[arg(long)]
        proposer: Name,

        #[arg(long)]
        name: Name,

        /// Authority asked to approve (repeatable)
        #[arg(long = "requested")]
        requested: Vec<PermissionLevel>,

        /// Packed transaction file (see build-tx)
        #[arg(long)]
        trx: PathBuf,

        /// Authority the caller holds (repeatable)
        #[arg(long = "auth")]
        auth: Vec<PermissionLevel>,
    },

    /// Grant one requested approval
    Approve {
        #[arg(long)]
        proposer: Name,

        #[arg(long)]
        name: Name,

        /// Authority granting the approval
        #[arg(long)]
        level: PermissionLevel,

        /// Expected hex SHA-256 of the packed transaction
        #[arg(long)]
        hash: Option<Checksum256>,

        #[arg(long = "auth")]
        auth: Vec<PermissionLevel>,
    },

    /// Withdraw a granted approval
    Unapprove {
        #[arg(long)]
        proposer: Name,

        #[arg(long)]
        name: Name,

        #[arg(long)]
        level: PermissionLevel,

        #[arg(long = "auth")]
        auth: Vec<PermissionLevel>,
    },

    /// Delete a proposal (anyone may, once it has expired)
    Cancel {
        #[arg(long)]
        proposer: Name,

        #[arg(long)]
        name: Name,

        #[arg(long)]
        canceler: Name,

        #[arg(long = "auth")]
        auth: Vec<PermissionLevel>,
    },

    /// Schedule an approved proposal for execution
    Exec {
        #[arg(long)]
        proposer: Name,

        #[arg(long)]
        name: Name,

        /// Account paying for the deferred run
        #[arg(long)]
        executer: Name,

        #[arg(long = "auth")]
        auth: Vec<PermissionLevel>,
    },

    /// Void every approval an account has granted so far
    Invalidate {
        #[arg(long)]
        account: Name,

        #[arg(long = "auth")]
        auth: Vec<PermissionLevel>,
    },

    /// Show one proposal
    Show {
        #[arg(long)]
        proposer: Name,

        #[arg(long)]
        name: Name,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List proposals
    List {
        /// Only proposals by this account
        #[arg(long)]
        proposer: Option<Name>,
    },

    /// Show the deferred execution queue
    Queue {
        /// Remove and print entries whose delay has elapsed
        #[arg(long)]
        take_due: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);

    if let Commands::Init { state_path, force } = &cli.command {
        if config_path.exists() && !*force {
            return Err(format!(
                "Config file '{}' already exists (use --force to overwrite)",
                config_path.display()
            )
            .into());
        }
        let state_path = state_path
            .clone()
            .unwrap_or_else(config::default_state_path);
        CosignConfig::create_default(&config_path, &state_path)?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }

    let config = CosignConfig::load_or_default(&config_path)?;
    logging::init(&config.logging)?;
    let state_path = config.state.path;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::BuildTx {
            output,
            expires_in,
            delay_sec,
            actions,
        } => build_tx::execute(&output, &expires_in, delay_sec, &actions),
        Commands::Propose {
            proposer,
            name,
            requested,
            trx,
            auth,
        } => {
            let op = Operation::Propose {
                proposer,
                proposal_name: name,
                requested,
                trx_file: trx,
            };
            actions::execute(&state_path, SystemClock, auth, op).await
        }
        Commands::Approve {
            proposer,
            name,
            level,
            hash,
            auth,
        } => {
            let op = Operation::Approve {
                proposer,
                proposal_name: name,
                level,
                hash,
            };
            actions::execute(&state_path, SystemClock, auth, op).await
        }
        Commands::Unapprove {
            proposer,
            name,
            level,
            auth,
        } => {
            let op = Operation::Unapprove {
                proposer,
                proposal_name: name,
                level,
            };
            actions::execute(&state_path, SystemClock, auth, op).await
        }
        Commands::Cancel {
            proposer,
            name,
            canceler,
            auth,
        } => {
            let op = Operation::Cancel {
                proposer,
                proposal_name: name,
                canceler,
            };
            actions::execute(&state_path, SystemClock, auth, op).await
        }
        Commands::Exec {
            proposer,
            name,
            executer,
            auth,
        } => {
            let op = Operation::Exec {
                proposer,
                proposal_name: name,
                executer,
            };
            actions::execute(&state_path, SystemClock, auth, op).await
        }
        Commands::Invalidate { account, auth } => {
            actions::execute(&state_path, SystemClock, auth, Operation::Invalidate { account })
                .await
        }
        Commands::Show {
            proposer,
            name,
            json,
        } => inspect::show(&state_path, proposer, name, json),
        Commands::List { proposer } => inspect::list(&state_path, proposer),
        Commands::Queue { take_due } => inspect::queue(&state_path, SystemClock, take_due).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
