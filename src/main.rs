use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fss_update::config::{self, Paths};
use tracing_subscriber::EnvFilter;

mod client;
mod server;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Working directory holding keys/, data/ and results/
    #[arg(long, env = "FSS_ROOT", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a record table stored as two additive shares
    GenData {
        #[arg(short, long, default_value_t = config::DEFAULT_RECORD_COUNT)]
        count: u64,
    },
    /// Deal point-function keys that add `delta` to record `id`
    GenKey {
        #[arg(long)]
        id: u64,
        #[arg(long, allow_negative_numbers = true)]
        delta: i64,
        #[arg(long, default_value_t = config::DEFAULT_NUM_BITS)]
        num_bits: u32,
    },
    /// Apply this server's update share to its record share
    Update {
        #[arg(long, env = "SERVER_ID")]
        server_id: usize,
    },
    /// Evaluate this server's key at `x` and persist the share
    Query {
        #[arg(long, env = "SERVER_ID")]
        server_id: usize,
        #[arg(short)]
        x: u64,
    },
    /// Combine both persisted query shares
    Restore,
    /// Combine both record shares into the plaintext table
    Reconcile {
        /// Write the table here instead of printing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let paths = Paths::new(&cli.root);

    match cli.command {
        Commands::GenData { count } => client::run_gen_data(&paths, count)?,
        Commands::GenKey { id, delta, num_bits } => {
            client::run_gen_key(&paths, id, delta, num_bits)?
        }
        Commands::Update { server_id } => server::run_update(&paths, server_id)?,
        Commands::Query { server_id, x } => server::run_query(&paths, server_id, x)?,
        Commands::Restore => client::run_restore(&paths)?,
        Commands::Reconcile { out } => client::run_reconcile(&paths, out.as_deref())?,
    }
    Ok(())
}
