use clap::{Parser, Subcommand};
use std::path::PathBuf;
use checkpoint_cli::commands::{encode, inspect, power, timeline};
use checkpoint_cli::telemetry::init_telemetry;

#[derive(Parser)]
#[command(name = "ckpt")]
#[command(about = "Checkpoint Kernel CLI - build, inspect and query vote-power command logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON command script into a binary command log
    Encode {
        script_path: PathBuf,
        out_path: PathBuf,
    },
    /// Show header, checksum status and final state hash of a command log
    Inspect {
        log_path: PathBuf,
    },
    /// Replay a log and print vote power for every known address
    Power {
        log_path: PathBuf,

        /// Position to query (defaults to the final position)
        #[arg(long, short)]
        at: Option<u64>,

        /// Optional JSON kernel config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List commands with the position they apply at
    Timeline {
        log_path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_telemetry();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { script_path, out_path } => encode::run(&script_path, &out_path),
        Commands::Inspect { log_path } => inspect::run(&log_path),
        Commands::Power { log_path, at, config } => power::run(&log_path, at, config.as_deref()),
        Commands::Timeline { log_path } => timeline::run(&log_path),
    }
}
