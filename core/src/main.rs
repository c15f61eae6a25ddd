//! A thin demonstration CLI for the consensus arithmetic library. It
//! performs no independent consensus logic of its own — every subcommand
//! is a direct call into `zion_core`.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zion_core::blockchain::{difficulty, pow, reward};
use zion_core::checkpoints::{CheckpointRegistry, CheckpointVerdict};
use zion_core::fork;
use zion_core::network::NetworkType;
use zion_core::types::Hash256;

#[derive(Parser, Debug)]
#[command(author, version, about = "ZION consensus arithmetic CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up the protocol version active at a given height.
    VersionAt {
        #[arg(long, default_value = "mainnet")]
        network: String,
        #[arg(long)]
        height: u64,
    },
    /// Check whether a hash meets a difficulty target.
    CheckHash {
        #[arg(long)]
        hash: String,
        #[arg(long)]
        difficulty: u64,
    },
    /// Compute the difficulty the next block must satisfy, from a JSON
    /// array of `{"timestamp": u64, "cumulative_difficulty": u128}` rows,
    /// ordered oldest-first.
    NextDifficulty {
        #[arg(long, default_value = "mainnet")]
        network: String,
        #[arg(long)]
        version: u8,
        #[arg(long)]
        window: PathBuf,
    },
    /// Checkpoint operations.
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },
}

#[derive(Subcommand, Debug)]
enum CheckpointAction {
    /// Validate a candidate `(height, hash)` against the registry.
    Check {
        #[arg(long, default_value = "mainnet")]
        network: String,
        #[arg(long)]
        height: u64,
        #[arg(long)]
        hash: String,
        /// Optional JSON file of additional checkpoints to load first.
        #[arg(long)]
        json: Option<PathBuf>,
        /// Also query the network's compiled-in DNS TXT sources.
        #[arg(long, default_value_t = false)]
        dns: bool,
    },
}

#[derive(serde::Deserialize)]
struct WindowRow {
    timestamp: u64,
    cumulative_difficulty: u128,
}

fn parse_network(s: &str) -> NetworkType {
    NetworkType::from_str(s).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::VersionAt { network, height } => {
            let net = parse_network(&network);
            let version = fork::version_at(net, height);
            Ok(format!("protocol version {version} at height {height} on {net}"))
        }
        Command::CheckHash { hash, difficulty } => match hash.parse::<Hash256>() {
            Ok(h) => {
                let ok = pow::check_hash(&h, difficulty);
                Ok(format!("check_hash({hash}, {difficulty}) = {ok}"))
            }
            Err(e) => Err(e.to_string()),
        },
        Command::NextDifficulty {
            network,
            version,
            window,
        } => run_next_difficulty(parse_network(&network), version, &window),
        Command::Checkpoint { action } => run_checkpoint(action).await,
    };

    match result {
        Ok(line) => println!("{line}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn run_next_difficulty(net: NetworkType, version: u8, window_path: &PathBuf) -> Result<String, String> {
    let raw = std::fs::read_to_string(window_path).map_err(|e| e.to_string())?;
    let rows: Vec<WindowRow> = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    let timestamps: Vec<u64> = rows.iter().map(|r| r.timestamp).collect();
    let cumdiffs: Vec<u128> = rows.iter().map(|r| r.cumulative_difficulty).collect();
    let next = difficulty::difficulty_next(net, version, &timestamps, &cumdiffs);
    Ok(format!("next difficulty = {next}"))
}

async fn run_checkpoint(action: CheckpointAction) -> Result<String, String> {
    match action {
        CheckpointAction::Check {
            network,
            height,
            hash,
            json,
            dns,
        } => {
            let net = parse_network(&network);
            let registry = CheckpointRegistry::new();
            registry.init_default(net);
            if let Some(path) = json {
                registry
                    .load_from_json(&path)
                    .map_err(|e| e.to_string())?;
            }
            if dns {
                let _ = registry.load_from_dns(net).await;
            }

            let candidate: Hash256 = hash.parse().map_err(|e: zion_core::types::InvalidHexHash| e.to_string())?;
            match registry.check_block(height, candidate) {
                Ok(CheckpointVerdict::Matched) => Ok(format!("checkpoint at {height} matched")),
                Ok(CheckpointVerdict::NotPinned) => Ok(format!("height {height} is not checkpointed")),
                Err(e) => Err(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_version_at() {
        let cli = Cli::try_parse_from(["zion-consensus-cli", "version-at", "--network", "mainnet", "--height", "400000"]).unwrap();
        matches!(cli.command, Command::VersionAt { .. });
    }
}
