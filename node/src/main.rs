// Copyright (c) 2026 Cinder Labs. MIT License.
// See LICENSE for details.

//! # Cinder Node
//!
//! Entry point for the `cinder-node` binary. Parses CLI arguments,
//! initializes logging, loads the chain, and runs the mining loop next
//! to the HTTP API until a shutdown signal arrives.
//!
//! Subcommands:
//!
//! - `run`      — start the node (mining loop + HTTP API)
//! - `init`     — initialize the data directory, optionally create an account
//! - `balances` — print every balance from the local chain
//! - `version`  — print build version information

mod api;
mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use cinder_protocol::config::DEFAULT_MINER;
use cinder_protocol::crypto::address::Address;
use cinder_protocol::keystore;
use cinder_protocol::network::node::{Node, NodeConfig, PeerNode};
use cinder_protocol::storage::genesis::init_datadir;
use cinder_protocol::storage::state::State;
use cinder_protocol::storage::load_genesis;

use cli::{resolve_data_dir, CinderNodeCli, Commands};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CinderNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Balances(args) => list_balances(args),
        Commands::Version => {
            println!("cinder-node {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Start the full node: chain state, mining loop, HTTP API.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        &format!("cinder_node={0},cinder_protocol={0}", args.log_level),
        LogFormat::from_str_lossy(&args.log_format),
    );

    let data_dir = resolve_data_dir(&args.data_dir);

    let miner: Address = args
        .miner
        .as_deref()
        .unwrap_or(DEFAULT_MINER)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid --miner address: {e}"))?;

    let mut config = NodeConfig::new(&data_dir, miner);
    config.mining_difficulty = args.difficulty;
    if let Some(bootstrap) = &args.bootstrap {
        config.bootstrap = Some(parse_bootstrap(
            bootstrap,
            args.bootstrap_account.as_deref(),
        )?);
    }

    tracing::info!(
        data_dir = %data_dir.display(),
        http_addr = %args.http_addr,
        miner = %miner,
        difficulty = args.difficulty,
        "starting cinder-node"
    );

    let node = Node::new(config).with_context(|| {
        format!("failed to load chain state from {}", data_dir.display())
    })?;

    tracing::info!(
        height = node.latest_number(),
        hash = %node.latest_hash(),
        "blockchain state ready"
    );

    let mining_loop = tokio::spawn(Arc::clone(&node).run_mining_loop());

    let router = api::create_router(api::AppState {
        node: Arc::clone(&node),
    });
    let listener = tokio::net::TcpListener::bind(&args.http_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", args.http_addr))?;
    tracing::info!("HTTP API listening on {}", args.http_addr);

    // A signal cancels the node's root token; the server drains on the
    // same token so both halves stop together.
    let signal_node = Arc::clone(&node);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received");
        signal_node.shutdown();
    });

    let serve_token = node.cancel_token();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { serve_token.cancelled().await })
        .await
        .context("HTTP server error")?;

    match mining_loop.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(err).context("mining loop failed"),
        Err(join_err) => return Err(join_err).context("mining loop panicked"),
    }

    tracing::info!("cinder-node stopped");
    Ok(())
}

/// Initialize the data directory; optionally create a keystore account.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("cinder_node=info", LogFormat::Pretty);

    let data_dir = resolve_data_dir(&args.data_dir);
    init_datadir(&data_dir)
        .with_context(|| format!("failed to initialize {}", data_dir.display()))?;

    println!("Data directory initialized at {}", data_dir.display());

    if let Some(password) = &args.password {
        let address = keystore::new_account(&data_dir, password)
            .context("failed to create keystore account")?;
        println!("New account: {address}");
    }

    Ok(())
}

/// Print every balance from the local chain, genesis plus all blocks.
fn list_balances(args: cli::BalancesArgs) -> Result<()> {
    let data_dir = resolve_data_dir(&args.data_dir);

    let state = State::new_from_disk(&data_dir, cinder_protocol::config::DEFAULT_MINING_DIFFICULTY)
        .with_context(|| format!("failed to load chain state from {}", data_dir.display()))?;
    let genesis = load_genesis(&data_dir)?;

    println!("Account balances at {}:", state.latest_hash());

    let mut balances: Vec<_> = state.balances().iter().collect();
    balances.sort_by_key(|(addr, _)| **addr);
    for (address, balance) in balances {
        println!("  {address}: {balance} {}", genesis.symbol);
    }

    Ok(())
}

/// Parse `ip:port` plus an optional mining account into a [`PeerNode`].
fn parse_bootstrap(addr: &str, account: Option<&str>) -> Result<PeerNode> {
    let (ip, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("bootstrap must be ip:port, got {addr}"))?;
    let port: u64 = port
        .parse()
        .map_err(|e| anyhow::anyhow!("bad bootstrap port: {e}"))?;
    let account: Address = account
        .unwrap_or(DEFAULT_MINER)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bootstrap account: {e}"))?;
    Ok(PeerNode::new(ip, port, true, account))
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bootstrap_splits_ip_and_port() {
        let peer = parse_bootstrap("10.0.0.5:8080", None).unwrap();
        assert_eq!(peer.ip, "10.0.0.5");
        assert_eq!(peer.port, 8080);
        assert!(peer.is_bootstrap);
        assert!(peer.account.is_zero());
    }

    #[test]
    fn parse_bootstrap_with_account() {
        let peer = parse_bootstrap(
            "10.0.0.5:8080",
            Some("0x23ba76a8aeb6080115c4e71bb598ab5094432d8c"),
        )
        .unwrap();
        assert!(!peer.account.is_zero());
    }

    #[test]
    fn parse_bootstrap_rejects_bare_host() {
        assert!(parse_bootstrap("10.0.0.5", None).is_err());
    }
}
