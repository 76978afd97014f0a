//! # HTTP API
//!
//! The axum router exposing the node to wallets and peers. A thin
//! adapter: handlers parse, call an orchestrator method, and translate
//! the result. State-engine error kinds come back as `400` with
//! `{"error": "<message>"}`; read-side I/O failures as `500`.
//!
//! | Method | Path             | Semantics                                |
//! |--------|------------------|------------------------------------------|
//! | GET    | `/balances/list` | Tip hash + every balance                 |
//! | POST   | `/tx/add`        | Sign via keystore, admit to the mempool  |
//! | GET    | `/node/status`   | Tip, peers, pending transactions         |
//! | GET    | `/node/sync`     | Blocks after `?fromBlock=<hex>`          |
//! | GET    | `/node/peer`     | Register a peer (`?ip&port&miner`)       |
//! | GET    | `/block/{id}`    | Block by decimal height or hex hash      |
//! | GET    | `/mempool/`      | The pending pool as a map                |

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cinder_protocol::config::{DEFAULT_TX_GAS, DEFAULT_TX_GAS_PRICE};
use cinder_protocol::crypto::address::Address;
use cinder_protocol::crypto::hash::Hash;
use cinder_protocol::error::ChainError;
use cinder_protocol::keystore;
use cinder_protocol::network::node::{Node, PeerNode};
use cinder_protocol::storage::blocks_after;
use cinder_protocol::storage::block::Block;
use cinder_protocol::storage::log::BlockRecord;
use cinder_protocol::transaction::types::{SignedTx, Tx};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<Node>,
}

/// Build the full router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_headers(Any);

    Router::new()
        .route("/balances/list", get(list_balances))
        .route("/tx/add", post(add_tx))
        .route("/node/status", get(node_status))
        .route("/node/sync", get(sync_blocks))
        .route("/node/peer", get(add_peer))
        .route("/block/{id}", get(block_by_number_or_hash))
        .route("/mempool/", get(mempool_view))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ErrRes {
    error: String,
}

#[derive(Serialize)]
struct BalancesRes {
    block_hash: Hash,
    balances: HashMap<Address, u64>,
}

#[derive(Deserialize)]
struct TxAddReq {
    from: String,
    #[serde(default)]
    from_pwd: String,
    to: String,
    #[serde(default)]
    gas: u64,
    #[serde(rename = "gasPrice", default)]
    gas_price: u64,
    #[serde(default)]
    value: u64,
    #[serde(default)]
    data: String,
}

#[derive(Serialize)]
struct TxAddRes {
    success: bool,
}

#[derive(Serialize)]
struct StatusRes {
    block_hash: Hash,
    block_number: u64,
    peers_known: HashMap<String, PeerNode>,
    pending_txs: Vec<SignedTx>,
}

#[derive(Deserialize)]
struct SyncParams {
    #[serde(rename = "fromBlock", default)]
    from_block: String,
}

#[derive(Serialize)]
struct SyncRes {
    blocks: Vec<Block>,
}

#[derive(Deserialize)]
struct AddPeerParams {
    ip: String,
    port: u64,
    #[serde(default)]
    miner: String,
}

#[derive(Serialize)]
struct AddPeerRes {
    success: bool,
    error: String,
}

// ---------------------------------------------------------------------------
// Error translation
// ---------------------------------------------------------------------------

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrRes {
            error: message.into(),
        }),
    )
        .into_response()
}

fn chain_error(err: ChainError) -> Response {
    let status = if err.is_io() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    (
        status,
        Json(ErrRes {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /balances/list` — the tip hash and every balance, snapshotted
/// together so the pair is consistent.
async fn list_balances(State(state): State<AppState>) -> Response {
    let (block_hash, balances) = state.node.balances_snapshot();
    Json(BalancesRes {
        block_hash,
        balances,
    })
    .into_response()
}

/// `POST /tx/add` — build a transfer, sign it via the keystore, and
/// admit it to the mempool. Gas fields default when absent or zero; the
/// nonce is assigned from the pending state so queued transfers chain.
async fn add_tx(State(state): State<AppState>, Json(req): Json<TxAddReq>) -> Response {
    let from: Address = match req.from.parse() {
        Ok(addr) => addr,
        Err(_) => return bad_request(format!("{} is an invalid 'from' sender", req.from)),
    };
    if from.is_zero() {
        return bad_request(format!("{} is an invalid 'from' sender", from));
    }
    let to: Address = match req.to.parse() {
        Ok(addr) => addr,
        Err(_) => return bad_request(format!("{} is an invalid 'to' recipient", req.to)),
    };
    if req.from_pwd.is_empty() {
        return bad_request(format!(
            "password to decrypt the {from} account is required, 'from_pwd' is empty"
        ));
    }

    let gas = if req.gas == 0 { DEFAULT_TX_GAS } else { req.gas };
    let gas_price = if req.gas_price == 0 {
        DEFAULT_TX_GAS_PRICE
    } else {
        req.gas_price
    };

    let nonce = state.node.next_account_nonce(&from);
    let tx = Tx::with_gas(from, to, req.value, nonce, req.data, gas, gas_price);

    let signed =
        match keystore::sign_tx_with_account(&state.node.data_dir(), tx, &from, &req.from_pwd) {
            Ok(signed) => signed,
            Err(err) => return bad_request(err.to_string()),
        };

    match state.node.add_pending_tx(signed, state.node.info()) {
        Ok(()) => Json(TxAddRes { success: true }).into_response(),
        Err(err) => chain_error(err),
    }
}

/// `GET /node/status` — tip, known peers, and the pending pool. Peers
/// use this to decide whether to fetch blocks.
async fn node_status(State(state): State<AppState>) -> Response {
    Json(StatusRes {
        block_hash: state.node.latest_hash(),
        block_number: state.node.latest_number(),
        peers_known: state.node.known_peers(),
        pending_txs: state.node.pending_txs(),
    })
    .into_response()
}

/// `GET /node/sync?fromBlock=<hex>` — every block after the given hash,
/// straight off the block log. An empty cursor means "from genesis".
async fn sync_blocks(State(state): State<AppState>, Query(params): Query<SyncParams>) -> Response {
    let from = if params.from_block.is_empty() {
        Hash::empty()
    } else {
        match Hash::from_hex(&params.from_block) {
            Ok(hash) => hash,
            Err(err) => return bad_request(err.to_string()),
        }
    };

    match blocks_after(&state.node.data_dir(), from) {
        Ok(blocks) => Json(SyncRes { blocks }).into_response(),
        Err(err) => chain_error(err),
    }
}

/// `GET /node/peer?ip=..&port=..&miner=..` — register a peer.
async fn add_peer(State(state): State<AppState>, Query(params): Query<AddPeerParams>) -> Response {
    let account: Address = match params.miner.parse() {
        Ok(addr) => addr,
        Err(err) => {
            return Json(AddPeerRes {
                success: false,
                error: err.to_string(),
            })
            .into_response()
        }
    };

    let peer = PeerNode::new(params.ip, params.port, false, account);
    state.node.add_peer(peer);

    Json(AddPeerRes {
        success: true,
        error: String::new(),
    })
    .into_response()
}

/// `GET /block/{id}` — seek by height if `id` parses as a decimal
/// number, otherwise treat it as a hex hash.
async fn block_by_number_or_hash(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let id = id.trim();
    if id.is_empty() {
        return bad_request("height or hash param is required");
    }

    let result: Result<BlockRecord, ChainError> = match id.parse::<u64>() {
        Ok(height) => state.node.block_by_height(height),
        Err(_) => match Hash::from_hex(id) {
            Ok(hash) => state.node.block_by_hash(&hash),
            Err(err) => return bad_request(err.to_string()),
        },
    };

    match result {
        Ok(record) => Json(record).into_response(),
        Err(err) => chain_error(err),
    }
}

/// `GET /mempool/` — the current pending pool keyed by tx hash.
async fn mempool_view(State(state): State<AppState>) -> Response {
    Json(state.node.mempool_map()).into_response()
}
