//! # Append-Only Block Log
//!
//! The canonical chain lives in `<datadir>/database/block.db` as one JSON
//! record per line:
//!
//! ```text
//! {"hash":"<64 hex>","block":{...}}
//! ```
//!
//! On-disk order is chain order. Writers only ever append; readers open a
//! fresh read-only handle per call and close it on return, so reads never
//! interfere with the state engine's append handle.
//!
//! Byte offsets of record starts are the currency of the in-memory
//! height/hash indexes: `append_record` reports the offset it wrote at,
//! `scan_records` reports the offset of every record it replays, and
//! `record_at` seeks straight back to one.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::Path;

use crate::crypto::hash::Hash;
use crate::error::ChainError;
use crate::storage::block::Block;
use crate::storage::genesis::block_db_path;

// ---------------------------------------------------------------------------
// BlockRecord
// ---------------------------------------------------------------------------

/// One line of the block log: the block keyed by its own hash.
///
/// The hash is stored redundantly so readers (and humans with `grep`)
/// can find a block without re-hashing every line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub hash: Hash,
    pub block: Block,
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Append one record to the log and return the byte offset its line
/// starts at. The caller owns the append handle; flushing happens here so
/// a crash after return cannot lose the record silently.
pub fn append_record(file: &mut File, record: &BlockRecord) -> Result<u64, ChainError> {
    let offset = file.seek(SeekFrom::End(0))?;
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    file.write_all(&line)?;
    file.flush()?;
    Ok(offset)
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Every block strictly *after* the record whose hash is `from`.
///
/// The empty hash means "from the beginning" and yields every block. A
/// hash that never appears in the log yields an empty list — callers at
/// the sync boundary treat an unknown cursor as "nothing new", not as an
/// error.
pub fn blocks_after(data_dir: &Path, from: Hash) -> Result<Vec<Block>, ChainError> {
    let file = File::open(block_db_path(data_dir))?;
    let reader = BufReader::new(file);

    let mut collecting = from.is_empty();
    let mut blocks = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let record: BlockRecord = serde_json::from_str(&line)?;

        if collecting {
            blocks.push(record.block);
        } else if record.hash == from {
            collecting = true;
        }
    }

    Ok(blocks)
}

/// Replay the whole log, yielding `(offset, record)` for every line.
/// Used once at startup to rebuild the state and its offset indexes.
pub fn scan_records(data_dir: &Path) -> Result<Vec<(u64, BlockRecord)>, ChainError> {
    let file = File::open(block_db_path(data_dir))?;
    let mut reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut offset = 0u64;
    let mut line = String::new();

    loop {
        line.clear();
        let consumed = reader.read_line(&mut line)?;
        if consumed == 0 {
            break;
        }
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            let record: BlockRecord = serde_json::from_str(trimmed)?;
            records.push((offset, record));
        }
        offset += consumed as u64;
    }

    Ok(records)
}

/// Seek to a known offset and parse the single record there.
pub fn record_at(data_dir: &Path, offset: u64) -> Result<BlockRecord, ChainError> {
    let mut file = File::open(block_db_path(data_dir))?;
    file.seek(SeekFrom::Start(offset))?;

    let mut reader = BufReader::new(file);
    let mut line = String::new();
    reader.read_line(&mut line)?;

    Ok(serde_json::from_str(line.trim_end())?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
