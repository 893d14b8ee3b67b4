//! Core entities for the Nonce Allocation subsystem.

use serde::{Deserialize, Serialize};

/// 20-byte account address. Used only as a map key, never interpreted.
pub type Address = [u8; 20];

/// Per-address transaction sequence number.
pub type Nonce = u64;

/// Ledger state a nonce query is evaluated against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockReference {
    /// Latest state known to the ledger reader.
    #[default]
    Latest,
    /// State as of a specific block height.
    Number(u64),
}

/// Hex rendering of an address for structured log fields.
pub fn display_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}
