//! Gap Reconciliation
//!
//! Merges the ledger's next acceptable nonce with the nonces already claimed
//! by in-flight transactions into the initial set of free nonces.
//!
//! ```text
//! ledger next = 5, claimed = {9, 7}
//!
//!   5   6   7   8   9   10
//!   F   F   C   F   C   F(ceiling)
//!
//! free = [5, 6, 8, 10]
//! ```
//!
//! Every value between the ledger nonce and the highest claim that is not
//! itself claimed is a gap and becomes assignable. One value above the
//! highest claim keeps the sequence open-ended.

use crate::domain::entities::Nonce;
use crate::domain::errors::ReconcileError;
use tracing::warn;

/// Compute the free nonces for an address, ascending.
///
/// `claimed` may be in any order and may contain duplicates. Claims below
/// `next` are already settled on the ledger and are ignored.
///
/// With `max_gap` set, the number of gap values (excluding the ceiling) is
/// bounded by it. `None` inserts every gap.
pub fn reconcile_free_nonces(
    next: Nonce,
    mut claimed: Vec<Nonce>,
    max_gap: Option<u64>,
) -> Result<Vec<Nonce>, ReconcileError> {
    let before = claimed.len();
    claimed.retain(|&nonce| nonce >= next);
    if claimed.len() != before {
        warn!(
            next = next,
            ignored = before - claimed.len(),
            "In-flight reader returned nonces below the ledger nonce"
        );
    }

    if claimed.is_empty() {
        return Ok(vec![next]);
    }

    claimed.sort_unstable();
    claimed.dedup();

    let Some(&highest) = claimed.last() else {
        return Ok(vec![next]);
    };

    // Distinct claims all lie in [next, highest], so this cannot underflow.
    let gaps = (highest - next) - (claimed.len() as u64 - 1);
    if let Some(max_gap) = max_gap {
        if gaps > max_gap {
            return Err(ReconcileError::GapTooLarge {
                next,
                highest,
                gaps,
                max_gap,
            });
        }
    }

    let ceiling = highest
        .checked_add(1)
        .ok_or(ReconcileError::NonceOverflow { highest })?;

    let mut free = match max_gap {
        Some(_) => Vec::with_capacity(gaps as usize + 1),
        None => Vec::new(),
    };
    let mut cursor = next;
    for &nonce in &claimed {
        free.extend(cursor..nonce);
        cursor = nonce + 1;
    }
    free.push(ceiling);

    Ok(free)
}
