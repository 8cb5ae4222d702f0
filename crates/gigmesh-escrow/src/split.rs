//! Payout split policy
//!
//! The only place in the workspace that knows who gets what. Minor shares
//! are floored and the remainder goes to the principal recipient, so every
//! split sums exactly to the escrow amount.

use crate::EscrowConfig;
use gigmesh_types::{AccountId, Amount, Result};
use serde::{Deserialize, Serialize};

/// Platform fee on released escrows, in basis points
pub const TREASURY_FEE_BPS: u32 = 400;

/// Juror-pool allocation on releases and adjudicated refunds, in basis points
pub const JUROR_POOL_FEE_BPS: u32 = 100;

/// One leg of a payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub to: AccountId,
    pub amount: Amount,
}

/// Split for a released escrow: worker 95%, treasury 4%, juror pool 1%
pub fn release_split(
    amount: Amount,
    worker: AccountId,
    config: &EscrowConfig,
) -> Result<Vec<Split>> {
    let treasury_cut = amount.basis_points(TREASURY_FEE_BPS)?;
    let juror_cut = amount.basis_points(JUROR_POOL_FEE_BPS)?;
    let worker_share = amount.checked_sub(treasury_cut)?.checked_sub(juror_cut)?;

    Ok(nonzero(vec![
        Split {
            to: worker,
            amount: worker_share,
        },
        Split {
            to: config.treasury,
            amount: treasury_cut,
        },
        Split {
            to: config.juror_pool,
            amount: juror_cut,
        },
    ]))
}

/// Split for a refund ordered by a dispute verdict: poster 99%, juror pool 1%
pub fn disputed_refund_split(
    amount: Amount,
    poster: AccountId,
    config: &EscrowConfig,
) -> Result<Vec<Split>> {
    let juror_cut = amount.basis_points(JUROR_POOL_FEE_BPS)?;
    let poster_share = amount.checked_sub(juror_cut)?;

    Ok(nonzero(vec![
        Split {
            to: poster,
            amount: poster_share,
        },
        Split {
            to: config.juror_pool,
            amount: juror_cut,
        },
    ]))
}

/// Split for a refund outside any dispute: everything back to the poster
pub fn refund_split(amount: Amount, poster: AccountId) -> Vec<Split> {
    vec![Split { to: poster, amount }]
}

fn nonzero(splits: Vec<Split>) -> Vec<Split> {
    splits.into_iter().filter(|s| !s.amount.is_zero()).collect()
}
