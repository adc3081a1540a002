// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Typed failures surfaced by the ledger engine.
///
/// Every multi-step mutation runs inside one SQLite transaction; any of
/// these errors aborts the whole operation with no partial effect.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds {
        available: Decimal,
        required: Decimal,
    },

    #[error("insufficient quantity: have {available}, need {required}")]
    InsufficientQuantity {
        available: Decimal,
        required: Decimal,
    },

    #[error("cannot reverse transaction {id}: {reason}")]
    IrreversibleDeletion { id: i64, reason: String },

    #[error("budget exceeded for category {category}: spent {spent} over cap {cap}")]
    BudgetExceeded {
        category: String,
        spent: Decimal,
        cap: Decimal,
    },

    // Deleting an active account, or an asset still held in a position.
    #[error("{0} is active or still referenced and cannot be deleted")]
    ActiveResourceProtected(String),

    #[error("deleting transaction {id} would leave the account balance negative")]
    NegativeBalance { id: i64 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("corrupt ledger value: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
