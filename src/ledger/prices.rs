// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Asset price refresh and revaluation.
//!
//! The engine consumes a sequence of (name, price) pairs and knows
//! nothing about the feed's wire format; the HTTP fetch lives with the
//! CLI. A revaluation moves no funds, it only rewrites derived values.

use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{LedgerError, Result};
use super::{balance, price};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub name: String,
    pub price: Decimal,
}

/// Upserts assets by name and propagates the new prices through every
/// affected position, investment account and user. One transaction: a
/// bad quote aborts the whole refresh and leaves the ledger untouched.
pub fn refresh_asset_prices(
    conn: &mut Connection,
    quotes: impl IntoIterator<Item = PriceQuote>,
) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut touched_assets: Vec<i64> = Vec::new();
    let mut updated = 0usize;

    for quote in quotes {
        if quote.name.trim().is_empty() {
            return Err(LedgerError::InvalidInput("asset name is empty".into()));
        }
        if quote.price < Decimal::ZERO {
            return Err(LedgerError::InvalidInput(format!(
                "negative price for asset '{}'",
                quote.name
            )));
        }
        tx.execute(
            "INSERT INTO assets(name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value=excluded.value",
            params![quote.name.trim(), price(quote.price)],
        )?;
        let asset_id: i64 = tx.query_row(
            "SELECT id FROM assets WHERE name=?1",
            params![quote.name.trim()],
            |r| r.get(0),
        )?;
        touched_assets.push(asset_id);
        updated += 1;
    }

    // Revalue only what the feed touched.
    let mut accounts: BTreeSet<i64> = BTreeSet::new();
    for asset_id in touched_assets {
        let mut stmt = tx.prepare_cached(
            "SELECT id, investment_account_id FROM positions WHERE asset_id=?1",
        )?;
        let mut rows = stmt.query(params![asset_id])?;
        while let Some(row) = rows.next()? {
            let position_id: i64 = row.get(0)?;
            let account_id: i64 = row.get(1)?;
            balance::recompute_position(&tx, position_id)?;
            accounts.insert(account_id);
        }
    }
    let mut users: BTreeSet<i64> = BTreeSet::new();
    for account_id in accounts {
        balance::recompute_investment_account(&tx, account_id)?;
        let user_id: i64 = tx.query_row(
            "SELECT user_id FROM investment_accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )?;
        users.insert(user_id);
    }
    for user_id in users {
        balance::recompute_user_balance(&tx, user_id)?;
    }

    tx.commit()?;
    Ok(updated)
}
