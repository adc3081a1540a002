// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance propagation: recomputes derived balances after a mutation.
//!
//! Callers invoke these inside the same transaction as the mutation that
//! made them necessary, leaf first: position, then investment account,
//! then user.

use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use super::{dec, fetch_asset, fetch_investment_account, fetch_position, money};
use crate::error::Result;

/// Recomputes `total_value = quantity_have * asset.value` for one position.
pub fn recompute_position(conn: &Connection, position_id: i64) -> Result<Decimal> {
    let position = fetch_position(conn, position_id)?;
    let asset = fetch_asset(conn, position.asset_id)?;
    let total_value = (position.quantity_have * asset.value).round_dp(super::MONEY_DP);
    conn.execute(
        "UPDATE positions SET total_value=?1 WHERE id=?2",
        params![money(total_value), position_id],
    )?;
    Ok(total_value)
}

/// Recomputes `total_investment` as the sum of the account's position
/// values and `balance = amount_to_invest + total_investment`.
pub fn recompute_investment_account(conn: &Connection, account_id: i64) -> Result<Decimal> {
    let account = fetch_investment_account(conn, account_id)?;

    let mut stmt = conn
        .prepare_cached("SELECT total_value FROM positions WHERE investment_account_id=?1")?;
    let mut rows = stmt.query(params![account_id])?;
    let mut total_investment = Decimal::ZERO;
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        total_investment += dec(&value)?;
    }

    let balance = account.amount_to_invest + total_investment;
    conn.execute(
        "UPDATE investment_accounts SET total_investment=?1, balance=?2 WHERE id=?3",
        params![money(total_investment), money(balance), account_id],
    )?;
    Ok(balance)
}

/// Recomputes `User.balance` as the sum of every owned account's balance,
/// cash and investment alike.
pub fn recompute_user_balance(conn: &Connection, user_id: i64) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for sql in [
        "SELECT balance FROM accounts WHERE user_id=?1",
        "SELECT balance FROM investment_accounts WHERE user_id=?1",
    ] {
        let mut stmt = conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params![user_id])?;
        while let Some(row) = rows.next()? {
            let balance: String = row.get(0)?;
            total += dec(&balance)?;
        }
    }
    conn.execute(
        "UPDATE users SET balance=?1 WHERE id=?2",
        params![money(total), user_id],
    )?;
    Ok(total)
}
