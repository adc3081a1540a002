// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The ledger consistency engine.
//!
//! Every public operation here runs inside one SQLite transaction: it
//! re-reads the rows it mutates, applies the delta, persists, and ends
//! with an explicit balance-propagation call chain (position value →
//! investment account totals → user balance). A typed error at any step
//! rolls the whole operation back.

pub mod balance;
pub mod budgets;
pub mod positions;
pub mod prices;
pub mod transactions;
pub mod transfers;
pub mod users;

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{
    Account, Asset, InvestmentAccount, InvestmentTransaction, Position, TradeSide,
    Transaction, TransactionKind, User,
};

/// Decimal places for monetary amounts.
pub const MONEY_DP: u32 = 2;
/// Decimal places for per-unit asset prices.
pub const PRICE_DP: u32 = 4;
/// Decimal places for held quantities.
pub const QTY_DP: u32 = 2;

/// Parses a stored decimal column. Stored values are written by this
/// engine, so a parse failure means the store is corrupt, not bad input.
pub(crate) fn dec(s: &str) -> Result<Decimal> {
    Decimal::from_str_exact(s).map_err(|_| LedgerError::Corrupt(format!("decimal '{}'", s)))
}

// round_dp never widens the scale, so pad to the canonical width when
// rendering for storage: every stored amount reads back with the same
// number of places.
pub(crate) fn money(d: Decimal) -> String {
    format!("{:.1$}", d.round_dp(MONEY_DP), MONEY_DP as usize)
}

pub(crate) fn price(d: Decimal) -> String {
    format!("{:.1$}", d.round_dp(PRICE_DP), PRICE_DP as usize)
}

pub(crate) fn qty(d: Decimal) -> String {
    format!("{:.1$}", d.round_dp(QTY_DP), QTY_DP as usize)
}

pub(crate) fn fetch_user(conn: &Connection, id: i64) -> Result<User> {
    let row = conn
        .query_row(
            "SELECT id, email, username, balance FROM users WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    let (id, email, username, balance) =
        row.ok_or_else(|| LedgerError::NotFound(format!("user {}", id)))?;
    Ok(User {
        id,
        email,
        username,
        balance: dec(&balance)?,
    })
}

pub(crate) fn fetch_account(conn: &Connection, id: i64) -> Result<Account> {
    let row = conn
        .query_row(
            "SELECT id, user_id, name, balance FROM accounts WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    let (id, user_id, name, balance) =
        row.ok_or_else(|| LedgerError::NotFound(format!("account {}", id)))?;
    Ok(Account {
        id,
        user_id,
        name,
        balance: dec(&balance)?,
    })
}

pub(crate) fn fetch_investment_account(conn: &Connection, id: i64) -> Result<InvestmentAccount> {
    let row = conn
        .query_row(
            "SELECT id, user_id, name, amount_to_invest, total_investment, balance
             FROM investment_accounts WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;
    let (id, user_id, name, to_invest, total, balance) =
        row.ok_or_else(|| LedgerError::NotFound(format!("investment account {}", id)))?;
    Ok(InvestmentAccount {
        id,
        user_id,
        name,
        amount_to_invest: dec(&to_invest)?,
        total_investment: dec(&total)?,
        balance: dec(&balance)?,
    })
}

pub(crate) fn fetch_asset(conn: &Connection, id: i64) -> Result<Asset> {
    let row = conn
        .query_row(
            "SELECT id, name, value, kind FROM assets WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    let (id, name, value, kind) =
        row.ok_or_else(|| LedgerError::NotFound(format!("asset {}", id)))?;
    Ok(Asset {
        id,
        name,
        value: dec(&value)?,
        kind,
    })
}

pub(crate) fn fetch_position(conn: &Connection, id: i64) -> Result<Position> {
    let row = conn
        .query_row(
            "SELECT id, investment_account_id, asset_id, quantity_have, total_value
             FROM positions WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;
    let (id, investment_account_id, asset_id, quantity, total) =
        row.ok_or_else(|| LedgerError::NotFound(format!("position {}", id)))?;
    Ok(Position {
        id,
        investment_account_id,
        asset_id,
        quantity_have: dec(&quantity)?,
        total_value: dec(&total)?,
    })
}

pub(crate) fn fetch_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let row = conn
        .query_row(
            "SELECT id, account_id, amount, date, description, kind, category_id
             FROM transactions WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, chrono::NaiveDate>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, Option<i64>>(6)?,
                ))
            },
        )
        .optional()?;
    let (id, account_id, amount, date, description, kind, category_id) =
        row.ok_or_else(|| LedgerError::NotFound(format!("transaction {}", id)))?;
    Ok(Transaction {
        id,
        account_id,
        amount: dec(&amount)?,
        date,
        description,
        kind: TransactionKind::parse(&kind)?,
        category_id,
    })
}

pub(crate) fn fetch_investment_transaction(
    conn: &Connection,
    id: i64,
) -> Result<InvestmentTransaction> {
    let row = conn
        .query_row(
            "SELECT id, investment_account_id, position_id, quantity, date, initial_value, side
             FROM investment_transactions WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, chrono::NaiveDate>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;
    let (id, investment_account_id, position_id, quantity, date, initial_value, side) =
        row.ok_or_else(|| LedgerError::NotFound(format!("investment transaction {}", id)))?;
    Ok(InvestmentTransaction {
        id,
        investment_account_id,
        position_id,
        quantity: dec(&quantity)?,
        date,
        initial_value: dec(&initial_value)?,
        side: TradeSide::parse(&side)?,
    })
}
