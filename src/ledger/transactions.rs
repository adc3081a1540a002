// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cash transaction lifecycle: create, update, delete.
//!
//! Each operation applies its balance delta to the account, updates the
//! budget for categorized expenses, and propagates to the user balance,
//! all inside one transaction.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use super::{balance, budgets, fetch_account, fetch_transaction, money};
use crate::error::{LedgerError, Result};
use crate::models::{Transaction, TransactionKind};

pub fn create_transaction(
    conn: &mut Connection,
    account_id: i64,
    amount: Decimal,
    kind: TransactionKind,
    category_id: Option<i64>,
    date: NaiveDate,
    description: &str,
) -> Result<Transaction> {
    let tx = conn.transaction()?;
    let created = create_in_tx(&tx, account_id, amount, kind, category_id, date, description)?;
    tx.commit()?;
    Ok(created)
}

/// Creation step shared with the transfer orchestrator, which composes
/// two of these in a single transaction.
pub(crate) fn create_in_tx(
    conn: &Connection,
    account_id: i64,
    amount: Decimal,
    kind: TransactionKind,
    category_id: Option<i64>,
    date: NaiveDate,
    description: &str,
) -> Result<Transaction> {
    // Round first: an amount below half a cent must not slip through the
    // positivity check and persist as a zero transaction.
    let amount = amount.round_dp(super::MONEY_DP);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput(
            "transaction amount must be positive".into(),
        ));
    }
    let account = fetch_account(conn, account_id)?;

    let new_balance = match kind {
        TransactionKind::Expense => {
            let remaining = account.balance - amount;
            if remaining < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    available: account.balance,
                    required: amount,
                });
            }
            if let Some(category_id) = category_id {
                budgets::apply_to_budget(conn, account.user_id, category_id, amount)?;
            }
            remaining
        }
        TransactionKind::Income => account.balance + amount,
    };

    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![money(new_balance), account_id],
    )?;
    balance::recompute_user_balance(conn, account.user_id)?;

    conn.execute(
        "INSERT INTO transactions(account_id, amount, date, description, kind, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            account_id,
            money(amount),
            date.to_string(),
            description,
            kind.as_str(),
            category_id
        ],
    )?;
    Ok(Transaction {
        id: conn.last_insert_rowid(),
        account_id,
        amount,
        date,
        description: description.to_string(),
        kind,
        category_id,
    })
}

/// Updates amount, date and description of an existing transaction. Kind
/// and category are fixed at creation.
///
/// The old amount is re-read inside the transaction so the delta can
/// never be computed from a stale row.
pub fn update_transaction(
    conn: &mut Connection,
    id: i64,
    new_amount: Decimal,
    new_date: Option<NaiveDate>,
    new_description: Option<&str>,
) -> Result<Transaction> {
    let new_amount = new_amount.round_dp(super::MONEY_DP);
    if new_amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput(
            "transaction amount must be positive".into(),
        ));
    }

    let tx = conn.transaction()?;
    let existing = fetch_transaction(&tx, id)?;
    let account = fetch_account(&tx, existing.account_id)?;
    let delta = new_amount - existing.amount;

    let new_balance = match existing.kind {
        TransactionKind::Expense => {
            let remaining = account.balance - delta;
            if remaining < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    available: account.balance,
                    required: delta,
                });
            }
            if let Some(category_id) = existing.category_id {
                budgets::apply_to_budget(&tx, account.user_id, category_id, delta)?;
            }
            remaining
        }
        TransactionKind::Income => {
            let remaining = account.balance + delta;
            // Shrinking an income below what was already spent elsewhere
            // would overdraw the account.
            if remaining < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    available: account.balance,
                    required: -delta,
                });
            }
            remaining
        }
    };

    tx.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![money(new_balance), account.id],
    )?;
    balance::recompute_user_balance(&tx, account.user_id)?;

    let date = new_date.unwrap_or(existing.date);
    let description = new_description.unwrap_or(&existing.description).to_string();
    tx.execute(
        "UPDATE transactions SET amount=?1, date=?2, description=?3 WHERE id=?4",
        params![money(new_amount), date.to_string(), description, id],
    )?;
    tx.commit()?;
    Ok(Transaction {
        amount: new_amount,
        date,
        description,
        ..existing
    })
}

/// Deletes a transaction, reversing its effect on the account, the user
/// balance and, for categorized expenses, the budget.
pub fn delete_transaction(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let existing = fetch_transaction(&tx, id)?;
    let account = fetch_account(&tx, existing.account_id)?;

    let new_balance = match existing.kind {
        TransactionKind::Income => {
            let remaining = account.balance - existing.amount;
            // Should not happen under correct bookkeeping.
            if remaining < Decimal::ZERO {
                return Err(LedgerError::NegativeBalance { id });
            }
            remaining
        }
        TransactionKind::Expense => {
            if let Some(category_id) = existing.category_id {
                budgets::apply_to_budget(&tx, account.user_id, category_id, -existing.amount)?;
            }
            account.balance + existing.amount
        }
    };

    tx.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![money(new_balance), account.id],
    )?;
    balance::recompute_user_balance(&tx, account.user_id)?;
    tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    tx.commit()?;
    Ok(())
}
