// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transfers: two lifecycle legs composed in one transaction.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use super::{balance, fetch_account, fetch_investment_account, money, transactions};
use crate::error::{LedgerError, Result};
use crate::models::{Transaction, TransactionKind};

/// Moves `amount` between two cash accounts: an expense leg on `from`
/// followed by an income leg on `to`. Either leg failing rolls back both.
pub fn transfer(
    conn: &mut Connection,
    from_account_id: i64,
    to_account_id: i64,
    amount: Decimal,
    date: NaiveDate,
    description: &str,
) -> Result<(Transaction, Transaction)> {
    if from_account_id == to_account_id {
        return Err(LedgerError::InvalidInput(
            "cannot transfer an account to itself".into(),
        ));
    }
    // Canonicalize once so the funds check and both legs see the same value.
    let amount = amount.round_dp(super::MONEY_DP);
    let tx = conn.transaction()?;
    let from = fetch_account(&tx, from_account_id)?;
    fetch_account(&tx, to_account_id)?;
    if from.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            available: from.balance,
            required: amount,
        });
    }
    let debit = transactions::create_in_tx(
        &tx,
        from_account_id,
        amount,
        TransactionKind::Expense,
        None,
        date,
        description,
    )?;
    let credit = transactions::create_in_tx(
        &tx,
        to_account_id,
        amount,
        TransactionKind::Income,
        None,
        date,
        description,
    )?;
    tx.commit()?;
    Ok((debit, credit))
}

/// Moves cash into an investment account's uninvested funds. The cash
/// side gets a normal expense leg; the investment side tracks funds, not
/// discrete transactions, so it is credited directly.
pub fn transfer_to_investment(
    conn: &mut Connection,
    from_account_id: i64,
    investment_account_id: i64,
    amount: Decimal,
    date: NaiveDate,
) -> Result<Transaction> {
    let amount = amount.round_dp(super::MONEY_DP);
    let tx = conn.transaction()?;
    let from = fetch_account(&tx, from_account_id)?;
    let target = fetch_investment_account(&tx, investment_account_id)?;
    if from.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            available: from.balance,
            required: amount,
        });
    }
    let debit = transactions::create_in_tx(
        &tx,
        from_account_id,
        amount,
        TransactionKind::Expense,
        None,
        date,
        &format!("Transfer to investment account '{}'", target.name),
    )?;
    let funded = target.amount_to_invest + debit.amount;
    tx.execute(
        "UPDATE investment_accounts SET amount_to_invest=?1 WHERE id=?2",
        params![money(funded), investment_account_id],
    )?;
    balance::recompute_investment_account(&tx, investment_account_id)?;
    balance::recompute_user_balance(&tx, target.user_id)?;
    tx.commit()?;
    Ok(debit)
}
